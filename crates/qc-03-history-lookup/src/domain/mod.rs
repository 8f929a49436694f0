//! # Domain Layer
//!
//! Pure domain logic for the History Lookup subsystem: block shapes, the
//! miniblock metadata record, notarization classification and errors.
//!
//! This module contains NO I/O dependencies. Storage, codecs and hashing are
//! reached through the ports in the `ports` module.

pub mod block;
pub mod entities;
pub mod errors;
pub mod value_objects;

pub use block::*;
pub use entities::*;
pub use errors::*;
pub use value_objects::*;
