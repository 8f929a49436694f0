//! # Ports Layer
//!
//! Hexagonal architecture ports (interfaces) for the History Lookup subsystem.
//!
//! - **Driving Ports (Inbound)**: the repository API used by the commit path
//!   and the node's read paths
//! - **Driven Ports (Outbound)**: storers, codec, hasher and block tracker
//!   supplied by the host node

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
