//! Userspace program builders and a transport client for the MDIO
//! transfer protocol — the "compiler" side that turns a requested access
//! into a program, and the client that submits it and collects the reply.

pub mod builder;
pub mod client;
pub mod error;

pub use client::{Client, LoopbackTransport, Transport};
pub use error::ClientError;
