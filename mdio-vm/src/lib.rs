//! Validator, interpreter, bus binding, and reply chunker for the MDIO
//! transfer protocol — the simulated "kernel side" of the transport.
//!
//! A real kernel module can't be expressed in portable, safe Rust; this
//! crate instead embeds a simulated bus and a simulated transport so the
//! same dispatch semantics are fully unit-testable. See [`bus`] for the
//! adapter trait a real driver would implement in its place.

pub mod bus;
pub mod errno;
pub mod interpreter;
pub mod transport;
pub mod validator;

pub use bus::{BusHandle, BusRegistry, DeviceAddress, MdioBus, SimulatedBus};
pub use interpreter::{Abort, Interpreter, ReplySink, RunOutcome, VecReplySink, NUM_REGISTERS};
pub use transport::{handle_request, resolve_timeout, ChunkingReplySink, ReplyPart, TransportError};
pub use validator::{validate, ValidationError};
