//! Negative errno constants used as runtime abort codes.
//!
//! These are the same magnitudes the original kernel module returns
//! (`-ETIMEDOUT`, `-EINVAL`, ...); surfaced here as plain `i32` since
//! `mdio-vm` has no reason to depend on a libc errno crate for four
//! well-known numbers.

/// Invalid argument — defensive "unknown opcode at runtime" and
/// out-of-range jump targets.
pub const EINVAL: i32 = -22;
/// No such device — the named bus does not exist.
pub const ENODEV: i32 = -19;
/// Out of memory — request could not even be allocated.
pub const ENOMEM: i32 = -12;
/// Message too small — `EMIT` could not fit a datum even after a flush.
pub const EMSGSIZE: i32 = -90;
/// Timed out — the deadline elapsed before the next instruction boundary.
pub const ETIMEDOUT: i32 = -110;
