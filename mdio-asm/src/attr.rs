//! Wire attribute identifiers shared by the transport server and client.
//!
//! Mirrors `enum` `MDIO_NLA_*` and `MDIO_GENL_*` from the original
//! `include/linux/mdio-netlink.h`: one header, used by both the kernel
//! module and `libmdio`. Here, both `mdio-vm` (server side) and
//! `mdio-client` (client side) depend on `mdio-asm` for the same constants.

/// The single command this transport family defines.
pub const CMD_XFER: u8 = 1;

/// Generic-netlink family name and version (spec §6).
pub const FAMILY_NAME: &str = "mdio";
pub const FAMILY_VERSION: u8 = 1;

/// Maximum length of a `BUS_ID` string attribute (`MII_BUS_ID_SIZE` in the
/// original header).
pub const MII_BUS_ID_SIZE: usize = 61;

/// Default timeout when a request omits `TIMEOUT` (§6).
pub const DEFAULT_TIMEOUT_MS: u16 = 100;

/// Hard ceiling on `TIMEOUT`, regardless of what the caller asks for (§6).
pub const MAX_TIMEOUT_MS: u16 = 10_000;

/// Request/reply attribute identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Attr {
    /// `BUS_ID` — string, request only.
    BusId = 1,
    /// `TIMEOUT` — u16 milliseconds, request only, optional.
    Timeout = 2,
    /// `PROG` — binary blob, request only.
    Prog = 3,
    /// `DATA` — nested container of emitted u32 words, reply only.
    Data = 4,
    /// `ERROR` — signed 32-bit status, reply only, present iff abnormal.
    Error = 5,
}
