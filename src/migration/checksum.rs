//! Composite checksums stored in the state table
//!
//! A stored checksum is a signed 64-bit value packing two 32-bit halves:
//!
//! - the **normal** half (low 32 bits) identifies the last applied non-repeatable schema
//!   revision;
//! - the **repeatable** half (high 32 bits) identifies the last applied revision of the
//!   idempotent SQL that is re-run whenever it changes.
//!
//! `0` means "never applied". Both halves are CRC-32 (ISO 3309) values of the SQL text.

/// Stored checksum of a migration that has never been applied
pub const EMPTY_CHECKSUM: i64 = 0;

/// Mask selecting the normal half
pub const NORMAL_MASK: i64 = 0x0000_0000_FFFF_FFFF;

/// Mask selecting the repeatable half
pub const REPEATABLE_MASK: i64 = !NORMAL_MASK;

/// Pack a normal and a repeatable checksum into one stored value
#[must_use]
pub fn combine(normal: u32, repeatable: u32) -> i64 {
    ((u64::from(repeatable) << 32) | u64::from(normal)) as i64
}

/// Split a stored value into its `(normal, repeatable)` halves
#[must_use]
pub fn split(checksum: i64) -> (u32, u32) {
    (normal_part(checksum), repeatable_part(checksum))
}

/// Low 32 bits of a stored checksum
#[must_use]
pub fn normal_part(checksum: i64) -> u32 {
    (checksum & NORMAL_MASK) as u32
}

/// High 32 bits of a stored checksum
#[must_use]
pub fn repeatable_part(checksum: i64) -> u32 {
    ((checksum as u64) >> 32) as u32
}

/// CRC-32 (ISO 3309, as used by zlib) of the UTF-8 bytes of `sql`
#[must_use]
pub fn crc32(sql: &str) -> u32 {
    crc32fast::hash(sql.as_bytes())
}
