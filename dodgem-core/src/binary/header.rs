//! Artifact header layout and checksum

/// Artifact magic bytes
pub const MAGIC: [u8; 4] = *b"DDGM";

/// Format version (major, minor, patch); readers reject a different major
pub const VERSION: (u8, u8, u8) = (1, 0, 0);

/// Header: magic (4) + version (3) + flags (1) + checksum (4) + body
/// length (4)
pub const HEADER_SIZE: usize = 16;

/// Flag bit: the body carries per-byte line tables
pub const FLAG_LINE_INFO: u8 = 0b0000_0001;

/// FNV-1a, 32-bit; covers the body bytes after the header
pub fn checksum(body: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    let mut hash = OFFSET_BASIS;
    for &byte in body {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Assemble a full header for the given body
pub fn write_header(flags: u8, body: &[u8]) -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    header[0..4].copy_from_slice(&MAGIC);
    header[4] = VERSION.0;
    header[5] = VERSION.1;
    header[6] = VERSION.2;
    header[7] = flags;
    header[8..12].copy_from_slice(&checksum(body).to_le_bytes());
    header[12..16].copy_from_slice(&(body.len() as u32).to_le_bytes());
    header
}
