//! Opaque identifier and secret generation
//!
//! Account ids are fixed-length 16-character tokens drawn from a
//! 36-character lowercase alphanumeric alphabet (~82 bits of entropy);
//! secrets are 32 characters (~165 bits). Randomness comes from the OS
//! CSPRNG via `rand::rng()`, which aborts the process if the entropy
//! source is unavailable — there is no degraded fallback.

use rand::RngExt;

const ALPHABET: &[u8; 36] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of an account identifier.
pub const ID_LEN: usize = 16;

/// Length of a generated secret (access/refresh token material).
pub const SECRET_LEN: usize = 32;

/// Generate a 16-character opaque account identifier.
pub fn generate_id() -> String {
    generate(ID_LEN)
}

/// Generate a 32-character high-entropy secret.
pub fn generate_secret() -> String {
    generate(SECRET_LEN)
}

fn generate(len: usize) -> String {
    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 64];
    while out.len() < len {
        rand::rng().fill(&mut buf);
        for &byte in buf.iter() {
            // Mask to 6 bits and reject values past the alphabet end so
            // every character stays uniformly distributed.
            let index = (byte & 0x3f) as usize;
            if index < ALPHABET.len() {
                out.push(ALPHABET[index] as char);
                if out.len() == len {
                    break;
                }
            }
        }
    }
    out
}
