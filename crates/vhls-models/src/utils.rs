//! Small shared helpers.

use rand::RngCore;

/// Generate a random hex key of `size` bytes (2*size hex chars).
///
/// Used for account and upload-folder naming.
pub fn generate_key(size: usize) -> String {
    let mut bytes = vec![0u8; size];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
