//! Booking reference codes.

use rand::Rng;

/// Uppercase letters and digits without the look-alikes `0`, `O`, `1`, `I`.
pub const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of every reference code.
pub const REFERENCE_LENGTH: usize = 8;

/// Generates human-readable booking reference codes.
///
/// Uniqueness is not guaranteed here; the booking service retries against
/// the ledger.
#[derive(Debug, Clone, Default)]
pub struct ReferenceGenerator;

impl ReferenceGenerator {
    /// Creates a new generator.
    pub fn new() -> Self {
        Self
    }

    /// Draw a fresh code.
    pub fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..REFERENCE_LENGTH)
            .map(|_| REFERENCE_ALPHABET[rng.gen_range(0..REFERENCE_ALPHABET.len())] as char)
            .collect()
    }
}
