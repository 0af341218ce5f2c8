//! Default connector naming.

use rand::Rng;

/// Number of random digits appended to a generated name
pub const NAME_SUFFIX_DIGITS: usize = 4;

/// Source of random decimal digits for generated connector names
pub trait EntropySource: Send + Sync {
    /// Return a digit in `0..=9`
    fn next_digit(&self) -> u8;
}

/// Thread-local RNG, never blocks
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngEntropy;

impl EntropySource for ThreadRngEntropy {
    fn next_digit(&self) -> u8 {
        rand::rng().random_range(0..10)
    }
}

/// Build `"<prefix>-Unnamed-dddd"`
pub fn generate_connector_name(prefix: &str, entropy: &dyn EntropySource) -> String {
    let suffix: String = (0..NAME_SUFFIX_DIGITS)
        .map(|_| char::from(b'0' + entropy.next_digit() % 10))
        .collect();
    format!("{}-Unnamed-{}", prefix, suffix)
}
