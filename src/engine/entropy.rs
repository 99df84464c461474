//! Entropy sources for the odds generator.
//!
//! The crash-point draw is only as fair as its randomness, so the source is
//! injected rather than hard-coded: production uses the OS CSPRNG, tests
//! substitute a scripted sequence to assert exact draw values.

use rand_core::{OsRng, RngCore};

/// Uniform 32-bit entropy provider.
pub trait EntropySource: Send {
    /// Return the next uniformly distributed u32.
    fn next_u32(&mut self) -> u32;
}

/// Cryptographically strong entropy backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn next_u32(&mut self) -> u32 {
        OsRng.next_u32()
    }
}

/// Scripted entropy for deterministic tests.
///
/// Yields the provided values in order and cycles when exhausted.
#[derive(Debug, Clone)]
pub struct SequenceEntropy {
    values: Vec<u32>,
    cursor: usize,
}

impl SequenceEntropy {
    pub fn new(values: Vec<u32>) -> Self {
        assert!(!values.is_empty(), "sequence must not be empty");
        Self { values, cursor: 0 }
    }
}

impl EntropySource for SequenceEntropy {
    fn next_u32(&mut self) -> u32 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_cycles() {
        let mut entropy = SequenceEntropy::new(vec![1, 2]);
        assert_eq!(entropy.next_u32(), 1);
        assert_eq!(entropy.next_u32(), 2);
        assert_eq!(entropy.next_u32(), 1);
    }

    #[test]
    fn test_os_entropy_varies() {
        let mut entropy = OsEntropy;
        let draws: Vec<u32> = (0..8).map(|_| entropy.next_u32()).collect();
        // Eight identical draws from the OS CSPRNG would be astronomically unlikely.
        assert!(draws.windows(2).any(|w| w[0] != w[1]));
    }
}
