//! Code generation

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::types::CODE_LENGTH;

/// Lowest code that still has six digits
const CODE_MIN: u32 = 100_000;
const CODE_MAX: u32 = 999_999;

/// Source of new codes for an [`OtpManager`](super::OtpManager)
pub trait CodeSource: Send {
    fn next_code(&mut self) -> String;
}

/// Uniform codes in `[100000, 999999]`
pub struct RandomCodes<R = StdRng> {
    rng: R,
}

impl RandomCodes<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic sequence, for tests and reproducible demos
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> RandomCodes<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl Default for RandomCodes<StdRng> {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl<R: Rng + Send> CodeSource for RandomCodes<R> {
    fn next_code(&mut self) -> String {
        self.rng.gen_range(CODE_MIN..=CODE_MAX).to_string()
    }
}

/// Replays a fixed list of codes, cycling when it runs out
pub struct FixedCodes {
    codes: Vec<String>,
    next: usize,
}

impl FixedCodes {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
            next: 0,
        }
    }
}

impl CodeSource for FixedCodes {
    fn next_code(&mut self) -> String {
        if self.codes.is_empty() {
            return "0".repeat(CODE_LENGTH);
        }
        let code = self.codes[self.next % self.codes.len()].clone();
        self.next += 1;
        code
    }
}
