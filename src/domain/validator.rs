//! Admission gate for submitted commands.
//!
//! [`CommandValidator`] decides whether a raw token enters the queue:
//!
//! 1. the token must be in the admissible alphabet (`InvalidCommand`);
//! 2. the special action passes a coin flip with probability `p`
//!    (`NotAdmitted`), before capacity is considered;
//! 3. the queue must have room (`QueueFull`).
//!
//! Only a successful admission mutates the queue.

use std::fmt;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Command, CommandQueue};
use crate::error::RelayError;

/// Default admission probability for the special action.
pub const DEFAULT_SPECIAL_ACTION_PROBABILITY: f64 = 0.05;

/// Source of uniform samples in `[0, 1)` for the special-action gate.
pub trait RandomSource: Send + Sync + fmt::Debug {
    /// Returns the next sample.
    fn next_unit(&self) -> f64;
}

/// Thread-local OS-seeded generator. Used in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Deterministic generator for reproducible runs.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// Creates a generator from a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.random::<f64>(),
            Err(poisoned) => poisoned.into_inner().random::<f64>(),
        }
    }
}

/// Validates and enqueues submitted commands.
#[derive(Debug)]
pub struct CommandValidator {
    random: Box<dyn RandomSource>,
    special_probability: f64,
}

impl CommandValidator {
    /// Creates a validator. `special_probability` is clamped to `[0, 1]`.
    #[must_use]
    pub fn new(random: Box<dyn RandomSource>, special_probability: f64) -> Self {
        Self {
            random,
            special_probability: special_probability.clamp(0.0, 1.0),
        }
    }

    /// Admission probability of the special action.
    #[must_use]
    pub const fn special_probability(&self) -> f64 {
        self.special_probability
    }

    /// Runs the admission pipeline for `raw` against `queue`.
    ///
    /// # Errors
    ///
    /// - [`RelayError::InvalidCommand`] if `raw` is not an admissible token.
    /// - [`RelayError::NotAdmitted`] if the special action lost its coin flip.
    /// - [`RelayError::QueueFull`] if the queue is at capacity.
    pub async fn submit(&self, raw: &str, queue: &CommandQueue) -> Result<Command, RelayError> {
        let command = Command::parse(raw)?;

        if command.is_special() && !self.admit_special() {
            return Err(RelayError::NotAdmitted);
        }

        if !queue.enqueue(command).await {
            return Err(RelayError::QueueFull);
        }

        Ok(command)
    }

    fn admit_special(&self) -> bool {
        self.random.next_unit() < self.special_probability
    }
}

impl Default for CommandValidator {
    fn default() -> Self {
        Self::new(Box::new(ThreadRandom), DEFAULT_SPECIAL_ACTION_PROBABILITY)
    }
}
