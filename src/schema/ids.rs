//! Identifier generation for forms, fields, options and rules
//!
//! Identifiers are random six-digit numbers. The generator remembers every
//! identifier it has handed out and rerolls on collision, so ids are unique
//! per generator. Ids loaded from storage must be registered with
//! [`IdGenerator::reserve`] to be covered.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::types::{EntityId, Field};

/// Smallest generated identifier
pub const MIN_ID: EntityId = 100_000;

/// Largest generated identifier
pub const MAX_ID: EntityId = 999_999;

/// Random six-digit id source with collision avoidance
#[derive(Debug)]
pub struct IdGenerator {
    rng: StdRng,
    issued: HashSet<EntityId>,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    /// Create a generator seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            issued: HashSet::new(),
        }
    }

    /// Create a deterministic generator
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            issued: HashSet::new(),
        }
    }

    /// Produce a new identifier never issued or reserved by this generator
    pub fn next_id(&mut self) -> EntityId {
        loop {
            let id = self.rng.gen_range(MIN_ID..=MAX_ID);
            if self.issued.insert(id) {
                return id;
            }
        }
    }

    /// Mark an externally created identifier as taken
    pub fn reserve(&mut self, id: EntityId) {
        self.issued.insert(id);
    }

    /// Reserve every id found in a field list, nested ids included
    pub fn reserve_fields(&mut self, fields: &[Field]) {
        for field in fields {
            self.reserve(field.id);
            for option in &field.options {
                self.reserve(option.id);
            }
            for rule in &field.validations {
                self.reserve(rule.id);
            }
        }
    }

    /// Number of identifiers issued or reserved
    pub fn issued(&self) -> usize {
        self.issued.len()
    }
}
