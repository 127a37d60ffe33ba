//! # Product Selection
//!
//! Promotions pick one product among a company's in-stock products. The
//! selection is uniformly random in production and injected as a trait so
//! dispatch scenarios stay reproducible in tests.
//!
//! Selection is re-run independently for every eligible client on every
//! pass; there is deliberately no variety guarantee across passes.

use rand::seq::SliceRandom;

use cotiza_core::types::Product;

/// Seam for promotion product selection.
pub trait ProductPicker: Send + Sync {
    /// Picks one product from the candidate slice. `None` iff the slice
    /// is empty.
    fn pick<'a>(&self, products: &'a [Product]) -> Option<&'a Product>;
}

/// Uniformly random selection (production).
#[derive(Debug, Default)]
pub struct RandomPicker;

impl ProductPicker for RandomPicker {
    fn pick<'a>(&self, products: &'a [Product]) -> Option<&'a Product> {
        products.choose(&mut rand::thread_rng())
    }
}

/// Deterministic selection for tests: always the product at a fixed
/// index (modulo the candidate count).
#[derive(Debug)]
pub struct FixedPicker {
    index: usize,
}

impl FixedPicker {
    pub fn new(index: usize) -> Self {
        FixedPicker { index }
    }
}

impl Default for FixedPicker {
    fn default() -> Self {
        FixedPicker { index: 0 }
    }
}

impl ProductPicker for FixedPicker {
    fn pick<'a>(&self, products: &'a [Product]) -> Option<&'a Product> {
        if products.is_empty() {
            None
        } else {
            products.get(self.index % products.len())
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
