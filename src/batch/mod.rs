//! Batch processing
//!
//! A batch is a JSON object with a `rolls` array. Every roll is validated
//! before any die is drawn; then each roll is annotated in place with
//! `results`, `taken` and `roll_total`, and the object gains a top-level
//! `total`. Any other keys pass through untouched.

mod validate;

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::dice::{DieSource, RollSpec};
pub use validate::{parse_roll, ValidationError};

/// Default upper bound on dice drawn by one batch
pub const DEFAULT_MAX_DICE: u64 = 100_000;

/// Reasons a batch produces an error response instead of results
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Invalid JSON. Could not parse the request")]
    Decode(#[source] serde_json::Error),

    #[error("Input must contain a 'rolls' key")]
    MissingRolls,

    #[error("Invalid JSON format. Must contain a 'rolls' array")]
    RollsNotArray,

    #[error("{source}")]
    Validation {
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl BatchError {
    /// True when the caller sent something we refuse, as opposed to a
    /// failure on our side
    pub fn is_client_error(&self) -> bool {
        !matches!(self, BatchError::Unexpected(_))
    }

    /// The error object sent back in place of a batch
    pub fn to_response(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

/// Validates, rolls and totals batches
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    max_dice: u64,
}

impl Default for BatchProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DICE)
    }
}

impl BatchProcessor {
    /// `max_dice` bounds the dice one batch may draw, both attempts of an
    /// advantage or disadvantage roll included
    pub fn new(max_dice: u64) -> Self {
        Self { max_dice }
    }

    pub fn max_dice(&self) -> u64 {
        self.max_dice
    }

    /// Decode raw request bytes and process the batch
    pub fn handle<S: DieSource + ?Sized>(
        &self,
        raw: &[u8],
        source: &mut S,
    ) -> Result<Value, BatchError> {
        let request: Value = serde_json::from_slice(raw).map_err(BatchError::Decode)?;
        self.process(request, source)
    }

    /// Process a decoded batch, returning it annotated
    pub fn process<S: DieSource + ?Sized>(
        &self,
        mut request: Value,
        source: &mut S,
    ) -> Result<Value, BatchError> {
        let batch = request.as_object_mut().ok_or(BatchError::RollsNotArray)?;
        let rolls = batch
            .get_mut("rolls")
            .ok_or(BatchError::MissingRolls)?
            .as_array_mut()
            .ok_or(BatchError::RollsNotArray)?;

        let specs = self.validate(rolls)?;

        let mut grand_total: u64 = 0;
        for (entry, spec) in rolls.iter_mut().zip(&specs) {
            let outcome = spec.roll(source);
            debug!(
                "rolled {} for a total of {} (range {}-{})",
                spec,
                outcome.total,
                spec.min(),
                spec.max()
            );

            grand_total = grand_total
                .checked_add(outcome.total)
                .ok_or_else(|| BatchError::Unexpected("grand total overflowed".to_string()))?;

            // parse_roll only accepts objects
            if let Some(fields) = entry.as_object_mut() {
                fields.insert("results".to_string(), outcome.results.into());
                fields.insert("taken".to_string(), outcome.taken.into());
                fields.insert("roll_total".to_string(), outcome.total.into());
            }
        }

        info!("processed {} rolls, total {}", specs.len(), grand_total);
        batch.insert("total".to_string(), grand_total.into());

        Ok(request)
    }

    /// Validate every entry in order, stopping at the first failure or at
    /// the entry that pushes the batch past its dice budget
    fn validate(&self, rolls: &[Value]) -> Result<Vec<RollSpec>, BatchError> {
        let mut specs = Vec::with_capacity(rolls.len());
        let mut dice: u64 = 0;

        for (index, entry) in rolls.iter().enumerate() {
            let invalid = |err| BatchError::Validation { index, source: err };

            let spec = parse_roll(entry).map_err(invalid)?;
            dice = dice.saturating_add(spec.dice_drawn());
            if dice > self.max_dice {
                return Err(invalid(ValidationError::DiceBudget { max: self.max_dice }));
            }
            specs.push(spec);
        }

        Ok(specs)
    }
}
