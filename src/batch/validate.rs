//! Roll spec validation
//!
//! Turns one loosely-typed JSON roll entry into a [`RollSpec`].

use serde_json::{Map, Value};
use thiserror::Error;

use crate::dice::{Mode, RollError, RollSpec};

/// A roll entry that cannot be rolled
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("each roll must be an object")]
    NotAnObject,

    #[error("'{0}' must be a positive integer")]
    InvalidField(&'static str),

    #[error("a batch must not roll more than {max} dice")]
    DiceBudget { max: u64 },

    #[error("'{0}' must be a boolean")]
    NotBoolean(&'static str),

    #[error("A roll cannot have both advantage and disadvantage")]
    ConflictingModes,
}

impl From<RollError> for ValidationError {
    fn from(err: RollError) -> Self {
        match err {
            RollError::NotPositive(field) => ValidationError::InvalidField(field),
            RollError::ConflictingModes => ValidationError::ConflictingModes,
        }
    }
}

/// Validate a single roll entry
///
/// Checks run in a fixed order: `faces`, `qty`, the mode flags, then
/// their mutual exclusion. The first failure wins.
pub fn parse_roll(entry: &Value) -> Result<RollSpec, ValidationError> {
    let fields = entry.as_object().ok_or(ValidationError::NotAnObject)?;

    let faces = positive_int(fields, "faces")?;
    let qty = positive_int(fields, "qty")?;

    let advantage = flag(fields, "adv")?;
    let disadvantage = flag(fields, "dsv")?;
    let mode = Mode::from_flags(advantage, disadvantage)?;

    Ok(RollSpec::new(faces, qty, mode)?)
}

fn positive_int(fields: &Map<String, Value>, key: &'static str) -> Result<u32, ValidationError> {
    fields
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|&n| n > 0)
        .ok_or(ValidationError::InvalidField(key))
}

/// Absent and `null` both read as false
fn flag(fields: &Map<String, Value>, key: &'static str) -> Result<bool, ValidationError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(ValidationError::NotBoolean(key)),
    }
}
