//! Dice module
//!
//! Rolls dice of any size with D&D-style advantage and disadvantage:
//! - Uniform faces drawn from an injectable [`DieSource`]
//! - Advantage keeps the higher of two attempts, disadvantage the lower
//! - Ties always keep the first attempt

mod roll;
mod source;

#[cfg(test)]
pub(crate) mod test_utils;

pub use roll::{roll_dice, Mode, Results, RollError, RollOutcome, RollSpec};
pub use source::{DieSource, RngSource};
