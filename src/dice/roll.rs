//! Dice rolling engine
//!
//! Rolls `qty` dice of `faces` sides, optionally twice for advantage or
//! disadvantage, and reports every face drawn alongside the binding set.

use serde_json::Value;
use thiserror::Error;

use super::DieSource;

/// Engine precondition failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RollError {
    #[error("'{0}' must be a positive integer")]
    NotPositive(&'static str),

    #[error("A roll cannot have both advantage and disadvantage")]
    ConflictingModes,
}

/// How many attempts are made and which one counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Roll twice, keep the higher sum
    Advantage,
    /// Roll twice, keep the lower sum
    Disadvantage,
}

impl Mode {
    /// Build a mode from the advantage/disadvantage flag pair
    pub fn from_flags(advantage: bool, disadvantage: bool) -> Result<Self, RollError> {
        match (advantage, disadvantage) {
            (false, false) => Ok(Mode::Normal),
            (true, false) => Ok(Mode::Advantage),
            (false, true) => Ok(Mode::Disadvantage),
            (true, true) => Err(RollError::ConflictingModes),
        }
    }
}

/// Faces drawn for a roll: one set, or both attempts in draw order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Results {
    Single(Vec<u32>),
    Pair(Vec<u32>, Vec<u32>),
}

impl From<Results> for Value {
    fn from(results: Results) -> Self {
        match results {
            Results::Single(set) => Value::from(set),
            Results::Pair(first, second) => {
                Value::Array(vec![Value::from(first), Value::from(second)])
            }
        }
    }
}

/// Outcome of a single roll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    pub results: Results,
    /// The set that counts toward the total
    pub taken: Vec<u32>,
    pub total: u64,
}

/// A validated roll: `qty` dice of `faces` sides in a given mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollSpec {
    faces: u32,
    qty: u32,
    mode: Mode,
}

impl RollSpec {
    /// Create a roll spec, rejecting zero faces or quantity
    pub fn new(faces: u32, qty: u32, mode: Mode) -> Result<Self, RollError> {
        if faces == 0 {
            return Err(RollError::NotPositive("faces"));
        }
        if qty == 0 {
            return Err(RollError::NotPositive("qty"));
        }
        Ok(Self { faces, qty, mode })
    }

    pub fn faces(&self) -> u32 {
        self.faces
    }

    pub fn qty(&self) -> u32 {
        self.qty
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Roll the dice, drawing every face from `source`
    pub fn roll<S: DieSource + ?Sized>(&self, source: &mut S) -> RollOutcome {
        let first = draw_set(source, self.faces, self.qty);

        if self.mode == Mode::Normal {
            let total = sum(&first);
            return RollOutcome {
                taken: first.clone(),
                results: Results::Single(first),
                total,
            };
        }

        let second = draw_set(source, self.faces, self.qty);
        let (first_sum, second_sum) = (sum(&first), sum(&second));

        // Ties go to the first attempt
        let keep_first = match self.mode {
            Mode::Disadvantage => first_sum <= second_sum,
            _ => first_sum >= second_sum,
        };

        let (taken, total) = if keep_first {
            (first.clone(), first_sum)
        } else {
            (second.clone(), second_sum)
        };

        RollOutcome {
            results: Results::Pair(first, second),
            taken,
            total,
        }
    }

    /// Dice drawn by one roll, counting both attempts
    pub fn dice_drawn(&self) -> u64 {
        match self.mode {
            Mode::Normal => self.qty as u64,
            Mode::Advantage | Mode::Disadvantage => self.qty as u64 * 2,
        }
    }

    /// Smallest possible total
    pub fn min(&self) -> u64 {
        self.qty as u64
    }

    /// Largest possible total
    pub fn max(&self) -> u64 {
        self.qty as u64 * self.faces as u64
    }
}

impl std::fmt::Display for RollSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d{}", self.qty, self.faces)?;
        match self.mode {
            Mode::Normal => Ok(()),
            Mode::Advantage => write!(f, " adv"),
            Mode::Disadvantage => write!(f, " dsv"),
        }
    }
}

/// Roll `qty` dice of `faces` sides with optional advantage or disadvantage
pub fn roll_dice<S: DieSource + ?Sized>(
    source: &mut S,
    faces: u32,
    qty: u32,
    advantage: bool,
    disadvantage: bool,
) -> Result<RollOutcome, RollError> {
    let mode = Mode::from_flags(advantage, disadvantage)?;
    let spec = RollSpec::new(faces, qty, mode)?;
    Ok(spec.roll(source))
}

fn draw_set<S: DieSource + ?Sized>(source: &mut S, faces: u32, qty: u32) -> Vec<u32> {
    (0..qty).map(|_| source.roll_die(faces)).collect()
}

fn sum(set: &[u32]) -> u64 {
    set.iter().map(|&face| face as u64).sum()
}
