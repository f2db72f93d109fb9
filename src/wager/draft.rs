//! Wager draft: the in-memory bet slip for one game and bet type.
//!
//! Holds (number, amount) legs while the user types. Amounts at or below
//! zero mean "no bet" for that slot and simply drop out of totals; they
//! are never an error because input fields pass through empty/zero while
//! typing. Crossing drafts hold a digit sequence and stake instead of
//! explicit legs, and derive their legs from the generated combinations.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;

use super::crossing::{self, CombinationSet};
use crate::types::{BetType, DraftError, HarufPosition, PayoutRates};

// ---------------------------------------------------------------------------
// Wager leg
// ---------------------------------------------------------------------------

/// One (number, amount) pair ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WagerLeg {
    /// Slot key as entered: `"47"` for Jodi, `"A3"`/`"B3"` for Haruf,
    /// the combination digits for Crossing.
    pub key: String,
    pub bet_type: BetType,
    /// The number actually wagered on (Haruf: the single digit).
    pub number: String,
    pub amount: Decimal,
    /// Haruf only.
    pub position: Option<HarufPosition>,
}

impl fmt::Display for WagerLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(
                f,
                "{} {}{} ({pos}) x{}",
                self.bet_type,
                pos.prefix(),
                self.number,
                self.amount
            ),
            None => write!(f, "{} {} x{}", self.bet_type, self.number, self.amount),
        }
    }
}

impl WagerLeg {
    /// Build a leg from a slot key, validating the key for `bet_type`.
    pub fn from_key(bet_type: BetType, key: &str, amount: Decimal) -> Result<Self, DraftError> {
        let key = normalise_key(key);
        let invalid = || DraftError::InvalidKey {
            bet_type,
            key: key.clone(),
        };

        match bet_type {
            BetType::Jodi | BetType::Crossing => {
                if key.len() != 2 || !key.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                Ok(Self {
                    number: key.clone(),
                    key,
                    bet_type,
                    amount,
                    position: None,
                })
            }
            BetType::Haruf => {
                let mut chars = key.chars();
                let position = chars.next().and_then(HarufPosition::from_prefix);
                let digit = chars.next().filter(|c| c.is_ascii_digit());
                match (position, digit, chars.next()) {
                    (Some(position), Some(digit), None) => Ok(Self {
                        number: digit.to_string(),
                        key,
                        bet_type,
                        amount,
                        position: Some(position),
                    }),
                    _ => Err(invalid()),
                }
            }
        }
    }
}

fn normalise_key(key: &str) -> String {
    key.trim().to_ascii_uppercase()
}

// ---------------------------------------------------------------------------
// Wager draft
// ---------------------------------------------------------------------------

/// Mutable bet slip for one game + bet type session.
#[derive(Debug, Clone, PartialEq)]
pub struct WagerDraft {
    game_id: String,
    bet_type: BetType,
    /// Jodi/Haruf slots with a positive amount.
    legs: BTreeMap<String, Decimal>,
    /// Crossing input and its generated combinations.
    sequence: String,
    stake: Decimal,
    combinations: CombinationSet,
    joda_cut: bool,
}

impl fmt::Display for WagerDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} draft for {}: {} leg(s), total {}",
            self.bet_type,
            self.game_id,
            self.leg_count(),
            self.total(),
        )
    }
}

impl WagerDraft {
    pub fn new(game_id: impl Into<String>, bet_type: BetType) -> Self {
        Self {
            game_id: game_id.into(),
            bet_type,
            legs: BTreeMap::new(),
            sequence: String::new(),
            stake: Decimal::ZERO,
            combinations: CombinationSet::empty(),
            joda_cut: false,
        }
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn bet_type(&self) -> BetType {
        self.bet_type
    }

    pub fn joda_cut_enabled(&self) -> bool {
        self.joda_cut
    }

    /// Crossing digit sequence as last entered (may be invalid/partial).
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn stake(&self) -> Decimal {
        self.stake
    }

    pub fn combinations(&self) -> &CombinationSet {
        &self.combinations
    }

    // -- Mutations -------------------------------------------------------

    /// Set or clear the amount for a Jodi/Haruf slot.
    ///
    /// Amounts at or below zero remove the slot.
    pub fn set_leg(&mut self, key: &str, amount: Decimal) -> Result<(), DraftError> {
        if self.bet_type == BetType::Crossing {
            return Err(DraftError::WrongBetType {
                operation: "set_leg",
                bet_type: self.bet_type,
            });
        }

        let leg = WagerLeg::from_key(self.bet_type, key, amount)?;
        if amount > Decimal::ZERO {
            let others: Decimal = self
                .legs
                .iter()
                .filter(|(k, _)| **k != leg.key)
                .map(|(_, a)| *a)
                .sum();
            if others.checked_add(amount).is_none() {
                return Err(DraftError::AmountOverflow {
                    key: leg.key,
                    amount,
                });
            }
            self.legs.insert(leg.key, amount);
        } else {
            self.legs.remove(&leg.key);
        }
        Ok(())
    }

    /// Replace the Crossing input and regenerate its combinations.
    pub fn set_crossing(&mut self, sequence: &str, stake: Decimal) -> Result<(), DraftError> {
        if self.bet_type != BetType::Crossing {
            return Err(DraftError::WrongBetType {
                operation: "set_crossing",
                bet_type: self.bet_type,
            });
        }

        self.sequence = sequence.trim().to_string();
        self.stake = stake;
        self.combinations = crossing::generate(&self.sequence, stake);
        Ok(())
    }

    /// Switch which combination class is the active selection.
    pub fn toggle_joda_cut(&mut self, enabled: bool) -> Result<(), DraftError> {
        if self.bet_type != BetType::Crossing {
            return Err(DraftError::WrongBetType {
                operation: "toggle_joda_cut",
                bet_type: self.bet_type,
            });
        }
        self.joda_cut = enabled;
        Ok(())
    }

    /// Drop a single slot. Returns the amount it held.
    pub fn remove_leg(&mut self, key: &str) -> Option<Decimal> {
        self.legs.remove(&normalise_key(key))
    }

    /// Reset to an empty draft for the same game and bet type.
    pub fn clear(&mut self) {
        *self = Self::new(std::mem::take(&mut self.game_id), self.bet_type);
    }

    // -- Derived values --------------------------------------------------

    /// Amount currently staked on `key`, if any.
    pub fn amount(&self, key: &str) -> Option<Decimal> {
        self.legs.get(&normalise_key(key)).copied()
    }

    /// Positive legs in deterministic order (key order; Crossing: digit order).
    pub fn legs(&self) -> Vec<WagerLeg> {
        match self.bet_type {
            BetType::Crossing => self
                .combinations
                .active(self.joda_cut)
                .iter()
                .map(|c| WagerLeg {
                    key: c.digits.clone(),
                    bet_type: BetType::Crossing,
                    number: c.digits.clone(),
                    amount: c.stake,
                    position: None,
                })
                .collect(),
            _ => self
                .legs
                .iter()
                .filter_map(|(key, amount)| WagerLeg::from_key(self.bet_type, key, *amount).ok())
                .collect(),
        }
    }

    pub fn leg_count(&self) -> usize {
        match self.bet_type {
            BetType::Crossing => self.combinations.active(self.joda_cut).len(),
            _ => self.legs.len(),
        }
    }

    /// Sum of all positive leg amounts, computed from current state.
    ///
    /// `set_leg` refuses amounts that would push this past `Decimal::MAX`.
    pub fn total(&self) -> Decimal {
        match self.bet_type {
            BetType::Crossing => self.combinations.total(self.joda_cut),
            _ => self.legs.values().copied().sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.leg_count() == 0
    }

    /// Winnings if every leg hit, at the game's payout rates. Display only.
    pub fn potential_payout(&self, rates: &PayoutRates) -> Decimal {
        self.total()
            .checked_mul(rates.rate_for(self.bet_type))
            .unwrap_or(Decimal::MAX)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
