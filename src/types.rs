//! Shared types for the Matka client core.
//!
//! Game snapshots, bet types, wallet balances and the error enums used
//! across the wager, api and engine modules. Kept free of behaviour that
//! needs I/O so every other module can depend on it.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Bet types
// ---------------------------------------------------------------------------

/// The three wager kinds offered by a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetType {
    /// Exact 2-digit outcome (00–99).
    Jodi,
    /// Single digit matching the first or last digit of the outcome.
    Haruf,
    /// Digit sequence expanded into every ordered 2-digit pair.
    Crossing,
}

impl BetType {
    /// Whether each leg goes out as its own request.
    pub fn submits_per_leg(&self) -> bool {
        matches!(self, BetType::Haruf)
    }
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetType::Jodi => write!(f, "jodi"),
            BetType::Haruf => write!(f, "haruf"),
            BetType::Crossing => write!(f, "crossing"),
        }
    }
}

impl std::str::FromStr for BetType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jodi" => Ok(BetType::Jodi),
            "haruf" => Ok(BetType::Haruf),
            "crossing" => Ok(BetType::Crossing),
            _ => Err(anyhow::anyhow!("Unknown bet type: {s}")),
        }
    }
}

/// Which digit of the outcome a Haruf leg targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarufPosition {
    First,
    Last,
}

impl HarufPosition {
    /// Map an input-slot prefix (`A` = first, `B` = last) to a position.
    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix.to_ascii_uppercase() {
            'A' => Some(HarufPosition::First),
            'B' => Some(HarufPosition::Last),
            _ => None,
        }
    }

    pub fn prefix(&self) -> char {
        match self {
            HarufPosition::First => 'A',
            HarufPosition::Last => 'B',
        }
    }
}

impl fmt::Display for HarufPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarufPosition::First => write!(f, "first"),
            HarufPosition::Last => write!(f, "last"),
        }
    }
}

// ---------------------------------------------------------------------------
// Game snapshot
// ---------------------------------------------------------------------------

/// Server-declared lifecycle state of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    Open,
    Closed,
    ResultDeclared,
    /// Any status string this client does not know about.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Waiting => write!(f, "waiting"),
            GameStatus::Open => write!(f, "open"),
            GameStatus::Closed => write!(f, "closed"),
            GameStatus::ResultDeclared => write!(f, "result_declared"),
            GameStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Payout multipliers per bet type (stake × rate = winnings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutRates {
    pub jodi: Decimal,
    pub haruf: Decimal,
    pub crossing: Decimal,
}

impl Default for PayoutRates {
    fn default() -> Self {
        Self {
            jodi: dec!(90),
            haruf: dec!(9),
            crossing: dec!(90),
        }
    }
}

impl PayoutRates {
    pub fn rate_for(&self, bet_type: BetType) -> Decimal {
        match bet_type {
            BetType::Jodi => self.jodi,
            BetType::Haruf => self.haruf,
            BetType::Crossing => self.crossing,
        }
    }
}

/// Read-only view of a game as last reported by the server.
///
/// Times are local time-of-day; a boundary earlier than "now" means
/// the same time tomorrow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub game_type: String,
    pub min_bet: Decimal,
    pub max_bet: Decimal,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub result_time: NaiveTime,
    pub current_status: GameStatus,
    #[serde(default)]
    pub payouts: PayoutRates,
}

impl fmt::Display for GameSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}) open {}–{} result {} | limits {}–{}",
            self.id,
            self.name,
            self.current_status,
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M"),
            self.result_time.format("%H:%M"),
            self.min_bet,
            self.max_bet,
        )
    }
}

impl GameSnapshot {
    pub fn is_open(&self) -> bool {
        self.current_status == GameStatus::Open
    }

    /// Whether `amount` lies within the inclusive `[min_bet, max_bet]` range.
    pub fn within_limits(&self, amount: Decimal) -> bool {
        amount >= self.min_bet && amount <= self.max_bet
    }
}

/// `HH:MM` (or `HH:MM:SS`) serde helpers for game times.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<NaiveTime, String> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .map_err(|e| format!("invalid time of day '{raw}': {e}"))
    }
}

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

/// Wallet balances as reported by the wallet endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
    /// Funds available for staking.
    pub deposit_balance: Decimal,
    #[serde(default)]
    pub winning_balance: Decimal,
}

impl fmt::Display for WalletBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "deposit={:.2} winning={:.2}",
            self.deposit_balance, self.winning_balance
        )
    }
}

impl WalletBalance {
    pub fn new(deposit_balance: Decimal) -> Self {
        Self {
            deposit_balance,
            winning_balance: Decimal::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Transport-level failures talking to the Betting/Wallet API.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network failure: {0}")]
    Network(String),

    #[error("Server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// True when the server answered; false for timeouts and connectivity.
    pub fn is_server_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected { .. })
    }
}

/// Invalid mutations of a wager draft.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DraftError {
    #[error("Invalid {bet_type} key: '{key}'")]
    InvalidKey { bet_type: BetType, key: String },

    #[error("{operation} is not supported on a {bet_type} draft")]
    WrongBetType {
        operation: &'static str,
        bet_type: BetType,
    },

    #[error("Amount {amount} on '{key}' overflows the draft total")]
    AmountOverflow { key: String, amount: Decimal },
}

/// Reasons a submission is refused before (or instead of) reaching the network.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmitError {
    #[error("A submission is already in flight")]
    SubmissionInProgress,

    #[error("Game {game_id} is not open for betting (status: {status})")]
    GameNotOpen { game_id: String, status: GameStatus },

    #[error("Nothing to submit: no positive stakes in the draft")]
    EmptyWager,

    #[error("Stake {amount} on {number} outside limits {min}–{max}")]
    OutOfBounds {
        number: String,
        amount: Decimal,
        min: Decimal,
        max: Decimal,
    },

    #[error("Insufficient balance: need {needed:.2}, have {available:.2}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    #[error("Malformed draft: {0}")]
    MalformedDraft(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
