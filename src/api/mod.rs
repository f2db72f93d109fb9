//! Betting and wallet API integration.
//!
//! Defines the `BettingApi` trait the engine talks to, the wire shape of
//! a place-bet request, and an HTTP implementation in [`http`].

pub mod http;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Serialize;

use crate::types::{ApiError, BetType, GameSnapshot, HarufPosition, WalletBalance};
use crate::wager::{WagerDraft, WagerLeg};

// ---------------------------------------------------------------------------
// Request / receipt types
// ---------------------------------------------------------------------------

/// Aggregated Crossing payload: the full combination list in one bet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossingPayload {
    pub numbers: Vec<String>,
    pub per_unit_amount: Decimal,
    pub joda_cut: bool,
    pub total: Decimal,
}

/// Body of a place-bet call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBetRequest {
    pub game_id: String,
    pub bet_type: BetType,
    pub bet_number: String,
    pub bet_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub haruf_position: Option<HarufPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crossing: Option<CrossingPayload>,
}

impl PlaceBetRequest {
    /// Request for a single Jodi bet or one Haruf leg.
    pub fn for_leg(game_id: &str, leg: &WagerLeg) -> Self {
        Self {
            game_id: game_id.to_string(),
            bet_type: leg.bet_type,
            bet_number: leg.number.clone(),
            bet_amount: leg.amount,
            haruf_position: leg.position,
            crossing: None,
        }
    }

    /// One logical bet carrying the draft's whole active combination list.
    pub fn for_crossing(draft: &WagerDraft) -> Self {
        let joda_cut = draft.joda_cut_enabled();
        let set = draft.combinations();
        let total = set.total(joda_cut);

        Self {
            game_id: draft.game_id().to_string(),
            bet_type: BetType::Crossing,
            bet_number: draft.sequence().to_string(),
            bet_amount: total,
            haruf_position: None,
            crossing: Some(CrossingPayload {
                numbers: set.numbers(joda_cut),
                per_unit_amount: set.stake(),
                joda_cut,
                total,
            }),
        }
    }
}

/// What the server tells us about an accepted bet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BetReceipt {
    /// Authoritative balance after the bet, when the server includes it.
    pub current_balance: Option<Decimal>,
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Abstraction over the remote Betting/Wallet API.
///
/// Implementations translate transport failures into [`ApiError`];
/// `Rejected` is reserved for answers from the server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BettingApi: Send + Sync {
    /// Place one bet. A receipt means the server accepted it.
    async fn place_bet(
        &self,
        request: &PlaceBetRequest,
        session: &SecretString,
    ) -> Result<BetReceipt, ApiError>;

    /// Fetch the current snapshot of a game.
    async fn fetch_game(&self, game_id: &str) -> Result<GameSnapshot, ApiError>;

    /// Fetch the wallet balances of the session's user.
    async fn fetch_wallet(&self, session: &SecretString) -> Result<WalletBalance, ApiError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
