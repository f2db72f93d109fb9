//! HTTP client for the Matka betting backend.
//!
//! Endpoints (relative to the configured base URL):
//! - `POST /bets/place`        place a bet (bearer session token)
//! - `GET  /games/{id}`        game snapshot (public)
//! - `GET  /wallet/balance`    wallet balances (bearer session token)
//!
//! Responses may be bare objects or wrapped as `{ "data": ... }`.
//! Every request is bounded by the client-wide timeout.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{BetReceipt, BettingApi, PlaceBetRequest};
use crate::types::{ApiError, GameSnapshot, WalletBalance};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const USER_AGENT: &str = "matka-client/0.1.0";

/// Fallback message when the server rejects a bet without saying why.
const DEFAULT_REJECTION: &str = "Bet rejected by server";

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

/// Response from `POST /bets/place`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceBetResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    current_balance: Option<Decimal>,
    #[serde(default)]
    message: Option<String>,
}

impl PlaceBetResponse {
    /// Interpret a 2xx place-bet body.
    ///
    /// Only an explicit `success: false` is a rejection. A body without the
    /// flag may belong to a committed bet, so it is reported as undecodable.
    fn into_receipt(self, status: u16) -> Result<BetReceipt, ApiError> {
        match self.success {
            Some(true) => Ok(BetReceipt {
                current_balance: self.current_balance,
                message: self.message,
            }),
            Some(false) => {
                let message = self
                    .message
                    .unwrap_or_else(|| DEFAULT_REJECTION.to_string());
                warn!(status, message = %message, "Bet refused");
                Err(ApiError::Rejected { status, message })
            }
            None => {
                warn!(status, "Place-bet response carries no success flag");
                Err(ApiError::Decode(format!(
                    "HTTP {status} place-bet response without a success flag"
                )))
            }
        }
    }
}

/// Error body shape used by the backend on non-2xx answers.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(inner) => inner,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// `reqwest`-backed [`BettingApi`].
pub struct HttpBettingApi {
    http: Client,
    base_url: String,
}

impl HttpBettingApi {
    /// Create a client for `base_url` with a per-request `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client for betting API")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn game_url(&self, game_id: &str) -> String {
        format!("{}/games/{}", self.base_url, urlencoding::encode(game_id))
    }

    /// Turn a non-2xx response into `ApiError::Rejected`.
    async fn rejection(resp: Response) -> ApiError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        ApiError::Rejected {
            status,
            message: rejection_message(&body, status),
        }
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let envelope: Envelope<T> = resp.json().await.map_err(map_transport)?;
        Ok(envelope.into_inner())
    }
}

/// Map a `reqwest` failure onto the transport taxonomy.
fn map_transport(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Network(err.to_string())
    }
}

/// Best human-readable message from an error body.
fn rejection_message(body: &str, status: u16) -> String {
    let parsed = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty());

    match parsed {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => format!("HTTP {status}"),
    }
}

// ---------------------------------------------------------------------------
// BettingApi trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl BettingApi for HttpBettingApi {
    async fn place_bet(
        &self,
        request: &PlaceBetRequest,
        session: &SecretString,
    ) -> Result<BetReceipt, ApiError> {
        let url = format!("{}/bets/place", self.base_url);
        debug!(
            url = %url,
            game_id = %request.game_id,
            bet_type = %request.bet_type,
            number = %request.bet_number,
            amount = %request.bet_amount,
            "Placing bet"
        );

        let resp = self
            .http
            .post(&url)
            .bearer_auth(session.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(map_transport)?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }

        let status = resp.status().as_u16();
        let body: PlaceBetResponse = resp.json().await.map_err(map_transport)?;
        let receipt = body.into_receipt(status)?;

        info!(
            game_id = %request.game_id,
            bet_type = %request.bet_type,
            number = %request.bet_number,
            amount = %request.bet_amount,
            balance = ?receipt.current_balance,
            "Bet placed"
        );

        Ok(receipt)
    }

    async fn fetch_game(&self, game_id: &str) -> Result<GameSnapshot, ApiError> {
        let resp = self
            .http
            .get(self.game_url(game_id))
            .send()
            .await
            .map_err(map_transport)?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }

        Self::decode(resp).await
    }

    async fn fetch_wallet(&self, session: &SecretString) -> Result<WalletBalance, ApiError> {
        let resp = self
            .http
            .get(format!("{}/wallet/balance", self.base_url))
            .bearer_auth(session.expose_secret())
            .send()
            .await
            .map_err(map_transport)?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }

        Self::decode(resp).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
