//! Mock betting API for integration testing.
//!
//! Deterministic, in-memory `BettingApi`: place-bet answers are scripted
//! per call, every request is recorded, and the wallet balance is debited
//! for accepted bets. An optional gate holds each place-bet call until
//! the test releases it.

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::SecretString;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use matka::api::{BetReceipt, BettingApi, PlaceBetRequest};
use matka::types::{ApiError, GameSnapshot, WalletBalance};

/// Scripted answer for one place-bet call.
#[derive(Debug, Clone)]
pub enum Scripted {
    Accept,
    Reject(&'static str),
    Fail(ApiError),
    /// Never answers; the caller's timeout has to abandon it.
    Hang,
}

pub struct MockBettingApi {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<PlaceBetRequest>>,
    balance: Mutex<Decimal>,
    game: Mutex<Option<GameSnapshot>>,
    gate: Option<Arc<Notify>>,
}

impl MockBettingApi {
    /// Accepts every bet unless scripted otherwise.
    pub fn new(balance: Decimal) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            balance: Mutex::new(balance),
            game: Mutex::new(None),
            gate: None,
        }
    }

    /// Hold every place-bet call until `gate` is notified.
    pub fn gated(balance: Decimal, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(balance)
        }
    }

    /// Queue answers for the next place-bet calls, in order.
    pub fn script(&self, answers: impl IntoIterator<Item = Scripted>) {
        self.script.lock().unwrap().extend(answers);
    }

    pub fn set_game(&self, game: Option<GameSnapshot>) {
        *self.game.lock().unwrap() = game;
    }

    /// Every place-bet request received so far.
    pub fn requests(&self) -> Vec<PlaceBetRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn balance(&self) -> Decimal {
        *self.balance.lock().unwrap()
    }
}

#[async_trait]
impl BettingApi for MockBettingApi {
    async fn place_bet(
        &self,
        request: &PlaceBetRequest,
        _session: &SecretString,
    ) -> Result<BetReceipt, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        let answer = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Scripted::Accept);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match answer {
            Scripted::Accept => {
                let mut balance = self.balance.lock().unwrap();
                if *balance < request.bet_amount {
                    return Err(ApiError::Rejected {
                        status: 402,
                        message: "Insufficient balance".into(),
                    });
                }
                *balance -= request.bet_amount;
                Ok(BetReceipt {
                    current_balance: Some(*balance),
                    message: None,
                })
            }
            Scripted::Reject(message) => Err(ApiError::Rejected {
                status: 400,
                message: message.to_string(),
            }),
            Scripted::Fail(err) => Err(err),
            Scripted::Hang => {
                std::future::pending::<()>().await;
                unreachable!("pending future never resolves")
            }
        }
    }

    async fn fetch_game(&self, game_id: &str) -> Result<GameSnapshot, ApiError> {
        self.game
            .lock()
            .unwrap()
            .clone()
            .filter(|g| g.id == game_id)
            .ok_or_else(|| ApiError::Rejected {
                status: 404,
                message: format!("Game not found: {game_id}"),
            })
    }

    async fn fetch_wallet(&self, _session: &SecretString) -> Result<WalletBalance, ApiError> {
        Ok(WalletBalance::new(self.balance()))
    }
}
