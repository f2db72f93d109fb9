//! Bet submission orchestrator.
//!
//! Validates a wager draft against the game snapshot (and wallet, when
//! known), sends it to the betting API and folds the per-leg results into
//! a `SubmissionReport`.
//!
//! - Jodi: one request for the single leg.
//! - Crossing: one request carrying the whole combination list; limits
//!   apply to the total stake.
//! - Haruf: one request per leg, sent sequentially. A failed leg is
//!   recorded and the loop moves on; nothing is retried automatically.
//!
//! Only one submission may be in flight per `Submitter`. There is no
//! idempotency key: resubmitting after an ambiguous failure (timeout after
//! the server committed) can place the same bet twice.

use rust_decimal::Decimal;
use secrecy::SecretString;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::{BetReceipt, BettingApi, PlaceBetRequest};
use crate::types::{ApiError, BetType, GameSnapshot, SubmitError};
use crate::wager::{WagerDraft, WagerLeg};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Upper bound on a single place-bet request before it is abandoned.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

// ---------------------------------------------------------------------------
// Outcomes and report
// ---------------------------------------------------------------------------

/// Why a single leg did not go through.
#[derive(Debug, Clone, PartialEq)]
pub enum LegFailure {
    /// Request abandoned after the timeout; the server may still have
    /// accepted it.
    Timeout,
    /// Connectivity or unreadable response.
    Network(String),
    /// The server answered and refused the bet.
    Rejected { status: u16, message: String },
}

impl LegFailure {
    /// Whether the bet may have been placed despite the failure.
    pub fn is_ambiguous(&self) -> bool {
        !matches!(self, LegFailure::Rejected { .. })
    }
}

impl fmt::Display for LegFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegFailure::Timeout => write!(f, "request timed out"),
            LegFailure::Network(msg) => write!(f, "network failure: {msg}"),
            LegFailure::Rejected { status, message } => write!(f, "rejected ({status}): {message}"),
        }
    }
}

impl From<ApiError> for LegFailure {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Timeout => LegFailure::Timeout,
            ApiError::Network(msg) => LegFailure::Network(msg),
            ApiError::Decode(msg) => LegFailure::Network(format!("unreadable response: {msg}")),
            ApiError::Rejected { status, message } => LegFailure::Rejected { status, message },
        }
    }
}

/// Result of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub leg: WagerLeg,
    pub success: bool,
    pub server_message: Option<String>,
    /// Optimistic wallet change (negative stake) for an accepted leg.
    pub balance_delta: Option<Decimal>,
    /// Balance the server reported after accepting the leg.
    pub current_balance: Option<Decimal>,
    pub failure: Option<LegFailure>,
}

impl SubmissionOutcome {
    pub fn accepted(leg: WagerLeg, receipt: BetReceipt) -> Self {
        let delta = -leg.amount;
        Self {
            leg,
            success: true,
            server_message: receipt.message,
            balance_delta: Some(delta),
            current_balance: receipt.current_balance,
            failure: None,
        }
    }

    pub fn failed(leg: WagerLeg, failure: LegFailure) -> Self {
        let server_message = match &failure {
            LegFailure::Rejected { message, .. } => Some(message.clone()),
            _ => None,
        };
        Self {
            leg,
            success: false,
            server_message,
            balance_delta: None,
            current_balance: None,
            failure: Some(failure),
        }
    }
}

/// Overall shape of a finished submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    AllSucceeded,
    /// Some legs were charged, some were not. The draft keeps the failed ones.
    PartialFailure,
    /// Nothing was charged (barring ambiguous network failures).
    AllFailed,
}

/// Aggregated result of one `submit` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReport {
    /// Correlation id for logs; not sent to the server.
    pub submission_id: String,
    pub bet_type: BetType,
    pub attempted: usize,
    pub succeeded: usize,
    /// Failed legs in submission order.
    pub failed_legs: Vec<(WagerLeg, LegFailure)>,
    pub outcomes: Vec<SubmissionOutcome>,
}

impl fmt::Display for SubmissionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} submission {}: {}/{} succeeded, debited {}",
            self.bet_type,
            self.submission_id,
            self.succeeded,
            self.attempted,
            self.total_debited(),
        )
    }
}

impl SubmissionReport {
    /// Fold per-leg outcomes (in submission order) into a report.
    pub fn from_outcomes(
        submission_id: impl Into<String>,
        bet_type: BetType,
        outcomes: Vec<SubmissionOutcome>,
    ) -> Self {
        let init = Self {
            submission_id: submission_id.into(),
            bet_type,
            attempted: 0,
            succeeded: 0,
            failed_legs: Vec::new(),
            outcomes: Vec::with_capacity(outcomes.len()),
        };

        outcomes.into_iter().fold(init, |mut report, outcome| {
            report.attempted += 1;
            if outcome.success {
                report.succeeded += 1;
            } else if let Some(failure) = &outcome.failure {
                report.failed_legs.push((outcome.leg.clone(), failure.clone()));
            }
            report.outcomes.push(outcome);
            report
        })
    }

    pub fn status(&self) -> ReportStatus {
        if self.succeeded == self.attempted {
            ReportStatus::AllSucceeded
        } else if self.succeeded == 0 {
            ReportStatus::AllFailed
        } else {
            ReportStatus::PartialFailure
        }
    }

    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }

    /// Sum of stakes the server accepted.
    pub fn total_debited(&self) -> Decimal {
        self.outcomes
            .iter()
            .filter(|o| o.success)
            .map(|o| o.leg.amount)
            .sum()
    }

    /// Net optimistic wallet change (zero or negative).
    pub fn balance_delta(&self) -> Decimal {
        self.outcomes.iter().filter_map(|o| o.balance_delta).sum()
    }

    /// Most recent server-reported balance, if any accepted leg carried one.
    pub fn latest_balance(&self) -> Option<Decimal> {
        self.outcomes.iter().rev().find_map(|o| o.current_balance)
    }

    /// Any failure where the bet may nevertheless have been placed.
    pub fn has_ambiguous_failures(&self) -> bool {
        self.failed_legs.iter().any(|(_, f)| f.is_ambiguous())
    }
}

// ---------------------------------------------------------------------------
// Submission context
// ---------------------------------------------------------------------------

/// Game and session a draft is submitted against.
#[derive(Debug, Clone, Copy)]
pub struct SubmitContext<'a> {
    pub game: &'a GameSnapshot,
    pub session: &'a SecretString,
    /// Deposit balance to check the total against, when known.
    pub available_balance: Option<Decimal>,
}

impl<'a> SubmitContext<'a> {
    pub fn new(game: &'a GameSnapshot, session: &'a SecretString) -> Self {
        Self {
            game,
            session,
            available_balance: None,
        }
    }

    pub fn with_balance(mut self, available: Decimal) -> Self {
        self.available_balance = Some(available);
        self
    }
}

// ---------------------------------------------------------------------------
// Busy guard
// ---------------------------------------------------------------------------

/// Holds the in-flight flag for the lifetime of one submission.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, SubmitError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard(flag))
            .map_err(|_| SubmitError::SubmissionInProgress)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Submitter
// ---------------------------------------------------------------------------

pub struct Submitter {
    api: Arc<dyn BettingApi>,
    request_timeout: Duration,
    in_flight: AtomicBool,
}

impl Submitter {
    pub fn new(api: Arc<dyn BettingApi>) -> Self {
        Self::with_timeout(api, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(api: Arc<dyn BettingApi>, request_timeout: Duration) -> Self {
        Self {
            api,
            request_timeout,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a submission is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Local checks, run before any network call.
    ///
    /// Returns the legs that would be submitted.
    pub fn validate(draft: &WagerDraft, ctx: &SubmitContext<'_>) -> Result<Vec<WagerLeg>, SubmitError> {
        let game = ctx.game;

        if draft.game_id() != game.id {
            return Err(SubmitError::MalformedDraft(format!(
                "draft is for game {} but the snapshot is for game {}",
                draft.game_id(),
                game.id
            )));
        }

        if !game.is_open() {
            return Err(SubmitError::GameNotOpen {
                game_id: game.id.clone(),
                status: game.current_status,
            });
        }

        let legs = draft.legs();
        if legs.is_empty() {
            return Err(SubmitError::EmptyWager);
        }

        let check = |number: &str, amount: Decimal| {
            if game.within_limits(amount) {
                Ok(())
            } else {
                Err(SubmitError::OutOfBounds {
                    number: number.to_string(),
                    amount,
                    min: game.min_bet,
                    max: game.max_bet,
                })
            }
        };

        match draft.bet_type() {
            BetType::Jodi => {
                if legs.len() > 1 {
                    return Err(SubmitError::MalformedDraft(format!(
                        "jodi draft holds {} legs; a jodi submission carries exactly one",
                        legs.len()
                    )));
                }
                check(&legs[0].number, legs[0].amount)?;
            }
            BetType::Crossing => check(draft.sequence(), draft.total())?,
            BetType::Haruf => {
                for leg in &legs {
                    check(&leg.key, leg.amount)?;
                }
            }
        }

        if let Some(available) = ctx.available_balance {
            let needed = draft.total();
            if needed > available {
                return Err(SubmitError::InsufficientBalance { needed, available });
            }
        }

        Ok(legs)
    }

    /// Submit `draft` and settle it against the result.
    ///
    /// Local precondition failures return `Err` without touching the
    /// network. Once requests start, the report is always produced, even
    /// when every leg fails. Afterwards the draft is settled: Jodi and
    /// Crossing drafts are cleared only on success; Haruf drafts lose
    /// their succeeded legs and keep the failed ones for retry.
    pub async fn submit(
        &self,
        draft: &mut WagerDraft,
        ctx: &SubmitContext<'_>,
    ) -> Result<SubmissionReport, SubmitError> {
        let _guard = BusyGuard::acquire(&self.in_flight)?;

        let legs = Self::validate(draft, ctx)?;
        let submission_id = uuid::Uuid::new_v4().to_string();
        let bet_type = draft.bet_type();

        info!(
            submission_id = %submission_id,
            game_id = %ctx.game.id,
            bet_type = %bet_type,
            legs = legs.len(),
            total = %draft.total(),
            "Submitting wager"
        );

        let outcomes = match bet_type {
            BetType::Haruf => {
                let mut outcomes = Vec::with_capacity(legs.len());
                for leg in legs {
                    let request = PlaceBetRequest::for_leg(&ctx.game.id, &leg);
                    outcomes.push(self.attempt(&request, leg, ctx.session).await);
                }
                outcomes
            }
            BetType::Jodi => {
                let leg = legs.into_iter().next().ok_or(SubmitError::EmptyWager)?;
                let request = PlaceBetRequest::for_leg(&ctx.game.id, &leg);
                vec![self.attempt(&request, leg, ctx.session).await]
            }
            BetType::Crossing => {
                let request = PlaceBetRequest::for_crossing(draft);
                let leg = WagerLeg {
                    key: draft.sequence().to_string(),
                    bet_type: BetType::Crossing,
                    number: draft.sequence().to_string(),
                    amount: request.bet_amount,
                    position: None,
                };
                vec![self.attempt(&request, leg, ctx.session).await]
            }
        };

        let report = SubmissionReport::from_outcomes(submission_id, bet_type, outcomes);
        settle_draft(draft, &report);

        info!(
            submission_id = %report.submission_id,
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed(),
            debited = %report.total_debited(),
            status = ?report.status(),
            "Submission complete"
        );

        Ok(report)
    }

    /// Send one request, bounded by the request timeout.
    async fn attempt(
        &self,
        request: &PlaceBetRequest,
        leg: WagerLeg,
        session: &SecretString,
    ) -> SubmissionOutcome {
        let result = match tokio::time::timeout(
            self.request_timeout,
            self.api.place_bet(request, session),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout),
        };

        match result {
            Ok(receipt) => {
                debug!(leg = %leg, "Leg accepted");
                SubmissionOutcome::accepted(leg, receipt)
            }
            Err(e) if e.is_server_rejection() => {
                warn!(leg = %leg, error = %e, "Leg rejected");
                SubmissionOutcome::failed(leg, e.into())
            }
            Err(e) => {
                warn!(leg = %leg, error = %e, "Leg failed, server outcome unknown");
                SubmissionOutcome::failed(leg, e.into())
            }
        }
    }
}

/// Terminal draft update once the report is final.
fn settle_draft(draft: &mut WagerDraft, report: &SubmissionReport) {
    if report.bet_type.submits_per_leg() {
        for outcome in report.outcomes.iter().filter(|o| o.success) {
            draft.remove_leg(&outcome.leg.key);
        }
    } else if report.status() == ReportStatus::AllSucceeded {
        draft.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
