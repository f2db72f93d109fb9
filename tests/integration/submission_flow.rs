//! End-to-end wager flows against the in-memory betting API:
//! draft → submit → report → draft settlement → wallet reconcile.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_test::{assert_err, assert_ok};

use matka::engine::{
    FixedClock, GameMonitor, LegFailure, ReportStatus, SubmitContext, Submitter, WalletLedger,
};
use matka::api::BettingApi;
use matka::types::{ApiError, BetType, GameSnapshot, GameStatus, PayoutRates, SubmitError};
use matka::wager::WagerDraft;

use super::mock_api::{MockBettingApi, Scripted};

fn game(status: GameStatus) -> GameSnapshot {
    GameSnapshot {
        id: "desawar".into(),
        name: "Desawar".into(),
        game_type: "regular".into(),
        min_bet: dec!(10),
        max_bet: dec!(1000),
        start_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(23, 10, 0).unwrap(),
        result_time: NaiveTime::from_hms_opt(23, 45, 0).unwrap(),
        current_status: status,
        payouts: PayoutRates::default(),
    }
}

fn session() -> SecretString {
    SecretString::new("session-token".to_string())
}

fn haruf_draft() -> WagerDraft {
    let mut draft = WagerDraft::new("desawar", BetType::Haruf);
    draft.set_leg("A1", dec!(10)).unwrap();
    draft.set_leg("A2", dec!(20)).unwrap();
    draft.set_leg("A3", dec!(30)).unwrap();
    draft
}

#[tokio::test]
async fn test_empty_draft_never_reaches_api() {
    let api = Arc::new(MockBettingApi::new(dec!(100)));
    let submitter = Submitter::new(api.clone());
    let g = game(GameStatus::Open);
    let s = session();

    let mut draft = WagerDraft::new("desawar", BetType::Jodi);
    draft.set_leg("12", Decimal::ZERO).unwrap();

    let err = assert_err!(submitter.submit(&mut draft, &SubmitContext::new(&g, &s)).await);
    assert_eq!(err, SubmitError::EmptyWager);
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_haruf_partial_failure_then_retry() {
    let api = Arc::new(MockBettingApi::new(dec!(500)));
    api.script([
        Scripted::Accept,
        Scripted::Reject("Digit limit reached"),
        Scripted::Accept,
    ]);
    let submitter = Submitter::new(api.clone());
    let g = game(GameStatus::Open);
    let s = session();
    let ctx = SubmitContext::new(&g, &s);
    let mut draft = haruf_draft();

    let report = assert_ok!(submitter.submit(&mut draft, &ctx).await);
    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.status(), ReportStatus::PartialFailure);
    assert_eq!(report.failed_legs.len(), 1);
    assert_eq!(report.failed_legs[0].0.key, "A2");
    assert_eq!(
        report.failed_legs[0].1,
        LegFailure::Rejected {
            status: 400,
            message: "Digit limit reached".into()
        }
    );

    // Sent sequentially in key order.
    let numbers: Vec<String> = api.requests().into_iter().map(|r| r.bet_number).collect();
    assert_eq!(numbers, vec!["1", "2", "3"]);

    // Only the failed leg is left for retry.
    assert_eq!(draft.leg_count(), 1);
    assert_eq!(draft.amount("A2"), Some(dec!(20)));

    // Resubmitting the untouched draft sends only that leg.
    let retry = assert_ok!(submitter.submit(&mut draft, &ctx).await);
    assert_eq!(retry.status(), ReportStatus::AllSucceeded);
    assert_eq!(api.requests().len(), 4);
    assert!(draft.is_empty());
    assert_eq!(api.balance(), dec!(440));
}

#[tokio::test]
async fn test_timeout_abandons_only_that_leg() {
    let api = Arc::new(MockBettingApi::new(dec!(500)));
    api.script([Scripted::Accept, Scripted::Hang, Scripted::Accept]);
    let submitter = Submitter::with_timeout(api.clone(), Duration::from_millis(50));
    let g = game(GameStatus::Open);
    let s = session();
    let mut draft = haruf_draft();

    let report = assert_ok!(submitter.submit(&mut draft, &SubmitContext::new(&g, &s)).await);

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed_legs[0].1, LegFailure::Timeout);
    assert!(report.has_ambiguous_failures());
    assert_eq!(api.requests().len(), 3);
    assert_eq!(draft.amount("A2"), Some(dec!(20)));
    assert!(!submitter.is_busy());
}

#[tokio::test]
async fn test_network_failure_recorded_per_leg() {
    let api = Arc::new(MockBettingApi::new(dec!(500)));
    api.script([
        Scripted::Fail(ApiError::Network("connection reset".into())),
        Scripted::Fail(ApiError::Timeout),
        Scripted::Fail(ApiError::Network("connection reset".into())),
    ]);
    let submitter = Submitter::new(api.clone());
    let g = game(GameStatus::Open);
    let s = session();
    let mut draft = haruf_draft();

    let report = assert_ok!(submitter.submit(&mut draft, &SubmitContext::new(&g, &s)).await);
    assert_eq!(report.status(), ReportStatus::AllFailed);
    assert_eq!(report.failed_legs.len(), 3);
    assert_eq!(draft.total(), dec!(60));
    assert_eq!(api.balance(), dec!(500));
}

#[tokio::test]
async fn test_overlapping_submit_is_rejected() {
    let gate = Arc::new(Notify::new());
    let api = Arc::new(MockBettingApi::gated(dec!(500), gate.clone()));
    let submitter = Submitter::new(api.clone());
    let g = game(GameStatus::Open);
    let s = session();
    let ctx = SubmitContext::new(&g, &s);

    let mut first = WagerDraft::new("desawar", BetType::Jodi);
    first.set_leg("47", dec!(50)).unwrap();
    let mut second = WagerDraft::new("desawar", BetType::Jodi);
    second.set_leg("74", dec!(50)).unwrap();

    let (first_result, second_result) = tokio::join!(submitter.submit(&mut first, &ctx), async {
        let result = submitter.submit(&mut second, &ctx).await;
        gate.notify_one();
        result
    });

    assert_eq!(second_result.unwrap_err(), SubmitError::SubmissionInProgress);
    assert_eq!(first_result.unwrap().status(), ReportStatus::AllSucceeded);
    assert_eq!(api.requests().len(), 1);
    assert!(first.is_empty());
    assert_eq!(second.amount("74"), Some(dec!(50)));
    assert!(!submitter.is_busy());
}

#[tokio::test]
async fn test_crossing_flow_updates_wallet() {
    let api = Arc::new(MockBettingApi::new(dec!(500)));
    let submitter = Submitter::new(api.clone());
    let g = game(GameStatus::Open);
    let s = session();

    let mut ledger = WalletLedger::new(api.fetch_wallet(&s).await.unwrap());

    let mut draft = WagerDraft::new("desawar", BetType::Crossing);
    draft.set_crossing("23", dec!(10)).unwrap();
    assert_eq!(draft.total(), dec!(40));

    let ctx = SubmitContext::new(&g, &s).with_balance(ledger.available());
    let report = assert_ok!(submitter.submit(&mut draft, &ctx).await);

    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    let payload = requests[0].crossing.clone().unwrap();
    assert_eq!(payload.numbers, vec!["22", "23", "32", "33"]);
    assert_eq!(payload.total, dec!(40));
    assert!(draft.is_empty());

    ledger.apply_report(&report);
    assert_eq!(ledger.available(), dec!(460));
    assert_eq!(report.latest_balance(), Some(dec!(460)));

    let drift = ledger.reconcile(api.fetch_wallet(&s).await.unwrap());
    assert_eq!(drift, Decimal::ZERO);
}

#[tokio::test]
async fn test_crossing_over_balance_is_refused_locally() {
    let api = Arc::new(MockBettingApi::new(dec!(30)));
    let submitter = Submitter::new(api.clone());
    let g = game(GameStatus::Open);
    let s = session();

    let mut draft = WagerDraft::new("desawar", BetType::Crossing);
    draft.set_crossing("23", dec!(10)).unwrap();

    let ctx = SubmitContext::new(&g, &s).with_balance(dec!(30));
    let err = assert_err!(submitter.submit(&mut draft, &ctx).await);
    assert!(matches!(err, SubmitError::InsufficientBalance { .. }));
    assert!(api.requests().is_empty());

    // Joda Cut halves the selection and fits the balance.
    draft.toggle_joda_cut(true).unwrap();
    let report = assert_ok!(submitter.submit(&mut draft, &ctx).await);
    assert_eq!(report.total_debited(), dec!(20));
}

#[tokio::test]
async fn test_closed_game_blocks_submission() {
    let api = Arc::new(MockBettingApi::new(dec!(500)));
    let submitter = Submitter::new(api.clone());
    let g = game(GameStatus::ResultDeclared);
    let s = session();
    let mut draft = haruf_draft();

    let err = assert_err!(submitter.submit(&mut draft, &SubmitContext::new(&g, &s)).await);
    assert!(matches!(err, SubmitError::GameNotOpen { .. }));
    assert!(api.requests().is_empty());
    assert_eq!(draft.leg_count(), 3);
}

#[tokio::test]
async fn test_monitor_serves_last_known_snapshot() {
    let api = Arc::new(MockBettingApi::new(dec!(0)));
    api.set_game(Some(game(GameStatus::Open)));
    let mut monitor = GameMonitor::new(api.clone(), "desawar");

    assert!(monitor.refresh().await.is_some());

    api.set_game(None);
    let fallback = monitor.refresh().await.cloned().unwrap();
    assert_eq!(fallback.current_status, GameStatus::Open);
    assert_eq!(monitor.consecutive_failures(), 1);

    let clock = FixedClock(NaiveTime::from_hms_opt(23, 59, 30).unwrap());
    let countdown = monitor.countdown(&clock).unwrap();
    assert_eq!((countdown.hours, countdown.minutes), (23, 11));
}

#[tokio::test]
async fn test_undecodable_reply_is_ambiguous() {
    let api = Arc::new(MockBettingApi::new(dec!(500)));
    api.script([Scripted::Fail(ApiError::Decode(
        "HTTP 201 place-bet response without a success flag".into(),
    ))]);
    let submitter = Submitter::new(api.clone());
    let g = game(GameStatus::Open);
    let s = session();

    let mut draft = WagerDraft::new("desawar", BetType::Jodi);
    draft.set_leg("47", dec!(50)).unwrap();

    let report = assert_ok!(submitter.submit(&mut draft, &SubmitContext::new(&g, &s)).await);
    assert_eq!(report.status(), ReportStatus::AllFailed);
    assert!(report.has_ambiguous_failures());
    assert!(matches!(report.failed_legs[0].1, LegFailure::Network(_)));
    assert_eq!(draft.amount("47"), Some(dec!(50)));
}
