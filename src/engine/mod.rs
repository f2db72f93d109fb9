//! Core engine: bet-window clock, game monitor, submission orchestrator
//! and wallet ledger.

pub mod clock;
pub mod monitor;
pub mod submitter;
pub mod wallet;

pub use clock::{Clock, Countdown, FixedClock, SystemClock};
pub use monitor::GameMonitor;
pub use submitter::{
    LegFailure, ReportStatus, SubmissionOutcome, SubmissionReport, SubmitContext, Submitter,
};
pub use wallet::WalletLedger;
