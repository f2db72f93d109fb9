//! Wallet ledger: optimistic balance tracking.
//!
//! Applies the balance deltas carried by submission reports as soon as
//! they arrive, and reconciles with the authoritative wallet fetch that
//! follows. The ledger is eventually consistent with the server, never
//! strongly.

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::submitter::SubmissionReport;
use crate::types::WalletBalance;

#[derive(Debug, Clone)]
pub struct WalletLedger {
    balance: WalletBalance,
    /// Optimistic change applied since the last reconcile.
    pending_delta: Decimal,
}

impl WalletLedger {
    pub fn new(balance: WalletBalance) -> Self {
        Self {
            balance,
            pending_delta: Decimal::ZERO,
        }
    }

    pub fn balance(&self) -> &WalletBalance {
        &self.balance
    }

    /// Deposit balance available for new wagers.
    pub fn available(&self) -> Decimal {
        self.balance.deposit_balance
    }

    pub fn pending_delta(&self) -> Decimal {
        self.pending_delta
    }

    /// Whether optimistic changes await confirmation by a wallet fetch.
    pub fn needs_refresh(&self) -> bool {
        !self.pending_delta.is_zero()
    }

    /// Apply a report's accepted stakes to the deposit balance.
    pub fn apply_report(&mut self, report: &SubmissionReport) {
        let delta = report.balance_delta();
        if delta.is_zero() {
            return;
        }

        self.balance.deposit_balance += delta;
        self.pending_delta += delta;

        info!(
            submission_id = %report.submission_id,
            delta = %delta,
            deposit = %self.balance.deposit_balance,
            "Applied optimistic balance change"
        );
    }

    /// Replace the local view with an authoritative wallet fetch.
    ///
    /// Returns the drift between the optimistic and the server balance.
    pub fn reconcile(&mut self, fetched: WalletBalance) -> Decimal {
        let drift = fetched.deposit_balance - self.balance.deposit_balance;
        if !drift.is_zero() {
            warn!(
                local = %self.balance.deposit_balance,
                server = %fetched.deposit_balance,
                drift = %drift,
                "Wallet drifted from optimistic balance"
            );
        }

        self.balance = fetched;
        self.pending_delta = Decimal::ZERO;
        drift
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
