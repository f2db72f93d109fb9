//! Matka client game watcher.
//!
//! Loads configuration, initialises structured logging, then polls the
//! configured game and the wallet, logging the bet-window countdown each
//! tick until Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use matka::api::http::HttpBettingApi;
use matka::api::BettingApi;
use matka::config::AppConfig;
use matka::engine::{Clock, GameMonitor, SystemClock, WalletLedger};

const CONFIG_PATH: &str = "config.toml";

/// Countdown log cadence.
const TICK: Duration = Duration::from_secs(1);

/// Log the countdown every N ticks so the log stays readable.
const COUNTDOWN_LOG_EVERY: u64 = 60;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_PATH.to_string());
    let cfg = AppConfig::load(&path)?;

    init_logging();

    info!(
        base_url = %cfg.api.base_url,
        game_id = %cfg.client.game_id,
        poll_interval_secs = cfg.client.poll_interval_secs,
        "Matka client starting up"
    );

    let session = cfg.api.session_token()?;
    let api: Arc<dyn BettingApi> = Arc::new(HttpBettingApi::new(
        &cfg.api.base_url,
        cfg.api.request_timeout(),
    )?);

    let mut monitor = GameMonitor::new(api.clone(), cfg.client.game_id.clone());
    let clock = SystemClock;

    let mut ledger = match api.fetch_wallet(&session).await {
        Ok(balance) => {
            info!(balance = %balance, "Wallet loaded");
            Some(WalletLedger::new(balance))
        }
        Err(e) => {
            warn!(error = %e, "Wallet unavailable at startup");
            None
        }
    };

    let mut poll = tokio::time::interval(Duration::from_secs(cfg.client.poll_interval_secs));
    let mut wallet_poll =
        tokio::time::interval(Duration::from_secs(cfg.client.wallet_interval_secs.max(1)));
    let mut tick = tokio::time::interval(TICK);
    let mut ticks: u64 = 0;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Entering watch loop. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = poll.tick() => {
                if let Some(game) = monitor.refresh().await {
                    info!(game = %game, "Game snapshot");
                }
            }
            _ = wallet_poll.tick() => {
                match api.fetch_wallet(&session).await {
                    Ok(balance) => match ledger.as_mut() {
                        Some(l) => {
                            l.reconcile(balance);
                        }
                        None => ledger = Some(WalletLedger::new(balance)),
                    },
                    Err(e) => warn!(error = %e, "Wallet refresh failed"),
                }
            }
            _ = tick.tick() => {
                ticks += 1;
                if ticks % COUNTDOWN_LOG_EVERY == 0 {
                    log_countdown(&monitor, &clock, ledger.as_ref());
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!("Matka client shut down cleanly.");
    Ok(())
}

fn log_countdown(monitor: &GameMonitor, clock: &dyn Clock, ledger: Option<&WalletLedger>) {
    let Some(game) = monitor.snapshot() else {
        warn!(game_id = %monitor.game_id(), "No game snapshot yet");
        return;
    };

    match monitor.countdown(clock) {
        Some(countdown) => info!(
            game_id = %game.id,
            status = %game.current_status,
            remaining = %countdown,
            deposit = ?ledger.map(|l| l.available()),
            "Bet window"
        ),
        None => info!(
            game_id = %game.id,
            status = %game.current_status,
            "No upcoming boundary"
        ),
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("matka=info"));

    let json_logging = std::env::var("MATKA_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
