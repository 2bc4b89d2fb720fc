//! Background timers: the tamper recheck and the expiry tick.
//!
//! Both run as tokio tasks against a shared [`SecurityCore`]. Expiry is
//! still computed on every query; the tick only notices transitions so
//! they get logged and published to subscribers.

use crate::facade::SecurityCore;
use ascension_license::LicenseState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Handles to the running monitor tasks.
#[derive(Debug)]
pub struct SecurityMonitors {
    state: Arc<watch::Sender<LicenseState>>,
    tasks: Vec<JoinHandle<()>>,
}

impl SecurityMonitors {
    /// Starts the monitors. Must be called inside a tokio runtime.
    ///
    /// The tamper task only runs when the guard holds a baseline.
    #[must_use]
    pub fn spawn(core: Arc<SecurityCore>) -> Self {
        let (tx, _rx) = watch::channel(core.license().state());
        let state = Arc::new(tx);
        let mut tasks = Vec::with_capacity(2);

        if core.tamper_guard().is_armed() {
            let period = Duration::from_secs(core.config().tamper.interval_secs);
            tasks.push(tokio::spawn(run_tamper_checks(
                Arc::clone(&core),
                Arc::clone(&state),
                period,
            )));
        } else {
            info!("Tamper guard disabled; integrity monitor not started");
        }

        let period = Duration::from_secs(core.config().status_interval_secs);
        tasks.push(tokio::spawn(run_status_ticks(core, Arc::clone(&state), period)));

        Self { state, tasks }
    }

    /// Receives every license state transition the monitors observe.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LicenseState> {
        self.state.subscribe()
    }

    /// Last state published.
    #[must_use]
    pub fn last_state(&self) -> LicenseState {
        *self.state.borrow()
    }

    /// Number of tasks still running.
    #[must_use]
    pub fn running(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    /// Stops all monitor tasks.
    pub fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        debug!("Security monitors stopped");
    }
}

async fn run_tamper_checks(
    core: Arc<SecurityCore>,
    state: Arc<watch::Sender<LicenseState>>,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The baseline was just captured; skip the immediate first tick.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        // Hashing the whole executable is blocking file I/O.
        let checker = Arc::clone(&core);
        let outcome = match tokio::task::spawn_blocking(move || checker.check_tamper()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Tamper check task failed");
                continue;
            }
        };
        if outcome.is_violation() {
            error!(
                path = %core.tamper_guard().path().display(),
                ?outcome,
                "Program integrity check failed"
            );
            publish(&state, core.license().state());
            break;
        }
    }
}

async fn run_status_ticks(
    core: Arc<SecurityCore>,
    state: Arc<watch::Sender<LicenseState>>,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let current = core.license().state();
        if publish(&state, current) {
            log_transition(current);
        } else if current == LicenseState::ExpiredInGrace {
            if let Some(snapshot) = core.license().snapshot() {
                warn!(grace_seconds_left = snapshot.grace_seconds_left(), "License in grace period");
            }
        }
    }
}

/// Stores `next` if it differs. Returns true on a change.
fn publish(state: &watch::Sender<LicenseState>, next: LicenseState) -> bool {
    state.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    })
}

fn log_transition(state: LicenseState) {
    match state {
        LicenseState::Valid => info!(%state, "License state changed"),
        LicenseState::Unset => info!(%state, "License no longer active"),
        LicenseState::ExpiredInGrace => warn!(%state, "License expired; grace period running"),
        LicenseState::Expired => warn!(%state, "License expired; gated features disabled"),
        LicenseState::TamperLocked => error!(%state, "Licensing locked"),
    }
}
