//! Polling loop that drives the readiness predicate until it settles.

use std::time::Duration;

use kstatus_core::{CheckError, ObjectIdentity, ObjectStore, Pending, Readiness, ReadinessCheck, Statusable};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

#[derive(Debug)]
pub enum WaitOutcome {
    Ready,
    Failed(CheckError),
    /// Deadline hit; carries the last pending reason seen, if any.
    TimedOut(Option<Pending>),
}

impl WaitOutcome {
    pub fn is_ready(&self) -> bool { matches!(self, WaitOutcome::Ready) }
}

/// Serializable per-object summary for `-o json`.
#[derive(Debug, Serialize)]
pub struct WaitReport {
    pub object: ObjectIdentity,
    pub ready: bool,
    pub message: Option<String>,
}

impl WaitReport {
    pub fn new(object: &ObjectIdentity, outcome: &WaitOutcome) -> Self {
        let message = match outcome {
            WaitOutcome::Ready => None,
            WaitOutcome::Failed(e) => Some(e.to_string()),
            WaitOutcome::TimedOut(last) => Some(timeout_message(last.as_ref())),
        };
        Self { object: object.clone(), ready: outcome.is_ready(), message }
    }
}

/// Human-readable reason an object is still pending.
pub fn describe_pending(p: &Pending) -> String {
    match p {
        Pending::Stale { generation, observed_generation } => {
            format!("observed generation {} behind generation {}", observed_generation, generation)
        }
        Pending::MissingCondition => "no readiness condition reported".to_string(),
        Pending::Unknown { message } if !message.is_empty() => message.clone(),
        Pending::Unknown { .. } => "readiness unknown".to_string(),
        Pending::NotFound => "object not found".to_string(),
    }
}

pub fn timeout_message(last: Option<&Pending>) -> String {
    match last {
        Some(p) => format!("timed out: {}", describe_pending(p)),
        None => "timed out".to_string(),
    }
}

/// Invoke `check` immediately and then once per interval until the object is
/// ready, fails, or `opts.timeout` elapses. Invocations never overlap.
pub async fn wait_for<C, S>(
    check: &ReadinessCheck,
    store: &C,
    identity: &ObjectIdentity,
    object: &mut S,
    opts: PollOptions,
) -> WaitOutcome
where
    S: Statusable + ?Sized,
    S::Target: Send,
    C: ObjectStore<S::Target> + ?Sized,
{
    let mut last: Option<Pending> = None;
    let run = async {
        let mut ticker = tokio::time::interval(opts.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match check.check(store, identity, &mut *object).await {
                Ok(Readiness::Ready) => return WaitOutcome::Ready,
                Ok(Readiness::Pending(p)) => {
                    debug!(object = %identity, pending = ?p, "not ready yet");
                    last = Some(p);
                }
                Err(e) => return WaitOutcome::Failed(e),
            }
        }
    };
    let res = tokio::time::timeout(opts.timeout, run).await;
    let outcome = match res {
        Ok(outcome) => outcome,
        Err(_) => WaitOutcome::TimedOut(last),
    };
    info!(object = %identity, ready = outcome.is_ready(), "wait finished");
    outcome
}
