//! Single-shot readiness predicate driven by a caller-owned polling loop.

use metrics::counter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::condition::{find_condition, ConditionStatus, READY_CONDITION};
use crate::identity::ObjectIdentity;
use crate::statusable::{resolve_conditions, Statusable};
use crate::store::{FetchError, ObjectStore};

/// Outcome of one evaluation that did not end in an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    Pending(Pending),
}

impl Readiness {
    pub fn is_ready(&self) -> bool { matches!(self, Readiness::Ready) }
}

/// Why the object is not ready yet. Every variant means "keep polling".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Pending {
    /// The controller has not caught up with the latest spec change.
    Stale { generation: i64, observed_generation: i64 },
    /// No condition of the watched type is reported yet.
    MissingCondition,
    Unknown { message: String },
    /// The object does not exist (yet); only under [`NotFoundPolicy::Retry`].
    NotFound,
}

/// Terminal outcomes surfaced to the polling loop.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The controller reported the watched condition as `False`.
    /// Displays the remote message verbatim.
    #[error("{message}")]
    Failed { message: String },
}

/// What a missing object means for the predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundPolicy {
    /// Stop: the object was deleted or never created.
    #[default]
    Fail,
    /// Keep polling: the object may not have been created yet.
    Retry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessCheck {
    pub condition_type: String,
    pub not_found: NotFoundPolicy,
}

impl Default for ReadinessCheck {
    fn default() -> Self { Self { condition_type: READY_CONDITION.to_string(), not_found: NotFoundPolicy::default() } }
}

impl ReadinessCheck {
    pub fn new() -> Self { Self::default() }

    pub fn condition_type(mut self, type_: impl Into<String>) -> Self {
        self.condition_type = type_.into();
        self
    }

    pub fn not_found(mut self, policy: NotFoundPolicy) -> Self {
        self.not_found = policy;
        self
    }

    /// Refresh `object` from `store` and evaluate it once.
    ///
    /// Fetch failures are returned as-is; this never retries.
    pub async fn check<C, S>(&self, store: &C, identity: &ObjectIdentity, object: &mut S) -> Result<Readiness, CheckError>
    where
        S: Statusable + ?Sized,
        S::Target: Send,
        C: ObjectStore<S::Target> + ?Sized,
    {
        counter!("readiness_checks").increment(1);
        if let Err(e) = store.fetch(identity, object.fetch_target()).await {
            if e.is_not_found() && self.not_found == NotFoundPolicy::Retry {
                debug!(object = %identity, "not found; waiting for creation");
                return Ok(Readiness::Pending(Pending::NotFound));
            }
            counter!("readiness_fetch_errors").increment(1);
            debug!(object = %identity, error = %e, "fetch failed");
            return Err(CheckError::Fetch(e));
        }
        let verdict = self.evaluate(object);
        match &verdict {
            Ok(Readiness::Ready) => counter!("readiness_ready").increment(1),
            Err(_) => counter!("readiness_failed").increment(1),
            Ok(Readiness::Pending(_)) => {}
        }
        debug!(object = %identity, verdict = ?verdict, "readiness evaluated");
        verdict
    }

    /// Evaluate an already refreshed object without touching the store.
    pub fn evaluate<S: Statusable + ?Sized>(&self, object: &S) -> Result<Readiness, CheckError> {
        let generation = object.generation();
        let observed_generation = object.observed_generation();
        if generation != observed_generation {
            return Ok(Readiness::Pending(Pending::Stale { generation, observed_generation }));
        }

        let conditions = resolve_conditions(object);
        let Some(c) = find_condition(&conditions, &self.condition_type) else {
            return Ok(Readiness::Pending(Pending::MissingCondition));
        };
        match c.status {
            ConditionStatus::True => Ok(Readiness::Ready),
            ConditionStatus::False => Err(CheckError::Failed { message: c.message.clone() }),
            ConditionStatus::Unknown => Ok(Readiness::Pending(Pending::Unknown { message: c.message.clone() })),
        }
    }
}

/// [`ReadinessCheck::check`] with the `Ready` condition and a failing not-found policy.
pub async fn check_ready<C, S>(store: &C, identity: &ObjectIdentity, object: &mut S) -> Result<Readiness, CheckError>
where
    S: Statusable + ?Sized,
    S::Target: Send,
    C: ObjectStore<S::Target> + ?Sized,
{
    ReadinessCheck::default().check(store, identity, object).await
}
