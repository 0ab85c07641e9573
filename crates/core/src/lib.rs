//! kstatus core: decide whether a managed object has reached its desired state.
//!
//! Resource kinds plug in through [`Statusable`]; the evaluator never inspects
//! concrete types. A caller-owned polling loop drives [`check_ready`] until it
//! reports ready, fails, or the caller gives up.

#![forbid(unsafe_code)]

pub mod condition;
pub mod identity;
pub mod ready;
pub mod statusable;
pub mod store;

pub use condition::{find_condition, Condition, ConditionStatus, READY_CONDITION};
pub use identity::{build_references, component_references, ObjectIdentity};
pub use ready::{check_ready, CheckError, NotFoundPolicy, Pending, Readiness, ReadinessCheck};
pub use statusable::{resolve_conditions, ConditionSource, LegacyStatusConditions, ObjectWithConditions, Statusable};
pub use store::{FetchError, ObjectStore};
