//! Status conditions as reported by resource controllers.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Well-known condition type that signals overall readiness.
pub const READY_CONDITION: &str = "Ready";

/// Tri-state condition value. Anything the store reports that is not
/// `True` or `False` reads as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

impl From<&str> for ConditionStatus {
    fn from(s: &str) -> Self {
        match s {
            "True" => ConditionStatus::True,
            "False" => ConditionStatus::False,
            _ => ConditionStatus::Unknown,
        }
    }
}

impl From<String> for ConditionStatus {
    fn from(s: String) -> Self { ConditionStatus::from(s.as_str()) }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default, deserialize_with = "null_as_unknown")]
    pub status: ConditionStatus,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reason: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// RFC 3339 timestamp, kept as the store rendered it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

impl Condition {
    pub fn new(type_: impl Into<String>, status: ConditionStatus, message: impl Into<String>) -> Self {
        Self { type_: type_.into(), status, message: message.into(), ..Default::default() }
    }
}

// Loosely-typed CRDs emit `null` for unset strings.
fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn null_as_unknown<'de, D: Deserializer<'de>>(d: D) -> Result<ConditionStatus, D::Error> {
    Ok(Option::<String>::deserialize(d)?.map(ConditionStatus::from).unwrap_or_default())
}

/// First condition of `type_` in traversal order.
pub fn find_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}
