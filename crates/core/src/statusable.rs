//! Capability traits a resource kind implements to be evaluated.

use std::borrow::Cow;

use crate::condition::Condition;

/// A resource instance exposing the generation pair and a fetch handle.
///
/// Any kind implementing this trait is evaluated by the same predicate; the
/// adapter decides which condition capability it exposes via
/// [`Statusable::condition_source`].
pub trait Statusable {
    /// Handle the store client refreshes in place.
    type Target;

    /// Generation of the declared state, bumped by the store on every spec change.
    fn generation(&self) -> i64;

    /// Last generation the resource's own controller finished processing.
    /// Zero before the first reconciliation.
    fn observed_generation(&self) -> i64;

    fn fetch_target(&mut self) -> &mut Self::Target;

    fn condition_source(&self) -> ConditionSource<'_> { ConditionSource::Absent }
}

/// Current conditions capability: the list is returned directly.
pub trait ObjectWithConditions {
    fn conditions(&self) -> &[Condition];
}

/// Deprecated conditions capability, returning the slot that holds the list.
/// Kept for kinds that have not migrated to [`ObjectWithConditions`].
pub trait LegacyStatusConditions {
    fn status_conditions(&self) -> Option<&Vec<Condition>>;
}

/// Where an object's conditions come from, picked by the adapter.
#[derive(Debug, Clone)]
pub enum ConditionSource<'a> {
    Current(Cow<'a, [Condition]>),
    Deprecated(Option<&'a Vec<Condition>>),
    Absent,
}

impl<'a> ConditionSource<'a> {
    pub fn current<T: ObjectWithConditions + ?Sized>(object: &'a T) -> Self {
        ConditionSource::Current(Cow::Borrowed(object.conditions()))
    }

    pub fn deprecated<T: LegacyStatusConditions + ?Sized>(object: &'a T) -> Self {
        ConditionSource::Deprecated(object.status_conditions())
    }

    /// Conditions decoded on the fly, e.g. from an untyped object.
    pub fn owned(conditions: Vec<Condition>) -> Self { ConditionSource::Current(Cow::Owned(conditions)) }
}

/// Conditions of `object`, current capability first, then the deprecated one.
/// Yields an empty list when neither applies.
pub fn resolve_conditions<S: Statusable + ?Sized>(object: &S) -> Cow<'_, [Condition]> {
    match object.condition_source() {
        ConditionSource::Current(conditions) => conditions,
        ConditionSource::Deprecated(Some(slot)) => Cow::Borrowed(slot.as_slice()),
        ConditionSource::Deprecated(None) | ConditionSource::Absent => Cow::Owned(Vec::new()),
    }
}
