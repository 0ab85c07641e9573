//! The store-client seam consumed by the readiness predicate.

use async_trait::async_trait;
use thiserror::Error;

use crate::identity::ObjectIdentity;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0} not found")]
    NotFound(ObjectIdentity),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool { matches!(self, FetchError::NotFound(_)) }
}

/// Fetches an object by identity into a caller-owned handle.
///
/// Implementations must leave `into` untouched when they return an error.
#[async_trait]
pub trait ObjectStore<T: Send>: Send + Sync {
    async fn fetch(&self, identity: &ObjectIdentity, into: &mut T) -> Result<(), FetchError>;
}
