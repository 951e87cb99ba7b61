//! Typed access to JSON records in a [`SharedStore`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::{SharedStore, StorePath, Versioned};
use crate::errors::domain::{DomainError, InfraErrorKind};

/// Bound on create-if-absent retries when a record flickers between present
/// and absent under us.
const CREATE_ATTEMPTS: usize = 3;

/// A decoded record together with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    pub value: T,
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Created<T> {
    /// This caller's write landed.
    Created(Stored<T>),
    /// Someone else got there first; this is their record.
    Existing(Stored<T>),
}

impl<T> Created<T> {
    pub fn into_stored(self) -> Stored<T> {
        match self {
            Created::Created(s) | Created::Existing(s) => s,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Created::Created(_))
    }
}

pub fn encode<T: Serialize>(path: &StorePath, value: &T) -> Result<Value, DomainError> {
    serde_json::to_value(value).map_err(|e| {
        DomainError::infra(
            InfraErrorKind::DataCorruption,
            format!("{path}: record could not be encoded: {e}"),
        )
    })
}

pub fn decode<T: DeserializeOwned>(
    path: &StorePath,
    snapshot: Versioned,
) -> Result<Stored<T>, DomainError> {
    let value = serde_json::from_value(snapshot.value).map_err(|e| {
        warn!(path = %path, error = %e, "undecodable record");
        DomainError::infra(
            InfraErrorKind::DataCorruption,
            format!("{path}: record could not be decoded: {e}"),
        )
    })?;
    Ok(Stored {
        value,
        version: snapshot.version,
    })
}

pub async fn read_typed<T, S>(store: &S, path: &StorePath) -> Result<Option<Stored<T>>, DomainError>
where
    T: DeserializeOwned,
    S: SharedStore + ?Sized,
{
    store
        .read(path)
        .await?
        .map(|snap| decode(path, snap))
        .transpose()
}

pub async fn cas_typed<T, S>(
    store: &S,
    path: &StorePath,
    expected: Option<u64>,
    value: &T,
) -> Result<u64, DomainError>
where
    T: Serialize + Sync,
    S: SharedStore + ?Sized,
{
    let encoded = encode(path, value)?;
    store.compare_and_set(path, expected, encoded).await
}

/// First-write-wins creation. Losing the race is not an error: the caller gets
/// the winner's record back.
pub async fn create_if_absent<T, S>(
    store: &S,
    path: &StorePath,
    value: T,
) -> Result<Created<T>, DomainError>
where
    T: Serialize + DeserializeOwned + Send + Sync,
    S: SharedStore + ?Sized,
{
    let encoded = encode(path, &value)?;
    let mut last_err = None;
    for _ in 0..CREATE_ATTEMPTS {
        match store.compare_and_set(path, None, encoded.clone()).await {
            Ok(version) => {
                return Ok(Created::Created(Stored {
                    value,
                    version,
                }))
            }
            Err(e) if e.is_optimistic_lock() => {
                if let Some(existing) = read_typed::<T, S>(store, path).await? {
                    return Ok(Created::Existing(existing));
                }
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        DomainError::infra(
            InfraErrorKind::Other("create".to_string()),
            format!("{path}: create-if-absent did not settle"),
        )
    }))
}
