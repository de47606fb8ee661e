use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use async_trait::async_trait;
use thiserror::Error;
use crate::errors::KycError;

/// The single failure kind of a data source: the operation failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    message: String,
}

impl FetchError {
    pub const UNKNOWN: &'static str = "An unknown error occurred";

    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn unknown() -> Self {
        Self::new(Self::UNKNOWN)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<KycError> for FetchError {
    fn from(e: KycError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<String> for FetchError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for FetchError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Anything that can be loaded asynchronously into an `AsyncResource`.
///
/// Plain async closures returning `Result<T, FetchError>` implement this.
#[async_trait]
pub trait DataSource<T>: Send + Sync {
    async fn fetch(&self) -> Result<T, FetchError>;
}

#[async_trait]
impl<T, F, Fut> DataSource<T> for F
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, FetchError>> + Send,
{
    async fn fetch(&self) -> Result<T, FetchError> {
        (self)().await
    }
}

/// Whether a loaded value counts as "no data".
///
/// Absent values, empty sequences and empty maps are empty; everything else
/// (numbers, strings, records) is not.
pub trait Emptiness {
    fn is_empty_value(&self) -> bool {
        false
    }
}

impl<T> Emptiness for Vec<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V, S> Emptiness for HashMap<K, V, S> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> Emptiness for BTreeMap<K, V> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T, S> Emptiness for HashSet<T, S> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Emptiness> Emptiness for Option<T> {
    fn is_empty_value(&self) -> bool {
        self.as_ref().map_or(true, Emptiness::is_empty_value)
    }
}

impl Emptiness for () {
    fn is_empty_value(&self) -> bool {
        true
    }
}

impl Emptiness for serde_json::Value {
    fn is_empty_value(&self) -> bool {
        match self {
            serde_json::Value::Null => true,
            serde_json::Value::Array(a) => a.is_empty(),
            serde_json::Value::Object(o) => o.is_empty(),
            _ => false,
        }
    }
}

impl Emptiness for String {}
impl Emptiness for u8 {}
impl Emptiness for u32 {}
impl Emptiness for u64 {}
impl Emptiness for i64 {}
impl Emptiness for bool {}
impl Emptiness for crate::models::Issue {}
impl Emptiness for crate::models::Statistics {}
impl Emptiness for crate::models::Story {}
impl Emptiness for crate::models::CorroborationSupport {}
