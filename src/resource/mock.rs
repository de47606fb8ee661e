//! Delayed, optionally failing sources for demos and tests.

use std::time::Duration;

use async_trait::async_trait;

use super::{DataSource, FetchError};
use crate::errors::KycError;
use crate::models::Issue;

const CANNED_ISSUES: &str = include_str!("mock_issues.yaml");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockOptions {
    pub delay: Duration,
    pub should_fail: bool,
    pub error_message: String,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1000),
            should_fail: false,
            error_message: "API call failed".to_string(),
        }
    }
}

impl MockOptions {
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.should_fail = true;
        self.error_message = message.into();
        self
    }
}

/// Resolves to a clone of `data` after `delay`, or fails with
/// `error_message` when `should_fail` is set.
#[derive(Debug, Clone)]
pub struct MockSource<T> {
    data: T,
    options: MockOptions,
}

impl<T> MockSource<T> {
    pub fn new(data: T, options: MockOptions) -> Self {
        Self { data, options }
    }

    pub fn options(&self) -> &MockOptions {
        &self.options
    }
}

#[async_trait]
impl<T> DataSource<T> for MockSource<T>
where
    T: Clone + Send + Sync,
{
    async fn fetch(&self) -> Result<T, FetchError> {
        tokio::time::sleep(self.options.delay).await;
        if self.options.should_fail {
            Err(FetchError::new(self.options.error_message.clone()))
        } else {
            Ok(self.data.clone())
        }
    }
}

/// The three issues served by [`issues_success`].
pub fn canned_issues() -> Result<Vec<Issue>, KycError> {
    Ok(serde_yaml::from_str(CANNED_ISSUES)?)
}

pub fn issues_success(delay: Duration) -> Result<MockSource<Vec<Issue>>, KycError> {
    Ok(MockSource::new(canned_issues()?, MockOptions::default().delay(delay)))
}

pub fn issues_empty(delay: Duration) -> MockSource<Vec<Issue>> {
    MockSource::new(Vec::new(), MockOptions::default().delay(delay))
}

pub fn issues_error(delay: Duration) -> MockSource<Vec<Issue>> {
    MockSource::new(
        Vec::new(),
        MockOptions::default()
            .delay(delay)
            .failing("Failed to fetch issues: Network error 500"),
    )
}
