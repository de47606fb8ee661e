use super::{FetchError, FetchStatus, Snapshot};

/// Default texts for the non-success states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerMessages {
    pub loading: String,
    pub empty: String,
    pub error_title: String,
}

impl Default for ContainerMessages {
    fn default() -> Self {
        Self {
            loading: "Loading data...".to_string(),
            empty: "No data available".to_string(),
            error_title: "Error".to_string(),
        }
    }
}

/// Presentation of each resource state. Implementors decide the output type
/// (terminal lines, JSON, markup).
pub trait StateRenderer<T> {
    type Output;

    fn loading(&self, message: &str) -> Self::Output;
    fn success(&self, data: &T) -> Self::Output;
    fn empty(&self, message: &str) -> Self::Output;
    fn error(&self, title: &str, message: &str) -> Self::Output;
}

/// Dispatch a snapshot to the matching renderer method.
///
/// `Idle` renders nothing, as does `Success` without a value.
pub fn render<T, R>(
    snapshot: &Snapshot<T>,
    renderer: &R,
    messages: &ContainerMessages,
) -> Option<R::Output>
where
    R: StateRenderer<T>,
{
    match snapshot.status {
        FetchStatus::Idle => None,
        FetchStatus::Loading => Some(renderer.loading(&messages.loading)),
        FetchStatus::Success => snapshot.data.as_ref().map(|data| renderer.success(data)),
        FetchStatus::Empty => Some(renderer.empty(&messages.empty)),
        FetchStatus::Error => {
            let message = snapshot
                .error
                .as_ref()
                .map(FetchError::message)
                .filter(|m| !m.is_empty())
                .unwrap_or(FetchError::UNKNOWN);
            Some(renderer.error(&messages.error_title, message))
        }
    }
}
