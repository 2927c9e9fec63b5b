use thiserror::Error;

/// A user action refused before any request was issued. The `Display` text is
/// the prompt shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Refusal {
    #[error("Please enter a question.")]
    EmptyQuestion,
    #[error("An answer is already being fetched.")]
    AlreadyLoading,
    #[error("Please index a site first.")]
    NoActiveSource,
    #[error("Please enter a URL")]
    EmptyUrl,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid backend base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("request to backend failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}{}", detail_suffix(.detail))]
    Status {
        status: reqwest::StatusCode,
        detail: Option<String>,
    },
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|detail| format!(": {detail}"))
        .unwrap_or_default()
}
