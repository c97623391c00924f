use thiserror::Error;

/// Failures inside a source adapter. All of these are recoverable: the live
/// adapter answers them with the synthetic fallback and the aggregator
/// records them as a failed outcome instead of aborting the batch.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("WebDriver command '{command}' failed: {message}")]
    WebDriver { command: String, message: String },
    #[error("Navigation failed: {0}")]
    Navigation(String),
    #[error("Blocked by site: {0}")]
    Blocked(String),
    #[error("HTML parse error: {0}")]
    HtmlParse(String),
    #[error("No card selector matched more than {threshold} elements")]
    NoCards { threshold: usize },
    #[error("Unexpected data shape: {0}")]
    UnexpectedShape(String),
}
