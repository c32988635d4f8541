use thiserror::Error;

/// Errors returned by the news signal collector.
#[derive(Debug, Error)]
pub enum NewsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
}
