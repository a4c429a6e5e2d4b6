use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocatorError {
    #[error("Element is not attached to the provided document")]
    DetachedElement,

    #[error("Selector parse failed: {0}")]
    SelectorParse(String),

    #[error("XPath evaluation failed: {0}")]
    XPathEval(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV export failed: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Report export failed: {0}")]
    ExportFailed(String),
}

pub type Result<T> = std::result::Result<T, LocatorError>;
