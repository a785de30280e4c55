use thiserror::Error;

/// Failures that abort extraction of a single document. Callers processing a
/// batch are expected to report these per-document and continue with the rest.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("failed to open document package: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("failed to read package part {part}: {message}")]
    PartRead { part: String, message: String },

    #[error("missing required part: {0}")]
    MissingPart(String),

    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),
}
