use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF could not be opened: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("unknown layout: {0}")]
    UnknownLayout(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;
