use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Please select a layout for every file (missing: {})", .files.join(", "))]
    MissingLayout { files: Vec<String> },

    #[error("unparseable date {value:?} in consolidated row")]
    BadDate { value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet export failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
