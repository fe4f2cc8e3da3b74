use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip operation failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("XML escape error: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    #[error("package part missing: {0}")]
    MissingPart(String),

    #[error("image is neither a PNG nor a JPEG")]
    UnsupportedImage,
}

pub type Result<T> = std::result::Result<T, DocsError>;
