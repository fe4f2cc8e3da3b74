//! Pack generated documents into one zip archive.

use std::io::{Cursor, Write};
use std::path::Path;

use zip::ZipWriter;
use zip::write::FileOptions;

use crate::error::Result;

pub const DEFAULT_BUNDLE_NAME: &str = "generated_documents.zip";

/// Name a filled copy of `template` is delivered under.
pub fn generated_name(template: &Path) -> String {
    let file = template
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.docx".to_string());
    format!("Generated_{file}")
}

/// Zip `(entry name, bytes)` pairs in the given order.
pub fn bundle(documents: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in documents {
        zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
        zip.write_all(data)?;
    }
    Ok(zip.finish()?.into_inner())
}
