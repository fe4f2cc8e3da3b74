//! Run a batch of uploaded statements through their layout parsers.
//!
//! A batch is refused outright when any file has no layout. Once parsing
//! starts, a file that fails is reported and skipped; the rest of the batch
//! still runs.

use std::fmt;
use std::io::Cursor;

use consol_ingest::{Layout, StatementSource, Transaction, parse_statement};
use tracing::{info, warn};

use crate::aggregate::{Consolidation, consolidate};
use crate::error::{CoreError, Result};

/// One uploaded file and the layout chosen for it.
#[derive(Debug)]
pub struct Upload<S> {
    pub name: String,
    pub source: S,
    pub layout: Option<Layout>,
}

impl Upload<Cursor<Vec<u8>>> {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>, layout: Option<Layout>) -> Self {
        Self {
            name: name.into(),
            source: Cursor::new(bytes),
            layout,
        }
    }
}

/// A file that could not be processed, with the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub file: String,
    pub layout: Layout,
    pub message: String,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error parsing {} ({}): {}", self.layout, self.file, self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub outcome: Consolidation,
    pub failures: Vec<FileFailure>,
    /// Transactions extracted per file, in upload order.
    pub per_file: Vec<(String, usize)>,
}

impl BatchReport {
    pub fn transaction_count(&self) -> usize {
        self.per_file.iter().map(|(_, n)| n).sum()
    }
}

/// Names of uploads with no layout selected.
pub fn missing_layouts<S>(uploads: &[Upload<S>]) -> Vec<String> {
    uploads
        .iter()
        .filter(|u| u.layout.is_none())
        .map(|u| u.name.clone())
        .collect()
}

pub fn run_batch<S: StatementSource>(uploads: &mut [Upload<S>]) -> Result<BatchReport> {
    let missing = missing_layouts(uploads);
    if !missing.is_empty() {
        return Err(CoreError::MissingLayout { files: missing });
    }

    let mut all: Vec<Transaction> = Vec::new();
    let mut failures = Vec::new();
    let mut per_file = Vec::with_capacity(uploads.len());

    for upload in uploads.iter_mut() {
        let Some(layout) = upload.layout else {
            continue;
        };
        info!("Processing {}: {}", layout, upload.name);

        match parse_statement(layout, &mut upload.source) {
            Ok(txns) => {
                per_file.push((upload.name.clone(), txns.len()));
                all.extend(txns);
            }
            Err(e) => {
                let failure = FileFailure {
                    file: upload.name.clone(),
                    layout,
                    message: e.to_string(),
                };
                warn!("{}", failure);
                per_file.push((upload.name.clone(), 0));
                failures.push(failure);
            }
        }
    }

    Ok(BatchReport {
        outcome: consolidate(all),
        failures,
        per_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_layout_blocks_batch() {
        let mut uploads = vec![
            Upload::from_bytes("a.pdf", b"junk".to_vec(), Some(Layout::TdVisa)),
            Upload::from_bytes("b.pdf", b"junk".to_vec(), None),
        ];
        match run_batch(&mut uploads) {
            Err(CoreError::MissingLayout { files }) => assert_eq!(files, vec!["b.pdf"]),
            other => panic!("unexpected {:?}", other.map(|r| r.failures)),
        }
        // Nothing was read.
        assert_eq!(uploads[0].source.position(), 0);
    }

    #[test]
    fn test_failed_files_are_reported_and_skipped() {
        let mut uploads = vec![
            Upload::from_bytes("bad-1.pdf", b"not a pdf".to_vec(), Some(Layout::BankOfAmerica)),
            Upload::from_bytes("bad-2.pdf", Vec::new(), Some(Layout::TdPremiumMoneyMarket)),
        ];
        let report = run_batch(&mut uploads).unwrap();
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].file, "bad-1.pdf");
        assert!(report.failures[0].to_string().starts_with("Error parsing Bank of America (bad-1.pdf)"));
        assert_eq!(report.outcome, Consolidation::NothingFound);
        assert_eq!(report.transaction_count(), 0);
    }
}
