//! consol-core: batch processing, consolidation and export of parsed statements.

pub mod aggregate;
pub mod batch;
pub mod error;
pub mod export;

pub use aggregate::{BankSummary, Consolidation, Ledger, LedgerRow, consolidate};
pub use batch::{BatchReport, FileFailure, Upload, run_batch};
pub use error::{CoreError, Result};
pub use export::{ExportFormat, write_csv, write_ledger, write_xlsx};
