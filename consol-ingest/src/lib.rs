//! consol-ingest: statement extraction (PDF text/tables) and layout-specific parsers.

pub mod amount;
pub mod error;
pub mod parsers;
pub mod source;
pub mod table;
pub mod types;
pub mod year;

pub use error::{IngestError, Result};
pub use parsers::parse_statement;
pub use source::{PdfStatement, StatementSource};
pub use table::Table;
pub use types::{Layout, Transaction};
