//! consol-docs: office template filling from field values and spreadsheet tables.

pub mod bundle;
pub mod error;
pub mod fields;
pub mod sheet;
pub mod template;

pub use error::{DocsError, Result};
pub use bundle::{DEFAULT_BUNDLE_NAME, bundle, generated_name};
pub use fields::{DocumentFields, FieldsFile, NavReportFields, Placeholders};
pub use sheet::{SheetTable, read_table};
pub use template::{
    FillReport, FillRequest, FilledDocument, ImageFormat, PictureInsert, TableInsert, fill_docx,
};
