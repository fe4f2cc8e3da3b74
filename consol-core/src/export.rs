//! Ledger export: a single-sheet xlsx workbook or a CSV file.
//!
//! The workbook is written directly as an OOXML package (a zip of XML parts)
//! with inline strings, so no shared-string table is needed.

use std::io::{Seek, Write};
use std::path::Path;
use std::str::FromStr;

use quick_xml::escape::escape;
use zip::ZipWriter;
use zip::write::FileOptions;

use crate::aggregate::{COLUMNS, Ledger};
use crate::error::{CoreError, Result};

pub const SHEET_NAME: &str = "Sheet1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    /// Pick the format from a file name's extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse()
    }
}

impl FromStr for ExportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(CoreError::UnsupportedFormat(other.to_string())),
        }
    }
}

pub fn write_csv<W: Write>(ledger: &Ledger, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if ledger.is_empty() {
        wtr.write_record(COLUMNS)?;
    }
    for row in ledger.rows() {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

// Style 1 is the bold header.
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs></styleSheet>"#;

fn workbook_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{SHEET_NAME}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
    )
}

fn column_letter(idx: usize) -> char {
    (b'A' + idx as u8) as char
}

fn string_cell(out: &mut String, cell_ref: &str, value: &str, style: Option<u8>) {
    let style = style.map(|s| format!(r#" s="{s}""#)).unwrap_or_default();
    out.push_str(&format!(
        r#"<c r="{cell_ref}" t="inlineStr"{style}><is><t xml:space="preserve">{}</t></is></c>"#,
        escape(value)
    ));
}

fn sheet_xml(ledger: &Ledger) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    out.push_str(r#"<row r="1">"#);
    for (i, name) in COLUMNS.iter().enumerate() {
        string_cell(&mut out, &format!("{}1", column_letter(i)), name, Some(1));
    }
    out.push_str("</row>");

    for (idx, row) in ledger.rows().iter().enumerate() {
        let r = idx + 2;
        out.push_str(&format!(r#"<row r="{r}">"#));
        for (i, value) in [&row.bank, &row.date, &row.reference, &row.description]
            .into_iter()
            .enumerate()
        {
            string_cell(&mut out, &format!("{}{r}", column_letter(i)), value, None);
        }
        out.push_str(&format!(r#"<c r="E{r}"><v>{}</v></c>"#, row.amount));
        out.push_str("</row>");
    }

    out.push_str("</sheetData></worksheet>");
    out
}

pub fn write_xlsx<W: Write + Seek>(ledger: &Ledger, writer: W) -> Result<()> {
    let mut zip = ZipWriter::new(writer);

    let parts: [(&str, String); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("xl/workbook.xml", workbook_xml()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
        ("xl/styles.xml", STYLES.to_string()),
        ("xl/worksheets/sheet1.xml", sheet_xml(ledger)),
    ];
    for (name, body) in parts {
        zip.start_file::<_, ()>(name, FileOptions::default())?;
        zip.write_all(body.as_bytes())?;
    }

    zip.finish()?;
    Ok(())
}

/// Write the ledger in the given format.
pub fn write_ledger<W: Write + Seek>(ledger: &Ledger, format: ExportFormat, writer: W) -> Result<()> {
    match format {
        ExportFormat::Xlsx => write_xlsx(ledger, writer),
        ExportFormat::Csv => write_csv(ledger, writer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{LedgerRow, Ledger};
    use rust_decimal::Decimal;
    use std::io::{Cursor, Read};

    fn ledger() -> Ledger {
        Ledger::from_rows(vec![
            LedgerRow {
                bank: "TD BUSINESS SOLUTIONS VISA".into(),
                date: "2024-01-04".into(),
                reference: "74009876".into(),
                description: "REFUND <STORE> & CO".into(),
                amount: Decimal::new(2000, 2),
            },
            LedgerRow {
                bank: "Bank of America".into(),
                date: "2024-01-02".into(),
                reference: String::new(),
                description: "WIRE OUT".into(),
                amount: Decimal::new(-250000, 2),
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_csv_columns_and_order() {
        let mut buf = Vec::new();
        write_csv(&ledger(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Bank,Date,Ref,Description,Amount");
        assert_eq!(lines[1], "Bank of America,2024-01-02,,WIRE OUT,-2500.00");
        assert_eq!(lines[2], "TD BUSINESS SOLUTIONS VISA,2024-01-04,74009876,REFUND <STORE> & CO,20.00");
    }

    #[test]
    fn test_xlsx_package_parts() {
        let mut cur = Cursor::new(Vec::new());
        write_xlsx(&ledger(), &mut cur).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(cur.into_inner())).unwrap();
        for part in ["[Content_Types].xml", "_rels/.rels", "xl/workbook.xml", "xl/styles.xml"] {
            assert!(archive.by_name(part).is_ok(), "missing {part}");
        }

        let mut sheet = String::new();
        archive
            .by_name("xl/worksheets/sheet1.xml")
            .unwrap()
            .read_to_string(&mut sheet)
            .unwrap();
        assert!(sheet.contains(r#"<c r="A1" t="inlineStr" s="1"><is><t xml:space="preserve">Bank</t>"#));
        assert!(sheet.contains("REFUND &lt;STORE&gt; &amp; CO"));
        assert!(sheet.contains(r#"<c r="E2"><v>-2500.00</v></c>"#));
        assert!(sheet.contains(r#"<row r="3">"#));
        assert!(!sheet.contains(r#"<row r="4">"#));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("out.XLSX")).unwrap(), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::from_path(Path::new("out.csv")).unwrap(), ExportFormat::Csv);
        assert!(ExportFormat::from_path(Path::new("out.pdf")).is_err());
    }
}
