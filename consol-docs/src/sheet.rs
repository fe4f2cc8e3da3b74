//! Read one worksheet of an `.xlsx` workbook into a grid of display strings.
//!
//! Only what a workings sheet needs is understood: shared strings, inline
//! strings, numbers and booleans. Formulas contribute their cached value.

use std::collections::HashMap;
use std::io::{Read, Seek};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;
use zip::ZipArchive;

use crate::error::{DocsError, Result};

const WORKBOOK: &str = "xl/workbook.xml";
const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS: &str = "xl/sharedStrings.xml";

/// A cleaned sheet: the first non-empty row becomes the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    pub fn from_grid(grid: Vec<Vec<String>>) -> Self {
        let mut grid = clean_grid(grid).into_iter();
        let header = grid.next().unwrap_or_default();
        Self {
            header,
            rows: grid.collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.rows.is_empty()
    }

    /// Header followed by the body rows.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        std::iter::once(self.header.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(f) => f,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut s = String::new();
    file.read_to_string(&mut s)?;
    Ok(Some(s))
}

fn attr(e: &BytesStart<'_>, local: &[u8]) -> Result<Option<String>> {
    for a in e.attributes() {
        let a = a?;
        if a.key.local_name().as_ref() == local {
            return Ok(Some(a.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// (sheet name, relationship id) in workbook order.
fn workbook_sheets(xml: &str) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_str(xml);
    let mut out = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                if let (Some(name), Some(id)) = (attr(&e, b"name")?, attr(&e, b"id")?) {
                    out.push((name, id));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

fn relationship_targets(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut out = HashMap::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attr(&e, b"Id")?, attr(&e, b"Target")?) {
                    out.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

/// Targets are relative to `xl/` unless they start at the package root.
fn part_name(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(abs) => abs.to_string(),
        None => format!("xl/{target}"),
    }
}

fn shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    // Phonetic runs repeat the text in another script.
    let mut in_phonetic = false;
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_text = true,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => out.push(String::new()),
            Event::Text(t) if in_text && !in_phonetic => current.push_str(&t.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => out.push(std::mem::take(&mut current)),
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

/// Zero-based column of a cell reference such as `AB12`.
pub fn column_index(cell_ref: &str) -> Option<usize> {
    let letters: Vec<u8> = cell_ref
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .map(|b| b.to_ascii_uppercase())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let n = letters
        .iter()
        .fold(0usize, |acc, b| acc * 26 + (b - b'A' + 1) as usize);
    Some(n - 1)
}

#[derive(Default)]
struct CellState {
    column: Option<usize>,
    kind: Option<String>,
    value: String,
    in_value: bool,
}

impl CellState {
    fn render(&self, shared: &[String]) -> String {
        match self.kind.as_deref() {
            Some("s") => self
                .value
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|i| shared.get(i).cloned())
                .unwrap_or_default(),
            Some("b") => match self.value.trim() {
                "1" => "TRUE".to_string(),
                "0" => "FALSE".to_string(),
                other => other.to_string(),
            },
            _ => self.value.clone(),
        }
    }
}

fn sheet_grid(xml: &str, shared: &[String]) -> Result<Vec<Vec<String>>> {
    let mut reader = Reader::from_str(xml);
    let mut grid: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell: Option<CellState> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => row = Vec::new(),
                b"c" => {
                    cell = Some(CellState {
                        column: attr(&e, b"r")?.as_deref().and_then(column_index),
                        kind: attr(&e, b"t")?,
                        ..CellState::default()
                    })
                }
                b"v" | b"t" => {
                    if let Some(c) = cell.as_mut() {
                        c.in_value = true;
                    }
                }
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"row" => grid.push(Vec::new()),
            Event::Text(t) => {
                if let Some(c) = cell.as_mut().filter(|c| c.in_value) {
                    c.value.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => {
                    if let Some(c) = cell.as_mut() {
                        c.in_value = false;
                    }
                }
                b"c" => {
                    if let Some(c) = cell.take() {
                        let col = c.column.unwrap_or(row.len());
                        if row.len() <= col {
                            row.resize(col + 1, String::new());
                        }
                        row[col] = c.render(shared);
                    }
                }
                b"row" => grid.push(std::mem::take(&mut row)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(grid)
}

/// Sheet names in workbook order.
pub fn sheet_names<R: Read + Seek>(reader: R) -> Result<Vec<String>> {
    let mut archive = ZipArchive::new(reader)?;
    let xml = read_part(&mut archive, WORKBOOK)?
        .ok_or_else(|| DocsError::MissingPart(WORKBOOK.to_string()))?;
    Ok(workbook_sheets(&xml)?.into_iter().map(|(n, _)| n).collect())
}

/// Raw cell grid of the named sheet. Rows are padded to their last filled
/// cell only; nothing is cleaned.
pub fn read_grid<R: Read + Seek>(reader: R, sheet: &str) -> Result<Vec<Vec<String>>> {
    let mut archive = ZipArchive::new(reader)?;

    let workbook = read_part(&mut archive, WORKBOOK)?
        .ok_or_else(|| DocsError::MissingPart(WORKBOOK.to_string()))?;
    let rels = read_part(&mut archive, WORKBOOK_RELS)?
        .ok_or_else(|| DocsError::MissingPart(WORKBOOK_RELS.to_string()))?;

    let rel_id = workbook_sheets(&workbook)?
        .into_iter()
        .find(|(name, _)| name == sheet)
        .map(|(_, id)| id)
        .ok_or_else(|| DocsError::SheetNotFound(sheet.to_string()))?;
    let target = relationship_targets(&rels)?
        .remove(&rel_id)
        .ok_or_else(|| DocsError::MissingPart(format!("relationship {rel_id}")))?;
    let part = part_name(&target);

    let shared = match read_part(&mut archive, SHARED_STRINGS)? {
        Some(xml) => shared_strings(&xml)?,
        None => Vec::new(),
    };
    let xml = read_part(&mut archive, &part)?.ok_or(DocsError::MissingPart(part))?;
    let grid = sheet_grid(&xml, &shared)?;
    debug!("sheet {:?}: {} rows", sheet, grid.len());
    Ok(grid)
}

/// Read the named sheet and clean it into a header plus rows.
pub fn read_table<R: Read + Seek>(reader: R, sheet: &str) -> Result<SheetTable> {
    Ok(SheetTable::from_grid(read_grid(reader, sheet)?))
}

/// Strip rupee signs, thousands separators and padding from a cell that is a
/// number once they are gone. Text cells keep their commas.
pub fn clean_currency(cell: &str) -> String {
    let stripped: String = cell
        .chars()
        .filter(|c| *c != '₹' && *c != ',' && !c.is_whitespace())
        .collect();
    if stripped.bytes().any(|b| b.is_ascii_digit()) && stripped.parse::<f64>().is_ok() {
        stripped
    } else {
        cell.trim().to_string()
    }
}

/// Drop rows and columns with no content, square the grid and clean every
/// cell.
pub fn clean_grid(grid: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let rows: Vec<Vec<String>> = grid
        .into_iter()
        .map(|r| r.iter().map(|c| clean_currency(c)).collect::<Vec<_>>())
        .filter(|r| r.iter().any(|c| !c.is_empty()))
        .collect();

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let keep: Vec<usize> = (0..width)
        .filter(|&col| rows.iter().any(|r| r.get(col).is_some_and(|c| !c.is_empty())))
        .collect();

    rows.into_iter()
        .map(|r| {
            keep.iter()
                .map(|&col| r.get(col).cloned().unwrap_or_default())
                .collect()
        })
        .collect()
}
