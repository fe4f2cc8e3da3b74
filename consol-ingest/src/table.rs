//! Positional tables from page text.
//!
//! Text fragments are placed by position, grouped into rows by baseline and
//! into columns by clustering their x-starts. Text wide enough to run across
//! the next column (titles, footers, disclaimers) never opens a column of its
//! own. Cells with nothing in them are empty strings, so column indices line
//! up across rows.

use lopdf::Object;
use lopdf::content::Content;
use tracing::debug;

/// Rows closer than this (in points) share a baseline.
const ROW_TOLERANCE: f32 = 3.0;
/// Fragments whose x-starts come within this many points share a column.
const COLUMN_TOLERANCE: f32 = 6.0;
/// Average glyph width as a fraction of the font size; used to estimate extents.
const GLYPH_WIDTH_EM: f32 = 0.5;
/// TJ adjustments at or below this (thousandths of an em) read as a space.
const TJ_SPACE_THRESHOLD: f32 = -200.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Lay out pre-extracted fixed-width text. A run of two or more spaces
    /// separates cells; character offsets stand in for positions.
    pub fn from_text(text: &str) -> Self {
        let mut fragments = Vec::new();
        let mut line_no = 0usize;
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            // Later lines sit lower on the page.
            let y = -(line_no as f32) * (ROW_TOLERANCE * 2.0);
            fragments.extend(split_cells(line).into_iter().map(|(start, cell)| Fragment {
                x: start as f32,
                y,
                width: cell.chars().count() as f32,
                text: cell.to_string(),
            }));
            line_no += 1;
        }
        // One character of slack: offsets are exact but hand-aligned text drifts.
        Self::from_fragments(fragments, 1.0)
    }

    pub fn from_fragments(fragments: Vec<Fragment>, column_tolerance: f32) -> Self {
        let columns = column_starts(&fragments, column_tolerance);
        let rows = baseline_rows(fragments)
            .into_iter()
            .map(|line| {
                let mut row = vec![String::new(); columns.len()];
                for frag in line {
                    let col = columns
                        .iter()
                        .rposition(|start| *start - column_tolerance <= frag.x)
                        .unwrap_or(0);
                    let cell = &mut row[col];
                    if !cell.is_empty() {
                        cell.push(' ');
                    }
                    cell.push_str(frag.text.trim());
                }
                row
            })
            .collect();

        Self { rows }
    }
}

/// Non-blank fragments grouped by baseline, top of the page first and left
/// to right within a line.
fn baseline_rows(mut fragments: Vec<Fragment>) -> Vec<Vec<Fragment>> {
    fragments.retain(|f| !f.text.trim().is_empty());
    fragments.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut rows: Vec<Vec<Fragment>> = Vec::new();
    let mut row_y: Option<f32> = None;
    for frag in fragments {
        if row_y.is_none_or(|y| (y - frag.y).abs() > ROW_TOLERANCE) {
            row_y = Some(frag.y);
            rows.push(Vec::new());
        }
        if let Some(row) = rows.last_mut() {
            row.push(frag);
        }
    }
    // A baseline can hold fragments drawn out of order; re-sort each line.
    for row in &mut rows {
        row.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    rows
}

/// Cells of a fixed-width line with their starting character offset.
fn split_cells(line: &str) -> Vec<(usize, &str)> {
    let mut cells = Vec::new();
    // (char offset, byte offset) of the cell being read
    let mut start: Option<(usize, usize)> = None;
    let mut end = 0usize;
    let mut spaces = 0usize;
    for (char_idx, (byte_idx, c)) in line.char_indices().enumerate() {
        if c.is_whitespace() {
            spaces += 1;
            if spaces == 2 {
                if let Some((col, from)) = start.take() {
                    cells.push((col, &line[from..end]));
                }
            }
        } else {
            if start.is_none() {
                start = Some((char_idx, byte_idx));
            }
            spaces = 0;
            end = byte_idx + c.len_utf8();
        }
    }
    if let Some((col, from)) = start {
        cells.push((col, &line[from..end]));
    }
    cells
}

struct Cluster {
    start: f32,
    last: f32,
    narrowest_end: f32,
}

/// Left edges of the page's columns.
///
/// X-starts chain into one cluster while consecutive starts stay within
/// `tolerance`. A cluster whose every member runs past the start of the next
/// cluster is spanning text rather than a column and is dropped.
fn column_starts(fragments: &[Fragment], tolerance: f32) -> Vec<f32> {
    let mut spans: Vec<(f32, f32)> = fragments
        .iter()
        .filter(|f| !f.text.trim().is_empty())
        .map(|f| (f.x, f.x + f.width))
        .collect();
    spans.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut clusters: Vec<Cluster> = Vec::new();
    for (start, end) in spans {
        match clusters.last_mut() {
            Some(c) if start - c.last <= tolerance => {
                c.last = start;
                c.narrowest_end = c.narrowest_end.min(end);
            }
            _ => clusters.push(Cluster { start, last: start, narrowest_end: end }),
        }
    }

    clusters
        .iter()
        .enumerate()
        .filter(|(i, c)| {
            clusters
                .get(i + 1)
                .is_none_or(|next| c.narrowest_end <= next.start + tolerance)
        })
        .map(|(_, c)| c.start)
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    fn translate(self, tx: f32, ty: f32) -> Matrix {
        Matrix {
            e: tx * self.a + ty * self.c + self.e,
            f: tx * self.b + ty * self.d + self.f,
            ..self
        }
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn literal(bytes: &[u8]) -> String {
    // Latin-1 covers the standard encodings statement generators use for digits,
    // dates and ASCII descriptions.
    bytes.iter().map(|&b| b as char).collect()
}

fn shown_text(operands: &[Object]) -> String {
    let mut out = String::new();
    for obj in operands {
        match obj {
            Object::String(bytes, _) => out.push_str(&literal(bytes)),
            Object::Array(items) => {
                for item in items {
                    match item {
                        Object::String(bytes, _) => out.push_str(&literal(bytes)),
                        other => {
                            if number(other).is_some_and(|n| n <= TJ_SPACE_THRESHOLD) {
                                out.push(' ');
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    out
}

/// Positioned text fragments from a decoded page content stream.
pub fn page_fragments(content: &[u8]) -> Vec<Fragment> {
    let content = match Content::decode(content) {
        Ok(c) => c,
        Err(e) => {
            debug!("content stream not decodable: {}", e);
            return Vec::new();
        }
    };

    let mut fragments: Vec<Fragment> = Vec::new();
    let mut line = Matrix::IDENTITY;
    let mut text = Matrix::IDENTITY;
    let mut leading = 0.0f32;
    let mut font_size = 10.0f32;
    let mut positioned = true;

    for op in &content.operations {
        let nums: Vec<f32> = op.operands.iter().filter_map(number).collect();
        match op.operator.as_str() {
            "BT" => {
                line = Matrix::IDENTITY;
                text = line;
                positioned = true;
            }
            "Tf" => {
                if let Some(size) = nums.first() {
                    font_size = *size;
                }
            }
            "TL" => {
                if let Some(l) = nums.first() {
                    leading = *l;
                }
            }
            "Td" | "TD" if nums.len() == 2 => {
                if op.operator == "TD" {
                    leading = -nums[1];
                }
                line = line.translate(nums[0], nums[1]);
                text = line;
                positioned = true;
            }
            "Tm" if nums.len() == 6 => {
                line = Matrix { a: nums[0], b: nums[1], c: nums[2], d: nums[3], e: nums[4], f: nums[5] };
                text = line;
                positioned = true;
            }
            "T*" => {
                line = line.translate(0.0, -leading);
                text = line;
                positioned = true;
            }
            "Tj" | "TJ" | "'" | "\"" => {
                if op.operator == "'" || op.operator == "\"" {
                    line = line.translate(0.0, -leading);
                    text = line;
                    positioned = true;
                }
                let shown = shown_text(&op.operands);
                if shown.is_empty() {
                    continue;
                }
                let width = shown.chars().count() as f32 * font_size * GLYPH_WIDTH_EM * text.a.abs().max(f32::EPSILON);
                match fragments.last_mut() {
                    // Consecutive shows without repositioning continue the same run.
                    Some(last) if !positioned => {
                        last.text.push_str(&shown);
                        last.width += width;
                    }
                    _ => fragments.push(Fragment { x: text.e, y: text.f, width, text: shown }),
                }
                positioned = false;
            }
            _ => {}
        }
    }

    fragments
}

pub fn page_table(content: &[u8]) -> Table {
    Table::from_fragments(page_fragments(content), COLUMN_TOLERANCE)
}

/// Page text in reading order: one line per baseline, fragments joined by a
/// space. Lines drawn inside a single text object still come out separate.
pub fn page_lines(content: &[u8]) -> Vec<String> {
    baseline_rows(page_fragments(content))
        .into_iter()
        .map(|row| {
            row.iter()
                .map(|f| f.text.trim())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_aligns_columns() {
        let text = "\
Date   Reference  Description    Amount
Jan 2  74001      COFFEE SHOP    $4.50
                  continued
Jan 4  74002      REFUND         $20.00CR
";
        let table = Table::from_text(text);
        assert_eq!(table.len(), 4);
        assert_eq!(table.rows[0], vec!["Date", "Reference", "Description", "Amount"]);
        assert_eq!(table.rows[1], vec!["Jan 2", "74001", "COFFEE SHOP", "$4.50"]);
        assert_eq!(table.rows[2], vec!["", "", "continued", ""]);
        assert_eq!(table.rows[3][3], "$20.00CR");
    }

    #[test]
    fn test_split_cells_keeps_single_spaces() {
        let cells = split_cells("Jan 2    COFFEE SHOP  $4.50");
        assert_eq!(cells, vec![(0, "Jan 2"), (9, "COFFEE SHOP"), (22, "$4.50")]);
    }

    #[test]
    fn test_empty_text_is_empty_table() {
        assert!(Table::from_text("\n   \n").is_empty());
    }

    #[test]
    fn test_fragments_from_content_stream() {
        let content = b"BT /F1 10 Tf 50 700 Td (Jan 2) Tj ET\n\
BT /F1 10 Tf 120 700 Td [(COFFEE) -300 (SHOP)] TJ ET\n\
BT /F1 10 Tf 50 680 Td (Jan 4) Tj ET\n";
        let frags = page_fragments(content);
        assert_eq!(frags.len(), 3);
        assert_eq!(frags[1].text, "COFFEE SHOP");
        assert_eq!((frags[1].x, frags[1].y), (120.0, 700.0));

        let table = page_table(content);
        assert_eq!(table.rows, vec![
            vec!["Jan 2".to_string(), "COFFEE SHOP".to_string()],
            vec!["Jan 4".to_string(), String::new()],
        ]);
    }

    fn frag(x: f32, y: f32, text: &str) -> Fragment {
        Fragment { x, y, width: text.chars().count() as f32 * 5.0, text: text.to_string() }
    }

    #[test]
    fn test_spanning_text_opens_no_column() {
        let fragments = vec![
            frag(50.0, 700.0, "Jan 3"),
            frag(120.0, 700.0, "Jan 2"),
            frag(200.0, 700.0, "$4.50"),
            // Starts with the first column and runs across the others.
            frag(50.0, 100.0, "Please see reverse side for important information"),
            // Starts between columns and runs across them.
            frag(80.0, 80.0, "Balances shown in Canadian dollars unless stated"),
            // Right-aligned amounts drift by a few points and chain together.
            frag(197.0, 680.0, "$120.00"),
        ];
        let table = Table::from_fragments(fragments, COLUMN_TOLERANCE);
        assert_eq!(table.rows[0], vec!["Jan 3", "Jan 2", "$4.50"]);
        assert_eq!(table.rows[1], vec!["", "", "$120.00"]);
        assert_eq!(table.rows[2][0], "Please see reverse side for important information");
        assert_eq!(table.rows[3][0], "Balances shown in Canadian dollars unless stated");
        assert!(table.rows.iter().all(|r| r.len() == 3));
    }

    #[test]
    fn test_page_lines_split_one_text_object() {
        let content = b"BT /F1 10 Tf 14 TL 50 750 Td (Other Credits) Tj 0 -14 Td (05/12 Deposit) Tj \
200 0 Td (100.00) Tj T* (Subtotal: 100.00) Tj ET\n";
        assert_eq!(
            page_lines(content),
            vec!["Other Credits", "05/12 Deposit 100.00", "Subtotal: 100.00"]
        );
    }
}
