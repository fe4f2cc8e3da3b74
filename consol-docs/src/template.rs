//! Fill a `.docx` template.
//!
//! Text tokens are replaced paragraph by paragraph. A token split across
//! several runs is still found: when a paragraph changes, its whole text is
//! written into the first run and the other runs are emptied, so character
//! formatting after the first run is lost for that paragraph only.
//!
//! A paragraph holding the picture token is replaced by an inline PNG or
//! JPEG, and a paragraph holding the table token by a native table.

use std::collections::BTreeSet;
use std::io::{Cursor, Read, Seek, Write};
use std::sync::OnceLock;

use quick_xml::escape::{escape, unescape};
use regex::{Captures, Regex};
use tracing::{debug, info};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{DocsError, Result};
use crate::fields::Placeholders;

const DOCUMENT: &str = "word/document.xml";
const DOCUMENT_RELS: &str = "word/_rels/document.xml.rels";
const CONTENT_TYPES: &str = "[Content_Types].xml";
const MEDIA_STEM: &str = "consol_image1";

const EMU_PER_INCH: f64 = 914_400.0;
const TABLE_WIDTH_TWIPS: usize = 9_000;
const HEADER_FILL: &str = "F2F2F2";

const IMAGE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// A PNG or JPEG to place where `token` appears.
#[derive(Debug, Clone)]
pub struct PictureInsert {
    pub token: String,
    pub image: Vec<u8>,
    pub width_inches: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    fn media_name(self) -> String {
        format!("{MEDIA_STEM}.{}", self.extension())
    }
}

/// Rows to lay out as a table where `token` appears. The first row is styled
/// as a header.
#[derive(Debug, Clone)]
pub struct TableInsert {
    pub token: String,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct FillRequest {
    pub placeholders: Placeholders,
    pub picture: Option<PictureInsert>,
    pub table: Option<TableInsert>,
}

/// What happened to the template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    pub paragraphs_changed: usize,
    pub pictures_inserted: usize,
    pub tables_inserted: usize,
    /// Tokens that were found at least once.
    pub tokens_used: BTreeSet<String>,
}

impl FillReport {
    /// Placeholder tokens never found in the template.
    pub fn unused<'a>(&self, placeholders: &'a Placeholders) -> Vec<&'a str> {
        placeholders
            .keys()
            .filter(|k| !self.tokens_used.contains(k.as_str()))
            .map(String::as_str)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct FilledDocument {
    pub bytes: Vec<u8>,
    pub report: FillReport,
}

fn paragraph_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // `<w:p>` or `<w:p attrs>`, but not `<w:pPr>` or a self-closed `<w:p .../>`.
    RE.get_or_init(|| {
        Regex::new(r"(?s)<w:p(?:\s[^>]*[^>/])?>.*?</w:p>").expect("paragraph regex")
    })
}

fn text_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>").expect("text run regex"))
}

fn paragraph_props_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<w:pPr>.*?</w:pPr>|<w:pPr/>").expect("paragraph props regex"))
}

fn rel_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"Id="rId(\d+)""#).expect("relationship id regex"))
}

fn header_footer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^word/(header|footer)\d*\.xml$").expect("header part regex"))
}

/// Visible text of a paragraph, runs concatenated.
pub fn paragraph_text(paragraph: &str) -> Result<String> {
    let mut text = String::new();
    for caps in text_run_re().captures_iter(paragraph) {
        let raw = caps.get(1).map_or("", |m| m.as_str());
        text.push_str(&unescape(raw)?);
    }
    Ok(text)
}

/// Run text for `value`, with line breaks as `<w:br/>`.
fn run_text(value: &str) -> String {
    value
        .split('\n')
        .map(|line| format!(r#"<w:t xml:space="preserve">{}</w:t>"#, escape(line)))
        .collect::<Vec<_>>()
        .join("<w:br/>")
}

fn paragraph_props(paragraph: &str) -> &str {
    paragraph_props_re()
        .find(paragraph)
        .map_or("", |m| m.as_str())
}

fn picture_xml(rel_id: &str, doc_pr_id: usize, media_name: &str, (cx, cy): (u64, u64)) -> String {
    format!(
        concat!(
            r#"<w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0" "#,
            r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{id}" name="Picture {id}"/>"#,
            r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
            r#"<a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">"#,
            r#"<a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:nvPicPr><pic:cNvPr id="{id}" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rel}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"/>"#,
            r#"<a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
            r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing>"#
        ),
        cx = cx,
        cy = cy,
        id = doc_pr_id,
        name = media_name,
        rel = rel_id,
    )
}

fn table_xml(rows: &[Vec<String>]) -> String {
    let cols = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let col_width = TABLE_WIDTH_TWIPS / cols;
    let border = r#"w:val="single" w:sz="4" w:space="0" w:color="auto""#;

    let mut out = format!(
        concat!(
            r#"<w:tbl><w:tblPr><w:tblW w:w="{total}" w:type="dxa"/><w:jc w:val="center"/><w:tblBorders>"#,
            r#"<w:top {b}/><w:left {b}/><w:bottom {b}/><w:right {b}/><w:insideH {b}/><w:insideV {b}/>"#,
            r#"</w:tblBorders></w:tblPr><w:tblGrid>"#
        ),
        total = col_width * cols,
        b = border,
    );
    for _ in 0..cols {
        out.push_str(&format!(r#"<w:gridCol w:w="{col_width}"/>"#));
    }
    out.push_str("</w:tblGrid>");

    for (r, row) in rows.iter().enumerate() {
        let header = r == 0;
        out.push_str("<w:tr>");
        for c in 0..cols {
            let value = row.get(c).map_or("", String::as_str);
            let shading = if header {
                format!(r#"<w:shd w:val="clear" w:color="auto" w:fill="{HEADER_FILL}"/>"#)
            } else {
                String::new()
            };
            let bold = if header { "<w:rPr><w:b/></w:rPr>" } else { "" };
            out.push_str(&format!(
                r#"<w:tc><w:tcPr><w:tcW w:w="{col_width}" w:type="dxa"/>{shading}</w:tcPr><w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r>{bold}{}</w:r></w:p></w:tc>"#,
                run_text(value)
            ));
        }
        out.push_str("</w:tr>");
    }
    out.push_str("</w:tbl>");
    out
}

/// Pixel size from a PNG's IHDR chunk.
pub fn png_dimensions(png: &[u8]) -> Result<(u32, u32)> {
    const SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
    if png.len() < 24 || !png.starts_with(SIGNATURE) || &png[12..16] != b"IHDR" {
        return Err(DocsError::UnsupportedImage);
    }
    let width = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
    let height = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
    if width == 0 || height == 0 {
        return Err(DocsError::UnsupportedImage);
    }
    Ok((width, height))
}

/// Pixel size from a JPEG's start-of-frame segment.
pub fn jpeg_dimensions(jpeg: &[u8]) -> Result<(u32, u32)> {
    let be16 = |at: usize| -> Option<u16> { Some(u16::from_be_bytes([*jpeg.get(at)?, *jpeg.get(at + 1)?])) };

    if !jpeg.starts_with(&[0xFF, 0xD8]) {
        return Err(DocsError::UnsupportedImage);
    }
    let mut pos = 2;
    while pos < jpeg.len() {
        if jpeg[pos] != 0xFF {
            return Err(DocsError::UnsupportedImage);
        }
        // Markers may be padded with any number of 0xFF fill bytes.
        while jpeg.get(pos) == Some(&0xFF) {
            pos += 1;
        }
        let Some(&marker) = jpeg.get(pos) else { break };
        match marker {
            // Standalone markers carry no length.
            0x01 | 0xD0..=0xD7 => {
                pos += 1;
                continue;
            }
            // Image data or end of image before any frame header.
            0xD9 | 0xDA => break,
            _ => {}
        }
        let Some(len) = be16(pos + 1) else { break };
        // SOF0..SOF15, minus DHT, JPG and DAC which share the range.
        if matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            let (Some(height), Some(width)) = (be16(pos + 4), be16(pos + 6)) else { break };
            if width == 0 || height == 0 {
                break;
            }
            return Ok((u32::from(width), u32::from(height)));
        }
        pos += 1 + usize::from(len);
    }
    Err(DocsError::UnsupportedImage)
}

/// Format and pixel size of a PNG or JPEG.
pub fn image_dimensions(image: &[u8]) -> Result<(ImageFormat, u32, u32)> {
    if image.starts_with(&[0xFF, 0xD8]) {
        let (w, h) = jpeg_dimensions(image)?;
        return Ok((ImageFormat::Jpeg, w, h));
    }
    let (w, h) = png_dimensions(image)?;
    Ok((ImageFormat::Png, w, h))
}

/// Extent in EMU for a picture `width_inches` wide, keeping aspect ratio.
fn picture_extent((w, h): (u32, u32), width_inches: f64) -> (u64, u64) {
    let cx = (width_inches * EMU_PER_INCH).round() as u64;
    let cy = (cx as f64 * f64::from(h) / f64::from(w)).round() as u64;
    (cx, cy)
}

/// Picture placement prepared before the body is rewritten.
struct PicturePlan<'a> {
    token: &'a str,
    rel_id: String,
    format: ImageFormat,
    extent: (u64, u64),
}

struct PartFiller<'a> {
    placeholders: &'a Placeholders,
    picture: Option<PicturePlan<'a>>,
    table: Option<&'a TableInsert>,
    next_doc_pr: usize,
    report: FillReport,
}

impl PartFiller<'_> {
    fn fill_paragraph(&mut self, paragraph: &str) -> Result<Option<String>> {
        let text = paragraph_text(paragraph)?;
        if text.is_empty() {
            return Ok(None);
        }

        if let Some(plan) = self.picture.as_ref().filter(|p| text.contains(p.token)) {
            let id = self.next_doc_pr;
            self.next_doc_pr += 1;
            self.report.pictures_inserted += 1;
            self.report.tokens_used.insert(plan.token.to_string());
            return Ok(Some(format!(
                "<w:p>{}<w:r>{}</w:r></w:p>",
                paragraph_props(paragraph),
                picture_xml(&plan.rel_id, id, &plan.format.media_name(), plan.extent)
            )));
        }

        if let Some(table) = self.table.filter(|t| text.contains(t.token.as_str())) {
            self.report.tables_inserted += 1;
            self.report.tokens_used.insert(table.token.clone());
            // A table cell must end with a paragraph, and so must the body
            // before sectPr.
            return Ok(Some(format!("{}<w:p/>", table_xml(&table.rows))));
        }

        let mut replaced = text.clone();
        for (token, value) in self.placeholders {
            if replaced.contains(token.as_str()) {
                replaced = replaced.replace(token.as_str(), value);
                self.report.tokens_used.insert(token.clone());
            }
        }
        if replaced == text {
            return Ok(None);
        }

        let mut first = true;
        let rewritten = text_run_re().replace_all(paragraph, |_: &Captures<'_>| {
            if std::mem::take(&mut first) {
                run_text(&replaced)
            } else {
                "<w:t></w:t>".to_string()
            }
        });
        self.report.paragraphs_changed += 1;
        Ok(Some(rewritten.into_owned()))
    }

    fn fill_part(&mut self, xml: &str) -> Result<String> {
        let mut out = String::with_capacity(xml.len());
        let mut last = 0;
        for m in paragraph_re().find_iter(xml) {
            out.push_str(&xml[last..m.start()]);
            match self.fill_paragraph(m.as_str())? {
                Some(new) => out.push_str(&new),
                None => out.push_str(m.as_str()),
            }
            last = m.end();
        }
        out.push_str(&xml[last..]);
        Ok(out)
    }
}

fn next_rel_id(rels: &str) -> String {
    let max = rel_id_re()
        .captures_iter(rels)
        .filter_map(|c| c.get(1)?.as_str().parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("rId{}", max + 1)
}

fn add_relationship(rels: &str, rel_id: &str, media_name: &str) -> String {
    let rel = format!(
        r#"<Relationship Id="{rel_id}" Type="{IMAGE_REL_TYPE}" Target="media/{media_name}"/>"#
    );
    rels.replacen("</Relationships>", &format!("{rel}</Relationships>"), 1)
}

fn ensure_content_type(types: &str, format: ImageFormat) -> String {
    let ext = format.extension();
    if types.to_ascii_lowercase().contains(&format!(r#"extension="{ext}""#)) {
        return types.to_string();
    }
    types.replacen(
        "</Types>",
        &format!(r#"<Default Extension="{ext}" ContentType="{}"/></Types>"#, format.content_type()),
        1,
    )
}

const EMPTY_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#;

/// Fill a template read from `template`; the template itself is not changed.
pub fn fill_docx<R: Read + Seek>(template: R, request: &FillRequest) -> Result<FilledDocument> {
    let mut archive = ZipArchive::new(template)?;

    let mut parts: Vec<(String, Vec<u8>)> = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        parts.push((file.name().to_string(), buf));
    }

    let body_idx = parts
        .iter()
        .position(|(n, _)| n == DOCUMENT)
        .ok_or_else(|| DocsError::MissingPart(DOCUMENT.to_string()))?;
    let rels_idx = parts.iter().position(|(n, _)| n == DOCUMENT_RELS);

    let picture = match &request.picture {
        Some(p) => {
            let rels = rels_idx
                .map(|i| String::from_utf8_lossy(&parts[i].1).into_owned())
                .unwrap_or_default();
            let (format, w, h) = image_dimensions(&p.image)?;
            Some(PicturePlan {
                token: p.token.as_str(),
                rel_id: next_rel_id(&rels),
                format,
                extent: picture_extent((w, h), p.width_inches),
            })
        }
        None => None,
    };

    let mut filler = PartFiller {
        placeholders: &request.placeholders,
        picture,
        table: request.table.as_ref(),
        next_doc_pr: 1_000,
        report: FillReport::default(),
    };

    let body = String::from_utf8_lossy(&parts[body_idx].1).into_owned();
    parts[body_idx].1 = filler.fill_part(&body)?.into_bytes();

    // Headers and footers get text tokens only; pictures would need their
    // own relationship parts.
    let mut text_only = PartFiller {
        placeholders: &request.placeholders,
        picture: None,
        table: None,
        next_doc_pr: filler.next_doc_pr,
        report: FillReport::default(),
    };
    for (name, data) in parts.iter_mut() {
        if header_footer_re().is_match(name) {
            let xml = String::from_utf8_lossy(data).into_owned();
            *data = text_only.fill_part(&xml)?.into_bytes();
        }
    }
    let mut report = filler.report;
    report.paragraphs_changed += text_only.report.paragraphs_changed;
    report.tokens_used.extend(text_only.report.tokens_used);

    if report.pictures_inserted > 0 {
        if let (Some(plan), Some(insert)) = (&filler.picture, &request.picture) {
            let media_name = plan.format.media_name();
            match rels_idx {
                Some(i) => {
                    let rels = String::from_utf8_lossy(&parts[i].1).into_owned();
                    parts[i].1 = add_relationship(&rels, &plan.rel_id, &media_name).into_bytes();
                }
                None => parts.push((
                    DOCUMENT_RELS.to_string(),
                    add_relationship(EMPTY_RELS, &plan.rel_id, &media_name).into_bytes(),
                )),
            }
            if let Some((_, data)) = parts.iter_mut().find(|(n, _)| n == CONTENT_TYPES) {
                let types = String::from_utf8_lossy(data).into_owned();
                *data = ensure_content_type(&types, plan.format).into_bytes();
            }
            parts.push((format!("word/media/{media_name}"), insert.image.clone()));
        }
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in &parts {
        zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
        zip.write_all(data)?;
    }
    let bytes = zip.finish()?.into_inner();

    info!(
        "filled template: {} paragraphs, {} pictures, {} tables",
        report.paragraphs_changed, report.pictures_inserted, report.tables_inserted
    );
    let unused = report.unused(&request.placeholders);
    if !unused.is_empty() {
        debug!("tokens not in template: {:?}", unused);
    }

    Ok(FilledDocument { bytes, report })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholders(pairs: &[(&str, &str)]) -> Placeholders {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn filler<'a>(map: &'a Placeholders, table: Option<&'a TableInsert>) -> PartFiller<'a> {
        PartFiller {
            placeholders: map,
            picture: None,
            table,
            next_doc_pr: 1,
            report: FillReport::default(),
        }
    }

    #[test]
    fn test_token_split_across_runs() {
        let map = placeholders(&[("<<company>>", "Acme & Sons")]);
        let p = r#"<w:p><w:pPr><w:jc w:val="left"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>To &lt;&lt;comp</w:t></w:r><w:r><w:t xml:space="preserve">any&gt;&gt; Ltd</w:t></w:r></w:p>"#;
        let mut f = filler(&map, None);
        let out = f.fill_paragraph(p).unwrap().unwrap();
        assert_eq!(
            out,
            r#"<w:p><w:pPr><w:jc w:val="left"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">To Acme &amp; Sons Ltd</w:t></w:r><w:r><w:t></w:t></w:r></w:p>"#
        );
        assert!(f.report.tokens_used.contains("<<company>>"));
    }

    #[test]
    fn test_untouched_paragraph_is_kept() {
        let map = placeholders(&[("<<company>>", "Acme")]);
        let mut f = filler(&map, None);
        assert_eq!(f.fill_paragraph("<w:p><w:r><w:t>Dear Sir</w:t></w:r></w:p>").unwrap(), None);
        assert_eq!(f.fill_paragraph("<w:p><w:pPr/></w:p>").unwrap(), None);
    }

    #[test]
    fn test_multiline_value_gets_breaks() {
        let map = placeholders(&[("{{addr}}", "1 Street,\nCity")]);
        let mut f = filler(&map, None);
        let out = f
            .fill_paragraph("<w:p><w:r><w:t>{{addr}}</w:t></w:r></w:p>")
            .unwrap()
            .unwrap();
        assert!(out.contains(r#"1 Street,</w:t><w:br/><w:t xml:space="preserve">City"#));
    }

    #[test]
    fn test_part_paragraphs_and_self_closed() {
        let map = placeholders(&[("<<date>>", "01-May-2024")]);
        let xml = r#"<w:body><w:p/><w:p w:rsidR="00AB"/><w:p w:rsidR="00CD"><w:r><w:t>Date: &lt;&lt;date&gt;&gt;</w:t></w:r><w:r><w:tab/></w:r></w:p><w:sectPr/></w:body>"#;
        let mut f = filler(&map, None);
        let out = f.fill_part(xml).unwrap();
        assert!(out.starts_with(r#"<w:body><w:p/><w:p w:rsidR="00AB"/><w:p w:rsidR="00CD">"#));
        assert!(out.contains("Date: 01-May-2024"));
        assert!(out.contains("<w:tab/>"));
        assert!(out.ends_with("<w:sectPr/></w:body>"));
        assert_eq!(f.report.paragraphs_changed, 1);
    }

    #[test]
    fn test_table_token_becomes_table() {
        let map = Placeholders::new();
        let table = TableInsert {
            token: "<<nav_table>>".into(),
            rows: vec![
                vec!["Particulars".into(), "Amount".into()],
                vec!["Land & Building".into()],
            ],
        };
        let mut f = filler(&map, Some(&table));
        let out = f
            .fill_paragraph("<w:p><w:r><w:t>&lt;&lt;nav_table&gt;&gt;</w:t></w:r></w:p>")
            .unwrap()
            .unwrap();
        assert!(out.starts_with("<w:tbl>"));
        assert!(out.ends_with("</w:tbl><w:p/>"));
        assert_eq!(out.matches("<w:tr>").count(), 2);
        assert_eq!(out.matches("<w:tc>").count(), 4);
        assert_eq!(out.matches(r#"<w:gridCol w:w="4500"/>"#).count(), 2);
        assert!(out.contains("Land &amp; Building"));
        assert_eq!(out.matches("<w:b/>").count(), 2);
        assert_eq!(f.report.tables_inserted, 1);
    }

    #[test]
    fn test_png_dimensions() {
        let mut png = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR".to_vec();
        png.extend_from_slice(&400u32.to_be_bytes());
        png.extend_from_slice(&100u32.to_be_bytes());
        assert_eq!(png_dimensions(&png).unwrap(), (400, 100));
        assert_eq!(image_dimensions(&png).unwrap(), (ImageFormat::Png, 400, 100));
        assert_eq!(picture_extent((400, 100), 5.0), (4_572_000, 1_143_000));
        assert!(matches!(image_dimensions(b"GIF89a"), Err(DocsError::UnsupportedImage)));
    }

    #[test]
    fn test_jpeg_dimensions_from_frame_header() {
        let jpeg = [
            &[0xFF, 0xD8][..],
            // APP0 JFIF segment before the frame header
            &[0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0, 1, 1, 0, 0, 1, 0, 1, 0, 0],
            // Padded SOF2 (progressive): precision, height 300, width 640
            &[0xFF, 0xFF, 0xC2, 0x00, 0x11, 0x08, 0x01, 0x2C, 0x02, 0x80, 3],
            &[0u8; 9],
        ]
        .concat();
        assert_eq!(jpeg_dimensions(&jpeg).unwrap(), (640, 300));
        assert_eq!(image_dimensions(&jpeg).unwrap(), (ImageFormat::Jpeg, 640, 300));

        // A huffman table segment is not a frame header.
        let no_frame = [0xFF, 0xD8, 0xFF, 0xC4, 0x00, 0x06, 0x01, 0x2C, 0x02, 0x80, 0xFF, 0xD9];
        assert!(matches!(jpeg_dimensions(&no_frame), Err(DocsError::UnsupportedImage)));
        assert!(matches!(jpeg_dimensions(&[0xFF, 0xD8, 0xFF]), Err(DocsError::UnsupportedImage)));
    }

    #[test]
    fn test_relationship_and_content_type() {
        let rels = r#"<Relationships><Relationship Id="rId1" Target="styles.xml"/><Relationship Id="rId7" Target="theme.xml"/></Relationships>"#;
        let id = next_rel_id(rels);
        assert_eq!(id, "rId8");
        let added = add_relationship(rels, &id, &ImageFormat::Png.media_name());
        assert!(added.ends_with(r#"Target="media/consol_image1.png"/></Relationships>"#));

        let types = r#"<Types><Default Extension="xml" ContentType="application/xml"/></Types>"#;
        let with_png = ensure_content_type(types, ImageFormat::Png);
        assert!(with_png.contains(r#"<Default Extension="png" ContentType="image/png"/>"#));
        assert_eq!(ensure_content_type(&with_png, ImageFormat::Png), with_png);
        let both = ensure_content_type(&with_png, ImageFormat::Jpeg);
        assert!(both.ends_with(r#"<Default Extension="jpeg" ContentType="image/jpeg"/></Types>"#));
    }
}
