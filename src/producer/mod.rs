//! Archive producer: encodes XML parts and assembles the zip package
//!
//! The producer owns the zip writer over the backing sink and performs the
//! actual part emission. It knows nothing about the emission state machine;
//! the streaming workbook writer sequences the calls and guarantees that at
//! most one content stream is open at a time.
//!
//! Part order in the archive follows the streaming constraint: static
//! scaffolding at open, worksheet and comment parts as they are streamed,
//! and everything whose content depends on the full sheet list
//! (`sharedStrings`, `workbook.xml`, `[Content_Types].xml`) at finalize.

pub mod shared_strings;
pub mod xml;

use std::io::Write;

use log::{debug, trace};
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::cell::CellRef;
use crate::error::{Result, XlsxError};
use crate::registry::SheetRegistry;
use crate::sink::Sink;
use shared_strings::SharedStrings;
use xml::{escape_into, XmlWriter};

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";
const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_DOC_RELS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Typed value routed into a single cell element
pub(crate) enum Payload<'v> {
    Str(&'v str),
    Number(f64),
    Int(i64),
    Bool(bool),
    Formula(&'v str),
}

/// Writes the package parts through the backing sink.
///
/// The current worksheet context starts out as an internal placeholder
/// (position 1, "Sheet1") so cell writes have a valid target before the
/// first real worksheet arrives. Placeholder output lands in a scratch
/// buffer that is discarded, never in the archive.
pub(crate) struct XlsxProducer<'a> {
    zip: Option<ZipWriter<Sink<'a>>>,
    shared: SharedStrings,
    /// Position of the current worksheet context; meaningless while
    /// `placeholder` is set
    position: u32,
    placeholder: bool,
    scratch: Vec<u8>,
    open_row: Option<u32>,
    cell_buffer: Vec<u8>,
    current_has_comments: bool,
    comment_parts: Vec<u32>,
}

impl<'a> XlsxProducer<'a> {
    /// Bind the producer to a sink and emit the static package scaffolding.
    pub fn open(sink: Sink<'a>) -> Result<Self> {
        let mut producer = XlsxProducer {
            zip: Some(ZipWriter::new(sink)),
            shared: SharedStrings::new(),
            position: 1,
            placeholder: true,
            scratch: Vec::new(),
            open_row: None,
            cell_buffer: Vec::with_capacity(256),
            current_has_comments: false,
            comment_parts: Vec::new(),
        };
        producer.write_root_rels()?;
        producer.write_core_props()?;
        producer.write_app_props()?;
        debug!("archive producer bound to sink");
        Ok(producer)
    }

    fn options() -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(6))
    }

    fn zip_mut(&mut self) -> Result<&mut ZipWriter<Sink<'a>>> {
        self.zip.as_mut().ok_or(XlsxError::WriterClosed)
    }

    /// Route bytes to the live zip entry, or to the placeholder scratch
    /// buffer when no real worksheet has superseded it yet.
    fn emit(&mut self, bytes: &[u8]) -> Result<()> {
        if self.placeholder {
            self.scratch.extend_from_slice(bytes);
            Ok(())
        } else {
            self.zip_mut()?.write_all(bytes)?;
            Ok(())
        }
    }

    /// Switch the current worksheet context to a newly registered sheet.
    ///
    /// The placeholder context, if still current, is dropped here without
    /// ever having touched the archive.
    pub fn add_worksheet(&mut self, title: &str, position: u32) {
        if self.placeholder {
            self.placeholder = false;
            self.scratch = Vec::new();
        }
        self.position = position;
        self.current_has_comments = false;
        trace!("worksheet context -> '{}' (position {})", title, position);
    }

    /// Begin the worksheet content stream for the current context.
    pub fn stream_worksheet_begin(&mut self) -> Result<()> {
        self.open_row = None;
        if self.placeholder {
            self.scratch.clear();
            return Ok(());
        }

        let name = format!("xl/worksheets/sheet{}.xml", self.position);
        self.zip_mut()?.start_file(name, Self::options())?;

        let mut xml = XmlWriter::new(self.zip_mut()?);
        xml.write_str(XML_DECL)?;
        xml.start_element("worksheet")?;
        xml.attribute("xmlns", NS_MAIN)?;
        xml.attribute("xmlns:r", NS_DOC_RELS)?;
        xml.close_start_tag()?;
        xml.start_element("sheetData")?;
        xml.close_start_tag()?;
        xml.flush()?;
        Ok(())
    }

    /// Close the worksheet content stream (open row element included).
    pub fn stream_worksheet_end(&mut self) -> Result<()> {
        if self.open_row.take().is_some() {
            self.emit(b"</row>")?;
        }
        if self.placeholder {
            self.scratch.clear();
            return Ok(());
        }
        self.emit(b"</sheetData></worksheet>")?;
        trace!("worksheet stream ended (position {})", self.position);
        Ok(())
    }

    /// Emit the relationship part for the sheet whose streams just ended.
    ///
    /// Only emitted once the content is fully written, and only when the
    /// sheet actually has relationships (a comments part). Never emitted
    /// for the placeholder.
    pub fn stream_worksheet_rels(&mut self) -> Result<()> {
        if self.placeholder || !self.current_has_comments {
            return Ok(());
        }
        self.current_has_comments = false;
        let position = self.position;
        self.comment_parts.push(position);

        let name = format!("xl/worksheets/_rels/sheet{}.xml.rels", position);
        self.zip_mut()?.start_file(name, Self::options())?;

        let mut xml = XmlWriter::new(self.zip_mut()?);
        xml.write_str(XML_DECL)?;
        xml.start_element("Relationships")?;
        xml.attribute("xmlns", NS_RELS)?;
        xml.close_start_tag()?;
        xml.start_element("Relationship")?;
        xml.attribute("Id", "rId1")?;
        xml.attribute(
            "Type",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments",
        )?;
        xml.attribute("Target", &format!("../comments{}.xml", position))?;
        xml.write_raw(b"/>")?;
        xml.end_element("Relationships")?;
        xml.flush()?;
        Ok(())
    }

    /// Begin the comments stream for the current worksheet context.
    pub fn stream_comments_begin(&mut self) -> Result<()> {
        if self.placeholder {
            self.scratch.clear();
            return Ok(());
        }
        self.current_has_comments = true;

        let name = format!("xl/comments{}.xml", self.position);
        self.zip_mut()?.start_file(name, Self::options())?;

        let mut xml = XmlWriter::new(self.zip_mut()?);
        xml.write_str(XML_DECL)?;
        xml.start_element("comments")?;
        xml.attribute("xmlns", NS_MAIN)?;
        xml.close_start_tag()?;
        xml.write_raw(b"<authors><author></author></authors><commentList>")?;
        xml.flush()?;
        trace!("comments stream begun (position {})", self.position);
        Ok(())
    }

    /// Append one comment to the open comments stream.
    pub fn stream_comment(&mut self, cell: CellRef, text: &str) -> Result<()> {
        let mut buf = std::mem::take(&mut self.cell_buffer);
        buf.clear();
        buf.extend_from_slice(b"<comment ref=\"");
        buf.extend_from_slice(cell.to_a1().as_bytes());
        buf.extend_from_slice(b"\" authorId=\"0\"><text><r><t>");
        escape_into(&mut buf, text);
        buf.extend_from_slice(b"</t></r></text></comment>");
        self.emit(&buf)?;
        self.cell_buffer = buf;
        Ok(())
    }

    /// Close the comments stream.
    pub fn stream_comments_end(&mut self) -> Result<()> {
        if self.placeholder {
            self.scratch.clear();
            return Ok(());
        }
        self.emit(b"</commentList></comments>")?;
        trace!("comments stream ended (position {})", self.position);
        Ok(())
    }

    /// Write one cell element into the open worksheet stream.
    ///
    /// A new `<row>` element is opened whenever the row coordinate changes;
    /// cells are expected in row order, as the stream cannot be rewound.
    pub(crate) fn write_cell(&mut self, cell: CellRef, payload: Payload<'_>) -> Result<()> {
        self.ensure_row(cell.row())?;

        let mut digits = itoa::Buffer::new();
        let mut buf = std::mem::take(&mut self.cell_buffer);
        buf.clear();
        buf.extend_from_slice(b"<c r=\"");
        buf.extend_from_slice(cell.to_a1().as_bytes());
        match payload {
            Payload::Str(s) => {
                let index = self.shared.intern(s);
                buf.extend_from_slice(b"\" t=\"s\"><v>");
                buf.extend_from_slice(digits.format(index).as_bytes());
                buf.extend_from_slice(b"</v></c>");
            }
            Payload::Number(n) => {
                buf.extend_from_slice(b"\"><v>");
                buf.extend_from_slice(n.to_string().as_bytes());
                buf.extend_from_slice(b"</v></c>");
            }
            Payload::Int(i) => {
                buf.extend_from_slice(b"\"><v>");
                buf.extend_from_slice(digits.format(i).as_bytes());
                buf.extend_from_slice(b"</v></c>");
            }
            Payload::Bool(b) => {
                buf.extend_from_slice(b"\" t=\"b\"><v>");
                buf.extend_from_slice(if b { b"1" } else { b"0" });
                buf.extend_from_slice(b"</v></c>");
            }
            Payload::Formula(f) => {
                buf.extend_from_slice(b"\"><f>");
                escape_into(&mut buf, f.strip_prefix('=').unwrap_or(f));
                buf.extend_from_slice(b"</f></c>");
            }
        }
        self.emit(&buf)?;
        self.cell_buffer = buf;
        Ok(())
    }

    fn ensure_row(&mut self, row: u32) -> Result<()> {
        if self.open_row == Some(row) {
            return Ok(());
        }
        let mut digits = itoa::Buffer::new();
        let mut buf = std::mem::take(&mut self.cell_buffer);
        buf.clear();
        if self.open_row.is_some() {
            buf.extend_from_slice(b"</row>");
        }
        buf.extend_from_slice(b"<row r=\"");
        buf.extend_from_slice(digits.format(row).as_bytes());
        buf.extend_from_slice(b"\">");
        self.emit(&buf)?;
        self.cell_buffer = buf;
        self.open_row = Some(row);
        Ok(())
    }

    /// Write the remaining parts and seal the archive.
    ///
    /// With `finalize` set, the zip end-of-archive record is written and
    /// the sink is flushed and released; no further parts can follow.
    pub fn populate_archive(&mut self, registry: &SheetRegistry, finalize: bool) -> Result<()> {
        self.write_shared_strings()?;
        self.write_workbook_xml(registry)?;
        self.write_workbook_rels(registry)?;
        self.write_styles()?;
        self.write_content_types(registry)?;

        if finalize {
            let zip = self.zip.take().ok_or(XlsxError::WriterClosed)?;
            let sink = zip.finish()?;
            sink.finalize()?;
            debug!(
                "archive sealed: {} sheet(s), {} comment part(s), {} shared string(s)",
                registry.len(),
                self.comment_parts.len(),
                self.shared.unique_count()
            );
        }
        Ok(())
    }

    fn write_root_rels(&mut self) -> Result<()> {
        self.zip_mut()?.start_file("_rels/.rels", Self::options())?;
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;
        self.zip_mut()?.write_all(xml.as_bytes())?;
        Ok(())
    }

    fn write_core_props(&mut self) -> Result<()> {
        self.zip_mut()?
            .start_file("docProps/core.xml", Self::options())?;
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<dc:creator>xlsxstream</dc:creator>
<cp:lastModifiedBy>xlsxstream</cp:lastModifiedBy>
<dcterms:created xsi:type="dcterms:W3CDTF">2024-01-01T00:00:00Z</dcterms:created>
<dcterms:modified xsi:type="dcterms:W3CDTF">2024-01-01T00:00:00Z</dcterms:modified>
</cp:coreProperties>"#;
        self.zip_mut()?.write_all(xml.as_bytes())?;
        Ok(())
    }

    fn write_app_props(&mut self) -> Result<()> {
        self.zip_mut()?
            .start_file("docProps/app.xml", Self::options())?;
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
<Application>xlsxstream</Application>
<DocSecurity>0</DocSecurity>
<ScaleCrop>false</ScaleCrop>
<LinksUpToDate>false</LinksUpToDate>
<SharedDoc>false</SharedDoc>
<HyperlinksChanged>false</HyperlinksChanged>
<AppVersion>1.0</AppVersion>
</Properties>"#;
        self.zip_mut()?.write_all(xml.as_bytes())?;
        Ok(())
    }

    fn write_shared_strings(&mut self) -> Result<()> {
        self.zip_mut()?
            .start_file("xl/sharedStrings.xml", Self::options())?;
        let shared = std::mem::take(&mut self.shared);
        let result = {
            let mut xml = XmlWriter::new(self.zip_mut()?);
            shared.write_xml(&mut xml)
        };
        self.shared = shared;
        result
    }

    fn write_workbook_xml(&mut self, registry: &SheetRegistry) -> Result<()> {
        self.zip_mut()?
            .start_file("xl/workbook.xml", Self::options())?;
        let active_tab = registry.active_index();

        let mut xml = XmlWriter::new(self.zip_mut()?);
        xml.write_str(XML_DECL)?;
        xml.start_element("workbook")?;
        xml.attribute("xmlns", NS_MAIN)?;
        xml.attribute("xmlns:r", NS_DOC_RELS)?;
        xml.close_start_tag()?;

        xml.start_element("bookViews")?;
        xml.close_start_tag()?;
        xml.start_element("workbookView")?;
        xml.attribute_int("activeTab", active_tab as u64)?;
        xml.write_raw(b"/>")?;
        xml.end_element("bookViews")?;

        xml.start_element("sheets")?;
        xml.close_start_tag()?;
        for entry in registry.entries() {
            xml.start_element("sheet")?;
            xml.attribute("name", &entry.name)?;
            xml.attribute_int("sheetId", entry.position as u64)?;
            xml.attribute("r:id", &format!("rId{}", entry.position))?;
            xml.write_raw(b"/>")?;
        }
        xml.end_element("sheets")?;

        xml.end_element("workbook")?;
        xml.flush()?;
        Ok(())
    }

    fn write_workbook_rels(&mut self, registry: &SheetRegistry) -> Result<()> {
        self.zip_mut()?
            .start_file("xl/_rels/workbook.xml.rels", Self::options())?;
        let sheet_count = registry.len() as u32;

        let mut xml = XmlWriter::new(self.zip_mut()?);
        xml.write_str(XML_DECL)?;
        xml.start_element("Relationships")?;
        xml.attribute("xmlns", NS_RELS)?;
        xml.close_start_tag()?;

        for entry in registry.entries() {
            xml.start_element("Relationship")?;
            xml.attribute("Id", &format!("rId{}", entry.position))?;
            xml.attribute(
                "Type",
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet",
            )?;
            xml.attribute("Target", &format!("worksheets/sheet{}.xml", entry.position))?;
            xml.write_raw(b"/>")?;
        }

        xml.start_element("Relationship")?;
        xml.attribute("Id", &format!("rId{}", sheet_count + 1))?;
        xml.attribute(
            "Type",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles",
        )?;
        xml.attribute("Target", "styles.xml")?;
        xml.write_raw(b"/>")?;

        xml.start_element("Relationship")?;
        xml.attribute("Id", &format!("rId{}", sheet_count + 2))?;
        xml.attribute(
            "Type",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings",
        )?;
        xml.attribute("Target", "sharedStrings.xml")?;
        xml.write_raw(b"/>")?;

        xml.end_element("Relationships")?;
        xml.flush()?;
        Ok(())
    }

    fn write_styles(&mut self) -> Result<()> {
        self.zip_mut()?
            .start_file("xl/styles.xml", Self::options())?;
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<numFmts count="0"/>
<fonts count="1">
<font><sz val="11"/><name val="Calibri"/></font>
</fonts>
<fills count="2">
<fill><patternFill patternType="none"/></fill>
<fill><patternFill patternType="gray125"/></fill>
</fills>
<borders count="1">
<border><left/><right/><top/><bottom/><diagonal/></border>
</borders>
<cellStyleXfs count="1">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
</cellStyleXfs>
<cellXfs count="1">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
</cellXfs>
</styleSheet>"#;
        self.zip_mut()?.write_all(xml.as_bytes())?;
        Ok(())
    }

    /// Written last: the override list depends on which sheets acquired
    /// comment parts while streaming.
    fn write_content_types(&mut self, registry: &SheetRegistry) -> Result<()> {
        self.zip_mut()?
            .start_file("[Content_Types].xml", Self::options())?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
        );

        for entry in registry.entries() {
            content.push_str(&format!(
                "\n<Override PartName=\"/xl/worksheets/sheet{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>",
                entry.position
            ));
        }
        for position in &self.comment_parts {
            content.push_str(&format!(
                "\n<Override PartName=\"/xl/comments{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.comments+xml\"/>",
                position
            ));
        }

        content.push_str(
            r#"
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
</Types>"#,
        );

        self.zip_mut()?.write_all(content.as_bytes())?;
        Ok(())
    }
}
