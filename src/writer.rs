//! Streaming workbook writer: ordering protocol and resource lifecycle
//!
//! The writer sequences begin/end calls on the archive producer so that at
//! most one content stream (worksheet or comments) is open at any instant,
//! and guarantees the backing sink is finalized exactly once no matter how
//! writing terminates: explicit `close()`, repeated `close()`, or plain
//! drop all funnel into the same idempotent routine.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use log::debug;

use crate::cell::CellRef;
use crate::error::{Result, XlsxError};
use crate::producer::{Payload, XlsxProducer};
use crate::registry::SheetRegistry;
use crate::sink::{Sink, SinkStream};

/// Current streaming state of the writer.
///
/// A single tagged enum rather than independent flags, so the
/// mutual-exclusion invariant cannot be violated by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmissionMode {
    Idle,
    StreamingSheet,
    StreamingComments,
}

/// Opaque handle for a worksheet registered through [`StreamingWorkbookWriter::add_worksheet`]
#[derive(Debug, Clone)]
pub struct Worksheet {
    title: String,
    position: u32,
}

impl Worksheet {
    /// Sheet title as registered
    pub fn title(&self) -> &str {
        &self.title
    }

    /// 1-based position in the workbook's sheet list
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Convenience constructor for cell references on this sheet
    pub fn cell(&self, row: u32, col: u16) -> CellRef {
        CellRef::new(row, col)
    }
}

/// Writable handle for a single cell, positioned at a reference.
///
/// Each setter consumes the handle; one cell element is emitted per handle,
/// directly into the open worksheet stream.
pub struct CellWriter<'w, 'a> {
    producer: &'w mut XlsxProducer<'a>,
    cell: CellRef,
}

impl CellWriter<'_, '_> {
    /// Write a string value (deduplicated through the shared-string table)
    pub fn string(self, value: &str) -> Result<()> {
        self.producer.write_cell(self.cell, Payload::Str(value))
    }

    /// Write a floating-point number
    pub fn number(self, value: f64) -> Result<()> {
        self.producer.write_cell(self.cell, Payload::Number(value))
    }

    /// Write an integer
    pub fn int(self, value: i64) -> Result<()> {
        self.producer.write_cell(self.cell, Payload::Int(value))
    }

    /// Write a boolean
    pub fn bool(self, value: bool) -> Result<()> {
        self.producer.write_cell(self.cell, Payload::Bool(value))
    }

    /// Write a formula ("=SUM(A1:A10)"; the leading '=' is optional)
    pub fn formula(self, formula: &str) -> Result<()> {
        self.producer.write_cell(self.cell, Payload::Formula(formula))
    }

    /// Write a datetime as an Excel serial number
    pub fn datetime(self, value: NaiveDateTime) -> Result<()> {
        self.producer
            .write_cell(self.cell, Payload::Number(excel_serial(value)))
    }
}

/// Days between the Excel epoch (1899-12-30) and a datetime, with the time
/// of day as the fractional part
fn excel_serial(value: NaiveDateTime) -> f64 {
    // The 1899-12-30 epoch absorbs Excel's fictitious 1900-02-29, which
    // only exists in serials from 1900-03-01 onward; earlier dates sit one
    // day lower
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    let leap_cutoff = NaiveDate::from_ymd_opt(1900, 3, 1).unwrap();
    let mut days = value.date().signed_duration_since(epoch).num_days() as f64;
    if value.date() < leap_cutoff {
        days -= 1.0;
    }
    let seconds = value.time().num_seconds_from_midnight() as f64;
    days + seconds / 86_400.0
}

/// Single-pass workbook writer that streams cells and comments straight to
/// the backing sink.
///
/// ```no_run
/// use xlsxstream::{CellRef, StreamingWorkbookWriter};
///
/// # fn main() -> xlsxstream::Result<()> {
/// let mut writer = StreamingWorkbookWriter::new();
/// writer.open("report.xlsx")?;
///
/// writer.add_worksheet("Data")?;
/// writer.add_cell(CellRef::new(1, 1))?.string("hello")?;
/// writer.add_cell(CellRef::new(1, 2))?.number(42.5)?;
/// writer.add_comment(CellRef::new(1, 1), "reviewed")?;
///
/// writer.close()?;
/// # Ok(())
/// # }
/// ```
pub struct StreamingWorkbookWriter<'a> {
    producer: Option<XlsxProducer<'a>>,
    registry: SheetRegistry,
    mode: EmissionMode,
    closed: bool,
}

impl Default for StreamingWorkbookWriter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> StreamingWorkbookWriter<'a> {
    /// Create an unopened writer; bind a destination with one of the `open`
    /// methods before streaming.
    pub fn new() -> Self {
        StreamingWorkbookWriter {
            producer: None,
            registry: SheetRegistry::new(),
            mode: EmissionMode::Idle,
            closed: false,
        }
    }

    /// Open against a filesystem path, creating or truncating the file.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.check_unopened()?;
        let sink = Sink::create(path)?;
        debug!("opening streaming writer against {}", path.display());
        self.bind(sink)
    }

    /// Open against a caller-provided byte buffer, grown in place.
    pub fn open_buffer(&mut self, data: &'a mut Vec<u8>) -> Result<()> {
        self.check_unopened()?;
        debug!("opening streaming writer against a memory buffer");
        self.bind(Sink::buffer(data))
    }

    /// Open against a caller-owned stream handle.
    ///
    /// The handle is borrowed, never closed: after the writer finishes
    /// (explicitly or by drop), the stream remains open and usable.
    pub fn open_stream<S: SinkStream>(&mut self, stream: &'a mut S) -> Result<()> {
        self.check_unopened()?;
        debug!("opening streaming writer against a caller-owned stream");
        self.bind(Sink::stream(stream))
    }

    fn check_unopened(&self) -> Result<()> {
        if self.closed {
            return Err(XlsxError::WriterClosed);
        }
        if self.producer.is_some() {
            return Err(XlsxError::AlreadyOpen);
        }
        Ok(())
    }

    fn bind(&mut self, sink: Sink<'a>) -> Result<()> {
        let producer = XlsxProducer::open(sink)?;
        self.producer = Some(producer);
        // The producer starts on its internal placeholder context, so cell
        // writes already have a target; the public sheet list stays empty.
        self.mode = EmissionMode::StreamingSheet;
        Ok(())
    }

    /// End any current stream, register a new worksheet, and begin its
    /// content stream.
    pub fn add_worksheet(&mut self, title: &str) -> Result<Worksheet> {
        if self.closed {
            return Err(XlsxError::WriterClosed);
        }
        let producer = self.producer.as_mut().ok_or(XlsxError::NotOpen)?;

        self.registry.validate_title(title)?;
        end_streaming(producer, &mut self.mode)?;

        let position = self.registry.register(title);
        producer.add_worksheet(title, position);
        producer.stream_worksheet_begin()?;
        self.mode = EmissionMode::StreamingSheet;

        Ok(Worksheet {
            title: title.to_string(),
            position,
        })
    }

    /// Get a writable handle for the cell at `cell` in the open worksheet
    /// stream.
    pub fn add_cell<R: Into<CellRef>>(&mut self, cell: R) -> Result<CellWriter<'_, 'a>> {
        if self.closed {
            return Err(XlsxError::WriterClosed);
        }
        if self.mode != EmissionMode::StreamingSheet {
            return Err(XlsxError::NoActiveWorksheet);
        }
        let producer = self
            .producer
            .as_mut()
            .ok_or(XlsxError::NoActiveWorksheet)?;
        Ok(CellWriter {
            producer,
            cell: cell.into(),
        })
    }

    /// Attach a comment to a cell of the current worksheet.
    ///
    /// The first comment ends the worksheet content stream and begins the
    /// comments stream; the sheet's relationship part is deferred until the
    /// comments stream ends. Further comments append to the open stream.
    pub fn add_comment<R: Into<CellRef>>(&mut self, cell: R, text: &str) -> Result<()> {
        if self.closed {
            return Err(XlsxError::WriterClosed);
        }
        let producer = self.producer.as_mut().ok_or(XlsxError::NotOpen)?;

        if self.mode != EmissionMode::StreamingComments {
            if self.mode == EmissionMode::StreamingSheet {
                producer.stream_worksheet_end()?;
            }
            producer.stream_comments_begin()?;
            self.mode = EmissionMode::StreamingComments;
        }
        producer.stream_comment(cell.into(), text)
    }

    /// Finalize the package and release the sink. Idempotent: repeated
    /// calls (and the drop path) are no-ops after the first.
    ///
    /// Resource release is unconditional; if sealing the archive fails, the
    /// producer and sink are still torn down before the error propagates.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut producer) = self.producer.take() else {
            self.closed = true;
            return Ok(());
        };
        self.closed = true;

        let ended = end_streaming(&mut producer, &mut self.mode);
        let sealed = producer
            .populate_archive(&self.registry, true)
            .map_err(|e| match e {
                XlsxError::ArchiveFinalizeFailure(_) => e,
                other => XlsxError::ArchiveFinalizeFailure(other.to_string()),
            });
        drop(producer);

        ended?;
        sealed
    }
}

/// End whichever stream is open; if one was ended, emit the worksheet's
/// relationship part.
///
/// Relationships are written once per ended stream, never per operation:
/// they must describe the fully written sheet, so they are only safe to
/// emit after its content stream has closed.
fn end_streaming(producer: &mut XlsxProducer<'_>, mode: &mut EmissionMode) -> Result<()> {
    let ended = match *mode {
        EmissionMode::Idle => false,
        EmissionMode::StreamingSheet => {
            producer.stream_worksheet_end()?;
            true
        }
        EmissionMode::StreamingComments => {
            producer.stream_comments_end()?;
            true
        }
    };
    *mode = EmissionMode::Idle;

    if ended {
        producer.stream_worksheet_rels()?;
    }
    Ok(())
}

impl Drop for StreamingWorkbookWriter<'_> {
    fn drop(&mut self) {
        // Same idempotent routine as the public close; errors have nowhere
        // to go on the drop path.
        let _ = self.close();
    }
}
