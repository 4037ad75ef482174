//! # xlsxstream
//!
//! A single-pass, memory-bounded XLSX writer. Worksheets, cells, and
//! comments are serialized straight into the zip package as they are added,
//! so producing a workbook never requires holding it in memory.
//!
//! ## Features
//!
//! - **True streaming**: cells go to the output the moment they are written
//! - **Bounded memory**: only the shared-string table and the sheet registry
//!   stay resident
//! - **Three destinations**: file path, in-memory buffer, or a caller-owned
//!   stream (which is borrowed, never closed)
//! - **Safe lifecycle**: the archive is finalized exactly once, whether the
//!   writer is closed explicitly, closed repeatedly, or simply dropped
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xlsxstream::{CellRef, StreamingWorkbookWriter};
//!
//! # fn main() -> xlsxstream::Result<()> {
//! let mut writer = StreamingWorkbookWriter::new();
//! writer.open("output.xlsx")?;
//!
//! writer.add_worksheet("Data")?;
//! for row in 1..=1_000_000 {
//!     writer.add_cell(CellRef::new(row, 1))?.int(row as i64)?;
//!     writer.add_cell(CellRef::new(row, 2))?.string("item")?;
//! }
//!
//! writer.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Writing to memory
//!
//! ```rust
//! use xlsxstream::StreamingWorkbookWriter;
//!
//! # fn main() -> xlsxstream::Result<()> {
//! let mut buffer = Vec::new();
//! let mut writer = StreamingWorkbookWriter::new();
//! writer.open_buffer(&mut buffer)?;
//! writer.add_worksheet("Data")?;
//! writer.add_cell((1, 1))?.string("hello")?;
//! writer.close()?;
//! drop(writer);
//! // `buffer` now holds a complete .xlsx package
//! # Ok(())
//! # }
//! ```

pub mod cell;
pub mod error;
mod producer;
mod registry;
pub mod sink;
pub mod writer;

pub use cell::CellRef;
pub use error::{Result, XlsxError};
pub use sink::SinkStream;
pub use writer::{CellWriter, StreamingWorkbookWriter, Worksheet};
