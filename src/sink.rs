//! Backing sink: the raw byte destination behind the archive
//!
//! Three construction paths, one contract: a single linear output that
//! receives every byte the archive producer writes. A sink opened from a
//! path or memory buffer is owned by the writer and released when the
//! archive is sealed; a caller-supplied stream is only borrowed and is
//! never closed by the writer.

use std::fs::File;
use std::io::{self, BufWriter, Cursor, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{Result, XlsxError};

/// Caller-supplied output stream requirements
pub trait SinkStream: Write + Seek {}

impl<T: Write + Seek> SinkStream for T {}

/// Byte destination for the produced package
pub enum Sink<'a> {
    /// Newly created file, exclusively owned
    File(BufWriter<File>),
    /// Caller-provided buffer, grown in place
    Buffer(Cursor<&'a mut Vec<u8>>),
    /// Caller-owned stream handle, borrowed for the writer's lifetime
    Stream(&'a mut dyn SinkStream),
}

impl<'a> Sink<'a> {
    /// Create and truncate a file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            XlsxError::DestinationUnavailable(format!("{}: {}", path.display(), e))
        })?;
        Ok(Sink::File(BufWriter::with_capacity(64 * 1024, file)))
    }

    /// Append to a caller-provided in-memory buffer.
    pub fn buffer(data: &'a mut Vec<u8>) -> Self {
        let pos = data.len() as u64;
        let mut cursor = Cursor::new(data);
        cursor.set_position(pos);
        Sink::Buffer(cursor)
    }

    /// Borrow a caller-owned stream handle.
    pub fn stream(stream: &'a mut dyn SinkStream) -> Self {
        Sink::Stream(stream)
    }

    /// Flush buffered bytes and release whatever the sink owns.
    ///
    /// The borrowed stream variant only flushes; the caller's handle stays
    /// open and usable afterwards.
    pub fn finalize(self) -> io::Result<()> {
        match self {
            Sink::File(mut file) => file.flush(),
            Sink::Buffer(_) => Ok(()),
            Sink::Stream(stream) => stream.flush(),
        }
    }
}

impl Write for Sink<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::File(w) => w.write(buf),
            Sink::Buffer(w) => w.write(buf),
            Sink::Stream(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::File(w) => w.flush(),
            Sink::Buffer(w) => w.flush(),
            Sink::Stream(w) => w.flush(),
        }
    }
}

impl Seek for Sink<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Sink::File(w) => w.seek(pos),
            Sink::Buffer(w) => w.seek(pos),
            Sink::Stream(w) => w.seek(pos),
        }
    }
}
