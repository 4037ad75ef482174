//! Cell addressing

use std::fmt;

/// A 1-based cell coordinate within a worksheet.
///
/// Opaque pass-through identifier: the writer forwards it to the archive
/// producer, which renders it in A1 notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    row: u32,
    col: u16,
}

impl CellRef {
    /// Create a cell reference from 1-based row and column numbers.
    pub fn new(row: u32, col: u16) -> Self {
        CellRef { row, col }
    }

    /// 1-based row number
    pub fn row(&self) -> u32 {
        self.row
    }

    /// 1-based column number
    pub fn col(&self) -> u16 {
        self.col
    }

    /// Render in A1 notation ("A1", "AZ10", ...)
    pub fn to_a1(&self) -> String {
        let mut s = col_to_letters(self.col as u32);
        let mut buf = itoa::Buffer::new();
        s.push_str(buf.format(self.row));
        s
    }
}

impl From<(u32, u16)> for CellRef {
    fn from((row, col): (u32, u16)) -> Self {
        CellRef::new(row, col)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

/// Convert a 1-based column number to Excel column letters
pub(crate) fn col_to_letters(col: u32) -> String {
    let mut col_str = String::new();
    let mut n = col;
    while n > 0 {
        let rem = (n - 1) % 26;
        col_str.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    col_str
}
