//! Shared strings table for string deduplication

use indexmap::IndexSet;
use std::io::Write;

use super::xml::XmlWriter;
use crate::error::Result;

/// Workbook-wide string table; every string cell stores an index into it
#[derive(Default)]
pub struct SharedStrings {
    strings: IndexSet<String>,
    total_count: u64,
}

impl SharedStrings {
    pub fn new() -> Self {
        SharedStrings {
            strings: IndexSet::with_capacity(1024),
            total_count: 0,
        }
    }

    /// Intern a string and return its table index
    pub fn intern(&mut self, s: &str) -> u32 {
        self.total_count += 1;
        if let Some(index) = self.strings.get_index_of(s) {
            return index as u32;
        }
        self.strings.insert_full(s.to_string()).0 as u32
    }

    /// Number of unique strings
    pub fn unique_count(&self) -> usize {
        self.strings.len()
    }

    /// Write the `xl/sharedStrings.xml` part
    pub fn write_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> Result<()> {
        writer.write_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n")?;
        writer.start_element("sst")?;
        writer.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
        )?;
        writer.attribute_int("count", self.total_count)?;
        writer.attribute_int("uniqueCount", self.strings.len() as u64)?;
        writer.close_start_tag()?;

        for s in &self.strings {
            writer.write_raw(b"<si><t>")?;
            writer.write_escaped(s)?;
            writer.write_raw(b"</t></si>")?;
        }

        writer.end_element("sst")?;
        writer.flush()?;
        Ok(())
    }
}
