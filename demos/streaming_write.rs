//! Stream a large worksheet to disk with bounded memory.
//!
//! Run with: cargo run --example streaming_write

use xlsxstream::{CellRef, StreamingWorkbookWriter};

fn main() -> xlsxstream::Result<()> {
    let mut writer = StreamingWorkbookWriter::new();
    writer.open("streaming_demo.xlsx")?;

    writer.add_worksheet("Records")?;
    writer.add_cell(CellRef::new(1, 1))?.string("ID")?;
    writer.add_cell(CellRef::new(1, 2))?.string("Name")?;
    writer.add_cell(CellRef::new(1, 3))?.string("Score")?;

    for row in 2..=100_000u32 {
        writer.add_cell(CellRef::new(row, 1))?.int(row as i64 - 1)?;
        writer
            .add_cell(CellRef::new(row, 2))?
            .string(&format!("record-{}", row - 1))?;
        writer
            .add_cell(CellRef::new(row, 3))?
            .number((row as f64) * 0.25)?;
    }

    writer.close()?;
    println!("wrote streaming_demo.xlsx");
    Ok(())
}
