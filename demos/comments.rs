//! Worksheets with cell comments, written to an in-memory buffer.
//!
//! Run with: cargo run --example comments

use xlsxstream::StreamingWorkbookWriter;

fn main() -> xlsxstream::Result<()> {
    let mut buffer = Vec::new();

    let mut writer = StreamingWorkbookWriter::new();
    writer.open_buffer(&mut buffer)?;

    let sheet = writer.add_worksheet("Review")?;
    writer.add_cell(sheet.cell(1, 1))?.string("Quarterly totals")?;
    writer.add_cell(sheet.cell(2, 1))?.number(15_320.50)?;
    writer.add_cell(sheet.cell(3, 1))?.formula("=A2*1.2")?;

    writer.add_comment(sheet.cell(2, 1), "Verified against the ledger")?;
    writer.add_comment(sheet.cell(3, 1), "Projection, not actuals")?;

    writer.close()?;
    drop(writer);

    std::fs::write("comments_demo.xlsx", &buffer)?;
    println!("wrote comments_demo.xlsx ({} bytes)", buffer.len());
    Ok(())
}
