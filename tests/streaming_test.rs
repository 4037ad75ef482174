//! Integration tests for the streaming workbook writer
//!
//! Assertions read the produced package back through `zip::ZipArchive`;
//! entry order in the central directory mirrors emission order, which is
//! how the stream-then-relationships ordering is verified.

use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use xlsxstream::{CellRef, StreamingWorkbookWriter, XlsxError};

fn part_names(data: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

fn part_content(data: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    content
}

#[test]
fn test_end_to_end_single_sheet() {
    let mut buffer = Vec::new();
    {
        let mut writer = StreamingWorkbookWriter::new();
        writer.open_buffer(&mut buffer).unwrap();
        writer.add_worksheet("Sheet1").unwrap();
        writer
            .add_cell(CellRef::new(1, 1))
            .unwrap()
            .string("hello")
            .unwrap();
        writer.close().unwrap();
    }

    let names = part_names(&buffer);
    assert!(names.iter().any(|n| n == "xl/worksheets/sheet1.xml"));
    assert!(!names.iter().any(|n| n.starts_with("xl/comments")));

    let sheet = part_content(&buffer, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<row r=\"1\">"));
    assert!(sheet.contains("<c r=\"A1\" t=\"s\"><v>0</v></c>"));

    let strings = part_content(&buffer, "xl/sharedStrings.xml");
    assert!(strings.contains("<si><t>hello</t></si>"));

    let workbook = part_content(&buffer, "xl/workbook.xml");
    assert!(workbook.contains("name=\"Sheet1\""));
}

#[test]
fn test_relationships_follow_ended_streams() {
    let mut buffer = Vec::new();
    {
        let mut writer = StreamingWorkbookWriter::new();
        writer.open_buffer(&mut buffer).unwrap();
        writer.add_worksheet("Annotated").unwrap();
        writer.add_cell((1, 1)).unwrap().string("value").unwrap();
        writer.add_comment((1, 1), "first note").unwrap();
        writer.add_comment((2, 1), "second note").unwrap();
        writer.close().unwrap();
    }

    let names = part_names(&buffer);
    let sheet = names
        .iter()
        .position(|n| n == "xl/worksheets/sheet1.xml")
        .unwrap();
    let comments = names.iter().position(|n| n == "xl/comments1.xml").unwrap();
    let rels = names
        .iter()
        .position(|n| n == "xl/worksheets/_rels/sheet1.xml.rels")
        .unwrap();

    // Content stream first, then comments, then the relationship part
    assert!(sheet < comments);
    assert!(comments < rels);

    let comment_xml = part_content(&buffer, "xl/comments1.xml");
    assert!(comment_xml.contains("<comment ref=\"A1\" authorId=\"0\">"));
    assert!(comment_xml.contains("first note"));
    assert!(comment_xml.contains("second note"));

    let rels_xml = part_content(&buffer, "xl/worksheets/_rels/sheet1.xml.rels");
    assert!(rels_xml.contains("Target=\"../comments1.xml\""));
}

#[test]
fn test_worksheet_after_comments_ends_comment_stream() {
    let mut buffer = Vec::new();
    {
        let mut writer = StreamingWorkbookWriter::new();
        writer.open_buffer(&mut buffer).unwrap();
        writer.add_worksheet("First").unwrap();
        writer.add_cell((1, 1)).unwrap().string("a").unwrap();
        writer.add_comment((1, 1), "note on first").unwrap();
        // Adding a sheet while comments stream: comments must end first
        writer.add_worksheet("Second").unwrap();
        writer.add_cell((1, 1)).unwrap().string("b").unwrap();
        writer.close().unwrap();
    }

    let names = part_names(&buffer);
    let comments = names.iter().position(|n| n == "xl/comments1.xml").unwrap();
    let rels1 = names
        .iter()
        .position(|n| n == "xl/worksheets/_rels/sheet1.xml.rels")
        .unwrap();
    let sheet2 = names
        .iter()
        .position(|n| n == "xl/worksheets/sheet2.xml")
        .unwrap();
    assert!(comments < rels1);
    assert!(rels1 < sheet2);

    // Second sheet has no comments, so no rels part for it
    assert!(!names
        .iter()
        .any(|n| n == "xl/worksheets/_rels/sheet2.xml.rels"));
    assert!(!names.iter().any(|n| n == "xl/comments2.xml"));
}

#[test]
fn test_idempotent_close() {
    let build = |closes: usize| {
        let mut buffer = Vec::new();
        let mut writer = StreamingWorkbookWriter::new();
        writer.open_buffer(&mut buffer).unwrap();
        writer.add_worksheet("Data").unwrap();
        writer.add_cell((1, 1)).unwrap().string("x").unwrap();
        for _ in 0..closes {
            writer.close().unwrap();
        }
        drop(writer);
        buffer
    };

    let once = build(1);
    let thrice = build(3);
    assert!(!once.is_empty());
    assert_eq!(once, thrice);
}

#[test]
fn test_implicit_close_on_drop() {
    let explicit = {
        let mut buffer = Vec::new();
        let mut writer = StreamingWorkbookWriter::new();
        writer.open_buffer(&mut buffer).unwrap();
        writer.add_worksheet("Data").unwrap();
        writer.add_cell((1, 1)).unwrap().string("x").unwrap();
        writer.close().unwrap();
        drop(writer);
        buffer
    };

    let dropped = {
        let mut buffer = Vec::new();
        {
            let mut writer = StreamingWorkbookWriter::new();
            writer.open_buffer(&mut buffer).unwrap();
            writer.add_worksheet("Data").unwrap();
            writer.add_cell((1, 1)).unwrap().string("x").unwrap();
            // No close(); the drop path must finalize identically
        }
        buffer
    };

    assert_eq!(explicit, dropped);
}

#[test]
fn test_caller_stream_survives_writer() {
    let mut stream = Cursor::new(Vec::new());
    {
        let mut writer = StreamingWorkbookWriter::new();
        writer.open_stream(&mut stream).unwrap();
        writer.add_worksheet("Data").unwrap();
        writer.add_cell((1, 1)).unwrap().string("x").unwrap();
        writer.close().unwrap();
    }

    // The handle is still ours: the package parses, and we can keep writing
    let len = stream.get_ref().len() as u64;
    assert!(len > 0);
    stream.seek(SeekFrom::Start(0)).unwrap();
    assert!(zip::ZipArchive::new(&mut stream).is_ok());

    stream.seek(SeekFrom::End(0)).unwrap();
    stream.write_all(b"trailing caller data").unwrap();
    assert!(stream.get_ref().ends_with(b"trailing caller data"));
}

#[test]
fn test_placeholder_sheet_is_suppressed() {
    let mut buffer = Vec::new();
    {
        let mut writer = StreamingWorkbookWriter::new();
        writer.open_buffer(&mut buffer).unwrap();
        writer.add_worksheet("Data").unwrap();
        writer.add_cell((1, 1)).unwrap().string("x").unwrap();
        writer.close().unwrap();
    }

    let workbook = part_content(&buffer, "xl/workbook.xml");
    assert!(workbook.contains("name=\"Data\""));
    assert!(!workbook.contains("name=\"Sheet1\""));
    assert_eq!(workbook.matches("<sheet ").count(), 1);
}

#[test]
fn test_cells_before_first_worksheet_are_discarded() {
    let mut buffer = Vec::new();
    {
        let mut writer = StreamingWorkbookWriter::new();
        writer.open_buffer(&mut buffer).unwrap();
        // Valid target (the internal placeholder), but never written out
        writer.add_cell((1, 1)).unwrap().string("ghost").unwrap();
        writer.add_worksheet("Real").unwrap();
        writer.add_cell((1, 1)).unwrap().string("kept").unwrap();
        writer.close().unwrap();
    }

    let names = part_names(&buffer);
    assert_eq!(
        names
            .iter()
            .filter(|n| n.starts_with("xl/worksheets/sheet"))
            .count(),
        1
    );
    let sheet = part_content(&buffer, "xl/worksheets/sheet1.xml");
    let strings = part_content(&buffer, "xl/sharedStrings.xml");
    assert!(sheet.contains("<v>"));
    assert!(strings.contains("kept"));
}

#[test]
fn test_empty_workbook() {
    let mut buffer = Vec::new();
    {
        let mut writer = StreamingWorkbookWriter::new();
        writer.open_buffer(&mut buffer).unwrap();
        writer.close().unwrap();
    }

    let names = part_names(&buffer);
    assert!(!names.iter().any(|n| n.starts_with("xl/worksheets/")));
    let workbook = part_content(&buffer, "xl/workbook.xml");
    assert!(workbook.contains("<sheets></sheets>"));
}

#[test]
fn test_typed_cells_roundtrip_through_xml() {
    let mut buffer = Vec::new();
    {
        let mut writer = StreamingWorkbookWriter::new();
        writer.open_buffer(&mut buffer).unwrap();
        writer.add_worksheet("Types").unwrap();
        writer.add_cell((1, 1)).unwrap().int(42).unwrap();
        writer.add_cell((1, 2)).unwrap().number(1234.56).unwrap();
        writer.add_cell((1, 3)).unwrap().bool(true).unwrap();
        writer
            .add_cell((2, 1))
            .unwrap()
            .formula("=SUM(A1:B1)")
            .unwrap();
        writer.add_cell((2, 2)).unwrap().string("a & b").unwrap();
        writer.close().unwrap();
    }

    let sheet = part_content(&buffer, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<c r=\"A1\"><v>42</v></c>"));
    assert!(sheet.contains("<c r=\"B1\"><v>1234.56</v></c>"));
    assert!(sheet.contains("<c r=\"C1\" t=\"b\"><v>1</v></c>"));
    assert!(sheet.contains("<c r=\"A2\"><f>SUM(A1:B1)</f></c>"));
    // Two rows, closed in order
    assert!(sheet.contains("</row><row r=\"2\">"));

    let strings = part_content(&buffer, "xl/sharedStrings.xml");
    assert!(strings.contains("a &amp; b"));
}

#[test]
fn test_multiple_sheets_and_registry() {
    let mut buffer = Vec::new();
    {
        let mut writer = StreamingWorkbookWriter::new();
        writer.open_buffer(&mut buffer).unwrap();

        let first = writer.add_worksheet("Alpha").unwrap();
        assert_eq!(first.position(), 1);
        writer.add_cell(first.cell(1, 1)).unwrap().string("a").unwrap();

        let second = writer.add_worksheet("Beta").unwrap();
        assert_eq!(second.position(), 2);
        assert_eq!(second.title(), "Beta");
        writer.add_cell(second.cell(1, 1)).unwrap().string("b").unwrap();

        writer.close().unwrap();
    }

    let workbook = part_content(&buffer, "xl/workbook.xml");
    assert!(workbook.contains("name=\"Alpha\" sheetId=\"1\" r:id=\"rId1\""));
    assert!(workbook.contains("name=\"Beta\" sheetId=\"2\" r:id=\"rId2\""));
    assert!(workbook.contains("activeTab=\"1\""));

    let rels = part_content(&buffer, "xl/_rels/workbook.xml.rels");
    assert!(rels.contains("Target=\"worksheets/sheet1.xml\""));
    assert!(rels.contains("Target=\"worksheets/sheet2.xml\""));
}

#[test]
fn test_duplicate_title_rejected() {
    let mut buffer = Vec::new();
    let mut writer = StreamingWorkbookWriter::new();
    writer.open_buffer(&mut buffer).unwrap();
    writer.add_worksheet("Data").unwrap();

    match writer.add_worksheet("Data") {
        Err(XlsxError::InvalidWorksheetTitle { title, .. }) => assert_eq!(title, "Data"),
        other => panic!("expected InvalidWorksheetTitle, got {:?}", other.map(|_| ())),
    }

    // A failed add_worksheet must not disturb the open stream
    writer.add_cell((1, 1)).unwrap().string("still ok").unwrap();
    writer.close().unwrap();
}

#[test]
fn test_write_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("output.xlsx");
    {
        let mut writer = StreamingWorkbookWriter::new();
        writer.open(&path).unwrap();
        writer.add_worksheet("Data").unwrap();
        writer.add_cell((1, 1)).unwrap().string("on disk").unwrap();
        writer.close().unwrap();
    }

    let data = std::fs::read(&path).unwrap();
    assert!(data.starts_with(b"PK"));
    let sheet = part_content(&data, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("t=\"s\""));
}

#[test]
fn test_open_missing_directory_fails() {
    let mut writer = StreamingWorkbookWriter::new();
    let err = writer.open("/nonexistent-dir/sub/output.xlsx").unwrap_err();
    assert!(matches!(err, XlsxError::DestinationUnavailable(_)));
}

#[test]
fn test_comments_without_worksheet_are_discarded() {
    let mut buffer = Vec::new();
    {
        let mut writer = StreamingWorkbookWriter::new();
        writer.open_buffer(&mut buffer).unwrap();
        // Comment against the placeholder context: swallowed, not archived
        writer.add_comment((1, 1), "orphan note").unwrap();
        writer.close().unwrap();
    }

    let names = part_names(&buffer);
    assert!(!names.iter().any(|n| n.starts_with("xl/comments")));
    assert!(!names.iter().any(|n| n.contains("_rels/sheet")));
}
