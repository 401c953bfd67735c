//! Grammar tests for the schematic reader.
//!
//! Besides the happy paths these cover truncation: cutting a valid document
//! at any token boundary, or replacing any keyword with a wrong one, must
//! fail with an error that names what was expected.

use sch2svg_core::geometry::{Point, Transform};

use crate::{
    FileFormatError,
    error::ErrorCode,
    records::{HJustify, LabelShape, Record, SheetSide, TextKind, TextOrientation, VJustify, WireKind},
    schematic::{SchematicReader, parse_connection, parse_wire},
    tokenizer::Tokenizer,
};

const HEADER: &str = "EESchema Schematic File Version 2\n";

const FULL: &str = r#"EESchema Schematic File Version 2
LIBS:power
LIBS:device,demo-cache
EELAYER 25 0
EELAYER END
$Descr A4 11693 8268
encoding utf-8
Sheet 1 1
Title "Demo \"board\""
Date ""
Rev "1"
$EndDescr
$Comp
L R R1
U 1 1 5A1B2C3D
P 5000 3500
AR Path="/5A1B2C3D" Ref="R1"  Part="1"
F 0 "R1" H 5070 3546 50  0000 L CNN
F 1 "10k" V 4930 3500 50  0001 C BIB
F 4 "1%" H 5000 3500 50  0001 C CNN "Tolerance"
	1    5000 3500
	0    1    1    0
$EndComp
Wire Wire Line
	5000 3350 5000 3200
Wire Bus Line
	4000 3000 4000 2000
Entry Wire Line
	4000 2500 4100 2600
Connection ~ 5000 3200
NoConn ~ 6000 3000
Text Label 5100 3200 0    60   ~ 0
VCC
Text GLabel 4000 3000 2    60   Input Italic 12
IN
Text Notes 4000 2000 1    60   ~ 0
first\nsecond
$Bitmap
Pos 100 100
Data
89 50 4E 47
EndData
$EndBitmap
$Sheet
S 7000 2000 1000 1500
U 5A1B2C3E
F0 "Sub" 60
F1 "sub.sch" 50
F2 "IN" I L 7000 2200 60
$EndSheet
Kmarq B 100 100 "Warning" F=1
$EndSCHEMATC
"#;

fn read_records(src: &str) -> Result<Vec<Record>, FileFormatError> {
    let mut reader = SchematicReader::new(src, "test.sch")?;
    let mut records = Vec::new();
    while let Some(record) = reader.next_record()? {
        records.push(record);
    }
    Ok(records)
}

fn read_error(src: &str) -> FileFormatError {
    match read_records(src) {
        Ok(records) => panic!("expected an error, read {records:?}"),
        Err(err) => err,
    }
}

fn with_header(body: &str) -> String {
    format!("{HEADER}{body}")
}

#[test]
fn test_empty_document() {
    let records = read_records("EESchema Schematic File Version 2\n$EndSCHEMATC\n").unwrap();
    assert!(records.is_empty());
}

#[test]
fn test_rejects_other_versions() {
    let err = read_error("EESchema Schematic File Version 1\n$EndSCHEMATC\n");
    assert_eq!(err.code(), ErrorCode::E104);
    assert!(err.message().contains("version 1"), "message: {}", err.message());
    assert_eq!(err.position().column(), 33);
}

#[test]
fn test_header_tolerates_trailing_date() {
    let records = read_records("EESchema Schematic File Version 2  date 20/04/2012 15:51:09\n$EndSCHEMATC\n").unwrap();
    assert!(records.is_empty());
}

#[test]
fn test_full_document() {
    let records = read_records(FULL).unwrap();
    assert_eq!(records.len(), 13, "records: {records:#?}");

    assert_eq!(records[0], Record::Libraries(vec!["power".to_string()]));
    assert_eq!(
        records[1],
        Record::Libraries(vec!["device".to_string(), "demo-cache".to_string()])
    );

    let Record::Page(page) = &records[2] else {
        panic!("expected a page description, got {:?}", records[2]);
    };
    assert_eq!((page.paper.as_str(), page.width, page.height), ("A4", 11693, 8268));
    assert_eq!(page.title, "Demo \\\"board\\\"");

    let Record::Placement(placement) = &records[3] else {
        panic!("expected a placement, got {:?}", records[3]);
    };
    assert_eq!(placement.symbol, "R");
    assert_eq!(placement.reference, "R1");
    assert_eq!((placement.unit, placement.convert), (1, 1));
    assert_eq!(placement.timestamp, Some(0x5A1B_2C3D));
    assert_eq!(placement.position, Point::new(5000, 3500));
    assert_eq!(placement.transform, Transform::new(0, 1, 1, 0));
    assert_eq!(placement.fields.len(), 3);

    let reference = &placement.fields[0];
    assert_eq!(reference.text, "R1");
    assert!(!reference.hidden);
    assert_eq!(reference.h_justify, HJustify::Left);
    assert_eq!(reference.v_justify, VJustify::Center);

    let value = &placement.fields[1];
    assert!(value.hidden);
    assert_eq!(value.orientation, TextOrientation::Vertical);
    assert_eq!(value.v_justify, VJustify::Bottom);
    assert!(value.italic);
    assert!(value.bold);

    assert_eq!(placement.fields[2].name.as_deref(), Some("Tolerance"));

    assert!(matches!(&records[4], Record::Wire(wire) if wire.kind == WireKind::Wire));
    assert!(matches!(&records[5], Record::Wire(wire) if wire.kind == WireKind::Bus));
    assert!(matches!(&records[6], Record::BusEntry(entry) if !entry.bus));
    assert_eq!(records[7], Record::Connection(Point::new(5000, 3200)));
    assert_eq!(records[8], Record::NoConnection(Point::new(6000, 3000)));

    let Record::Text(global) = &records[10] else {
        panic!("expected text, got {:?}", records[10]);
    };
    assert_eq!(global.kind, TextKind::GlobalLabel);
    assert_eq!(global.orientation, 2);
    assert_eq!(global.shape, LabelShape::Input);
    assert!(global.italic);
    assert_eq!(global.thickness, 12);
    assert_eq!(global.text, "IN");

    let Record::Sheet(sheet) = &records[12] else {
        panic!("expected a sheet, got {:?}", records[12]);
    };
    assert_eq!((sheet.width, sheet.height), (1000, 1500));
    assert_eq!(sheet.name.as_ref().map(|name| name.text.as_str()), Some("Sub"));
    assert_eq!(sheet.file.as_ref().map(|file| file.size), Some(50));
    assert_eq!(sheet.pins.len(), 1);
    assert_eq!(sheet.pins[0].side, SheetSide::Left);
    assert_eq!(sheet.pins[0].shape, LabelShape::Input);
}

#[test]
fn test_notes_split_on_literal_newline() {
    let records = read_records(FULL).unwrap();
    let notes = records
        .iter()
        .find_map(|record| match record {
            Record::Text(text) if text.kind == TextKind::Notes => Some(text),
            _ => None,
        })
        .unwrap();
    assert_eq!(notes.text, "first\nsecond");
    assert_eq!(notes.orientation, 1);
}

#[test]
fn test_bus_wire_record() {
    let mut tokens = Tokenizer::new("Bus Line\n1 2 3 4\n", "test.sch");
    let wire = parse_wire(&mut tokens).unwrap();
    assert_eq!(wire.kind, WireKind::Bus);
    assert_eq!((wire.start, wire.end), (Point::new(1, 2), Point::new(3, 4)));
}

#[test]
fn test_connection_record() {
    let mut tokens = Tokenizer::new("~ 100 200\n", "test.sch");
    assert_eq!(parse_connection(&mut tokens).unwrap(), Point::new(100, 200));
}

#[test]
fn test_wrong_literal_names_expected_token() {
    let err = read_error(&with_header("Wire Wire Lne\n1 2 3 4\n$EndSCHEMATC\n"));
    assert_eq!(err.code(), ErrorCode::E100);
    assert_eq!(err.message(), "expected `Line`, found `Lne`");
    assert_eq!((err.line(), err.column()), (2, 11));

    let err = read_error(&with_header("Wire Cable Line\n"));
    assert_eq!(err.code(), ErrorCode::E103);
    assert_eq!(err.message(), "expected `Wire`, `Bus` or `Notes`, found `Cable`");

    let err = read_error(&with_header("Connection ~ 100 x\n"));
    assert_eq!(err.code(), ErrorCode::E102);
    assert_eq!(err.message(), "expected integer, found `x`");
}

#[test]
fn test_unknown_record_keyword() {
    let err = read_error(&with_header("Polygon 1 2\n"));
    assert_eq!(err.code(), ErrorCode::E100);
    assert!(err.message().starts_with("expected a record keyword"));
}

#[test]
fn test_missing_end_marker() {
    let err = read_error(&with_header("Connection ~ 1 2\n"));
    assert_eq!(err.code(), ErrorCode::E101);
    assert!(err.message().contains("`$EndSCHEMATC`"));
}

#[test]
fn test_text_orientation_out_of_range() {
    let err = read_error(&with_header("Text Label 1 2 4 60 ~ 0\nx\n$EndSCHEMATC\n"));
    assert_eq!(err.code(), ErrorCode::E103);
    assert_eq!(err.message(), "expected orientation 0 to 3, found `4`");
}

#[test]
fn test_component_without_matrix_is_incomplete() {
    let err = read_error(&with_header("$Comp\nL R R1\nU 1 1 0\nP 10 20\n\t1 10 20\n$EndComp\n$EndSCHEMATC\n"));
    assert_eq!(err.code(), ErrorCode::E200);
    assert_eq!(err.message(), "incomplete component: missing the orientation matrix");
    assert_eq!(err.line(), 7);
}

#[test]
fn test_component_without_symbol_is_incomplete() {
    let err = read_error(&with_header("$Comp\nP 10 20\n\t1 0 0 -1\n$EndComp\n$EndSCHEMATC\n"));
    assert_eq!(err.code(), ErrorCode::E200);
    assert!(err.message().contains("`L` line"));
}

#[test]
fn test_component_matrix_entries_are_unit() {
    let err = read_error(&with_header("$Comp\nL R R1\nP 10 20\n\t2 0 0 -1\n$EndComp\n$EndSCHEMATC\n"));
    assert_eq!(err.code(), ErrorCode::E103);
    assert_eq!(err.message(), "orientation matrix entries must be -1, 0 or 1");
    assert_eq!(err.line(), 5);
}

#[test]
fn test_coordinates_are_bounded() {
    let err = read_error(&with_header("NoConn ~ 2147483647 0\n$EndSCHEMATC\n"));
    assert_eq!(err.code(), ErrorCode::E103);
    assert_eq!((err.line(), err.column()), (2, 10));
    assert!(err.message().contains("out of range"), "{err}");

    let records = read_records(&with_header("NoConn ~ -10000000 10000000\n$EndSCHEMATC\n")).unwrap();
    assert_eq!(records, [Record::NoConnection(Point::new(-10_000_000, 10_000_000))]);
}

#[test]
fn test_component_number_line_length() {
    let err = read_error(&with_header("$Comp\nL R R1\nP 10 20\n\t1 0 0 -1 5\n$EndComp\n$EndSCHEMATC\n"));
    assert_eq!(err.code(), ErrorCode::E103);
    assert_eq!(err.message(), "expected a line of 3 or 4 numbers, found 5 numbers");
}

#[test]
fn test_field_style_is_validated() {
    let err = read_error(&with_header(
        "$Comp\nL R R1\nP 10 20\nF 0 \"R1\" H 10 20 50 0000 L CXN\n\t1 0 0 -1\n$EndComp\n$EndSCHEMATC\n",
    ));
    assert_eq!(err.code(), ErrorCode::E103);
    assert_eq!(err.message(), "expected a text style such as `CNN`, found `CXN`");
}

#[test]
fn test_field_text_decodes_escapes() {
    let records = read_records(&with_header(
        "$Comp\nL R R1\nP 10 20\nF 1 \"10\\u03a9\" H 10 20 50 0000 C CNN\n\t1 0 0 -1\n$EndComp\n$EndSCHEMATC\n",
    ))
    .unwrap();
    let Record::Placement(placement) = &records[0] else {
        panic!("expected a placement");
    };
    assert_eq!(placement.fields[0].text, "10Ω");
}

#[test]
fn test_sheet_fields_must_be_in_order() {
    let err = read_error(&with_header("$Sheet\nS 0 0 100 100\nF1 \"a.sch\" 50\n$EndSheet\n$EndSCHEMATC\n"));
    assert_eq!(err.code(), ErrorCode::E201);
    assert_eq!(err.message(), "expected field `F0`, found `F1`");
}

#[test]
fn test_sheet_without_frame_is_incomplete() {
    let err = read_error(&with_header("$Sheet\nF0 \"x\" 50\n$EndSheet\n$EndSCHEMATC\n"));
    assert_eq!(err.code(), ErrorCode::E200);
}

#[test]
fn test_unterminated_field_text() {
    let err = read_error(&with_header("$Comp\nL R R1\nF 0 \"R1 H 10 20 50 0000 L CNN\n"));
    assert_eq!(err.code(), ErrorCode::E001);
    assert_eq!((err.line(), err.column()), (4, 5));
}

/// Byte offsets just past every token of `src`, excluding the end.
pub(crate) fn token_boundaries(src: &str) -> Vec<usize> {
    let mut cuts = Vec::new();
    let mut in_quotes = false;
    let mut previous: Option<char> = None;
    for (index, ch) in src.char_indices() {
        if ch == '"' && previous != Some('\\') {
            in_quotes = !in_quotes;
        }
        let boundary = !in_quotes && ch.is_whitespace() && previous.is_some_and(|p| !p.is_whitespace());
        if boundary {
            cuts.push(index);
        }
        if ch == '\n' {
            cuts.push(index + 1);
            in_quotes = false;
        }
        previous = Some(ch);
    }
    cuts.retain(|&cut| cut < src.trim_end().len());
    cuts.dedup();
    cuts
}

#[test]
fn test_every_truncation_names_what_was_expected() {
    for cut in token_boundaries(FULL) {
        let truncated = &FULL[..cut];
        let err = match read_records(truncated) {
            Ok(_) => panic!("document truncated at byte {cut} parsed successfully:\n{truncated}"),
            Err(err) => err,
        };
        assert!(
            err.message().contains("expected"),
            "truncated at byte {cut}: {err}"
        );
        assert!(
            matches!(err.code(), ErrorCode::E101 | ErrorCode::E100 | ErrorCode::E102 | ErrorCode::E103),
            "truncated at byte {cut}: unexpected code {} for {err}",
            err.code()
        );
    }
}

/// Byte ranges of every whitespace-separated atom in `src`.
fn atom_spans(src: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (index, ch) in src.char_indices() {
        match (ch.is_whitespace(), start) {
            (false, None) => start = Some(index),
            (true, Some(from)) => {
                spans.push((from, index));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(from) = start {
        spans.push((from, src.len()));
    }
    spans
}

/// Copies of `src` with one atom from `keywords` at a time replaced by
/// `Bogus`, each paired with the byte offset of the replacement.
pub(crate) fn keyword_substitutions(src: &str, keywords: &[&str]) -> Vec<(usize, String)> {
    atom_spans(src)
        .into_iter()
        .filter(|&(start, end)| keywords.contains(&&src[start..end]))
        .map(|(start, end)| (start, format!("{}Bogus{}", &src[..start], &src[end..])))
        .collect()
}

const SCHEMATIC_KEYWORDS: &[&str] = &[
    "$Descr", "$EndDescr", "$Comp", "L", "U", "P", "F", "H", "V", "CNN", "BIB", "$EndComp", "Wire", "Bus", "Line",
    "Entry", "Connection", "NoConn", "~", "Text", "Label", "GLabel", "Notes", "Input", "Italic", "$Bitmap",
    "$EndBitmap", "$Sheet", "S", "F0", "F1", "F2", "I", "$EndSheet", "$EndSCHEMATC",
];

#[test]
fn test_every_wrong_keyword_names_what_was_expected() {
    let substitutions = keyword_substitutions(FULL, SCHEMATIC_KEYWORDS);
    assert!(substitutions.len() > 40, "only {} keywords found", substitutions.len());

    for (offset, document) in substitutions {
        let err = match read_records(&document) {
            Ok(_) => panic!("keyword at byte {offset} replaced, yet the document parsed:\n{document}"),
            Err(err) => err,
        };
        assert!(err.message().contains("expected"), "keyword at byte {offset}: {err}");
        assert!(
            matches!(err.code(), ErrorCode::E100 | ErrorCode::E101 | ErrorCode::E103),
            "keyword at byte {offset}: unexpected code {} for {err}",
            err.code()
        );
    }
}
