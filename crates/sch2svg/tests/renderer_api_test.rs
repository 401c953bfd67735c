//! Integration tests for the SchematicRenderer API
//!
//! Output is checked structurally by parsing it back with the `svg` crate.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    thread,
};

use svg::node::element::tag::Type;
use svg::parser::Event;

use sch2svg::{
    CancelToken, ErrorCode, FileFormatError, Recovery, RenderError, SchematicRenderer,
    config::{AppConfig, RenderConfig, StyleConfig},
    font::{Glyph, GlyphSource},
    source::{Document, DocumentSource, MemorySource, SourceError},
};

const CACHE: &str = "EESchema-LIBRARY Version 2.3
#encoding utf-8
#
# R
#
DEF R R 0 0 N Y 1 F N
F0 \"R\" 80 0 50 V V C CNN
F1 \"R\" 0 0 50 V V C CNN
DRAW
S -40 -100 40 100 0 1 10 N
X ~ 1 0 150 50 D 50 50 1 1 P
X ~ 2 0 -150 50 U 50 50 1 1 P
ENDDRAW
ENDDEF
#
# 74LS00
#
DEF 74LS00 U 0 30 Y Y 4 L N
F0 \"U\" 0 50 50 H V C CNN
F1 \"74LS00\" 0 -50 50 H V C CNN
DRAW
S -150 -100 150 100 0 1 10 f
X A 1 -300 50 150 R 50 50 1 1 I
X A 4 -300 50 150 R 50 50 2 1 I
ENDDRAW
ENDDEF
#
#End Library
";

const SCHEMATIC: &str = r#"EESchema Schematic File Version 2
LIBS:demo-cache
EELAYER 25 0
EELAYER END
$Descr A4 11693 8268
encoding utf-8
Sheet 1 1
Title "Demo"
Date ""
Rev ""
$EndDescr
$Comp
L R R1
U 1 1 5A1B2C3D
P 5000 3500
F 0 "R1" H 5080 3500 50  0000 L CNN
F 1 "10k" V 5000 3500 50  0000 C CNN
	1    5000 3500
	1    0    0    -1
$EndComp
$Comp
L 74LS00 U1
U 2 1 5A1B2C3E
P 7000 3500
F 0 "U1" H 7000 3550 50  0000 C CNN
F 1 "74LS00" H 7000 3450 50  0000 C CNN
	2    7000 3500
	1    0    0    -1
$EndComp
Wire Wire Line
	5000 3650 5000 4000
Connection ~ 5000 4000
$EndSCHEMATC
"#;

fn renderer(config: AppConfig) -> SchematicRenderer {
    SchematicRenderer::new(config).expect("Failed to build renderer")
}

fn demo_source() -> MemorySource {
    MemorySource::new()
        .with_document("demo.sch", SCHEMATIC)
        .with_library("demo-cache", CACHE)
}

/// Tag names of every start or empty tag, in document order.
fn tags(svg: &str) -> Vec<String> {
    svg::read(svg)
        .expect("Failed to parse SVG")
        .filter_map(|event| match event {
            Event::Tag(name, Type::Start | Type::Empty, _) => Some(name.to_string()),
            _ => None,
        })
        .collect()
}

fn root_attributes(svg: &str) -> HashMap<String, String> {
    svg::read(svg)
        .expect("Failed to parse SVG")
        .find_map(|event| match event {
            Event::Tag("svg", Type::Start | Type::Empty, attributes) => Some(
                attributes
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_string()))
                    .collect(),
            ),
            _ => None,
        })
        .expect("SVG has no root element")
}

#[test]
fn test_renderer_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SchematicRenderer>();
    assert_send_sync::<CancelToken>();
}

#[test]
fn test_empty_document_is_a_bare_root() {
    let source = MemorySource::new().with_document("empty.sch", "EESchema Schematic File Version 2\n$EndSCHEMATC\n");
    let svg = renderer(AppConfig::default())
        .render_to_string(&source, "empty.sch", &CancelToken::new())
        .expect("Failed to render");

    assert_eq!(tags(&svg), ["svg"]);
    let root = root_attributes(&svg);
    assert_eq!(root["xmlns"], "http://www.w3.org/2000/svg");
    assert_eq!(root["stroke-width"], "6");
    assert_eq!(root["fill"], "none");
}

#[test]
fn test_version_mismatch_writes_nothing() {
    let source = MemorySource::new().with_document("old.sch", "EESchema Schematic File Version 1\n$EndSCHEMATC\n");
    let mut out = Vec::new();
    let result = renderer(AppConfig::default()).render(&source, "old.sch", &mut out, &CancelToken::new());

    match result {
        Err(RenderError::Format(err)) => {
            assert_eq!(err.code(), ErrorCode::E104);
            assert!(err.message().contains("version 1"), "message: {}", err.message());
        }
        other => panic!("expected a format error, got {other:?}"),
    }
    assert!(out.is_empty());
}

#[test]
fn test_full_render() {
    let mut out = Vec::new();
    let summary = renderer(AppConfig::default())
        .render(&demo_source(), "demo.sch", &mut out, &CancelToken::new())
        .expect("Failed to render");
    let svg = String::from_utf8(out).unwrap();

    assert_eq!(summary.source_id(), "demo.sch");
    assert_eq!(summary.placements(), 2);
    assert_eq!(summary.symbols_drawn(), 2);
    assert!(summary.unresolved().is_empty());
    assert!(summary.recovered().is_none());

    let root = root_attributes(&svg);
    assert_eq!(root["width"], "297.002mm");
    assert_eq!(root["viewBox"], "0 0 11693 8268");

    let tags = tags(&svg);
    assert_eq!(tags[1], "title");
    assert!(tags.iter().filter(|tag| *tag == "rect").count() >= 2, "tags: {tags:?}");
    assert!(tags.contains(&"circle".to_string()));
    assert!(svg.ends_with("</svg>"));
}

#[test]
fn test_css_classes_are_opt_in() {
    let plain = renderer(AppConfig::default())
        .render_to_string(&demo_source(), "demo.sch", &CancelToken::new())
        .unwrap();
    assert!(!plain.contains("class="));

    let mut config = AppConfig::default();
    *config.render_mut() = RenderConfig::default().with_css_classes(true);
    let classed = renderer(config)
        .render_to_string(&demo_source(), "demo.sch", &CancelToken::new())
        .unwrap();
    assert!(classed.contains(r#"class="component""#));
    assert!(classed.contains(r#"class="wire""#));
}

#[test]
fn test_bus_line_carries_only_class_width_and_coordinates() {
    let source = MemorySource::new().with_document(
        "bus.sch",
        "EESchema Schematic File Version 2\nWire Bus Line\n\t1 2 3 4\n$EndSCHEMATC\n",
    );
    let mut config = AppConfig::default();
    *config.render_mut() = RenderConfig::default().with_css_classes(true);
    let svg = renderer(config)
        .render_to_string(&source, "bus.sch", &CancelToken::new())
        .expect("Failed to render");

    assert!(
        svg.contains(r#"<line class="bus" stroke-width="12" x1="1" y1="2" x2="3" y2="4"/>"#),
        "svg: {svg}"
    );
    assert_eq!(tags(&svg), ["svg", "g", "line"]);
}

#[test]
fn test_style_colors_override_palette() {
    let config = AppConfig::new(RenderConfig::default(), StyleConfig::default().with_color("wire", "red"));
    let svg = renderer(config)
        .render_to_string(&demo_source(), "demo.sch", &CancelToken::new())
        .unwrap();
    assert!(svg.contains(r##"stroke="#ff0000""##));
}

#[test]
fn test_invalid_style_is_a_config_error() {
    let config = AppConfig::new(RenderConfig::default(), StyleConfig::default().with_color("cable", "red"));
    assert!(matches!(SchematicRenderer::new(config), Err(RenderError::Config(_))));
}

/// Remembers every character it is asked for.
struct RecordingGlyphs {
    bar: Glyph,
    seen: Mutex<String>,
}

impl GlyphSource for RecordingGlyphs {
    fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.seen.lock().unwrap().push(ch);
        Some(&self.bar)
    }

    fn fallback(&self) -> &Glyph {
        &self.bar
    }

    fn cap_height(&self) -> f64 {
        6.0
    }
}

#[test]
fn test_multi_unit_reference_gets_unit_letter() {
    let glyphs = Arc::new(RecordingGlyphs {
        bar: Glyph::new(2.0, vec![vec![(0.0, 0.0), (0.0, 6.0)]]),
        seen: Mutex::new(String::new()),
    });
    let renderer = renderer(AppConfig::default()).with_glyphs(glyphs.clone());
    renderer
        .render_to_string(&demo_source(), "demo.sch", &CancelToken::new())
        .expect("Failed to render");

    let seen = glyphs.seen.lock().unwrap();
    assert!(seen.contains("U1B"), "drawn text: {seen:?}");
    assert!(seen.contains("R1"));
    assert!(!seen.contains("R1A"));
}

#[test]
fn test_unresolved_symbols_still_get_fields() {
    let schematic = SCHEMATIC.replace("L R R1", "L MISSING R1");
    let source = MemorySource::new()
        .with_document("demo.sch", schematic)
        .with_library("demo-cache", CACHE);

    let mut out = Vec::new();
    let summary = renderer(AppConfig::default())
        .render(&source, "demo.sch", &mut out, &CancelToken::new())
        .expect("Failed to render");

    assert_eq!(summary.unresolved(), ["MISSING"]);
    assert_eq!(summary.symbols_drawn(), 1);
    let svg = String::from_utf8(out).unwrap();
    // Four fields, all drawn as stroked paths.
    assert!(tags(&svg).iter().filter(|tag| *tag == "path").count() >= 4);
}

#[test]
fn test_missing_cache_library_draws_fields_only() {
    let schematic = SCHEMATIC.replace("LIBS:demo-cache\n", "");
    let source = MemorySource::new().with_document("demo.sch", schematic);

    let summary = renderer(AppConfig::default())
        .render(&source, "demo.sch", Vec::new(), &CancelToken::new())
        .expect("Failed to render");
    assert_eq!(summary.symbols_drawn(), 0);
    assert_eq!(summary.unresolved().len(), 2);
}

#[test]
fn test_unavailable_library_is_a_source_error() {
    let source = MemorySource::new().with_document("demo.sch", SCHEMATIC);
    let result = renderer(AppConfig::default()).render_to_string(&source, "demo.sch", &CancelToken::new());
    match result {
        Err(RenderError::Source { id, .. }) => assert_eq!(id, "demo-cache"),
        other => panic!("expected a source error, got {other:?}"),
    }
}

const POLARIZED: &str = "EESchema-LIBRARY Version 2.3
DEF CP C 0 10 N Y 1 F N
DRAW
A 0 -150 128 1287 513 0 1 20 N -80 -50 80 -50
ENDDRAW
ENDDEF
";

#[test]
fn test_descending_library_arc_is_drawn_minor() {
    let schematic = "EESchema Schematic File Version 2
LIBS:parts-cache
$Comp
L CP C1
U 1 1 5A1B2C3F
P 1000 1000
	1    1000 1000
	1    0    0    -1
$EndComp
$EndSCHEMATC
";
    let source = MemorySource::new()
        .with_document("cap.sch", schematic)
        .with_library("parts-cache", POLARIZED);
    let svg = renderer(AppConfig::default())
        .render_to_string(&source, "cap.sch", &CancelToken::new())
        .expect("Failed to render");

    assert!(svg.contains(r#"d="M920,1050 A128 128 0 0 1 1080,1050""#), "svg: {svg}");
}

#[test]
fn test_out_of_range_coordinate_is_a_format_error() {
    let source = MemorySource::new().with_document(
        "huge.sch",
        "EESchema Schematic File Version 2\nNoConn ~ 2147483647 0\n$EndSCHEMATC\n",
    );
    let result = renderer(AppConfig::default()).render_to_string(&source, "huge.sch", &CancelToken::new());
    let err = match result {
        Err(RenderError::Format(err)) => err,
        other => panic!("expected a format error, got {other:?}"),
    };
    assert_eq!(err.code(), ErrorCode::E103);
    assert_eq!((err.line(), err.column()), (2, 10));
}

const BROKEN: &str = "EESchema Schematic File Version 2
Connection ~ 100 100
Wire Wire Line
	0 0 100 $EndSCHEMATC
";

#[test]
fn test_format_error_aborts_by_default() {
    let source = MemorySource::new().with_document("broken.sch", BROKEN);
    let result = renderer(AppConfig::default()).render_to_string(&source, "broken.sch", &CancelToken::new());
    let err = match result {
        Err(RenderError::Format(err)) => err,
        other => panic!("expected a format error, got {other:?}"),
    };
    assert_eq!(err.source_id(), "broken.sch");
    assert_eq!(err.line(), 4);
}

#[test]
fn test_annotated_recovery_closes_the_document() {
    let source = MemorySource::new().with_document("broken.sch", BROKEN);
    let mut config = AppConfig::default();
    *config.render_mut() = RenderConfig::default().with_annotate_errors(true);

    let mut out = Vec::new();
    let summary = renderer(config)
        .render(&source, "broken.sch", &mut out, &CancelToken::new())
        .expect("annotated render should succeed");
    let svg = String::from_utf8(out).unwrap();

    let recovered = summary.recovered().expect("error should be reported");
    assert_eq!(recovered.line(), 4);
    assert!(svg.contains("<!-- sch2svg: broken.sch:4:"), "svg: {svg}");
    assert!(svg.ends_with("</svg>"));
    assert_eq!(tags(&svg), ["svg", "circle"]);
}

#[test]
fn test_custom_recovery_policy() {
    let source = MemorySource::new().with_document("broken.sch", BROKEN);
    let renderer = renderer(AppConfig::default()).with_recovery_policy(|err: &FileFormatError, _emitted: bool| {
        if err.line() > 1 { Recovery::Annotate } else { Recovery::Abort }
    });

    let summary = renderer
        .render(&source, "broken.sch", Vec::new(), &CancelToken::new())
        .expect("annotated render should succeed");
    assert!(summary.recovered().is_some());
}

#[test]
fn test_cancelled_before_start() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let result = renderer(AppConfig::default()).render_to_string(&demo_source(), "demo.sch", &cancel);
    assert!(matches!(result, Err(RenderError::Cancelled)));
}

/// Cancels the render while the library is being opened.
struct CancelOnLibrary(MemorySource);

impl DocumentSource for CancelOnLibrary {
    fn open_document(&self, id: &str, cancel: &CancelToken) -> Result<Document, SourceError> {
        self.0.open_document(id, cancel)
    }

    fn open_library(&self, name: &str, cancel: &CancelToken) -> Result<Document, SourceError> {
        let library = self.0.open_library(name, cancel);
        cancel.cancel();
        library
    }
}

#[test]
fn test_cancelled_during_library_pass() {
    let source = CancelOnLibrary(demo_source());
    let result = renderer(AppConfig::default()).render_to_string(&source, "demo.sch", &CancelToken::new());
    assert!(matches!(result, Err(RenderError::Cancelled)));
}

#[test]
fn test_concurrent_renders_share_one_renderer() {
    let renderer = renderer(AppConfig::default());
    let source = demo_source();
    let expected = renderer
        .render_to_string(&source, "demo.sch", &CancelToken::new())
        .unwrap();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| renderer.render_to_string(&source, "demo.sch", &CancelToken::new())))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), expected);
        }
    });
}
