//! Integration tests for routing and the conversion pipeline.

mod common;

use std::sync::{Arc, Mutex};

use deepdoc::convert::{ConvertOptions, Converter};
use deepdoc::error::{Error, Result};
use deepdoc::render::to_markdown;
use deepdoc::{
    extract_bytes, extractor_for, DocumentType, Enhancer, Extractor, FileInfo, ImageDescriber,
    VisionAnalysis, VisionProvider,
};

/// Records every URL it is asked about.
#[derive(Default)]
struct UrlRecorder {
    urls: Mutex<Vec<String>>,
}

impl VisionProvider for UrlRecorder {
    fn analyze(&self, _image: &[u8]) -> Result<VisionAnalysis> {
        Ok(VisionAnalysis::default())
    }

    fn analyze_url(&self, url: &str) -> Result<VisionAnalysis> {
        self.urls.lock().unwrap().push(url.to_string());
        Ok(VisionAnalysis {
            caption: Some("a diagram".to_string()),
            ocr_lines: vec!["Step 1".to_string()],
        })
    }
}

struct FailingEnhancer;

impl Enhancer for FailingEnhancer {
    fn enhance(&self, _markdown: &str, _doc_type: DocumentType) -> Result<String> {
        Err(Error::EnhancementUnavailable("model offline".into()))
    }

    fn translate(&self, _text: &str, _language: &str) -> Result<String> {
        Err(Error::EnhancementUnavailable("model offline".into()))
    }
}

#[test]
fn test_router_covers_every_format() {
    for ext in ["pdf", "docx", "csv", "html"] {
        assert!(extractor_for(ext, ImageDescriber::disabled()).is_ok(), "{}", ext);
    }
    for ext in ["txt", "xlsx", "htm", "doc"] {
        assert!(matches!(
            extractor_for(ext, ImageDescriber::disabled()),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}

#[test]
fn test_extract_before_load() {
    let mut extractor = Extractor::new(DocumentType::Docx, ImageDescriber::disabled());
    assert!(!extractor.is_loaded());
    assert!(matches!(extractor.basic_extract(), Err(Error::NoFileConfigured)));
}

#[test]
fn test_csv_pipe_table() {
    let result = Converter::new()
        .convert_bytes("csv", b"header1,header2\nvalue1,value2\n".to_vec(), &ConvertOptions::default())
        .unwrap();
    assert_eq!(
        result.markdown,
        "| header1 | header2 |\n| --- | --- |\n| value1 | value2 |"
    );
    assert!(matches!(
        result.file_info,
        FileInfo::Tabular { row_count: 1, col_count: 2, .. }
    ));
}

#[test]
fn test_empty_csv_fails() {
    let err = Converter::new()
        .convert_bytes("csv", Vec::new(), &ConvertOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::EmptyTable));
}

#[test]
fn test_html_protocol_relative_url_resolved_before_lookup() {
    let provider = Arc::new(UrlRecorder::default());
    let converter = Converter::new().with_describer(ImageDescriber::new(provider.clone()));
    let options = ConvertOptions::new().with_advanced(true);

    let result = converter
        .convert_bytes("html", br#"<p>See</p><img src="//host/a.png">"#.to_vec(), &options)
        .unwrap();

    assert_eq!(*provider.urls.lock().unwrap(), vec!["https://host/a.png".to_string()]);
    assert_eq!(result.markdown, "See\n\n![Image: a diagram - OCR: Step 1]");
}

#[test]
fn test_html_each_node_once() {
    let html = b"<html><body><article><section><h2>Title</h2><p>Para <b>bold</b></p></section></article></body></html>";
    let md = Converter::new()
        .convert_bytes("html", html.to_vec(), &ConvertOptions::default())
        .unwrap()
        .markdown;
    assert_eq!(md, "## Title\n\nPara **bold**");
}

#[test]
fn test_enhancer_failure_keeps_markdown() {
    let converter = Converter::new().with_enhancer(Arc::new(FailingEnhancer));
    let options = ConvertOptions::new().with_advanced(true);
    let result = converter
        .convert_bytes("html", b"<h1>Kept</h1>".to_vec(), &options)
        .unwrap();
    assert_eq!(result.markdown, "# Kept");
    assert!(result.enhancement_fallback.unwrap().contains("model offline"));
}

#[test]
fn test_rendering_is_idempotent() {
    let docx = common::docx(
        &(common::styled_paragraph("Heading1", "Hello, World!") + &common::styled_paragraph("Normal", "Body")),
        &[common::png(60, 60)],
    );
    for (ext, data) in [
        ("docx", docx),
        ("html", b"<h1>A</h1><ol><li>one</li></ol><img src=\"x.png\">".to_vec()),
        ("csv", b"a,b\n1,2\n".to_vec()),
    ] {
        let doc = extract_bytes(ext, data).unwrap();
        assert_eq!(to_markdown(&doc).unwrap(), to_markdown(&doc).unwrap(), "{}", ext);
    }
}

#[test]
fn test_convert_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.html");
    std::fs::write(&path, "<h1>Notes</h1>").unwrap();

    let result = Converter::new()
        .convert_file(&path, &ConvertOptions::default())
        .unwrap();
    assert_eq!(result.markdown, "# Notes");
    assert_eq!(result.file_info.doc_type(), DocumentType::Html);
    assert_eq!(result.file_info.file_size(), 14);
}

#[test]
fn test_response_json() {
    let result = Converter::new()
        .convert_bytes("html", b"<p>two words</p>".to_vec(), &ConvertOptions::default())
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
    assert_eq!(json["file_info"]["type"], "HTML");
    assert_eq!(json["file_info"]["word_count"], 2);
    assert_eq!(json["file_info"]["image_count"], 0);
    assert_eq!(json["isSentEmail"], false);
}
