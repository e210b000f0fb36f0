//! In-process fixture builders shared by the integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// One item of a PDF page's content.
pub enum PdfItem<'a> {
    /// A text line at a font size
    Line(&'a str, i64),
    /// Place image `Im{n}` (1-based)
    Figure(usize),
}

/// How an image XObject stores its pixels.
pub enum PdfImage {
    /// JPEG bytes under `DCTDecode`
    Jpeg(Vec<u8>),
    /// JPEG bytes zlib-compressed under `[FlateDecode DCTDecode]`
    FlateJpeg(Vec<u8>),
    /// Unfiltered 8-bit `DeviceRGB` samples of a mid-gray image
    RawRgb(u32, u32),
}

impl PdfImage {
    fn stream(&self) -> Stream {
        match self {
            PdfImage::Jpeg(jpeg) => jpeg_stream(jpeg, Object::Name(b"DCTDecode".to_vec()), jpeg.clone()),
            PdfImage::FlateJpeg(jpeg) => jpeg_stream(
                jpeg,
                Object::Array(vec![
                    Object::Name(b"FlateDecode".to_vec()),
                    Object::Name(b"DCTDecode".to_vec()),
                ]),
                zlib(jpeg),
            ),
            PdfImage::RawRgb(width, height) => Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => *width as i64,
                    "Height" => *height as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                },
                vec![128u8; (width * height * 3) as usize],
            ),
        }
    }
}

fn jpeg_stream(jpeg: &[u8], filter: Object, content: Vec<u8>) -> Stream {
    let (width, height) = image::load_from_memory(jpeg)
        .map(|img| (img.width() as i64, img.height() as i64))
        .unwrap_or((1, 1));
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => filter,
        },
        content,
    )
}

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Build a single-page PDF. Lines are laid out top to bottom.
pub fn pdf(items: &[PdfItem], images: &[Vec<u8>]) -> Vec<u8> {
    pdf_pages(&[(items, images)])
}

/// Build a single-page PDF whose images use the given encodings.
pub fn pdf_with_images(items: &[PdfItem], images: &[PdfImage]) -> Vec<u8> {
    build(&[(items, images.iter().map(PdfImage::stream).collect())])
}

/// Build a multi-page PDF; each page has its own items and JPEG images.
pub fn pdf_pages(pages: &[(&[PdfItem], &[Vec<u8>])]) -> Vec<u8> {
    let pages: Vec<(&[PdfItem], Vec<Stream>)> = pages
        .iter()
        .map(|(items, images)| {
            let streams = images.iter().map(|j| PdfImage::Jpeg(j.clone()).stream()).collect();
            (*items, streams)
        })
        .collect();
    build(&pages)
}

fn build(pages: &[(&[PdfItem], Vec<Stream>)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for (items, images) in pages {
        let mut xobjects = lopdf::Dictionary::new();
        for (i, stream) in images.iter().enumerate() {
            let image_id = doc.add_object(stream.clone());
            xobjects.set(format!("Im{}", i + 1), image_id);
        }

        let mut operations = Vec::new();
        let mut y = 750;
        for item in items.iter() {
            match item {
                PdfItem::Line(text, size) => {
                    operations.push(Operation::new("BT", vec![]));
                    operations.push(Operation::new("Tf", vec!["F1".into(), (*size).into()]));
                    operations.push(Operation::new("Td", vec![72.into(), y.into()]));
                    operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
                    operations.push(Operation::new("ET", vec![]));
                    y -= size + 12;
                }
                PdfItem::Figure(n) => {
                    operations.push(Operation::new("q", vec![]));
                    operations.push(Operation::new(
                        "cm",
                        vec![100.into(), 0.into(), 0.into(), 100.into(), 72.into(), (y - 100).into()],
                    ));
                    operations.push(Operation::new("Do", vec![Object::Name(format!("Im{}", n).into_bytes())]));
                    operations.push(Operation::new("Q", vec![]));
                    y -= 112;
                }
            }
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
            "XObject" => xobjects,
        });
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// A mid-gray RGB JPEG.
pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let pixels = vec![128u8; (width * height * 3) as usize];
    let mut out = Vec::new();
    JpegEncoder::new(&mut out)
        .encode(&pixels, width, height, ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// A mid-gray grayscale PNG.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let pixels = vec![128u8; (width * height) as usize];
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(&pixels, width, height, ExtendedColorType::L8)
        .unwrap();
    out
}

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Build a DOCX archive around `body` (the inner XML of `w:body`).
///
/// `images` are stored under `word/media/` and listed in the document
/// relationships in order.
pub fn docx(body: &str, images: &[Vec<u8>]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="png" ContentType="image/png"/></Types>"#,
    )
    .unwrap();

    zip.start_file("word/document.xml", options).unwrap();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{}"><w:body>{}</w:body></w:document>"#,
        W_NS, body
    );
    zip.write_all(document.as_bytes()).unwrap();

    zip.start_file("word/styles.xml", options).unwrap();
    let styles = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:styles xmlns:w="{ns}">
            <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>
            <w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/></w:style>
            <w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/></w:style>
            <w:style w:type="paragraph" w:styleId="ListBullet"><w:name w:val="List Bullet"/></w:style>
            <w:style w:type="paragraph" w:styleId="ListNumber2"><w:name w:val="List Number 2"/></w:style>
        </w:styles>"#,
        ns = W_NS
    );
    zip.write_all(styles.as_bytes()).unwrap();

    let mut rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    rels.push_str(r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#);
    for (i, data) in images.iter().enumerate() {
        let name = format!("media/image{}.png", i + 1);
        rels.push_str(&format!(
            r#"<Relationship Id="rIdImg{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="{}"/>"#,
            i + 1,
            name
        ));
        zip.start_file(format!("word/{}", name), options).unwrap();
        zip.write_all(data).unwrap();
    }
    rels.push_str("</Relationships>");
    zip.start_file("word/_rels/document.xml.rels", options).unwrap();
    zip.write_all(rels.as_bytes()).unwrap();

    zip.finish().unwrap().into_inner()
}

/// A `w:p` with a style and plain text.
pub fn styled_paragraph(style: &str, text: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="{}"/></w:pPr><w:r><w:t>{}</w:t></w:r></w:p>"#,
        style, text
    )
}
