use std::borrow::Cow;
use std::io::{Cursor, Read, Write};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::DocumentError;

// @module: DOCX paragraph reading and feedback document writing

const DOCUMENT_PART: &str = "word/document.xml";

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="480" w:after="0"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="28"/></w:rPr></w:style></w:styles>"#;

/// Extract the text of every body-level paragraph, in document order
///
/// Only `w:body/w:p` counts: paragraphs nested in tables, text boxes or
/// content controls are skipped. Run text comes from `w:t`, with `w:tab`
/// as a tab and `w:br`/`w:cr` as a newline.
pub fn paragraphs(bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)?
        .read_to_string(&mut xml)
        .map_err(|e| DocumentError::MalformedDocx(format!("{}: {}", DOCUMENT_PART, e)))?;

    parse_document_xml(&xml)
}

fn parse_document_xml(xml: &str) -> Result<Vec<String>, DocumentError> {
    let mut reader = Reader::from_str(xml);

    // Local names of the currently open elements
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                path.push(e.local_name().as_ref().to_vec());
                if is_body_paragraph(&path) {
                    current = Some(String::new());
                }
            }
            Event::Empty(e) => {
                if is_body_paragraph_child(&path, &e) {
                    paragraphs.push(String::new());
                } else if let Some(text) = current.as_mut() {
                    if is_paragraph_run(&path) {
                        match e.local_name().as_ref() {
                            b"tab" => text.push('\t'),
                            b"cr" => text.push('\n'),
                            b"br" if is_text_wrapping_break(&e) => text.push('\n'),
                            _ => {}
                        }
                    }
                }
            }
            Event::Text(t) => {
                if let Some(text) = current.as_mut() {
                    if is_run_text(&path) {
                        text.push_str(&t.unescape()?);
                    }
                }
            }
            Event::End(_) => {
                if is_body_paragraph(&path) {
                    if let Some(text) = current.take() {
                        paragraphs.push(text);
                    }
                }
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !path.is_empty() {
        return Err(DocumentError::MalformedDocx(format!(
            "{} ends inside <{}>",
            DOCUMENT_PART,
            String::from_utf8_lossy(&path[path.len() - 1])
        )));
    }

    Ok(paragraphs)
}

fn is_body_paragraph(path: &[Vec<u8>]) -> bool {
    path.len() == 3 && path[0] == b"document" && path[1] == b"body" && path[2] == b"p"
}

// A self-closing <w:p/> directly under the body
fn is_body_paragraph_child(parent: &[Vec<u8>], element: &BytesStart) -> bool {
    parent.len() == 2
        && parent[0] == b"document"
        && parent[1] == b"body"
        && element.local_name().as_ref() == b"p"
}

// A run directly in a body paragraph, or in one of its hyperlinks
fn is_paragraph_run(path: &[Vec<u8>]) -> bool {
    match path.len() {
        4 => is_body_paragraph(&path[..3]) && path[3] == b"r",
        5 => is_body_paragraph(&path[..3]) && path[3] == b"hyperlink" && path[4] == b"r",
        _ => false,
    }
}

fn is_run_text(path: &[Vec<u8>]) -> bool {
    match path.split_last() {
        Some((last, parent)) => last == b"t" && is_paragraph_run(parent),
        None => false,
    }
}

// Page and column breaks carry no text
fn is_text_wrapping_break(element: &BytesStart) -> bool {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"type")
        .is_none_or(|attr| attr.value.as_ref() == b"textWrapping")
}

/// Build a DOCX holding a level-1 heading followed by one paragraph of feedback
///
/// Newlines in the feedback become line breaks and tabs become tab runs, so
/// reading the document back returns the same paragraph text. CRLF and lone CR
/// are written as LF. Characters that XML 1.0 forbids are rejected.
pub fn feedback_document(heading: &str, feedback: &str) -> Result<Vec<u8>, DocumentError> {
    let document_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{ns}"><w:body><w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr>{heading}</w:p><w:p>{body}</w:p><w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#,
        ns = WORDML_NS,
        heading = run_xml(heading)?,
        body = run_xml(feedback)?,
    );

    let parts: [(&str, Cow<'_, str>); 5] = [
        ("[Content_Types].xml", Cow::Borrowed(CONTENT_TYPES_XML)),
        ("_rels/.rels", Cow::Borrowed(PACKAGE_RELS_XML)),
        (DOCUMENT_PART, Cow::Owned(document_xml)),
        ("word/_rels/document.xml.rels", Cow::Borrowed(DOCUMENT_RELS_XML)),
        ("word/styles.xml", Cow::Borrowed(STYLES_XML)),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts.iter() {
        zip.start_file(*name, part_options()).map_err(write_error)?;
        zip.write_all(content.as_bytes())
            .map_err(|e| DocumentError::Write(format!("{}: {}", name, e)))?;
    }

    Ok(zip.finish().map_err(write_error)?.into_inner())
}

fn write_error(error: ZipError) -> DocumentError {
    DocumentError::Write(error.to_string())
}

fn part_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

// One run carrying the text, with w:br and w:tab standing in for '\n' and '\t'
fn run_xml(text: &str) -> Result<String, DocumentError> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut xml = String::from("<w:r>");
    let mut segment = String::new();

    for c in normalized.chars() {
        match c {
            '\n' | '\t' => {
                push_text(&mut xml, &segment);
                segment.clear();
                xml.push_str(if c == '\n' { "<w:br/>" } else { "<w:tab/>" });
            }
            c if !is_xml_char(c) => return Err(DocumentError::InvalidXmlChar(c as u32)),
            c => segment.push(c),
        }
    }
    push_text(&mut xml, &segment);

    xml.push_str("</w:r>");
    Ok(xml)
}

// XML 1.0 `Char` production; surrogates cannot occur in a `char`
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

fn push_text(xml: &mut String, segment: &str) {
    if segment.is_empty() {
        return;
    }
    xml.push_str(r#"<w:t xml:space="preserve">"#);
    xml.push_str(&quick_xml::escape::escape(segment));
    xml.push_str("</w:t>");
}
