//! Text extraction from raw document bytes

use crate::error::{Result, ResumeIndexerError};
use log::{debug, warn};
use pulldown_cmark::{Event, Parser, Tag};
use quick_xml::events::Event as XmlEvent;
use quick_xml::Reader as XmlReader;
use regex::Regex;
use std::io::{Cursor, Read};
use std::panic::{self, AssertUnwindSafe};
use zip::ZipArchive;

/// Minimum length of a printable run kept by best-effort recovery.
const MIN_RUN_LENGTH: usize = 4;

const DOCX_BODY_ENTRY: &str = "word/document.xml";

pub trait TextExtractor {
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<String>;
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        decode_utf8(filename, bytes)
    }
}

pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        let markdown_content = decode_utf8(filename, bytes)?;
        Ok(self.markdown_to_text(&markdown_content))
    }
}

impl MarkdownExtractor {
    fn markdown_to_text(&self, markdown: &str) -> String {
        let mut text = String::new();
        // Next number for ordered lists, None for bullets; innermost last.
        let mut lists: Vec<Option<u64>> = Vec::new();

        for event in Parser::new(markdown) {
            match event {
                Event::Text(t) | Event::Code(t) => text.push_str(&t),
                Event::SoftBreak | Event::HardBreak => text.push('\n'),
                Event::Start(Tag::List(start)) => lists.push(start),
                Event::End(Tag::List(_)) => {
                    lists.pop();
                }
                Event::Start(Tag::Item) => {
                    // keep the marker so list detection still sees it
                    if !text.is_empty() && !text.ends_with('\n') {
                        text.push('\n');
                    }
                    text.push_str(&"  ".repeat(lists.len().saturating_sub(1)));
                    match lists.last_mut() {
                        Some(Some(number)) => {
                            text.push_str(&format!("{}. ", number));
                            *number += 1;
                        }
                        _ => text.push_str("- "),
                    }
                }
                Event::End(Tag::Paragraph)
                | Event::End(Tag::Heading(..))
                | Event::End(Tag::Item)
                | Event::End(Tag::CodeBlock(_)) => text.push('\n'),
                _ => {}
            }
        }

        text.lines()
            .map(|line| line.trim_end())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        // pdf-extract panics on some malformed inputs
        let extracted = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(bytes)
        }));

        match extracted {
            Ok(Ok(text)) if !text.trim().is_empty() => Ok(text),
            Ok(Ok(_)) => {
                warn!("No text layer found in '{}', recovering text best-effort", filename);
                Ok(recover_pdf_text(bytes))
            }
            Ok(Err(e)) => {
                warn!("PDF extraction failed for '{}' ({}), recovering text best-effort", filename, e);
                Ok(recover_pdf_text(bytes))
            }
            Err(_) => {
                warn!("PDF extractor panicked on '{}', recovering text best-effort", filename);
                Ok(recover_pdf_text(bytes))
            }
        }
    }
}

pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        match read_docx_body(bytes) {
            Ok(text) => Ok(text),
            Err(reason) => {
                warn!(
                    "Could not read document body of '{}' ({}), recovering printable runs",
                    filename, reason
                );
                Ok(printable_runs(bytes, MIN_RUN_LENGTH))
            }
        }
    }
}

/// Legacy binary `.doc`; no structural parser, printable runs only.
pub struct LegacyDocExtractor;

impl TextExtractor for LegacyDocExtractor {
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        debug!("Recovering printable runs from legacy document '{}'", filename);
        Ok(printable_runs(bytes, MIN_RUN_LENGTH))
    }
}

fn decode_utf8(filename: &str, bytes: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(bytes).map_err(|e| ResumeIndexerError::Read {
        filename: filename.to_string(),
        reason: format!("content is not valid UTF-8: {}", e),
    })?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
}

/// Pull string operands of `Tj`/`TJ` text-show operators out of uncompressed
/// content streams, falling back to printable runs.
pub fn recover_pdf_text(bytes: &[u8]) -> String {
    let raw = String::from_utf8_lossy(bytes);
    let show_text = Regex::new(r"\(((?:\\.|[^\\)])*)\)\s*Tj|\[((?:\\.|[^\]])*)\]\s*TJ")
        .expect("Invalid text-show regex");
    let string_operand = Regex::new(r"\(((?:\\.|[^\\)])*)\)").expect("Invalid string operand regex");

    let mut lines = Vec::new();
    for caps in show_text.captures_iter(&raw) {
        if let Some(single) = caps.get(1) {
            lines.push(unescape_pdf_string(single.as_str()));
        } else if let Some(array) = caps.get(2) {
            let joined: String = string_operand
                .captures_iter(array.as_str())
                .map(|c| unescape_pdf_string(&c[1]))
                .collect();
            lines.push(joined);
        }
    }

    let lines: Vec<String> = lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();

    if lines.is_empty() {
        printable_runs(bytes, MIN_RUN_LENGTH)
    } else {
        lines.join("\n")
    }
}

fn unescape_pdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Runs of printable characters at least `min_len` long, one per line.
pub fn printable_runs(bytes: &[u8], min_len: usize) -> String {
    let raw = String::from_utf8_lossy(bytes);
    let mut runs = Vec::new();
    let mut current = String::new();

    for c in raw.chars() {
        let printable = c != char::REPLACEMENT_CHARACTER
            && (c.is_alphanumeric() || c.is_ascii_punctuation() || c == ' ');
        if printable {
            current.push(c);
        } else {
            flush_run(&mut current, &mut runs, min_len);
        }
    }
    flush_run(&mut current, &mut runs, min_len);

    runs.join("\n")
}

fn flush_run(current: &mut String, runs: &mut Vec<String>, min_len: usize) {
    let trimmed = current.trim();
    if trimmed.chars().count() >= min_len && trimmed.chars().any(|c| c.is_alphabetic()) {
        runs.push(trimmed.to_string());
    }
    current.clear();
}

fn read_docx_body(bytes: &[u8]) -> std::result::Result<String, String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let mut entry = archive.by_name(DOCX_BODY_ENTRY).map_err(|e| e.to_string())?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml).map_err(|e| e.to_string())?;
    word_xml_to_text(&xml)
}

/// Visible run text only: `w:t` content, with run tabs and breaks as whitespace
/// and one line per paragraph. Field instructions and deleted runs are skipped.
fn word_xml_to_text(xml: &str) -> std::result::Result<String, String> {
    let mut reader = XmlReader::from_str(xml);
    let mut text = String::new();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            XmlEvent::Start(e) => match e.local_name().as_ref() {
                b"r" => in_run = true,
                b"t" => in_text = in_run,
                _ => {}
            },
            XmlEvent::End(e) => match e.local_name().as_ref() {
                b"r" => in_run = false,
                b"t" => in_text = false,
                b"p" => text.push('\n'),
                _ => {}
            },
            XmlEvent::Empty(e) if in_run => match e.local_name().as_ref() {
                b"tab" => text.push('\t'),
                b"br" | b"cr" => text.push('\n'),
                _ => {}
            },
            XmlEvent::Text(e) if in_text => {
                text.push_str(&e.unescape().map_err(|e| e.to_string())?);
            }
            XmlEvent::Eof => break,
            _ => {}
        }
    }

    Ok(text
        .lines()
        .map(|line| line.trim_end())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}
