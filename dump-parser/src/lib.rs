//! Parser for exam "dump" PDFs: one recognized textual convention of
//! `QUESTION NO: <n>` blocks with lettered options, an `Answer:` line and an
//! optional `Explanation:` section.

pub mod bank;
pub mod exam_info;
pub mod extractor;
pub mod field_parser;
pub mod splitter;

use std::path::Path;

use exam_model::{ExamInfo, QuestionBank};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The byte stream is not a readable PDF (malformed or encrypted).
    #[error("unreadable pdf: {0}")]
    UnreadablePdf(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything one parse invocation yields.
#[derive(Debug, Clone)]
pub struct ParsedDump {
    pub info: ExamInfo,
    pub bank: QuestionBank,
}

/// Parse a dump PDF from an in-memory byte stream. The sole fatal failure is
/// an unreadable PDF; content irregularities surface as skips in the bank.
pub fn parse(bytes: &[u8]) -> Result<ParsedDump, ParseError> {
    let pages = extractor::extract_pages(bytes)?;
    Ok(parse_text(&pages.join("\n")))
}

/// Parse already-extracted dump text. Total: never fails, only skips.
pub fn parse_text(text: &str) -> ParsedDump {
    let split = splitter::split_into_chunks(text);
    let info = exam_info::extract_exam_info(&split.preamble, text);
    let bank = bank::build_bank(&split.chunks);
    ParsedDump { info, bank }
}

/// Parse a dump file by path. `.pdf` goes through the text extractor;
/// anything else is treated as plain text.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ParsedDump, ParseError> {
    let path = path.as_ref();
    if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("pdf")) {
        let bytes = std::fs::read(path)?;
        parse(&bytes)
    } else {
        let text = std::fs::read_to_string(path)?;
        Ok(parse_text(&text))
    }
}
