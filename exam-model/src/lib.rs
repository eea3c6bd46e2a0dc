//! Shared models used across the exam trainer crates.

use serde::{Deserialize, Serialize};

/// One answer option inside a parsed question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceDraft {
    /// Option letter, uppercased (A, B, C, ...). Unique within one question.
    pub letter: char,
    /// Option text with wrapped lines already joined.
    pub text: String,
}

impl ChoiceDraft {
    pub fn new(letter: char, text: impl Into<String>) -> Self {
        Self { letter: letter.to_ascii_uppercase(), text: text.into() }
    }
}

/// Intermediate structured record produced by the field parser for one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    /// Question stem with internal line breaks joined by single spaces.
    pub stem: String,
    /// Options in source order; letters are unique.
    pub choices: Vec<ChoiceDraft>,
    /// Marked correct-option letter. `None` when absent or unrecognized.
    pub correct: Option<char>,
    /// Explanation text. `None` when the chunk carries no explanation marker.
    pub explanation: Option<String>,
}

/// Why a chunk was excluded from the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Fewer than two recognizable option lines.
    TooFewOptions,
    /// No stem text before the first option line.
    EmptyStem,
}

/// Record of one chunk that failed minimal structural validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedChunk {
    /// Ordinal taken from the chunk's start marker.
    pub ordinal: u32,
    pub reason: SkipReason,
}

/// An accepted question inside a bank, with its stable 1-based order index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuestion {
    /// 1-based, contiguous, reflecting source order.
    pub order_index: u32,
    pub stem: String,
    pub choices: Vec<ChoiceDraft>,
    pub correct: Option<char>,
    pub explanation: Option<String>,
}

/// Final ordered collection of parsed questions from one import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBank {
    pub questions: Vec<ParsedQuestion>,
    pub skipped: Vec<SkippedChunk>,
}

impl QuestionBank {
    /// Number of chunks the splitter detected, accepted or not.
    pub fn detected_count(&self) -> usize {
        self.questions.len() + self.skipped.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Exam metadata guessed from the document preamble.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamInfo {
    /// First plausible title line of the preamble, when one exists.
    pub title: Option<String>,
    /// Version token such as "V12.35", when one is found.
    pub version: Option<String>,
}
