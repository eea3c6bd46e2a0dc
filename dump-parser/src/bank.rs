//! Folds per-chunk parse outcomes into a validated question bank.

use exam_model::{ParsedQuestion, QuestionBank, SkippedChunk};
use tracing::debug;

use crate::field_parser;
use crate::splitter::QuestionChunk;

/// Assigns accepted drafts 1-based contiguous order indices and records
/// unparseable chunks as skips. Structurally total: content irregularities
/// never abort the fold.
pub fn build_bank(chunks: &[QuestionChunk]) -> QuestionBank {
    let mut bank = QuestionBank::default();
    for chunk in chunks {
        match field_parser::parse_chunk(&chunk.text) {
            Ok(draft) => {
                let order_index = bank.questions.len() as u32 + 1;
                bank.questions.push(ParsedQuestion {
                    order_index,
                    stem: draft.stem,
                    choices: draft.choices,
                    correct: draft.correct,
                    explanation: draft.explanation,
                });
            }
            Err(reason) => {
                debug!(ordinal = chunk.ordinal, ?reason, "skipping unparseable chunk");
                bank.skipped.push(SkippedChunk { ordinal: chunk.ordinal, reason });
            }
        }
    }
    bank
}
