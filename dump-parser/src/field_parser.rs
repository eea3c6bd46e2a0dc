//! Decomposes one question chunk into stem, options, answer letter and
//! explanation using line-pattern recognition.

use std::sync::OnceLock;

use exam_model::{ChoiceDraft, QuestionDraft, SkipReason};
use regex::Regex;

fn option_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z])[.)][ \t]*(\S.*)$").expect("valid option pattern"))
}

fn answer_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^answer[ \t]*:[ \t]*([A-Za-z])\b").expect("valid answer pattern"))
}

fn explanation_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^explanation[ \t]*:[ \t]*(.*)$").expect("valid explanation pattern"))
}

/// Parse one chunk's text (start marker already stripped) into a draft.
/// A chunk with fewer than two options or an empty stem is unparseable;
/// a missing answer line is not (`correct` stays `None`).
pub fn parse_chunk(text: &str) -> Result<QuestionDraft, SkipReason> {
    let mut stem_lines: Vec<&str> = Vec::new();
    let mut choices: Vec<ChoiceDraft> = Vec::new();
    let mut correct: Option<char> = None;
    let mut explanation_lines: Vec<String> = Vec::new();
    let mut in_explanation = false;
    // Index into `choices` of the option the previous line belonged to, for
    // wrapped-text continuation. Reset by any blank or structural line.
    let mut continuing: Option<usize> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continuing = None;
            continue;
        }

        // Answer line: first occurrence wins. Free text following it is
        // explanation, with or without an `Explanation:` marker.
        if let Some(cap) = answer_pattern().captures(line) {
            if correct.is_none() {
                correct = cap[1].chars().next().map(|c| c.to_ascii_uppercase());
            }
            in_explanation = true;
            continuing = None;
            continue;
        }

        if let Some(cap) = explanation_pattern().captures(line) {
            in_explanation = true;
            continuing = None;
            let rest = cap[1].trim();
            if !rest.is_empty() {
                explanation_lines.push(rest.to_string());
            }
            continue;
        }

        if let Some(cap) = option_pattern().captures(line) {
            let letter = cap[1].chars().next().expect("single-letter capture").to_ascii_uppercase();
            let body = cap[2].trim().to_string();
            in_explanation = false;
            // A repeated letter overwrites the earlier option in place;
            // wrapped option text never reaches here because continuation
            // lines do not match the option pattern.
            if let Some(pos) = choices.iter().position(|c| c.letter == letter) {
                choices[pos].text = body;
                continuing = Some(pos);
            } else {
                choices.push(ChoiceDraft { letter, text: body });
                continuing = Some(choices.len() - 1);
            }
            continue;
        }

        if in_explanation {
            explanation_lines.push(line.to_string());
            continue;
        }

        if let Some(pos) = continuing {
            // Wrapped option text: merge into the option it follows.
            let choice = &mut choices[pos];
            choice.text.push(' ');
            choice.text.push_str(line);
            continue;
        }

        if choices.is_empty() {
            stem_lines.push(line);
        }
        // A stray line between the options and the answer that follows a
        // blank line belongs to no field and is dropped.
    }

    let stem = stem_lines.join(" ");
    if stem.is_empty() {
        return Err(SkipReason::EmptyStem);
    }
    if choices.len() < 2 {
        return Err(SkipReason::TooFewOptions);
    }

    let explanation = if explanation_lines.is_empty() {
        None
    } else {
        Some(explanation_lines.join(" "))
    };
    Ok(QuestionDraft { stem, choices, correct, explanation })
}
