//! Partitions extracted dump text into one chunk per question, anchored on
//! `QUESTION NO: <n>` start markers.

use std::sync::OnceLock;

use regex::Regex;

/// A contiguous span of raw text believed to contain exactly one question.
/// The start marker and its ordinal are already stripped from `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionChunk {
    /// Ordinal printed in the start marker.
    pub ordinal: u32,
    pub text: String,
}

/// Splitter output: chunks in source order plus the preamble that preceded
/// the first marker (table of contents, cover page, version banner).
#[derive(Debug, Clone, Default)]
pub struct SplitDump {
    pub preamble: String,
    pub chunks: Vec<QuestionChunk>,
}

/// Line-anchored so that a second marker appearing mid-line is content, not
/// a boundary. Tolerates whitespace variance and `NO.` in place of `NO:`.
fn marker_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^[ \t]*question[ \t]+no[ \t]*[:.][ \t]*(\d+)").expect("valid marker pattern")
    })
}

/// Scan `text` for question-start markers and cut one chunk per marker, each
/// running up to the next marker or end of input. Zero markers yields an
/// empty chunk list, not an error.
pub fn split_into_chunks(text: &str) -> SplitDump {
    let matches: Vec<(usize, usize, u32)> = marker_pattern()
        .captures_iter(text)
        .map(|cap| {
            let whole = cap.get(0).expect("match 0 always present");
            let ordinal = cap[1].parse::<u32>().unwrap_or(0);
            (whole.start(), whole.end(), ordinal)
        })
        .collect();

    let Some(first) = matches.first() else {
        return SplitDump { preamble: text.to_string(), chunks: Vec::new() };
    };

    let preamble = text[..first.0].to_string();
    let mut chunks = Vec::with_capacity(matches.len());
    for (i, (_, body_start, ordinal)) in matches.iter().enumerate() {
        let body_end = matches.get(i + 1).map_or(text.len(), |next| next.0);
        chunks.push(QuestionChunk {
            ordinal: *ordinal,
            text: text[*body_start..body_end].to_string(),
        });
    }
    SplitDump { preamble, chunks }
}
