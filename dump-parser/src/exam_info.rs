//! Title and version guesses from the document preamble.

use std::sync::OnceLock;

use exam_model::ExamInfo;
use regex::Regex;

fn version_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bv(?:ersion[ \t]*)?(\d+\.\d+)\b").expect("valid version pattern"))
}

/// Pick the title from the first few preamble lines and a `V<d.d>`-style
/// version token from anywhere in the document. Both are best-effort.
pub fn extract_exam_info(preamble: &str, full_text: &str) -> ExamInfo {
    let title = preamble
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(10)
        .find(|l| looks_like_title(l))
        .map(|l| l.to_string());

    let version = version_pattern()
        .captures(full_text)
        .map(|cap| format!("V{}", &cap[1]));

    ExamInfo { title, version }
}

fn looks_like_title(line: &str) -> bool {
    // Page numbers, dot leaders and bare version banners make poor titles.
    let has_letters = line.chars().any(|c| c.is_alphabetic());
    if !has_letters || line.len() < 4 || line.len() > 120 || line.contains("...") {
        return false;
    }
    !version_pattern()
        .find(line)
        .is_some_and(|m| m.start() == 0 && m.end() == line.len())
}
