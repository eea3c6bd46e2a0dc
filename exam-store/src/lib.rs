//! Relational store for imported exams and practice sessions.

pub mod sqlite_repo;

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("not found: {0}")]
    NotFound(&'static str),
}

/// Session mode: full exam run or study mode with immediate feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionMode {
    Exam,
    Study,
}

impl SessionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionMode::Exam => "exam",
            SessionMode::Study => "study",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "study" => SessionMode::Study,
            _ => SessionMode::Exam,
        }
    }
}

/// One stored exam.
#[derive(Debug, Clone, Serialize)]
pub struct ExamRecord {
    pub id: i64,
    pub title: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionRecord {
    pub id: i64,
    pub exam_id: i64,
    pub title: String,
    pub order_index: i64,
}

/// A stored question together with its choices, ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct StoredQuestion {
    pub id: i64,
    pub section_id: i64,
    pub question_text: String,
    pub order_index: i64,
    pub choices: Vec<StoredChoice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredChoice {
    pub id: i64,
    pub choice_label: String,
    pub choice_text: String,
    pub order_index: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub id: i64,
    pub exam_id: i64,
    pub mode: SessionMode,
    pub start_time: String,
    pub end_time: Option<String>,
    pub score: Option<f64>,
    pub total_questions: i64,
    pub correct_answers: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseRecord {
    pub id: i64,
    pub session_id: i64,
    pub question_id: i64,
    pub selected_choice_id: Option<i64>,
    pub is_correct: Option<bool>,
    pub response_time: String,
    pub notes: String,
    pub flagged: bool,
}

/// Progress snapshot for one session.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SessionProgress {
    pub total_questions: i64,
    pub answered_count: i64,
    pub correct_count: i64,
    pub progress_percentage: f64,
}

/// Study-mode verdict for one answered question.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QuestionResult {
    pub is_correct: Option<bool>,
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AdminStats {
    pub total_exams: i64,
    pub total_questions: i64,
    pub total_sessions: i64,
    pub avg_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExamWithCount {
    pub exam: ExamRecord,
    pub question_count: i64,
}

/// Per-question response statistics for the admin question list.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionStats {
    pub question_id: i64,
    pub question_text: String,
    pub order_index: i64,
    pub response_count: i64,
    pub correct_count: i64,
    pub accuracy: f64,
}
