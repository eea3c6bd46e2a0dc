//! High-level facade tying the dump parser to the exam store: import a
//! question dump once, then run and score practice sessions against it.

use std::path::{Path, PathBuf};

use dump_parser::ParseError;
use exam_store::sqlite_repo::ExamRepo;
use exam_store::{
    AdminStats, ExamRecord, ExamWithCount, QuestionResult, QuestionStats, ResponseRecord,
    SectionRecord, SessionMode, SessionProgress, SessionRecord, StoreError, StoredQuestion,
};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub db_path: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("target/demo/exams.db"),
        }
    }
}

/// Outcome of one dump import. Skipped chunks are reported, never fatal.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub exam_id: i64,
    pub title: String,
    pub detected: usize,
    pub imported: usize,
    pub skipped: usize,
}

pub struct ExamService {
    cfg: ServiceConfig,
}

impl ExamService {
    /// Build a service over the configured database path, creating parent
    /// directories as needed.
    pub fn new(cfg: ServiceConfig) -> Result<Self, ServiceError> {
        if let Some(parent) = cfg.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ServiceError::Io(format!("create {}: {e}", parent.display())))?;
            }
        }
        Ok(Self { cfg })
    }

    /// Guarded access to the primary repo. Opens a fresh connection so
    /// callers never hold one across operations.
    pub fn with_repo<R, F>(&self, f: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut ExamRepo) -> Result<R, ServiceError>,
    {
        let mut repo = ExamRepo::open(&self.cfg.db_path)?;
        f(&mut repo)
    }

    // ------------------------------
    // Import
    // ------------------------------

    /// Import a question dump from a file on disk. PDF files go through text
    /// extraction; anything else is read as plain text.
    pub fn import_dump_file<P: AsRef<Path>>(&self, path: P) -> Result<ImportReport, ServiceError> {
        let path = path.as_ref();
        let parsed = dump_parser::parse_file(path)?;
        let source_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let fallback_title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty());
        self.store_parsed(parsed, &source_name, fallback_title)
    }

    /// Import a question dump from in-memory PDF bytes, as received from an
    /// upload. `source_name` is used for the description and title fallback.
    pub fn import_pdf_bytes(
        &self,
        bytes: &[u8],
        source_name: &str,
    ) -> Result<ImportReport, ServiceError> {
        let parsed = dump_parser::parse(bytes)?;
        let fallback_title = Path::new(source_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty());
        self.store_parsed(parsed, source_name, fallback_title)
    }

    fn store_parsed(
        &self,
        parsed: dump_parser::ParsedDump,
        source_name: &str,
        fallback_title: Option<String>,
    ) -> Result<ImportReport, ServiceError> {
        let title = parsed
            .info
            .title
            .clone()
            .or(fallback_title)
            .unwrap_or_else(|| "Imported exam".to_string());
        let description = format!("Imported from {source_name}");
        let detected = parsed.bank.detected_count();
        let imported = parsed.bank.questions.len();
        let skipped = parsed.bank.skipped_count();

        let exam_id = self.with_repo(|repo| {
            Ok(repo.insert_bank(
                &title,
                parsed.info.version.as_deref(),
                Some(&description),
                &parsed.bank,
            )?)
        })?;

        info!(
            exam_id,
            title = %title,
            imported,
            detected,
            skipped,
            "imported question dump"
        );
        Ok(ImportReport {
            exam_id,
            title,
            detected,
            imported,
            skipped,
        })
    }

    // ------------------------------
    // Exams
    // ------------------------------

    pub fn list_exams(&self) -> Result<Vec<ExamRecord>, ServiceError> {
        self.with_repo(|repo| Ok(repo.list_exams()?))
    }

    pub fn list_exams_with_counts(&self) -> Result<Vec<ExamWithCount>, ServiceError> {
        self.with_repo(|repo| Ok(repo.list_exams_with_counts()?))
    }

    pub fn get_exam(&self, exam_id: i64) -> Result<Option<ExamRecord>, ServiceError> {
        self.with_repo(|repo| Ok(repo.get_exam(exam_id)?))
    }

    pub fn exam_sections(&self, exam_id: i64) -> Result<Vec<SectionRecord>, ServiceError> {
        self.with_repo(|repo| Ok(repo.exam_sections(exam_id)?))
    }

    pub fn exam_question_count(&self, exam_id: i64) -> Result<i64, ServiceError> {
        self.with_repo(|repo| Ok(repo.exam_question_count(exam_id)?))
    }

    pub fn delete_exam(&self, exam_id: i64) -> Result<bool, ServiceError> {
        let deleted = self.with_repo(|repo| Ok(repo.delete_exam(exam_id)?))?;
        debug!(exam_id, deleted, "delete exam");
        Ok(deleted)
    }

    // ------------------------------
    // Sessions and navigation
    // ------------------------------

    pub fn create_session(
        &self,
        exam_id: i64,
        mode: SessionMode,
    ) -> Result<SessionRecord, ServiceError> {
        let session = self.with_repo(|repo| Ok(repo.create_session(exam_id, mode)?))?;
        debug!(session_id = session.id, exam_id, mode = mode.as_str(), "created session");
        Ok(session)
    }

    pub fn get_session(&self, session_id: i64) -> Result<Option<SessionRecord>, ServiceError> {
        self.with_repo(|repo| Ok(repo.get_session(session_id)?))
    }

    pub fn submit_session(&self, session_id: i64) -> Result<SessionRecord, ServiceError> {
        let session = self.with_repo(|repo| Ok(repo.submit_session(session_id)?))?;
        debug!(session_id, score = ?session.score, "submitted session");
        Ok(session)
    }

    pub fn session_progress(&self, session_id: i64) -> Result<SessionProgress, ServiceError> {
        self.with_repo(|repo| Ok(repo.session_progress(session_id)?))
    }

    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, ServiceError> {
        self.with_repo(|repo| Ok(repo.recent_sessions(limit)?))
    }

    pub fn session_questions(&self, session_id: i64) -> Result<Vec<StoredQuestion>, ServiceError> {
        self.with_repo(|repo| Ok(repo.session_questions(session_id)?))
    }

    pub fn first_question(&self, session_id: i64) -> Result<Option<StoredQuestion>, ServiceError> {
        self.with_repo(|repo| Ok(repo.first_question(session_id)?))
    }

    pub fn next_question(
        &self,
        session_id: i64,
        current_question_id: i64,
    ) -> Result<Option<StoredQuestion>, ServiceError> {
        self.with_repo(|repo| Ok(repo.next_question(session_id, current_question_id)?))
    }

    pub fn previous_question(
        &self,
        session_id: i64,
        current_question_id: i64,
    ) -> Result<Option<StoredQuestion>, ServiceError> {
        self.with_repo(|repo| Ok(repo.previous_question(session_id, current_question_id)?))
    }

    pub fn get_question(&self, question_id: i64) -> Result<Option<StoredQuestion>, ServiceError> {
        self.with_repo(|repo| Ok(repo.get_question(question_id)?))
    }

    // ------------------------------
    // Responses and results
    // ------------------------------

    pub fn save_response(
        &self,
        session_id: i64,
        question_id: i64,
        selected_choice_id: Option<i64>,
        notes: &str,
        flagged: bool,
    ) -> Result<ResponseRecord, ServiceError> {
        self.with_repo(|repo| {
            Ok(repo.save_response(session_id, question_id, selected_choice_id, notes, flagged)?)
        })
    }

    pub fn get_response(
        &self,
        session_id: i64,
        question_id: i64,
    ) -> Result<Option<ResponseRecord>, ServiceError> {
        self.with_repo(|repo| Ok(repo.get_response(session_id, question_id)?))
    }

    pub fn question_result(
        &self,
        session_id: i64,
        question_id: i64,
    ) -> Result<QuestionResult, ServiceError> {
        self.with_repo(|repo| Ok(repo.question_result(session_id, question_id)?))
    }

    // ------------------------------
    // Admin reporting
    // ------------------------------

    pub fn admin_stats(&self) -> Result<AdminStats, ServiceError> {
        self.with_repo(|repo| Ok(repo.admin_stats()?))
    }

    pub fn question_stats(&self, exam_id: i64) -> Result<Vec<QuestionStats>, ServiceError> {
        self.with_repo(|repo| Ok(repo.question_stats(exam_id)?))
    }
}
