use std::path::Path;

use chrono::Utc;
use exam_model::QuestionBank;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::{
    AdminStats, ExamRecord, ExamWithCount, QuestionResult, QuestionStats, ResponseRecord,
    SectionRecord, SessionMode, SessionProgress, SessionRecord, StoreError, StoredChoice,
    StoredQuestion,
};

/// SQLite-backed primary store for exams, question banks and sessions.
pub struct ExamRepo {
    conn: Connection,
}

fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

impl ExamRepo {
    /// Open an in-memory repository and initialize schema.
    pub fn new() -> Self {
        let conn = Connection::open_in_memory().expect("open in-memory sqlite");
        let repo = Self { conn };
        repo.init().expect("initialize schema");
        repo
    }

    /// Open a file-backed repository at `path` and initialize schema if absent.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let repo = Self { conn };
        repo.init()?;
        Ok(repo)
    }

    fn init(&self) -> Result<(), StoreError> {
        // Pragmas for durability and cascade enforcement
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "synchronous", "FULL")?;
        self.conn.pragma_update(None, "foreign_keys", "ON")?;

        // Every child edge cascades so a parent delete leaves no orphans:
        // exam -> section -> question -> {choice, answer, response} and
        // session -> response.
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS exams (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                version TEXT,
                description TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sections (
                id INTEGER PRIMARY KEY,
                exam_id INTEGER NOT NULL REFERENCES exams(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                order_index INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_sections_exam_id ON sections(exam_id);

            CREATE TABLE IF NOT EXISTS questions (
                id INTEGER PRIMARY KEY,
                section_id INTEGER NOT NULL REFERENCES sections(id) ON DELETE CASCADE,
                question_text TEXT NOT NULL,
                order_index INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_questions_section_id ON questions(section_id);

            CREATE TABLE IF NOT EXISTS choices (
                id INTEGER PRIMARY KEY,
                question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
                choice_label TEXT NOT NULL,
                choice_text TEXT NOT NULL,
                order_index INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_choices_question_id ON choices(question_id);

            CREATE TABLE IF NOT EXISTS answers (
                id INTEGER PRIMARY KEY,
                question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
                correct_choice_id INTEGER NOT NULL REFERENCES choices(id) ON DELETE CASCADE,
                explanation TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_answers_question_id ON answers(question_id);

            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY,
                exam_id INTEGER NOT NULL REFERENCES exams(id) ON DELETE CASCADE,
                mode TEXT NOT NULL DEFAULT 'exam',
                start_time TEXT NOT NULL,
                end_time TEXT,
                score REAL,
                total_questions INTEGER NOT NULL DEFAULT 0,
                correct_answers INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_exam_id ON sessions(exam_id);

            CREATE TABLE IF NOT EXISTS responses (
                id INTEGER PRIMARY KEY,
                session_id INTEGER NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
                question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
                selected_choice_id INTEGER REFERENCES choices(id) ON DELETE SET NULL,
                is_correct INTEGER,
                response_time TEXT NOT NULL,
                notes TEXT NOT NULL DEFAULT '',
                flagged INTEGER NOT NULL DEFAULT 0,
                UNIQUE(session_id, question_id)
            );
            CREATE INDEX IF NOT EXISTS idx_responses_session_id ON responses(session_id);
            CREATE INDEX IF NOT EXISTS idx_responses_question_id ON responses(question_id);
            "#,
        )?;
        Ok(())
    }

    // ------------------------------
    // Import
    // ------------------------------

    /// Store a parsed question bank under a new exam identity, atomically.
    /// Order indices are written contiguously from 1; an answers row is
    /// created only when the question's correct letter maps to one of its
    /// stored choices. Returns the new exam id.
    pub fn insert_bank(
        &mut self,
        title: &str,
        version: Option<&str>,
        description: Option<&str>,
        bank: &QuestionBank,
    ) -> Result<i64, StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO exams (title, version, description, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![title, version, description, now_iso()],
        )?;
        let exam_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO sections (exam_id, title, order_index) VALUES (?1, ?2, 0)",
            params![exam_id, "Imported questions"],
        )?;
        let section_id = tx.last_insert_rowid();

        for question in &bank.questions {
            tx.execute(
                "INSERT INTO questions (section_id, question_text, order_index) VALUES (?1, ?2, ?3)",
                params![section_id, question.stem, question.order_index as i64],
            )?;
            let question_id = tx.last_insert_rowid();

            let mut correct_choice_id: Option<i64> = None;
            for (idx, choice) in question.choices.iter().enumerate() {
                tx.execute(
                    "INSERT INTO choices (question_id, choice_label, choice_text, order_index) VALUES (?1, ?2, ?3, ?4)",
                    params![question_id, choice.letter.to_string(), choice.text, idx as i64],
                )?;
                if question.correct == Some(choice.letter) {
                    correct_choice_id = Some(tx.last_insert_rowid());
                }
            }

            if let Some(choice_id) = correct_choice_id {
                tx.execute(
                    "INSERT INTO answers (question_id, correct_choice_id, explanation) VALUES (?1, ?2, ?3)",
                    params![question_id, choice_id, question.explanation],
                )?;
            }
        }

        tx.commit()?;
        Ok(exam_id)
    }

    // ------------------------------
    // Exams
    // ------------------------------

    pub fn list_exams(&self) -> Result<Vec<ExamRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, version, description, created_at FROM exams ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], map_exam)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    pub fn get_exam(&self, exam_id: i64) -> Result<Option<ExamRecord>, StoreError> {
        let exam = self
            .conn
            .query_row(
                "SELECT id, title, version, description, created_at FROM exams WHERE id = ?1",
                [exam_id],
                map_exam,
            )
            .optional()?;
        Ok(exam)
    }

    pub fn exam_sections(&self, exam_id: i64) -> Result<Vec<SectionRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, exam_id, title, order_index FROM sections WHERE exam_id = ?1 ORDER BY order_index",
        )?;
        let rows = stmt.query_map([exam_id], |row| {
            Ok(SectionRecord {
                id: row.get(0)?,
                exam_id: row.get(1)?,
                title: row.get(2)?,
                order_index: row.get(3)?,
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    pub fn exam_question_count(&self, exam_id: i64) -> Result<i64, StoreError> {
        let count = self.conn.query_row(
            "SELECT count(q.id) FROM questions q
             JOIN sections s ON q.section_id = s.id
             WHERE s.exam_id = ?1",
            [exam_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn list_exams_with_counts(&self) -> Result<Vec<ExamWithCount>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT e.id, e.title, e.version, e.description, e.created_at, count(q.id)
             FROM exams e
             LEFT JOIN sections s ON s.exam_id = e.id
             LEFT JOIN questions q ON q.section_id = s.id
             GROUP BY e.id
             ORDER BY e.created_at DESC, e.id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ExamWithCount {
                exam: ExamRecord {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    version: row.get(2)?,
                    description: row.get(3)?,
                    created_at: row.get(4)?,
                },
                question_count: row.get(5)?,
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    /// Delete an exam and, via cascades, all of its sections, questions,
    /// choices, answers, sessions and responses. Returns false when the id
    /// did not exist.
    pub fn delete_exam(&self, exam_id: i64) -> Result<bool, StoreError> {
        let n = self
            .conn
            .execute("DELETE FROM exams WHERE id = ?1", [exam_id])?;
        Ok(n > 0)
    }

    // ------------------------------
    // Questions
    // ------------------------------

    fn load_choices(&self, question_id: i64) -> Result<Vec<StoredChoice>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, choice_label, choice_text, order_index FROM choices
             WHERE question_id = ?1 ORDER BY order_index",
        )?;
        let rows = stmt.query_map([question_id], |row| {
            Ok(StoredChoice {
                id: row.get(0)?,
                choice_label: row.get(1)?,
                choice_text: row.get(2)?,
                order_index: row.get(3)?,
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    fn question_with_choices(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Option<StoredQuestion>, StoreError> {
        let base = self
            .conn
            .query_row(sql, params, |row| {
                Ok(StoredQuestion {
                    id: row.get(0)?,
                    section_id: row.get(1)?,
                    question_text: row.get(2)?,
                    order_index: row.get(3)?,
                    choices: Vec::new(),
                })
            })
            .optional()?;
        match base {
            Some(mut q) => {
                q.choices = self.load_choices(q.id)?;
                Ok(Some(q))
            }
            None => Ok(None),
        }
    }

    pub fn get_question(&self, question_id: i64) -> Result<Option<StoredQuestion>, StoreError> {
        self.question_with_choices(
            "SELECT id, section_id, question_text, order_index FROM questions WHERE id = ?1",
            &[&question_id],
        )
    }

    pub fn first_question(&self, session_id: i64) -> Result<Option<StoredQuestion>, StoreError> {
        self.question_with_choices(
            "SELECT q.id, q.section_id, q.question_text, q.order_index FROM questions q
             JOIN sections s ON q.section_id = s.id
             JOIN sessions se ON se.exam_id = s.exam_id
             WHERE se.id = ?1
             ORDER BY q.order_index LIMIT 1",
            &[&session_id],
        )
    }

    pub fn next_question(
        &self,
        session_id: i64,
        current_question_id: i64,
    ) -> Result<Option<StoredQuestion>, StoreError> {
        self.neighbor_question(session_id, current_question_id, true)
    }

    pub fn previous_question(
        &self,
        session_id: i64,
        current_question_id: i64,
    ) -> Result<Option<StoredQuestion>, StoreError> {
        self.neighbor_question(session_id, current_question_id, false)
    }

    fn neighbor_question(
        &self,
        session_id: i64,
        current_question_id: i64,
        forward: bool,
    ) -> Result<Option<StoredQuestion>, StoreError> {
        let current_order: Option<i64> = self
            .conn
            .query_row(
                "SELECT q.order_index FROM questions q
                 JOIN sections s ON q.section_id = s.id
                 JOIN sessions se ON se.exam_id = s.exam_id
                 WHERE se.id = ?1 AND q.id = ?2",
                params![session_id, current_question_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(current_order) = current_order else {
            return Ok(None);
        };

        let sql = if forward {
            "SELECT q.id, q.section_id, q.question_text, q.order_index FROM questions q
             JOIN sections s ON q.section_id = s.id
             JOIN sessions se ON se.exam_id = s.exam_id
             WHERE se.id = ?1 AND q.order_index > ?2
             ORDER BY q.order_index LIMIT 1"
        } else {
            "SELECT q.id, q.section_id, q.question_text, q.order_index FROM questions q
             JOIN sections s ON q.section_id = s.id
             JOIN sessions se ON se.exam_id = s.exam_id
             WHERE se.id = ?1 AND q.order_index < ?2
             ORDER BY q.order_index DESC LIMIT 1"
        };
        self.question_with_choices(sql, &[&session_id, &current_order])
    }

    pub fn session_questions(&self, session_id: i64) -> Result<Vec<StoredQuestion>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT q.id, q.section_id, q.question_text, q.order_index FROM questions q
             JOIN sections s ON q.section_id = s.id
             JOIN sessions se ON se.exam_id = s.exam_id
             WHERE se.id = ?1
             ORDER BY q.order_index",
        )?;
        let rows = stmt.query_map([session_id], |row| {
            Ok(StoredQuestion {
                id: row.get(0)?,
                section_id: row.get(1)?,
                question_text: row.get(2)?,
                order_index: row.get(3)?,
                choices: Vec::new(),
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        for q in &mut out {
            q.choices = self.load_choices(q.id)?;
        }
        Ok(out)
    }

    // ------------------------------
    // Sessions
    // ------------------------------

    /// Create a session for an exam, snapshotting the question count.
    pub fn create_session(
        &self,
        exam_id: i64,
        mode: SessionMode,
    ) -> Result<SessionRecord, StoreError> {
        let total = self.exam_question_count(exam_id)?;
        self.conn.execute(
            "INSERT INTO sessions (exam_id, mode, start_time, total_questions) VALUES (?1, ?2, ?3, ?4)",
            params![exam_id, mode.as_str(), now_iso(), total],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_session(id)?
            .ok_or(StoreError::NotFound("session just created"))
    }

    pub fn get_session(&self, session_id: i64) -> Result<Option<SessionRecord>, StoreError> {
        let session = self
            .conn
            .query_row(
                "SELECT id, exam_id, mode, start_time, end_time, score, total_questions, correct_answers
                 FROM sessions WHERE id = ?1",
                [session_id],
                map_session,
            )
            .optional()?;
        Ok(session)
    }

    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, exam_id, mode, start_time, end_time, score, total_questions, correct_answers
             FROM sessions ORDER BY start_time DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit as i64], map_session)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    /// Close a session: stamp the end time and compute the percentage score
    /// from correct responses against the snapshotted total.
    pub fn submit_session(&self, session_id: i64) -> Result<SessionRecord, StoreError> {
        let session = self
            .get_session(session_id)?
            .ok_or(StoreError::NotFound("session"))?;
        let correct: i64 = self.conn.query_row(
            "SELECT count(id) FROM responses WHERE session_id = ?1 AND is_correct = 1",
            [session_id],
            |row| row.get(0),
        )?;
        let score = if session.total_questions > 0 {
            correct as f64 / session.total_questions as f64 * 100.0
        } else {
            0.0
        };
        self.conn.execute(
            "UPDATE sessions SET end_time = ?1, score = ?2, correct_answers = ?3 WHERE id = ?4",
            params![now_iso(), score, correct, session_id],
        )?;
        self.get_session(session_id)?
            .ok_or(StoreError::NotFound("session"))
    }

    pub fn session_progress(&self, session_id: i64) -> Result<SessionProgress, StoreError> {
        let session = self
            .get_session(session_id)?
            .ok_or(StoreError::NotFound("session"))?;
        let answered: i64 = self.conn.query_row(
            "SELECT count(id) FROM responses WHERE session_id = ?1",
            [session_id],
            |row| row.get(0),
        )?;
        let correct: i64 = self.conn.query_row(
            "SELECT count(id) FROM responses WHERE session_id = ?1 AND is_correct = 1",
            [session_id],
            |row| row.get(0),
        )?;
        let percentage = if session.total_questions > 0 {
            answered as f64 / session.total_questions as f64 * 100.0
        } else {
            0.0
        };
        Ok(SessionProgress {
            total_questions: session.total_questions,
            answered_count: answered,
            correct_count: correct,
            progress_percentage: percentage,
        })
    }

    // ------------------------------
    // Responses
    // ------------------------------

    pub fn get_response(
        &self,
        session_id: i64,
        question_id: i64,
    ) -> Result<Option<ResponseRecord>, StoreError> {
        let response = self
            .conn
            .query_row(
                "SELECT id, session_id, question_id, selected_choice_id, is_correct, response_time, notes, flagged
                 FROM responses WHERE session_id = ?1 AND question_id = ?2",
                params![session_id, question_id],
                map_response,
            )
            .optional()?;
        Ok(response)
    }

    /// Upsert the response to one question within a session. Correctness is
    /// evaluated at save time against the question's answers row; it stays
    /// NULL when no choice was selected or the question has no stored answer.
    pub fn save_response(
        &self,
        session_id: i64,
        question_id: i64,
        selected_choice_id: Option<i64>,
        notes: &str,
        flagged: bool,
    ) -> Result<ResponseRecord, StoreError> {
        let correct_choice_id: Option<i64> = self
            .conn
            .query_row(
                "SELECT correct_choice_id FROM answers WHERE question_id = ?1",
                [question_id],
                |row| row.get(0),
            )
            .optional()?;
        let is_correct = match (selected_choice_id, correct_choice_id) {
            (Some(selected), Some(correct)) => Some(selected == correct),
            _ => None,
        };

        self.conn.execute(
            "INSERT INTO responses (session_id, question_id, selected_choice_id, is_correct, response_time, notes, flagged)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(session_id, question_id) DO UPDATE SET
                 selected_choice_id = excluded.selected_choice_id,
                 is_correct = excluded.is_correct,
                 response_time = excluded.response_time,
                 notes = excluded.notes,
                 flagged = excluded.flagged",
            params![
                session_id,
                question_id,
                selected_choice_id,
                is_correct,
                now_iso(),
                notes,
                flagged,
            ],
        )?;
        self.get_response(session_id, question_id)?
            .ok_or(StoreError::NotFound("response just saved"))
    }

    /// Study-mode verdict: correctness of the saved response plus the correct
    /// label and explanation. Fields stay unset when the question was never
    /// answered or carries no stored answer.
    pub fn question_result(
        &self,
        session_id: i64,
        question_id: i64,
    ) -> Result<QuestionResult, StoreError> {
        let Some(response) = self.get_response(session_id, question_id)? else {
            return Ok(QuestionResult::default());
        };
        let answer: Option<(String, Option<String>)> = self
            .conn
            .query_row(
                "SELECT c.choice_label, a.explanation FROM answers a
                 JOIN choices c ON a.correct_choice_id = c.id
                 WHERE a.question_id = ?1",
                [question_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((correct_label, explanation)) = answer else {
            return Ok(QuestionResult::default());
        };
        Ok(QuestionResult {
            is_correct: response.is_correct,
            correct_answer: Some(correct_label),
            explanation,
        })
    }

    // ------------------------------
    // Admin reporting
    // ------------------------------

    pub fn admin_stats(&self) -> Result<AdminStats, StoreError> {
        let total_exams: i64 =
            self.conn
                .query_row("SELECT count(id) FROM exams", [], |row| row.get(0))?;
        let total_questions: i64 =
            self.conn
                .query_row("SELECT count(id) FROM questions", [], |row| row.get(0))?;
        let total_sessions: i64 =
            self.conn
                .query_row("SELECT count(id) FROM sessions", [], |row| row.get(0))?;
        let avg_score: Option<f64> = self.conn.query_row(
            "SELECT avg(score) FROM sessions WHERE score IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(AdminStats {
            total_exams,
            total_questions,
            total_sessions,
            avg_score: avg_score.unwrap_or(0.0),
        })
    }

    pub fn question_stats(&self, exam_id: i64) -> Result<Vec<QuestionStats>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT q.id, q.question_text, q.order_index,
                    count(r.id),
                    count(CASE WHEN r.is_correct = 1 THEN 1 END)
             FROM questions q
             JOIN sections s ON q.section_id = s.id
             LEFT JOIN responses r ON r.question_id = q.id
             WHERE s.exam_id = ?1
             GROUP BY q.id
             ORDER BY q.order_index",
        )?;
        let rows = stmt.query_map([exam_id], |row| {
            let response_count: i64 = row.get(3)?;
            let correct_count: i64 = row.get(4)?;
            let accuracy = if response_count > 0 {
                correct_count as f64 / response_count as f64 * 100.0
            } else {
                0.0
            };
            Ok(QuestionStats {
                question_id: row.get(0)?,
                question_text: row.get(1)?,
                order_index: row.get(2)?,
                response_count,
                correct_count,
                accuracy,
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }
}

fn map_exam(row: &rusqlite::Row<'_>) -> rusqlite::Result<ExamRecord> {
    Ok(ExamRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        version: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRecord> {
    let mode: String = row.get(2)?;
    Ok(SessionRecord {
        id: row.get(0)?,
        exam_id: row.get(1)?,
        mode: SessionMode::from_str(&mode),
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        score: row.get(5)?,
        total_questions: row.get(6)?,
        correct_answers: row.get(7)?,
    })
}

fn map_response(row: &rusqlite::Row<'_>) -> rusqlite::Result<ResponseRecord> {
    let is_correct: Option<i64> = row.get(4)?;
    let flagged: i64 = row.get(7)?;
    Ok(ResponseRecord {
        id: row.get(0)?,
        session_id: row.get(1)?,
        question_id: row.get(2)?,
        selected_choice_id: row.get(3)?,
        is_correct: is_correct.map(|v| v != 0),
        response_time: row.get(5)?,
        notes: row.get(6)?,
        flagged: flagged != 0,
    })
}
