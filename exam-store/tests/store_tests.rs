use dump_parser::parse_text;
use exam_store::sqlite_repo::ExamRepo;
use exam_store::{SessionMode, StoreError};

const SAMPLE_DUMP: &str = "\
Sample Cloud Associate
Version 2.1

QUESTION NO: 1
Which service stores objects?
A. Object storage
B. Block storage
C. Message queue
Answer: A
Explanation: Object storage keeps immutable blobs addressed by key.

QUESTION NO: 2
Which port does HTTPS use by default?
A. 80
B. 443
Answer: B

QUESTION NO: 3
Which of these is a relational database?
A. A key-value cache
B. A SQL server
";

fn seeded_repo() -> (ExamRepo, i64) {
    let mut repo = ExamRepo::new();
    let parsed = parse_text(SAMPLE_DUMP);
    let exam_id = repo
        .insert_bank(
            "Sample Cloud Associate",
            Some("V2.1"),
            None,
            &parsed.bank,
        )
        .expect("insert bank");
    (repo, exam_id)
}

#[test]
fn inserted_bank_round_trips_through_queries() {
    let (repo, exam_id) = seeded_repo();

    let exam = repo
        .get_exam(exam_id)
        .expect("query exam")
        .expect("exam exists");
    assert_eq!(exam.title, "Sample Cloud Associate");
    assert_eq!(exam.version.as_deref(), Some("V2.1"));
    assert_eq!(repo.exam_question_count(exam_id).expect("count"), 3);

    let sections = repo.exam_sections(exam_id).expect("sections");
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].order_index, 0);

    let listed = repo.list_exams_with_counts().expect("list with counts");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].exam.id, exam_id);
    assert_eq!(listed[0].question_count, 3);
}

#[test]
fn questions_carry_choices_in_source_order() {
    let (repo, exam_id) = seeded_repo();
    let session = repo
        .create_session(exam_id, SessionMode::Exam)
        .expect("session");

    let questions = repo.session_questions(session.id).expect("questions");
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0].order_index, 1);
    assert_eq!(questions[0].choices.len(), 3);
    assert_eq!(questions[0].choices[0].choice_label, "A");
    assert_eq!(questions[0].choices[0].choice_text, "Object storage");
    assert_eq!(questions[1].choices.len(), 2);
}

#[test]
fn navigation_walks_order_indices_and_stops_at_the_edges() {
    let (repo, exam_id) = seeded_repo();
    let session = repo
        .create_session(exam_id, SessionMode::Exam)
        .expect("session");

    let first = repo
        .first_question(session.id)
        .expect("query first")
        .expect("exam has questions");
    assert_eq!(first.order_index, 1);
    assert!(repo
        .previous_question(session.id, first.id)
        .expect("query previous")
        .is_none());

    let second = repo
        .next_question(session.id, first.id)
        .expect("query next")
        .expect("second exists");
    assert_eq!(second.order_index, 2);

    let third = repo
        .next_question(session.id, second.id)
        .expect("query next")
        .expect("third exists");
    assert!(repo
        .next_question(session.id, third.id)
        .expect("query next")
        .is_none());
}

#[test]
fn session_snapshots_question_total_at_creation() {
    let (repo, exam_id) = seeded_repo();
    let session = repo
        .create_session(exam_id, SessionMode::Study)
        .expect("session");
    assert_eq!(session.exam_id, exam_id);
    assert_eq!(session.mode, SessionMode::Study);
    assert_eq!(session.total_questions, 3);
    assert!(session.end_time.is_none());
    assert!(session.score.is_none());
}

#[test]
fn saving_a_response_twice_updates_in_place() {
    let (repo, exam_id) = seeded_repo();
    let session = repo
        .create_session(exam_id, SessionMode::Exam)
        .expect("session");
    let first = repo
        .first_question(session.id)
        .expect("query first")
        .expect("first exists");
    let wrong = first.choices[1].id;
    let right = first.choices[0].id;

    let saved = repo
        .save_response(session.id, first.id, Some(wrong), "", false)
        .expect("save");
    assert_eq!(saved.is_correct, Some(false));

    let updated = repo
        .save_response(session.id, first.id, Some(right), "double checked", true)
        .expect("resave");
    assert_eq!(updated.id, saved.id);
    assert_eq!(updated.is_correct, Some(true));
    assert_eq!(updated.notes, "double checked");
    assert!(updated.flagged);

    let progress = repo.session_progress(session.id).expect("progress");
    assert_eq!(progress.answered_count, 1);
    assert_eq!(progress.correct_count, 1);
}

#[test]
fn correctness_is_null_without_a_selection_or_a_stored_answer() {
    let (repo, exam_id) = seeded_repo();
    let session = repo
        .create_session(exam_id, SessionMode::Exam)
        .expect("session");
    let questions = repo.session_questions(session.id).expect("questions");

    let flag_only = repo
        .save_response(session.id, questions[0].id, None, "come back later", true)
        .expect("save without selection");
    assert_eq!(flag_only.is_correct, None);

    // Question 3 has no answer key, so any selection stays unevaluated.
    let unkeyed = &questions[2];
    let saved = repo
        .save_response(session.id, unkeyed.id, Some(unkeyed.choices[1].id), "", false)
        .expect("save on unkeyed question");
    assert_eq!(saved.is_correct, None);
}

#[test]
fn submitting_scores_correct_responses_against_the_snapshot() {
    let (repo, exam_id) = seeded_repo();
    let session = repo
        .create_session(exam_id, SessionMode::Exam)
        .expect("session");
    let questions = repo.session_questions(session.id).expect("questions");

    // Q1 right (A), Q2 wrong (A instead of B), Q3 unkeyed.
    repo.save_response(session.id, questions[0].id, Some(questions[0].choices[0].id), "", false)
        .expect("save q1");
    repo.save_response(session.id, questions[1].id, Some(questions[1].choices[0].id), "", false)
        .expect("save q2");

    let submitted = repo.submit_session(session.id).expect("submit");
    assert!(submitted.end_time.is_some());
    assert_eq!(submitted.correct_answers, 1);
    let score = submitted.score.expect("score set");
    assert!((score - 100.0 / 3.0).abs() < 1e-9);
}

#[test]
fn question_result_reports_key_and_explanation() {
    let (repo, exam_id) = seeded_repo();
    let session = repo
        .create_session(exam_id, SessionMode::Study)
        .expect("session");
    let first = repo
        .first_question(session.id)
        .expect("query first")
        .expect("first exists");

    let before = repo
        .question_result(session.id, first.id)
        .expect("result before answering");
    assert!(before.correct_answer.is_none());

    repo.save_response(session.id, first.id, Some(first.choices[0].id), "", false)
        .expect("save");
    let after = repo
        .question_result(session.id, first.id)
        .expect("result after answering");
    assert_eq!(after.is_correct, Some(true));
    assert_eq!(after.correct_answer.as_deref(), Some("A"));
    assert_eq!(
        after.explanation.as_deref(),
        Some("Object storage keeps immutable blobs addressed by key.")
    );
}

#[test]
fn deleting_an_exam_cascades_to_all_dependents() {
    let (repo, exam_id) = seeded_repo();
    let session = repo
        .create_session(exam_id, SessionMode::Exam)
        .expect("session");
    let first = repo
        .first_question(session.id)
        .expect("query first")
        .expect("first exists");
    repo.save_response(session.id, first.id, Some(first.choices[0].id), "", false)
        .expect("save");

    assert!(repo.delete_exam(exam_id).expect("delete"));
    assert!(repo.get_exam(exam_id).expect("query exam").is_none());
    assert!(repo.get_session(session.id).expect("query session").is_none());
    assert!(repo.get_question(first.id).expect("query question").is_none());
    assert!(repo
        .get_response(session.id, first.id)
        .expect("query response")
        .is_none());

    let stats = repo.admin_stats().expect("stats");
    assert_eq!(stats.total_exams, 0);
    assert_eq!(stats.total_questions, 0);
    assert_eq!(stats.total_sessions, 0);

    assert!(!repo.delete_exam(exam_id).expect("delete missing"));
}

#[test]
fn missing_session_surfaces_as_not_found() {
    let repo = ExamRepo::new();
    match repo.submit_session(999) {
        Err(StoreError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn question_stats_track_response_accuracy() {
    let (repo, exam_id) = seeded_repo();
    let s1 = repo
        .create_session(exam_id, SessionMode::Exam)
        .expect("session one");
    let s2 = repo
        .create_session(exam_id, SessionMode::Exam)
        .expect("session two");
    let first = repo
        .first_question(s1.id)
        .expect("query first")
        .expect("first exists");

    repo.save_response(s1.id, first.id, Some(first.choices[0].id), "", false)
        .expect("save right");
    repo.save_response(s2.id, first.id, Some(first.choices[1].id), "", false)
        .expect("save wrong");

    let stats = repo.question_stats(exam_id).expect("question stats");
    assert_eq!(stats.len(), 3);
    assert_eq!(stats[0].response_count, 2);
    assert_eq!(stats[0].correct_count, 1);
    assert!((stats[0].accuracy - 50.0).abs() < 1e-9);
    assert_eq!(stats[2].response_count, 0);
    assert!((stats[2].accuracy - 0.0).abs() < 1e-9);
}
