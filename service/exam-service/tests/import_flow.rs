use exam_service::{ExamService, ServiceConfig};
use exam_store::SessionMode;

const DUMP: &str = "\
Network Fundamentals Practice Test
Version 1.0

QUESTION NO: 1
Which device forwards frames by MAC address?
A. Hub
B. Switch
C. Repeater
Answer: B
Explanation: A switch keeps a MAC table and forwards per destination.

QUESTION NO: 2
Which protocol resolves names to addresses?
A. DHCP
B. DNS
Answer: B

QUESTION NO: 3
Answer: A
";

fn service_in(dir: &tempfile::TempDir) -> ExamService {
    let cfg = ServiceConfig {
        db_path: dir.path().join("exams.db"),
    };
    ExamService::new(cfg).expect("build service")
}

#[test]
fn importing_a_dump_file_reports_detected_and_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dump_path = dir.path().join("network-fundamentals.txt");
    std::fs::write(&dump_path, DUMP).expect("write dump");

    let service = service_in(&dir);
    let report = service.import_dump_file(&dump_path).expect("import");

    assert_eq!(report.title, "Network Fundamentals Practice Test");
    assert_eq!(report.detected, 3);
    assert_eq!(report.imported, 2);
    assert_eq!(report.skipped, 1);

    let exams = service.list_exams_with_counts().expect("list");
    assert_eq!(exams.len(), 1);
    assert_eq!(exams[0].exam.id, report.exam_id);
    assert_eq!(exams[0].exam.version.as_deref(), Some("V1.0"));
    assert_eq!(exams[0].question_count, 2);
    assert_eq!(
        exams[0].exam.description.as_deref(),
        Some("Imported from network-fundamentals.txt")
    );
}

#[test]
fn title_falls_back_to_the_file_stem() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dump_path = dir.path().join("ccna-dump.txt");
    std::fs::write(&dump_path, "QUESTION NO: 1\nA stem\nA. one\nB. two\nAnswer: A\n")
        .expect("write dump");

    let service = service_in(&dir);
    let report = service.import_dump_file(&dump_path).expect("import");
    assert_eq!(report.title, "ccna-dump");
}

#[test]
fn a_dump_without_markers_imports_an_empty_exam() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dump_path = dir.path().join("notes.txt");
    std::fs::write(&dump_path, "Meeting notes without any question markers.\n")
        .expect("write dump");

    let service = service_in(&dir);
    let report = service.import_dump_file(&dump_path).expect("import");
    assert_eq!(report.detected, 0);
    assert_eq!(report.imported, 0);
    assert_eq!(
        service.exam_question_count(report.exam_id).expect("count"),
        0
    );
}

#[test]
fn full_session_flow_from_import_to_score() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dump_path = dir.path().join("network-fundamentals.txt");
    std::fs::write(&dump_path, DUMP).expect("write dump");

    let service = service_in(&dir);
    let report = service.import_dump_file(&dump_path).expect("import");
    let session = service
        .create_session(report.exam_id, SessionMode::Exam)
        .expect("session");
    assert_eq!(session.total_questions, 2);

    let first = service
        .first_question(session.id)
        .expect("query first")
        .expect("first exists");
    let second = service
        .next_question(session.id, first.id)
        .expect("query next")
        .expect("second exists");

    // First right, second wrong.
    let switch = first
        .choices
        .iter()
        .find(|c| c.choice_text == "Switch")
        .expect("switch choice");
    service
        .save_response(session.id, first.id, Some(switch.id), "", false)
        .expect("save first");
    let dhcp = second
        .choices
        .iter()
        .find(|c| c.choice_text == "DHCP")
        .expect("dhcp choice");
    service
        .save_response(session.id, second.id, Some(dhcp.id), "", false)
        .expect("save second");

    let progress = service.session_progress(session.id).expect("progress");
    assert_eq!(progress.answered_count, 2);
    assert_eq!(progress.correct_count, 1);
    assert!((progress.progress_percentage - 100.0).abs() < 1e-9);

    let submitted = service.submit_session(session.id).expect("submit");
    assert_eq!(submitted.correct_answers, 1);
    assert!((submitted.score.expect("score") - 50.0).abs() < 1e-9);

    let result = service
        .question_result(session.id, first.id)
        .expect("result");
    assert_eq!(result.is_correct, Some(true));
    assert_eq!(result.correct_answer.as_deref(), Some("B"));
    assert_eq!(
        result.explanation.as_deref(),
        Some("A switch keeps a MAC table and forwards per destination.")
    );

    let stats = service.admin_stats().expect("stats");
    assert_eq!(stats.total_sessions, 1);
    assert!((stats.avg_score - 50.0).abs() < 1e-9);
}

#[test]
fn quiz_round_answers_by_letter_and_scores_at_the_end() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dump_path = dir.path().join("network-fundamentals.txt");
    std::fs::write(&dump_path, DUMP).expect("write dump");

    let service = service_in(&dir);
    let report = service.import_dump_file(&dump_path).expect("import");
    let session = service
        .create_session(report.exam_id, SessionMode::Exam)
        .expect("session");

    // Walk the round the way the terminal quiz does: resolve typed letters
    // against choice labels, save a skip as no selection, stop at the end.
    let picks = ["B", ""];
    let mut answered = 0usize;
    let mut current = service.first_question(session.id).expect("first");
    while let Some(question) = current {
        let picked = picks[answered];
        let selected = question
            .choices
            .iter()
            .find(|c| c.choice_label == picked)
            .map(|c| c.id);
        assert_eq!(selected.is_none(), picked.is_empty());
        service
            .save_response(session.id, question.id, selected, "", false)
            .expect("save");
        answered += 1;
        current = service
            .next_question(session.id, question.id)
            .expect("next");
    }
    assert_eq!(answered, 2);

    let submitted = service.submit_session(session.id).expect("submit");
    assert_eq!(submitted.correct_answers, 1);
    assert!((submitted.score.expect("score") - 50.0).abs() < 1e-9);

    let progress = service.session_progress(session.id).expect("progress");
    assert_eq!(progress.answered_count, 2);
    assert_eq!(progress.correct_count, 1);
}

#[test]
fn deleting_an_imported_exam_removes_its_sessions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dump_path = dir.path().join("network-fundamentals.txt");
    std::fs::write(&dump_path, DUMP).expect("write dump");

    let service = service_in(&dir);
    let report = service.import_dump_file(&dump_path).expect("import");
    let session = service
        .create_session(report.exam_id, SessionMode::Study)
        .expect("session");

    assert!(service.delete_exam(report.exam_id).expect("delete"));
    assert!(service
        .get_exam(report.exam_id)
        .expect("query exam")
        .is_none());
    assert!(service
        .get_session(session.id)
        .expect("query session")
        .is_none());
    assert!(!service.delete_exam(report.exam_id).expect("delete again"));
}

#[test]
fn database_persists_across_service_instances() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dump_path = dir.path().join("network-fundamentals.txt");
    std::fs::write(&dump_path, DUMP).expect("write dump");

    let report = {
        let service = service_in(&dir);
        service.import_dump_file(&dump_path).expect("import")
    };

    let reopened = service_in(&dir);
    let exam = reopened
        .get_exam(report.exam_id)
        .expect("query exam")
        .expect("exam survived reopen");
    assert_eq!(exam.title, report.title);
}
