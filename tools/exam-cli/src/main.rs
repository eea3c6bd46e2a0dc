use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use exam_service::{ExamService, ServiceConfig};
use exam_store::SessionMode;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    eprintln!(
        "Usage:\n\
         exam-cli import FILE [--db PATH]\n\
         exam-cli list [--json] [--db PATH]\n\
         exam-cli quiz EXAM_ID [--db PATH]\n\
         exam-cli questions EXAM_ID [--db PATH]\n\
         exam-cli delete EXAM_ID [--db PATH]\n\
         exam-cli stats [--db PATH]\n\
         exam-cli sessions [--limit N] [--db PATH]\n\
         \n\
         Notes: FILE is a question dump (.pdf, or plain text);\n\
         db defaults to target/demo/exams.db\n"
    );
}

fn build_service(args: &[String]) -> Result<ExamService, String> {
    let mut cfg = ServiceConfig::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--db" => {
                if i + 1 < args.len() {
                    cfg.db_path = PathBuf::from(&args[i + 1]);
                    i += 2;
                } else {
                    return Err("--db requires path".into());
                }
            }
            _ => i += 1,
        }
    }
    ExamService::new(cfg).map_err(|e| e.to_string())
}

// Positional arguments come before the flags.
fn positional(args: &[String]) -> Option<&String> {
    args.first().filter(|a| !a.starts_with('-'))
}

fn parse_exam_id(args: &[String]) -> Result<i64, String> {
    let raw = positional(args).ok_or("EXAM_ID required")?;
    raw.parse().map_err(|_| format!("invalid exam id: {raw}"))
}

fn do_import(args: Vec<String>) -> Result<(), String> {
    let file = positional(&args).cloned().ok_or("FILE required")?;
    let service = build_service(&args)?;
    let report = service.import_dump_file(&file).map_err(|e| e.to_string())?;
    println!(
        "Imported exam {} ({}): {} of {} detected questions stored, {} skipped",
        report.exam_id, report.title, report.imported, report.detected, report.skipped
    );
    Ok(())
}

fn do_list(args: Vec<String>) -> Result<(), String> {
    let service = build_service(&args)?;
    let exams = service.list_exams_with_counts().map_err(|e| e.to_string())?;
    if args.iter().any(|a| a == "--json") {
        let out = serde_json::to_string_pretty(&exams).map_err(|e| e.to_string())?;
        println!("{out}");
        return Ok(());
    }
    if exams.is_empty() {
        println!("No exams stored.");
        return Ok(());
    }
    for entry in exams {
        let version = entry.exam.version.as_deref().unwrap_or("-");
        println!(
            "{:>4}  {}  version={}  questions={}  created={}",
            entry.exam.id, entry.exam.title, version, entry.question_count, entry.exam.created_at
        );
    }
    Ok(())
}

fn do_questions(args: Vec<String>) -> Result<(), String> {
    let exam_id = parse_exam_id(&args)?;
    let service = build_service(&args)?;
    let stats = service.question_stats(exam_id).map_err(|e| e.to_string())?;
    if stats.is_empty() {
        println!("No questions for exam {exam_id}.");
        return Ok(());
    }
    for q in stats {
        let preview = truncate_chars(&q.question_text, 60);
        println!(
            "{:>4}. responses={} correct={} accuracy={:.1}%  {}",
            q.order_index, q.response_count, q.correct_count, q.accuracy, preview
        );
    }
    Ok(())
}

// One throwaway exam round on the terminal: walk the questions in order,
// answer by letter (empty input skips), then submit and print the score.
fn do_quiz(args: Vec<String>) -> Result<(), String> {
    let exam_id = parse_exam_id(&args)?;
    let service = build_service(&args)?;
    let exam = service
        .get_exam(exam_id)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("exam {exam_id} not found"))?;
    let session = service
        .create_session(exam_id, SessionMode::Exam)
        .map_err(|e| e.to_string())?;
    println!(
        "{} ({} questions). Answer with a letter, or press Enter to skip.",
        exam.title, session.total_questions
    );

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut current = service
        .first_question(session.id)
        .map_err(|e| e.to_string())?;
    while let Some(question) = current {
        println!("\n{}. {}", question.order_index, question.question_text);
        for choice in &question.choices {
            println!("  {}. {}", choice.choice_label, choice.choice_text);
        }
        print!("> ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        let mut line = String::new();
        let read = input.read_line(&mut line).map_err(|e| e.to_string())?;
        if read == 0 {
            // End of input: submit what was answered so far.
            break;
        }
        let picked = line.trim().to_ascii_uppercase();
        let selected = question
            .choices
            .iter()
            .find(|c| c.choice_label == picked)
            .map(|c| c.id);
        service
            .save_response(session.id, question.id, selected, "", false)
            .map_err(|e| e.to_string())?;

        current = service
            .next_question(session.id, question.id)
            .map_err(|e| e.to_string())?;
    }

    let submitted = service
        .submit_session(session.id)
        .map_err(|e| e.to_string())?;
    println!(
        "\nScore: {:.1}% ({}/{} correct)",
        submitted.score.unwrap_or(0.0),
        submitted.correct_answers,
        submitted.total_questions
    );
    Ok(())
}

fn do_delete(args: Vec<String>) -> Result<(), String> {
    let exam_id = parse_exam_id(&args)?;
    let service = build_service(&args)?;
    if service.delete_exam(exam_id).map_err(|e| e.to_string())? {
        println!("Deleted exam {exam_id} and all of its sessions.");
    } else {
        println!("Exam {exam_id} not found.");
    }
    Ok(())
}

fn do_stats(args: Vec<String>) -> Result<(), String> {
    let service = build_service(&args)?;
    let stats = service.admin_stats().map_err(|e| e.to_string())?;
    println!(
        "exams={} questions={} sessions={} avg_score={:.1}%",
        stats.total_exams, stats.total_questions, stats.total_sessions, stats.avg_score
    );
    Ok(())
}

fn do_sessions(args: Vec<String>) -> Result<(), String> {
    let mut limit: usize = 10;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--limit" => {
                if i + 1 < args.len() {
                    limit = args[i + 1].parse().unwrap_or(10);
                    i += 2;
                } else {
                    return Err("--limit requires number".into());
                }
            }
            _ => i += 1,
        }
    }
    let service = build_service(&args)?;
    let sessions = service.recent_sessions(limit).map_err(|e| e.to_string())?;
    if sessions.is_empty() {
        println!("No sessions recorded.");
        return Ok(());
    }
    for s in sessions {
        let score = s
            .score
            .map(|v| format!("{v:.1}%"))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:>4}  exam={} mode={} started={} score={} correct={}/{}",
            s.id,
            s.exam_id,
            s.mode.as_str(),
            s.start_time,
            score,
            s.correct_answers,
            s.total_questions
        );
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        return;
    }
    let cmd = args.remove(0);
    let res = match cmd.as_str() {
        "import" => do_import(args),
        "list" => do_list(args),
        "quiz" => do_quiz(args),
        "questions" => do_questions(args),
        "delete" => do_delete(args),
        "stats" => do_stats(args),
        "sessions" => do_sessions(args),
        _ => {
            print_usage();
            return;
        }
    };
    if let Err(err) = res {
        eprintln!("Error: {}", err);
        print_usage();
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    let mut it = s.chars();
    let truncated: String = it.by_ref().take(max_chars).collect();
    if it.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}
