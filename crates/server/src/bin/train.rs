//! Play a lesson in the terminal.
//!
//! Usage: cargo run --bin train -- <lesson_id> [--exercise N]
//!        cargo run --bin train -- --list
//!
//! Type moves in coordinate form (`e2e4`, `e7e8q`). Other commands:
//! `restart`, `next`, `hint`, `board`, `quit`.
//!
//! With `RECHESS_API_URL` and `RECHESS_ACCESS_TOKEN` set, completed exercises
//! are reported to the backend; otherwise they are only logged.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use lesson_core::progress::LoggingTracker;
use lesson_core::{
    BoardView, ExerciseCompleted, LessonCatalog, PositionEngine, ProgressTracker,
    RecordingTracker, ShakmatyEngine, TrainingSession,
};
use server::clients::progress::ProgressClient;
use shakmaty::{File, Rank, Square};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

fn render_board(engine: &ShakmatyEngine) -> String {
    let mut out = String::new();
    for rank in Rank::ALL.iter().rev() {
        out.push_str(&format!(" {} ", rank.char()));
        for file in File::ALL {
            let c = engine
                .piece_at(Square::from_coords(file, *rank))
                .map(|p| p.char())
                .unwrap_or('.');
            out.push(' ');
            out.push(c);
        }
        out.push('\n');
    }
    out.push_str("    a b c d e f g h\n");
    out
}

fn print_view(session: &TrainingSession) {
    let view: BoardView = session.view();
    println!();
    println!(
        "{} | exercise {}/{}: {} | step {}/{}",
        view.lesson_title,
        view.exercise_number,
        view.exercise_count,
        view.exercise_label,
        view.step,
        view.step_count
    );
    if let Ok(engine) = session.position() {
        print!("{}", render_board(&engine));
    }
    if let Some(last) = &view.last_move {
        println!("Last move: {last}");
    }
    match &view.success_message {
        Some(message) => {
            println!("{message}");
            if view.has_next {
                println!("Type `next` for the next exercise.");
            } else {
                println!("Lesson finished. Type `restart` to play again or `quit`.");
            }
        }
        None => println!("{} to move.", view.side_to_move),
    }
}

async fn forward(events: Vec<ExerciseCompleted>, client: Option<&ProgressClient>) {
    let mut logger = LoggingTracker;
    for event in events {
        logger.notify_exercise_completed(&event);
        if let Some(client) = client {
            match client.report(&event).await {
                Ok(ack) => tracing::info!(
                    lesson_id = %ack.lesson_id,
                    status = %ack.status,
                    "Progress saved"
                ),
                Err(e) => tracing::warn!("Failed to report progress: {e}"),
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <lesson_id> [--exercise N] | --list", args[0]);
        std::process::exit(1);
    }

    let lessons_dir = env::var("LESSONS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data/lessons"));
    let (catalog, _report) = LessonCatalog::load_dir(&lessons_dir)?;

    if args[1] == "--list" {
        for summary in catalog.summaries() {
            println!("{}  {} ({} exercises)", summary.lesson_id, summary.title, summary.exercise_count);
        }
        return Ok(());
    }

    let mut start_at = 0;
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--exercise" => {
                start_at = args
                    .get(i + 1)
                    .and_then(|s| s.parse::<usize>().ok())
                    .map(|n| n.saturating_sub(1))
                    .unwrap_or(0);
                i += 2;
            }
            _ => i += 1,
        }
    }

    let Some(lesson) = catalog.get(&args[1]) else {
        eprintln!("Unknown lesson {}. Try --list.", args[1]);
        std::process::exit(1);
    };

    let client = match (env::var("RECHESS_API_URL"), env::var("RECHESS_ACCESS_TOKEN")) {
        (Ok(url), Ok(token)) => Some(ProgressClient::new(&url, &token)?),
        _ => None,
    };

    let mut session: TrainingSession = TrainingSession::open_at(Arc::clone(&lesson), start_at)?;
    let mut tracker = RecordingTracker::new();
    print_view(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => continue,
            "quit" | "exit" => break,
            "restart" => session.restart(),
            "next" => {
                if !session.has_next() {
                    println!("No more exercises in this lesson.");
                    continue;
                }
                session.next_exercise();
            }
            "hint" => {
                match session.view().expected {
                    Some(uci) => println!("Try {uci}."),
                    None => println!("Nothing to play here."),
                }
                continue;
            }
            "board" => {}
            uci => {
                let outcome = session.submit_move(uci, &mut tracker);
                if !outcome.is_ok() {
                    println!("{outcome}");
                    continue;
                }
                forward(tracker.drain(), client.as_ref()).await;
            }
        }
        print_view(&session);
    }

    Ok(())
}
