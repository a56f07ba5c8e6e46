#![forbid(unsafe_code)]

mod poll;
mod render;
mod session_log;

use sd_core::{Catalog, CompareMode, Exercise, ExerciseId, ExerciseStatus, SqlValue};
use sd_engine::SqliteEngine;
use sd_session::{LabSession, SessionConfig, SubmitOutcome};
use sd_storage::{AttemptOutcome, RecordAttemptRequest, SqliteProgressStore};
use session_log::SessionLog;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

type DrillSession = LabSession<SqliteEngine, SqliteProgressStore>;

const HISTORY_DEFAULT_LIMIT: usize = 20;
const IDLE_TICK_MS: i64 = 200;

#[derive(Debug)]
struct CliConfig {
    storage_dir: PathBuf,
    catalog_path: Option<PathBuf>,
    exercise: Option<i64>,
    advance_delay_ms: i64,
    compare_mode: CompareMode,
    reset_progress: bool,
}

fn usage() -> &'static str {
    "sqldrill — practice SQL one exercise at a time, against a local sandbox\n\n\
USAGE:\n\
  sqldrill [--storage-dir DIR] [--catalog FILE] [--exercise N]\n\
           [--advance-delay-ms MS] [--unordered] [--reset-progress]\n\n\
NOTES:\n\
  - SQL typed at the prompt runs against a scratch database; `.reset` rebuilds\n\
    the tables, so nothing you try can damage your progress.\n\
  - `.submit` re-runs your last query on a fresh schema and compares its rows\n\
    against the reference solution. Row order counts unless --unordered.\n\
  - Progress lives in DIR (default ./.sqldrill). SQLDRILL_STORAGE_DIR and\n\
    SQLDRILL_ADVANCE_DELAY_MS are honored when the flags are absent.\n"
}

fn command_help() -> &'static str {
    "Commands:\n\
  .submit        check your last query against the expected answer\n\
  .hint          show the hint for the current exercise\n\
  .schema        show the tables in the practice sandbox\n\
  .list          list all exercises with their status\n\
  .progress      summarize completion\n\
  .history [n]   show the latest attempts (default 20)\n\
  .goto N        jump to exercise N\n\
  .next / .prev  step through the curriculum\n\
  .reset         rebuild the sandbox schema from scratch\n\
  .stay          cancel a scheduled jump to the next exercise\n\
  .help          this text\n\
  .quit          leave (progress is already saved)\n\
Anything else is SQL; statements end with ';'.\n"
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn now_ms_i64() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    let ms = nanos / 1_000_000i128;
    if ms <= 0 {
        0
    } else if ms >= i64::MAX as i128 {
        i64::MAX
    } else {
        ms as i64
    }
}

fn ts_ms_to_rfc3339(ts_ms: i64) -> String {
    let nanos = (ts_ms as i128) * 1_000_000i128;
    let dt = OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or(OffsetDateTime::UNIX_EPOCH);
    dt.format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

fn parse_args() -> Result<CliConfig, String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print!("{}", usage());
        std::process::exit(0);
    }
    if args.iter().any(|a| a == "--version") {
        println!("sqldrill {}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    let mut storage_dir: Option<PathBuf> = env_var("SQLDRILL_STORAGE_DIR").map(PathBuf::from);
    let mut catalog_path: Option<PathBuf> = None;
    let mut exercise: Option<i64> = None;
    let mut advance_delay_ms: i64 = env_var("SQLDRILL_ADVANCE_DELAY_MS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(sd_session::DEFAULT_ADVANCE_DELAY_MS);
    let mut compare_mode = CompareMode::Strict;
    let mut reset_progress = false;

    let mut i = 0usize;
    while i < args.len() {
        let a = args[i].as_str();
        match a {
            "--storage-dir" => {
                i += 1;
                let v = args.get(i).ok_or("--storage-dir requires DIR")?;
                storage_dir = Some(PathBuf::from(v));
            }
            "--catalog" => {
                i += 1;
                let v = args.get(i).ok_or("--catalog requires FILE")?;
                catalog_path = Some(PathBuf::from(v));
            }
            "--exercise" => {
                i += 1;
                let v = args.get(i).ok_or("--exercise requires N")?;
                exercise = Some(
                    v.parse::<i64>()
                        .map_err(|_| "--exercise must be an integer exercise number")?,
                );
            }
            "--advance-delay-ms" => {
                i += 1;
                let v = args.get(i).ok_or("--advance-delay-ms requires MS")?;
                advance_delay_ms = v
                    .parse::<i64>()
                    .map_err(|_| "--advance-delay-ms must be an integer (milliseconds)")?;
            }
            "--unordered" => compare_mode = CompareMode::OrderInsensitive,
            "--reset-progress" => reset_progress = true,
            other => return Err(format!("Unknown arg: {other}\n\n{}", usage())),
        }
        i += 1;
    }

    Ok(CliConfig {
        storage_dir: storage_dir.unwrap_or_else(|| PathBuf::from(".sqldrill")),
        catalog_path,
        exercise,
        advance_delay_ms,
        compare_mode,
        reset_progress,
    })
}

fn fatal(log: &mut SessionLog, message: &str) -> ! {
    log.note_error(message);
    log.note_exit("startup-error");
    eprintln!("{message}");
    std::process::exit(2);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = parse_args().map_err(|e| {
        eprintln!("{e}");
        std::process::exit(2);
    })?;

    let mut log = SessionLog::new(&cfg.storage_dir);

    let catalog = match &cfg.catalog_path {
        Some(path) => {
            let raw = match std::fs::read_to_string(path) {
                Ok(raw) => raw,
                Err(err) => fatal(
                    &mut log,
                    &format!("cannot read catalog {}: {err}", path.display()),
                ),
            };
            match Catalog::from_json_str(&raw) {
                Ok(catalog) => catalog,
                Err(err) => fatal(
                    &mut log,
                    &format!("invalid catalog {}: {err}", path.display()),
                ),
            }
        }
        None => Catalog::builtin(),
    };

    let mut store = match SqliteProgressStore::open(&cfg.storage_dir) {
        Ok(store) => store,
        Err(err) => fatal(
            &mut log,
            &format!(
                "cannot open the progress store in {}: {err}",
                cfg.storage_dir.display()
            ),
        ),
    };
    if cfg.reset_progress {
        match store.clear_record() {
            Ok(true) => println!("Progress cleared."),
            Ok(false) => println!("No saved progress to clear."),
            Err(err) => fatal(&mut log, &format!("cannot reset progress: {err}")),
        }
    }

    let engine = match SqliteEngine::in_memory() {
        Ok(engine) => engine,
        Err(err) => fatal(
            &mut log,
            &format!("cannot open the practice database: {err}"),
        ),
    };

    let session_config = SessionConfig {
        advance_delay_ms: cfg.advance_delay_ms,
        compare_mode: cfg.compare_mode,
    };
    let mut session = LabSession::start(catalog, engine, store, session_config);
    if let Some(err) = session.take_load_error() {
        warn(
            &mut log,
            &format!("failed to load saved progress ({err}); starting fresh"),
        );
    }

    println!("sqldrill {}", env!("CARGO_PKG_VERSION"));
    println!(
        "Type SQL ending with ';' to run it. .submit checks your answer, .help lists commands."
    );

    match session.enter(cfg.exercise.map(ExerciseId::new)) {
        Ok(outcome) => {
            if let Some(from) = outcome.redirected_from {
                println!(
                    "Exercise {from} is not open yet. Starting at exercise {} instead.",
                    outcome.exercise.id
                );
            }
            print_exercise(&outcome.exercise);
            journal(
                &mut session,
                &mut log,
                outcome.exercise.id,
                AttemptOutcome::Entered,
                None,
            );
            report_save_warning(&mut session, &mut log);
        }
        Err(err) => fatal(&mut log, &format!("cannot start the session: {err}")),
    }

    run_repl(&mut session, &mut log)
}

fn run_repl(
    session: &mut DrillSession,
    log: &mut SessionLog,
) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let mut pending_sql = String::new();
    let mut last_sql: Option<String> = None;

    loop {
        print_prompt(pending_sql.is_empty());

        // Idle wait: a due auto-advance must fire without a keypress.
        while let Some(pending) = session.pending_advance() {
            if !reader.buffer().is_empty() {
                break;
            }
            let now = now_ms_i64();
            if now >= pending.fire_at_ms {
                fire_advance(session, log, now);
                print_prompt(pending_sql.is_empty());
                continue;
            }
            let wait_ms = (pending.fire_at_ms - now).clamp(1, IDLE_TICK_MS) as u64;
            if poll::wait_stdin_readable(Duration::from_millis(wait_ms)) {
                break;
            }
        }

        let mut line = String::new();
        let read = match reader.read_line(&mut line) {
            Ok(read) => read,
            Err(err) => {
                log.note_error(&format!("stdin: {err}"));
                log.note_exit("io-error");
                return Err(Box::new(err));
            }
        };
        if read == 0 {
            println!();
            log.note_exit("eof");
            break;
        }

        let trimmed = line.trim();
        if pending_sql.is_empty() {
            if trimmed.is_empty() {
                continue;
            }
            if let Some(command) = trimmed.strip_prefix('.') {
                log.note_command(trimmed);
                if !dispatch_command(session, log, command, &mut last_sql) {
                    log.note_exit("quit");
                    break;
                }
                continue;
            }
        }

        if !pending_sql.is_empty() {
            pending_sql.push('\n');
        }
        pending_sql.push_str(line.trim_end());
        if statement_terminated(&pending_sql) {
            let sql = std::mem::take(&mut pending_sql);
            run_sql(session, log, &sql, &mut last_sql);
        }
    }

    Ok(())
}

fn print_prompt(fresh: bool) {
    let prompt = if fresh { "sql> " } else { "  -> " };
    print!("{prompt}");
    let _ = std::io::stdout().flush();
}

fn statement_terminated(sql: &str) -> bool {
    sql.trim_end().ends_with(';')
}

fn split_command(command: &str) -> (&str, &str) {
    match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    }
}

/// Returns false when the learner asked to leave.
fn dispatch_command(
    session: &mut DrillSession,
    log: &mut SessionLog,
    command: &str,
    last_sql: &mut Option<String>,
) -> bool {
    let (name, rest) = split_command(command);
    match name {
        "submit" => submit_last(session, log, last_sql.as_deref()),
        "hint" => print_hint(session),
        "schema" => print_schema(session),
        "list" => print_list(session),
        "progress" => print_progress(session),
        "history" => print_history(session, log, rest),
        "goto" => match rest.parse::<i64>() {
            Ok(id) => enter_exercise(session, log, Some(ExerciseId::new(id))),
            Err(_) => println!("Usage: .goto N (exercise numbers come from .list)"),
        },
        "next" => goto_next(session, log),
        "prev" => goto_prev(session, log),
        "reset" => reset_current(session, log),
        "stay" => {
            if session.cancel_pending_advance() {
                println!("Staying here.");
            } else {
                println!("No pending jump to cancel.");
            }
        }
        "help" => print!("{}", command_help()),
        "quit" | "exit" => return false,
        other => println!("Unknown command: .{other} (try .help)"),
    }
    true
}

fn run_sql(
    session: &mut DrillSession,
    log: &mut SessionLog,
    sql: &str,
    last_sql: &mut Option<String>,
) {
    let Some(exercise_id) = session.current_exercise().map(|ex| ex.id) else {
        println!("Error: no active exercise");
        return;
    };
    *last_sql = Some(sql.to_string());
    match session.run(sql) {
        Ok(result) => {
            print!("{}", render::render_result(&result));
            journal(session, log, exercise_id, AttemptOutcome::Ran, Some(sql));
        }
        Err(err) => {
            println!("Error: {err}");
            journal(session, log, exercise_id, AttemptOutcome::Error, Some(sql));
        }
    }
}

fn submit_last(session: &mut DrillSession, log: &mut SessionLog, last_sql: Option<&str>) {
    let Some(sql) = last_sql else {
        println!("Nothing to submit yet. Run your query first (end it with ';').");
        return;
    };
    let sql = sql.to_string();
    let Some(exercise_id) = session.current_exercise().map(|ex| ex.id) else {
        println!("Error: no active exercise");
        return;
    };

    let now = now_ms_i64();
    match session.submit(&sql, now) {
        Ok(SubmitOutcome::Correct { result, advance, .. }) => {
            print!("{}", render::render_result(&result));
            println!();
            println!("Correct!");
            journal(session, log, exercise_id, AttemptOutcome::Passed, Some(&sql));
            report_save_warning(session, log);
            match advance {
                Some(advance) => println!(
                    "Moving to exercise {} in {} (.stay to cancel).",
                    advance.target,
                    format_delay(advance.fire_at_ms.saturating_sub(now))
                ),
                None => println!(
                    "That was the last one. All {} exercises are complete!",
                    session.catalog().len()
                ),
            }
        }
        Ok(SubmitOutcome::Incorrect { result }) => {
            print!("{}", render::render_result(&result));
            println!();
            println!("Incorrect result. Try again!");
            journal(
                session,
                log,
                exercise_id,
                AttemptOutcome::Mismatch,
                Some(&sql),
            );
        }
        Ok(SubmitOutcome::EngineError { error }) => {
            println!("Error: {error}");
            journal(session, log, exercise_id, AttemptOutcome::Error, Some(&sql));
        }
        Err(err) => report_error(log, &err.to_string()),
    }
}

fn enter_exercise(session: &mut DrillSession, log: &mut SessionLog, requested: Option<ExerciseId>) {
    match session.enter(requested) {
        Ok(outcome) => {
            if let Some(from) = outcome.redirected_from {
                println!(
                    "Exercise {from} is not open yet. Taking you to exercise {} instead.",
                    outcome.exercise.id
                );
            }
            print_exercise(&outcome.exercise);
            journal(
                session,
                log,
                outcome.exercise.id,
                AttemptOutcome::Entered,
                None,
            );
            report_save_warning(session, log);
        }
        Err(err) => report_error(log, &err.to_string()),
    }
}

fn fire_advance(session: &mut DrillSession, log: &mut SessionLog, now_ms: i64) {
    let Some(outcome) = session.poll_advance(now_ms) else {
        return;
    };
    match outcome {
        Ok(entered) => {
            print_exercise(&entered.exercise);
            journal(
                session,
                log,
                entered.exercise.id,
                AttemptOutcome::Entered,
                None,
            );
            report_save_warning(session, log);
        }
        Err(err) => report_error(log, &err.to_string()),
    }
}

fn goto_next(session: &mut DrillSession, log: &mut SessionLog) {
    let Some(current) = session.current_exercise().map(|ex| ex.id) else {
        println!("Error: no active exercise");
        return;
    };
    let next = session.catalog().next_after(current).map(|ex| ex.id);
    match next {
        Some(id) => enter_exercise(session, log, Some(id)),
        None => println!("This is the last exercise."),
    }
}

fn goto_prev(session: &mut DrillSession, log: &mut SessionLog) {
    let Some(current) = session.current_exercise().map(|ex| ex.id) else {
        println!("Error: no active exercise");
        return;
    };
    let previous = session
        .catalog()
        .position(current)
        .and_then(|index| index.checked_sub(1))
        .and_then(|index| session.catalog().list_all().get(index))
        .map(|ex| ex.id);
    match previous {
        Some(id) => enter_exercise(session, log, Some(id)),
        None => println!("This is the first exercise."),
    }
}

fn reset_current(session: &mut DrillSession, log: &mut SessionLog) {
    let Some(current) = session.current_exercise().map(|ex| ex.id) else {
        println!("Error: no active exercise");
        return;
    };
    match session.enter(Some(current)) {
        Ok(_) => {
            println!("Schema rebuilt; the tables are back to their starting state.");
            journal(session, log, current, AttemptOutcome::Entered, None);
            report_save_warning(session, log);
        }
        Err(err) => report_error(log, &err.to_string()),
    }
}

fn print_exercise(exercise: &Exercise) {
    println!();
    println!("--- Exercise {}: {} ---", exercise.id, exercise.title);
    println!("{}", exercise.description.trim());
    println!();
}

fn print_hint(session: &DrillSession) {
    match session.current_exercise().and_then(|ex| ex.hint.as_deref()) {
        Some(hint) => println!("Hint: {hint}"),
        None => println!("No hint for this exercise."),
    }
}

fn print_schema(session: &mut DrillSession) {
    // Internal query; leaves `.submit` state and the attempt journal alone.
    let ddl_sql = "SELECT name, sql FROM sqlite_master \
                   WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' ORDER BY name";
    match session.run(ddl_sql) {
        Ok(result) if result.rows.is_empty() => println!("The sandbox has no tables."),
        Ok(result) => {
            for row in &result.rows {
                if let Some(SqlValue::Text(ddl)) = row.get(1) {
                    println!("{ddl};");
                }
            }
        }
        Err(err) => println!("Error: {err}"),
    }
}

fn print_list(session: &DrillSession) {
    let current = session.current_exercise().map(|ex| ex.id);
    for (id, status) in session.statuses() {
        let Some(exercise) = session.catalog().get_by_id(id) else {
            continue;
        };
        let marker = match status {
            ExerciseStatus::Completed => "done",
            ExerciseStatus::Unlocked => "open",
            ExerciseStatus::Locked => "lock",
        };
        let cursor = if current == Some(id) { '>' } else { ' ' };
        println!("{cursor} {:>3}. [{marker}] {}", id.get(), exercise.title);
    }
}

fn print_progress(session: &DrillSession) {
    let done = session.progress().completed_count();
    let total = session.catalog().len();
    println!("Completed {done} of {total} exercises.");
    if let Some(exercise) = session.current_exercise() {
        println!("Currently on exercise {}: {}", exercise.id, exercise.title);
    }
}

fn print_history(session: &DrillSession, log: &mut SessionLog, rest: &str) {
    let limit = if rest.is_empty() {
        HISTORY_DEFAULT_LIMIT
    } else {
        match rest.parse::<usize>() {
            Ok(limit) if limit > 0 => limit,
            _ => {
                println!("Usage: .history [n]");
                return;
            }
        }
    };
    match session.store().list_attempts(None, limit) {
        Ok(rows) if rows.is_empty() => println!("No attempts recorded yet."),
        Ok(rows) => {
            for row in rows {
                let ts = ts_ms_to_rfc3339(row.ts_ms);
                let outcome = row.outcome.as_str();
                match row.detail.as_deref() {
                    Some(detail) => println!(
                        "{ts}  #{}  {outcome:<8}  {}",
                        row.exercise_id,
                        single_line(detail, 60)
                    ),
                    None => println!("{ts}  #{}  {outcome}", row.exercise_id),
                }
            }
        }
        Err(err) => warn(log, &format!("failed to read the attempt journal: {err}")),
    }
}

// The journal is history, not state; a failed append must not interrupt the
// drill.
fn journal(
    session: &mut DrillSession,
    log: &mut SessionLog,
    exercise_id: ExerciseId,
    outcome: AttemptOutcome,
    detail: Option<&str>,
) {
    let request = RecordAttemptRequest {
        exercise_id,
        ts_ms: now_ms_i64(),
        outcome,
        detail: detail.map(str::to_string),
    };
    if let Err(err) = session.store_mut().record_attempt(request) {
        warn(log, &format!("failed to record the attempt: {err}"));
    }
}

fn report_save_warning(session: &mut DrillSession, log: &mut SessionLog) {
    if let Some(err) = session.take_save_error() {
        warn(log, &format!("failed to save progress: {err}"));
    }
}

fn warn(log: &mut SessionLog, message: &str) {
    log.note_error(message);
    eprintln!("WARNING: {message}");
}

fn report_error(log: &mut SessionLog, message: &str) {
    log.note_error(message);
    println!("Error: {message}");
}

fn format_delay(ms: i64) -> String {
    let ms = ms.max(0);
    format!("{}.{}s", ms / 1000, (ms % 1000) / 100)
}

fn single_line(value: &str, max_chars: usize) -> String {
    let flat = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut out: String = flat.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
