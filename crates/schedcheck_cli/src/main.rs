//! CLI entry point.
//!
//! # Responsibility
//! - Verify `schedcheck_core` linkage with a deterministic probe.
//! - Run a conflict scan against a schedule database file.
//!
//! Usage:
//! - `schedcheck_cli` prints ping/version.
//! - `schedcheck_cli scan <db_path> [department_uuid]` recomputes conflict
//!   flags and prints scan counters. Set `SCHEDCHECK_LOG_DIR` to an absolute
//!   directory to enable file logging.

use log::warn;
use schedcheck_core::db::open_db;
use schedcheck_core::{ConflictScanner, SqliteScheduleRepository};
use std::process::ExitCode;
use uuid::Uuid;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        None => {
            println!("schedcheck_core ping={}", schedcheck_core::ping());
            println!("schedcheck_core version={}", schedcheck_core::core_version());
            ExitCode::SUCCESS
        }
        Some("scan") => match run_scan(&args[1..]) {
            Ok(()) => ExitCode::SUCCESS,
            Err(message) => {
                eprintln!("error: {message}");
                ExitCode::FAILURE
            }
        },
        Some(other) => {
            eprintln!("unknown command `{other}`; expected `scan <db_path> [department_uuid]`");
            ExitCode::from(2)
        }
    }
}

fn run_scan(args: &[String]) -> Result<(), String> {
    let db_path = args
        .first()
        .ok_or_else(|| "missing <db_path> argument".to_string())?;
    let department_id = args
        .get(1)
        .map(|value| {
            Uuid::parse_str(value).map_err(|err| format!("invalid department uuid `{value}`: {err}"))
        })
        .transpose()?;

    if let Ok(log_dir) = std::env::var("SCHEDCHECK_LOG_DIR") {
        if let Err(err) = schedcheck_core::init_logging(schedcheck_core::default_log_level(), &log_dir)
        {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    let mut conn = open_db(db_path).map_err(|err| err.to_string())?;
    let repo = SqliteScheduleRepository::try_new(&mut conn).map_err(|err| err.to_string())?;
    let mut scanner = ConflictScanner::new(repo);

    let stats = scanner
        .scan_and_update_all_conflicts(department_id)
        .map_err(|err| err.to_string())?;
    if stats.conflicts_found > 0 {
        warn!(
            "event=cli_scan module=cli status=ok conflicts_found={}",
            stats.conflicts_found
        );
    }

    println!("total_scanned={}", stats.total_scanned);
    println!("conflicts_found={}", stats.conflicts_found);
    println!("schedules_updated={}", stats.schedules_updated);
    Ok(())
}
