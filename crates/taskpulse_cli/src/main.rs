//! CLI smoke entry point.
//!
//! # Responsibility
//! - Rank a JSON task export the same way the app does.
//! - Optionally dry-run notification scheduling against an in-memory
//!   delivery service and print the resulting triggers.
//!
//! Usage: `taskpulse_cli <tasks.json> [--config <engine.json>] [--now <epoch_ms>] [--plan]`
//!
//! Set `TASKPULSE_LOG_DIR` (absolute path) to enable file logging.

use clap::Parser;
use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use taskpulse_core::{
    compute_time_health, core_version, init_logging, now_epoch_ms, EngineConfig,
    InMemoryDelivery, InMemoryTaskRepository, LogLevel, NotificationScheduler, RankedViewProjector,
    Task, TaskRepository,
};

/// Rank a JSON task export and optionally dry-run notification scheduling.
#[derive(Debug, Parser)]
#[command(name = "taskpulse_cli", version, about)]
struct Args {
    /// JSON array of tasks.
    tasks_path: PathBuf,

    /// Engine configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Evaluation instant in epoch milliseconds. Defaults to the system clock.
    #[arg(long)]
    now: Option<i64>,

    /// Print the triggers pending tasks would schedule.
    #[arg(long)]
    plan: bool,
}

fn load_tasks(path: &Path) -> Result<Vec<Task>, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("cannot read `{}`: {err}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|err| format!("invalid task json in `{}`: {err}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, String> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("cannot read `{}`: {err}", path.display()))?;
    EngineConfig::from_json_str(&raw).map_err(|err| err.to_string())
}

async fn run(args: Args) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let repo = InMemoryTaskRepository::from_tasks(load_tasks(&args.tasks_path)?)
        .map_err(|err| err.to_string())?;
    let now = args.now.unwrap_or_else(now_epoch_ms);
    let snapshot = repo.snapshot();
    info!(
        "event=cli_run module=cli status=ok tasks={} plan={}",
        snapshot.len(),
        args.plan
    );

    let mut projector = RankedViewProjector::new();
    let view = projector.view(&snapshot, now);
    println!("taskpulse_core version={}", core_version());
    println!("consistency={}%", view.consistency_score);
    for (rank, item) in view.ranked.iter().enumerate() {
        let (done, total) = item.task.subtask_progress();
        println!(
            "{:>3}. [{:?} {:<6}] {:<9.2} health={:>3}% subtasks={done}/{total} {} ({})",
            rank + 1,
            item.task.status,
            item.task.priority.as_str(),
            item.score,
            compute_time_health(&item.task, now),
            item.task.title,
            item.task.id,
        );
    }

    if args.plan {
        let delivery = Arc::new(InMemoryDelivery::new());
        let scheduler = NotificationScheduler::new(Arc::clone(&delivery), config.notifications);
        scheduler.setup_channel().await;
        for item in &view.pending {
            scheduler.schedule_task_notifications_at(&item.task, now).await;
        }
        println!("planned triggers:");
        for pending in delivery.pending_triggers() {
            println!(
                "  {} at={} while_idle={} {}",
                pending.payload.id,
                pending.trigger.timestamp,
                pending.trigger.allow_while_idle,
                pending.payload.body
            );
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    if let Ok(dir) = std::env::var("TASKPULSE_LOG_DIR") {
        if let Err(err) = init_logging(LogLevel::build_default().as_str(), &dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("taskpulse_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn parses_all_flags() {
        let args = Args::try_parse_from([
            "taskpulse_cli",
            "tasks.json",
            "--config",
            "engine.json",
            "--now",
            "1700000000000",
            "--plan",
        ])
        .unwrap();

        assert_eq!(args.tasks_path, PathBuf::from("tasks.json"));
        assert_eq!(args.config, Some(PathBuf::from("engine.json")));
        assert_eq!(args.now, Some(1_700_000_000_000));
        assert!(args.plan);
    }

    #[test]
    fn flags_are_optional() {
        let args = Args::try_parse_from(["taskpulse_cli", "tasks.json"]).unwrap();
        assert!(args.config.is_none());
        assert!(args.now.is_none());
        assert!(!args.plan);
    }

    #[test]
    fn rejects_missing_path_and_bad_now() {
        assert!(Args::try_parse_from(["taskpulse_cli"]).is_err());
        assert!(Args::try_parse_from(["taskpulse_cli", "t.json", "--now", "soon"]).is_err());
    }
}
