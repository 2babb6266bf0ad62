//! Интерактивная оболочка над реестром тем.
//!
//! Читает команды построчно (`ADD beep`, `SUBSCRIBE /^b/ print`,
//! `PUBLISH beep hello`, ...) и печатает результат. Доступны слушатели
//! `print` (печатает событие) и `count` (считает доставки).

use std::{
    io::{self, BufRead, Write},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use anyhow::Result;
use clap::Parser;
use topical::{
    init_logging, CommandReply, Listener, ListenerDirectory, NotificationKind, Registry,
    LogLevel, RegistryCommand, ResultExt, Settings, StackError,
};
use tracing::{debug, error, warn};

#[derive(Parser)]
#[command(name = "topical-repl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Line-oriented shell over a topic registry", long_about = None)]
struct Cli {
    /// Печатать уведомления реестра
    #[arg(short, long)]
    notifications: bool,
    /// Печатать ошибки в JSON
    #[arg(long)]
    json_errors: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load()?;
    let logging = init_logging(settings.logging_config()?)?;

    let registry = Registry::<String>::with_defaults(settings.topic_defaults());
    if cli.notifications {
        registry.on_any_notification(|n| {
            if n.kind == NotificationKind::Error {
                eprintln!("! {} {:?}", n.kind, n.condition_kind());
            } else {
                eprintln!("~ {} {}", n.kind, n.topic.as_deref().unwrap_or("-"));
            }
        });
    }

    let delivered = Arc::new(AtomicU64::new(0));
    let mut listeners = ListenerDirectory::new();
    listeners.insert(
        "print".to_string(),
        Listener::new(|event: &String| println!("> {event}")),
    );
    let d = delivered.clone();
    listeners.insert(
        "count".to_string(),
        Listener::new(move |_: &String| {
            d.fetch_add(1, Ordering::Relaxed);
        }),
    );

    let stdin = io::stdin();
    let mut out = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        let args: Vec<&str> = line.split_whitespace().collect();
        if args.is_empty() {
            continue;
        }
        if args[0].eq_ignore_ascii_case("quit") {
            break;
        }

        let reply = RegistryCommand::parse(&args)
            .and_then(|cmd| cmd.execute(&registry, &listeners))
            .with_context(|| format!("command {}", args[0].to_ascii_uppercase()));

        match reply {
            Ok(CommandReply::Ok) => writeln!(out, "OK")?,
            Ok(CommandReply::Count(n)) => writeln!(out, "(integer) {n}")?,
            Ok(CommandReply::Flag(flag)) => writeln!(out, "{flag}")?,
            Ok(CommandReply::Topics(topics)) => {
                for (i, t) in topics.iter().enumerate() {
                    writeln!(out, "{}) {t}", i + 1)?;
                }
            }
            Err(e) => {
                log_command_error(&e);
                if cli.json_errors {
                    writeln!(out, "{}", serde_json::to_string(&e.to_response())?)?
                } else {
                    writeln!(out, "(error {}) {e}", e.status_code().code())?
                }
            }
        }
    }

    writeln!(out, "delivered to count: {}", delivered.load(Ordering::Relaxed))?;
    logging.shutdown();
    Ok(())
}

fn log_command_error(e: &StackError) {
    let tags = e.metrics_tags();
    match e.log_level() {
        LogLevel::Debug => debug!(error = %e, ?tags, "Command rejected"),
        LogLevel::Warn => warn!(error = %e, ?tags, "Command failed"),
        LogLevel::Error => error!(error = %e, ?tags, "Command failed"),
    }
}
