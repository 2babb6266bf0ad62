//! Симуляция «болтовни» между компонентами через реестр тем.
//!
//! Создаёт темы `beep`, `boop`, `bap`, `baz`, `foo`, подключает два
//! компонента (подписка по шаблону и публичный список), выполняет
//! случайные публикации и рассылки и печатает собранную статистику в
//! JSON.

use anyhow::{Context, Result};
use clap::Parser;
use rand::{rngs::StdRng, Rng, SeedableRng};
use topical::{init_logging, Listener, Registry, RegistryStats, Settings, TopicSelector};
use tracing::{debug, info};

const TOPICS: [&str; 5] = ["beep", "boop", "bap", "baz", "foo"];

#[derive(Parser)]
#[command(name = "chatter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Simulated topic chatter with statistics", long_about = None)]
struct Cli {
    /// Число итераций симуляции
    #[arg(short = 'n', long, default_value = "1000")]
    iterations: usize,
    /// Seed генератора для воспроизводимого прогона
    #[arg(long, env = "TOPICAL_SEED")]
    seed: Option<u64>,
    /// Не печатать доставленные события
    #[arg(short, long)]
    quiet: bool,
    /// Файл настроек (toml, json, yaml)
    #[arg(short, long)]
    config: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("failed to load settings")?;
    let logging = init_logging(settings.logging_config()?).context("failed to init logging")?;

    let registry = Registry::<String>::with_defaults(settings.topic_defaults());
    let stats = RegistryStats::attach(&registry);

    for topic in TOPICS {
        registry.add_topic(topic)?;
    }

    component_one(&registry, cli.quiet)?;
    component_two(&registry, cli.quiet)?;

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    for _ in 0..cli.iterations {
        let roll: f64 = rng.gen();
        if roll > 0.9 {
            registry.broadcast(format!("The time is now {}...", chrono::Local::now()))?;
            continue;
        }
        let topic = TOPICS[((roll / 0.2) as usize).min(TOPICS.len() - 1)];
        let msg = if roll > 0.5 { "bebop" } else { "woot" };
        debug!(topic, msg, "Publishing");
        registry.publish(topic, msg.to_string())?;
    }

    info!(iterations = cli.iterations, "Chatter finished");
    println!("{}", serde_json::to_string_pretty(&stats.snapshot())?);

    logging.shutdown();
    Ok(())
}

/// Подписывается на все темы вида `b…p`.
fn component_one(
    registry: &Registry<String>,
    quiet: bool,
) -> Result<()> {
    let listener = printer("component1", quiet);
    registry.subscribe(TopicSelector::regex("^b.+p$")?, &listener);
    Ok(())
}

/// Слушает рассылки и темы с префиксом `ba`.
fn component_two(
    registry: &Registry<String>,
    quiet: bool,
) -> Result<()> {
    registry.list(&printer("component2/broadcast", quiet));
    registry.subscribe(TopicSelector::regex("^ba.+")?, &printer("component2", quiet));
    Ok(())
}

fn printer(
    name: &'static str,
    quiet: bool,
) -> Listener<String> {
    Listener::new(move |event: &String| {
        if !quiet {
            println!("[{name}] {event}");
        }
    })
}
