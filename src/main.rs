use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use slotplan::cli::{Args, Commands, CyclePolicyArg, TaskLoader};
use slotplan::{ConfigDiscovery, EngineConfig, SchedulingEngine};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays valid JSON
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Commands::Schedule {
            file,
            config,
            analytics,
            now,
            cycle_policy,
        } => run_schedule(&file, config.as_deref(), analytics, now, cycle_policy).await,
        Commands::OptimalStart {
            file,
            task_id,
            config,
            now,
        } => {
            let config = load_config(config.as_deref())?;
            let task_file = TaskLoader::load(&file)?;
            let constraints = task_file
                .constraints
                .clone()
                .unwrap_or_else(|| config.constraints.clone());
            let engine = build_engine(task_file.into_store(), config, now);

            let start = engine.optimal_start_time(task_id, constraints).await?;
            println!("{}", serde_json::json!({ "task_id": task_id, "start": start }));
            Ok(())
        }
        Commands::ShowConfig => {
            ConfigDiscovery::show_discovery_info();
            println!();
            println!("{}", ConfigDiscovery::discover()?.to_toml_string()?);
            Ok(())
        }
    }
}

async fn run_schedule(
    file: &Path,
    config: Option<&Path>,
    with_analytics: bool,
    now: Option<DateTime<Utc>>,
    cycle_policy: Option<CyclePolicyArg>,
) -> Result<()> {
    let mut config = load_config(config)?;
    if let Some(policy) = cycle_policy {
        config.cycle_policy = policy.into();
    }

    let task_file = TaskLoader::load(file)?;
    info!("Scheduling {} task(s) from {:?}", task_file.tasks.len(), file);

    let task_ids = task_file.task_ids();
    let constraints = task_file
        .constraints
        .clone()
        .unwrap_or_else(|| config.constraints.clone());
    let engine = build_engine(task_file.into_store(), config, now);

    let schedule = engine.create_schedule(&task_ids, constraints).await?;

    let output = if with_analytics {
        let analytics = engine.analyze(&schedule).await;
        serde_json::json!({ "schedule": schedule, "analytics": analytics })
    } else {
        serde_json::to_value(&schedule).context("Failed to serialize schedule")?
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration override from: {:?}", path);
            EngineConfig::from_toml_file(path)
        }
        None => ConfigDiscovery::discover(),
    }
}

fn build_engine<S: slotplan::TaskStore>(
    store: S,
    config: EngineConfig,
    now: Option<DateTime<Utc>>,
) -> SchedulingEngine<S> {
    let engine = SchedulingEngine::new(store, config);
    match now {
        Some(now) => engine.with_clock(move || now),
        None => engine,
    }
}
