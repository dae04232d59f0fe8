// xiforge entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr, so stdout stays clean for JSON)
// 2. Load config, copying defaults/ into config/ when missing
// 3. Load the match file and the player pool
// 4. Generate the batch and print it

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use xiforge_cli::{apply_overrides, render_json, render_table, Args, MatchFile};
use xiforge_core::config;
use xiforge_core::pool::load_pool;
use xiforge_engine::LineupEngine;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 1. Initialize tracing
    init_tracing()?;

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: roster={}, cap {:.1}, {} per team",
        config.roster.name, config.roster.salary_cap, config.roster.max_per_team
    );

    // 3. Match file and pool
    let match_file = MatchFile::load(&args.match_file).context("failed to load match file")?;
    let request = apply_overrides(match_file.request, &args);

    let pool_path = args
        .pool
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.data_paths.pool));
    let players = load_pool(&pool_path).context("failed to load player pool")?;
    info!("Loaded {} players from {}", players.len(), pool_path.display());

    // 4. Generate and print
    let engine = LineupEngine::new(&config.engine);
    let outcome = engine
        .generate_batch(&players, &match_file.context, &config.roster, &request)
        .context("lineup generation failed")?;

    if args.json {
        println!("{}", render_json(&outcome).context("failed to serialize batch")?);
    } else {
        print!("{}", render_table(&outcome));
    }
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("xiforge=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    Ok(())
}
