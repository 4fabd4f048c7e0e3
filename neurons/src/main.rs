//! Neurons & Dragons terminal front-end.
//!
//! Plays an adventure whose scenes come from a script file:
//!
//! ```bash
//! cargo run -p neurons -- --script demos/emerald_forest.json
//! ```
//!
//! The newest save in the save directory is resumed unless `--new` is given.

mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use neurons_core::{
    create_character, AdventureScript, GameSession, ScriptedGenerator, SessionConfig,
    UnknownScenePolicy,
};
use std::path::PathBuf;
use terminal::TerminalConsole;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "neurons", version, about = "A narrated text adventure")]
struct Args {
    /// Adventure script (JSON) supplying the scenes
    #[arg(long, default_value = "demos/emerald_forest.json")]
    script: PathBuf,

    /// Directory for save files
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Seed for reproducible dice
    #[arg(long)]
    seed: Option<u64>,

    /// Start a new character even if a save exists
    #[arg(long)]
    new: bool,

    /// Fail on unknown scene tags instead of returning to narration
    #[arg(long)]
    strict_scenes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with the story
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "neurons=info,neurons_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    let generator = load_script(&args.script).await?;
    let saves = config.save_manager();
    let mut console = TerminalConsole::stdin();

    tracing::info!(
        script = %args.script.display(),
        save_dir = %config.save_dir.display(),
        "starting"
    );

    let mut session = if args.new {
        let player = create_character(&mut console)?;
        GameSession::new_game(config, player, generator, saves, console)
    } else {
        GameSession::resume_or_new(config, generator, saves, console).await?
    };

    session.run().await?;
    Ok(())
}

fn build_config(args: &Args) -> Result<SessionConfig> {
    let mut config = SessionConfig::from_env().context("invalid environment configuration")?;
    if let Some(dir) = &args.save_dir {
        config.save_dir = dir.clone();
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if args.strict_scenes {
        config = config.with_unknown_scenes(UnknownScenePolicy::Reject);
    }
    Ok(config)
}

async fn load_script(path: &PathBuf) -> Result<ScriptedGenerator> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read adventure script {}", path.display()))?;
    let script: AdventureScript = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse adventure script {}", path.display()))?;
    tracing::debug!(
        scenes = script.scenes.len(),
        puzzles = script.puzzles.len(),
        combats = script.combats.len(),
        "adventure script loaded"
    );
    Ok(ScriptedGenerator::from_script(script))
}
