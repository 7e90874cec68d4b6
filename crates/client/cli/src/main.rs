//! Replays a scripted battle from a content directory.
//!
//! Usage: `battle-cli [content-dir]`. Environment: `BATTLE_CONTENT_DIR`,
//! `BATTLE_SEED`, `BATTLE_VERBOSE`, `BATTLE_LOG_OUT`, `RUST_LOG`.
mod config;
mod replay;

use anyhow::Result;
use battle_content::ContentFactory;
use battle_core::{BattleEnv, PcgRng};
use config::ReplayConfig;

fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = ReplayConfig::from_env().with_args(std::env::args().skip(1));
    setup_logging();

    let factory = ContentFactory::new(&config.content_dir);
    let mut battle_config = factory.load_config()?;
    if let Some(seed) = config.seed {
        battle_config = battle_config.with_seed(seed);
    }
    let criticals = factory.load_criticals()?;
    let summons = factory.load_summons()?;
    let mut state = factory.load_state()?;
    let script = factory.load_script()?;
    tracing::info!(
        dir = %factory.data_dir().display(),
        participants = state.roster.len(),
        steps = script.steps.len(),
        seed = battle_config.seed,
        "content loaded"
    );

    let rng = PcgRng;
    let env = BattleEnv::new(&battle_config, &rng)
        .with_critical(&criticals)
        .with_summons(&summons);
    let report = replay::replay(&mut state, env, &script, config.verbose)?;

    for line in &report.lines {
        println!("{line}");
    }
    println!("Log root: {}", hex::encode(report.log_root));
    if let Some(path) = &config.log_out {
        let json = serde_json::to_string_pretty(&state.log)
            .map_err(|e| anyhow::anyhow!("Failed to serialize action log: {}", e))?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), entries = state.log.len(), "action log written");
    }
    if report.rejected > 0 {
        tracing::warn!(rejected = report.rejected, "some steps were rejected");
    }
    Ok(())
}

/// Logs go to stderr so the transcript on stdout stays clean.
fn setup_logging() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
