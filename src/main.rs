//! scenesound - headless driver for scene audio settings propagation
//!
//! Builds a small scene with media and avatar sources, runs a few frames, and
//! prints the resulting audio settings.

mod config;
mod headless;

use anyhow::{Context, Result};
use config::AudioConfig;
use headless::HeadlessScene;
use scenesound_audio::PreferencesPatch;
use scenesound_core::DistanceModel;
use scenesound_testkit::JsonlSink;
use std::{env, path::PathBuf};
use tracing::info;

fn main() -> Result<()> {
    // WARN by default, override via RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    info!("Starting scenesound v{}", env!("CARGO_PKG_VERSION"));

    let cli = CliOptions::parse(env::args().skip(1))?;
    let mut config = match &cli.config {
        Some(path) => AudioConfig::load_from_path(path),
        None => AudioConfig::load(),
    };
    if let Some(frames) = cli.frames {
        config.frames = frames;
    }

    if let Some(path) = &cli.write_config {
        config
            .save_to_path(path)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        info!("wrote config to {}", path.display());
    }

    let mut scene = HeadlessScene::new(&config);
    let change = cli.preference_change();
    let change_at = config.frames / 2;

    while scene.frame() < config.frames {
        if scene.frame() == change_at && !change.is_empty() {
            scene.change_preferences(&change);
        }
        scene.step();
    }

    println!("{}", scene.settings_log());

    if let Some(path) = &cli.record {
        let mut sink = JsonlSink::create(path)
            .with_context(|| format!("failed to create payload log {}", path.display()))?;
        for record in scene.records() {
            sink.write(&record)?;
        }
        info!("wrote payload log to {}", path.display());
    }

    Ok(())
}

#[derive(Debug, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    write_config: Option<PathBuf>,
    frames: Option<u64>,
    record: Option<PathBuf>,
    global_rolloff: Option<f32>,
    distance_model: Option<DistanceModel>,
}

impl CliOptions {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Result<Self> {
        let mut opts = CliOptions::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => opts.config = args.next().map(PathBuf::from),
                "--write-config" => opts.write_config = args.next().map(PathBuf::from),
                "--record" => opts.record = args.next().map(PathBuf::from),
                "--frames" => {
                    let value = args.next().context("--frames requires a value")?;
                    opts.frames = Some(
                        value
                            .parse()
                            .with_context(|| format!("invalid --frames value `{value}`"))?,
                    );
                }
                "--global-rolloff" => {
                    let value = args.next().context("--global-rolloff requires a value")?;
                    opts.global_rolloff = Some(
                        value
                            .parse()
                            .with_context(|| format!("invalid --global-rolloff value `{value}`"))?,
                    );
                }
                "--distance-model" => {
                    let value = args.next().context("--distance-model requires a value")?;
                    opts.distance_model = Some(value.parse()?);
                }
                other => tracing::warn!("ignoring unknown argument `{other}`"),
            }
        }
        Ok(opts)
    }

    /// Preference change applied halfway through the run.
    fn preference_change(&self) -> PreferencesPatch {
        PreferencesPatch {
            global_rolloff_factor: self.global_rolloff,
            global_distance_model: self.distance_model,
            ..Default::default()
        }
    }
}
