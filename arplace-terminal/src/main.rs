//! arplace terminal simulator
//!
//! Walk a simulated AR device over a flat floor and place pyramids on it.
//! Controls:
//!   - Enter: start the session
//!   - WASD: walk, arrow keys: look around
//!   - Space / Enter / left click: place at the crosshair or click position
//!   - g: toggle a tracking gap, r: inject tracking drift with a reset
//!   - Q/ESC: end the session

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use arplace_core::PlacementConfig;
use arplace_terminal::{SimulationConfig, TerminalApp};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "arplace-terminal", about = "Tap-to-place AR pipeline in a terminal")]
struct CliArgs {
    /// Height of the ground plane
    #[arg(long, env = "ARPLACE_GROUND_HEIGHT", default_value_t = 0.0, allow_hyphen_values = true)]
    ground_height: f32,

    /// Uniform scale of placed objects
    #[arg(long, env = "ARPLACE_OBJECT_SCALE", default_value_t = 0.1)]
    object_scale: f32,

    /// Uniform scale of the aim marker
    #[arg(long, env = "ARPLACE_MARKER_SCALE", default_value_t = 0.1)]
    marker_scale: f32,

    /// Camera height above the world origin
    #[arg(long, default_value_t = 1.5)]
    eye_height: f32,

    /// Frame rate of the simulated host
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Log file; the terminal itself is taken by the renderer
    #[arg(long, env = "ARPLACE_LOG_FILE", default_value = "arplace-terminal.log")]
    log_file: PathBuf,
}

impl CliArgs {
    fn placement_config(&self) -> PlacementConfig {
        PlacementConfig::default()
            .with_ground_height(self.ground_height)
            .with_object_scale(self.object_scale)
            .with_marker_scale(self.marker_scale)
    }

    fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            eye_height: self.eye_height,
            target_fps: self.fps,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let log_file = File::create(&args.log_file)
        .with_context(|| format!("cannot open log file {}", args.log_file.display()))?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arplace_core=debug,arplace_terminal=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    tracing::info!(?args, "starting arplace terminal");

    let mut app = TerminalApp::new(args.placement_config(), args.simulation_config())?;
    app.run()?;

    println!("Session ended.");
    Ok(())
}
