//! Swing pulse command-line driver
//!
//! Runs the phase estimator off-device: replay a recorded accelerometer
//! capture, or drive it from a synthetic swing. Pulses are logged instead of
//! vibrating a motor.
//!
//! This is the entry point for the standalone binary. For library use, see lib.rs.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use swing_pulse::{
    Axis, LoggingActuator, ReplaySource, SampleSource, SessionConfig, SessionStats, SwingSession,
    SyntheticPendulum,
};

#[derive(Parser, Debug)]
#[command(name = "swing-pulse", version, about = "Quarter-period haptic pulses from swing motion")]
struct Cli {
    /// Session configuration file (TOML, JSON or YAML). SWING_PULSE__* environment
    /// variables override it, or the axis preset when no file is given.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tracked axis; selects the matching preset when no config file is given.
    #[arg(long, global = true)]
    axis: Option<Axis>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a JSON-lines capture of {"timestamp_ns", "accel": [x, y, z]} records
    /// as fast as it can be read; only the statistics are meaningful.
    Replay {
        /// Capture file.
        input: PathBuf,
    },
    /// Drive the session from an ideal sinusoidal swing, paced at the sample rate.
    Simulate {
        /// Swing period in milliseconds.
        #[arg(long, default_value_t = 1200)]
        period_ms: u64,

        /// Simulated duration in seconds.
        #[arg(long, default_value_t = 10)]
        seconds: u64,

        /// Peak acceleration of the swing in m/s².
        #[arg(long, default_value_t = 3.0)]
        amplitude: f64,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = path.to_str().context("config path is not valid UTF-8")?;
            SessionConfig::from_file(path)?
        }
        None => {
            let preset = SessionConfig::for_axis(cli.axis.unwrap_or_default());
            SessionConfig::with_env_overrides(&preset)?
        }
    };
    if let Some(axis) = cli.axis {
        config.axis = axis;
    }
    config.validate()?;
    Ok(config)
}

/// Run a session to completion. With `pace` set, samples are released at
/// the sensor rate so pulses land in real time.
async fn run_session(
    config: SessionConfig,
    source: &mut dyn SampleSource,
    pace: Option<Duration>,
) -> anyhow::Result<SessionStats> {
    let mut session = SwingSession::with_actuator(config, LoggingActuator)?;
    match pace {
        Some(interval) => session.run_paced(source, interval).await?,
        None => session.run(source).await?,
    };

    // Let the last scheduled pulses land before tearing down.
    while session.scheduler().pending() > 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Ok(session.close())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let stats = match cli.command {
        Commands::Replay { ref input } => {
            let file = File::open(input)
                .with_context(|| format!("opening capture {}", input.display()))?;
            let mut source = ReplaySource::from_json_lines(BufReader::new(file))?;
            run_session(config, &mut source, None).await?
        }
        Commands::Simulate {
            period_ms,
            seconds,
            amplitude,
        } => {
            let duration_ms = seconds
                .checked_mul(1000)
                .context("--seconds is too large")?;
            let mut source = SyntheticPendulum::checked(
                config.axis,
                period_ms,
                config.sample_interval_us,
                duration_ms,
            )?
            .with_amplitude(amplitude);
            let pace = Duration::from_micros(config.sample_interval_us);
            run_session(config, &mut source, Some(pace)).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_selects_preset_without_file() {
        let cli = Cli::parse_from(["swing-pulse", "--axis", "z", "simulate"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.axis, Axis::Z);
        assert_eq!(config.estimator.gravity_offset, swing_pulse::STANDARD_GRAVITY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_is_paced() {
        let config = SessionConfig::x_axis();
        let mut source = SyntheticPendulum::new(Axis::X, 1000, config.sample_interval_us, 2_000);
        let pace = Duration::from_micros(config.sample_interval_us);

        let start = tokio::time::Instant::now();
        let stats = run_session(config, &mut source, Some(pace)).await.unwrap();
        assert_eq!(stats.pulses_scheduled, 1);
        assert!(start.elapsed() >= Duration::from_millis(2_000));
    }
}
