/// Haptic session example: a synthetic swing drives real pulse timing
///
/// Runs a gravity-compensated Z-axis session against an ideal 800ms swing and
/// records when each pulse actually lands.
use std::time::Duration;

use swing_pulse::{Axis, RecordingActuator, SessionConfig, SwingSession, SyntheticPendulum};

#[tokio::main]
async fn main() -> swing_pulse::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    println!("=== Swing Pulse: Haptic Session ===\n");

    let config = SessionConfig::z_axis();
    let interval_us = config.sample_interval_us;
    let mut session = SwingSession::with_actuator(config, RecordingActuator::new())?;

    // Four seconds of swinging, paced like a real sensor
    let mut source = SyntheticPendulum::new(Axis::Z, 800, interval_us, 4_000);
    let started = tokio::time::Instant::now();
    let mut ticker = tokio::time::interval(Duration::from_micros(interval_us));

    while let Some(sample) = source.next_sample() {
        ticker.tick().await;
        session.process_sample(&sample);
    }

    // Let the last pulse land
    tokio::time::sleep(Duration::from_millis(500)).await;

    println!("\n--- Pulses ---");
    for (i, (at, pattern)) in session.scheduler().actuator().pulses().iter().enumerate() {
        println!(
            "[{}] +{:>5}ms  {}ms @ amplitude {}",
            i,
            at.duration_since(started).as_millis(),
            pattern.duration_ms,
            pattern.amplitude
        );
    }

    let stats = session.close();
    println!("\n=== Summary ===");
    println!("Samples: {}", stats.samples);
    println!("Crossings: {}", stats.crossings);
    println!("Pulses scheduled: {}", stats.pulses_scheduled);
    if let Some(period) = stats.last_period_ms {
        println!("Last period: {}ms", period);
    }

    Ok(())
}
