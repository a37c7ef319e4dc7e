/// Basic usage example: feed accelerometer samples, get pulse decisions
use swing_pulse::{AccelSample, Axis, EstimatorConfig, PhaseEstimator, PhaseResult};

fn main() {
    println!("=== Swing Pulse: Basic Example ===\n");

    // Phone hanging flat, swinging along X with a one-second period
    let mut estimator = PhaseEstimator::new(EstimatorConfig::horizontal());

    let ms = 1_000_000i64;
    let swing_samples = vec![
        // First swing: back through center
        (0, [-1.0, 0.0, 9.8]),
        (10 * ms, [-0.6, 0.0, 9.8]),
        (20 * ms, [0.3, 0.0, 9.8]),
        (250 * ms, [1.8, 0.0, 9.8]),
        (500 * ms, [0.05, 0.0, 9.8]),
        (750 * ms, [-1.8, 0.0, 9.8]),
        // Second swing: one period later
        (1000 * ms, [-1.0, 0.0, 9.8]),
        (1010 * ms, [-0.6, 0.0, 9.8]),
        (1020 * ms, [0.3, 0.0, 9.8]),
        (1270 * ms, [1.8, 0.0, 9.8]),
    ];

    println!("Processing {} samples...\n", swing_samples.len());

    let mut pulse_count = 0;

    for (timestamp_ns, accel) in swing_samples {
        let sample = AccelSample::new(timestamp_ns, accel);
        let result = estimator.ingest_sample(&sample, Axis::X);

        print_result(&sample, &result, estimator.crossings());
        if result.should_pulse {
            pulse_count += 1;
        }
    }

    println!("\n=== Summary ===");
    println!("Crossings detected: {}", estimator.total_crossings());
    println!("Pulses scheduled: {}", pulse_count);
    match estimator.last_period_ms() {
        Some(period) => println!("Last period: {}ms", period),
        None => println!("Last period: not yet measured"),
    }
}

fn print_result(sample: &AccelSample, result: &PhaseResult, crossings: usize) {
    let t_ms = sample.timestamp_ns / 1_000_000;
    if result.should_pulse {
        println!(
            "t={:>5}ms  x={:>5.2}  crossing #{} -> pulse in {}ms",
            t_ms, sample.accel[0], crossings, result.lead_ms
        );
    } else {
        println!("t={:>5}ms  x={:>5.2}", t_ms, sample.accel[0]);
    }
}
