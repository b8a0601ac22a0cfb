//! Replay a recorded acceleration trace through the detection pipeline
//!
//! Reads CSV lines `x,y,z` (m/s², one per sample at the configured rate)
//! from the file given as the first argument, or synthesizes a 1 Hz burst
//! when no file is given, and prints every trigger and confirmation.
//!
//! ```text
//! cargo run -p quakeguard-core --example replay_detection -- trace.csv
//! ```

use std::f32::consts::PI;

use quakeguard_core::{
    AccelReading, AccelSample, ConditioningChain, DetectorUpdate, StationConfig, TriggerDetector,
};

fn parse_line(line: &str) -> Option<AccelReading> {
    let mut fields = line.split(',').map(|f| f.trim().parse::<f32>());
    match (fields.next(), fields.next(), fields.next()) {
        (Some(Ok(x)), Some(Ok(y)), Some(Ok(z))) => Some(AccelReading::new(x, y, z)),
        _ => None,
    }
}

fn synthetic_burst(rate_hz: u32) -> Vec<AccelReading> {
    let rate = rate_hz as f32;
    (0..(50 * rate_hz) as usize)
        .map(|n| {
            let t = n as f32 / rate;
            let amplitude = if (30.0..34.0).contains(&t) { 1.0 } else { 0.05 };
            AccelReading::new(0.0, 0.0, 9.81 + amplitude * (2.0 * PI * t).sin())
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = StationConfig::default();
    config.validate()?;

    let rate_hz = config.detector.sample_rate_hz;
    let readings = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?
            .lines()
            .filter_map(parse_line)
            .collect(),
        None => synthetic_burst(rate_hz),
    };

    let mut chain = ConditioningChain::new(rate_hz as f32, &config.filter, &config.smoother)
        .with_gravity_reference();
    let mut detector = TriggerDetector::new(config.detector);
    let period_ms = config.sample_period_ms();

    println!("Replaying {} samples at {} Hz", readings.len(), rate_hz);

    let mut confirmed = 0;
    for (n, raw) in readings.into_iter().enumerate() {
        let timestamp = n as u64 * period_ms;
        match detector.add_sample(AccelSample::at(chain.process(raw), timestamp)) {
            DetectorUpdate::Triggered(_) => {
                println!("{:>8} ms  TRIGGER  STA/LTA {:.2}", timestamp, detector.sta_lta_ratio());
            }
            DetectorUpdate::Confirmed(event) => {
                confirmed += 1;
                println!(
                    "{:>8} ms  CONFIRMED  {}  M{:.2}  PGA {:.4} g  CAV {:.4} g·s  {:.1} s",
                    timestamp,
                    event.alert_level,
                    event.magnitude,
                    event.pga,
                    event.cav,
                    event.duration_secs()
                );
                detector.reset();
            }
            DetectorUpdate::Discarded(event) => {
                println!("{:>8} ms  discarded  peak {:.4} g", timestamp, event.pga);
            }
            _ => {}
        }
    }

    println!("{} confirmed event(s)", confirmed);
    Ok(())
}
