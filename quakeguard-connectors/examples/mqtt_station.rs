//! Run a station against an MQTT broker with a simulated accelerometer
//!
//! The sensor replays a synthetic 1 Hz burst in real time. Alerts go to the
//! broker (and Discord, if `DISCORD_WEBHOOK_URL` is set); the lamps are
//! printed to the log.
//!
//! ```text
//! MQTT_HOST=localhost cargo run -p quakeguard-connectors --example mqtt_station
//! ```

use std::f32::consts::PI;
use std::thread;
use std::time::Duration;

use quakeguard_connectors::webhook::{WebhookConfig, WebhookNotifier};
use quakeguard_connectors::{AlertManager, LocalAlert, Location, LogIndicator, MqttConfig, MqttConnector};
use quakeguard_core::{
    AccelReading, DeviceId, FileStorage, MonotonicClock, ReplaySource, Station, StationConfig,
    TimeSource,
};

fn simulated_sensor(rate_hz: u32) -> ReplaySource {
    let rate = rate_hz as f32;
    ReplaySource::new(
        (0..(90 * rate_hz) as usize)
            .map(|n| {
                let t = n as f32 / rate;
                let amplitude = if (45.0..50.0).contains(&t) { 1.2 } else { 0.05 };
                AccelReading::new(0.0, 0.0, 9.81 + amplitude * (2.0 * PI * t).sin())
            })
            .collect(),
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let host = std::env::var("MQTT_HOST").unwrap_or_else(|_| "localhost".into());
    let device_id = DeviceId::from_mac("24:6F:28:00:00:01")?;

    let mqtt = MqttConnector::new(
        MqttConfig::new(host, 1883, device_id.as_str())
            .credentials(
                std::env::var("MQTT_USER").unwrap_or_default(),
                std::env::var("MQTT_PASSWORD").unwrap_or_default(),
            ),
    )?;

    let mut manager = AlertManager::new()
        .with_location(Location::new(37.7749, -122.4194))
        .with_sink(LocalAlert::new(LogIndicator))
        .with_sink(mqtt);

    let webhooks = WebhookConfig::new().discord(std::env::var("DISCORD_WEBHOOK_URL").unwrap_or_default());
    if webhooks.has_services() {
        manager.add_sink(WebhookNotifier::new(webhooks)?);
    }

    let config = StationConfig::default();
    let period = Duration::from_millis(config.sample_period_ms());
    let sensor = simulated_sensor(config.detector.sample_rate_hz);
    let storage = FileStorage::new(std::env::temp_dir().join("quakeguard").join("queue.json"));

    let mut station = Station::new(config, sensor, manager, storage, device_id)?;
    let restored = station.restore_queue().unwrap_or(0);
    log::info!("System ready - monitoring for earthquakes ({} queued)", restored);

    let clock = MonotonicClock::new();
    loop {
        let report = station.tick(clock.now());
        if let Some(event) = report.confirmed() {
            log::info!(
                "CONFIRMED: magnitude {:.2}, PGA {:.4} g, {} ms, delivered: {}",
                event.magnitude,
                event.pga,
                event.duration,
                report.broadcast
            );
        }
        if report.sample_pending && station.queue().unsent_count() == 0 {
            break;
        }
        thread::sleep(period);
    }

    Ok(())
}
