//! On-device lamps and buzzer
//!
//! | Level              | Lamp   | Sound                                  |
//! |--------------------|--------|----------------------------------------|
//! | STRONG and above   | red    | siren sweep 800-2000 Hz, three cycles  |
//! | MODERATE           | yellow | 1500 Hz for 500 ms                     |
//! | LIGHT              | yellow | 1000 Hz for 300 ms                     |
//! | NEGLIGIBLE         | green  | none                                   |

use quakeguard_core::AlertLevel;

use crate::manager::AlertSink;
use crate::payload::{AlertPayload, StatusPayload};
use crate::{AlertChannel, ConnectorError};

const SIREN_LOW_HZ: u32 = 800;
const SIREN_HIGH_HZ: u32 = 2000;
const SIREN_STEP_HZ: usize = 100;
const SIREN_STEP_MS: u32 = 30;
const SIREN_CYCLES: usize = 3;

/// One of the three status lamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lamp {
    Green,
    Yellow,
    Red,
}

/// Lamp and buzzer hardware
pub trait Indicator {
    /// Light `lamp` and switch the other two off
    fn set_lamp(&mut self, lamp: Lamp);

    /// Sound `frequency_hz` for `duration_ms`, returning when done
    fn tone(&mut self, frequency_hz: u32, duration_ms: u32);

    /// Stop any sound
    fn silence(&mut self);
}

impl<I: Indicator + ?Sized> Indicator for Box<I> {
    fn set_lamp(&mut self, lamp: Lamp) {
        (**self).set_lamp(lamp)
    }

    fn tone(&mut self, frequency_hz: u32, duration_ms: u32) {
        (**self).tone(frequency_hz, duration_ms)
    }

    fn silence(&mut self) {
        (**self).silence()
    }
}

/// Indicator for hosts without hardware; writes to the log instead
#[derive(Debug, Clone, Copy, Default)]
pub struct LogIndicator;

impl Indicator for LogIndicator {
    fn set_lamp(&mut self, lamp: Lamp) {
        log::info!("Lamp: {:?}", lamp);
    }

    fn tone(&mut self, frequency_hz: u32, duration_ms: u32) {
        log::debug!("Tone: {} Hz for {} ms", frequency_hz, duration_ms);
    }

    fn silence(&mut self) {}
}

/// Local alert sink driving an [`Indicator`]
#[derive(Debug)]
pub struct LocalAlert<I: Indicator> {
    indicator: I,
    level: AlertLevel,
}

impl<I: Indicator> LocalAlert<I> {
    /// Wrap `indicator`, starting on the green lamp
    pub fn new(mut indicator: I) -> Self {
        indicator.silence();
        indicator.set_lamp(Lamp::Green);
        Self {
            indicator,
            level: AlertLevel::Negligible,
        }
    }

    /// Show `level` on the lamps and sound the matching pattern
    pub fn set_alert_level(&mut self, level: AlertLevel) {
        self.level = level;
        match level {
            AlertLevel::Strong | AlertLevel::Severe | AlertLevel::Extreme => {
                self.indicator.set_lamp(Lamp::Red);
                self.siren_pattern();
            }
            AlertLevel::Moderate => {
                self.indicator.set_lamp(Lamp::Yellow);
                self.sound_alarm(1500, 500);
            }
            AlertLevel::Light => {
                self.indicator.set_lamp(Lamp::Yellow);
                self.sound_alarm(1000, 300);
            }
            AlertLevel::Negligible => self.indicator.set_lamp(Lamp::Green),
        }
    }

    /// Single tone, then silence
    pub fn sound_alarm(&mut self, frequency_hz: u32, duration_ms: u32) {
        self.indicator.tone(frequency_hz, duration_ms);
        self.indicator.silence();
    }

    /// Rising and falling sweep, repeated
    pub fn siren_pattern(&mut self) {
        for _ in 0..SIREN_CYCLES {
            for freq in (SIREN_LOW_HZ..=SIREN_HIGH_HZ).step_by(SIREN_STEP_HZ) {
                self.indicator.tone(freq, SIREN_STEP_MS);
            }
            for freq in (SIREN_LOW_HZ..=SIREN_HIGH_HZ).rev().step_by(SIREN_STEP_HZ) {
                self.indicator.tone(freq, SIREN_STEP_MS);
            }
        }
        self.indicator.silence();
    }

    pub fn stop_alarm(&mut self) {
        self.indicator.silence();
    }

    pub fn display_status(&mut self, status: &str) {
        log::info!("Status: {}", status);
    }

    /// Level currently shown
    pub fn level(&self) -> AlertLevel {
        self.level
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }
}

impl<I: Indicator> AlertSink for LocalAlert<I> {
    fn channel(&self) -> AlertChannel {
        AlertChannel::Local
    }

    fn is_available(&self) -> bool {
        true
    }

    fn send_alert(&mut self, alert: &AlertPayload) -> Result<(), ConnectorError> {
        self.set_alert_level(alert.event.alert_level);
        Ok(())
    }

    fn send_status(&mut self, status: &StatusPayload) -> Result<(), ConnectorError> {
        self.display_status(&status.status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Lamp(Lamp),
        Tone(u32, u32),
        Silence,
    }

    #[derive(Debug, Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl Recorder {
        fn tones(&self) -> Vec<u32> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Tone(f, _) => Some(*f),
                    _ => None,
                })
                .collect()
        }
    }

    impl Indicator for Recorder {
        fn set_lamp(&mut self, lamp: Lamp) {
            self.calls.push(Call::Lamp(lamp));
        }

        fn tone(&mut self, frequency_hz: u32, duration_ms: u32) {
            self.calls.push(Call::Tone(frequency_hz, duration_ms));
        }

        fn silence(&mut self) {
            self.calls.push(Call::Silence);
        }
    }

    fn fresh() -> LocalAlert<Recorder> {
        let mut alert = LocalAlert::new(Recorder::default());
        alert.indicator.calls.clear();
        alert
    }

    #[test]
    fn starts_green_and_quiet() {
        let alert = LocalAlert::new(Recorder::default());
        assert_eq!(alert.indicator().calls, vec![Call::Silence, Call::Lamp(Lamp::Green)]);
        assert_eq!(alert.level(), AlertLevel::Negligible);
    }

    #[test]
    fn light_and_moderate_use_yellow_with_single_tone() {
        let mut alert = fresh();
        alert.set_alert_level(AlertLevel::Light);
        assert_eq!(
            alert.indicator().calls,
            vec![Call::Lamp(Lamp::Yellow), Call::Tone(1000, 300), Call::Silence]
        );

        let mut alert = fresh();
        alert.set_alert_level(AlertLevel::Moderate);
        assert_eq!(
            alert.indicator().calls,
            vec![Call::Lamp(Lamp::Yellow), Call::Tone(1500, 500), Call::Silence]
        );
    }

    #[test]
    fn strong_and_above_sound_the_siren() {
        for level in [AlertLevel::Strong, AlertLevel::Severe, AlertLevel::Extreme] {
            let mut alert = fresh();
            alert.set_alert_level(level);

            let calls = &alert.indicator().calls;
            assert_eq!(calls.first(), Some(&Call::Lamp(Lamp::Red)));
            assert_eq!(calls.last(), Some(&Call::Silence));

            let tones = alert.indicator().tones();
            // 13 steps up and 13 down per cycle
            assert_eq!(tones.len(), 3 * 26);
            assert_eq!(tones[0], 800);
            assert_eq!(tones[12], 2000);
            assert_eq!(tones[13], 2000);
            assert_eq!(tones[25], 800);
        }
    }

    #[test]
    fn negligible_returns_to_green_silently() {
        let mut alert = fresh();
        alert.set_alert_level(AlertLevel::Negligible);
        assert_eq!(alert.indicator().calls, vec![Call::Lamp(Lamp::Green)]);
    }

    #[test]
    fn alert_sink_follows_payload_level() {
        let mut alert = fresh();
        let event = quakeguard_core::EarthquakeEvent {
            alert_level: AlertLevel::Light,
            ..Default::default()
        };
        let payload = AlertPayload::new(&event, "dev", 0, Default::default());

        alert.send_alert(&payload).unwrap();
        assert_eq!(alert.level(), AlertLevel::Light);
        assert!(alert.is_available());
        assert_eq!(alert.channel(), AlertChannel::Local);
    }
}
