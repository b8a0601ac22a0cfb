//! Shared fixtures: a one-shot HTTP stub and a replayed earthquake

#![allow(dead_code)]

use std::f32::consts::PI;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use quakeguard_core::{AccelReading, DetectorConfig, ReplaySource, StationConfig};

/// One request as seen by the stub server
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Serve one connection per entry in `statuses`, answering in order
///
/// Returns the base URL and a handle yielding the captured requests.
pub fn serve(statuses: &[u16]) -> (String, JoinHandle<Vec<Captured>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let statuses = statuses.to_vec();

    let handle = thread::spawn(move || {
        statuses
            .into_iter()
            .map(|status| {
                let (mut stream, _) = listener.accept().unwrap();
                let captured = read_request(&stream);
                write!(
                    stream,
                    "HTTP/1.1 {} {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    status,
                    reason(status)
                )
                .unwrap();
                stream.flush().unwrap();
                captured
            })
            .collect()
    });

    (base, handle)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        429 => "Too Many Requests",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

fn read_request(stream: &TcpStream) -> Captured {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).unwrap();

    Captured {
        method,
        path,
        headers,
        body: String::from_utf8(body).unwrap(),
    }
}

pub const RATE_HZ: u32 = 100;
pub const PERIOD_MS: u64 = 10;

/// Quiet, then four seconds of 1 Hz shaking around 0.1 g, then quiet again
pub fn earthquake() -> ReplaySource {
    let envelope = [(3_000, 0.05), (400, 1.0), (1_500, 0.05)];
    let readings = envelope
        .iter()
        .flat_map(|&(n, amplitude)| std::iter::repeat(amplitude).take(n))
        .enumerate()
        .map(|(i, amplitude)| {
            let t = i as f32 / RATE_HZ as f32;
            AccelReading::new(0.0, 0.0, 9.81 + amplitude * (2.0 * PI * t).sin())
        })
        .collect();
    ReplaySource::new(readings)
}

/// Samples in [`earthquake`]
pub const EARTHQUAKE_TICKS: usize = 4_900;

pub fn station_config() -> StationConfig {
    StationConfig::default().with_detector(
        DetectorConfig::default()
            .with_windows(RATE_HZ, 0.5, 5.0)
            .with_thresholds(4.0, 1.5)
            .with_min_event_duration(2.0),
    )
}
