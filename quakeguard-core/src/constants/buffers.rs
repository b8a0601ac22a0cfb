//! Buffer Sizes
//!
//! Bounds for the durable queue and inline identifiers.

/// Maximum number of events retained by the durable queue.
///
/// On overflow the oldest entry is evicted regardless of delivery state.
/// 100 events of ~150 bytes JSON each keep the record under 16 KB, well
/// inside a SPIFFS/LittleFS partition.
pub const MAX_QUEUE_SIZE: usize = 100;

/// Maximum device identifier length (bytes).
///
/// `ESP32_` + 12 hex MAC digits = 18 bytes, with room for custom ids.
pub const MAX_DEVICE_ID_LEN: usize = 32;
