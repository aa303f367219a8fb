//! Power meter exporter
//!
//! Takes decoded SML frames from a smart electricity meter, extracts the
//! current power draw and the total energy consumption, and publishes both
//! to MQTT.

pub mod config;
pub mod metering_sml;
pub mod models;
pub mod mqtt;

// Re-export common types for easier access
pub use config::CONFIG;
pub use metering_sml::{DecodeError, FrameDecoder, JsonFrameDecoder, SmlManager};
pub use models::{Measurement, PowerReadings};
pub use mqtt::MqttManager;
