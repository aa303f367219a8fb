use crate::config::CONFIG;
use crate::mqtt::{SubscribeData, Transmission};
use log::{debug, error, info, warn};
use thiserror::Error;
use tokio::sync::mpsc::Sender;

pub mod extract;
pub mod structs;
pub mod units;
pub mod utils;

use extract::extract_power_data;
use structs::{SmlFile, SmlMessageBody};
use units::UnitTable;

/// Failure to turn a raw payload into a decoded frame. Fatal for the frame
/// it occurred in, never for the stream.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("frame payload is empty")]
    EmptyPayload,
    #[error("frame document is not valid: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}

/// Boundary to the lower-level frame decoder. An implementation takes the
/// payload bytes of one fully reassembled frame, with the transport
/// envelope already stripped, and either produces the decoded message
/// sequence or reports the frame as undecodable.
pub trait FrameDecoder {
    fn decode(&self, payload: &[u8]) -> Result<SmlFile, DecodeError>;
}

/// Decoder for frames arriving as serialized frame documents, the format
/// the external wire-level decoder emits. This is deliberately not an SML
/// binary parser.
pub struct JsonFrameDecoder;

impl FrameDecoder for JsonFrameDecoder {
    fn decode(&self, payload: &[u8]) -> Result<SmlFile, DecodeError> {
        if payload.is_empty() {
            return Err(DecodeError::EmptyPayload);
        }
        let file = serde_json::from_slice(payload)?;
        Ok(file)
    }
}

pub struct SmlManager<D: FrameDecoder> {
    sender: Sender<Transmission>,
    decoder: D,
    units: UnitTable,
}

impl<D: FrameDecoder> SmlManager<D> {
    pub fn new(sender: Sender<Transmission>, decoder: D) -> Self {
        Self {
            sender,
            decoder,
            units: UnitTable::new(),
        }
    }

    pub async fn start_thread(&mut self) {
        info!("Starting SML thread");

        let input_topic = {
            let config = CONFIG.read().unwrap();
            config.config.sml.input_topic.clone()
        };

        // Subscribe to the frame input topic
        let (sender, mut receiver) = tokio::sync::mpsc::channel(10);
        let register = Transmission::Subscribe(SubscribeData {
            topic: input_topic,
            sender,
        });

        let _ = self.sender.send(register).await;

        info!("Starting SML waiting for frames");
        while let Some(payload) = receiver.recv().await {
            self.handle_frame(payload.as_bytes()).await;
        }
    }

    /// One full pass over a received frame: decode, extract, forward. An
    /// undecodable frame is dropped with a warning and the next one
    /// awaited; nothing is published for it.
    async fn handle_frame(&self, payload: &[u8]) {
        debug!("Received frame payload of {} bytes", payload.len());

        let file = match self.decoder.decode(payload) {
            Ok(file) => file,
            Err(e) => {
                warn!(
                    "Dropping undecodable frame ({}): {}",
                    payload_preview(payload),
                    e
                );
                return;
            }
        };

        for message in &file.messages {
            if let SmlMessageBody::GetListResponse(response) = &message.message_body {
                if let Some(server_id) = &response.server_id {
                    debug!("GetList response from server {}", hex::encode(server_id));
                }
                if let Some(sensor_time) = utils::format_sensor_time(response.act_sensor_time) {
                    debug!("Frame sensor time: {}", sensor_time);
                }
            }
        }

        let readings = extract_power_data(&file, &self.units);
        if readings.is_empty() {
            debug!("Frame contained no power readings");
            return;
        }

        if let Err(e) = self.sender.send(Transmission::Readings(readings)).await {
            error!("Failed to forward power readings: {}", e);
        }
    }
}

/// Short hex prefix of an undecodable payload for the warning message.
fn payload_preview(payload: &[u8]) -> String {
    const PREVIEW_LEN: usize = 16;
    if payload.len() <= PREVIEW_LEN {
        hex::encode(payload)
    } else {
        format!("{}..", hex::encode(&payload[..PREVIEW_LEN]))
    }
}
