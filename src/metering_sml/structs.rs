use serde::{Deserialize, Serialize};
use std::fmt;

// Decoded SML frame structures, as handed over by the frame decoder

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmlFile {
    pub messages: Vec<SmlMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmlMessage {
    pub transaction_id: Vec<u8>,
    pub group_no: u8,
    pub abort_on_error: u8,
    pub message_body: SmlMessageBody,
    pub crc: Option<u16>,
    pub end_of_message: u8,
}

/// Message payload, discriminated by the SML message type. Extraction only
/// looks at GetList responses; every other body is carried through and
/// ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SmlMessageBody {
    GetListResponse(SmlGetListResponse),
    GetProcParameterResponse(SmlGetProcParameterResponse),
    Attention(SmlAttentionMessage),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmlGetListResponse {
    pub client_id: Option<Vec<u8>>,
    pub server_id: Option<Vec<u8>>,
    pub list_name: Option<Vec<u8>>,
    pub act_sensor_time: Option<u32>,
    pub val_list: Vec<SmlListEntry>,
    pub list_signature: Option<Vec<u8>>,
    pub act_gateway_time: Option<u32>,
}

/// One measurement row of a GetList response. `value` is optional because a
/// degraded decode may deliver the row without it; such rows are skipped
/// during extraction, they never abort a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmlListEntry {
    pub obis: ObisCode,
    pub status: Option<u64>,
    pub val_time: Option<u32>,
    pub unit: Option<u8>,
    pub scaler: Option<i8>,
    pub value: Option<SmlValue>,
    pub value_signature: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SmlValue {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    OctetString(Vec<u8>),
    List(Vec<SmlValue>),
}

impl SmlValue {
    /// Widen an integer value to f64. Booleans, octet strings and nested
    /// lists carry no extractable reading and yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SmlValue::Int8(v) => Some(*v as f64),
            SmlValue::Int16(v) => Some(*v as f64),
            SmlValue::Int32(v) => Some(*v as f64),
            SmlValue::Int64(v) => Some(*v as f64),
            SmlValue::UInt8(v) => Some(*v as f64),
            SmlValue::UInt16(v) => Some(*v as f64),
            SmlValue::UInt32(v) => Some(*v as f64),
            SmlValue::UInt64(v) => Some(*v as f64),
            SmlValue::Bool(_) | SmlValue::OctetString(_) | SmlValue::List(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmlGetProcParameterResponse {
    pub server_id: Option<Vec<u8>>,
    pub parameter_tree_path: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmlAttentionMessage {
    pub server_id: Option<Vec<u8>>,
    pub attention_no: Vec<u8>,
    pub attention_msg: Option<Vec<u8>>,
}

/// OBIS object identifier of a list entry, always six octets:
/// medium, channel, indicator, mode, tariff, previous-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObisCode(pub [u8; 6]);

impl ObisCode {
    pub fn new(octets: [u8; 6]) -> Self {
        ObisCode(octets)
    }

    /// The C.D.E groups (octets 2..5), which identify the measured
    /// quantity independent of medium and channel.
    pub fn short_code(&self) -> String {
        format!("{}.{}.{}", self.0[2], self.0[3], self.0[4])
    }
}

impl fmt::Display for ObisCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}:{}.{}.{}.{}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}
