use crate::error::DecodeError;
use crate::history::DetectionRecord;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, Read, Write};

pub const UI_TO_BACKEND_CAP: usize = 65_536;
pub const BACKEND_TO_UI_CAP: usize = 1_048_576;

pub const DEFAULT_DETECTION_LABEL: &str = "face";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "t")]
pub enum ClientEnvelope {
    #[serde(rename = "ready")]
    Ready { sid: String, capabilities: Value },
    #[serde(rename = "override_th")]
    OverrideThreshold { value: f64 },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "t")]
pub enum BackendEnvelope {
    #[serde(rename = "detection")]
    Detection(DetectionPayload),
}

/// Detection body as it arrives on the wire, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionPayload {
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<WireTimestamp>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireTimestamp {
    Millis(i64),
    FractionalMillis(f64),
    Text(String),
}

impl WireTimestamp {
    fn to_epoch_millis(&self) -> Result<i64, DecodeError> {
        match self {
            Self::Millis(ms) => Ok(*ms),
            Self::FractionalMillis(ms) if ms.is_finite() => Ok(ms.trunc() as i64),
            Self::FractionalMillis(ms) => Err(DecodeError::InvalidTimestamp(ms.to_string())),
            Self::Text(raw) => DateTime::parse_from_rfc3339(raw.trim())
                .map(|dt| dt.timestamp_millis())
                .map_err(|_| DecodeError::InvalidTimestamp(raw.clone())),
        }
    }
}

impl TryFrom<DetectionPayload> for DetectionRecord {
    type Error = DecodeError;

    fn try_from(payload: DetectionPayload) -> Result<Self, Self::Error> {
        let confidence = payload
            .confidence
            .ok_or(DecodeError::MissingField("confidence"))?;
        let timestamp_ms = payload
            .timestamp
            .ok_or(DecodeError::MissingField("timestamp"))?
            .to_epoch_millis()?;
        let label = payload
            .content
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DETECTION_LABEL.to_string());

        Ok(DetectionRecord::new(confidence, timestamp_ms, label))
    }
}

pub fn ready_envelope(sid: String) -> ClientEnvelope {
    ClientEnvelope::Ready {
        sid,
        capabilities: serde_json::json!({
            "events": ["detection", "override_th"],
            "transport": "packet-4"
        }),
    }
}

pub fn override_threshold_envelope(value: f64) -> ClientEnvelope {
    ClientEnvelope::OverrideThreshold { value }
}

pub fn encode_client_envelope(envelope: &ClientEnvelope) -> io::Result<Vec<u8>> {
    serde_json::to_vec(envelope).map_err(json_error)
}

pub fn decode_detection(payload: &[u8]) -> Result<DetectionRecord, DecodeError> {
    match serde_json::from_slice::<BackendEnvelope>(payload)? {
        BackendEnvelope::Detection(detection) => DetectionRecord::try_from(detection),
    }
}

pub fn write_envelope(writer: &mut impl Write, envelope: &ClientEnvelope) -> io::Result<()> {
    let payload = encode_client_envelope(envelope)?;
    write_frame(writer, &payload, UI_TO_BACKEND_CAP)?;
    writer.flush()
}

pub fn read_frame(reader: &mut impl Read, max_payload: usize) -> io::Result<Vec<u8>> {
    let mut len_buf = [0_u8; 4];
    reader.read_exact(&mut len_buf)?;

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > max_payload {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {len} > {max_payload}"),
        ));
    }

    let mut payload = vec![0_u8; len];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

pub fn write_frame(writer: &mut impl Write, payload: &[u8], max_payload: usize) -> io::Result<()> {
    if payload.len() > max_payload {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {} > {}", payload.len(), max_payload),
        ));
    }

    let len = u32::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "payload exceeds u32"))?;

    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(payload)?;
    Ok(())
}

fn json_error(err: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn truncated_frame_is_rejected() {
        let data = vec![0, 0, 0, 5, b'a', b'b'];
        let mut cursor = Cursor::new(data);
        let err = read_frame(&mut cursor, BACKEND_TO_UI_CAP).expect_err("expected eof");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let len = (UI_TO_BACKEND_CAP as u32) + 1;
        let data = len.to_be_bytes().to_vec();
        let mut cursor = Cursor::new(data);
        let err = read_frame(&mut cursor, UI_TO_BACKEND_CAP).expect_err("expected too large");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn frame_length_is_big_endian() {
        let mut out = Vec::new();
        write_frame(&mut out, b"abc", UI_TO_BACKEND_CAP).expect("frame write");
        assert_eq!(&out[0..4], &[0, 0, 0, 3]);
        assert_eq!(&out[4..], b"abc");
    }

    #[test]
    fn decodes_detection_with_epoch_millis() {
        let payload = br#"{"t":"detection","confidence":0.8234,"timestamp":1700000000123}"#;
        let record = decode_detection(payload).expect("decode detection");

        assert_eq!(record.confidence(), 0.8234);
        assert_eq!(record.timestamp_ms(), 1_700_000_000_123);
        assert_eq!(record.label(), "face");
    }

    #[test]
    fn decodes_detection_with_rfc3339_timestamp_and_label() {
        let payload = br#"{"t":"detection","content":"face","confidence":0.61,"timestamp":"2023-11-14T22:13:20.500000+00:00"}"#;
        let record = decode_detection(payload).expect("decode detection");

        assert_eq!(record.timestamp_ms(), 1_700_000_000_500);
        assert_eq!(record.label(), "face");
    }

    #[test]
    fn fractional_millis_are_truncated() {
        let payload = br#"{"t":"detection","confidence":0.5,"timestamp":1700000000123.9}"#;
        let record = decode_detection(payload).expect("decode detection");
        assert_eq!(record.timestamp_ms(), 1_700_000_000_123);
    }

    #[test]
    fn missing_confidence_is_rejected() {
        let payload = br#"{"t":"detection","timestamp":1}"#;
        let err = decode_detection(payload).expect_err("expected missing field");
        assert!(matches!(err, DecodeError::MissingField("confidence")));
    }

    #[test]
    fn unparsable_timestamp_is_rejected() {
        let payload = br#"{"t":"detection","confidence":0.5,"timestamp":"yesterday"}"#;
        let err = decode_detection(payload).expect_err("expected bad timestamp");
        assert!(matches!(err, DecodeError::InvalidTimestamp(_)));
    }

    #[test]
    fn unknown_event_is_rejected() {
        let payload = br#"{"t":"telemetry","fps":30}"#;
        let err = decode_detection(payload).expect_err("expected unknown event");
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn encodes_override_threshold_envelope() {
        let encoded =
            encode_client_envelope(&override_threshold_envelope(0.42)).expect("encode override");

        let value: Value = serde_json::from_slice(&encoded).expect("parse encoded json");
        assert_eq!(value["t"], "override_th");
        assert_eq!(value["value"], 0.42);
    }

    #[test]
    fn ready_envelope_carries_sid() {
        let encoded =
            encode_client_envelope(&ready_envelope("S7".to_string())).expect("encode ready");

        let value: Value = serde_json::from_slice(&encoded).expect("parse encoded json");
        assert_eq!(value["t"], "ready");
        assert_eq!(value["sid"], "S7");
    }
}
