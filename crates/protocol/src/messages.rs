use serde::{Deserialize, Serialize};

use crate::constants::{ACTION_CHUNK, ACTION_ERROR, ACTION_FINISH, ACTION_START};
use crate::error::ProtocolError;

// ---------------------------------------------------------------------------
// Record payloads
// ---------------------------------------------------------------------------

/// Opens a transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRecord {
    pub id: String,
    #[serde(default)]
    pub filename: String,
    /// Advisory only; the host never trusts it for anything.
    #[serde(default)]
    pub mime_type: String,
    /// Blob size in bytes as reported by the sender.
    #[serde(default)]
    pub size: u64,
    pub total_chunks: u32,
}

/// Carries one transport-encoded slice of the blob.
///
/// `data` is kept encoded here; decoding is the receiver's decision so a
/// bad payload does not make the whole record malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRecord {
    pub id: String,
    pub index: u32,
    pub total_chunks: u32,
    pub data: String,
}

/// Signals that the sender has emitted every chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishRecord {
    pub id: String,
}

/// Signals that the sender abandoned the transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: String,
    #[serde(default)]
    pub message: String,
}

// ---------------------------------------------------------------------------
// ChannelMessage
// ---------------------------------------------------------------------------

/// One record on the host-bound channel, tagged by its `action` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ChannelMessage {
    Start(StartRecord),
    Chunk(ChunkRecord),
    Finish(FinishRecord),
    Error(ErrorRecord),
}

impl ChannelMessage {
    /// Parses and validates a record received from the channel.
    ///
    /// Unknown actions, missing required fields and out-of-range integers
    /// are reported as [`ProtocolError::Malformed`]; an empty transfer id
    /// as [`ProtocolError::EmptyId`].
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let msg: ChannelMessage = serde_json::from_str(text)?;
        if msg.id().is_empty() {
            return Err(ProtocolError::EmptyId);
        }
        Ok(msg)
    }

    /// Serializes the record for sending over the channel.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Transfer id the record belongs to.
    pub fn id(&self) -> &str {
        match self {
            ChannelMessage::Start(r) => &r.id,
            ChannelMessage::Chunk(r) => &r.id,
            ChannelMessage::Finish(r) => &r.id,
            ChannelMessage::Error(r) => &r.id,
        }
    }

    /// Wire name of the record's action.
    pub fn action(&self) -> &'static str {
        match self {
            ChannelMessage::Start(_) => ACTION_START,
            ChannelMessage::Chunk(_) => ACTION_CHUNK,
            ChannelMessage::Finish(_) => ACTION_FINISH,
            ChannelMessage::Error(_) => ACTION_ERROR,
        }
    }

    pub fn start(
        id: impl Into<String>,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
        total_chunks: u32,
    ) -> Self {
        ChannelMessage::Start(StartRecord {
            id: id.into(),
            filename: filename.into(),
            mime_type: mime_type.into(),
            size,
            total_chunks,
        })
    }

    pub fn chunk(id: impl Into<String>, index: u32, total_chunks: u32, data: String) -> Self {
        ChannelMessage::Chunk(ChunkRecord {
            id: id.into(),
            index,
            total_chunks,
            data,
        })
    }

    pub fn finish(id: impl Into<String>) -> Self {
        ChannelMessage::Finish(FinishRecord { id: id.into() })
    }

    pub fn error(id: impl Into<String>, message: impl Into<String>) -> Self {
        ChannelMessage::Error(ErrorRecord {
            id: id.into(),
            message: message.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_start_record() {
        let json = r#"{"action":"start","id":"t1","filename":"a.pdf","mimeType":"application/pdf","size":10,"totalChunks":3}"#;
        let msg = ChannelMessage::parse(json).unwrap();
        assert_eq!(
            msg,
            ChannelMessage::start("t1", "a.pdf", "application/pdf", 10, 3)
        );
        assert_eq!(msg.action(), "start");
    }

    #[test]
    fn parse_start_without_optional_fields() {
        let json = r#"{"action":"start","id":"t1","totalChunks":1}"#;
        let ChannelMessage::Start(start) = ChannelMessage::parse(json).unwrap() else {
            panic!("expected start record");
        };
        assert!(start.filename.is_empty());
        assert!(start.mime_type.is_empty());
        assert_eq!(start.size, 0);
    }

    #[test]
    fn parse_chunk_record() {
        let json = r#"{"action":"chunk","id":"t1","index":2,"totalChunks":3,"data":"Qw=="}"#;
        let msg = ChannelMessage::parse(json).unwrap();
        assert_eq!(msg, ChannelMessage::chunk("t1", 2, 3, "Qw==".into()));
    }

    #[test]
    fn parse_terminal_records() {
        let finish = ChannelMessage::parse(r#"{"action":"finish","id":"t1"}"#).unwrap();
        assert_eq!(finish, ChannelMessage::finish("t1"));

        let error =
            ChannelMessage::parse(r#"{"action":"error","id":"t1","message":"read failed"}"#)
                .unwrap();
        assert_eq!(error, ChannelMessage::error("t1", "read failed"));
    }

    #[test]
    fn unknown_action_is_malformed() {
        let result = ChannelMessage::parse(r#"{"action":"pause","id":"t1"}"#);
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn missing_action_is_malformed() {
        let result = ChannelMessage::parse(r#"{"id":"t1"}"#);
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn missing_required_field_is_malformed() {
        let result = ChannelMessage::parse(r#"{"action":"chunk","id":"t1","index":0}"#);
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn negative_index_is_malformed() {
        let json = r#"{"action":"chunk","id":"t1","index":-1,"totalChunks":3,"data":""}"#;
        assert!(matches!(
            ChannelMessage::parse(json),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(matches!(
            ChannelMessage::parse("hello"),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn empty_id_rejected() {
        let result = ChannelMessage::parse(r#"{"action":"finish","id":""}"#);
        assert!(matches!(result, Err(ProtocolError::EmptyId)));
    }

    #[test]
    fn to_json_uses_wire_names() {
        let json = ChannelMessage::start("t1", "a", "", 0, 1).to_json().unwrap();
        assert!(json.contains(r#""action":"start""#));
        assert!(json.contains(r#""totalChunks":1"#));
        assert!(json.contains(r#""mimeType":"""#));
    }

    #[test]
    fn id_accessor() {
        assert_eq!(ChannelMessage::error("x9", "m").id(), "x9");
        assert_eq!(ChannelMessage::chunk("c1", 0, 1, String::new()).id(), "c1");
    }
}
