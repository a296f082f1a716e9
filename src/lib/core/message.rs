use serde::{Deserialize, Serialize};

use super::{SyncError, Todo};

/// A frame on the todo socket, in either direction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WireMessage {
    Init { data: Vec<Todo> },
    Update { data: Vec<Todo> },
    #[serde(other)]
    Unknown,
}

impl WireMessage {
    pub fn decode(text: &str) -> Result<Self, SyncError> {
        serde_json::from_str(text).map_err(|e| SyncError::Deserialization(e.to_string()))
    }

    /// The snapshot carried by an `init` or `update` frame.
    pub fn into_snapshot(self) -> Option<Vec<Todo>> {
        match self {
            WireMessage::Init { data } | WireMessage::Update { data } => Some(data),
            WireMessage::Unknown => None,
        }
    }
}

#[derive(Serialize)]
struct Frame<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    data: &'a [Todo],
}

pub fn encode_init(todos: &[Todo]) -> Result<String, SyncError> {
    encode("init", todos)
}

pub fn encode_update(todos: &[Todo]) -> Result<String, SyncError> {
    encode("update", todos)
}

fn encode(kind: &str, data: &[Todo]) -> Result<String, SyncError> {
    serde_json::to_string(&Frame { kind, data }).map_err(|e| SyncError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TodoDate;

    #[test]
    fn init_and_update_carry_a_snapshot() {
        let init = WireMessage::decode(
            r#"{"type":"init","data":[{"id":1,"text":"A","completed":false,"date":0}]}"#,
        )
        .unwrap();
        let update = WireMessage::decode(r#"{"type":"update","data":[]}"#).unwrap();
        assert_eq!(init.into_snapshot().unwrap()[0].text, "A");
        assert_eq!(update.into_snapshot(), Some(vec![]));
    }

    #[test]
    fn unknown_type_decodes_without_data() {
        let msg = WireMessage::decode(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(msg, WireMessage::Unknown);
        let msg = WireMessage::decode(r#"{"type":"delete","data":{"id":3}}"#).unwrap();
        assert_eq!(msg.into_snapshot(), None);
    }

    #[test]
    fn malformed_frames_are_errors() {
        for text in ["not json", r#"{"data":[]}"#, r#"{"type":"update","data":"x"}"#] {
            let err = WireMessage::decode(text).unwrap_err();
            assert!(matches!(err, SyncError::Deserialization(_)), "{text}");
        }
    }

    #[test]
    fn update_frame_has_type_and_full_list() {
        let todos = vec![
            Todo::new(1, "A", true, TodoDate::Millis(0)),
            Todo::new(2, "B", false, TodoDate::Text("2024-01-01".into())),
        ];
        let frame: serde_json::Value = serde_json::from_str(&encode_update(&todos).unwrap()).unwrap();
        assert_eq!(frame["type"], "update");
        assert_eq!(frame["data"].as_array().unwrap().len(), 2);
        assert_eq!(frame["data"][0]["completed"], true);
        assert_eq!(frame["data"][1]["date"], "2024-01-01");
    }
}
