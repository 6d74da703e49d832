use serde::{Deserialize, Serialize};
use std::fmt;
use strum::EnumString;

/// Identifier issued by the remote service. Numbers and strings are both
/// accepted and kept verbatim; the console never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "RawId", into = "String")]
pub struct OpaqueId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl From<RawId> for OpaqueId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        }
    }
}

impl From<OpaqueId> for String {
    fn from(id: OpaqueId) -> Self {
        id.0
    }
}

impl OpaqueId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OpaqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type CommandId = OpaqueId;

/// Status of an asynchronous hardware command as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, EnumString, Deserialize)]
#[serde(from = "String")]
#[strum(serialize_all = "snake_case")]
pub enum CommandStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Expired,
    /// Anything the service adds later. Treated like `Pending`.
    #[strum(default)]
    Unknown(String),
}

impl From<String> for CommandStatus {
    fn from(raw: String) -> Self {
        raw.parse().unwrap_or(CommandStatus::Unknown(raw))
    }
}

impl CommandStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CommandStatus::Pending => "pending",
            CommandStatus::InProgress => "in_progress",
            CommandStatus::Completed => "completed",
            CommandStatus::Failed => "failed",
            CommandStatus::Expired => "expired",
            CommandStatus::Unknown(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CommandStatus::Completed | CommandStatus::Failed | CommandStatus::Expired
        )
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GET /command/{command_id}/
#[derive(Debug, Clone, Deserialize)]
pub struct CommandStatusResponse {
    pub status: CommandStatus,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body for both enroll and delete-fingerprint requests.
#[derive(Debug, Serialize)]
pub struct FingerprintRequest<'a> {
    pub roll_no: u32,
    pub device_id: &'a str,
}

/// POST /student/enroll/ accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrollmentAccepted {
    pub command_id: CommandId,
    #[serde(default = "default_instruction")]
    pub instruction: String,
    pub fingerprint_id: OpaqueId,
}

fn default_instruction() -> String {
    "Place finger on scanner".to_string()
}

/// POST /student/delete-fingerprint/ accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct DeletionAccepted {
    pub command_id: CommandId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_statuses_parse() {
        let resp: CommandStatusResponse =
            serde_json::from_str(r#"{"status":"in_progress","message":"Place finger again"}"#)
                .unwrap();
        assert_eq!(resp.status, CommandStatus::InProgress);
        assert_eq!(resp.message.as_deref(), Some("Place finger again"));

        for (raw, expected) in [
            ("pending", CommandStatus::Pending),
            ("completed", CommandStatus::Completed),
            ("failed", CommandStatus::Failed),
            ("expired", CommandStatus::Expired),
        ] {
            assert_eq!(CommandStatus::from(raw.to_string()), expected);
        }
    }

    #[test]
    fn test_unknown_status_is_kept() {
        let resp: CommandStatusResponse =
            serde_json::from_str(r#"{"status":"queued_on_device"}"#).unwrap();
        assert_eq!(
            resp.status,
            CommandStatus::Unknown("queued_on_device".to_string())
        );
        assert!(!resp.status.is_terminal());
        assert_eq!(resp.status.to_string(), "queued_on_device");
        assert!(resp.message.is_none());
    }

    #[test]
    fn test_opaque_id_accepts_numbers_and_strings() {
        let accepted: EnrollmentAccepted = serde_json::from_str(
            r#"{"command_id": 42, "instruction": "Place finger", "fingerprint_id": 7}"#,
        )
        .unwrap();
        assert_eq!(accepted.command_id.as_str(), "42");
        assert_eq!(accepted.fingerprint_id.to_string(), "7");

        let deletion: DeletionAccepted =
            serde_json::from_str(r#"{"command_id": "cmd-9"}"#).unwrap();
        assert_eq!(deletion.command_id, OpaqueId::new("cmd-9"));
    }

    #[test]
    fn test_missing_instruction_gets_default() {
        let accepted: EnrollmentAccepted =
            serde_json::from_str(r#"{"command_id": 1, "fingerprint_id": 3}"#).unwrap();
        assert_eq!(accepted.instruction, "Place finger on scanner");
    }
}
