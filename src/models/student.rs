use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::models::command::OpaqueId;

/// A student record as listed by GET /students/.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub roll_no: u32,
    pub student_name: String,
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier_code: Option<String>,
    #[serde(default)]
    pub fingerprint_enrolled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint_id: Option<OpaqueId>,
}

/// The "add student" form. Parent fields are write-only on the service side.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewStudent {
    #[garde(range(min = 1))]
    pub roll_no: u32,

    #[garde(length(min = 1, max = 100))]
    pub student_name: String,

    #[garde(length(min = 1, max = 10))]
    pub class_name: String,

    #[garde(length(min = 1, max = 100))]
    pub parent_name: String,

    #[garde(custom(valid_contact))]
    pub contact: String,

    #[garde(length(max = 255))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[garde(length(max = 50))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier_code: Option<String>,
}

fn valid_contact(value: &str, _ctx: &()) -> garde::Result {
    let digits = value.chars().filter(char::is_ascii_digit).count();
    if !(7..=15).contains(&digits) {
        return Err(garde::Error::new("contact must contain 7 to 15 digits"));
    }
    Ok(())
}

/// A fingerprint scanner registered with the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Device {
    pub device_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub current_mode: String,
    /// Kept as sent; see [`Device::last_seen_at`].
    #[serde(default)]
    pub last_seen: Option<String>,
}

impl Device {
    pub fn last_seen_at(&self) -> Option<DateTime<Utc>> {
        self.last_seen
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }
}
