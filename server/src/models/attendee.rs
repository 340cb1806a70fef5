use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{EntityId, UnknownVariant};
use crate::schema::CustomData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrintStatus {
    #[default]
    NotPrinted,
    Printed,
}

impl PrintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrintStatus::NotPrinted => "not-printed",
            PrintStatus::Printed => "printed",
        }
    }
}

impl fmt::Display for PrintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for PrintStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "not-printed" => Ok(PrintStatus::NotPrinted),
            "printed" => Ok(PrintStatus::Printed),
            _ => Err(UnknownVariant {
                kind: "print status",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub id: EntityId,
    pub event_id: EntityId,
    #[sqlx(json)]
    pub custom_data: CustomData,
    pub photo_url: Option<String>,
    #[sqlx(try_from = "String")]
    pub print_status: PrintStatus,
    pub created_at: DateTime<Utc>,
}

impl Attendee {
    /// Non-blank value of a custom field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.custom_data
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn is_printed(&self) -> bool {
        self.print_status == PrintStatus::Printed
    }
}

/// Already validated attendee data, ready to be stored.
#[derive(Debug, Clone)]
pub struct NewAttendee {
    pub event_id: EntityId,
    pub custom_data: CustomData,
    pub photo_url: Option<String>,
    pub print_status: PrintStatus,
}

/// Registration form as submitted by an operator.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeForm {
    #[serde(default)]
    pub custom_data: CustomData,
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// Edits from the attendee screen. The print status only changes through
/// the print action.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeePatch {
    pub custom_data: Option<CustomData>,
    /// An empty string removes the photo.
    pub photo_url: Option<String>,
}

/// Empty photo references are stored as no photo.
pub fn normalize_photo_url(url: Option<String>) -> Option<String> {
    url.map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&PrintStatus::NotPrinted).unwrap(),
            "\"not-printed\""
        );
        let status: PrintStatus = serde_json::from_str("\"printed\"").unwrap();
        assert_eq!(status, PrintStatus::Printed);
        assert!(PrintStatus::try_from("done".to_string()).is_err());
    }

    #[test]
    fn test_patch_accepts_partial_bodies() {
        let patch: AttendeePatch = serde_json::from_str(r#"{"printStatus": "printed"}"#).unwrap();
        assert_eq!(patch.print_status, Some(PrintStatus::Printed));
        assert!(patch.custom_data.is_none());
    }

    #[test]
    fn test_blank_photo_url_is_dropped() {
        assert_eq!(normalize_photo_url(Some("  ".into())), None);
        assert_eq!(
            normalize_photo_url(Some("https://cdn.example.com/a.png".into())).as_deref(),
            Some("https://cdn.example.com/a.png")
        );
    }
}
