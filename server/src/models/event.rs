use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::EntityId;
use crate::schema::FieldSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EntityId,
    pub name: String,
    pub date: NaiveDate,
    pub location: String,
    #[sqlx(json)]
    pub schema: FieldSchema,
    pub template_id: Option<EntityId>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub location: String,
    #[serde(default = "FieldSchema::default_attendee_fields")]
    pub schema: FieldSchema,
    #[serde(default)]
    pub template_id: Option<EntityId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub location: Option<String>,
    pub schema: Option<FieldSchema>,
    pub template_id: Option<EntityId>,
}

impl Event {
    pub fn apply(&mut self, patch: EventPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(schema) = patch.schema {
            self.schema = schema;
        }
        if let Some(template_id) = patch.template_id {
            self.template_id = Some(template_id);
        }
    }

    /// Case-insensitive match on name or location.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term) || self.location.to_lowercase().contains(&term)
    }
}
