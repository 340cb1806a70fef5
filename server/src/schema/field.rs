use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Date,
    Number,
    Select,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Date => "date",
            FieldType::Number => "number",
            FieldType::Select => "select",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Declaration of one custom attendee field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

impl FieldDefinition {
    pub fn new(field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            field_type,
            required: false,
            label: label.into(),
            options: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }
}

/// Ordered field-name to definition mapping of one event.
///
/// Declaration order is kept because forms are rendered in it. Keys are
/// unique: inserting an existing name replaces its definition in place, and a
/// JSON object carrying the same key twice fails to deserialize.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSchema {
    fields: Vec<(String, FieldDefinition)>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, definition: FieldDefinition) -> Self {
        self.insert(name, definition);
        self
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        definition: FieldDefinition,
    ) -> Option<FieldDefinition> {
        let name = name.into();
        match self.fields.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, definition)),
            None => {
                self.fields.push((name, definition));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, definition)| definition)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDefinition)> {
        self.fields
            .iter()
            .map(|(key, definition)| (key.as_str(), definition))
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, definition)| definition.required)
            .map(|(key, _)| key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Schema used for new events when none is supplied.
    pub fn default_attendee_fields() -> Self {
        Self::new()
            .with_field(
                "name",
                FieldDefinition::new(FieldType::Text, "Full Name").required(),
            )
            .with_field(
                "email",
                FieldDefinition::new(FieldType::Email, "Email Address").required(),
            )
            .with_field("company", FieldDefinition::new(FieldType::Text, "Company"))
    }
}

impl Serialize for FieldSchema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, definition) in &self.fields {
            map.serialize_entry(name, definition)?;
        }
        map.end()
    }
}

struct FieldSchemaVisitor;

impl<'de> Visitor<'de> for FieldSchemaVisitor {
    type Value = FieldSchema;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of field names to field definitions")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut schema = FieldSchema::new();
        while let Some((name, definition)) = access.next_entry::<String, FieldDefinition>()? {
            if schema.contains(&name) {
                return Err(de::Error::custom(format!(
                    "duplicate schema field `{name}`"
                )));
            }
            schema.fields.push((name, definition));
        }
        Ok(schema)
    }
}

impl<'de> Deserialize<'de> for FieldSchema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(FieldSchemaVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_order_survives_json() {
        let json = r#"{
            "zeta": {"type": "text", "label": "Zeta"},
            "alpha": {"type": "number", "required": true, "label": "Alpha"}
        }"#;
        let schema: FieldSchema = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = schema.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);

        let encoded = serde_json::to_string(&schema).unwrap();
        assert!(encoded.find("zeta").unwrap() < encoded.find("alpha").unwrap());
    }

    #[test]
    fn test_duplicate_keys_are_rejected() {
        let json = r#"{
            "name": {"type": "text", "label": "Name"},
            "name": {"type": "email", "label": "Other"}
        }"#;
        let err = serde_json::from_str::<FieldSchema>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate schema field `name`"));
    }

    #[test]
    fn test_unknown_field_type_is_rejected() {
        let json = r#"{"name": {"type": "checkbox", "label": "Name"}}"#;
        assert!(serde_json::from_str::<FieldSchema>(json).is_err());
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut schema = FieldSchema::default_attendee_fields();
        let previous = schema.insert("email", FieldDefinition::new(FieldType::Text, "Mail"));
        assert_eq!(previous.map(|d| d.field_type), Some(FieldType::Email));
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.iter().nth(1).map(|(name, _)| name), Some("email"));
    }

    #[test]
    fn test_required_fields_of_default_schema() {
        let schema = FieldSchema::default_attendee_fields();
        let required: Vec<&str> = schema.required_fields().collect();
        assert_eq!(required, vec!["name", "email"]);
    }
}
