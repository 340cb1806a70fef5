use serde::Serialize;

use super::{CustomData, FieldSchema, FieldType, SelectOption};

/// One input control of an attendee form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormControl {
    pub name: String,
    pub label: String,
    pub input_type: FieldType,
    pub required: bool,
    pub value: String,
    pub placeholder: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

/// Builds the controls for `schema` in declaration order, pre-filled from
/// `data`. Keys of `data` the schema no longer declares are not rendered.
pub fn render_fields(schema: &FieldSchema, data: &CustomData) -> Vec<FormControl> {
    schema
        .iter()
        .map(|(name, definition)| FormControl {
            name: name.to_string(),
            label: definition.label.clone(),
            input_type: definition.field_type,
            required: definition.required,
            value: data.get(name).cloned().unwrap_or_default(),
            placeholder: format!("Enter {}", definition.label.to_lowercase()),
            options: definition.options.clone(),
        })
        .collect()
}

/// Empty values for every declared field.
pub fn blank_form(schema: &FieldSchema) -> CustomData {
    schema
        .iter()
        .map(|(name, _)| (name.to_string(), String::new()))
        .collect()
}
