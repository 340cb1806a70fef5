use std::collections::BTreeSet;

use chrono::NaiveDate;
use thiserror::Error;

use super::{CustomData, FieldDefinition, FieldSchema, FieldType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Please fill in all required fields: {}", .0.join(", "))]
    MissingRequired(Vec<String>),

    #[error("Unknown field(s): {}", .0.join(", "))]
    UnknownFields(Vec<String>),

    #[error("Field '{field}' {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid schema: {0}")]
    InvalidDefinition(String),
}

/// Required fields of `schema` whose value in `data` is absent or blank.
pub fn missing_required(schema: &FieldSchema, data: &CustomData) -> Vec<String> {
    schema
        .required_fields()
        .filter(|name| data.get(*name).map_or(true, |value| value.trim().is_empty()))
        .map(str::to_string)
        .collect()
}

pub fn validate_required(schema: &FieldSchema, data: &CustomData) -> Result<(), SchemaError> {
    let missing = missing_required(schema, data);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::MissingRequired(missing))
    }
}

/// Merges `submitted` over `stored` and checks the result against `schema`.
///
/// A submitted key must be declared by the schema, unless it is a key the
/// record already holds and the value is unchanged. Such legacy keys survive
/// on the record but cannot be edited. Nothing is returned unless every check
/// passes.
pub fn validate_custom_data(
    schema: &FieldSchema,
    stored: &CustomData,
    submitted: CustomData,
) -> Result<CustomData, SchemaError> {
    let unknown: Vec<String> = submitted
        .iter()
        .filter(|(name, value)| {
            !schema.contains(name) && stored.get(*name).map_or(true, |old| old != *value)
        })
        .map(|(name, _)| name.clone())
        .collect();
    if !unknown.is_empty() {
        return Err(SchemaError::UnknownFields(unknown));
    }

    for (name, value) in &submitted {
        if let Some(definition) = schema.get(name) {
            check_value(name, definition, value)?;
        }
    }

    let mut merged = stored.clone();
    merged.extend(submitted);
    validate_required(schema, &merged)?;
    Ok(merged)
}

fn check_value(name: &str, definition: &FieldDefinition, value: &str) -> Result<(), SchemaError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }

    let reason = match definition.field_type {
        FieldType::Text => None,
        FieldType::Email => (!looks_like_email(value)).then(|| "must be an email address".to_string()),
        FieldType::Number => match value.parse::<f64>() {
            Ok(number) if number.is_finite() => None,
            _ => Some("must be a number".to_string()),
        },
        FieldType::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .err()
            .map(|_| "must be a date formatted YYYY-MM-DD".to_string()),
        FieldType::Select => {
            let allowed = definition.options.iter().any(|option| option.value == value);
            (!allowed).then(|| {
                let values: Vec<&str> = definition
                    .options
                    .iter()
                    .map(|option| option.value.as_str())
                    .collect();
                format!("must be one of: {}", values.join(", "))
            })
        }
    };

    match reason {
        Some(reason) => Err(SchemaError::InvalidValue {
            field: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

/// Checks the declarations themselves, before an event schema is stored.
pub fn validate_definition(schema: &FieldSchema) -> Result<(), SchemaError> {
    for (name, definition) in schema.iter() {
        if name.trim().is_empty() {
            return Err(SchemaError::InvalidDefinition(
                "field names must not be blank".to_string(),
            ));
        }
        if definition.label.trim().is_empty() {
            return Err(SchemaError::InvalidDefinition(format!(
                "field '{name}' needs a label"
            )));
        }
        if definition.field_type == FieldType::Select {
            if definition.options.is_empty() {
                return Err(SchemaError::InvalidDefinition(format!(
                    "select field '{name}' needs at least one option"
                )));
            }
            let mut seen = BTreeSet::new();
            if let Some(dup) = definition
                .options
                .iter()
                .find(|option| !seen.insert(option.value.as_str()))
            {
                return Err(SchemaError::InvalidDefinition(format!(
                    "select field '{name}' repeats option '{}'",
                    dup.value
                )));
            }
        } else if !definition.options.is_empty() {
            return Err(SchemaError::InvalidDefinition(format!(
                "only select fields take options, '{name}' is {}",
                definition.field_type
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SelectOption;

    fn data(pairs: &[(&str, &str)]) -> CustomData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn conference_schema() -> FieldSchema {
        FieldSchema::new()
            .with_field("name", FieldDefinition::new(FieldType::Text, "Name").required())
            .with_field("email", FieldDefinition::new(FieldType::Email, "Email"))
            .with_field("age", FieldDefinition::new(FieldType::Number, "Age"))
            .with_field("arrival", FieldDefinition::new(FieldType::Date, "Arrival"))
            .with_field(
                "shirt",
                FieldDefinition::new(FieldType::Select, "Shirt")
                    .with_options(vec![SelectOption::new("s", "S"), SelectOption::new("m", "M")]),
            )
    }

    #[test]
    fn test_blank_required_value_is_missing() {
        let schema = conference_schema();
        let err = validate_custom_data(&schema, &CustomData::new(), data(&[("name", "   ")]))
            .unwrap_err();
        assert_eq!(err, SchemaError::MissingRequired(vec!["name".into()]));
        assert_eq!(
            err.to_string(),
            "Please fill in all required fields: name"
        );
    }

    #[test]
    fn test_missing_fields_are_joined_in_schema_order() {
        let schema = FieldSchema::default_attendee_fields();
        let missing = missing_required(&schema, &CustomData::new());
        assert_eq!(missing, vec!["name", "email"]);
        assert_eq!(
            validate_required(&schema, &CustomData::new())
                .unwrap_err()
                .to_string(),
            "Please fill in all required fields: name, email"
        );
    }

    #[test]
    fn test_valid_submission_is_returned_merged() {
        let schema = conference_schema();
        let merged = validate_custom_data(
            &schema,
            &CustomData::new(),
            data(&[
                ("name", "Alice"),
                ("email", "alice@example.com"),
                ("age", "31"),
                ("arrival", "2026-05-04"),
                ("shirt", "m"),
            ]),
        )
        .unwrap();
        assert_eq!(merged.len(), 5);
    }

    #[test]
    fn test_typed_values_are_checked() {
        let schema = conference_schema();
        for (field, value) in [
            ("email", "not-an-email"),
            ("age", "thirty"),
            ("arrival", "04/05/2026"),
            ("shirt", "xl"),
        ] {
            let err = validate_custom_data(
                &schema,
                &CustomData::new(),
                data(&[("name", "Alice"), (field, value)]),
            )
            .unwrap_err();
            assert!(
                matches!(&err, SchemaError::InvalidValue { field: f, .. } if f == field),
                "{field}: {err:?}"
            );
        }
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let schema = conference_schema();
        let err = validate_custom_data(
            &schema,
            &CustomData::new(),
            data(&[("name", "Alice"), ("nickname", "Al")]),
        )
        .unwrap_err();
        assert_eq!(err, SchemaError::UnknownFields(vec!["nickname".into()]));
    }

    #[test]
    fn test_legacy_keys_survive_but_cannot_change() {
        let schema = conference_schema();
        let stored = data(&[("name", "Alice"), ("badge", "VIP")]);

        let merged =
            validate_custom_data(&schema, &stored, data(&[("name", "Alicia"), ("badge", "VIP")]))
                .unwrap();
        assert_eq!(merged.get("badge").map(String::as_str), Some("VIP"));
        assert_eq!(merged.get("name").map(String::as_str), Some("Alicia"));

        let err = validate_custom_data(&schema, &stored, data(&[("badge", "Staff")]))
            .unwrap_err();
        assert_eq!(err, SchemaError::UnknownFields(vec!["badge".into()]));
    }

    #[test]
    fn test_definition_checks() {
        assert!(validate_definition(&conference_schema()).is_ok());

        let no_options = FieldSchema::new()
            .with_field("shirt", FieldDefinition::new(FieldType::Select, "Shirt"));
        assert!(validate_definition(&no_options).is_err());

        let no_label = FieldSchema::new().with_field("x", FieldDefinition::new(FieldType::Text, " "));
        assert!(validate_definition(&no_label).is_err());

        let repeated = FieldSchema::new().with_field(
            "shirt",
            FieldDefinition::new(FieldType::Select, "Shirt")
                .with_options(vec![SelectOption::new("s", "S"), SelectOption::new("s", "Small")]),
        );
        assert!(validate_definition(&repeated).is_err());
    }

    #[test]
    fn test_email_shape() {
        assert!(looks_like_email("a@b.co"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.co"));
        assert!(!looks_like_email("a@@b.co"));
        assert!(!looks_like_email("a b@c.co"));
        assert!(!looks_like_email("a@b..co"));
    }
}
