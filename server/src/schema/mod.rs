//! Per-event custom field schemas: declaration, form rendering and
//! validation of submitted attendee data.

use std::collections::BTreeMap;

pub mod field;
pub mod form;
pub mod validate;

pub use field::{FieldDefinition, FieldSchema, FieldType, SelectOption};
pub use form::{blank_form, render_fields, FormControl};
pub use validate::{
    missing_required, validate_custom_data, validate_definition, validate_required, SchemaError,
};

/// Attendee values keyed by schema field name.
pub type CustomData = BTreeMap<String, String>;
