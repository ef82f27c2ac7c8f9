//! Structured (JSON) values.

use focus_model::{CellValue, Column, ValidationFinding, ValidationSettings};
use serde_json::Value as JsonValue;

use crate::util::collect_failures;

fn is_valid(value: &CellValue, object_only: bool) -> bool {
    let accept = |json: &JsonValue| !object_only || json.is_object();
    match value {
        CellValue::Null => true,
        CellValue::Json(json) => accept(json),
        CellValue::Text(text) => {
            let text = text.trim();
            text.is_empty()
                || serde_json::from_str::<JsonValue>(text)
                    .as_ref()
                    .is_ok_and(accept)
        }
        _ => false,
    }
}

pub fn check(column: &Column, settings: &ValidationSettings) -> Vec<ValidationFinding> {
    let object_only = settings.object_only();
    let message = if object_only {
        "JSON column contains values that are not valid JSON objects"
    } else {
        "JSON column contains values that are not valid JSON"
    };
    collect_failures(column.values(), |value| !is_valid(value, object_only))
        .into_finding("focus.json_object", message, column.name())
        .into_iter()
        .collect()
}
