//! Prompt material shared by every technique
//!
//! The per-technique steering text lives in the technique catalog; this module
//! holds the parts that are identical across calls: the user-turn instruction
//! and the response schema the model must follow.

use serde_json::{json, Value};
use std::sync::LazyLock;

/// User-turn text sent alongside the image
pub const ANALYSIS_PROMPT: &str = "Analyze this food image according to your system instructions.";

/// Fields the model must return. Every field is required.
pub const REQUIRED_FIELDS: [&str; 5] = [
    "foodName",
    "portionEstimate",
    "macros",
    "confidenceScore",
    "reasoning",
];

static RESPONSE_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "OBJECT",
        "properties": {
            "foodName": {
                "type": "STRING",
                "description": "The identified name of the main food item."
            },
            "portionEstimate": {
                "type": "STRING",
                "description": "Estimated portion size (e.g., '1 cup', '200g')."
            },
            "macros": {
                "type": "OBJECT",
                "properties": {
                    "calories": { "type": "NUMBER", "description": "Total calories." },
                    "protein": { "type": "NUMBER", "description": "Protein in grams." },
                    "carbs": { "type": "NUMBER", "description": "Carbohydrates in grams." },
                    "fat": { "type": "NUMBER", "description": "Total fat in grams." }
                },
                "required": ["calories", "protein", "carbs", "fat"]
            },
            "confidenceScore": {
                "type": "NUMBER",
                "description": "Confidence score from 0 to 100."
            },
            "reasoning": {
                "type": "STRING",
                "description": "Brief explanation of how the estimate was derived."
            }
        },
        "required": REQUIRED_FIELDS
    })
});

/// Response schema in the service's OpenAPI-subset dialect
pub fn response_schema() -> &'static Value {
    &RESPONSE_SCHEMA
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_requires_every_field() {
        let schema = response_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(required, REQUIRED_FIELDS);

        let macro_required = schema["properties"]["macros"]["required"].as_array().unwrap();
        assert_eq!(macro_required.len(), 4);
    }

    #[test]
    fn test_schema_types() {
        let props = &response_schema()["properties"];
        assert_eq!(props["foodName"]["type"], "STRING");
        assert_eq!(props["confidenceScore"]["type"], "NUMBER");
        assert_eq!(props["macros"]["properties"]["calories"]["type"], "NUMBER");
    }
}
