//! Ingestion edge: parses and validates factor batches before any aggregation.
//!
//! A single bad item rejects the whole batch. Errors name the item index and,
//! when it could be read, the item's category.

use serde_json::Value;
use url::Url;

use super::engine::AuditInput;
use crate::domain::models::FactorItem;
use crate::error::{AuditError, Result};

/// Parse a JSON array of factor items.
pub fn parse_batch(json: &str) -> Result<Vec<FactorItem>> {
    let values: Vec<Value> = serde_json::from_str(json)?;
    let items = parse_values(values)?;
    validate_items(&items)?;
    Ok(items)
}

/// Parse either a bare item array or a full `AuditInput` object.
pub fn parse_input(json: &str) -> Result<AuditInput> {
    let value: Value = serde_json::from_str(json)?;
    let input = match value {
        Value::Array(values) => AuditInput::from(parse_values(values)?),
        Value::Object(mut map) => {
            let items = match map.remove("items") {
                Some(Value::Array(values)) => parse_values(values)?,
                Some(_) => {
                    return Err(AuditError::malformed(0, None, "'items' must be an array"));
                }
                None => Vec::new(),
            };
            let mut input: AuditInput = serde_json::from_value(Value::Object(map))?;
            input.items = items;
            input
        }
        _ => {
            return Err(AuditError::malformed(
                0,
                None,
                "expected an array of factor items or an audit input object",
            ))
        }
    };
    validate_items(&input.items)?;
    Ok(input)
}

fn parse_values(values: Vec<Value>) -> Result<Vec<FactorItem>> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let category = value
                .get("category")
                .and_then(Value::as_str)
                .map(str::to_string);
            serde_json::from_value(value)
                .map_err(|e| AuditError::malformed(index, category.as_deref(), e.to_string()))
        })
        .collect()
}

/// Checks serde cannot express: non-empty names, finite in-range scores and
/// parsable page URLs.
pub fn validate_items(items: &[FactorItem]) -> Result<()> {
    for (index, item) in items.iter().enumerate() {
        let fail = |reason: String| -> Result<()> {
            Err(AuditError::malformed(index, Some(item.category.as_str()), reason))
        };

        if item.name.trim().is_empty() {
            return fail("name must not be empty".to_string());
        }
        if let Some(score) = item.score {
            if !score.is_finite() || !(0.0..=100.0).contains(&score) {
                return fail(format!("score must be within 0-100 (got {})", score));
            }
        }
        if let Some(url) = &item.page_url {
            if let Err(e) = Url::parse(url) {
                return fail(format!("pageUrl '{}' is not a valid URL: {}", url, e));
            }
        }
        if let Some(priority) = item.analysis_details.as_ref().and_then(|d| d.priority) {
            if !priority.is_finite() {
                return fail("analysisDetails.priority must be finite".to_string());
            }
        }
    }
    Ok(())
}
