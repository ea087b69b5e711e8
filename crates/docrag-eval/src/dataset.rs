use std::fs;
use std::path::Path;

use docrag_core::error::{Error, Result};
use docrag_core::types::EvaluationItem;

/// Read the golden dataset: a JSON array of evaluation items, kept in file order.
///
/// Only structure is checked. Labels are trusted as given.
pub fn load_dataset(path: &Path) -> Result<Vec<EvaluationItem>> {
    let body = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let items: Vec<EvaluationItem> = serde_json::from_str(&body).map_err(|e| Error::parse(path, e))?;
    tracing::info!(path = %path.display(), items = items.len(), "golden dataset loaded");
    Ok(items)
}
