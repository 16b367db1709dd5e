//! Table → categorical series aggregation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::table::Table;

pub const DEFAULT_DIMENSION_NAME: &str = "Category";
pub const DEFAULT_MEASURE_NAME: &str = "Value";
pub const BLANK_CATEGORY: &str = "(Blank)";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesPoint {
    pub category: String,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new<T: Into<String>>(category: T, value: f64) -> Self {
        Self {
            category: category.into(),
            value,
        }
    }
}

/// Aggregated view of a table plus the labels the legend needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesSummary {
    pub dimension_name: String,
    pub measure_name: String,
    /// Every input row, including rows dropped for an invalid value.
    pub row_count: usize,
    pub series: Vec<SeriesPoint>,
}

impl Default for SeriesSummary {
    fn default() -> Self {
        Self {
            dimension_name: DEFAULT_DIMENSION_NAME.to_string(),
            measure_name: DEFAULT_MEASURE_NAME.to_string(),
            row_count: 0,
            series: Vec::new(),
        }
    }
}

/// Sum column 1 per distinct column 0 value, sorted descending by total.
///
/// Equal totals keep the order in which their category was first seen.
pub fn aggregate(table: &Table) -> SeriesSummary {
    let mut order: Vec<SeriesPoint> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for row in &table.rows {
        let Some(value) = row.get(1).and_then(coerce_number) else {
            continue;
        };
        let category = category_label(row.first());

        match slots.get(&category) {
            Some(&slot) => order[slot].value += value,
            None => {
                slots.insert(category.clone(), order.len());
                order.push(SeriesPoint { category, value });
            }
        }
    }

    order.sort_by(|a, b| b.value.total_cmp(&a.value));

    SeriesSummary {
        dimension_name: column_name(table, 0, DEFAULT_DIMENSION_NAME),
        measure_name: column_name(table, 1, DEFAULT_MEASURE_NAME),
        row_count: table.rows.len(),
        series: order,
    }
}

pub fn aggregate_optional(table: Option<&Table>) -> SeriesSummary {
    table.map(aggregate).unwrap_or_default()
}

fn column_name(table: &Table, index: usize, fallback: &str) -> String {
    table
        .column(index)
        .and_then(|column| column.display_name())
        .unwrap_or(fallback)
        .to_string()
}

/// Label for a dimension cell; missing, null and empty cells share one bucket.
pub fn category_label(cell: Option<&Value>) -> String {
    match cell {
        None | Some(Value::Null) => BLANK_CATEGORY.to_string(),
        Some(Value::String(text)) if text.is_empty() => BLANK_CATEGORY.to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number
            .as_f64()
            .map(shortest_number)
            .unwrap_or_else(|| number.to_string()),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Numeric value of a measure cell, or `None` when the cell is not a finite number.
pub fn coerce_number(cell: &Value) -> Option<f64> {
    let value = match cell {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// Shortest round-trip text for a number, switching to exponent form outside
/// `[1e-6, 1e21)` the way browsers print numbers (`1e+21`, `1.5e-7`).
fn shortest_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return format!("{value}");
    }
    let exponent = format!("{value:e}");
    match exponent.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
        _ => exponent,
    }
}
