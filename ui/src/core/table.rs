//! Canonical tabular model shared by the bridge, the aggregator and the chart.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Column descriptor as delivered by the host. Every member is optional because
/// hosts are inconsistent about which of `name` / `field` they populate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Column {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Column {
    pub fn named<T: Into<String>>(name: T) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Lenient read: string members of an object are kept, anything else
    /// produces an anonymous column.
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(|s| s.to_string())
        };
        Self {
            name: text("name"),
            field: text("field"),
            kind: text("type"),
        }
    }

    /// Name used for display; empty names count as missing.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Positional row; length is not guaranteed to match the column count.
pub type Row = Vec<Value>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }
}

/// Dataset shown in standalone preview mode, when no host is attached.
pub static SAMPLE_TABLE: Lazy<Table> = Lazy::new(|| Table {
    columns: vec![
        Column {
            name: Some("Category".into()),
            field: None,
            kind: Some("string".into()),
        },
        Column {
            name: Some("Total".into()),
            field: None,
            kind: Some("number".into()),
        },
    ],
    rows: vec![
        vec![json!("North"), json!(120)],
        vec![json!("South"), json!(90)],
        vec![json!("East"), json!(150)],
        vec![json!("West"), json!(60)],
    ],
});

pub fn sample_table() -> Table {
    SAMPLE_TABLE.clone()
}
