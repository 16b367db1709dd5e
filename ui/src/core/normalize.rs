//! Payload normalization: recognizes the table encodings hosts are known to
//! send and converts them into a canonical [`Table`].
//!
//! Matchers run in a fixed priority order and the first one that claims the
//! payload decides the result:
//!
//! 1. `columns` + `rows` arrays (already canonical)
//! 2. nested `table`, `data` or `dataset` member (first present wins)
//! 3. `columns` + `records` (row objects keyed by column name or field)
//! 4. `columns` + `values` (columnar arrays keyed by column name)
//!
//! The module is pure; it never performs I/O.

use serde_json::{Map, Value};

use super::table::{Column, Row, Table};

/// Outcome of a single matcher that recognized the payload shape.
enum Claim {
    Table(Table),
    /// The matcher owns this shape but its content did not yield a table.
    Rejected,
}

type Matcher = fn(&Map<String, Value>) -> Option<Claim>;

const MATCHERS: &[(&str, Matcher)] = &[
    ("canonical", match_canonical),
    ("nested", match_nested),
    ("records", match_records),
    ("columnar", match_columnar),
];

const NESTED_KEYS: [&str; 3] = ["table", "data", "dataset"];

/// Convert an arbitrary inbound payload into a [`Table`], or `None` when no
/// known encoding matches.
pub fn normalize(payload: &Value) -> Option<Table> {
    if !is_truthy(payload) {
        return None;
    }
    let object = payload.as_object()?;

    for (label, matcher) in MATCHERS {
        if let Some(claim) = matcher(object) {
            tracing::trace!(matcher = label, "payload shape recognized");
            return match claim {
                Claim::Table(table) => Some(table),
                Claim::Rejected => None,
            };
        }
    }

    None
}

fn match_canonical(payload: &Map<String, Value>) -> Option<Claim> {
    let columns = payload.get("columns")?.as_array()?;
    let rows = payload.get("rows")?.as_array()?;

    Some(Claim::Table(Table {
        columns: read_columns(columns),
        rows: rows.iter().map(read_row).collect(),
    }))
}

fn match_nested(payload: &Map<String, Value>) -> Option<Claim> {
    let inner = NESTED_KEYS
        .iter()
        .find_map(|key| payload.get(*key).filter(|value| is_truthy(value)))?;

    Some(match normalize(inner) {
        Some(table) => Claim::Table(table),
        None => Claim::Rejected,
    })
}

fn match_records(payload: &Map<String, Value>) -> Option<Claim> {
    let columns = payload.get("columns")?.as_array()?;
    let records = payload.get("records")?.as_array()?;
    let columns = read_columns(columns);

    let rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| record_cell(record, column))
                .collect::<Row>()
        })
        .collect();

    Some(Claim::Table(Table { columns, rows }))
}

fn match_columnar(payload: &Map<String, Value>) -> Option<Claim> {
    let columns = payload.get("columns")?.as_array()?;
    let values = payload.get("values").filter(|value| is_truthy(value))?;
    if !(values.is_object() || values.is_array()) {
        return None;
    }
    let columns = read_columns(columns);

    let series: Vec<Option<&Value>> = columns
        .iter()
        .map(|column| {
            column
                .name
                .as_deref()
                .and_then(|name| values.get(name))
                .filter(|value| is_truthy(value))
        })
        .collect();

    let row_count = series
        .iter()
        .map(|cells| cells.and_then(Value::as_array).map_or(0, Vec::len))
        .max()
        .unwrap_or(0);

    let rows = (0..row_count)
        .map(|index| {
            series
                .iter()
                .map(|cells| {
                    cells
                        .and_then(|cells| cells.get(index))
                        .cloned()
                        .unwrap_or(Value::Null)
                })
                .collect::<Row>()
        })
        .collect();

    Some(Claim::Table(Table { columns, rows }))
}

fn read_columns(columns: &[Value]) -> Vec<Column> {
    columns.iter().map(Column::from_value).collect()
}

/// Rows that are not arrays become empty rows so they still count toward the
/// table length but never contribute a value.
fn read_row(row: &Value) -> Row {
    row.as_array().cloned().unwrap_or_default()
}

fn record_cell(record: &Value, column: &Column) -> Value {
    let lookup = |key: Option<&String>| {
        key.and_then(|key| record.get(key.as_str()))
            .filter(|value| !value.is_null())
    };
    lookup(column.name.as_ref())
        .or_else(|| lookup(column.field.as_ref()))
        .cloned()
        .unwrap_or(Value::Null)
}

/// Presence test used for optional payload members: `null`, `false`, zero and
/// the empty string are treated as absent.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
