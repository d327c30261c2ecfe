//! Data sources invoked on cache misses
//!
//! A [`DataSource`] resolves a verb's operation name and arguments into a
//! result. Dispatch is by name; an implementation that cannot resolve an
//! operation must say so with [`CacheError::MalformedVerb`].
//!
//! [`RecordSet`] is an in-memory table of JSON records that understands a
//! small query vocabulary:
//!
//! | verb                               | result                              |
//! |------------------------------------|-------------------------------------|
//! | `get[:columns]` / `all[:columns]`  | every record                        |
//! | `first[:columns]`                  | first record or `null`              |
//! | `count`                            | number of records                   |
//! | `take:n[,columns]`                 | first `n` records                   |
//! | `pluck:column`                     | the column's values                 |
//! | `paginate:per_page[,columns][,page]` | one page plus paging metadata     |
//!
//! Columns are `|`-separated (`get:id|name`); `*` selects everything.

use crate::cache::{types::CacheValue, verb::VerbArg};
use crate::error::{CacheError, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// Something that can produce data for a verb
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Run `operation` with positional `arguments`
    async fn execute(&self, operation: &str, arguments: &[VerbArg]) -> Result<CacheValue>;
}

/// In-memory table of JSON records
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<Value>,
}

impl RecordSet {
    /// Create a record set from JSON objects
    pub fn new(records: Vec<Value>) -> Self {
        Self { records }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if there are no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose `attribute` loosely equals `value`
    pub fn filter_by_attribute(&self, attribute: &str, value: Option<&Value>) -> Vec<Value> {
        filter_by_attribute(&self.records, attribute, value)
    }

    fn project(&self, records: &[Value], columns: Option<&VerbArg>) -> Vec<Value> {
        let columns = match columns.map(VerbArg::to_list) {
            Some(columns) if !columns.iter().any(|c| c == "*") => columns,
            _ => return records.to_vec(),
        };

        records
            .iter()
            .map(|record| {
                let mut projected = Map::new();
                for column in &columns {
                    if let Some(value) = record.get(column) {
                        projected.insert(column.clone(), value.clone());
                    }
                }
                Value::Object(projected)
            })
            .collect()
    }

    fn paginate(&self, arguments: &[VerbArg]) -> Result<CacheValue> {
        let per_page = required_count("paginate", arguments.first())?;
        if per_page == 0 {
            return Err(CacheError::malformed_verb(
                "paginate",
                "per_page must be greater than 0",
            ));
        }

        let page = match arguments.get(2) {
            Some(arg) => optional_count("paginate", arg)?.max(1),
            None => 1,
        };

        let total = self.records.len();
        let last_page = total.div_ceil(per_page).max(1);
        let start = (page - 1).saturating_mul(per_page).min(total);
        let end = start.saturating_add(per_page).min(total);

        Ok(json!({
            "data": self.project(&self.records[start..end], arguments.get(1)),
            "total": total,
            "per_page": per_page,
            "current_page": page,
            "last_page": last_page,
        }))
    }
}

#[async_trait]
impl DataSource for RecordSet {
    async fn execute(&self, operation: &str, arguments: &[VerbArg]) -> Result<CacheValue> {
        match operation {
            "get" | "all" => Ok(Value::Array(self.project(&self.records, arguments.first()))),
            "first" => Ok(self
                .project(&self.records[..self.records.len().min(1)], arguments.first())
                .into_iter()
                .next()
                .unwrap_or(Value::Null)),
            "count" => Ok(json!(self.records.len())),
            "take" => {
                let n = required_count("take", arguments.first())?.min(self.records.len());
                Ok(Value::Array(self.project(&self.records[..n], arguments.get(1))))
            }
            "pluck" => {
                let column = arguments
                    .first()
                    .and_then(VerbArg::as_str)
                    .ok_or_else(|| CacheError::malformed_verb("pluck", "expected a column name"))?;
                Ok(Value::Array(
                    self.records
                        .iter()
                        .map(|record| record.get(column).cloned().unwrap_or(Value::Null))
                        .collect(),
                ))
            }
            "paginate" => self.paginate(arguments),
            other => Err(CacheError::malformed_verb(other, "unknown operation")),
        }
    }
}

fn required_count(operation: &str, arg: Option<&VerbArg>) -> Result<usize> {
    match arg {
        Some(arg) => optional_count(operation, arg),
        None => Err(CacheError::malformed_verb(operation, "expected a count")),
    }
}

fn optional_count(operation: &str, arg: &VerbArg) -> Result<usize> {
    arg.as_u64().map(|n| n as usize).ok_or_else(|| {
        CacheError::malformed_verb(operation, format!("'{}' is not a count", arg))
    })
}

/// Items whose `attribute` is set and loosely equals `value`.
///
/// A missing or falsy `value` (null, false, 0, empty string, "0") matches
/// nothing, as does an item without the attribute.
pub fn filter_by_attribute(items: &[Value], attribute: &str, value: Option<&Value>) -> Vec<Value> {
    let wanted = match value {
        Some(wanted) if is_truthy(wanted) => wanted,
        _ => return Vec::new(),
    };

    items
        .iter()
        .filter(|item| match item.get(attribute) {
            Some(Value::Null) | None => false,
            Some(actual) => loosely_equal(actual, wanted),
        })
        .cloned()
        .collect()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn loosely_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            match (s.trim().parse::<f64>(), n.as_f64()) {
                (Ok(parsed), Some(number)) => parsed == number,
                _ => false,
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::verb::Verb;

    fn orders() -> RecordSet {
        RecordSet::new(
            (1..=5)
                .map(|id| {
                    let status = if id % 2 == 0 { "open" } else { "closed" };
                    json!({ "id": id, "status": status, "total": id * 10 })
                })
                .collect(),
        )
    }

    async fn run(source: &RecordSet, verb: &str) -> Result<Value> {
        let verb = Verb::parse(verb);
        source.execute(&verb.operation, &verb.arguments).await
    }

    #[tokio::test]
    async fn test_get_and_count() {
        let source = orders();

        let all = run(&source, "get").await.unwrap();
        assert_eq!(all.as_array().unwrap().len(), 5);

        assert_eq!(run(&source, "count").await.unwrap(), json!(5));
    }

    #[tokio::test]
    async fn test_get_with_columns() {
        let source = orders();

        let rows = run(&source, "get:id|status").await.unwrap();
        assert_eq!(rows[0], json!({ "id": 1, "status": "closed" }));

        let rows = run(&source, "get:*").await.unwrap();
        assert_eq!(rows[0]["total"], json!(10));
    }

    #[tokio::test]
    async fn test_first_and_take() {
        let source = orders();

        assert_eq!(run(&source, "first:id").await.unwrap(), json!({ "id": 1 }));
        assert_eq!(run(&source, "take:2").await.unwrap().as_array().unwrap().len(), 2);
        assert_eq!(run(&source, "take:99").await.unwrap().as_array().unwrap().len(), 5);

        let empty = RecordSet::default();
        assert_eq!(run(&empty, "first").await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_pluck() {
        let source = orders();
        assert_eq!(run(&source, "pluck:id").await.unwrap(), json!([1, 2, 3, 4, 5]));
    }

    #[tokio::test]
    async fn test_paginate() {
        let source = orders();

        let page = run(&source, "paginate:2,id|total,3").await.unwrap();
        assert_eq!(page["data"], json!([{ "id": 5, "total": 50 }]));
        assert_eq!(page["total"], json!(5));
        assert_eq!(page["last_page"], json!(3));
        assert_eq!(page["current_page"], json!(3));

        let page = run(&source, "paginate:15,id|status").await.unwrap();
        assert_eq!(page["data"].as_array().unwrap().len(), 5);
        assert_eq!(page["last_page"], json!(1));
    }

    #[tokio::test]
    async fn test_paginate_huge_page_size() {
        let source = orders();

        let page = run(&source, "paginate:18446744073709551615,*,2").await.unwrap();
        assert_eq!(page["data"], json!([]));
        assert_eq!(page["last_page"], json!(1));
        assert_eq!(page["current_page"], json!(2));
    }

    #[tokio::test]
    async fn test_unknown_operation_is_malformed() {
        let source = orders();

        let err = run(&source, "explode:now").await.unwrap_err();
        assert!(matches!(err, CacheError::MalformedVerb { ref operation, .. } if operation == "explode"));

        assert!(matches!(
            run(&source, "take:many").await,
            Err(CacheError::MalformedVerb { .. })
        ));
        assert!(matches!(
            run(&source, "paginate:0").await,
            Err(CacheError::MalformedVerb { .. })
        ));
        assert!(matches!(
            run(&source, "pluck").await,
            Err(CacheError::MalformedVerb { .. })
        ));
    }

    #[test]
    fn test_filter_by_attribute_matches() {
        let items = vec![
            json!({ "status": "open", "id": 1 }),
            json!({ "status": "closed", "id": 2 }),
            json!({ "status": "open", "id": 3 }),
        ];

        let open = filter_by_attribute(&items, "status", Some(&json!("open")));
        assert_eq!(open.len(), 2);

        let by_id = filter_by_attribute(&items, "id", Some(&json!("2")));
        assert_eq!(by_id, vec![json!({ "status": "closed", "id": 2 })]);
    }

    #[test]
    fn test_filter_by_attribute_without_value_matches_nothing() {
        let items = vec![json!({ "status": "open" }), json!({ "status": "closed" })];

        assert!(filter_by_attribute(&items, "status", None).is_empty());
        assert!(filter_by_attribute(&items, "status", Some(&json!(""))).is_empty());
        assert!(filter_by_attribute(&items, "missing", Some(&json!("open"))).is_empty());
    }

    #[test]
    fn test_record_set_filter_by_attribute() {
        let source = orders();
        assert_eq!(source.filter_by_attribute("status", Some(&json!("open"))).len(), 2);
        assert_eq!(source.len(), 5);
        assert!(!source.is_empty());
    }
}
