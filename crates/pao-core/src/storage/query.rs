//! Parameterized document queries.

use super::Document;
use serde_json::Value;
use std::cmp::Ordering;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

/// Equality filter with a bound value.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Attribute name.
    pub field: String,
    /// Bound value the attribute must equal.
    pub value: Value,
}

/// Sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    /// Attribute name.
    pub field: String,
    /// Direction.
    pub order: SortOrder,
}

/// Query over one collection: equality filters, sort keys, optional limit.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    /// Collection to scan.
    pub collection: String,
    /// Filters, all of which must match.
    pub filters: Vec<Filter>,
    /// Sort keys, most significant first.
    pub sort: Vec<SortKey>,
    /// Maximum number of documents returned.
    pub limit: Option<usize>,
}

impl DocumentQuery {
    /// Query every document of a collection.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            sort: Vec::new(),
            limit: None,
        }
    }

    /// Require `field == value`.
    pub fn filter_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Sort by `field`.
    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push(SortKey {
            field: field.into(),
            order,
        });
        self
    }

    /// Limit the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a document satisfies every filter.
    pub fn matches(&self, document: &Document) -> bool {
        self.filters
            .iter()
            .all(|f| document.get(&f.field) == Some(&f.value))
    }

    /// Order two documents by the sort keys.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for key in &self.sort {
            let ordering = compare_values(
                a.get(&key.field).unwrap_or(&Value::Null),
                b.get(&key.field).unwrap_or(&Value::Null),
            );
            let ordering = match key.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Total order over JSON values: null < bool < number < string < array < object.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (left, right) in x.iter().zip(y.iter()) {
                let ordering = compare_values(left, right);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Iterator over query results.
#[derive(Debug)]
pub struct Cursor {
    documents: std::vec::IntoIter<Document>,
}

impl Cursor {
    /// Wrap an already materialized result set.
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents: documents.into_iter(),
        }
    }
}

impl Iterator for Cursor {
    type Item = Document;

    fn next(&mut self) -> Option<Self::Item> {
        self.documents.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.documents.size_hint()
    }
}

impl ExactSizeIterator for Cursor {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_filter_matches() {
        let query = DocumentQuery::new("things").filter_eq("name", "a");
        assert!(query.matches(&doc(json!({"name": "a", "n": 1}))));
        assert!(!query.matches(&doc(json!({"name": "b"}))));
        assert!(!query.matches(&doc(json!({}))));
    }

    #[test]
    fn test_sort_compare() {
        let query = DocumentQuery::new("things")
            .sort_by("group", SortOrder::Asc)
            .sort_by("n", SortOrder::Desc);
        let a = doc(json!({"group": "x", "n": 1}));
        let b = doc(json!({"group": "x", "n": 2}));
        let c = doc(json!({"group": "y", "n": 0}));

        assert_eq!(query.compare(&a, &b), Ordering::Greater);
        assert_eq!(query.compare(&b, &c), Ordering::Less);
    }

    #[test]
    fn test_compare_values_across_types() {
        assert_eq!(compare_values(&json!(null), &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!(2), &json!(10.5)), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(compare_values(&json!([1, 2]), &json!([1])), Ordering::Greater);
    }

    #[test]
    fn test_cursor_iterates() {
        let cursor = Cursor::new(vec![doc(json!({"a": 1})), doc(json!({"a": 2}))]);
        assert_eq!(cursor.len(), 2);
        assert_eq!(cursor.count(), 2);
    }
}
