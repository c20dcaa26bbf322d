//! Storage trait definitions and filter types.

use crate::error::Result;
use serde::{Serialize, de::DeserializeOwned};

/// Filter operations for querying records.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Field equals value
    Eq,
    /// Field does not equal value
    Ne,
    /// Field contains value (string/array)
    Contains,
    /// Field equals one of the values in an array
    In,
}

/// A filter for querying records.
#[derive(Debug, Clone)]
pub struct Filter {
    /// Field name to filter on
    pub field: String,
    /// Filter operation
    pub op: FilterOp,
    /// Value to compare against
    pub value: serde_json::Value,
}

impl Filter {
    /// Create an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Serialize) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value: serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Create a not-equal filter.
    pub fn ne(field: impl Into<String>, value: impl Serialize) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Ne,
            value: serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Create a contains filter.
    pub fn contains(field: impl Into<String>, value: impl Serialize) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Contains,
            value: serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Create a membership filter.
    pub fn is_in<T: Serialize>(field: impl Into<String>, values: &[T]) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::In,
            value: serde_json::to_value(values).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Check if a record matches this filter.
    pub fn matches(&self, record: &serde_json::Value) -> bool {
        let field_value = record.get(&self.field);

        match &self.op {
            FilterOp::Eq => match field_value {
                Some(v) => *v == self.value,
                None => self.value.is_null(),
            },
            FilterOp::Ne => match field_value {
                Some(v) => *v != self.value,
                None => !self.value.is_null(),
            },
            FilterOp::Contains => match field_value {
                Some(serde_json::Value::String(s)) => {
                    if let serde_json::Value::String(needle) = &self.value {
                        s.contains(needle.as_str())
                    } else {
                        false
                    }
                }
                Some(serde_json::Value::Array(arr)) => arr.contains(&self.value),
                _ => false,
            },
            FilterOp::In => match (&self.value, field_value) {
                (serde_json::Value::Array(options), Some(v)) => options.contains(v),
                (serde_json::Value::Array(options), None) => options.contains(&serde_json::Value::Null),
                _ => false,
            },
        }
    }
}

/// Trait for records that have an ID field.
pub trait HasId {
    /// Get the record's unique identifier.
    fn id(&self) -> &str;
}

/// Storage trait for CRUD operations on records.
pub trait Storage: Send + Sync {
    /// Create a new record.
    fn create<T: Serialize + DeserializeOwned + HasId>(&self, collection: &str, record: &T) -> Result<()>;

    /// Get a record by ID.
    fn get<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>>;

    /// Update an existing record.
    fn update<T: Serialize + DeserializeOwned + HasId>(&self, collection: &str, id: &str, record: &T) -> Result<()>;

    /// Update a record only if the stored version matches every `expected` filter.
    ///
    /// Returns false (and writes nothing) when the stored record no longer matches.
    fn update_if<T: Serialize + DeserializeOwned + HasId>(
        &self,
        collection: &str,
        id: &str,
        record: &T,
        expected: &[Filter],
    ) -> Result<bool>;

    /// Delete a record by ID.
    fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Query records with filters.
    fn query<T: DeserializeOwned>(&self, collection: &str, filters: &[Filter]) -> Result<Vec<T>>;

    /// List all records in a collection.
    fn list<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_eq_matches() {
        let filter = Filter::eq("status", "running");
        let record = json!({"id": "1", "status": "running"});
        assert!(filter.matches(&record));
    }

    #[test]
    fn test_filter_eq_no_match() {
        let filter = Filter::eq("status", "running");
        let record = json!({"id": "1", "status": "pending"});
        assert!(!filter.matches(&record));
    }

    #[test]
    fn test_filter_eq_null() {
        let filter = Filter::eq("ended_at", serde_json::Value::Null);
        assert!(filter.matches(&json!({"id": "1"})));
        assert!(filter.matches(&json!({"id": "1", "ended_at": null})));
        assert!(!filter.matches(&json!({"id": "1", "ended_at": "2026-01-01T00:00:00Z"})));
    }

    #[test]
    fn test_filter_ne_matches() {
        let filter = Filter::ne("status", "running");
        let record = json!({"id": "1", "status": "pending"});
        assert!(filter.matches(&record));
    }

    #[test]
    fn test_filter_contains_string() {
        let filter = Filter::contains("name", "promo");
        let record = json!({"id": "1", "name": "spring_promo"});
        assert!(filter.matches(&record));
    }

    #[test]
    fn test_filter_contains_array() {
        let filter = Filter::contains("tags", "vip");
        let record = json!({"id": "1", "tags": ["vip", "fr"]});
        assert!(filter.matches(&record));
    }

    #[test]
    fn test_filter_in_matches() {
        let filter = Filter::is_in("status", &["pending", "scheduled"]);
        assert!(filter.matches(&json!({"status": "scheduled"})));
        assert!(!filter.matches(&json!({"status": "failed"})));
        assert!(!filter.matches(&json!({"id": "1"})));
    }

    #[test]
    fn test_filter_eq_with_enum_value() {
        use crate::domain::ContactStatus;
        let filter = Filter::eq("status", ContactStatus::Pending);
        assert!(filter.matches(&json!({"status": "pending"})));
    }
}
