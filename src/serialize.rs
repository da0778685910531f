//! Declarative record serialization
//!
//! A record type declares its persisted fields as an explicit schema of
//! [`FieldDef`] entries instead of relying on runtime reflection. The
//! [`JsonRecord`] trait walks that schema to build a JSON-safe mapping:
//! scalars pass through, date/time values are pre-stringified, and
//! relationship fields are skipped unless explicitly requested, in which
//! case the related record is serialized one level deep through the same
//! contract. Because scalar values are plain JSON by construction, a
//! self-typed attribute can only be reached through a declared
//! `Relationship` entry; there is no path for accidental infinite
//! recursion.
//!
//! # Example
//!
//! ```rust
//! use restglue::serialize::{FieldDef, FieldValue, JsonRecord};
//! use serde_json::json;
//!
//! struct Tag {
//!     id: i64,
//!     label: String,
//! }
//!
//! impl JsonRecord for Tag {
//!     fn fields(&self) -> &'static [FieldDef] {
//!         const FIELDS: &[FieldDef] = &[FieldDef::scalar("id"), FieldDef::scalar("label")];
//!         FIELDS
//!     }
//!
//!     fn field(&self, name: &str) -> Option<FieldValue> {
//!         match name {
//!             "id" => Some(json!(self.id).into()),
//!             "label" => Some(json!(self.label).into()),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let tag = Tag { id: 7, label: "rust".to_string() };
//! let out = tag.to_json();
//! assert_eq!(out.get("id"), Some(&json!(7)));
//! assert_eq!(out.get("label"), Some(&json!("rust")));
//! ```

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

/// Kind tag for a declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain JSON-safe value (string, number, boolean, null)
    Scalar,
    /// Date/time value, stringified during serialization
    DateTime,
    /// Reference to another record, expanded only on request
    Relationship,
}

/// One entry in a record's declared schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name, also the key in the output mapping
    pub name: &'static str,
    /// What the field holds
    pub kind: FieldKind,
}

impl FieldDef {
    /// Declare a scalar field
    #[must_use]
    pub const fn scalar(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Scalar,
        }
    }

    /// Declare a date/time field
    #[must_use]
    pub const fn datetime(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::DateTime,
        }
    }

    /// Declare a relationship field
    #[must_use]
    pub const fn relationship(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Relationship,
        }
    }
}

/// Current value of a scalar or date/time field
///
/// The two time representations (timezone-aware and naive) are carried
/// as-is and stringified by [`JsonRecord::to_json_with`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Already JSON-safe
    Value(Value),
    /// Timezone-aware timestamp
    DateTime(DateTime<Utc>),
    /// Naive timestamp
    Naive(NaiveDateTime),
}

impl FieldValue {
    /// Convert into a JSON value, stringifying timestamps
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Value(value) => value,
            Self::DateTime(dt) => Value::String(dt.to_string()),
            Self::Naive(dt) => Value::String(dt.to_string()),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Naive(value)
    }
}

/// Convert a record to a JSON-safe mapping by walking its declared schema
pub trait JsonRecord {
    /// The record's declared schema
    fn fields(&self) -> &'static [FieldDef];

    /// Current value of a scalar or date/time field
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// The related record behind a relationship field
    ///
    /// The default implementation knows no relationships; types declaring
    /// `Relationship` entries override this. Returning `None` for a
    /// requested relationship serializes it as `null`.
    fn relationship(&self, _name: &str) -> Option<&dyn JsonRecord> {
        None
    }

    /// Serialize without expanding any relationships
    fn to_json(&self) -> Map<String, Value> {
        self.to_json_with(&BTreeSet::new())
    }

    /// Serialize, expanding the named relationships one level deep
    ///
    /// Related records are serialized through their own [`JsonRecord::to_json`],
    /// so nested relationships stay collapsed unless the related type
    /// expands them itself.
    fn to_json_with(&self, with_relationships: &BTreeSet<&str>) -> Map<String, Value> {
        let mut out = Map::new();
        for def in self.fields() {
            match def.kind {
                FieldKind::Relationship => {
                    if with_relationships.contains(def.name) {
                        let nested = self
                            .relationship(def.name)
                            .map(|record| Value::Object(record.to_json()))
                            .unwrap_or(Value::Null);
                        out.insert(def.name.to_string(), nested);
                    }
                }
                FieldKind::Scalar | FieldKind::DateTime => {
                    if let Some(value) = self.field(def.name) {
                        out.insert(def.name.to_string(), value.into_value());
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use uuid::Uuid;

    struct Author {
        id: Uuid,
        name: String,
    }

    impl JsonRecord for Author {
        fn fields(&self) -> &'static [FieldDef] {
            const FIELDS: &[FieldDef] = &[FieldDef::scalar("id"), FieldDef::scalar("name")];
            FIELDS
        }

        fn field(&self, name: &str) -> Option<FieldValue> {
            match name {
                "id" => Some(json!(self.id).into()),
                "name" => Some(json!(self.name).into()),
                _ => None,
            }
        }
    }

    struct Post {
        id: i64,
        title: String,
        subtitle: Option<String>,
        rating: f64,
        published: bool,
        created_at: DateTime<Utc>,
        updated_at: NaiveDateTime,
        author: Author,
    }

    impl JsonRecord for Post {
        fn fields(&self) -> &'static [FieldDef] {
            const FIELDS: &[FieldDef] = &[
                FieldDef::scalar("id"),
                FieldDef::scalar("title"),
                FieldDef::scalar("subtitle"),
                FieldDef::scalar("rating"),
                FieldDef::scalar("published"),
                FieldDef::datetime("created_at"),
                FieldDef::datetime("updated_at"),
                FieldDef::relationship("author"),
            ];
            FIELDS
        }

        fn field(&self, name: &str) -> Option<FieldValue> {
            match name {
                "id" => Some(json!(self.id).into()),
                "title" => Some(json!(self.title).into()),
                "subtitle" => Some(json!(self.subtitle).into()),
                "rating" => Some(json!(self.rating).into()),
                "published" => Some(json!(self.published).into()),
                "created_at" => Some(self.created_at.into()),
                "updated_at" => Some(self.updated_at.into()),
                _ => None,
            }
        }

        fn relationship(&self, name: &str) -> Option<&dyn JsonRecord> {
            match name {
                "author" => Some(&self.author),
                _ => None,
            }
        }
    }

    fn sample_post() -> Post {
        let created_at = Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap();
        Post {
            id: 1,
            title: "First".to_string(),
            subtitle: None,
            rating: 4.5,
            published: true,
            created_at,
            updated_at: created_at.naive_utc(),
            author: Author {
                id: Uuid::nil(),
                name: "Alice".to_string(),
            },
        }
    }

    #[test]
    fn test_scalars_pass_through_unchanged() {
        let out = sample_post().to_json();
        assert_eq!(out.get("id"), Some(&json!(1)));
        assert_eq!(out.get("title"), Some(&json!("First")));
        assert_eq!(out.get("subtitle"), Some(&Value::Null));
        assert_eq!(out.get("rating"), Some(&json!(4.5)));
        assert_eq!(out.get("published"), Some(&json!(true)));
    }

    #[test]
    fn test_both_time_representations_are_stringified() {
        let post = sample_post();
        let out = post.to_json();
        assert_eq!(
            out.get("created_at"),
            Some(&Value::String(post.created_at.to_string()))
        );
        assert_eq!(
            out.get("updated_at"),
            Some(&Value::String(post.updated_at.to_string()))
        );
    }

    #[test]
    fn test_relationship_absent_by_default() {
        let out = sample_post().to_json();
        assert!(!out.contains_key("author"));
        assert_eq!(out.len(), 7);
    }

    #[test]
    fn test_relationship_expanded_on_request() {
        let post = sample_post();
        let out = post.to_json_with(&BTreeSet::from(["author"]));
        assert_eq!(
            out.get("author"),
            Some(&Value::Object(post.author.to_json()))
        );
    }

    #[test]
    fn test_undeclared_relationship_request_is_ignored() {
        let out = sample_post().to_json_with(&BTreeSet::from(["reviewers"]));
        assert!(!out.contains_key("reviewers"));
        assert!(!out.contains_key("author"));
    }

    #[test]
    fn test_requested_relationship_without_record_is_null() {
        struct Orphan;

        impl JsonRecord for Orphan {
            fn fields(&self) -> &'static [FieldDef] {
                const FIELDS: &[FieldDef] = &[FieldDef::relationship("parent")];
                FIELDS
            }

            fn field(&self, _name: &str) -> Option<FieldValue> {
                None
            }
        }

        let out = Orphan.to_json_with(&BTreeSet::from(["parent"]));
        assert_eq!(out.get("parent"), Some(&Value::Null));
    }

    #[test]
    fn test_output_is_directly_encodable() {
        let out = sample_post().to_json();
        let encoded = serde_json::to_string(&out).expect("encodable");
        assert!(encoded.contains("\"title\":\"First\""));
    }
}
