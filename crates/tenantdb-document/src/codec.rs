//! Entity ↔ document conversion with the `id` ↔ `_id` rewrite.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tenantdb_core::error::DomainError;
use tenantdb_filter::document::Document;
use tenantdb_filter::profile::LOGICAL_ID_FIELD;

/// Serializes an entity into a stored document keyed by `key_field`.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the entity does not serialize to
/// a JSON object.
pub fn encode<T: Serialize>(entity: &T, key_field: &str) -> Result<Document, DomainError> {
    match serde_json::to_value(entity)? {
        Value::Object(mut document) => {
            if let Some(id) = document.remove(LOGICAL_ID_FIELD) {
                document.insert(key_field.to_owned(), id);
            }
            Ok(document)
        }
        other => Err(DomainError::Infrastructure(format!(
            "entity must serialize to an object, got {other}"
        ))),
    }
}

/// Deserializes a stored document keyed by `key_field` into an entity.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the document does not match `T`.
pub fn decode<T: DeserializeOwned>(
    mut document: Document,
    key_field: &str,
) -> Result<T, DomainError> {
    if let Some(id) = document.remove(key_field) {
        document.insert(LOGICAL_ID_FIELD.to_owned(), id);
    }
    Ok(serde_json::from_value(Value::Object(document))?)
}
