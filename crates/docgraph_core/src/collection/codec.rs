//! Record to document mapping.

use crate::error::{CoreError, CoreResult};
use crate::model::Model;
use crate::names::NameRegistry;
use docgraph_store::{
    Document, DocumentHeader, FROM_FIELD, ID_FIELD, KEY_FIELD, REV_FIELD, TO_FIELD,
};
use serde_json::Value;

/// Builds the store document for `record` in `collection`.
///
/// `_key` and `_id` are sent together or not at all, `_rev` only when
/// non-empty. Edge endpoints are resolved to identifiers.
pub(crate) fn to_document<T: Model>(
    record: &T,
    collection: &str,
    names: &NameRegistry,
) -> CoreResult<Document> {
    let mut document = match serde_json::to_value(record)? {
        Value::Object(map) => map,
        other => {
            return Err(CoreError::invalid_record(format!(
                "{} serialized to {} instead of an object",
                T::type_name(),
                kind_of(&other)
            )))
        }
    };

    match record.key() {
        Some(key) => {
            document.insert(KEY_FIELD.into(), Value::String(key.to_string()));
            document.insert(
                ID_FIELD.into(),
                Value::String(format!("{}/{}", collection, key)),
            );
        }
        None => {
            document.remove(KEY_FIELD);
            document.remove(ID_FIELD);
        }
    }

    if record.rev().is_empty() {
        document.remove(REV_FIELD);
    } else {
        document.insert(REV_FIELD.into(), Value::String(record.rev().to_string()));
    }

    if let Some(edge) = record.edge() {
        for (field, endpoint) in [(FROM_FIELD, &edge.from), (TO_FIELD, &edge.to)] {
            let id = endpoint.resolve(names).ok_or_else(|| {
                CoreError::model_not_found(format!(
                    "{} vertex of {} has no key",
                    field,
                    T::type_name()
                ))
            })?;
            document.insert(field.into(), Value::String(id));
        }
    }

    Ok(document)
}

/// Decodes a stored document into a record.
pub(crate) fn from_document<T: Model>(document: Value) -> CoreResult<T> {
    Ok(serde_json::from_value(document)?)
}

/// Copies the key and revision of a write into the record.
pub(crate) fn apply_header<T: Model>(record: &mut T, header: DocumentHeader) {
    let meta = record.meta_mut();
    meta.key = Some(header.key);
    meta.rev = header.rev;
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
