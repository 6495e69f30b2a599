//! Merge-style change documents.
//!
//! The document is a sparse overlay of the new object over the old one:
//! changed or added keys carry their new value, removed keys carry `null`,
//! and unchanged keys are left out. Only object-valued keys are diffed
//! recursively. Arrays, scalars and values whose type changed are compared as
//! a whole, so one differing list element replaces the entire list. The API
//! server applies the document as a literal merge against the original object.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::EncodeError;

/// Format tag declared next to a patch in an admission response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PatchType {
	#[serde(rename = "JSONPatch")]
	JsonPatch,
}

/// Difference between an object before and after mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeDocument(Map<String, Value>);

impl ChangeDocument {
	/// Diff two serialized objects.
	pub fn between(original: &Value, mutated: &Value) -> Result<Self, EncodeError> {
		match (original, mutated) {
			(Value::Object(old), Value::Object(new)) => Ok(Self(diff_objects(old, new))),
			_ => Err(EncodeError::NotAnObject),
		}
	}

	/// True when nothing changed.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn as_map(&self) -> &Map<String, Value> {
		&self.0
	}

	pub fn into_value(self) -> Value {
		Value::Object(self.0)
	}

	/// Serialized document, as placed in the response.
	pub fn to_vec(&self) -> Result<Vec<u8>, EncodeError> {
		serde_json::to_vec(&self.0).map_err(EncodeError::Patch)
	}
}

/// Key-wise comparison of two JSON objects.
fn diff_objects(old: &Map<String, Value>, new: &Map<String, Value>) -> Map<String, Value> {
	// Keys of the diff itself come out sorted. Values copied over whole keep
	// serde_json's map order.
	let mut out = BTreeMap::new();

	for (key, new_value) in new {
		match (old.get(key), new_value) {
			(Some(Value::Object(old_obj)), Value::Object(new_obj)) => {
				let nested = diff_objects(old_obj, new_obj);
				if !nested.is_empty() {
					out.insert(key.clone(), Value::Object(nested));
				}
			}
			(Some(old_value), _) if old_value == new_value => {}
			_ => {
				out.insert(key.clone(), new_value.clone());
			}
		}
	}

	for key in old.keys() {
		if !new.contains_key(key) {
			out.insert(key.clone(), Value::Null);
		}
	}

	out.into_iter().collect()
}
