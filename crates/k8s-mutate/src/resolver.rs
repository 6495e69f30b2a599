//! Turning raw request payloads into typed objects.
//!
//! A webhook either knows its object type up front (static resolution) or
//! reads `apiVersion`/`kind` from the payload and looks the type up in a
//! [`TypeCatalog`] (dynamic resolution). The strategy is fixed when the webhook
//! is constructed.

use std::sync::Arc;

use kube::core::GroupVersionKind;
use serde::{de::Error as _, Deserialize};

use crate::{
	catalog::{Shape, TypeCatalog},
	error::DecodeError,
	object::Object,
};

/// Decode strategy bound into a webhook.
#[derive(Debug, Clone)]
pub enum Resolver {
	/// Always decode into one fixed shape, without looking at type metadata.
	Static(Shape),
	/// Pick the shape per request from the payload's type metadata.
	Dynamic(Arc<TypeCatalog>),
}

impl Resolver {
	/// Decode a raw payload into a mutable object.
	pub fn resolve(&self, raw: &[u8]) -> Result<Box<dyn Object>, DecodeError> {
		if raw.is_empty() {
			return Err(DecodeError::EmptyPayload);
		}
		if !is_json_object(raw) {
			return Err(DecodeError::Malformed(serde_json::Error::custom(
				"payload is not a JSON object",
			)));
		}
		match self {
			Resolver::Static(shape) => decode_with(shape, raw),
			Resolver::Dynamic(catalog) => {
				let gvk = read_type_meta(raw)?;
				let shape = catalog
					.lookup(&gvk)
					.ok_or_else(|| DecodeError::UnknownKind {
						api_version: gvk.api_version(),
						kind: gvk.kind.clone(),
					})?;
				decode_with(shape, raw)
			}
		}
	}
}

fn decode_with(shape: &Shape, raw: &[u8]) -> Result<Box<dyn Object>, DecodeError> {
	shape.decode(raw).map_err(|source| {
		if source.is_syntax() || source.is_eof() {
			DecodeError::Malformed(source)
		} else {
			DecodeError::InvalidShape {
				kind: shape.gvk().kind.clone(),
				source,
			}
		}
	})
}

fn is_json_object(raw: &[u8]) -> bool {
	raw.trim_ascii_start().first() == Some(&b'{')
}

/// The only part of the payload dynamic resolution needs before choosing a shape.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeHeader {
	#[serde(default)]
	api_version: Option<String>,
	#[serde(default)]
	kind: Option<String>,
}

fn read_type_meta(raw: &[u8]) -> Result<GroupVersionKind, DecodeError> {
	let header: TypeHeader = serde_json::from_slice(raw).map_err(DecodeError::Malformed)?;
	match (header.api_version, header.kind) {
		(Some(api_version), Some(kind)) if !api_version.is_empty() && !kind.is_empty() => {
			gvk_from_api_version(&api_version, &kind)
				.ok_or(DecodeError::InvalidApiVersion(api_version))
		}
		_ => Err(DecodeError::MissingTypeMeta),
	}
}

/// Create a GroupVersionKind from an apiVersion string and kind.
///
/// `v1` is the core group; `apps/v1` is group `apps`, version `v1`. Anything
/// with more segments or empty segments is rejected.
pub fn gvk_from_api_version(api_version: &str, kind: &str) -> Option<GroupVersionKind> {
	let (group, version) = match api_version.split_once('/') {
		Some((g, v)) => (g, v),
		None => ("", api_version),
	};
	if version.is_empty() || version.contains('/') || (api_version.contains('/') && group.is_empty())
	{
		return None;
	}
	Some(GroupVersionKind::gvk(group, version, kind))
}
