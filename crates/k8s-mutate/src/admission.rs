//! Admission request and response values exchanged with the HTTP layer.
//!
//! The HTTP layer parses the `AdmissionReview` envelope and hands over the
//! request uid plus the raw object bytes. The response serializes to the wire
//! shape of an admission response, ready to be placed back into an envelope.

use serde::{Deserialize, Serialize};

use crate::{
	error::EncodeError,
	patch::{ChangeDocument, PatchType},
};

/// Incoming admission request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionRequest {
	/// Opaque request identifier, echoed back in the response.
	pub uid: String,
	/// Serialized resource object.
	pub object: Vec<u8>,
}

impl AdmissionRequest {
	pub fn new(uid: impl Into<String>, object: impl Into<Vec<u8>>) -> Self {
		Self {
			uid: uid.into(),
			object: object.into(),
		}
	}
}

/// Admission decision for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
	pub uid: String,
	pub allowed: bool,
	/// Denial reason, only set when `allowed` is false.
	#[serde(
		rename = "status",
		default,
		skip_serializing_if = "Option::is_none",
		with = "status_message"
	)]
	pub reason: Option<String>,
	/// Change document, only set when the object changed.
	#[serde(default, skip_serializing_if = "Option::is_none", with = "base64_bytes")]
	pub patch: Option<Vec<u8>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub patch_type: Option<PatchType>,
}

impl AdmissionResponse {
	/// Allow the object unchanged.
	pub fn allow(uid: impl Into<String>) -> Self {
		Self {
			uid: uid.into(),
			allowed: true,
			reason: None,
			patch: None,
			patch_type: None,
		}
	}

	/// Reject the object.
	pub fn deny(uid: impl Into<String>, reason: impl Into<String>) -> Self {
		Self {
			uid: uid.into(),
			allowed: false,
			reason: Some(reason.into()),
			patch: None,
			patch_type: None,
		}
	}

	/// Attach a change document.
	///
	/// The declared type is always [`PatchType::JsonPatch`], which is what API
	/// servers accept, even though the document is merge-style.
	pub fn with_patch(mut self, doc: &ChangeDocument) -> Result<Self, EncodeError> {
		self.patch = Some(doc.to_vec()?);
		self.patch_type = Some(PatchType::JsonPatch);
		Ok(self)
	}
}

/// `reason` travels as `status: {message}` on the wire.
mod status_message {
	use serde::{Deserialize, Deserializer, Serialize, Serializer};

	#[derive(Serialize, Deserialize)]
	struct Status {
		#[serde(default)]
		message: Option<String>,
	}

	pub fn serialize<S: Serializer>(reason: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
		reason
			.as_ref()
			.map(|message| Status {
				message: Some(message.clone()),
			})
			.serialize(s)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
		Ok(Option::<Status>::deserialize(d)?.and_then(|status| status.message))
	}
}

/// Patch bytes travel base64-encoded, like every `[]byte` field in the API.
mod base64_bytes {
	use base64::{engine::general_purpose::STANDARD, Engine as _};
	use serde::{de::Error, Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
		match bytes {
			Some(bytes) => s.serialize_some(&STANDARD.encode(bytes)),
			None => s.serialize_none(),
		}
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
		Option::<String>::deserialize(d)?
			.map(|encoded| STANDARD.decode(encoded).map_err(D::Error::custom))
			.transpose()
	}
}
