//! Error types for the review pipeline.
//!
//! Every failure a single review can hit falls into one of three buckets:
//! the payload could not be decoded, a mutator refused the object, or the
//! object could not be re-serialized for diffing. [`ReviewError`] unifies them
//! so the engine can use `?`, and its message is what ends up in the denied
//! response.

use thiserror::Error;

/// The payload could not be turned into a typed object.
#[derive(Debug, Error)]
pub enum DecodeError {
	#[error("empty object payload")]
	EmptyPayload,

	#[error("malformed object payload: {0}")]
	Malformed(#[source] serde_json::Error),

	#[error("object payload has no apiVersion/kind")]
	MissingTypeMeta,

	#[error("invalid apiVersion {0:?}")]
	InvalidApiVersion(String),

	#[error("no type registered for {api_version}/{kind}")]
	UnknownKind { api_version: String, kind: String },

	#[error("object is not a valid {kind}: {source}")]
	InvalidShape {
		kind: String,
		#[source]
		source: serde_json::Error,
	},
}

/// A mutator refused to process the object.
#[derive(Debug, Error)]
pub enum MutationError {
	#[error("expected a {expected}, got a {found}")]
	UnexpectedKind { expected: String, found: String },

	#[error("review was cancelled")]
	Cancelled,

	#[error("review deadline exceeded")]
	DeadlineExceeded,

	#[error("{0}")]
	Failed(String),

	#[error(transparent)]
	Other(Box<dyn std::error::Error + Send + Sync>),
}

impl MutationError {
	/// Free-form failure with a human-readable message.
	pub fn msg(message: impl Into<String>) -> Self {
		Self::Failed(message.into())
	}
}

/// The object could not be serialized for diffing.
#[derive(Debug, Error)]
pub enum EncodeError {
	#[error("encoding original object: {0}")]
	Baseline(#[source] serde_json::Error),

	#[error("encoding mutated object: {0}")]
	Mutated(#[source] serde_json::Error),

	#[error("serialized object is not a JSON object")]
	NotAnObject,

	#[error("encoding change document: {0}")]
	Patch(#[source] serde_json::Error),
}

/// Any failure that terminates a review.
///
/// The message is always the inner error's message, so the denial reason
/// reads the same whether or not it went through this wrapper.
#[derive(Debug, Error)]
pub enum ReviewError {
	#[error(transparent)]
	Decode(#[from] DecodeError),

	#[error(transparent)]
	Mutation(#[from] MutationError),

	#[error(transparent)]
	Encode(#[from] EncodeError),
}

/// A webhook configuration could not be turned into a webhook.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("static kind {api_version}/{kind} is not registered in the type catalog")]
	UnknownStaticKind { api_version: String, kind: String },

	#[error("invalid apiVersion {0:?} in static resolution")]
	InvalidApiVersion(String),
}
