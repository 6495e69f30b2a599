//! The review engine: decode, mutate, diff, respond.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument, warn};

use crate::{
	admission::{AdmissionRequest, AdmissionResponse},
	catalog::{Shape, TypeCatalog},
	error::{EncodeError, ReviewError},
	mutator::{Mutator, ReviewContext},
	object::Object,
	patch::ChangeDocument,
	resolver::Resolver,
};

/// Anything that can answer an admission request.
pub trait Webhook: Send + Sync {
	/// Review one request. Always returns a response; failures become denials.
	fn review(&self, ctx: &ReviewContext, request: &AdmissionRequest) -> AdmissionResponse;
}

/// Mutating webhook: decodes the object, runs the mutator over it and answers
/// with the resulting change document.
pub struct MutatingWebhook {
	name: String,
	resolver: Resolver,
	mutator: Arc<dyn Mutator>,
}

impl MutatingWebhook {
	pub fn new(name: impl Into<String>, resolver: Resolver, mutator: impl Mutator + 'static) -> Self {
		Self {
			name: name.into(),
			resolver,
			mutator: Arc::new(mutator),
		}
	}

	/// Webhook bound to one object type.
	pub fn new_static<K>(name: impl Into<String>, mutator: impl Mutator + 'static) -> Self
	where
		K: Object + kube::Resource<DynamicType = ()> + Serialize + DeserializeOwned,
	{
		Self::new(name, Resolver::Static(Shape::of::<K>()), mutator)
	}

	/// Webhook resolving the object type per request from `catalog`.
	pub fn new_dynamic(
		name: impl Into<String>,
		catalog: Arc<TypeCatalog>,
		mutator: impl Mutator + 'static,
	) -> Self {
		Self::new(name, Resolver::Dynamic(catalog), mutator)
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn resolver(&self) -> &Resolver {
		&self.resolver
	}

	/// Run the pipeline, returning the change document if anything changed.
	fn mutate(
		&self,
		ctx: &ReviewContext,
		request: &AdmissionRequest,
	) -> Result<Option<ChangeDocument>, ReviewError> {
		let mut object = self.resolver.resolve(&request.object)?;
		let original = object.to_json().map_err(EncodeError::Baseline)?;

		let control = self.mutator.mutate(ctx, object.as_mut())?;
		debug!(?control, "mutation finished");

		let mutated = object.to_json().map_err(EncodeError::Mutated)?;
		let doc = ChangeDocument::between(&original, &mutated)?;
		Ok((!doc.is_empty()).then_some(doc))
	}
}

impl Webhook for MutatingWebhook {
	#[instrument(skip_all, fields(webhook = %self.name, uid = %request.uid))]
	fn review(&self, ctx: &ReviewContext, request: &AdmissionRequest) -> AdmissionResponse {
		let response = self.mutate(ctx, request).and_then(|doc| match doc {
			Some(doc) => {
				let response = AdmissionResponse::allow(&request.uid).with_patch(&doc)?;
				debug!(
					patch_bytes = response.patch.as_ref().map_or(0, Vec::len),
					"object mutated"
				);
				Ok(response)
			}
			None => {
				debug!("object unchanged");
				Ok(AdmissionResponse::allow(&request.uid))
			}
		});

		response.unwrap_or_else(|e| {
			warn!(error = %e, "denying admission request");
			AdmissionResponse::deny(&request.uid, e.to_string())
		})
	}
}

impl std::fmt::Debug for MutatingWebhook {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MutatingWebhook")
			.field("name", &self.name)
			.field("resolver", &self.resolver)
			.field("mutator", &self.mutator.name())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use k8s_openapi::api::core::v1::Pod;

	use super::*;
	use crate::{
		error::MutationError,
		mutator::{mutator_fn, Control},
	};

	const POD: &[u8] = br#"{"apiVersion":"v1","kind":"Pod","metadata":{"name":"p","namespace":"a"}}"#;

	fn noop() -> impl Mutator {
		mutator_fn("noop", |_, _| Ok(Control::Continue))
	}

	#[test]
	fn test_noop_allows_without_patch() {
		let wh = MutatingWebhook::new_static::<Pod>("noop", noop());
		let response = wh.review(&ReviewContext::new(), &AdmissionRequest::new("u1", POD));
		assert_eq!(response, AdmissionResponse::allow("u1"));
	}

	#[test]
	fn test_decode_failure_denies() {
		let wh = MutatingWebhook::new_static::<Pod>("noop", noop());
		let response = wh.review(&ReviewContext::new(), &AdmissionRequest::new("u2", "{"));
		assert!(!response.allowed);
		assert_eq!(response.uid, "u2");
		assert!(response.patch.is_none());
		assert!(response
			.reason
			.as_deref()
			.is_some_and(|r| r.starts_with("malformed object payload")));
	}

	#[test]
	fn test_mutation_error_discards_changes() {
		let wh = MutatingWebhook::new_static::<Pod>(
			"half",
			mutator_fn("half", |_, obj| {
				obj.set_namespace(Some("b".to_string()));
				Err(MutationError::msg("gave up"))
			}),
		);
		let response = wh.review(&ReviewContext::new(), &AdmissionRequest::new("u3", POD));
		assert_eq!(response, AdmissionResponse::deny("u3", "gave up"));
	}

	#[test]
	fn test_cancelled_context_reaches_mutator() {
		let wh = MutatingWebhook::new_static::<Pod>(
			"io",
			mutator_fn("io", |ctx, _| {
				ctx.check()?;
				Ok(Control::Continue)
			}),
		);
		let ctx = ReviewContext::new();
		ctx.token().cancel();
		let response = wh.review(&ctx, &AdmissionRequest::new("u4", POD));
		assert_eq!(response, AdmissionResponse::deny("u4", "review was cancelled"));
	}

	#[test]
	fn test_debug_names_mutator() {
		let wh = MutatingWebhook::new_static::<Pod>("noop", noop());
		let debug = format!("{wh:?}");
		assert!(debug.contains("noop"));
		assert!(debug.contains("Static"));
	}
}
