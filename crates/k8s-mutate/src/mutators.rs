//! Ready-made mutators.
//!
//! Everything except [`StripContainerLimits`] only touches metadata and works
//! for any kind.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Container, Pod};

use crate::{
	error::MutationError,
	mutator::{Control, Mutator, ReviewContext},
	object::Object,
};

/// Move the object into a fixed namespace.
#[derive(Debug, Clone)]
pub struct SetNamespace(pub String);

impl Mutator for SetNamespace {
	fn mutate(&self, _ctx: &ReviewContext, obj: &mut dyn Object) -> Result<Control, MutationError> {
		obj.set_namespace(Some(self.0.clone()));
		Ok(Control::Continue)
	}

	fn name(&self) -> &str {
		"set-namespace"
	}
}

/// Add or overwrite labels, leaving other labels alone.
#[derive(Debug, Clone)]
pub struct MergeLabels(pub BTreeMap<String, String>);

impl Mutator for MergeLabels {
	fn mutate(&self, _ctx: &ReviewContext, obj: &mut dyn Object) -> Result<Control, MutationError> {
		if self.0.is_empty() {
			return Ok(Control::Continue);
		}
		let labels = obj.meta_mut().labels.get_or_insert_with(BTreeMap::new);
		labels.extend(self.0.iter().map(|(k, v)| (k.clone(), v.clone())));
		Ok(Control::Continue)
	}

	fn name(&self) -> &str {
		"merge-labels"
	}
}

/// Add or overwrite annotations, leaving other annotations alone.
#[derive(Debug, Clone)]
pub struct MergeAnnotations(pub BTreeMap<String, String>);

impl Mutator for MergeAnnotations {
	fn mutate(&self, _ctx: &ReviewContext, obj: &mut dyn Object) -> Result<Control, MutationError> {
		if self.0.is_empty() {
			return Ok(Control::Continue);
		}
		let annotations = obj.meta_mut().annotations.get_or_insert_with(BTreeMap::new);
		annotations.extend(self.0.iter().map(|(k, v)| (k.clone(), v.clone())));
		Ok(Control::Continue)
	}

	fn name(&self) -> &str {
		"merge-annotations"
	}
}

/// Replace the whole annotation map. An empty map removes all annotations.
#[derive(Debug, Clone)]
pub struct ReplaceAnnotations(pub BTreeMap<String, String>);

impl Mutator for ReplaceAnnotations {
	fn mutate(&self, _ctx: &ReviewContext, obj: &mut dyn Object) -> Result<Control, MutationError> {
		obj.set_annotations((!self.0.is_empty()).then(|| self.0.clone()));
		Ok(Control::Continue)
	}

	fn name(&self) -> &str {
		"replace-annotations"
	}
}

/// Stop the chain for objects carrying an opt-out annotation.
#[derive(Debug, Clone)]
pub struct SkipIfAnnotated {
	pub key: String,
}

impl SkipIfAnnotated {
	pub fn new(key: impl Into<String>) -> Self {
		Self { key: key.into() }
	}
}

impl Mutator for SkipIfAnnotated {
	fn mutate(&self, _ctx: &ReviewContext, obj: &mut dyn Object) -> Result<Control, MutationError> {
		let annotated = obj
			.annotations()
			.is_some_and(|annotations| annotations.contains_key(&self.key));
		Ok(if annotated {
			Control::Stop
		} else {
			Control::Continue
		})
	}

	fn name(&self) -> &str {
		"skip-if-annotated"
	}
}

/// Drop resource limits from every container of a Pod.
///
/// Requests are kept. Fails on anything that is not a Pod.
#[derive(Debug, Clone, Copy, Default)]
pub struct StripContainerLimits;

impl Mutator for StripContainerLimits {
	fn mutate(&self, _ctx: &ReviewContext, obj: &mut dyn Object) -> Result<Control, MutationError> {
		let pod = obj.narrow_mut::<Pod>()?;
		if let Some(spec) = pod.spec.as_mut() {
			spec.containers.iter_mut().for_each(strip_limits);
			spec.init_containers
				.iter_mut()
				.flatten()
				.for_each(strip_limits);
		}
		Ok(Control::Continue)
	}

	fn name(&self) -> &str {
		"strip-container-limits"
	}
}

fn strip_limits(container: &mut Container) {
	if let Some(resources) = container.resources.as_mut() {
		resources.limits = None;
	}
}
