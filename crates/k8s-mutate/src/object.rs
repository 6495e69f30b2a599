//! Decoded objects and their shared metadata capability.
//!
//! Every shape the webhook can decode into implements [`Object`], so mutators
//! that only touch metadata never need to know the concrete kind. Mutators that
//! do need kind-specific fields narrow with [`narrow_mut`](trait.Object.html#method.narrow_mut),
//! which fails loudly instead of skipping objects of the wrong kind.

use std::{any::Any, collections::BTreeMap, fmt};

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{core::GroupVersionKind, Resource};
use serde::Serialize;

use crate::error::MutationError;

/// A decoded, mutable Kubernetes object.
pub trait Object: Any + Send + Sync + fmt::Debug {
	/// Object metadata.
	fn meta(&self) -> &ObjectMeta;

	/// Mutable object metadata.
	fn meta_mut(&mut self) -> &mut ObjectMeta;

	/// Group, version and kind of the concrete shape.
	fn gvk(&self) -> GroupVersionKind;

	/// Serialized form used for diffing.
	fn to_json(&self) -> Result<serde_json::Value, serde_json::Error>;

	fn as_any(&self) -> &dyn Any;

	fn as_any_mut(&mut self) -> &mut dyn Any;

	fn name(&self) -> Option<&str> {
		self.meta().name.as_deref()
	}

	fn set_name(&mut self, name: Option<String>) {
		self.meta_mut().name = name;
	}

	fn namespace(&self) -> Option<&str> {
		self.meta().namespace.as_deref()
	}

	fn set_namespace(&mut self, namespace: Option<String>) {
		self.meta_mut().namespace = namespace;
	}

	fn annotations(&self) -> Option<&BTreeMap<String, String>> {
		self.meta().annotations.as_ref()
	}

	fn set_annotations(&mut self, annotations: Option<BTreeMap<String, String>>) {
		self.meta_mut().annotations = annotations;
	}

	fn labels(&self) -> Option<&BTreeMap<String, String>> {
		self.meta().labels.as_ref()
	}

	fn set_labels(&mut self, labels: Option<BTreeMap<String, String>>) {
		self.meta_mut().labels = labels;
	}
}

impl<K> Object for K
where
	K: Resource<DynamicType = ()> + Serialize + Send + Sync + fmt::Debug + 'static,
{
	fn meta(&self) -> &ObjectMeta {
		Resource::meta(self)
	}

	fn meta_mut(&mut self) -> &mut ObjectMeta {
		Resource::meta_mut(self)
	}

	fn gvk(&self) -> GroupVersionKind {
		GroupVersionKind::gvk(&K::group(&()), &K::version(&()), &K::kind(&()))
	}

	fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
		serde_json::to_value(self)
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}
}

impl<'a> dyn Object + 'a {
	pub fn downcast_ref<K: Object>(&self) -> Option<&K> {
		self.as_any().downcast_ref::<K>()
	}

	pub fn downcast_mut<K: Object>(&mut self) -> Option<&mut K> {
		self.as_any_mut().downcast_mut::<K>()
	}

	/// Narrow to a concrete kind, failing when the object is something else.
	pub fn narrow_mut<K>(&mut self) -> Result<&mut K, MutationError>
	where
		K: Object + Resource<DynamicType = ()>,
	{
		let found = self.gvk().kind;
		self.as_any_mut()
			.downcast_mut::<K>()
			.ok_or_else(|| MutationError::UnexpectedKind {
				expected: K::kind(&()).into_owned(),
				found,
			})
	}
}
