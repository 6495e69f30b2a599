//! Registry of concrete shapes, keyed by group/version/kind.
//!
//! The catalog is built once when the webhook is constructed and is read-only
//! afterwards, so concurrent reviews share it through an `Arc` without locking.

use std::{collections::HashMap, fmt};

use k8s_openapi::api::{
	apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet},
	batch::v1::{CronJob, Job},
	core::v1::{ConfigMap, Namespace, Pod, Secret, Service, ServiceAccount},
};
use kube::{core::GroupVersionKind, Resource};
use serde::{de::DeserializeOwned, Serialize};

use crate::object::Object;

type DecodeFn = fn(&[u8]) -> Result<Box<dyn Object>, serde_json::Error>;

/// A concrete object type the webhook knows how to decode into.
#[derive(Clone)]
pub struct Shape {
	gvk: GroupVersionKind,
	decode: DecodeFn,
}

impl Shape {
	/// Shape of a statically typed Kubernetes resource.
	pub fn of<K>() -> Self
	where
		K: Object + Resource<DynamicType = ()> + Serialize + DeserializeOwned,
	{
		Self {
			gvk: GroupVersionKind::gvk(&K::group(&()), &K::version(&()), &K::kind(&())),
			decode: decode_as::<K>,
		}
	}

	pub fn gvk(&self) -> &GroupVersionKind {
		&self.gvk
	}

	/// Deserialize a raw payload into a fresh instance of this shape.
	pub fn decode(&self, raw: &[u8]) -> Result<Box<dyn Object>, serde_json::Error> {
		(self.decode)(raw)
	}
}

impl fmt::Debug for Shape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Shape").field("gvk", &self.gvk).finish()
	}
}

fn decode_as<K>(raw: &[u8]) -> Result<Box<dyn Object>, serde_json::Error>
where
	K: Object + DeserializeOwned,
{
	let obj: K = serde_json::from_slice(raw)?;
	Ok(Box::new(obj))
}

/// Lookup from group/version/kind to a decodable shape.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
	shapes: HashMap<GroupVersionKind, Shape>,
}

impl TypeCatalog {
	pub fn new() -> Self {
		Self::default()
	}

	/// Catalog with the common workload and configuration kinds registered.
	pub fn with_core_kinds() -> Self {
		Self::new()
			.register::<Pod>()
			.register::<ConfigMap>()
			.register::<Secret>()
			.register::<Service>()
			.register::<ServiceAccount>()
			.register::<Namespace>()
			.register::<Deployment>()
			.register::<StatefulSet>()
			.register::<DaemonSet>()
			.register::<ReplicaSet>()
			.register::<Job>()
			.register::<CronJob>()
	}

	/// Builder-style registration of a statically typed resource.
	pub fn register<K>(mut self) -> Self
	where
		K: Object + Resource<DynamicType = ()> + Serialize + DeserializeOwned,
	{
		self.insert(Shape::of::<K>());
		self
	}

	/// Add a shape, replacing any previous one with the same group/version/kind.
	pub fn insert(&mut self, shape: Shape) {
		self.shapes.insert(shape.gvk.clone(), shape);
	}

	pub fn lookup(&self, gvk: &GroupVersionKind) -> Option<&Shape> {
		self.shapes.get(gvk)
	}

	pub fn contains(&self, gvk: &GroupVersionKind) -> bool {
		self.shapes.contains_key(gvk)
	}

	pub fn len(&self) -> usize {
		self.shapes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.shapes.is_empty()
	}

	/// Registered kinds, in no particular order.
	pub fn kinds(&self) -> impl Iterator<Item = &GroupVersionKind> {
		self.shapes.keys()
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case::pod("", "v1", "Pod")]
	#[case::namespace("", "v1", "Namespace")]
	#[case::deployment("apps", "v1", "Deployment")]
	#[case::cronjob("batch", "v1", "CronJob")]
	fn test_core_kinds_registered(#[case] group: &str, #[case] version: &str, #[case] kind: &str) {
		let catalog = TypeCatalog::with_core_kinds();
		assert!(catalog.contains(&GroupVersionKind::gvk(group, version, kind)));
	}

	#[test]
	fn test_empty_catalog() {
		let catalog = TypeCatalog::new();
		assert!(catalog.is_empty());
		assert!(catalog
			.lookup(&GroupVersionKind::gvk("", "v1", "Pod"))
			.is_none());
	}

	#[test]
	fn test_register_replaces_same_kind() {
		let catalog = TypeCatalog::new().register::<Pod>().register::<Pod>();
		assert_eq!(catalog.len(), 1);
		assert_eq!(catalog.kinds().count(), 1);
	}

	#[test]
	fn test_shape_decodes_into_concrete_type() {
		let shape = Shape::of::<ConfigMap>();
		assert_eq!(shape.gvk(), &GroupVersionKind::gvk("", "v1", "ConfigMap"));

		let obj = shape
			.decode(br#"{"apiVersion":"v1","kind":"ConfigMap","metadata":{"name":"cfg"},"data":{"a":"b"}}"#)
			.unwrap();
		let cm = obj.downcast_ref::<ConfigMap>().expect("decoded as ConfigMap");
		assert_eq!(cm.metadata.name.as_deref(), Some("cfg"));
		assert_eq!(
			cm.data.as_ref().and_then(|d| d.get("a")),
			Some(&"b".to_string())
		);
	}
}
