//! Webhook configuration files.
//!
//! A configuration names the webhook and picks its resolution strategy:
//!
//! ```yaml
//! name: pod-defaults
//! resolution:
//!   static:
//!     apiVersion: v1
//!     kind: Pod
//! ```
//!
//! `resolution: dynamic` (the default) resolves every request against the
//! type catalog instead.

use std::{fs, path::Path, sync::Arc};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
	catalog::TypeCatalog,
	error::ConfigError,
	mutator::Mutator,
	resolver::{gvk_from_api_version, Resolver},
	webhook::MutatingWebhook,
};

/// Root configuration of one mutating webhook.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
	/// Webhook name, used in logs.
	pub name: String,

	#[serde(default)]
	pub resolution: ResolutionConfig,
}

/// How the webhook determines the shape of incoming objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionConfig {
	/// Bind the webhook to a single kind.
	Static(StaticKind),
	/// Read apiVersion/kind from every payload.
	#[default]
	Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticKind {
	pub api_version: String,
	pub kind: String,
}

impl WebhookConfig {
	pub fn from_yaml_str(content: &str) -> Result<Self> {
		serde_yaml_with_quirks::from_str(content).context("failed to parse webhook config")
	}

	/// Load config from a specific file path
	pub fn load_from_file(path: &Path) -> Result<Self> {
		let content = fs::read_to_string(path)
			.with_context(|| format!("failed to read webhook config: {}", path.display()))?;
		let config: WebhookConfig = serde_yaml_with_quirks::from_str(&content)
			.with_context(|| format!("failed to parse webhook config: {}", path.display()))?;
		Ok(config)
	}

	/// Build the webhook this configuration describes.
	///
	/// A static kind is looked up in `catalog` once, here, and its shape is
	/// bound into the webhook; requests are then decoded without any lookup.
	pub fn build(
		&self,
		catalog: Arc<TypeCatalog>,
		mutator: impl Mutator + 'static,
	) -> Result<MutatingWebhook, ConfigError> {
		let resolver = match &self.resolution {
			ResolutionConfig::Static(target) => {
				let gvk = gvk_from_api_version(&target.api_version, &target.kind)
					.ok_or_else(|| ConfigError::InvalidApiVersion(target.api_version.clone()))?;
				let shape = catalog
					.lookup(&gvk)
					.ok_or_else(|| ConfigError::UnknownStaticKind {
						api_version: target.api_version.clone(),
						kind: target.kind.clone(),
					})?;
				Resolver::Static(shape.clone())
			}
			ResolutionConfig::Dynamic => Resolver::Dynamic(catalog),
		};
		Ok(MutatingWebhook::new(&self.name, resolver, mutator))
	}
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;
	use indoc::indoc;
	use tempfile::TempDir;

	use super::*;
	use crate::mutators::SetNamespace;

	#[test]
	fn test_static_resolution() {
		let config = WebhookConfig::from_yaml_str(indoc! {"
			name: pod-defaults
			resolution:
			  static:
			    apiVersion: v1
			    kind: Pod
		"})
		.unwrap();

		assert_eq!(
			config,
			WebhookConfig {
				name: "pod-defaults".to_string(),
				resolution: ResolutionConfig::Static(StaticKind {
					api_version: "v1".to_string(),
					kind: "Pod".to_string(),
				}),
			}
		);
	}

	#[test]
	fn test_dynamic_resolution() {
		let config = WebhookConfig::from_yaml_str("name: any\nresolution: dynamic").unwrap();
		assert_eq!(config.resolution, ResolutionConfig::Dynamic);
	}

	#[test]
	fn test_resolution_defaults_to_dynamic() {
		let config = WebhookConfig::from_yaml_str("name: any").unwrap();
		assert_eq!(config.resolution, ResolutionConfig::Dynamic);
	}

	#[test]
	fn test_missing_name_is_an_error() {
		assert!(WebhookConfig::from_yaml_str("resolution: dynamic").is_err());
	}

	#[test]
	fn test_load_from_file() {
		let temp = TempDir::new().unwrap();
		let path = temp.path().join("webhook.yaml");
		fs::write(&path, "name: from-file\nresolution: dynamic\n").unwrap();

		let config = WebhookConfig::load_from_file(&path).unwrap();
		assert_eq!(config.name, "from-file");
	}

	#[test]
	fn test_load_missing_file_mentions_path() {
		let temp = TempDir::new().unwrap();
		let path = temp.path().join("absent.yaml");
		let err = WebhookConfig::load_from_file(&path).unwrap_err();
		assert!(err.to_string().contains("absent.yaml"));
	}

	#[test]
	fn test_build_static_from_catalog() {
		let config = WebhookConfig {
			name: "deploys".to_string(),
			resolution: ResolutionConfig::Static(StaticKind {
				api_version: "apps/v1".to_string(),
				kind: "Deployment".to_string(),
			}),
		};
		let webhook = config
			.build(
				Arc::new(TypeCatalog::with_core_kinds()),
				SetNamespace("x".to_string()),
			)
			.unwrap();
		assert_eq!(webhook.name(), "deploys");
		assert_matches!(webhook.resolver(), Resolver::Static(shape) if shape.gvk().kind == "Deployment");
	}

	#[test]
	fn test_build_static_unknown_kind() {
		let config = WebhookConfig {
			name: "widgets".to_string(),
			resolution: ResolutionConfig::Static(StaticKind {
				api_version: "example.com/v1".to_string(),
				kind: "Widget".to_string(),
			}),
		};
		let err = config
			.build(
				Arc::new(TypeCatalog::with_core_kinds()),
				SetNamespace("x".to_string()),
			)
			.unwrap_err();
		assert_matches!(err, ConfigError::UnknownStaticKind { ref kind, .. } if kind == "Widget");
	}

	#[test]
	fn test_build_static_invalid_api_version() {
		let config = WebhookConfig {
			name: "bad".to_string(),
			resolution: ResolutionConfig::Static(StaticKind {
				api_version: "a/b/c".to_string(),
				kind: "Pod".to_string(),
			}),
		};
		let err = config
			.build(Arc::new(TypeCatalog::new()), SetNamespace("x".to_string()))
			.unwrap_err();
		assert_matches!(err, ConfigError::InvalidApiVersion(_));
	}

	#[test]
	fn test_build_dynamic() {
		let config = WebhookConfig::from_yaml_str("name: any").unwrap();
		let webhook = config
			.build(Arc::new(TypeCatalog::new()), SetNamespace("x".to_string()))
			.unwrap();
		assert_matches!(webhook.resolver(), Resolver::Dynamic(_));
	}
}
