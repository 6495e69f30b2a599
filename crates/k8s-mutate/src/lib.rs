//! Decision core of a Kubernetes mutating admission webhook.
//!
//! A [`MutatingWebhook`] takes an [`AdmissionRequest`], decodes the embedded
//! object through its [`Resolver`], runs a [`Mutator`] (usually a
//! [`MutatorChain`]) over it, and answers with an [`AdmissionResponse`] that
//! carries a merge-style [`ChangeDocument`] when the object changed.
//!
//! Serving HTTP, TLS and wrapping the response into an `AdmissionReview`
//! envelope are left to the caller.

pub mod admission;
pub mod catalog;
pub mod config;
pub mod error;
pub mod mutator;
pub mod mutators;
pub mod object;
pub mod patch;
pub mod resolver;
pub mod webhook;

pub use admission::{AdmissionRequest, AdmissionResponse};
pub use catalog::{Shape, TypeCatalog};
pub use config::WebhookConfig;
pub use error::{ConfigError, DecodeError, EncodeError, MutationError, ReviewError};
pub use mutator::{mutator_fn, Control, Mutator, MutatorChain, MutatorFn, ReviewContext};
pub use object::Object;
pub use patch::{ChangeDocument, PatchType};
pub use resolver::Resolver;
pub use webhook::{MutatingWebhook, Webhook};
