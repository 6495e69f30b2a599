//! Mutators and the chain that runs them.

use std::{
	fmt,
	sync::Arc,
	time::{Duration, Instant},
};

use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::{error::MutationError, object::Object};

/// What the chain should do after a mutator succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
	/// Run the next mutator.
	Continue,
	/// Stop here and keep everything applied so far.
	Stop,
}

/// Per-review cancellation and deadline.
///
/// Decoding and diffing never look at it. Mutators that do their own I/O must
/// call [`check`](Self::check) and bail out instead of blocking.
#[derive(Debug, Clone, Default)]
pub struct ReviewContext {
	token: CancellationToken,
	deadline: Option<Instant>,
}

impl ReviewContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_token(mut self, token: CancellationToken) -> Self {
		self.token = token;
		self
	}

	pub fn with_deadline(mut self, deadline: Instant) -> Self {
		self.deadline = Some(deadline);
		self
	}

	/// Deadline `timeout` from now. A timeout too large to represent leaves
	/// the review without a deadline.
	pub fn with_timeout(self, timeout: Duration) -> Self {
		match Instant::now().checked_add(timeout) {
			Some(deadline) => self.with_deadline(deadline),
			None => self,
		}
	}

	pub fn token(&self) -> &CancellationToken {
		&self.token
	}

	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	pub fn is_cancelled(&self) -> bool {
		self.token.is_cancelled()
	}

	/// Fail if the caller gave up on this review.
	pub fn check(&self) -> Result<(), MutationError> {
		if self.token.is_cancelled() {
			return Err(MutationError::Cancelled);
		}
		match self.deadline {
			Some(deadline) if Instant::now() >= deadline => Err(MutationError::DeadlineExceeded),
			_ => Ok(()),
		}
	}
}

/// A single mutation step.
///
/// Implementations are shared between concurrent reviews, so any state they
/// hold must be immutable or synchronized by the implementation itself.
pub trait Mutator: Send + Sync {
	fn mutate(&self, ctx: &ReviewContext, obj: &mut dyn Object) -> Result<Control, MutationError>;

	/// Name used in logs.
	fn name(&self) -> &str {
		std::any::type_name::<Self>()
	}
}

impl<M: Mutator + ?Sized> Mutator for Arc<M> {
	fn mutate(&self, ctx: &ReviewContext, obj: &mut dyn Object) -> Result<Control, MutationError> {
		(**self).mutate(ctx, obj)
	}

	fn name(&self) -> &str {
		(**self).name()
	}
}

impl<M: Mutator + ?Sized> Mutator for Box<M> {
	fn mutate(&self, ctx: &ReviewContext, obj: &mut dyn Object) -> Result<Control, MutationError> {
		(**self).mutate(ctx, obj)
	}

	fn name(&self) -> &str {
		(**self).name()
	}
}

/// Mutator backed by a closure.
pub struct MutatorFn<F> {
	name: String,
	f: F,
}

/// Wrap a closure as a named mutator.
pub fn mutator_fn<F>(name: impl Into<String>, f: F) -> MutatorFn<F>
where
	F: Fn(&ReviewContext, &mut dyn Object) -> Result<Control, MutationError> + Send + Sync,
{
	MutatorFn {
		name: name.into(),
		f,
	}
}

impl<F> Mutator for MutatorFn<F>
where
	F: Fn(&ReviewContext, &mut dyn Object) -> Result<Control, MutationError> + Send + Sync,
{
	fn mutate(&self, ctx: &ReviewContext, obj: &mut dyn Object) -> Result<Control, MutationError> {
		(self.f)(ctx, obj)
	}

	fn name(&self) -> &str {
		&self.name
	}
}

impl<F> fmt::Debug for MutatorFn<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MutatorFn").field("name", &self.name).finish()
	}
}

/// Ordered list of mutators run against the same object.
///
/// An error aborts the chain and is returned as is. [`Control::Stop`] ends the
/// chain early but counts as success. The chain is itself a [`Mutator`], so
/// chains nest; a nested chain that stops also stops the outer one.
#[derive(Clone, Default)]
pub struct MutatorChain {
	mutators: Vec<Arc<dyn Mutator>>,
}

impl MutatorChain {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder-style append.
	pub fn with(mut self, mutator: impl Mutator + 'static) -> Self {
		self.push(mutator);
		self
	}

	pub fn push(&mut self, mutator: impl Mutator + 'static) {
		self.mutators.push(Arc::new(mutator));
	}

	pub fn len(&self) -> usize {
		self.mutators.len()
	}

	pub fn is_empty(&self) -> bool {
		self.mutators.is_empty()
	}
}

impl Mutator for MutatorChain {
	fn mutate(&self, ctx: &ReviewContext, obj: &mut dyn Object) -> Result<Control, MutationError> {
		for (idx, mutator) in self.mutators.iter().enumerate() {
			let control = mutator.mutate(ctx, obj)?;
			trace!(step = idx, mutator = mutator.name(), ?control, "mutator finished");
			if control == Control::Stop {
				return Ok(Control::Stop);
			}
		}
		Ok(Control::Continue)
	}

	fn name(&self) -> &str {
		"chain"
	}
}

impl fmt::Debug for MutatorChain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list()
			.entries(self.mutators.iter().map(|m| m.name()))
			.finish()
	}
}
