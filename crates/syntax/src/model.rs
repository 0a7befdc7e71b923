use std::any::Any;
use std::fmt;
use std::sync::Arc;

use lull_primitives::{ChangeSet, Rope};
use lull_worker::Clock;

use crate::config::WorkConfig;
use crate::context::ParseContext;
use crate::error::ParseError;
use crate::fragment::Fragment;
use crate::parser::Parser;
use crate::tree::Tree;

/// A parser bundled with the opaque extensions that travel with it.
pub struct ModelSupport<F: Fragment> {
	name: String,
	parser: Arc<dyn Parser<F>>,
	support: Vec<Arc<dyn Any + Send + Sync>>,
}

impl<F: Fragment> ModelSupport<F> {
	pub fn new(name: impl Into<String>, parser: Arc<dyn Parser<F>>) -> Self {
		Self {
			name: name.into(),
			parser,
			support: Vec::new(),
		}
	}

	/// Attaches a support extension. Extensions are looked up by type.
	pub fn with_support<T: Any + Send + Sync>(mut self, extension: T) -> Self {
		self.support.push(Arc::new(extension));
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn parser(&self) -> &Arc<dyn Parser<F>> {
		&self.parser
	}

	/// The first attached extension of type `T`.
	pub fn support<T: Any + Send + Sync>(&self) -> Option<&T> {
		self.support.iter().find_map(|ext| ext.downcast_ref::<T>())
	}
}

impl<F: Fragment> fmt::Debug for ModelSupport<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ModelSupport")
			.field("name", &self.name)
			.field("support", &self.support.len())
			.finish()
	}
}

/// The tree hosts read, paired with the live context that keeps working on
/// the document behind it.
#[derive(Debug)]
pub struct ModelState<F: Fragment> {
	tree: Tree<F>,
	context: ParseContext<F>,
}

impl<F: Fragment> ModelState<F> {
	pub fn init(support: &ModelSupport<F>, doc: Rope, clock: Arc<dyn Clock>, config: WorkConfig) -> Result<Self, ParseError> {
		let context = ParseContext::init(Arc::clone(support.parser()), doc, clock, config)?;
		Ok(Self::new(context))
	}

	/// Publishes the context's current tree.
	pub fn new(context: ParseContext<F>) -> Self {
		Self {
			tree: context.tree().clone(),
			context,
		}
	}

	/// State for the document after `changes`.
	pub fn apply(&mut self, changes: &ChangeSet, doc: Rope) -> Result<Self, ParseError> {
		Ok(Self::new(self.context.apply(changes, doc)?))
	}

	/// Makes the context's latest tree the published one.
	pub fn publish(&mut self) -> Tree<F> {
		self.tree = self.context.tree().clone();
		self.tree.clone()
	}

	/// True when the published tree is the context's latest.
	pub fn is_published(&self) -> bool {
		self.tree.same(self.context.tree())
	}

	pub fn tree(&self) -> &Tree<F> {
		&self.tree
	}

	pub fn context(&self) -> &ParseContext<F> {
		&self.context
	}

	pub fn context_mut(&mut self) -> &mut ParseContext<F> {
		&mut self.context
	}
}
