//! Host tree capability interface.
//!
//! The engine never touches a concrete tree. Everything it needs from the host
//! (reading and writing attributes, reading text, walking the tree and
//! subscribing to mutations) goes through [`HostNode`], so the same engine runs
//! over the in-memory tree in [`crate::dom`], over a browser DOM
//! (`host::web`, wasm32 only) or over any other representation.

#[cfg(target_arch = "wasm32")]
pub mod web;

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared handle to a host node.
pub type NodeRef = Rc<dyn HostNode>;

/// Callback invoked with a batch of mutation records.
pub type MutationCallback = Rc<dyn Fn(&[MutationRecord])>;

/// A node of the host tree, as seen by the engine.
pub trait HostNode: fmt::Debug {
	/// Reads an attribute value.
	fn attribute(&self, name: &str) -> Option<String>;

	/// Writes an attribute value.
	fn set_attribute(&self, name: &str, value: &str);

	/// Removes an attribute. Removing an absent attribute is a no-op.
	fn remove_attribute(&self, name: &str);

	/// Concatenated text of this node and its descendants.
	fn text_content(&self) -> String;

	/// Parent node, if attached.
	fn parent(&self) -> Option<NodeRef>;

	/// Direct children, in order.
	fn children(&self) -> Vec<NodeRef>;

	/// Whether the node is reachable from the document root.
	fn is_connected(&self) -> bool;

	/// Descendants (excluding `self`) carrying `attribute`, in document order.
	fn query_attribute(&self, attribute: &str) -> Vec<NodeRef>;

	/// Whether `other` refers to the same underlying node.
	fn same_node(&self, other: &dyn HostNode) -> bool;

	/// Subscribes to mutations of this node (and its subtree when
	/// `init.subtree` is set).
	fn observe(&self, init: MutationInit, callback: MutationCallback) -> ObserverHandle;

	/// Upcast used by implementations of [`HostNode::same_node`].
	fn as_any(&self) -> &dyn Any;

	/// Whether the `class` attribute contains `class` as a token.
	fn has_class(&self, class: &str) -> bool {
		self.attribute("class")
			.is_some_and(|value| value.split_whitespace().any(|token| token == class))
	}
}

/// Which mutations an observer wants to hear about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationInit {
	/// Additions and removals of children.
	pub child_list: bool,
	/// Attribute writes.
	pub attributes: bool,
	/// Text changes of character data nodes.
	pub character_data: bool,
	/// Extend observation to all descendants.
	pub subtree: bool,
	/// Restricts attribute observation to these names.
	pub attribute_filter: Option<Vec<String>>,
}

impl MutationInit {
	/// Observe direct child additions and removals.
	pub fn child_list() -> Self {
		Self {
			child_list: true,
			..Self::default()
		}
	}

	/// Observe writes to the named attributes.
	pub fn attributes<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			attributes: true,
			attribute_filter: Some(names.into_iter().map(Into::into).collect()),
			..Self::default()
		}
	}

	/// Also observe child list changes.
	pub fn with_child_list(mut self) -> Self {
		self.child_list = true;
		self
	}

	/// Also observe character data changes.
	pub fn with_character_data(mut self) -> Self {
		self.character_data = true;
		self
	}

	/// Extend observation to the whole subtree.
	pub fn with_subtree(mut self) -> Self {
		self.subtree = true;
		self
	}

	/// Whether an attribute write to `name` matches this init.
	pub fn wants_attribute(&self, name: &str) -> bool {
		self.attributes
			&& self
				.attribute_filter
				.as_ref()
				.is_none_or(|filter| filter.iter().any(|f| f == name))
	}

	/// Whether a record of `kind` matches this init.
	pub fn wants(&self, kind: &MutationKind) -> bool {
		match kind {
			MutationKind::Attributes { name } => self.wants_attribute(name),
			MutationKind::CharacterData => self.character_data,
			MutationKind::ChildList { .. } => self.child_list,
		}
	}
}

/// What changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
	/// An attribute was written or removed.
	Attributes {
		/// Attribute name.
		name: String,
	},
	/// The text of a character data node changed.
	CharacterData,
	/// Children were added or removed.
	ChildList {
		/// Number of nodes added.
		added: usize,
		/// Number of nodes removed.
		removed: usize,
	},
}

/// A single observed mutation.
#[derive(Debug, Clone)]
pub struct MutationRecord {
	/// What changed.
	pub kind: MutationKind,
	/// The node the change happened on.
	pub target: NodeRef,
}

/// Handle to an active mutation subscription.
///
/// Disconnecting is idempotent. Whether dropping the handle disconnects is up
/// to the host: the in-memory tree keeps the subscription, the browser tree
/// tears it down.
pub struct ObserverHandle {
	disconnect: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl ObserverHandle {
	/// Wraps the teardown routine of a subscription.
	pub fn new(disconnect: impl FnOnce() + 'static) -> Self {
		Self {
			disconnect: RefCell::new(Some(Box::new(disconnect))),
		}
	}

	/// A handle for a subscription that could not be established.
	pub fn inert() -> Self {
		Self {
			disconnect: RefCell::new(None),
		}
	}

	/// Tears down the subscription.
	pub fn disconnect(&self) {
		let teardown = self.disconnect.borrow_mut().take();
		if let Some(teardown) = teardown {
			teardown();
		}
	}

	/// Whether the subscription is still live.
	pub fn is_connected(&self) -> bool {
		self.disconnect.borrow().is_some()
	}
}

impl fmt::Debug for ObserverHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ObserverHandle")
			.field("connected", &self.is_connected())
			.finish()
	}
}

/// Ancestors of `node`, nearest first.
pub fn ancestors(node: &dyn HostNode) -> Vec<NodeRef> {
	let mut chain = Vec::new();
	let mut current = node.parent();
	while let Some(parent) = current {
		current = parent.parent();
		chain.push(parent);
	}
	chain
}
