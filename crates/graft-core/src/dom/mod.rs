//! In-memory host tree.
//!
//! A small element/text tree with mutation observation, implementing
//! [`HostNode`]. It backs server-side and test usage of the engine, where no
//! browser DOM exists.
//!
//! Mutations are queued as they happen and delivered when
//! [`Document::flush`] runs, so one `flush` is one watcher notification cycle.

mod builder;
mod observer;

pub use builder::ElementBuilder;

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::host::{
	HostNode, MutationCallback, MutationInit, MutationKind, MutationRecord, NodeRef,
	ObserverHandle,
};
use observer::{MutationQueue, Registration};

struct DocumentInner {
	root: RefCell<Option<Node>>,
	queue: MutationQueue,
}

/// An in-memory document owning a root element.
#[derive(Clone)]
pub struct Document {
	inner: Rc<DocumentInner>,
}

impl Default for Document {
	fn default() -> Self {
		Self::new()
	}
}

impl Document {
	/// Creates a document with an empty `body` root.
	pub fn new() -> Self {
		let inner = Rc::new(DocumentInner {
			root: RefCell::new(None),
			queue: MutationQueue::default(),
		});
		let root = Node::new(Rc::downgrade(&inner), NodeKind::Element("body".to_string()));
		*inner.root.borrow_mut() = Some(root);
		Self { inner }
	}

	/// The root element. Nodes are connected when they descend from it.
	pub fn body(&self) -> Node {
		self.inner
			.root
			.borrow()
			.clone()
			.unwrap_or_else(|| Node::new(Weak::new(), NodeKind::Element("body".to_string())))
	}

	/// Creates a detached element.
	pub fn create_element(&self, tag: impl Into<String>) -> Node {
		Node::new(Rc::downgrade(&self.inner), NodeKind::Element(tag.into()))
	}

	/// Creates a detached text node.
	pub fn create_text(&self, text: impl Into<String>) -> Node {
		let node = Node::new(Rc::downgrade(&self.inner), NodeKind::Text);
		*node.data.text.borrow_mut() = text.into();
		node
	}

	/// Starts building a detached element.
	pub fn element(&self, tag: impl Into<String>) -> ElementBuilder {
		ElementBuilder::new(self.create_element(tag))
	}

	/// Delivers queued mutation records to their observers.
	///
	/// Records queued by callbacks during delivery are delivered in the same
	/// call. Returns the number of records delivered.
	pub fn flush(&self) -> usize {
		self.inner.queue.flush()
	}

	/// Number of records waiting for the next [`Document::flush`].
	pub fn pending_records(&self) -> usize {
		self.inner.queue.pending_records()
	}
}

impl fmt::Debug for Document {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Document")
			.field("pending_records", &self.pending_records())
			.finish()
	}
}

enum NodeKind {
	Element(String),
	Text,
}

struct NodeData {
	document: Weak<DocumentInner>,
	kind: NodeKind,
	attributes: RefCell<Vec<(String, String)>>,
	text: RefCell<String>,
	children: RefCell<Vec<Node>>,
	parent: RefCell<Weak<NodeData>>,
	registrations: RefCell<Vec<Registration>>,
}

/// Handle to an element or text node. Clones share the same node.
#[derive(Clone)]
pub struct Node {
	data: Rc<NodeData>,
}

impl Node {
	fn new(document: Weak<DocumentInner>, kind: NodeKind) -> Self {
		Self {
			data: Rc::new(NodeData {
				document,
				kind,
				attributes: RefCell::new(Vec::new()),
				text: RefCell::new(String::new()),
				children: RefCell::new(Vec::new()),
				parent: RefCell::new(Weak::new()),
				registrations: RefCell::new(Vec::new()),
			}),
		}
	}

	/// Creates a detached text node in this node's document.
	pub(super) fn new_text(&self, text: String) -> Node {
		let node = Node::new(self.data.document.clone(), NodeKind::Text);
		*node.data.text.borrow_mut() = text;
		node
	}

	/// Wraps this handle for the engine.
	pub fn to_ref(&self) -> NodeRef {
		Rc::new(self.clone())
	}

	/// Whether both handles point at the same node.
	pub fn ptr_eq(&self, other: &Node) -> bool {
		Rc::ptr_eq(&self.data, &other.data)
	}

	/// Tag name for elements, `None` for text nodes.
	pub fn tag_name(&self) -> Option<&str> {
		match &self.data.kind {
			NodeKind::Element(tag) => Some(tag),
			NodeKind::Text => None,
		}
	}

	/// Whether this is a text node.
	pub fn is_text(&self) -> bool {
		matches!(self.data.kind, NodeKind::Text)
	}

	/// Reads an attribute.
	pub fn attribute(&self, name: &str) -> Option<String> {
		self.data
			.attributes
			.borrow()
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.clone())
	}

	/// Writes an attribute. Ignored on text nodes.
	pub fn set_attribute(&self, name: &str, value: &str) {
		if self.is_text() {
			return;
		}
		{
			let mut attributes = self.data.attributes.borrow_mut();
			match attributes.iter_mut().find(|(key, _)| key == name) {
				Some((_, existing)) => *existing = value.to_string(),
				None => attributes.push((name.to_string(), value.to_string())),
			}
		}
		self.queue_mutation(MutationKind::Attributes {
			name: name.to_string(),
		});
	}

	/// Removes an attribute if present.
	pub fn remove_attribute(&self, name: &str) {
		let removed = {
			let mut attributes = self.data.attributes.borrow_mut();
			let before = attributes.len();
			attributes.retain(|(key, _)| key != name);
			attributes.len() != before
		};
		if removed {
			self.queue_mutation(MutationKind::Attributes {
				name: name.to_string(),
			});
		}
	}

	/// Parent node, if attached.
	pub fn parent_node(&self) -> Option<Node> {
		self.data
			.parent
			.borrow()
			.upgrade()
			.map(|data| Node { data })
	}

	/// Children, in order.
	pub fn child_nodes(&self) -> Vec<Node> {
		self.data.children.borrow().clone()
	}

	/// Whether `self` is `other` or one of its ancestors.
	pub fn contains(&self, other: &Node) -> bool {
		let mut current = Some(other.clone());
		while let Some(node) = current {
			if node.ptr_eq(self) {
				return true;
			}
			current = node.parent_node();
		}
		false
	}

	/// Appends `child`, detaching it from its previous parent first.
	pub fn append_child(&self, child: &Node) {
		self.insert_before(child, None);
	}

	/// Inserts `child` before `reference`, or appends it when `reference` is
	/// `None` or not a child of `self`.
	pub fn insert_before(&self, child: &Node, reference: Option<&Node>) {
		if self.is_text() || child.contains(self) {
			tracing::warn!("rejected insertion that would create a cycle or nest under text");
			return;
		}
		child.remove();
		{
			let mut children = self.data.children.borrow_mut();
			let position = reference
				.and_then(|reference| children.iter().position(|c| c.ptr_eq(reference)))
				.unwrap_or(children.len());
			children.insert(position, child.clone());
		}
		*child.data.parent.borrow_mut() = Rc::downgrade(&self.data);
		self.queue_mutation(MutationKind::ChildList {
			added: 1,
			removed: 0,
		});
	}

	/// Removes `child`. Returns false when it is not a child of `self`.
	pub fn remove_child(&self, child: &Node) -> bool {
		let removed = {
			let mut children = self.data.children.borrow_mut();
			match children.iter().position(|c| c.ptr_eq(child)) {
				Some(position) => {
					children.remove(position);
					true
				}
				None => false,
			}
		};
		if removed {
			*child.data.parent.borrow_mut() = Weak::new();
			self.queue_mutation(MutationKind::ChildList {
				added: 0,
				removed: 1,
			});
		}
		removed
	}

	/// Detaches this node from its parent.
	pub fn remove(&self) {
		if let Some(parent) = self.parent_node() {
			parent.remove_child(self);
		}
	}

	/// Replaces the text of a text node, or all children of an element with
	/// a single text node.
	pub fn set_text(&self, text: impl Into<String>) {
		let text = text.into();
		if self.is_text() {
			*self.data.text.borrow_mut() = text;
			self.queue_mutation(MutationKind::CharacterData);
			return;
		}
		let replacement = self.new_text(text);
		let old = std::mem::take(&mut *self.data.children.borrow_mut());
		for child in &old {
			*child.data.parent.borrow_mut() = Weak::new();
		}
		*replacement.data.parent.borrow_mut() = Rc::downgrade(&self.data);
		self.data.children.borrow_mut().push(replacement);
		self.queue_mutation(MutationKind::ChildList {
			added: 1,
			removed: old.len(),
		});
	}

	/// Concatenated text of this node and its descendants.
	pub fn text_content(&self) -> String {
		if self.is_text() {
			return self.data.text.borrow().clone();
		}
		self.data
			.children
			.borrow()
			.iter()
			.map(Node::text_content)
			.collect()
	}

	/// Whether the node descends from its document's root.
	pub fn is_connected(&self) -> bool {
		let Some(document) = self.data.document.upgrade() else {
			return false;
		};
		let Some(root) = document.root.borrow().clone() else {
			return false;
		};
		root.contains(self)
	}

	/// Descendant elements carrying `attribute`, in document order.
	pub fn descendants_with_attribute(&self, attribute: &str) -> Vec<Node> {
		let mut found = Vec::new();
		for child in self.data.children.borrow().iter() {
			child.collect_with_attribute(attribute, &mut found);
		}
		found
	}

	fn collect_with_attribute(&self, attribute: &str, found: &mut Vec<Node>) {
		if self.attribute(attribute).is_some() {
			found.push(self.clone());
		}
		for child in self.data.children.borrow().iter() {
			child.collect_with_attribute(attribute, found);
		}
	}

	/// Registers an observer on this node.
	pub fn observe(&self, init: MutationInit, callback: MutationCallback) -> ObserverHandle {
		let Some(document) = self.data.document.upgrade() else {
			return ObserverHandle::inert();
		};
		let observer = document.queue.new_observer(callback);
		let id = observer.id;
		self.data.registrations.borrow_mut().push(Registration {
			observer: Rc::clone(&observer),
			init,
		});
		let node = Rc::downgrade(&self.data);
		ObserverHandle::new(move || {
			observer.active.set(false);
			if let Some(node) = node.upgrade() {
				node.registrations
					.borrow_mut()
					.retain(|registration| registration.observer.id != id);
			}
		})
	}

	fn queue_mutation(&self, kind: MutationKind) {
		let Some(document) = self.data.document.upgrade() else {
			return;
		};
		let mut notified = Vec::new();
		let mut current = Some(self.clone());
		let mut is_target = true;
		while let Some(node) = current {
			for registration in node.data.registrations.borrow().iter() {
				let observer = &registration.observer;
				if (is_target || registration.init.subtree)
					&& registration.init.wants(&kind)
					&& observer.active.get()
					&& !notified.contains(&observer.id)
				{
					notified.push(observer.id);
					document.queue.enqueue(
						observer,
						MutationRecord {
							kind: kind.clone(),
							target: self.to_ref(),
						},
					);
				}
			}
			is_target = false;
			current = node.parent_node();
		}
	}
}

impl fmt::Debug for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.data.kind {
			NodeKind::Element(tag) => f
				.debug_struct("Element")
				.field("tag", tag)
				.field("attributes", &*self.data.attributes.borrow())
				.field("children", &self.data.children.borrow().len())
				.finish(),
			NodeKind::Text => f
				.debug_tuple("Text")
				.field(&*self.data.text.borrow())
				.finish(),
		}
	}
}

impl HostNode for Node {
	fn attribute(&self, name: &str) -> Option<String> {
		Node::attribute(self, name)
	}

	fn set_attribute(&self, name: &str, value: &str) {
		Node::set_attribute(self, name, value);
	}

	fn remove_attribute(&self, name: &str) {
		Node::remove_attribute(self, name);
	}

	fn text_content(&self) -> String {
		Node::text_content(self)
	}

	fn parent(&self) -> Option<NodeRef> {
		self.parent_node().map(|parent| parent.to_ref())
	}

	fn children(&self) -> Vec<NodeRef> {
		self.data.children.borrow().iter().map(Node::to_ref).collect()
	}

	fn is_connected(&self) -> bool {
		Node::is_connected(self)
	}

	fn query_attribute(&self, attribute: &str) -> Vec<NodeRef> {
		self.descendants_with_attribute(attribute)
			.iter()
			.map(Node::to_ref)
			.collect()
	}

	fn same_node(&self, other: &dyn HostNode) -> bool {
		other
			.as_any()
			.downcast_ref::<Node>()
			.is_some_and(|other| self.ptr_eq(other))
	}

	fn observe(&self, init: MutationInit, callback: MutationCallback) -> ObserverHandle {
		Node::observe(self, init, callback)
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}
