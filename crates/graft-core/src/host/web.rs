//! Browser host tree.
//!
//! [`WebNode`] adapts a `web_sys::Node` to [`HostNode`]. Mutation observation
//! is backed by a native `MutationObserver`; the records a browser delivers in
//! one microtask form one notification cycle.

use std::any::Any;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Element, MutationObserver, MutationObserverInit};

use super::{
	HostNode, MutationCallback, MutationInit, MutationKind, MutationRecord, NodeRef, ObserverHandle,
};

/// A browser DOM node.
#[derive(Debug, Clone)]
pub struct WebNode {
	node: web_sys::Node,
}

impl WebNode {
	/// Wraps a DOM node.
	pub fn new(node: impl Into<web_sys::Node>) -> Self {
		Self { node: node.into() }
	}

	/// Wraps a DOM node for the engine.
	pub fn node_ref(node: impl Into<web_sys::Node>) -> NodeRef {
		Rc::new(Self::new(node))
	}

	/// The underlying DOM node.
	pub fn as_node(&self) -> &web_sys::Node {
		&self.node
	}

	fn element(&self) -> Option<&Element> {
		self.node.dyn_ref::<Element>()
	}
}

impl From<web_sys::Node> for WebNode {
	fn from(node: web_sys::Node) -> Self {
		Self { node }
	}
}

impl HostNode for WebNode {
	fn attribute(&self, name: &str) -> Option<String> {
		self.element()?.get_attribute(name)
	}

	fn set_attribute(&self, name: &str, value: &str) {
		if let Some(element) = self.element()
			&& let Err(err) = element.set_attribute(name, value)
		{
			tracing::warn!(attribute = name, error = ?err, "failed to set attribute");
		}
	}

	fn remove_attribute(&self, name: &str) {
		if let Some(element) = self.element()
			&& let Err(err) = element.remove_attribute(name)
		{
			tracing::warn!(attribute = name, error = ?err, "failed to remove attribute");
		}
	}

	fn text_content(&self) -> String {
		self.node.text_content().unwrap_or_default()
	}

	fn parent(&self) -> Option<NodeRef> {
		self.node.parent_node().map(WebNode::node_ref)
	}

	fn children(&self) -> Vec<NodeRef> {
		let nodes = self.node.child_nodes();
		(0..nodes.length())
			.filter_map(|i| nodes.get(i))
			.map(WebNode::node_ref)
			.collect()
	}

	fn is_connected(&self) -> bool {
		self.node.is_connected()
	}

	fn query_attribute(&self, attribute: &str) -> Vec<NodeRef> {
		let Some(element) = self.element() else {
			return Vec::new();
		};
		let nodes = match element.query_selector_all(&format!("[{attribute}]")) {
			Ok(nodes) => nodes,
			Err(err) => {
				tracing::warn!(attribute, error = ?err, "attribute query failed");
				return Vec::new();
			}
		};
		(0..nodes.length())
			.filter_map(|i| nodes.get(i))
			.map(WebNode::node_ref)
			.collect()
	}

	fn same_node(&self, other: &dyn HostNode) -> bool {
		other
			.as_any()
			.downcast_ref::<WebNode>()
			.is_some_and(|other| self.node.is_same_node(Some(&other.node)))
	}

	fn observe(&self, init: MutationInit, callback: MutationCallback) -> ObserverHandle {
		let closure = Closure::wrap(Box::new(
			move |records: js_sys::Array, _observer: MutationObserver| {
				let batch: Vec<MutationRecord> = records
					.iter()
					.filter_map(|record| record.dyn_into::<web_sys::MutationRecord>().ok())
					.filter_map(|record| convert_record(&record))
					.collect();
				if !batch.is_empty() {
					callback(&batch);
				}
			},
		) as Box<dyn FnMut(js_sys::Array, MutationObserver)>);

		let observer = match MutationObserver::new(closure.as_ref().unchecked_ref()) {
			Ok(observer) => observer,
			Err(err) => {
				tracing::error!(error = ?err, "failed to create mutation observer");
				return ObserverHandle::inert();
			}
		};
		if let Err(err) = observer.observe_with_options(&self.node, &observer_init(&init)) {
			tracing::error!(error = ?err, "failed to observe node");
			return ObserverHandle::inert();
		}

		let observation = Observation {
			observer,
			_callback: closure,
		};
		ObserverHandle::new(move || drop(observation))
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

/// Keeps the callback alive for as long as the observer is connected.
struct Observation {
	observer: MutationObserver,
	_callback: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
}

impl Drop for Observation {
	fn drop(&mut self) {
		self.observer.disconnect();
	}
}

fn observer_init(init: &MutationInit) -> MutationObserverInit {
	let options = MutationObserverInit::new();
	options.set_child_list(init.child_list);
	options.set_attributes(init.attributes);
	options.set_character_data(init.character_data);
	options.set_subtree(init.subtree);
	if let Some(filter) = &init.attribute_filter {
		let names: js_sys::Array = filter
			.iter()
			.map(|name| wasm_bindgen::JsValue::from_str(name))
			.collect();
		options.set_attribute_filter(&names);
	}
	options
}

fn convert_record(record: &web_sys::MutationRecord) -> Option<MutationRecord> {
	let kind = match record.type_().as_str() {
		"attributes" => MutationKind::Attributes {
			name: record.attribute_name()?,
		},
		"characterData" => MutationKind::CharacterData,
		"childList" => MutationKind::ChildList {
			added: record.added_nodes().length() as usize,
			removed: record.removed_nodes().length() as usize,
		},
		_ => return None,
	};
	Some(MutationRecord {
		kind,
		target: WebNode::node_ref(record.target()?),
	})
}
