//! Capability interface of the embedded component framework.
//!
//! The engine does not render anything itself. It asks a [`ComponentClass`]
//! to construct an instance into a host node and afterwards only pushes whole
//! property bags into it or destroys it.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::Result;
use crate::host::NodeRef;

/// Opaque property bag handed to component instances.
pub type Props = Value;

/// Shared reference to a component class.
pub type ComponentRef = Rc<dyn ComponentClass>;

/// Handler for events emitted by an instance.
pub type EventHandler = Rc<dyn Fn(&Value)>;

/// Context handed to an instance at construction time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MountContext {
	/// Index of the managed element the instance belongs to.
	pub index: u64,
	/// Caller supplied context entries.
	pub entries: BTreeMap<String, Value>,
}

impl MountContext {
	/// Reads a context entry.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.entries.get(key)
	}
}

/// A constructible component.
pub trait ComponentClass: fmt::Debug {
	/// Constructs a live instance rendering into `target`.
	fn construct(
		&self,
		target: NodeRef,
		props: &Props,
		context: &MountContext,
	) -> Result<Box<dyn ComponentInstance>>;
}

/// A live component instance.
pub trait ComponentInstance {
	/// Replaces the instance's properties. Diffing is the instance's concern.
	fn update(&mut self, props: &Props);

	/// Tears the instance down.
	fn destroy(&mut self);

	/// Subscribes to an event emitted by the instance. Returns false when the
	/// framework does not expose events.
	fn on(&mut self, _event: &str, _handler: EventHandler) -> bool {
		false
	}
}

/// Identity comparison of two class references.
pub fn same_class(a: &ComponentRef, b: &ComponentRef) -> bool {
	std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::RecordingComponent;
	use rstest::rstest;

	#[rstest]
	fn test_same_class_is_identity() {
		let a = RecordingComponent::new();
		let b = RecordingComponent::new();
		let a_ref: ComponentRef = a.clone();
		let a_again: ComponentRef = a;
		let b_ref: ComponentRef = b;

		assert!(same_class(&a_ref, &a_again));
		assert!(!same_class(&a_ref, &b_ref));
	}

	#[rstest]
	fn test_mount_context_lookup() {
		let mut context = MountContext {
			index: 4,
			..MountContext::default()
		};
		context
			.entries
			.insert("theme".to_string(), serde_json::json!("dark"));

		assert_eq!(context.get("theme"), Some(&serde_json::json!("dark")));
		assert!(context.get("missing").is_none());
	}
}
