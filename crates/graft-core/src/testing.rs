//! Test doubles for the embedded component framework.
//!
//! [`RecordingComponent`] records every construction, update and destruction
//! so tests can assert on what the engine asked the framework to do.
//! [`FailingComponent`] refuses to construct.
//!
//! # Example
//!
//! ```
//! use graft_core::testing::RecordingComponent;
//! use graft_core::{ComponentSource, Graft};
//!
//! let engine = Graft::new();
//! let hello = RecordingComponent::new();
//! engine.register_component("hello", ComponentSource::eager(hello.clone()));
//! assert_eq!(hello.construct_count(), 0);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::component::{
	ComponentClass, ComponentInstance, EventHandler, MountContext, Props,
};
use crate::error::{GraftError, Result};
use crate::host::NodeRef;

#[derive(Default)]
struct MountLog {
	constructed: Vec<Props>,
	contexts: Vec<MountContext>,
	updates: Vec<Props>,
	destroyed: usize,
	live: usize,
	next_instance: u64,
	handlers: Vec<(u64, String, EventHandler)>,
}

/// A component class that records its lifecycle.
#[derive(Default)]
pub struct RecordingComponent {
	log: Rc<RefCell<MountLog>>,
}

impl RecordingComponent {
	/// Creates a class. The returned `Rc` is the class identity.
	pub fn new() -> Rc<Self> {
		Rc::new(Self::default())
	}

	/// Number of instances constructed so far.
	pub fn construct_count(&self) -> usize {
		self.log.borrow().constructed.len()
	}

	/// Number of `update` calls across all instances.
	pub fn update_count(&self) -> usize {
		self.log.borrow().updates.len()
	}

	/// Number of instances destroyed.
	pub fn destroy_count(&self) -> usize {
		self.log.borrow().destroyed
	}

	/// Number of instances currently alive.
	pub fn live_count(&self) -> usize {
		self.log.borrow().live
	}

	/// Props each instance was constructed with, in order.
	pub fn constructed_props(&self) -> Vec<Props> {
		self.log.borrow().constructed.clone()
	}

	/// Props pushed through `update`, in order.
	pub fn updates(&self) -> Vec<Props> {
		self.log.borrow().updates.clone()
	}

	/// Context of the most recent construction.
	pub fn last_context(&self) -> Option<MountContext> {
		self.log.borrow().contexts.last().cloned()
	}

	/// Emits `event` from every live instance. Returns the number of handlers
	/// invoked.
	pub fn emit(&self, event: &str, detail: &Value) -> usize {
		let handlers: Vec<EventHandler> = self
			.log
			.borrow()
			.handlers
			.iter()
			.filter(|(_, name, _)| name == event)
			.map(|(_, _, handler)| Rc::clone(handler))
			.collect();
		for handler in &handlers {
			handler(detail);
		}
		handlers.len()
	}
}

impl fmt::Debug for RecordingComponent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let log = self.log.borrow();
		f.debug_struct("RecordingComponent")
			.field("constructed", &log.constructed.len())
			.field("live", &log.live)
			.finish()
	}
}

impl ComponentClass for RecordingComponent {
	fn construct(
		&self,
		_target: NodeRef,
		props: &Props,
		context: &MountContext,
	) -> Result<Box<dyn ComponentInstance>> {
		let mut log = self.log.borrow_mut();
		log.constructed.push(props.clone());
		log.contexts.push(context.clone());
		log.live += 1;
		log.next_instance += 1;
		Ok(Box::new(RecordingInstance {
			id: log.next_instance,
			log: Rc::clone(&self.log),
			destroyed: false,
		}))
	}
}

struct RecordingInstance {
	id: u64,
	log: Rc<RefCell<MountLog>>,
	destroyed: bool,
}

impl ComponentInstance for RecordingInstance {
	fn update(&mut self, props: &Props) {
		self.log.borrow_mut().updates.push(props.clone());
	}

	fn destroy(&mut self) {
		if self.destroyed {
			return;
		}
		self.destroyed = true;
		let mut log = self.log.borrow_mut();
		log.destroyed += 1;
		log.live -= 1;
		let id = self.id;
		log.handlers.retain(|(owner, _, _)| *owner != id);
	}

	fn on(&mut self, event: &str, handler: EventHandler) -> bool {
		self.log
			.borrow_mut()
			.handlers
			.push((self.id, event.to_string(), handler));
		true
	}
}

/// A component class whose construction always fails.
#[derive(Debug)]
pub struct FailingComponent {
	message: String,
}

impl FailingComponent {
	/// Creates a class failing with `message`.
	pub fn new(message: impl Into<String>) -> Rc<Self> {
		Rc::new(Self {
			message: message.into(),
		})
	}
}

impl ComponentClass for FailingComponent {
	fn construct(
		&self,
		_target: NodeRef,
		_props: &Props,
		_context: &MountContext,
	) -> Result<Box<dyn ComponentInstance>> {
		Err(GraftError::MountFailed(self.message.clone()))
	}
}
