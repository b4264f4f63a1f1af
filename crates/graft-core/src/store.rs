//! Shared registry store.
//!
//! The ordered collection of live managed elements, owned by one engine.
//! Every mutation goes through [`ElementStore::update`], which applies the
//! change synchronously and then notifies subscribers once with the new
//! contents. Subscribers run after the store has released its borrow, so they
//! may read the store or call element operations.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::element::ManagedElement;
use crate::host::HostNode;

/// Store subscriber. Receives the elements after each update.
pub type StoreListener = Rc<dyn Fn(&[ManagedElement])>;

#[derive(Default)]
struct StoreInner {
	elements: RefCell<Vec<ManagedElement>>,
	listeners: RefCell<Vec<(u64, StoreListener)>>,
	next_listener: Cell<u64>,
	revision: Cell<u64>,
}

/// Ordered collection of live elements. Clones share the same store.
#[derive(Clone, Default)]
pub struct ElementStore {
	inner: Rc<StoreInner>,
}

impl ElementStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Applies `mutate` and notifies subscribers once.
	pub fn update<R>(&self, mutate: impl FnOnce(&mut Vec<ManagedElement>) -> R) -> R {
		let result = mutate(&mut self.inner.elements.borrow_mut());
		self.inner.revision.set(self.inner.revision.get() + 1);
		self.notify();
		result
	}

	/// Signals that an element's data changed without structural change.
	pub fn touch(&self) {
		self.update(|_| ());
	}

	fn notify(&self) {
		let listeners: Vec<StoreListener> = self
			.inner
			.listeners
			.borrow()
			.iter()
			.map(|(_, listener)| Rc::clone(listener))
			.collect();
		if listeners.is_empty() {
			return;
		}
		let snapshot = self.snapshot();
		for listener in listeners {
			listener(&snapshot);
		}
	}

	/// Subscribes to store updates.
	pub fn subscribe(&self, listener: impl Fn(&[ManagedElement]) + 'static) -> StoreSubscription {
		let id = self.inner.next_listener.get() + 1;
		self.inner.next_listener.set(id);
		self.inner
			.listeners
			.borrow_mut()
			.push((id, Rc::new(listener)));
		StoreSubscription {
			store: Rc::downgrade(&self.inner),
			id,
			active: Cell::new(true),
		}
	}

	/// Copy of the current elements, in registration order.
	pub fn snapshot(&self) -> Vec<ManagedElement> {
		self.inner.elements.borrow().clone()
	}

	/// Element registered under `index`.
	pub fn get(&self, index: u64) -> Option<ManagedElement> {
		self.inner
			.elements
			.borrow()
			.iter()
			.find(|element| element.index() == index)
			.cloned()
	}

	/// Element bound to `node`.
	pub fn find_by_node(&self, node: &dyn HostNode) -> Option<ManagedElement> {
		self.inner
			.elements
			.borrow()
			.iter()
			.find(|element| element.host().same_node(node))
			.cloned()
	}

	/// Whether an element with `index` is registered.
	pub fn contains(&self, index: u64) -> bool {
		self.inner
			.elements
			.borrow()
			.iter()
			.any(|element| element.index() == index)
	}

	/// Number of registered elements.
	pub fn len(&self) -> usize {
		self.inner.elements.borrow().len()
	}

	/// Whether the store is empty.
	pub fn is_empty(&self) -> bool {
		self.inner.elements.borrow().is_empty()
	}

	/// Number of updates applied so far.
	pub fn revision(&self) -> u64 {
		self.inner.revision.get()
	}

	pub(crate) fn downgrade(&self) -> WeakElementStore {
		WeakElementStore {
			inner: Rc::downgrade(&self.inner),
		}
	}
}

impl fmt::Debug for ElementStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ElementStore")
			.field("len", &self.len())
			.field("revision", &self.revision())
			.finish()
	}
}

/// Non-owning store reference held by elements.
#[derive(Clone, Default)]
pub(crate) struct WeakElementStore {
	inner: Weak<StoreInner>,
}

impl WeakElementStore {
	pub(crate) fn upgrade(&self) -> Option<ElementStore> {
		self.inner.upgrade().map(|inner| ElementStore { inner })
	}
}

/// Handle to a store subscription.
pub struct StoreSubscription {
	store: Weak<StoreInner>,
	id: u64,
	active: Cell<bool>,
}

impl StoreSubscription {
	/// Stops notifications. Idempotent.
	pub fn unsubscribe(&self) {
		if !self.active.replace(false) {
			return;
		}
		if let Some(store) = self.store.upgrade() {
			store
				.listeners
				.borrow_mut()
				.retain(|(id, _)| *id != self.id);
		}
	}

	/// Whether notifications are still delivered.
	pub fn is_active(&self) -> bool {
		self.active.get()
	}
}

impl fmt::Debug for StoreSubscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StoreSubscription")
			.field("id", &self.id)
			.field("active", &self.active.get())
			.finish()
	}
}
