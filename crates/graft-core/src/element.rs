//! Managed elements.
//!
//! A [`ManagedElement`] binds one placeholder node to a live or deferred
//! component instance. It owns the instance and the watcher subscriptions of
//! its placeholder, and it keeps the engine's store informed of every change.
//!
//! ## Lifecycle
//!
//! ```text
//! Pending ──resolve──▶ Mounted ──destroy──▶ Destroyed
//!    │                                         ▲
//!    └────────────destroy (destroy-after-mount)┘
//! ```
//!
//! While pending, props and the render flag are recorded but no instance
//! exists. An element destroyed while pending still constructs its instance
//! once the component resolves, and tears it down immediately.
//!
//! The instance is taken out of the element before any call into it, so
//! component code may call back into the element (for example destroy it from
//! an event handler) without tripping a `RefCell` borrow.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::component::{ComponentInstance, ComponentRef, EventHandler, MountContext, Props};
use crate::config::ElementOptions;
use crate::error::Result;
use crate::host::{NodeRef, ObserverHandle};
use crate::store::WeakElementStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
	Pending,
	Mounted,
	Destroyed,
}

struct ElementState {
	component: Option<ComponentRef>,
	component_name: Option<String>,
	props: Props,
	should_render: bool,
	instance: Option<Box<dyn ComponentInstance>>,
	watchers: Vec<ObserverHandle>,
	listeners: Vec<(String, EventHandler)>,
	phase: Phase,
}

struct ElementInner {
	index: u64,
	host: NodeRef,
	options: ElementOptions,
	context: MountContext,
	store: WeakElementStore,
	state: RefCell<ElementState>,
}

/// Everything needed to build a pending element.
pub(crate) struct ElementSeed {
	pub(crate) index: u64,
	pub(crate) host: NodeRef,
	pub(crate) options: ElementOptions,
	pub(crate) context: MountContext,
	pub(crate) component: Option<ComponentRef>,
	pub(crate) component_name: Option<String>,
	pub(crate) props: Props,
	pub(crate) should_render: bool,
	pub(crate) store: WeakElementStore,
}

/// A placeholder bound to a component. Clones share the same element.
#[derive(Clone)]
pub struct ManagedElement {
	inner: Rc<ElementInner>,
}

impl ManagedElement {
	pub(crate) fn new(seed: ElementSeed) -> Self {
		Self {
			inner: Rc::new(ElementInner {
				index: seed.index,
				host: seed.host,
				options: seed.options,
				context: seed.context,
				store: seed.store,
				state: RefCell::new(ElementState {
					component: seed.component,
					component_name: seed.component_name,
					props: seed.props,
					should_render: seed.should_render,
					instance: None,
					watchers: Vec::new(),
					listeners: Vec::new(),
					phase: Phase::Pending,
				}),
			}),
		}
	}

	/// Stable identity of this element.
	pub fn index(&self) -> u64 {
		self.inner.index
	}

	/// The placeholder node.
	pub fn host(&self) -> NodeRef {
		Rc::clone(&self.inner.host)
	}

	/// Effective watcher options.
	pub fn options(&self) -> ElementOptions {
		self.inner.options
	}

	/// Context handed to every instance.
	pub fn context(&self) -> &MountContext {
		&self.inner.context
	}

	/// Current props.
	pub fn props(&self) -> Props {
		self.inner.state.borrow().props.clone()
	}

	/// Whether a live instance is wanted.
	pub fn should_render(&self) -> bool {
		self.inner.state.borrow().should_render
	}

	/// The resolved class, once known.
	pub fn component(&self) -> Option<ComponentRef> {
		self.inner.state.borrow().component.clone()
	}

	/// The name the component was requested by, if any.
	pub fn component_name(&self) -> Option<String> {
		self.inner.state.borrow().component_name.clone()
	}

	/// Whether a live instance exists.
	pub fn has_instance(&self) -> bool {
		self.inner.state.borrow().instance.is_some()
	}

	/// Whether the component is still being resolved.
	pub fn is_pending(&self) -> bool {
		self.phase() == Phase::Pending
	}

	/// Whether the element has been destroyed.
	pub fn is_destroyed(&self) -> bool {
		self.phase() == Phase::Destroyed
	}

	/// Number of active watcher subscriptions.
	pub fn watcher_count(&self) -> usize {
		self.inner
			.state
			.borrow()
			.watchers
			.iter()
			.filter(|watcher| watcher.is_connected())
			.count()
	}

	/// Whether both handles refer to the same element.
	pub fn ptr_eq(&self, other: &ManagedElement) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}

	fn phase(&self) -> Phase {
		self.inner.state.borrow().phase
	}

	/// Replaces the props wholesale and pushes them into the live instance.
	pub fn update_props(&self, props: Props) {
		let instance = {
			let mut state = self.inner.state.borrow_mut();
			if state.phase == Phase::Destroyed {
				tracing::debug!(index = self.index(), "ignoring props update on destroyed element");
				return;
			}
			state.props = props.clone();
			state.instance.take()
		};
		if let Some(mut instance) = instance {
			instance.update(&props);
			self.install(instance);
		}
		tracing::debug!(index = self.index(), "props updated");
		self.touch_store();
	}

	/// Creates or destroys the instance. Unchanged values are a no-op.
	///
	/// Turning rendering on constructs the instance right away, unless the
	/// component is still being resolved. A failed construction leaves the
	/// flag off.
	pub fn set_to_render(&self, value: bool) -> Result<()> {
		let (current, phase) = {
			let state = self.inner.state.borrow();
			(state.should_render, state.phase)
		};
		if phase == Phase::Destroyed || current == value {
			return Ok(());
		}
		match (phase, value) {
			(Phase::Pending, _) => {
				self.inner.state.borrow_mut().should_render = value;
			}
			(_, true) => {
				let instance = self.construct_instance()?;
				self.inner.state.borrow_mut().should_render = true;
				if let Some(instance) = instance {
					self.install(instance);
				}
			}
			(_, false) => {
				let instance = {
					let mut state = self.inner.state.borrow_mut();
					state.should_render = false;
					state.instance.take()
				};
				if let Some(mut instance) = instance {
					instance.destroy();
				}
			}
		}
		tracing::debug!(index = self.index(), render = value, "render flag changed");
		self.touch_store();
		Ok(())
	}

	/// Disconnects watchers, destroys the instance and leaves the store.
	///
	/// Calling it again is a no-op.
	pub fn destroy(&self) {
		let (watchers, instance) = {
			let mut state = self.inner.state.borrow_mut();
			if state.phase == Phase::Destroyed {
				return;
			}
			state.phase = Phase::Destroyed;
			(std::mem::take(&mut state.watchers), state.instance.take())
		};
		for watcher in &watchers {
			watcher.disconnect();
		}
		if let Some(mut instance) = instance {
			instance.destroy();
		}
		if let Some(store) = self.inner.store.upgrade() {
			store.update(|elements| elements.retain(|element| !element.ptr_eq(self)));
		}
		tracing::debug!(index = self.index(), "element destroyed");
	}

	/// Subscribes to an event emitted by the instance.
	///
	/// The handler stays attached across re-activations: every instance
	/// constructed later receives it too.
	pub fn on(&self, event: &str, handler: impl Fn(&Value) + 'static) {
		let handler: EventHandler = Rc::new(handler);
		let instance = {
			let mut state = self.inner.state.borrow_mut();
			if state.phase == Phase::Destroyed {
				return;
			}
			state.listeners.push((event.to_string(), Rc::clone(&handler)));
			state.instance.take()
		};
		if let Some(mut instance) = instance {
			if !instance.on(event, handler) {
				tracing::debug!(index = self.index(), event, "component does not expose events");
			}
			self.install(instance);
		}
	}

	/// Finishes a pending mount with the resolved class.
	pub(crate) fn complete_mount(&self, class: ComponentRef) -> Result<()> {
		let (phase, should_render) = {
			let mut state = self.inner.state.borrow_mut();
			state.component = Some(class);
			(state.phase, state.should_render)
		};
		match phase {
			Phase::Mounted => Ok(()),
			Phase::Destroyed => {
				if should_render {
					if let Some(mut instance) = self.construct_instance()? {
						instance.destroy();
					}
					tracing::debug!(
						index = self.index(),
						"destroyed instance of element torn down before mount"
					);
				}
				Ok(())
			}
			Phase::Pending => {
				let instance = if should_render {
					self.construct_instance()?
				} else {
					None
				};
				{
					let mut state = self.inner.state.borrow_mut();
					if state.phase == Phase::Pending {
						state.phase = Phase::Mounted;
					}
				}
				if let Some(instance) = instance {
					self.install(instance);
				}
				tracing::debug!(index = self.index(), render = should_render, "element mounted");
				Ok(())
			}
		}
	}

	/// Keeps a watcher subscription alive for the element's lifetime.
	pub(crate) fn add_watcher(&self, watcher: ObserverHandle) {
		let mut state = self.inner.state.borrow_mut();
		if state.phase == Phase::Destroyed {
			drop(state);
			watcher.disconnect();
			return;
		}
		state.watchers.push(watcher);
	}

	pub(crate) fn downgrade(&self) -> WeakManagedElement {
		WeakManagedElement {
			inner: Rc::downgrade(&self.inner),
		}
	}

	fn construct_instance(&self) -> Result<Option<Box<dyn ComponentInstance>>> {
		let (class, props, listeners) = {
			let state = self.inner.state.borrow();
			let Some(class) = state.component.clone() else {
				return Ok(None);
			};
			(class, state.props.clone(), state.listeners.clone())
		};
		let mut instance = class.construct(self.host(), &props, &self.inner.context)?;
		for (event, handler) in listeners {
			if !instance.on(&event, handler) {
				tracing::debug!(
					index = self.index(),
					event = %event,
					"component does not expose events"
				);
			}
		}
		Ok(Some(instance))
	}

	/// Puts an instance back, or destroys it when the element no longer wants
	/// one.
	fn install(&self, mut instance: Box<dyn ComponentInstance>) {
		{
			let mut state = self.inner.state.borrow_mut();
			if state.phase != Phase::Destroyed && state.should_render && state.instance.is_none() {
				state.instance = Some(instance);
				return;
			}
		}
		instance.destroy();
	}

	fn touch_store(&self) {
		if let Some(store) = self.inner.store.upgrade() {
			store.touch();
		}
	}
}

impl PartialEq for ManagedElement {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl fmt::Debug for ManagedElement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.inner.state.borrow();
		f.debug_struct("ManagedElement")
			.field("index", &self.inner.index)
			.field("component", &state.component_name)
			.field("should_render", &state.should_render)
			.field("has_instance", &state.instance.is_some())
			.field("phase", &state.phase)
			.finish()
	}
}

/// Non-owning element reference held by watcher callbacks.
#[derive(Clone)]
pub(crate) struct WeakManagedElement {
	inner: Weak<ElementInner>,
}

impl WeakManagedElement {
	pub(crate) fn upgrade(&self) -> Option<ManagedElement> {
		self.inner.upgrade().map(|inner| ManagedElement { inner })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dom::Document;
	use crate::store::ElementStore;
	use crate::testing::{FailingComponent, RecordingComponent};
	use rstest::rstest;
	use serde_json::json;
	use std::cell::Cell;

	fn seed(store: &ElementStore, component: ComponentRef, should_render: bool) -> ElementSeed {
		let doc = Document::new();
		let host = doc.create_element("div");
		doc.body().append_child(&host);
		ElementSeed {
			index: 1,
			host: host.to_ref(),
			options: ElementOptions::default(),
			context: MountContext {
				index: 1,
				..MountContext::default()
			},
			component: Some(component),
			component_name: Some("hello".to_string()),
			props: json!({"name": "world"}),
			should_render,
			store: store.downgrade(),
		}
	}

	fn mounted(
		store: &ElementStore,
		component: ComponentRef,
		should_render: bool,
	) -> ManagedElement {
		let element = ManagedElement::new(seed(store, component.clone(), should_render));
		store.update(|elements| elements.push(element.clone()));
		element.complete_mount(component).unwrap();
		element
	}

	#[rstest]
	fn test_mount_constructs_with_props() {
		let store = ElementStore::new();
		let class = RecordingComponent::new();

		let element = mounted(&store, class.clone(), true);

		assert!(element.has_instance());
		assert!(!element.is_pending());
		assert_eq!(class.constructed_props(), vec![json!({"name": "world"})]);
		assert_eq!(class.last_context().unwrap().index, 1);
	}

	#[rstest]
	fn test_update_props_replaces_wholesale() {
		let store = ElementStore::new();
		let class = RecordingComponent::new();
		let element = mounted(&store, class.clone(), true);

		element.update_props(json!({"other": true}));

		assert_eq!(element.props(), json!({"other": true}));
		assert_eq!(class.updates(), vec![json!({"other": true})]);
	}

	#[rstest]
	fn test_set_to_render_toggles_instance() {
		let store = ElementStore::new();
		let class = RecordingComponent::new();
		let element = mounted(&store, class.clone(), false);
		assert!(!element.has_instance());

		element.set_to_render(true).unwrap();
		element.set_to_render(true).unwrap();
		assert_eq!(class.construct_count(), 1);
		assert!(element.has_instance());

		element.set_to_render(false).unwrap();
		assert!(!element.has_instance());
		assert_eq!(class.destroy_count(), 1);
		assert!(store.contains(1));
	}

	#[rstest]
	fn test_unchanged_render_flag_does_not_touch_store() {
		let store = ElementStore::new();
		let element = mounted(&store, RecordingComponent::new(), false);
		let before = store.revision();

		element.set_to_render(true).unwrap();
		element.set_to_render(true).unwrap();

		assert_eq!(store.revision(), before + 1);
	}

	#[rstest]
	fn test_failed_construction_keeps_flag_off() {
		let store = ElementStore::new();
		let element = mounted(&store, FailingComponent::new("boom"), false);

		assert!(element.set_to_render(true).is_err());
		assert!(!element.should_render());
		assert!(!element.has_instance());
	}

	#[rstest]
	fn test_destroy_is_idempotent() {
		let store = ElementStore::new();
		let class = RecordingComponent::new();
		let element = mounted(&store, class.clone(), true);

		element.destroy();
		let revision = store.revision();
		element.destroy();

		assert!(element.is_destroyed());
		assert!(store.is_empty());
		assert_eq!(store.revision(), revision);
		assert_eq!(class.destroy_count(), 1);
	}

	#[rstest]
	fn test_destroy_before_mount_tears_down_eventual_instance() {
		let store = ElementStore::new();
		let class = RecordingComponent::new();
		let element = ManagedElement::new(seed(&store, class.clone(), true));
		store.update(|elements| elements.push(element.clone()));

		element.destroy();
		element.complete_mount(class.clone()).unwrap();

		assert_eq!(class.construct_count(), 1);
		assert_eq!(class.live_count(), 0);
		assert!(!element.has_instance());
	}

	#[rstest]
	fn test_pending_render_flag_is_recorded() {
		let store = ElementStore::new();
		let class = RecordingComponent::new();
		let element = ManagedElement::new(seed(&store, class.clone(), true));

		element.set_to_render(false).unwrap();
		element.complete_mount(class.clone()).unwrap();

		assert_eq!(class.construct_count(), 0);
		assert!(!element.has_instance());
	}

	#[rstest]
	fn test_listeners_survive_reactivation() {
		let store = ElementStore::new();
		let class = RecordingComponent::new();
		let element = mounted(&store, class.clone(), true);
		let heard = Rc::new(Cell::new(0));
		let counter = heard.clone();
		element.on("click", move |_| counter.set(counter.get() + 1));

		element.set_to_render(false).unwrap();
		element.set_to_render(true).unwrap();
		class.emit("click", &json!(null));

		assert_eq!(heard.get(), 1);
	}

	#[rstest]
	fn test_watchers_added_after_destroy_are_disconnected() {
		let store = ElementStore::new();
		let element = mounted(&store, RecordingComponent::new(), true);
		element.destroy();

		let handle = ObserverHandle::new(|| {});
		element.add_watcher(handle);

		assert_eq!(element.watcher_count(), 0);
	}
}
