//! Lifecycle orchestrator.
//!
//! [`Graft`] is one independent engine: a component registry, an element
//! store and an index allocator. Engines share nothing, so any number of them
//! can run side by side.
//!
//! ## Entry points
//!
//! - [`Graft::create`] resolves a component, claims an index on the host node
//!   and mounts a single element.
//! - [`Graft::hydrate`] scans a subtree for placeholders that carry no index
//!   yet, claims and registers all of them in one store update, then resolves
//!   and mounts each one independently. A placeholder that fails to resolve or
//!   mount is logged and left out of the result; the others are unaffected.
//! - [`Graft::hydrate_element`] is the single-placeholder form of `hydrate`
//!   and reports failures to the caller.
//!
//! The synchronous part of `hydrate` runs before the returned future is first
//! polled, so a second `hydrate` over an overlapping subtree already sees the
//! indices claimed by the first.

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use serde::Serialize;

use crate::codec;
use crate::component::{ComponentClass, ComponentRef, MountContext, Props};
use crate::config::{CreateOptions, EngineConfig};
use crate::element::{ElementSeed, ManagedElement};
use crate::error::{GraftError, Result};
use crate::host::{HostNode, NodeRef};
use crate::index::ElementIndexer;
use crate::placeholder;
use crate::registry::{ComponentRegistry, ComponentSource};
use crate::store::{ElementStore, StoreSubscription};
use crate::watch;

/// What [`Graft::create`] should mount.
#[derive(Debug, Clone)]
pub enum ComponentTarget {
	/// A class reference.
	Class(ComponentRef),
	/// A registered name.
	Name(String),
}

impl From<ComponentRef> for ComponentTarget {
	fn from(class: ComponentRef) -> Self {
		Self::Class(class)
	}
}

impl<C: ComponentClass + 'static> From<Rc<C>> for ComponentTarget {
	fn from(class: Rc<C>) -> Self {
		Self::Class(class)
	}
}

impl From<&str> for ComponentTarget {
	fn from(name: &str) -> Self {
		Self::Name(name.to_string())
	}
}

impl From<String> for ComponentTarget {
	fn from(name: String) -> Self {
		Self::Name(name)
	}
}

struct GraftInner {
	config: Rc<EngineConfig>,
	registry: ComponentRegistry,
	store: ElementStore,
	indexer: ElementIndexer,
}

/// A lifecycle engine. Clones share the same engine.
#[derive(Clone)]
pub struct Graft {
	inner: Rc<GraftInner>,
}

impl Default for Graft {
	fn default() -> Self {
		Self::new()
	}
}

impl Graft {
	/// Creates an engine with the default configuration.
	pub fn new() -> Self {
		Self::with_config(EngineConfig::default())
	}

	/// Creates an engine with `config`.
	pub fn with_config(config: EngineConfig) -> Self {
		let indexer = ElementIndexer::new(config.index_attribute.clone());
		Self {
			inner: Rc::new(GraftInner {
				config: Rc::new(config),
				registry: ComponentRegistry::new(),
				store: ElementStore::new(),
				indexer,
			}),
		}
	}

	/// The engine configuration.
	pub fn config(&self) -> &EngineConfig {
		&self.inner.config
	}

	/// The component registry.
	pub fn registry(&self) -> &ComponentRegistry {
		&self.inner.registry
	}

	/// The element store.
	pub fn store(&self) -> &ElementStore {
		&self.inner.store
	}

	/// Registers a component under `name`. Earlier registrations win.
	pub fn register_component(&self, name: impl Into<String>, source: ComponentSource) {
		self.inner.registry.register(name, source);
	}

	/// Resolves a registered name, running its resolver if needed.
	pub fn find_component_by_name(
		&self,
		name: &str,
	) -> impl Future<Output = Result<Option<ComponentRef>>> + 'static {
		self.inner.registry.find_by_name(name)
	}

	/// Reverse lookup of the name a class was registered under.
	pub fn find_registered_name_by_class(&self, class: &ComponentRef) -> Option<String> {
		self.inner.registry.find_name_by_class(class)
	}

	/// Mounts `target` into `host`.
	///
	/// Fails when the component cannot be resolved, when `host` is already
	/// bound to a live element, or when construction fails. With
	/// `should_render = false` the element is registered without an instance.
	pub fn create(
		&self,
		host: NodeRef,
		target: impl Into<ComponentTarget>,
		props: Props,
		should_render: bool,
		options: CreateOptions,
	) -> LocalBoxFuture<'static, Result<ManagedElement>> {
		let engine = self.clone();
		let target = target.into();
		async move {
			let (class, name) = engine.resolve_target(target).await?;
			let element =
				engine.prepare(host, Some(class.clone()), name, props, should_render, &options)?;
			element.complete_mount(class)?;
			engine.inner.store.update(|elements| elements.push(element.clone()));
			watch::attach_watchers(&element, &engine.inner.config);
			tracing::debug!(index = element.index(), render = should_render, "element created");
			Ok(element)
		}
		.boxed_local()
	}

	/// Mounts every unclaimed placeholder below `root`.
	///
	/// The returned future yields the elements that mounted successfully, in
	/// document order, once all of them have settled.
	pub fn hydrate(
		&self,
		root: NodeRef,
		options: CreateOptions,
	) -> LocalBoxFuture<'static, Vec<ManagedElement>> {
		let config = Rc::clone(&self.inner.config);
		let mut claimed = Vec::new();
		for node in root.query_attribute(&config.component_attribute) {
			if node.attribute(&config.index_attribute).is_some() {
				continue;
			}
			match self.claim_placeholder(node, &options) {
				Ok(entry) => claimed.push(entry),
				Err(err) => tracing::warn!(error = %err, "skipping placeholder"),
			}
		}

		if !claimed.is_empty() {
			self.inner
				.store
				.update(|elements| {
					elements.extend(claimed.iter().map(|(element, _)| element.clone()))
				});
		}
		for (element, _) in &claimed {
			watch::attach_watchers(element, &config);
		}
		tracing::debug!(count = claimed.len(), "placeholders claimed");

		let mounts: Vec<_> = claimed
			.into_iter()
			.map(|(element, name)| mount_by_name(self.inner.registry.clone(), element, name))
			.collect();
		async move {
			let settled = future::join_all(mounts).await;
			let total = settled.len();
			let mounted: Vec<ManagedElement> = settled.into_iter().filter_map(Result::ok).collect();
			tracing::info!(
				mounted = mounted.len(),
				failed = total - mounted.len(),
				"hydration settled"
			);
			mounted
		}
		.boxed_local()
	}

	/// Mounts a single placeholder.
	///
	/// Unlike [`Graft::hydrate`], a missing component-name declaration or a
	/// resolution failure is returned to the caller.
	pub fn hydrate_element(
		&self,
		node: NodeRef,
		options: CreateOptions,
	) -> LocalBoxFuture<'static, Result<ManagedElement>> {
		let (element, name) = match self.claim_placeholder(node, &options) {
			Ok(entry) => entry,
			Err(err) => return future::ready(Err(err)).boxed_local(),
		};
		self.inner.store.update(|elements| elements.push(element.clone()));
		watch::attach_watchers(&element, &self.inner.config);
		mount_by_name(self.inner.registry.clone(), element, name).boxed_local()
	}

	/// Live elements in registration order.
	pub fn elements(&self) -> Vec<ManagedElement> {
		self.inner.store.snapshot()
	}

	/// The live element with `index`.
	pub fn element_by_index(&self, index: u64) -> Option<ManagedElement> {
		self.inner.store.get(index)
	}

	/// The live element bound to `node`.
	pub fn element_for_node(&self, node: &dyn HostNode) -> Option<ManagedElement> {
		self.inner.store.find_by_node(node)
	}

	/// Subscribes to store updates.
	pub fn subscribe(&self, listener: impl Fn(&[ManagedElement]) + 'static) -> StoreSubscription {
		self.inner.store.subscribe(listener)
	}

	/// The highest index claimed so far.
	pub fn last_index(&self) -> u64 {
		self.inner.indexer.last_index()
	}

	/// Emits a property block using this engine's attribute names.
	pub fn generate_props_block<T: Serialize + ?Sized>(
		&self,
		props: &T,
		encode: bool,
	) -> Result<String> {
		let config = &self.inner.config;
		Ok(codec::render_props_block(
			&config.props_class,
			&config.encoding_attribute,
			props,
			encode,
		)?)
	}

	/// Emits a property block in the configured default encoding.
	pub fn props_block<T: Serialize + ?Sized>(&self, props: &T) -> Result<String> {
		self.generate_props_block(props, self.inner.config.encode_props)
	}

	async fn resolve_target(
		&self,
		target: ComponentTarget,
	) -> Result<(ComponentRef, Option<String>)> {
		match target {
			ComponentTarget::Class(class) => {
				let name = self.inner.registry.find_name_by_class(&class);
				Ok((class, name))
			}
			ComponentTarget::Name(name) => match self.inner.registry.find_by_name(&name).await? {
				Some(class) => Ok((class, Some(name))),
				None => Err(GraftError::ComponentNotFound { name }),
			},
		}
	}

	fn claim_placeholder(
		&self,
		node: NodeRef,
		options: &CreateOptions,
	) -> Result<(ManagedElement, String)> {
		let description = placeholder::parse_placeholder(node.as_ref(), &self.inner.config)?;
		let element = self.prepare(
			node,
			None,
			Some(description.component_name.clone()),
			description.props,
			description.should_render,
			options,
		)?;
		Ok((element, description.component_name))
	}

	/// Claims an index on `host` and builds a pending element.
	fn prepare(
		&self,
		host: NodeRef,
		component: Option<ComponentRef>,
		component_name: Option<String>,
		props: Props,
		should_render: bool,
		options: &CreateOptions,
	) -> Result<ManagedElement> {
		if let Some(existing) = self.inner.store.find_by_node(host.as_ref()) {
			return Err(GraftError::IdentityCollision {
				index: existing.index(),
			});
		}
		let claim = self.inner.indexer.claim(host.as_ref())?;
		if self.inner.store.contains(claim.index) {
			return Err(GraftError::IdentityCollision { index: claim.index });
		}
		placeholder::apply_transparent_display(host.as_ref(), &self.inner.config);

		Ok(ManagedElement::new(ElementSeed {
			index: claim.index,
			host,
			options: options.resolve(self.inner.config.defaults),
			context: MountContext {
				index: claim.index,
				entries: options.context.clone(),
			},
			component,
			component_name,
			props,
			should_render,
			store: self.inner.store.downgrade(),
		}))
	}
}

impl fmt::Debug for Graft {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Graft")
			.field("registry", &self.inner.registry)
			.field("store", &self.inner.store)
			.field("last_index", &self.last_index())
			.finish()
	}
}

/// Resolves `name` and finishes the pending mount of `element`.
///
/// On failure the element is destroyed and the error is logged and returned.
async fn mount_by_name(
	registry: ComponentRegistry,
	element: ManagedElement,
	name: String,
) -> Result<ManagedElement> {
	let outcome = match registry.find_by_name(&name).await {
		Ok(Some(class)) => element.complete_mount(class),
		Ok(None) => Err(GraftError::ComponentNotFound { name: name.clone() }),
		Err(err) => Err(err),
	};
	match outcome {
		Ok(()) => Ok(element),
		Err(err) => {
			tracing::error!(
				index = element.index(),
				component = %name,
				error = %err,
				"placeholder failed to mount"
			);
			element.destroy();
			Err(err)
		}
	}
}
