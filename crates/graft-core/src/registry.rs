//! Component registry.
//!
//! Maps names to component classes. A name is registered either with a class
//! ([`ComponentSource::Eager`]) or with an asynchronous resolver
//! ([`ComponentSource::Lazy`]) that is invoked on first lookup.
//!
//! - Names compare case-insensitively.
//! - Registering a name twice appends a second link; lookups return the
//!   first match in insertion order.
//! - Concurrent lookups of an unresolved name share one in-flight resolution.
//!   Once it succeeds the class is cached and the resolver is dropped. A
//!   rejection clears the in-flight state so the next lookup retries.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};

use crate::component::{ComponentRef, same_class};
use crate::error::{GraftError, Result};

/// Future returned by a lazy resolver. Rejections carry a message.
pub type ResolverFuture = LocalBoxFuture<'static, std::result::Result<ComponentRef, String>>;

type Resolver = Rc<dyn Fn() -> ResolverFuture>;

type InFlight = Shared<LocalBoxFuture<'static, Result<ComponentRef>>>;

/// How a component is provided at registration time.
pub enum ComponentSource {
	/// The class itself.
	Eager(ComponentRef),
	/// A resolver producing the class on first lookup.
	Lazy(Resolver),
}

impl ComponentSource {
	/// Registers a class directly.
	pub fn eager(class: ComponentRef) -> Self {
		Self::Eager(class)
	}

	/// Registers a resolver.
	pub fn lazy<F, Fut>(resolver: F) -> Self
	where
		F: Fn() -> Fut + 'static,
		Fut: Future<Output = std::result::Result<ComponentRef, String>> + 'static,
	{
		Self::Lazy(Rc::new(move || resolver().boxed_local()))
	}
}

impl fmt::Debug for ComponentSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Eager(class) => f.debug_tuple("Eager").field(class).finish(),
			Self::Lazy(_) => f.debug_tuple("Lazy").finish(),
		}
	}
}

enum LinkState {
	Resolved(ComponentRef),
	Unresolved {
		resolver: Resolver,
		in_flight: Option<InFlight>,
	},
}

struct ComponentLink {
	name: String,
	key: String,
	state: RefCell<LinkState>,
}

impl ComponentLink {
	fn resolved_class(&self) -> Option<ComponentRef> {
		match &*self.state.borrow() {
			LinkState::Resolved(class) => Some(Rc::clone(class)),
			LinkState::Unresolved { .. } => None,
		}
	}
}

/// Registry of named components. Clones share the same registry.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
	links: Rc<RefCell<Vec<Rc<ComponentLink>>>>,
}

impl ComponentRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a link for `name`.
	pub fn register(&self, name: impl Into<String>, source: ComponentSource) {
		let name = name.into();
		let state = match source {
			ComponentSource::Eager(class) => LinkState::Resolved(class),
			ComponentSource::Lazy(resolver) => LinkState::Unresolved {
				resolver,
				in_flight: None,
			},
		};
		tracing::debug!(component = %name, "registered component");
		self.links.borrow_mut().push(Rc::new(ComponentLink {
			key: name.to_lowercase(),
			name,
			state: RefCell::new(state),
		}));
	}

	fn lookup(&self, name: &str) -> Option<Rc<ComponentLink>> {
		let key = name.to_lowercase();
		self.links
			.borrow()
			.iter()
			.find(|link| link.key == key)
			.cloned()
	}

	/// Resolves `name` to a class.
	///
	/// Yields `Ok(None)` when nothing is registered under `name` and an error
	/// when the resolver rejects.
	pub fn find_by_name(
		&self,
		name: &str,
	) -> impl Future<Output = Result<Option<ComponentRef>>> + 'static {
		let link = self.lookup(name);
		async move {
			match link {
				Some(link) => resolve(link).await.map(Some),
				None => Ok(None),
			}
		}
	}

	/// Returns the class for `name` if it is already resolved.
	pub fn find_resolved(&self, name: &str) -> Option<ComponentRef> {
		self.lookup(name)?.resolved_class()
	}

	/// Reverse lookup of the first name registered for `class`.
	///
	/// Links registered with a resolver only become visible once resolved.
	pub fn find_name_by_class(&self, class: &ComponentRef) -> Option<String> {
		self.links
			.borrow()
			.iter()
			.find(|link| {
				link.resolved_class()
					.is_some_and(|resolved| same_class(&resolved, class))
			})
			.map(|link| link.name.clone())
	}

	/// Registered names in insertion order, duplicates included.
	pub fn registered_names(&self) -> Vec<String> {
		self.links
			.borrow()
			.iter()
			.map(|link| link.name.clone())
			.collect()
	}

	/// Number of links.
	pub fn len(&self) -> usize {
		self.links.borrow().len()
	}

	/// Whether no component is registered.
	pub fn is_empty(&self) -> bool {
		self.links.borrow().is_empty()
	}
}

impl fmt::Debug for ComponentRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentRegistry")
			.field("names", &self.registered_names())
			.finish()
	}
}

async fn resolve(link: Rc<ComponentLink>) -> Result<ComponentRef> {
	let in_flight = {
		let mut state = link.state.borrow_mut();
		match &mut *state {
			LinkState::Resolved(class) => return Ok(Rc::clone(class)),
			LinkState::Unresolved {
				in_flight: Some(shared),
				..
			} => shared.clone(),
			LinkState::Unresolved {
				resolver,
				in_flight,
			} => {
				tracing::debug!(component = %link.name, "invoking component resolver");
				let pending = (resolver.as_ref())();
				let name = link.name.clone();
				let shared = async move {
					pending
						.await
						.map_err(|message| GraftError::ResolverFailed { name, message })
				}
				.boxed_local()
				.shared();
				*in_flight = Some(shared.clone());
				shared
			}
		}
	};

	let outcome = in_flight.await;

	let mut state = link.state.borrow_mut();
	match &outcome {
		Ok(class) => {
			if matches!(*state, LinkState::Unresolved { .. }) {
				*state = LinkState::Resolved(Rc::clone(class));
			}
		}
		Err(err) => {
			tracing::warn!(component = %link.name, error = %err, "component resolver rejected");
			if let LinkState::Unresolved { in_flight, .. } = &mut *state {
				*in_flight = None;
			}
		}
	}
	outcome
}
