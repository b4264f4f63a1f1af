//! # Graft
//!
//! Grow a component tree incrementally inside pages owned by another
//! rendering system.
//!
//! The host application emits placeholder markup. Graft discovers the
//! placeholders, resolves the declared components by name, mounts them, and
//! keeps each instance in sync with its placeholder until the placeholder
//! leaves the tree.
//!
//! ## Core Principles
//!
//! - **No shared globals**: every [`Graft`] engine owns its registry, store and
//!   index allocator
//! - **Host agnostic**: the host tree is reached only through [`HostNode`]
//! - **Idempotent**: hydrating the same subtree twice mounts nothing new, and
//!   destroying twice is a no-op
//!
//! ## Quick Example
//!
//! ```rust
//! use graft::prelude::*;
//! use graft::dom::Document;
//! use graft::testing::RecordingComponent;
//!
//! let doc = Document::new();
//! let host = doc.create_element("div");
//! doc.body().append_child(&host);
//!
//! let engine = Graft::new();
//! let hello = RecordingComponent::new();
//! engine.register_component("hello", ComponentSource::eager(hello.clone()));
//!
//! let element = futures::executor::block_on(engine.create(
//! 	host.to_ref(),
//! 	"hello",
//! 	serde_json::json!({"name": "world"}),
//! 	true,
//! 	CreateOptions::new(),
//! ))
//! .unwrap();
//!
//! assert_eq!(element.props()["name"], "world");
//! element.destroy();
//! assert_eq!(hello.live_count(), 0);
//! ```

pub use graft_core::{
	codec, component, config, dom, element, engine, error, host, index, placeholder, registry,
	store, testing,
};

pub use graft_core::{
	CodecError, ComponentClass, ComponentInstance, ComponentRef, ComponentRegistry, ComponentSource,
	ComponentTarget, CreateOptions, ElementOptions, ElementStore, EngineConfig, EventHandler, Graft,
	GraftError, HostNode, ManagedElement, MountContext, MutationInit, MutationKind, MutationRecord,
	NodeRef, ObserverHandle, Props, PropsEncoding, ResolverFuture, Result, StoreSubscription,
	decode, encode, generate_props_block, parse, serialize_props, stringify,
};

/// Commonly used types.
pub mod prelude {
	pub use crate::{
		ComponentClass, ComponentInstance, ComponentRef, ComponentSource, CreateOptions, Graft,
		GraftError, HostNode, ManagedElement, MountContext, NodeRef, Props, Result,
	};
}
