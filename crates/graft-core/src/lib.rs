//! Graft Core - component lifecycle engine for foreign host trees
//!
//! Lets an application rendered by one UI system mount, update, observe and
//! tear down components of another framework inside its own tree. The two
//! sides never learn about each other: the host only emits placeholder markup
//! and the embedded framework only implements [`ComponentClass`].
//!
//! ## Architecture
//!
//! - [`registry`]: names to component classes, with lazy single-flight resolution
//! - [`codec`]: property block wire format
//! - [`placeholder`]: reads what a placeholder declares
//! - [`index`]: stable per-placeholder identity
//! - [`engine`]: `create` / `hydrate` orchestration
//! - [`element`]: the managed element record
//! - [`watch`]: host removal and content watchers
//! - [`store`]: live elements, with subscriptions
//! - [`host`]: capability interface of the host tree
//! - [`dom`]: in-memory host tree
//! - [`testing`]: recording component doubles
//!
//! ## Markup contract
//!
//! ```html
//! <div data-component-name="hello" data-to-render="true" svelte-element-index="1">
//!   <template class="props" data-props-encoding="uri">%7B%22name%22%3A%22world%22%7D</template>
//! </div>
//! ```
//!
//! ## Example
//!
//! ```
//! use futures::executor::block_on;
//! use graft_core::dom::Document;
//! use graft_core::testing::RecordingComponent;
//! use graft_core::{ComponentSource, CreateOptions, Graft};
//!
//! let doc = Document::new();
//! let placeholder = doc
//! 	.element("div")
//! 	.attr("data-component-name", "hello")
//! 	.child(doc.element("template").class("props").text(r#"{"name":"world"}"#))
//! 	.build();
//! doc.body().append_child(&placeholder);
//!
//! let engine = Graft::new();
//! let hello = RecordingComponent::new();
//! engine.register_component("hello", ComponentSource::eager(hello.clone()));
//!
//! let elements = block_on(engine.hydrate(doc.body().to_ref(), CreateOptions::new()));
//! assert_eq!(elements.len(), 1);
//! assert_eq!(elements[0].props()["name"], "world");
//! assert_eq!(hello.construct_count(), 1);
//! ```

#![warn(missing_docs)]

pub mod codec;
pub mod component;
pub mod config;
pub mod dom;
pub mod element;
pub mod engine;
pub mod error;
pub mod host;
pub mod index;
pub mod placeholder;
pub mod registry;
pub mod store;
pub mod testing;
mod watch;

pub use codec::{
	PropsEncoding, decode, encode, generate_props_block, parse, serialize_props, stringify,
};
pub use component::{
	ComponentClass, ComponentInstance, ComponentRef, EventHandler, MountContext, Props,
};
pub use config::{CreateOptions, ElementOptions, EngineConfig};
pub use element::ManagedElement;
pub use engine::{ComponentTarget, Graft};
pub use error::{CodecError, GraftError, Result};
pub use host::{HostNode, MutationInit, MutationKind, MutationRecord, NodeRef, ObserverHandle};
pub use registry::{ComponentRegistry, ComponentSource, ResolverFuture};
pub use store::{ElementStore, StoreSubscription};
