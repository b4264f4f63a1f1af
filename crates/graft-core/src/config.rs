//! Engine configuration.
//!
//! Attribute names of the markup contract and default element options.
//! Every field has a default, so partial TOML documents are accepted:
//!
//! ```toml
//! index_attribute = "data-graft-index"
//! encode_props = false
//!
//! [defaults]
//! observeParents = false
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GraftError, Result};

/// Attribute declaring the component name of a placeholder.
pub const COMPONENT_ATTRIBUTE: &str = "data-component-name";

/// Attribute carrying the render flag.
pub const RENDER_ATTRIBUTE: &str = "data-to-render";

/// Attribute carrying the stable element index.
pub const INDEX_ATTRIBUTE: &str = "svelte-element-index";

/// Class marking the property block child.
pub const PROPS_CLASS: &str = "props";

/// Companion attribute naming the property block encoding.
pub const ENCODING_ATTRIBUTE: &str = "data-props-encoding";

/// Watcher switches of a managed element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementOptions {
	/// Destroy the element when its placeholder leaves the tree.
	#[serde(alias = "observeParents", alias = "watchHostRemoval")]
	pub observe_parents: bool,
	/// Re-read props and render flag when the placeholder changes.
	#[serde(alias = "watchContentChanges")]
	pub observe: bool,
}

impl Default for ElementOptions {
	fn default() -> Self {
		Self {
			observe_parents: true,
			observe: true,
		}
	}
}

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	/// See [`COMPONENT_ATTRIBUTE`].
	pub component_attribute: String,
	/// See [`RENDER_ATTRIBUTE`].
	pub render_attribute: String,
	/// See [`INDEX_ATTRIBUTE`].
	pub index_attribute: String,
	/// See [`PROPS_CLASS`].
	pub props_class: String,
	/// See [`ENCODING_ATTRIBUTE`].
	pub encoding_attribute: String,
	/// Whether emitted property blocks are percent-encoded by default.
	pub encode_props: bool,
	/// Options applied when a call does not override them.
	pub defaults: ElementOptions,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			component_attribute: COMPONENT_ATTRIBUTE.to_string(),
			render_attribute: RENDER_ATTRIBUTE.to_string(),
			index_attribute: INDEX_ATTRIBUTE.to_string(),
			props_class: PROPS_CLASS.to_string(),
			encoding_attribute: ENCODING_ATTRIBUTE.to_string(),
			encode_props: true,
			defaults: ElementOptions::default(),
		}
	}
}

impl EngineConfig {
	/// Loads configuration from TOML text.
	pub fn from_toml_str(text: &str) -> Result<Self> {
		toml::from_str(text).map_err(|e| GraftError::Config(e.to_string()))
	}
}

/// Per-call options of `create` and `hydrate`.
///
/// Unset switches fall back to [`EngineConfig::defaults`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateOptions {
	/// Overrides [`ElementOptions::observe_parents`].
	pub observe_parents: Option<bool>,
	/// Overrides [`ElementOptions::observe`].
	pub observe: Option<bool>,
	/// Context entries handed to every constructed instance.
	pub context: BTreeMap<String, Value>,
}

impl CreateOptions {
	/// Options that inherit every default.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the host-removal watcher switch.
	pub fn observe_parents(mut self, enabled: bool) -> Self {
		self.observe_parents = Some(enabled);
		self
	}

	/// Sets the content watcher switch.
	pub fn observe(mut self, enabled: bool) -> Self {
		self.observe = Some(enabled);
		self
	}

	/// Adds a context entry.
	pub fn context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.context.insert(key.into(), value.into());
		self
	}

	/// Merges these options over `defaults`.
	pub fn resolve(&self, defaults: ElementOptions) -> ElementOptions {
		ElementOptions {
			observe_parents: self.observe_parents.unwrap_or(defaults.observe_parents),
			observe: self.observe.unwrap_or(defaults.observe),
		}
	}
}
