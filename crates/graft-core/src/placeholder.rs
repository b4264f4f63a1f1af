//! Placeholder parser.
//!
//! Reads what a placeholder declares:
//!
//! ```html
//! <div data-component-name="hello" data-to-render="true">
//!   <template class="props" data-props-encoding="uri">%7B%7D</template>
//! </div>
//! ```
//!
//! The component name is required. A missing or malformed property block
//! yields empty props, and a missing or malformed render flag yields `true`;
//! malformed declarations are logged rather than returned.

use serde_json::Value;

use crate::codec::{self, PropsEncoding};
use crate::component::Props;
use crate::config::EngineConfig;
use crate::error::{GraftError, Result};
use crate::host::{HostNode, NodeRef};

/// What a placeholder declares.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderDescription {
	/// Declared component name.
	pub component_name: String,
	/// Declared props, or an empty object.
	pub props: Props,
	/// Declared render flag, or `true`.
	pub should_render: bool,
}

/// Parses a placeholder node.
pub fn parse_placeholder(
	node: &dyn HostNode,
	config: &EngineConfig,
) -> Result<PlaceholderDescription> {
	let component_name = node.attribute(&config.component_attribute).ok_or_else(|| {
		GraftError::MissingPlaceholderAttribute {
			attribute: config.component_attribute.clone(),
		}
	})?;

	let props = read_props(node, config).unwrap_or_else(|err| {
		tracing::warn!(
			component = %component_name,
			error = %err,
			"ignoring malformed property block"
		);
		empty_props()
	});
	let should_render = read_render_flag(node, config).unwrap_or_else(|err| {
		tracing::warn!(component = %component_name, error = %err, "ignoring malformed render flag");
		true
	});

	Ok(PlaceholderDescription {
		component_name,
		props,
		should_render,
	})
}

/// The first child marked with the props class.
pub fn props_block(node: &dyn HostNode, config: &EngineConfig) -> Option<NodeRef> {
	node.children()
		.into_iter()
		.find(|child| child.has_class(&config.props_class))
}

/// Raw text of the property block, if the placeholder has one.
pub fn props_text(node: &dyn HostNode, config: &EngineConfig) -> Option<String> {
	props_block(node, config).map(|block| block.text_content())
}

/// Parses the property block. A placeholder without one has empty props.
pub fn read_props(node: &dyn HostNode, config: &EngineConfig) -> Result<Props> {
	let Some(block) = props_block(node, config) else {
		return Ok(empty_props());
	};
	let declared = block
		.attribute(&config.encoding_attribute)
		.and_then(|raw| PropsEncoding::from_attribute(&raw));
	Ok(codec::parse_props(&block.text_content(), declared)?)
}

/// Parses the render flag. An absent flag means `true`.
pub fn read_render_flag(node: &dyn HostNode, config: &EngineConfig) -> Result<bool> {
	let Some(raw) = node.attribute(&config.render_attribute) else {
		return Ok(true);
	};
	serde_json::from_str::<bool>(raw.trim()).map_err(|e| GraftError::MalformedDeclaration {
		what: "render flag",
		message: format!("{raw:?}: {e}"),
	})
}

/// Makes the placeholder box-less so only the mounted subtree takes part in
/// layout. Nodes without a component-name declaration are left alone.
pub fn apply_transparent_display(node: &dyn HostNode, config: &EngineConfig) {
	if node.attribute(&config.component_attribute).is_none() {
		return;
	}
	let style = node.attribute("style").unwrap_or_default();
	let has_display = style
		.split(';')
		.filter_map(|decl| decl.split_once(':'))
		.any(|(property, value)| property.trim() == "display" && value.trim() == "contents");
	if has_display {
		return;
	}
	let merged = match style.trim().trim_end_matches(';') {
		"" => "display: contents".to_string(),
		existing => format!("{existing}; display: contents"),
	};
	node.set_attribute("style", &merged);
}

fn empty_props() -> Props {
	Value::Object(serde_json::Map::new())
}
