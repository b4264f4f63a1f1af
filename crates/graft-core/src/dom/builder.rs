//! Builder API for in-memory trees.

use super::Node;

/// Builds an element and its children.
///
/// # Example
///
/// ```
/// use graft_core::dom::Document;
///
/// let doc = Document::new();
/// let placeholder = doc
/// 	.element("div")
/// 	.attr("data-component-name", "hello")
/// 	.child(doc.element("template").class("props").text(r#"{"name":"world"}"#))
/// 	.build();
///
/// assert_eq!(placeholder.attribute("data-component-name").as_deref(), Some("hello"));
/// assert_eq!(placeholder.text_content(), r#"{"name":"world"}"#);
/// ```
#[derive(Debug)]
pub struct ElementBuilder {
	node: Node,
}

impl ElementBuilder {
	pub(super) fn new(node: Node) -> Self {
		Self { node }
	}

	/// Sets an attribute.
	pub fn attr(self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
		self.node.set_attribute(name.as_ref(), value.as_ref());
		self
	}

	/// Sets the `class` attribute.
	pub fn class(self, class: impl AsRef<str>) -> Self {
		self.attr("class", class)
	}

	/// Appends a child element or node.
	pub fn child(self, child: impl Into<Node>) -> Self {
		self.node.append_child(&child.into());
		self
	}

	/// Appends a text node.
	pub fn text(self, text: impl Into<String>) -> Self {
		let text = self.node.new_text(text.into());
		self.node.append_child(&text);
		self
	}

	/// Finishes the element.
	pub fn build(self) -> Node {
		self.node
	}
}

impl From<ElementBuilder> for Node {
	fn from(builder: ElementBuilder) -> Self {
		builder.build()
	}
}
