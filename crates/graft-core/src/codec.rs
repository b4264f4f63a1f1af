//! Props codec.
//!
//! Property blocks carry a JSON document, either as plain text or
//! percent-encoded so it survives arbitrary markup contexts.
//!
//! ## Wire format
//!
//! ```text
//! <template class="props" data-props-encoding="uri">%7B%22name%22%3A%22world%22%7D</template>
//! <template class="props" data-props-encoding="json">{"name":"world"}</template>
//! <template class="props">{"name":"world"}</template>   <!-- sniffed -->
//! ```
//!
//! A block declares its encoding through the companion attribute. Blocks
//! without one are sniffed: text whose first non-whitespace character is `%`
//! is percent-encoded. Plain JSON never starts with `%`, so a literal `%7B`
//! inside a JSON string is read as plain JSON.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{ENCODING_ATTRIBUTE, PROPS_CLASS};
use crate::error::CodecError;

/// How a property block is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropsEncoding {
	/// Plain JSON text.
	Plain,
	/// Percent-encoded JSON text.
	Uri,
}

impl PropsEncoding {
	/// Value written to the companion encoding attribute.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Plain => "json",
			Self::Uri => "uri",
		}
	}

	/// Parses the companion encoding attribute.
	pub fn from_attribute(value: &str) -> Option<Self> {
		match value.trim().to_ascii_lowercase().as_str() {
			"json" | "plain" => Some(Self::Plain),
			"uri" | "percent" => Some(Self::Uri),
			_ => None,
		}
	}

	/// Encoding chosen by the `encode` flag of [`serialize_props`].
	pub fn from_flag(encode: bool) -> Self {
		if encode { Self::Uri } else { Self::Plain }
	}
}

/// Serializes a value to JSON text.
pub fn stringify<T: Serialize + ?Sized>(value: &T) -> Result<String, CodecError> {
	Ok(serde_json::to_string(value)?)
}

/// Parses JSON text.
pub fn parse<T: DeserializeOwned>(text: &str) -> Result<T, CodecError> {
	Ok(serde_json::from_str(text)?)
}

/// Serializes a value to percent-encoded JSON text.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, CodecError> {
	let json = stringify(value)?;
	Ok(urlencoding::encode(&json).into_owned())
}

/// Parses percent-encoded JSON text.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, CodecError> {
	let json = urlencoding::decode(text.trim())?;
	parse(&json)
}

/// Serializes props in encoded (`encode = true`) or plain form.
pub fn serialize_props<T: Serialize + ?Sized>(
	props: &T,
	encode: bool,
) -> Result<String, CodecError> {
	match PropsEncoding::from_flag(encode) {
		PropsEncoding::Uri => self::encode(props),
		PropsEncoding::Plain => stringify(props),
	}
}

/// Guesses the encoding of a block that does not declare one.
pub fn detect_encoding(text: &str) -> PropsEncoding {
	if text.trim_start().starts_with('%') {
		PropsEncoding::Uri
	} else {
		PropsEncoding::Plain
	}
}

/// Parses the text of a property block.
///
/// Blank text yields an empty object. `declared` is the encoding named by the
/// block's companion attribute, if any.
pub fn parse_props(text: &str, declared: Option<PropsEncoding>) -> Result<Value, CodecError> {
	if text.trim().is_empty() {
		return Ok(Value::Object(serde_json::Map::new()));
	}
	match declared.unwrap_or_else(|| detect_encoding(text)) {
		PropsEncoding::Uri => decode(text),
		PropsEncoding::Plain => parse(text.trim()),
	}
}

/// Emits the markup of a property block with the default class and
/// companion attribute names.
pub fn generate_props_block<T: Serialize + ?Sized>(
	props: &T,
	encode: bool,
) -> Result<String, CodecError> {
	render_props_block(PROPS_CLASS, ENCODING_ATTRIBUTE, props, encode)
}

pub(crate) fn render_props_block<T: Serialize + ?Sized>(
	class: &str,
	encoding_attribute: &str,
	props: &T,
	encode: bool,
) -> Result<String, CodecError> {
	let encoding = PropsEncoding::from_flag(encode);
	let body = serialize_props(props, encode)?;
	Ok(format!(
		r#"<template class="{}" {}="{}">{}</template>"#,
		html_escape_attr(class),
		encoding_attribute,
		encoding.as_str(),
		html_escape_text(&body)
	))
}

/// Escapes a string for use in an HTML attribute value.
fn html_escape_attr(s: &str) -> String {
	s.replace('&', "&amp;")
		.replace('"', "&quot;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}

/// Escapes a string for use as element text.
fn html_escape_text(s: &str) -> String {
	s.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}
