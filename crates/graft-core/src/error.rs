//! Error types for the graft engine.
//!
//! Failures fall into four groups:
//!
//! | Variant | Raised by | Surfaced to caller |
//! |---------|-----------|--------------------|
//! | `ComponentNotFound`, `ResolverFailed` | registry lookup | `create`, `hydrate_element` |
//! | `IdentityCollision` | element indexer | `create`, `hydrate_element` |
//! | `MissingPlaceholderAttribute` | placeholder parser | single-element paths only |
//! | `MalformedDeclaration` | placeholder parser, codec | never (logged, update skipped) |
//!
//! `hydrate` never fails as a whole: per-placeholder failures are logged and
//! the affected placeholder is left unmounted.

use thiserror::Error;

/// Result type used throughout the engine.
pub type Result<T> = std::result::Result<T, GraftError>;

/// Errors produced by the lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraftError {
	/// No registered component matches the requested name.
	#[error("component not registered: {name}")]
	ComponentNotFound {
		/// The name that was looked up.
		name: String,
	},
	/// A lazy resolver rejected.
	#[error("resolver for component `{name}` failed: {message}")]
	ResolverFailed {
		/// The registered name whose resolver failed.
		name: String,
		/// The resolver's rejection message.
		message: String,
	},
	/// The placeholder is already bound to a live element.
	#[error("placeholder is already claimed by live element {index}")]
	IdentityCollision {
		/// Index of the element that owns the placeholder.
		index: u64,
	},
	/// A required placeholder attribute is absent.
	#[error("placeholder is missing required attribute `{attribute}`")]
	MissingPlaceholderAttribute {
		/// The attribute that was expected.
		attribute: String,
	},
	/// A declaration on the placeholder could not be parsed.
	#[error("malformed {what}: {message}")]
	MalformedDeclaration {
		/// Which declaration was malformed (property block, render flag, index).
		what: &'static str,
		/// Parser diagnostic.
		message: String,
	},
	/// The embedded framework refused to construct an instance.
	#[error("component failed to mount: {0}")]
	MountFailed(String),
	/// Engine configuration could not be loaded.
	#[error("invalid configuration: {0}")]
	Config(String),
}

impl GraftError {
	/// Returns true for failures that originate in component resolution.
	pub fn is_resolution_failure(&self) -> bool {
		matches!(
			self,
			Self::ComponentNotFound { .. } | Self::ResolverFailed { .. }
		)
	}
}

/// Errors produced by the props codec.
#[derive(Debug, Error)]
pub enum CodecError {
	/// The text is not valid JSON, or the value could not be serialized.
	#[error("invalid JSON: {0}")]
	Json(#[from] serde_json::Error),
	/// Percent-decoding produced invalid UTF-8.
	#[error("invalid percent-encoding: {0}")]
	Percent(#[from] std::string::FromUtf8Error),
}

impl From<CodecError> for GraftError {
	fn from(err: CodecError) -> Self {
		Self::MalformedDeclaration {
			what: "property block",
			message: err.to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_error_display() {
		let err = GraftError::ComponentNotFound {
			name: "hello".to_string(),
		};
		assert_eq!(err.to_string(), "component not registered: hello");

		let err = GraftError::IdentityCollision { index: 3 };
		assert!(err.to_string().contains("live element 3"));
	}

	#[rstest]
	#[case(GraftError::ComponentNotFound { name: "x".into() }, true)]
	#[case(GraftError::ResolverFailed { name: "x".into(), message: "boom".into() }, true)]
	#[case(GraftError::IdentityCollision { index: 1 }, false)]
	#[case(GraftError::MountFailed("nope".into()), false)]
	fn test_is_resolution_failure(#[case] err: GraftError, #[case] expected: bool) {
		assert_eq!(err.is_resolution_failure(), expected);
	}

	#[rstest]
	fn test_codec_error_becomes_malformed_declaration() {
		let codec_err = serde_json::from_str::<serde_json::Value>("{name: hello}")
			.map_err(CodecError::from)
			.unwrap_err();
		let err: GraftError = codec_err.into();
		assert!(matches!(
			err,
			GraftError::MalformedDeclaration {
				what: "property block",
				..
			}
		));
	}
}
