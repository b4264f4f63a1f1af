//! Element indexer.
//!
//! Every placeholder that becomes a managed element carries a stable integer
//! identity in its index attribute. A fresh node gets `++last_index`; a node
//! that already carries one keeps it, and the allocator is moved past the
//! recovered value so later assignments can never collide with it.

use std::cell::Cell;

use crate::error::{GraftError, Result};
use crate::host::HostNode;

/// Outcome of [`ElementIndexer::claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexClaim {
	/// The node's index.
	pub index: u64,
	/// Whether the index was read back from the node rather than assigned.
	pub recovered: bool,
}

/// Monotonic index allocator bound to one attribute name.
#[derive(Debug)]
pub struct ElementIndexer {
	attribute: String,
	last_index: Cell<u64>,
}

impl ElementIndexer {
	/// Creates an allocator writing to `attribute`.
	pub fn new(attribute: impl Into<String>) -> Self {
		Self {
			attribute: attribute.into(),
			last_index: Cell::new(0),
		}
	}

	/// Reads the index a node already carries.
	///
	/// A value that is not an unsigned integer is a malformed declaration.
	pub fn read(&self, node: &dyn HostNode) -> Result<Option<u64>> {
		let Some(raw) = node.attribute(&self.attribute) else {
			return Ok(None);
		};
		raw.trim()
			.parse::<u64>()
			.map(Some)
			.map_err(|e| GraftError::MalformedDeclaration {
				what: "element index",
				message: format!("{raw:?}: {e}"),
			})
	}

	/// Recovers the node's index or assigns a new one and writes it back.
	///
	/// Fails without touching the node when a recovered index has used up the
	/// index space.
	pub fn claim(&self, node: &dyn HostNode) -> Result<IndexClaim> {
		if let Some(index) = self.read(node)? {
			if index > self.last_index.get() {
				self.last_index.set(index);
			}
			return Ok(IndexClaim {
				index,
				recovered: true,
			});
		}
		let Some(index) = self.last_index.get().checked_add(1) else {
			return Err(GraftError::MalformedDeclaration {
				what: "element index",
				message: format!("no index left above recovered {}", self.last_index.get()),
			});
		};
		self.last_index.set(index);
		node.set_attribute(&self.attribute, &index.to_string());
		Ok(IndexClaim {
			index,
			recovered: false,
		})
	}

	/// The most recently assigned or recovered index.
	pub fn last_index(&self) -> u64 {
		self.last_index.get()
	}
}
