//! Mutation delivery for the in-memory tree.
//!
//! Records are queued per observer as mutations happen and delivered in
//! batches by [`MutationQueue::flush`], which plays the role of the browser's
//! microtask checkpoint.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::host::{MutationCallback, MutationInit, MutationRecord};

/// Upper bound on delivery rounds per flush. Each round may queue further
/// records from inside callbacks.
const MAX_FLUSH_ROUNDS: usize = 64;

pub(super) struct ObserverState {
	pub(super) id: u64,
	callback: MutationCallback,
	records: RefCell<Vec<MutationRecord>>,
	pub(super) active: Cell<bool>,
}

pub(super) struct Registration {
	pub(super) observer: Rc<ObserverState>,
	pub(super) init: MutationInit,
}

#[derive(Default)]
pub(super) struct MutationQueue {
	pending: RefCell<Vec<Rc<ObserverState>>>,
	next_id: Cell<u64>,
}

impl MutationQueue {
	pub(super) fn new_observer(&self, callback: MutationCallback) -> Rc<ObserverState> {
		let id = self.next_id.get() + 1;
		self.next_id.set(id);
		Rc::new(ObserverState {
			id,
			callback,
			records: RefCell::new(Vec::new()),
			active: Cell::new(true),
		})
	}

	pub(super) fn enqueue(&self, observer: &Rc<ObserverState>, record: MutationRecord) {
		observer.records.borrow_mut().push(record);
		let mut pending = self.pending.borrow_mut();
		if !pending.iter().any(|queued| Rc::ptr_eq(queued, observer)) {
			pending.push(Rc::clone(observer));
		}
	}

	pub(super) fn pending_records(&self) -> usize {
		self.pending
			.borrow()
			.iter()
			.map(|observer| observer.records.borrow().len())
			.sum()
	}

	pub(super) fn flush(&self) -> usize {
		let mut delivered = 0;
		for _ in 0..MAX_FLUSH_ROUNDS {
			let batch: Vec<_> = self.pending.borrow_mut().drain(..).collect();
			if batch.is_empty() {
				return delivered;
			}
			for observer in batch {
				let records: Vec<_> = observer.records.borrow_mut().drain(..).collect();
				// Disconnected while records were in flight.
				if !observer.active.get() || records.is_empty() {
					continue;
				}
				delivered += records.len();
				let callback = Rc::clone(&observer.callback);
				callback(&records);
			}
		}
		tracing::warn!(
			rounds = MAX_FLUSH_ROUNDS,
			"mutation delivery did not settle; remaining records stay queued"
		);
		delivered
	}
}
