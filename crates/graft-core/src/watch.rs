//! Change watchers.
//!
//! Two watchers may be attached to a managed element, each gated by its
//! [`ElementOptions`](crate::config::ElementOptions):
//!
//! | Watcher | Observes | Reaction |
//! |---------|----------|----------|
//! | host removal (`observe_parents`) | child list of every current ancestor | `destroy` once the placeholder is no longer connected, re-targeted after a move |
//! | content (`observe`) | render attribute of the placeholder, text and structure below it | `set_to_render` / `update_props` |
//!
//! Watchers hold the element weakly and are owned by it, so destroying the
//! element disconnects them.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::EngineConfig;
use crate::element::{ManagedElement, WeakManagedElement};
use crate::host::{
	self, HostNode, MutationCallback, MutationInit, MutationKind, MutationRecord, NodeRef,
	ObserverHandle,
};
use crate::placeholder;

/// Attaches the watchers enabled by the element's options.
pub(crate) fn attach_watchers(element: &ManagedElement, config: &Rc<EngineConfig>) {
	let options = element.options();
	if options.observe_parents {
		watch_host_removal(element);
	}
	if options.observe {
		watch_content(element, config);
	}
}

/// Ancestor subscriptions of the host-removal watcher.
///
/// The chain is rebuilt whenever the placeholder turns up connected under a
/// different set of ancestors, so a moved placeholder is still watched at its
/// new position.
struct RemovalWatch {
	element: WeakManagedElement,
	chain: RefCell<Vec<(NodeRef, ObserverHandle)>>,
}

impl RemovalWatch {
	fn follow(watch: &Rc<Self>, host: &dyn HostNode) {
		let ancestors = host::ancestors(host);
		let unchanged = {
			let chain = watch.chain.borrow();
			chain.len() == ancestors.len()
				&& chain
					.iter()
					.zip(&ancestors)
					.all(|((watched, _), ancestor)| watched.same_node(ancestor.as_ref()))
		};
		if unchanged {
			return;
		}
		watch.release();

		let weak = Rc::downgrade(watch);
		let callback: MutationCallback = Rc::new(move |_records: &[MutationRecord]| {
			if let Some(watch) = weak.upgrade() {
				on_ancestor_change(&watch);
			}
		});
		let chain = ancestors
			.into_iter()
			.map(|ancestor| {
				let handle = ancestor.observe(MutationInit::child_list(), Rc::clone(&callback));
				(ancestor, handle)
			})
			.collect();
		*watch.chain.borrow_mut() = chain;
	}

	fn release(&self) {
		let chain = std::mem::take(&mut *self.chain.borrow_mut());
		for (_, handle) in &chain {
			handle.disconnect();
		}
	}
}

fn watch_host_removal(element: &ManagedElement) {
	let host = element.host();
	if host.parent().is_none() {
		tracing::debug!(index = element.index(), "placeholder has no parent to watch");
		return;
	}
	let watch = Rc::new(RemovalWatch {
		element: element.downgrade(),
		chain: RefCell::new(Vec::new()),
	});
	RemovalWatch::follow(&watch, host.as_ref());
	element.add_watcher(ObserverHandle::new(move || watch.release()));
}

fn on_ancestor_change(watch: &Rc<RemovalWatch>) {
	let Some(element) = watch.element.upgrade() else {
		return;
	};
	if element.is_destroyed() {
		return;
	}
	let host = element.host();
	if host.is_connected() {
		RemovalWatch::follow(watch, host.as_ref());
		return;
	}
	tracing::debug!(index = element.index(), "placeholder removed from tree");
	element.destroy();
}

fn watch_content(element: &ManagedElement, config: &Rc<EngineConfig>) {
	let host = element.host();
	let init = MutationInit::attributes([config.render_attribute.clone()])
		.with_child_list()
		.with_character_data()
		.with_subtree();
	let last_text = RefCell::new(placeholder::props_text(host.as_ref(), config));
	let weak = element.downgrade();
	let config = Rc::clone(config);
	let callback: MutationCallback = Rc::new(move |records: &[MutationRecord]| {
		on_content_change(&weak, &config, &last_text, records);
	});
	element.add_watcher(host.observe(init, callback));
}

fn on_content_change(
	weak: &WeakManagedElement,
	config: &EngineConfig,
	last_text: &RefCell<Option<String>>,
	records: &[MutationRecord],
) {
	let Some(element) = weak.upgrade() else {
		return;
	};
	if element.is_destroyed() {
		return;
	}
	let host = element.host();

	let render_changed = records.iter().any(|record| {
		let is_render_attribute = matches!(
			&record.kind,
			MutationKind::Attributes { name } if *name == config.render_attribute
		);
		is_render_attribute && record.target.same_node(host.as_ref())
	});
	let content_changed = records
		.iter()
		.any(|record| !matches!(record.kind, MutationKind::Attributes { .. }));

	if render_changed {
		match placeholder::read_render_flag(host.as_ref(), config) {
			Ok(value) => {
				if let Err(err) = element.set_to_render(value) {
					tracing::error!(
						index = element.index(),
						error = %err,
						"failed to apply render flag"
					);
				}
			}
			Err(err) => {
				tracing::warn!(
					index = element.index(),
					error = %err,
					"ignoring malformed render flag"
				);
			}
		}
	}

	if content_changed {
		let text = placeholder::props_text(host.as_ref(), config);
		if *last_text.borrow() == text {
			return;
		}
		*last_text.borrow_mut() = text;
		match placeholder::read_props(host.as_ref(), config) {
			Ok(props) => element.update_props(props),
			Err(err) => {
				tracing::warn!(
					index = element.index(),
					error = %err,
					"ignoring malformed property block"
				);
			}
		}
	}
}
