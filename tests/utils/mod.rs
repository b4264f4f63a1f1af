//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::oneshot;
use graft::dom::{Document, Node};
use graft::testing::RecordingComponent;
use graft::{ComponentRef, ComponentSource, Graft};

/// Builds a `data-component-name` placeholder with an optional render flag
/// and `<template class="props">` block.
pub fn placeholder(
	doc: &Document,
	name: &str,
	render: Option<&str>,
	props: Option<&str>,
) -> Node {
	let mut builder = doc.element("div").attr("data-component-name", name);
	if let Some(render) = render {
		builder = builder.attr("data-to-render", render);
	}
	if let Some(props) = props {
		builder = builder.child(doc.element("template").class("props").text(props));
	}
	builder.build()
}

/// Appends a placeholder to the body and returns it.
pub fn mount_placeholder(
	doc: &Document,
	name: &str,
	render: Option<&str>,
	props: Option<&str>,
) -> Node {
	let node = placeholder(doc, name, render, props);
	doc.body().append_child(&node);
	node
}

/// An engine with `hello` registered eagerly.
pub fn engine_with_hello() -> (Graft, Rc<RecordingComponent>) {
	let engine = Graft::new();
	let hello = RecordingComponent::new();
	engine.register_component("hello", ComponentSource::eager(hello.clone()));
	(engine, hello)
}

/// The props block child of a placeholder.
pub fn props_template(node: &Node) -> Node {
	node.child_nodes()
		.into_iter()
		.find(|child| child.attribute("class").as_deref() == Some("props"))
		.expect("placeholder has a props block")
}

/// A lazy resolver gated on a oneshot channel.
pub struct GatedResolver {
	pub calls: Rc<Cell<usize>>,
	pub sender: oneshot::Sender<ComponentRef>,
}

/// Registers `name` with a resolver that completes when the returned gate
/// is opened.
pub fn register_gated(engine: &Graft, name: &str) -> GatedResolver {
	let (sender, receiver) = oneshot::channel::<ComponentRef>();
	let receiver = Rc::new(RefCell::new(Some(receiver)));
	let calls = Rc::new(Cell::new(0));
	let counter = calls.clone();
	engine.register_component(
		name,
		ComponentSource::lazy(move || {
			counter.set(counter.get() + 1);
			let receiver = receiver.borrow_mut().take();
			async move {
				match receiver {
					Some(receiver) => receiver.await.map_err(|_| "gate dropped".to_string()),
					None => Err("resolver invoked twice".to_string()),
				}
			}
		}),
	);
	GatedResolver { calls, sender }
}

/// Counts store notifications.
pub fn count_updates(engine: &Graft) -> (Rc<Cell<usize>>, graft::StoreSubscription) {
	let count = Rc::new(Cell::new(0));
	let counter = count.clone();
	let subscription = engine.subscribe(move |_| counter.set(counter.get() + 1));
	(count, subscription)
}
