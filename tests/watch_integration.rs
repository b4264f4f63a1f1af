//! Integration tests for the change watchers
//!
//! Every test mutates the in-memory tree and then runs one notification
//! cycle with `Document::flush`.

mod utils;

use std::rc::Rc;

use graft::dom::Document;
use graft::testing::RecordingComponent;
use graft::{ComponentSource, CreateOptions, Graft, ManagedElement};
use rstest::rstest;
use serde_json::json;
use utils::{engine_with_hello, mount_placeholder, props_template};

async fn hydrate_one(
	doc: &Document,
	options: CreateOptions,
) -> (Graft, ManagedElement, Rc<RecordingComponent>) {
	let (engine, hello) = engine_with_hello();
	let mut elements = engine.hydrate(doc.body().to_ref(), options).await;
	assert_eq!(elements.len(), 1);
	let element = elements.remove(0);
	(engine, element, hello)
}

// ============================================================================
// host removal
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_removed_placeholder_is_destroyed_within_one_cycle() {
	// Arrange
	let doc = Document::new();
	let node = mount_placeholder(&doc, "hello", None, Some("{}"));
	let (_engine, element, hello) = hydrate_one(&doc, CreateOptions::new()).await;

	// Act
	node.remove();
	assert!(!element.is_destroyed());
	doc.flush();

	// Assert
	assert!(element.is_destroyed());
	assert_eq!(hello.live_count(), 0);
	assert_eq!(element.watcher_count(), 0);
}

#[rstest]
#[tokio::test]
async fn test_removal_is_ignored_without_observe_parents() {
	let doc = Document::new();
	let node = mount_placeholder(&doc, "hello", None, Some("{}"));
	let (_engine, element, hello) =
		hydrate_one(&doc, CreateOptions::new().observe_parents(false)).await;

	node.remove();
	doc.flush();

	assert!(!element.is_destroyed());
	assert_eq!(hello.live_count(), 1);
}

#[rstest]
#[tokio::test]
async fn test_ancestor_removal_destroys_element() {
	let doc = Document::new();
	let section = doc.create_element("section");
	let wrapper = doc.create_element("div");
	doc.body().append_child(&section);
	section.append_child(&wrapper);
	wrapper.append_child(&utils::placeholder(&doc, "hello", None, None));
	let (_engine, element, _) = hydrate_one(&doc, CreateOptions::new()).await;

	section.remove();
	doc.flush();

	assert!(element.is_destroyed());
}

#[rstest]
#[tokio::test]
async fn test_move_within_tree_keeps_element() {
	let doc = Document::new();
	let node = mount_placeholder(&doc, "hello", None, None);
	let (_engine, element, _) = hydrate_one(&doc, CreateOptions::new()).await;

	node.remove();
	doc.body().append_child(&node);
	doc.flush();

	assert!(!element.is_destroyed());
	assert!(element.has_instance());
}

#[rstest]
#[tokio::test]
async fn test_removal_after_move_to_new_parent_destroys_element() {
	// Arrange
	let doc = Document::new();
	let first = doc.create_element("section");
	let second = doc.create_element("section");
	doc.body().append_child(&first);
	doc.body().append_child(&second);
	let node = utils::placeholder(&doc, "hello", None, None);
	first.append_child(&node);
	let (engine, element, hello) = hydrate_one(&doc, CreateOptions::new()).await;

	// Act
	second.append_child(&node);
	doc.flush();
	assert!(!element.is_destroyed());
	second.remove_child(&node);
	doc.flush();

	// Assert
	assert!(element.is_destroyed());
	assert_eq!(hello.live_count(), 0);
	assert!(engine.elements().is_empty());
	assert_eq!(element.watcher_count(), 0);
}

#[rstest]
#[tokio::test]
async fn test_old_parent_changes_ignored_after_move() {
	let doc = Document::new();
	let first = doc.create_element("section");
	let second = doc.create_element("section");
	doc.body().append_child(&first);
	doc.body().append_child(&second);
	let node = utils::placeholder(&doc, "hello", None, None);
	first.append_child(&node);
	let (_engine, element, _) = hydrate_one(&doc, CreateOptions::new()).await;

	second.append_child(&node);
	doc.flush();
	first.append_child(&doc.create_element("p"));

	assert_eq!(doc.pending_records(), 0);
	assert!(!element.is_destroyed());
	assert!(element.has_instance());
}

#[rstest]
#[tokio::test]
async fn test_sibling_changes_do_not_destroy() {
	let doc = Document::new();
	mount_placeholder(&doc, "hello", None, None);
	let (_engine, element, _) = hydrate_one(&doc, CreateOptions::new()).await;

	doc.body().append_child(&doc.create_element("p"));
	doc.flush();

	assert!(!element.is_destroyed());
}

// ============================================================================
// content
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_props_block_change_updates_instance() {
	// Arrange
	let doc = Document::new();
	let node = mount_placeholder(&doc, "hello", None, Some(r#"{"name":"world"}"#));
	let (_engine, element, hello) = hydrate_one(&doc, CreateOptions::new()).await;

	// Act
	props_template(&node).set_text(r#"{"name":"moon"}"#);
	doc.flush();

	// Assert
	assert_eq!(element.props(), json!({"name": "moon"}));
	assert_eq!(hello.updates(), vec![json!({"name": "moon"})]);
}

#[rstest]
#[tokio::test]
async fn test_character_data_change_updates_props() {
	let doc = Document::new();
	let node = mount_placeholder(&doc, "hello", None, Some(r#"{"n":1}"#));
	let (_engine, element, _) = hydrate_one(&doc, CreateOptions::new()).await;

	let text = props_template(&node).child_nodes().remove(0);
	text.set_text("%7B%22n%22%3A2%7D");
	doc.flush();

	assert_eq!(element.props(), json!({"n": 2}));
}

#[rstest]
#[tokio::test]
async fn test_render_attribute_toggles_instance() {
	let doc = Document::new();
	let node = mount_placeholder(&doc, "hello", None, None);
	let (_engine, element, hello) = hydrate_one(&doc, CreateOptions::new()).await;

	node.set_attribute("data-to-render", "false");
	doc.flush();
	assert!(!element.has_instance());
	assert_eq!(hello.destroy_count(), 1);

	node.set_attribute("data-to-render", "true");
	doc.flush();
	assert!(element.has_instance());
	assert_eq!(hello.construct_count(), 2);
}

#[rstest]
#[tokio::test]
async fn test_removing_render_attribute_means_render() {
	let doc = Document::new();
	let node = mount_placeholder(&doc, "hello", Some("false"), None);
	let (_engine, element, _) = hydrate_one(&doc, CreateOptions::new()).await;

	node.remove_attribute("data-to-render");
	doc.flush();

	assert!(element.has_instance());
}

#[rstest]
#[tokio::test]
async fn test_reordering_with_identical_text_is_not_a_change() {
	let doc = Document::new();
	let node = mount_placeholder(&doc, "hello", None, Some(r#"{"a":1}"#));
	let marker = doc.create_element("span");
	node.append_child(&marker);
	let (_engine, element, hello) = hydrate_one(&doc, CreateOptions::new()).await;

	node.insert_before(&marker, Some(&props_template(&node)));
	doc.flush();

	assert_eq!(hello.update_count(), 0);
	assert_eq!(element.props(), json!({"a": 1}));
}

#[rstest]
#[case("{name: hello}")]
#[case("%7Bbroken")]
#[tokio::test]
async fn test_malformed_props_keep_previous_value(#[case] malformed: &str) {
	let doc = Document::new();
	let node = mount_placeholder(&doc, "hello", None, Some(r#"{"name":"world"}"#));
	let (_engine, element, hello) = hydrate_one(&doc, CreateOptions::new()).await;

	props_template(&node).set_text(malformed);
	doc.flush();

	assert_eq!(element.props(), json!({"name": "world"}));
	assert_eq!(hello.update_count(), 0);

	props_template(&node).set_text(r#"{"name":"fixed"}"#);
	doc.flush();
	assert_eq!(element.props(), json!({"name": "fixed"}));
}

#[rstest]
#[tokio::test]
async fn test_malformed_render_flag_is_ignored() {
	let doc = Document::new();
	let node = mount_placeholder(&doc, "hello", None, None);
	let (_engine, element, hello) = hydrate_one(&doc, CreateOptions::new()).await;

	node.set_attribute("data-to-render", "nope");
	doc.flush();

	assert!(element.has_instance());
	assert_eq!(hello.destroy_count(), 0);
}

#[rstest]
#[tokio::test]
async fn test_content_changes_ignored_without_observe() {
	let doc = Document::new();
	let node = mount_placeholder(&doc, "hello", None, Some("{}"));
	let (_engine, element, hello) = hydrate_one(&doc, CreateOptions::new().observe(false)).await;

	node.set_attribute("data-to-render", "false");
	props_template(&node).set_text(r#"{"x":1}"#);
	doc.flush();

	assert!(element.has_instance());
	assert_eq!(hello.update_count(), 0);
}

#[rstest]
#[tokio::test]
async fn test_destroyed_element_stops_watching() {
	let doc = Document::new();
	let node = mount_placeholder(&doc, "hello", None, Some("{}"));
	let (_engine, element, hello) = hydrate_one(&doc, CreateOptions::new()).await;

	element.destroy();
	props_template(&node).set_text(r#"{"x":1}"#);
	node.set_attribute("data-to-render", "false");

	assert_eq!(doc.pending_records(), 0);
	doc.flush();
	assert_eq!(hello.update_count(), 0);
}

#[rstest]
#[tokio::test]
async fn test_nested_placeholder_changes_stay_local() {
	// Arrange
	let doc = Document::new();
	let (engine, outer_class) = engine_with_hello();
	let inner_class = RecordingComponent::new();
	engine.register_component("inner", ComponentSource::eager(inner_class.clone()));
	let outer = mount_placeholder(&doc, "hello", None, Some("{}"));
	let inner = utils::placeholder(&doc, "inner", None, Some("{}"));
	outer.append_child(&inner);
	let elements = engine.hydrate(doc.body().to_ref(), CreateOptions::new()).await;

	// Act
	inner.set_attribute("data-to-render", "false");
	doc.flush();

	// Assert
	assert!(elements[0].has_instance());
	assert!(!elements[1].has_instance());
	assert_eq!(outer_class.destroy_count(), 0);
	assert_eq!(outer_class.update_count(), 0);
	assert_eq!(inner_class.destroy_count(), 1);
}
