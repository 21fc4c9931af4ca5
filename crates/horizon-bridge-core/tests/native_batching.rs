//! Integration tests for native view synchronisation and batching.

use std::sync::{Arc, Mutex};

use horizon_bridge_core::property::{OwnerType, PropertyAssignment, PropertyDescriptor, PropertyRegistry, ShorthandDescriptor};
use horizon_bridge_core::{NativeView, PropertyValue, ValueSource, ViewTree};

type Log = Arc<Mutex<Vec<(String, PropertyValue)>>>;

#[derive(Default)]
struct RecordingView {
    log: Log,
}

impl NativeView for RecordingView {
    fn set_native(&mut self, property: &str, value: &PropertyValue) {
        self.log.lock().unwrap().push((property.to_string(), value.clone()));
    }
}

fn install(tree: &mut ViewTree, node: horizon_bridge_core::NodeId) -> Log {
    let log = Log::default();
    tree.set_native_view(node, Box::new(RecordingView { log: Arc::clone(&log) }))
        .unwrap();
    log
}

#[test]
fn many_batched_writes_push_once_with_final_value() {
    let mut registry = PropertyRegistry::new();
    let opacity = registry
        .register(
            OwnerType("View"),
            PropertyDescriptor::new("opacity", 1.0f32).animatable().native(),
        )
        .unwrap();
    let mut tree = ViewTree::new(registry);
    let node = tree.create_node("Image");
    let log = install(&mut tree, node);

    {
        let mut batch = tree.batch(node).unwrap();
        for step in 1..=10 {
            batch.set_keyframe(node, opacity, step as f32 / 10.0).unwrap();
        }
        assert!(log.lock().unwrap().is_empty());
    }

    assert_eq!(
        *log.lock().unwrap(),
        vec![("opacity".to_string(), PropertyValue::new(1.0f32))]
    );
}

#[test]
fn flush_pushes_each_property_once() {
    let mut registry = PropertyRegistry::new();
    let width = registry
        .register(OwnerType("View"), PropertyDescriptor::new("width", 0.0f32).native())
        .unwrap();
    let height = registry
        .register(OwnerType("View"), PropertyDescriptor::new("height", 0.0f32).native())
        .unwrap();
    let mut tree = ViewTree::new(registry);
    let node = tree.create_node("View");
    let log = install(&mut tree, node);

    {
        let mut batch = tree.batch(node).unwrap();
        batch.set(node, height, 3.0).unwrap();
        batch.set(node, width, 1.0).unwrap();
        batch.set(node, height, 4.0).unwrap();
        {
            let mut inner = batch.batch(node).unwrap();
            inner.set(node, width, 2.0).unwrap();
        }
        assert!(log.lock().unwrap().is_empty());
    }

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            ("width".to_string(), PropertyValue::new(2.0f32)),
            ("height".to_string(), PropertyValue::new(4.0f32)),
        ]
    );
}

#[test]
fn shorthand_assignment_is_batched() {
    let mut registry = PropertyRegistry::new();
    let left = registry
        .register(OwnerType("View"), PropertyDescriptor::new("padding-left", 0.0f32).native())
        .unwrap();
    let right = registry
        .register(OwnerType("View"), PropertyDescriptor::new("padding-right", 0.0f32).native())
        .unwrap();
    let padding = registry
        .register_shorthand(
            OwnerType("View"),
            ShorthandDescriptor::new(
                "padding",
                move |v: &f32| vec![PropertyAssignment::new(left, *v), PropertyAssignment::new(right, *v)],
                move |values| values.get(left).unwrap_or_default(),
            )
            .longhand(left)
            .longhand(right),
        )
        .unwrap();
    let mut tree = ViewTree::new(registry);
    let node = tree.create_node("View");
    let log = install(&mut tree, node);

    tree.suspend_native_updates(node).unwrap();
    tree.set_shorthand(node, padding, ValueSource::Local, 6.0).unwrap();
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(tree.get(node, right).unwrap(), 6.0);

    tree.resume_native_updates(node).unwrap();
    assert_eq!(log.lock().unwrap().len(), 2);
}

#[test]
fn attach_batches_the_whole_subtree() {
    let mut registry = PropertyRegistry::new();
    let color = registry
        .register(
            OwnerType("View"),
            PropertyDescriptor::new("color", "black".to_string()).inheritable().native(),
        )
        .unwrap();
    let mut tree = ViewTree::new(registry);
    let page = tree.create_node("Page");
    let panel = tree.create_node("StackLayout");
    let label = tree.create_node("Label");
    tree.append_child(panel, label).unwrap();
    tree.set(page, color, "red".into()).unwrap();
    let log = install(&mut tree, label);

    tree.append_child(page, panel).unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![("color".to_string(), PropertyValue::new("red".to_string()))]
    );
    assert!(!tree.native_updates_suspended(label).unwrap());
    assert!(!tree.native_updates_suspended(panel).unwrap());
}

#[test]
fn nodes_without_views_do_not_queue() {
    let mut registry = PropertyRegistry::new();
    let width = registry
        .register(OwnerType("View"), PropertyDescriptor::new("width", 0.0f32).native())
        .unwrap();
    let mut tree = ViewTree::new(registry);
    let node = tree.create_node("View");

    tree.set(node, width, 7.0).unwrap();
    let log = install(&mut tree, node);

    assert_eq!(
        *log.lock().unwrap(),
        vec![("width".to_string(), PropertyValue::new(7.0f32))]
    );
}
