//! Integration tests for tiered property resolution and inheritance.

use std::sync::{Arc, Mutex};

use horizon_bridge_core::property::{OwnerType, PropertyDescriptor, PropertyRegistry};
use horizon_bridge_core::{
    BridgeError, NodeId, Property, PropertyError, PropertyValue, ValueSource, ViewTree,
};

const VIEW: OwnerType = OwnerType("View");

fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Fixture {
    tree: ViewTree,
    font_size: Property<f32>,
    root: NodeId,
    panel: NodeId,
    label: NodeId,
}

/// root > panel > label, with an inheritable `font-size`.
fn fixture() -> Fixture {
    setup();
    let mut registry = PropertyRegistry::new();
    let font_size = registry
        .register(
            VIEW,
            PropertyDescriptor::new("font-size", 12.0f32)
                .css("font-size")
                .inheritable()
                .parse_from_str(),
        )
        .unwrap();

    let mut tree = ViewTree::new(registry);
    let root = tree.create_node("Page");
    let panel = tree.create_node("StackLayout");
    let label = tree.create_node("Label");
    tree.append_child(root, panel).unwrap();
    tree.append_child(panel, label).unwrap();

    Fixture {
        tree,
        font_size,
        root,
        panel,
        label,
    }
}

#[test]
fn inherited_value_reaches_every_descendant() {
    let Fixture {
        mut tree,
        font_size,
        root,
        panel,
        label,
    } = fixture();

    tree.set(root, font_size, 20.0).unwrap();

    assert_eq!(tree.get(panel, font_size).unwrap(), 20.0);
    assert_eq!(tree.get(label, font_size).unwrap(), 20.0);
    assert_eq!(tree.value_source(label, font_size).unwrap(), ValueSource::Inherited);
}

#[test]
fn local_override_stops_propagation_and_unset_restores_parent_value() {
    let Fixture {
        mut tree,
        font_size,
        root,
        panel,
        label,
    } = fixture();

    tree.set(root, font_size, 20.0).unwrap();
    tree.set(panel, font_size, 14.0).unwrap();
    assert_eq!(tree.get(label, font_size).unwrap(), 14.0);

    // The panel keeps its local value but records the new inherited one.
    tree.set(root, font_size, 30.0).unwrap();
    assert_eq!(tree.get(panel, font_size).unwrap(), 14.0);
    assert_eq!(tree.get(label, font_size).unwrap(), 14.0);
    assert_eq!(
        tree.layer_value(panel, font_size, ValueSource::Inherited).unwrap(),
        Some(PropertyValue::new(30.0f32))
    );

    tree.unset(panel, font_size).unwrap();
    assert_eq!(tree.get(panel, font_size).unwrap(), 30.0);
    assert_eq!(tree.get(label, font_size).unwrap(), 30.0);
    assert_eq!(tree.value_source(panel, font_size).unwrap(), ValueSource::Inherited);
}

#[test]
fn callers_cannot_write_the_inherited_tier() {
    let Fixture {
        mut tree,
        font_size,
        root,
        label,
        ..
    } = fixture();
    tree.set(root, font_size, 20.0).unwrap();

    let err = tree
        .set_at(label, font_size, ValueSource::Inherited, 99.0)
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Property(PropertyError::UnsupportedSource {
            tier: ValueSource::Inherited,
            ..
        })
    ));
    assert!(tree
        .clear_value(label, font_size.id(), ValueSource::Inherited)
        .is_err());
    assert_eq!(tree.get(label, font_size).unwrap(), 20.0);
}

#[test]
fn resetting_the_root_returns_descendants_to_default() {
    let Fixture {
        mut tree,
        font_size,
        root,
        label,
        ..
    } = fixture();

    tree.set(root, font_size, 20.0).unwrap();
    tree.unset(root, font_size).unwrap();

    assert_eq!(tree.get(label, font_size).unwrap(), 12.0);
    assert_eq!(tree.value_source(label, font_size).unwrap(), ValueSource::Default);
}

#[test]
fn attach_inherits_and_detach_clears() {
    let Fixture {
        mut tree,
        font_size,
        root,
        panel,
        label,
    } = fixture();
    tree.set_css(root, font_size, 18.0).unwrap();

    let subtree = tree.create_node("StackLayout");
    let leaf = tree.create_node("Label");
    tree.append_child(subtree, leaf).unwrap();
    tree.append_child(panel, subtree).unwrap();
    assert_eq!(tree.get(leaf, font_size).unwrap(), 18.0);

    tree.detach(subtree).unwrap();
    assert_eq!(tree.get(subtree, font_size).unwrap(), 12.0);
    assert_eq!(tree.get(leaf, font_size).unwrap(), 12.0);
    assert_eq!(tree.value_source(leaf, font_size).unwrap(), ValueSource::Default);
    assert_eq!(tree.get(label, font_size).unwrap(), 18.0);
}

#[test]
fn detached_subtree_keeps_its_own_values() {
    let Fixture {
        mut tree,
        font_size,
        root,
        panel,
        label,
    } = fixture();
    tree.set(root, font_size, 18.0).unwrap();
    tree.set(panel, font_size, 10.0).unwrap();

    tree.detach(panel).unwrap();
    assert_eq!(tree.get(panel, font_size).unwrap(), 10.0);
    assert_eq!(tree.get(label, font_size).unwrap(), 10.0);
    assert_eq!(
        tree.layer_value(panel, font_size, ValueSource::Inherited).unwrap(),
        None
    );
}

#[test]
fn change_callbacks_fire_for_inherited_changes() {
    setup();
    let changes = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&changes);

    let mut registry = PropertyRegistry::new();
    let color = registry
        .register(
            VIEW,
            PropertyDescriptor::new("color", "black".to_string())
                .inheritable()
                .on_changed(move |change| {
                    recorded.lock().unwrap().push((change.node, change.new.clone(), change.source));
                }),
        )
        .unwrap();

    let mut tree = ViewTree::new(registry);
    let parent = tree.create_node("Page");
    let child = tree.create_node("Label");
    tree.append_child(parent, child).unwrap();

    tree.set(parent, color, "red".into()).unwrap();
    assert_eq!(
        *changes.lock().unwrap(),
        vec![
            (parent, "red".to_string(), ValueSource::Local),
            (child, "red".to_string(), ValueSource::Inherited),
        ]
    );
}

#[test]
fn text_writes_use_the_converter() {
    let Fixture {
        mut tree,
        font_size,
        root,
        label,
        ..
    } = fixture();

    tree.set_text(root, font_size.id(), ValueSource::Css, "22").unwrap();
    assert_eq!(tree.get(label, font_size).unwrap(), 22.0);
}
