//! Logging and debugging facilities for Horizon Bridge.
//!
//! This module provides:
//! - Target and span names for filtering the crate's `tracing` output
//! - Debug visualization of styled view trees
//! - Performance tracing hooks for profiling
//!
//! # Tracing Integration
//!
//! Horizon Bridge uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in the host application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_bridge_core::property=trace")
//!     .init();
//! ```
//!
//! # Debug Visualization
//!
//! Use [`NodeTreeDebug`] to render a tree with each node's style identity and,
//! optionally, every stored property value with its source:
//!
//! ```
//! use horizon_bridge_core::logging::{NodeTreeDebug, TreeFormatOptions};
//! use horizon_bridge_core::property::PropertyRegistry;
//! use horizon_bridge_core::ViewTree;
//!
//! let mut tree = ViewTree::new(PropertyRegistry::new());
//! let root = tree.create_node("StackLayout");
//! let label = tree.create_node("Label");
//! tree.append_child(root, label).unwrap();
//! tree.add_class(label, "title").unwrap();
//!
//! let dump = NodeTreeDebug::with_options(&tree, TreeFormatOptions::minimal())
//!     .format_subtree(root)
//!     .unwrap();
//! assert!(dump.contains("Label.title"));
//! ```

use std::fmt::{self, Write as FmtWrite};

use crate::error::Result;
use crate::tree::{NodeId, ViewTree};

/// Span names used throughout Horizon Bridge for tracing.
pub mod span_names {
    /// Property resolution span.
    pub const PROPERTY: &str = "horizon_bridge::property";
    /// Tree mutation span.
    pub const TREE: &str = "horizon_bridge::tree";
    /// Native flush span.
    pub const NATIVE: &str = "horizon_bridge::native";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_bridge_core";
    /// View tree structure target.
    pub const TREE: &str = "horizon_bridge_core::tree";
    /// Property system target.
    pub const PROPERTY: &str = "horizon_bridge_core::property";
    /// Native sync target.
    pub const NATIVE: &str = "horizon_bridge_core::native";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line representation.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node IDs.
    pub show_ids: bool,
    /// Whether to show active pseudo-classes.
    pub show_pseudo_classes: bool,
    /// Whether to show stored property values and their sources.
    pub show_properties: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_pseudo_classes: true,
            show_properties: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_properties: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_pseudo_classes: false,
            show_properties: false,
            ..Default::default()
        }
    }

    /// Set the tree style.
    pub fn with_style(mut self, style: TreeStyle) -> Self {
        self.style = style;
        self
    }

    /// Limit the traversal depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

/// Debug utility for visualizing view trees.
///
/// Each node renders as its selector-like identity, e.g.
/// `Button#ok.primary:hover`.
#[derive(Debug, Clone)]
pub struct NodeTreeDebug<'a> {
    tree: &'a ViewTree,
    options: TreeFormatOptions,
}

impl<'a> NodeTreeDebug<'a> {
    /// Create a new debug visualizer with default options.
    pub fn new(tree: &'a ViewTree) -> Self {
        Self {
            tree,
            options: TreeFormatOptions::default(),
        }
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(tree: &'a ViewTree, options: TreeFormatOptions) -> Self {
        Self { tree, options }
    }

    /// Format every root and its subtree.
    pub fn format_all(&self) -> Result<String> {
        let roots: Vec<NodeId> = self.tree.root_nodes().collect();

        let mut output = String::new();
        let _ = writeln!(output, "View Tree ({} total nodes):", self.tree.node_count());
        if roots.is_empty() {
            output.push_str("  (empty)\n");
        }
        for root in roots {
            self.format_subtree_into(root, 0, true, &mut output)?;
        }
        Ok(output)
    }

    /// Format a subtree starting from a specific node.
    pub fn format_subtree(&self, root: NodeId) -> Result<String> {
        let mut output = String::new();
        self.format_subtree_into(root, 0, true, &mut output)?;
        Ok(output)
    }

    fn format_subtree_into(
        &self,
        id: NodeId,
        depth: usize,
        is_last: bool,
        output: &mut String,
    ) -> Result<()> {
        if let Some(max) = self.options.max_depth {
            if depth > max {
                return Ok(());
            }
        }

        let tree = self.tree;
        output.push_str(&self.build_prefix(depth, is_last));
        output.push_str(tree.css_type(id)?);
        if let Some(css_id) = tree.css_id(id)? {
            let _ = write!(output, "#{css_id}");
        }
        for class in tree.classes(id)? {
            let _ = write!(output, ".{class}");
        }
        if self.options.show_pseudo_classes {
            for pseudo in tree.pseudo_classes(id)? {
                let _ = write!(output, ":{pseudo}");
            }
        }
        if self.options.show_ids {
            let _ = write!(output, " [{id:?}]");
        }
        output.push('\n');

        if self.options.show_properties {
            let prefix = self.build_property_prefix(depth);
            for property in tree.property_ids(id)? {
                let info = tree.registry().info(property)?;
                let value = tree.value(id, property)?;
                let source = tree.value_source(id, property)?;
                let _ = writeln!(output, "{prefix}  .{} = {value:?} ({source})", info.name());
            }
        }

        let children = tree.children(id)?;
        let child_count = children.len();
        for (i, &child) in children.iter().enumerate() {
            self.format_subtree_into(child, depth + 1, i + 1 == child_count, output)?;
        }
        Ok(())
    }

    /// Build the prefix string for a tree node.
    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, corner, last) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.options.indent_size));
        }
        prefix.push_str(if is_last { last } else { corner });
        prefix.push(' ');
        prefix
    }

    /// Build the prefix for property lines.
    fn build_property_prefix(&self, depth: usize) -> String {
        let branch = match self.options.style {
            TreeStyle::Ascii => "|",
            TreeStyle::Unicode => "\u{2502}",
            TreeStyle::Compact => "",
        };
        let mut prefix = String::new();
        for _ in 0..depth {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.options.indent_size));
        }
        prefix
    }
}

impl fmt::Display for NodeTreeDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format_all() {
            Ok(output) => f.write_str(&output),
            Err(e) => write!(f, "Error formatting view tree: {e}"),
        }
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Useful for timing a cascade pass or a subtree attach.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_bridge::perf", "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}
