//! Tracing targets for the style crate.
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_bridge_style::selector=warn,horizon_bridge_style::cascade=debug")
//!     .init();
//! ```

/// Span names used by the style crate.
pub mod span_names {
    /// Stylesheet query span.
    pub const QUERY: &str = "horizon_bridge::style::query";
    /// Cascade write span.
    pub const CASCADE: &str = "horizon_bridge::style::cascade";
}

/// Target names for log filtering.
pub mod targets {
    /// Style crate target.
    pub const STYLE: &str = "horizon_bridge_style";
    /// Cascading and invalidation processing.
    pub const CASCADE: &str = "horizon_bridge_style::cascade";
    /// Selector parsing and matching.
    pub const SELECTOR: &str = "horizon_bridge_style::selector";
}
