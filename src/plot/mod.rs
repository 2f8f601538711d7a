//! Plot template engine
//!
//! Structure:
//! - `template.rs`: declarative template model and the startup template table
//! - `engine.rs`: role resolution, categorical bucketing, chart assembly

pub mod engine;
pub mod template;

// Re-exports for convenience
pub use engine::{category_codes, render, selectable_columns, Bindings, Chart, ResolvedGlyph};
pub use template::{ColumnKind, FigureConfig, GlyphTemplate, PlotTemplate, RoleSpec, TemplateTable};
