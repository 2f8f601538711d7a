//! Declarative plot template model
//!
//! Templates are loaded once at startup from a JSON file (a compiled-in
//! default set backs the file). Each template names a figure configuration
//! and a list of glyphs; each glyph declares logical roles that the user
//! binds to batch columns through selectors. The `catagories` spelling is
//! the template wire format and is kept as-is.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::batch::Column;

/// Compiled-in template set, same content as `data/plot_templates.json`
const DEFAULT_TEMPLATES: &str = include_str!("../../data/plot_templates.json");

/// Which column shape a selector role accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// One number per row
    Scalar,
    /// One sub-sequence per row
    Array,
}

impl ColumnKind {
    pub fn matches(&self, column: &Column) -> bool {
        match self {
            ColumnKind::Scalar => column.is_scalar(),
            ColumnKind::Array => column.is_nested(),
        }
    }
}

/// Recognized figure options; unknown keys in the file are ignored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FigureConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_tools")]
    pub tools: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

fn default_width() -> u32 {
    600
}

fn default_height() -> u32 {
    500
}

fn default_tools() -> String {
    "wheel_zoom,save,pan,box_zoom,tap,box_select,lasso_select,reset".to_string()
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            tools: default_tools(),
            title: None,
        }
    }
}

/// One bindable logical role of a glyph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSpec {
    /// Glyph option the bound column feeds
    pub kwarg: String,
    /// Column shape this role accepts
    pub supports: ColumnKind,
    /// Ordered category values (colors, sizes, ...) for bucketed roles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catagories: Option<Vec<Value>>,
    /// Glyph is skipped when an essential role stays unbound
    #[serde(default)]
    pub essential: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlyphTemplate {
    /// Toolkit glyph name, e.g. "circle" or "multi_line"
    pub kind: String,
    /// Static glyph options used when a role is left unbound
    #[serde(default)]
    pub kwargs: serde_json::Map<String, Value>,
    /// Kwarg names that must receive a binding for the glyph to render
    #[serde(default)]
    pub essential: Vec<String>,
    /// Logical role name to its binding spec
    #[serde(default)]
    pub selector_options: BTreeMap<String, RoleSpec>,
}

impl GlyphTemplate {
    /// A role is essential via its own flag or the glyph's essential list
    pub fn role_is_essential(&self, spec: &RoleSpec) -> bool {
        spec.essential || self.essential.contains(&spec.kwarg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotTemplate {
    pub name: String,
    #[serde(default)]
    pub figure: FigureConfig,
    #[serde(default)]
    pub glyphs: Vec<GlyphTemplate>,
}

/// Template set keyed by name, in file order
#[derive(Debug, Clone, Default)]
pub struct TemplateTable {
    templates: Vec<PlotTemplate>,
}

impl TemplateTable {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let templates: Vec<PlotTemplate> = serde_json::from_str(text)?;
        Ok(Self { templates })
    }

    pub fn from_path(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&text)?)
    }

    /// The compiled-in default set; empty only if the build is broken
    pub fn load_default() -> Self {
        Self::from_json(DEFAULT_TEMPLATES).unwrap_or_else(|e| {
            eprintln!("⚠ Built-in plot templates failed to parse: {}", e);
            Self::default()
        })
    }

    pub fn get(&self, name: &str) -> Option<&PlotTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.templates.iter().map(|t| t.name.clone()).collect()
    }

    pub fn first(&self) -> Option<&PlotTemplate> {
        self.templates.first()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Pretty-printed JSON of one template for the template browser page
    pub fn pretty_json(&self, name: &str) -> Option<String> {
        self.get(name)
            .and_then(|t| serde_json::to_string_pretty(t).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_templates_parse() {
        let table = TemplateTable::load_default();
        assert!(!table.is_empty());
        assert!(table.get("scatter").is_some());
    }

    #[test]
    fn test_template_roles() {
        let table = TemplateTable::load_default();
        let scatter = table.get("scatter").unwrap();
        let glyph = &scatter.glyphs[0];
        assert_eq!(glyph.kind, "circle");

        let x = &glyph.selector_options["x"];
        assert_eq!(x.supports, ColumnKind::Scalar);
        assert!(glyph.role_is_essential(x));

        let color = &glyph.selector_options["color"];
        assert!(color.catagories.is_some());
        assert!(!glyph.role_is_essential(color));
    }

    #[test]
    fn test_unknown_figure_options_ignored() {
        let json = r#"[{
            "name": "t",
            "figure": {"width": 300, "output_backend": "webgl"},
            "glyphs": []
        }]"#;
        let table = TemplateTable::from_json(json).unwrap();
        let figure = &table.get("t").unwrap().figure;
        assert_eq!(figure.width, 300);
        assert_eq!(figure.height, 500);
    }

    #[test]
    fn test_pretty_json_roundtrip() {
        let table = TemplateTable::load_default();
        let text = table.pretty_json("scatter").unwrap();
        assert!(text.contains("\"circle\""));
    }
}
