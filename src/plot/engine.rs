//! Template rendering engine
//!
//! Resolves a template's glyph roles against a batch's columns and produces
//! a `Chart`: the figure configuration plus one resolved glyph per template
//! glyph whose essential roles could be bound. The chart references batch
//! columns by name and carries any synthetic columns produced by
//! categorical bucketing; the widget toolkit paints it.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::batch::{Column, RecordBatch};

use super::template::{ColumnKind, FigureConfig, GlyphTemplate, PlotTemplate};

/// Role name to bound column name, as chosen in the page's selectors
pub type Bindings = BTreeMap<String, String>;

/// Prefix for synthetic columns written by categorical bucketing
const SYNTHETIC_PREFIX: &str = "__";

/// A glyph with every bound role resolved to a column reference
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGlyph {
    pub kind: String,
    /// Static options, effective where no binding overrides them
    pub kwargs: serde_json::Map<String, Value>,
    /// Kwarg name to column name (batch column or synthetic)
    pub bindings: Vec<(String, String)>,
}

/// A fully resolved chart ready for a toolkit to paint
#[derive(Debug, Clone)]
pub struct Chart {
    pub template_name: String,
    pub figure: FigureConfig,
    /// The batch the glyph bindings refer to
    pub batch: Arc<RecordBatch>,
    /// Bucketed category values, keyed by `__{role}`
    pub synthetic: BTreeMap<String, Vec<Value>>,
    pub glyphs: Vec<ResolvedGlyph>,
}

/// Columns of a batch a role of the given kind can bind, in schema order
pub fn selectable_columns(batch: &RecordBatch, kind: ColumnKind) -> Vec<String> {
    batch
        .columns()
        .filter(|(_, column)| kind.matches(column))
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Render a template against a batch with the page's current bindings
///
/// Glyphs resolve independently: one glyph with an unbound essential role
/// is omitted while the others still render. Re-applying the same bindings
/// to another chunk of the same source re-renders without re-prompting.
pub fn render(template: &PlotTemplate, batch: &Arc<RecordBatch>, bindings: &Bindings) -> Chart {
    let mut synthetic = BTreeMap::new();
    let glyphs = template
        .glyphs
        .iter()
        .filter_map(|glyph| resolve_glyph(glyph, batch, bindings, &mut synthetic))
        .collect();

    Chart {
        template_name: template.name.clone(),
        figure: template.figure.clone(),
        batch: batch.clone(),
        synthetic,
        glyphs,
    }
}

/// Resolve one glyph, or `None` when an essential role has no valid binding
fn resolve_glyph(
    glyph: &GlyphTemplate,
    batch: &RecordBatch,
    bindings: &Bindings,
    synthetic: &mut BTreeMap<String, Vec<Value>>,
) -> Option<ResolvedGlyph> {
    let mut resolved = Vec::new();
    let mut bucketed = Vec::new();

    for (role, spec) in &glyph.selector_options {
        let chosen = bindings
            .get(role)
            .filter(|name| !name.is_empty() && *name != "None");
        let column = chosen.and_then(|name| {
            batch
                .column(name)
                .filter(|c| spec.supports.matches(c))
                .map(|c| (name.as_str(), c))
        });

        let (name, column) = match column {
            Some(found) => found,
            None => {
                if glyph.role_is_essential(spec) {
                    return None;
                }
                continue;
            }
        };

        match (&spec.catagories, column) {
            (Some(cats), Column::Scalar(values)) if !cats.is_empty() => {
                let codes = category_codes(values, cats.len());
                let synth_name = format!("{}{}", SYNTHETIC_PREFIX, role);
                let cat_values = codes
                    .iter()
                    .map(|&code| cats[code.min(cats.len() - 1)].clone())
                    .collect();
                bucketed.push((synth_name.clone(), cat_values));
                resolved.push((spec.kwarg.clone(), synth_name));
            }
            _ => resolved.push((spec.kwarg.clone(), name.to_string())),
        }
    }

    synthetic.extend(bucketed);
    Some(ResolvedGlyph {
        kind: glyph.kind.clone(),
        kwargs: glyph.kwargs.clone(),
        bindings: resolved,
    })
}

/// Bucket codes for a scalar column against `k` category slots
///
/// With at most `k` distinct values, each distinct value gets its own slot
/// in first-seen order. With more, values fall into `k` quantile bins;
/// duplicate bin boundaries collapse, which can reduce the effective bin
/// count below `k`.
pub fn category_codes(values: &[f64], k: usize) -> Vec<usize> {
    if k == 0 || values.is_empty() {
        return vec![0; values.len()];
    }

    let mut distinct: Vec<u64> = Vec::new();
    for v in values {
        let bits = normal_bits(*v);
        if !distinct.contains(&bits) {
            distinct.push(bits);
        }
        if distinct.len() > k {
            return quantile_codes(values, k);
        }
    }

    values
        .iter()
        .map(|v| {
            let bits = normal_bits(*v);
            distinct.iter().position(|d| *d == bits).unwrap_or(0)
        })
        .collect()
}

/// Bit pattern with negative zero folded onto zero
fn normal_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

fn quantile_codes(values: &[f64], k: usize) -> Vec<usize> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut edges: Vec<f64> = (1..k)
        .map(|i| quantile(&sorted, i as f64 / k as f64))
        .collect();
    edges.dedup_by(|a, b| a == b);

    // Right-closed bins: a value equal to an edge lands in the lower bin
    values
        .iter()
        .map(|v| edges.partition_point(|edge| edge < v))
        .collect()
}

/// Linear-interpolation quantile over a sorted slice
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
