//! Plot Columns page: column binding, chunk navigation and chart building

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::batch::RecordBatch;
use crate::navigator::ChunkNavigator;
use crate::plot::{render, selectable_columns, Bindings, Chart, TemplateTable};
use crate::store::{ChunkStore, RANDOM_KEY};

use super::Page;

pub struct PlotColumnsPage {
    source_options: Vec<String>,
    selected_source: String,
    template_name: String,
    /// Role name to chosen column; `None` renders the role unbound
    bindings: BTreeMap<String, Option<String>>,
    /// Role name to its selectable column list (without the None entry)
    role_options: BTreeMap<String, Vec<String>>,
    navigator: ChunkNavigator,
    /// The batch charts are built from; replaced on every navigation
    live: Option<Arc<RecordBatch>>,
    chart: Option<Chart>,
}

impl PlotColumnsPage {
    pub fn new(store: ChunkStore, templates: &TemplateTable) -> Self {
        let mut page = Self {
            source_options: store.keys(),
            navigator: ChunkNavigator::new(store),
            selected_source: String::new(),
            template_name: templates.first().map(|t| t.name.clone()).unwrap_or_default(),
            bindings: BTreeMap::new(),
            role_options: BTreeMap::new(),
            live: None,
            chart: None,
        };
        page.select_source(RANDOM_KEY, templates);
        page
    }

    pub fn selected_source(&self) -> &str {
        &self.selected_source
    }

    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    pub fn source_options(&self) -> &[String] {
        &self.source_options
    }

    pub fn role_options(&self) -> &BTreeMap<String, Vec<String>> {
        &self.role_options
    }

    pub fn binding(&self, role: &str) -> Option<&str> {
        self.bindings.get(role).and_then(|b| b.as_deref())
    }

    pub fn navigator(&self) -> &ChunkNavigator {
        &self.navigator
    }

    pub fn chart(&self) -> Option<&Chart> {
        self.chart.as_ref()
    }

    /// Switch the page to a source key, landing on its first chunk
    ///
    /// An empty or unknown key falls back to the `__random__` source, so
    /// the page always has something to plot.
    pub fn select_source(&mut self, key: &str, templates: &TemplateTable) {
        let (key, batch) = match self.navigator.goto(key, 0) {
            Some(batch) => (key.to_string(), batch),
            None => match self.navigator.goto(RANDOM_KEY, 0) {
                Some(batch) => (RANDOM_KEY.to_string(), batch),
                None => return,
            },
        };
        self.selected_source = key;
        self.live = Some(batch);
        self.rebind(templates);
    }

    pub fn select_template(&mut self, name: &str, templates: &TemplateTable) {
        if templates.get(name).is_some() {
            self.template_name = name.to_string();
            self.rebind(templates);
        }
    }

    /// Manually bind a role; `None` clears it
    pub fn bind(&mut self, role: &str, column: Option<&str>) {
        if self.bindings.contains_key(role) {
            self.bindings
                .insert(role.to_string(), column.map(|c| c.to_string()));
        }
    }

    /// Re-derive role options from the live batch, keeping valid choices
    ///
    /// An invalid choice falls back to a column named like the role, then
    /// to unbound. This mirrors what a user expects when switching between
    /// sources with similar schemas.
    fn rebind(&mut self, templates: &TemplateTable) {
        let Some(template) = templates.get(&self.template_name) else {
            return;
        };
        let Some(live) = &self.live else {
            return;
        };

        let mut options = BTreeMap::new();
        let mut bindings = BTreeMap::new();
        for glyph in &template.glyphs {
            for (role, spec) in &glyph.selector_options {
                if options.contains_key(role) {
                    continue;
                }
                let columns = selectable_columns(live, spec.supports);
                let previous = self.bindings.get(role).cloned().flatten();
                let chosen = match previous {
                    Some(ref c) if columns.contains(c) => Some(c.clone()),
                    _ if columns.iter().any(|c| c == role) => Some(role.clone()),
                    _ => None,
                };
                options.insert(role.clone(), columns);
                bindings.insert(role.clone(), chosen);
            }
        }
        self.role_options = options;
        self.bindings = bindings;
        self.chart = None;
    }

    fn plain_bindings(&self) -> Bindings {
        self.bindings
            .iter()
            .filter_map(|(role, column)| column.clone().map(|c| (role.clone(), c)))
            .collect()
    }

    /// Build (or rebuild) the chart from the live batch and current bindings
    pub fn build_plot(&mut self, templates: &TemplateTable) -> Option<&Chart> {
        let template = templates.get(&self.template_name)?;
        let live = self.live.clone()?;
        self.chart = Some(render(template, &live, &self.plain_bindings()));
        self.chart.as_ref()
    }

    /// Label for the chunk position display, e.g. "chunk 2/5"
    pub fn chunk_label(&self) -> String {
        if self.navigator.enabled() {
            format!(
                "chunk {}/{}",
                self.navigator.current_index() + 1,
                self.navigator.total()
            )
        } else {
            "no chunks".to_string()
        }
    }

    pub fn goto_chunk(&mut self, index: i64, templates: &TemplateTable) {
        let key = self.selected_source.clone();
        let batch = self.navigator.goto(&key, index);
        self.replace_live(batch, templates);
    }

    pub fn next_chunk(&mut self, templates: &TemplateTable) {
        let batch = self.navigator.next();
        self.replace_live(batch, templates);
    }

    pub fn prev_chunk(&mut self, templates: &TemplateTable) {
        let batch = self.navigator.prev();
        self.replace_live(batch, templates);
    }

    /// Full replace of the plot source; re-renders with the same bindings
    fn replace_live(&mut self, batch: Option<Arc<RecordBatch>>, templates: &TemplateTable) {
        let Some(batch) = batch else {
            return;
        };
        self.live = Some(batch);
        if self.chart.is_some() {
            self.build_plot(templates);
        }
    }

    pub fn set_source_options(&mut self, keys: Vec<String>) {
        self.source_options = keys;
    }
}

impl Page for PlotColumnsPage {
    fn title(&self) -> &'static str {
        "Plot Columns"
    }

    fn refresh(&mut self, _dataset_names: &[String], source_keys: &[String]) {
        self.source_options = source_keys.to_vec();
    }
}
