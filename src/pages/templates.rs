//! Plot Templates page: template browser with a JSON detail view

use crate::plot::TemplateTable;

use super::Page;

pub struct PlotTemplatesPage {
    template_options: Vec<String>,
    selected: String,
    json_view: String,
}

impl PlotTemplatesPage {
    pub fn new(templates: &TemplateTable) -> Self {
        let mut page = Self {
            template_options: templates.names(),
            selected: String::new(),
            json_view: String::new(),
        };
        if let Some(first) = templates.first() {
            let name = first.name.clone();
            page.select_template(&name, templates);
        }
        page
    }

    pub fn template_options(&self) -> &[String] {
        &self.template_options
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn select_template(&mut self, name: &str, templates: &TemplateTable) {
        let Some(text) = templates.pretty_json(name) else {
            return;
        };
        self.selected = name.to_string();
        self.json_view = format!("Template values: \n{}", text);
    }

    pub fn json_view(&self) -> &str {
        &self.json_view
    }
}

impl Page for PlotTemplatesPage {
    fn title(&self) -> &'static str {
        "Plot Templates"
    }

    fn refresh(&mut self, _dataset_names: &[String], _source_keys: &[String]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_template_selected_at_startup() {
        let templates = TemplateTable::load_default();
        let page = PlotTemplatesPage::new(&templates);
        assert_eq!(page.selected(), "scatter");
        assert!(page.json_view().starts_with("Template values: \n"));
        assert!(page.json_view().contains("selector_options"));
    }

    #[test]
    fn test_unknown_template_keeps_view() {
        let templates = TemplateTable::load_default();
        let mut page = PlotTemplatesPage::new(&templates);
        let before = page.json_view().to_string();
        page.select_template("does-not-exist", &templates);
        assert_eq!(page.json_view(), before);
        assert_eq!(page.selected(), "scatter");
    }
}
