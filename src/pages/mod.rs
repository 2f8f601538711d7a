//! Page controllers
//!
//! Each dashboard tab is an explicit state machine over typed view state.
//! Pages never talk to the network themselves: control changes are turned
//! into backend requests by the event loop, and results come back as tasks
//! applied through typed transition methods. A widget toolkit reads the
//! page fields to paint.

pub mod explore;
pub mod load_data;
pub mod plot_columns;
pub mod server_config;
pub mod templates;

pub use explore::ExplorePage;
pub use load_data::LoadDataPage;
pub use plot_columns::PlotColumnsPage;
pub use server_config::ServerConfigPage;
pub use templates::PlotTemplatesPage;

/// Load lifecycle of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageState {
    /// Nothing requested yet
    #[default]
    Idle,
    /// A load is in flight; the trigger control is disabled
    Loading,
    /// At least one load completed; the trigger control is enabled again
    Ready,
}

/// Common page interface used by the event loop on refresh ticks
pub trait Page {
    fn title(&self) -> &'static str;

    /// Re-derive option lists from the shared state
    fn refresh(&mut self, dataset_names: &[String], source_keys: &[String]);
}
