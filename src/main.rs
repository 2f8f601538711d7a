//! Strax Explorer - Main entry point
//!
//! Builds the shared context, starts the event loop machinery and walks
//! the dashboard core through a full load/navigate/plot cycle against the
//! demo backend. The production straxrpc transport binds the same
//! `StraxBackend` trait from its own crate; without it the demo backend
//! serves synthetic data so everything can run offline.
//!
//! Module organization:
//! - `strax`: backend interface and demo implementation
//! - `batch`/`store`/`loader`/`navigator`: the streaming chunk cache
//! - `plot`: template model and chart engine
//! - `pages`/`app`: page state machines and the event loop

use std::sync::Arc;

use anyhow::Context;

use strax_explorer::app::{fetch_dataset_names, spawn_periodic_refresh, AppContext, Dashboard};
use strax_explorer::config::{self, DashboardConfig};
use strax_explorer::plot::TemplateTable;
use strax_explorer::store::source_key;
use strax_explorer::strax::{DemoBackend, StraxBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("Strax Explorer v{}", env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = std::env::args().collect();
    config::parse_args(&args);
    let config = DashboardConfig::from_env();

    println!("Configuration:");
    println!("  Backend address: {}", config.addr);
    println!("  Refresh period: {}s", config.refresh_secs);
    println!();

    let templates = match &config.templates_path {
        Some(path) => TemplateTable::from_path(path)
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("loading templates from {}", path.display()))?,
        None => TemplateTable::load_default(),
    };
    println!("✓ Plot templates loaded: {:?}", templates.names());

    // The demo backend stands in for a running straxrpc server
    let backend: Arc<dyn StraxBackend> = Arc::new(DemoBackend::new());
    let names = fetch_dataset_names(backend.as_ref());
    println!("✓ Datasets available: {:?}\n", names);

    let ctx = AppContext::new(backend, templates);
    ctx.set_dataset_names(names);

    let mut dashboard = Dashboard::new(ctx.clone(), &config.addr);
    let refresh = spawn_periodic_refresh(ctx.clone(), dashboard.sender(), config.refresh_interval());

    // [1/4] Stream one dataset into the chunk store
    println!("[1/4] Loading event_basics for run 170621_0617...");
    dashboard.load_data.select_dataset("event_basics");
    dashboard.load_data.select_run("170621_0617");
    dashboard.request_load();

    let key = source_key("event_basics", "170621_0617");
    dashboard.run_until_finished(&key).await;

    let chunks = ctx.store.get(&key);
    println!(
        "✓ '{}' holds {} chunks, {} rows total",
        key,
        chunks.len(),
        dashboard.load_data.displayed_rows()
    );
    println!("  Columns: {:?}", dashboard.load_data.table_columns());

    // [2/4] Navigate the chunk sequence
    println!("\n[2/4] Navigating chunks...");
    let templates = ctx.templates.clone();
    dashboard.plot_columns.select_source(&key, &templates);
    println!("  {}", dashboard.plot_columns.chunk_label());
    dashboard.plot_columns.next_chunk(&templates);
    println!("  after next: {}", dashboard.plot_columns.chunk_label());
    dashboard.plot_columns.prev_chunk(&templates);
    println!("  after prev: {}", dashboard.plot_columns.chunk_label());

    // [3/4] Bind columns and build a chart
    println!("\n[3/4] Building a scatter chart...");
    dashboard.plot_columns.bind("x", Some("drift_time"));
    dashboard.plot_columns.bind("y", Some("s1_area"));
    dashboard.plot_columns.bind("color", Some("s2_area"));
    match dashboard.plot_columns.build_plot(&templates) {
        Some(chart) => {
            println!(
                "✓ Chart '{}' rendered: {} glyph(s), {}×{} px, {} synthetic column(s)",
                chart.template_name,
                chart.glyphs.len(),
                chart.figure.width,
                chart.figure.height,
                chart.synthetic.len()
            );
        }
        None => eprintln!("No chart produced"),
    }

    // [4/4] Exercise the explore and settings pages
    println!("\n[4/4] Field search and dataset config...");
    dashboard.search_field("s1*");
    dashboard.request_show_config("event_basics");
    // Refresh ticks share the queue, so drain until both results are in
    for _ in 0..16 {
        if dashboard.explore.results_text() != "No Matches to show."
            && !dashboard.server_config.config_rows().is_empty()
        {
            break;
        }
        if !dashboard.process_next().await {
            break;
        }
    }
    println!("  Matches for 's1*':");
    for line in dashboard.explore.results_text().lines() {
        println!("    {}", line);
    }
    println!(
        "  Config rows for event_basics: {}",
        dashboard.server_config.config_rows().len()
    );

    refresh.abort();
    println!("\n✓ Dashboard core exercised, shutting down");
    Ok(())
}
