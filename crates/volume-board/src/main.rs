mod bootstrap;

use anyhow::Result;
use volume_core::settings::Settings;
use volume_data::reader::TableLayout;
use volume_runtime::data_manager::DataManager;
use volume_runtime::orchestrator::RefreshOrchestrator;
use volume_ui::app::{App, ReportConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    let log_path = settings
        .log_file
        .clone()
        .unwrap_or_else(bootstrap::default_log_path);
    bootstrap::setup_logging(&settings.log_level, &log_path)?;

    tracing::info!("Volume board v{} starting", env!("CARGO_PKG_VERSION"));

    settings.validate()?;
    let metrics = settings.metric_specs()?;
    let (year, month) = settings.report_month();

    tracing::info!(
        year,
        month,
        theme = %settings.theme,
        timezone = %settings.timezone,
        refresh_rate = settings.refresh_rate,
        "settings resolved"
    );

    let source = bootstrap::build_source(&settings)?;
    let layout = TableLayout::new(&settings.entity_column, &settings.category_column);
    let manager = DataManager::new(source, layout, settings.cache_ttl);

    let (rx, handle) =
        RefreshOrchestrator::new(manager, u64::from(settings.refresh_rate)).start();

    let report = ReportConfig {
        metrics,
        labor_categories: settings.labor_categories.clone(),
        normalizer: settings.normalizer(),
    };
    let app = App::new(&settings.theme, year, month, report).with_entity(settings.entity.clone());

    // Raw mode turns Ctrl+C into a key press, which the app handles as quit.
    let result = app.run(rx, &handle).await;
    handle.abort();
    result?;

    tracing::info!("Volume board stopped");
    Ok(())
}
