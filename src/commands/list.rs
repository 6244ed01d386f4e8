//! List command implementation.
//!
//! Takes a single snapshot and prints the filtered, sorted rows.

use herakles_process_explorer::{build_snapshot, ProcessView};
use tracing::debug;

use crate::cli::{OutputFormat, SortArg};
use crate::commands::output::render_rows;
use crate::commands::{build_options, load_signatures, open_source, sort_mode};
use crate::config::Config;

pub fn command_list(
    filter: Option<String>,
    sort: Option<SortArg>,
    format: OutputFormat,
    limit: Option<usize>,
    config: &Config,
) -> anyhow::Result<()> {
    let source = open_source(config)?;
    let signatures = load_signatures(config)?;

    let snapshot = build_snapshot(source.as_ref(), &signatures, &build_options(config));

    let filter = filter.or_else(|| config.filter.clone()).unwrap_or_default();
    let view = ProcessView::new(filter, sort_mode(sort, config));
    let mut rows = view.rows(&snapshot);
    debug!("{} of {} processes match the filter", rows.len(), snapshot.len());
    if let Some(limit) = limit {
        rows.truncate(limit);
    }

    print!("{}", render_rows(&rows, format)?);
    if format == OutputFormat::Table {
        let stats = snapshot.stats();
        println!(
            "\n{} processes ({} full access, {} partial), scanned in {:.1}ms",
            stats.enumerated,
            stats.full_access,
            stats.partial,
            stats.duration.as_secs_f64() * 1000.0
        );
    }
    Ok(())
}
