//! Watch command implementation.
//!
//! Polls the application state on a short tokio ticker. Each poll asks the
//! refresh scheduler whether a rebuild is due; the rebuild itself runs
//! synchronously inside the tick, so builds never overlap. Ctrl+C stops the
//! loop after the current tick.

use chrono::Utc;
use herakles_process_explorer::{AppState, StateOptions};
use std::time::Duration;
use tokio::signal;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cli::{OutputFormat, SortArg};
use crate::commands::output::render_rows;
use crate::commands::{build_options, load_signatures, open_source, sort_mode};
use crate::config::Config;

/// Upper bound on the poll period; shorter refresh intervals poll faster.
const MAX_POLL_PERIOD: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub filter: Option<String>,
    pub sort: Option<SortArg>,
    pub interval_ms: Option<u64>,
    pub frames: Option<u64>,
    pub limit: usize,
    pub select: Option<u32>,
}

pub async fn command_watch(opts: WatchOptions, config: &Config) -> anyhow::Result<()> {
    let refresh_interval = opts
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.refresh_interval());
    if refresh_interval.is_zero() {
        anyhow::bail!("Refresh interval must be greater than 0");
    }

    let mut app = AppState::new(
        open_source(config)?,
        load_signatures(config)?,
        StateOptions {
            refresh_interval,
            build: build_options(config),
            filter: opts
                .filter
                .clone()
                .or_else(|| config.filter.clone())
                .unwrap_or_default(),
            sort: sort_mode(opts.sort, config),
        },
    );

    let mut ticker = interval(refresh_interval.min(MAX_POLL_PERIOD));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        "Watching processes every {}ms (Ctrl+C to stop)",
        refresh_interval.as_millis()
    );

    let mut frames = 0u64;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !app.refresh_if_due() {
                    continue;
                }
                if frames == 0 {
                    select_initial(&mut app, opts.select);
                }
                frames += 1;
                print_frame(&app, frames, opts.limit)?;

                if opts.frames.is_some_and(|max| frames >= max) {
                    debug!("Frame limit {} reached", frames);
                    break;
                }
            }
            res = &mut shutdown => {
                if let Err(e) = res {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                }
                info!("Shutdown signal received, stopping watch");
                break;
            }
        }
    }

    Ok(())
}

fn select_initial(app: &mut AppState, pid: Option<u32>) {
    let Some(pid) = pid else {
        return;
    };
    match app.rows().iter().position(|r| r.pid == pid) {
        Some(row) => {
            app.select_row(row);
        }
        None => warn!("Process {} is not among the visible rows", pid),
    }
}

fn print_frame(app: &AppState, frame: u64, limit: usize) -> anyhow::Result<()> {
    let snapshot = app.snapshot();
    let mut rows = app.rows();
    let visible = rows.len();
    rows.truncate(limit);

    println!(
        "── frame {} · {} · {} processes, {} shown · sort: {} ──",
        frame,
        Utc::now().format("%H:%M:%S"),
        snapshot.len(),
        visible,
        app.view().sort_mode()
    );
    print!("{}", render_rows(&rows, OutputFormat::Table)?);

    if let Some(sel) = app.selection() {
        match app.selected_record() {
            Some(r) => println!("▶ selected: {} {} ({})", r.pid, r.name, r.architecture),
            None => println!("▶ selected: {} {} (exited)", sel.pid, sel.name),
        }
    }
    println!();
    Ok(())
}
