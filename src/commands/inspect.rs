//! Inspect command implementation.
//!
//! Prints the full record of one process, including its module list.

use anyhow::bail;
use herakles_process_explorer::snapshot::apply_classification;
use herakles_process_explorer::{ProcessRecord, ProcessSource};

use crate::cli::OutputFormat;
use crate::commands::output::render_record;
use crate::commands::{load_signatures, open_source};
use crate::config::Config;

pub fn command_inspect(pid: u32, format: OutputFormat, config: &Config) -> anyhow::Result<()> {
    let source = open_source(config)?;
    let signatures = load_signatures(config)?;

    let Some(mut record) = inspect_one(source.as_ref(), pid) else {
        bail!("Process {} not found", pid);
    };
    let classification = signatures.classify(&record.name, &record.modules);
    apply_classification(&mut record, classification);

    match format {
        OutputFormat::Table => print!("{}", render_record(&record)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&record)?),
    }
    Ok(())
}

fn inspect_one(source: &dyn ProcessSource, pid: u32) -> Option<ProcessRecord> {
    source.begin_scan();
    let entry = source.enumerate().find(|e| e.pid == pid)?;
    Some(source.inspect(&entry))
}
