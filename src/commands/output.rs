//! Text rendering shared by the listing commands.

use herakles_process_explorer::ProcessRecord;
use std::fmt::Write as _;

use crate::cli::OutputFormat;

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Human-readable byte count.
pub fn format_bytes(bytes: u64) -> String {
    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{} KB", bytes / KB)
    } else {
        format!("{} B", bytes)
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let cut: String = s.chars().take(width.saturating_sub(1)).collect();
        format!("{cut}~")
    }
}

/// Fixed-width table, one row per process.
pub fn render_table(rows: &[&ProcessRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>7}  {:<24} {:>10} {:>5} {:<4} {:<3} {:<16} {:<10}",
        "PID", "NAME", "MEMORY", "THR", "ARCH", "ELV", "ENGINE", "PROTECTION"
    );
    for r in rows {
        let _ = writeln!(
            out,
            "{:>7}  {:<24} {:>10} {:>5} {:<4} {:<3} {:<16} {:<10}",
            r.pid,
            truncate(&r.name, 24),
            format_bytes(r.memory_usage_bytes),
            r.thread_count,
            r.architecture.as_str(),
            if r.is_elevated { "yes" } else { "" },
            truncate(&r.engine, 16),
            r.protection
        );
    }
    out
}

/// Renders rows in the requested format.
pub fn render_rows(rows: &[&ProcessRecord], format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Table => render_table(rows),
        OutputFormat::Json => serde_json::to_string_pretty(rows)?,
        OutputFormat::Yaml => serde_yaml::to_string(rows)?,
    })
}

/// Multi-line detail view of a single record.
pub fn render_record(record: &ProcessRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "PID:          {}", record.pid);
    let _ = writeln!(out, "Name:         {}", record.name);
    let _ = writeln!(out, "Path:         {}", record.full_path);
    let _ = writeln!(
        out,
        "Memory:       {} ({} bytes)",
        format_bytes(record.memory_usage_bytes),
        record.memory_usage_bytes
    );
    let _ = writeln!(out, "Threads:      {}", record.thread_count);
    let _ = writeln!(out, "Architecture: {}", record.architecture);
    let _ = writeln!(out, "Elevated:     {}", record.is_elevated);
    let _ = writeln!(out, "Access:       {:?}", record.access);
    let _ = writeln!(out, "Kernel task:  {}", record.kernel_thread);
    let _ = writeln!(out, "Engine:       {}", record.engine);
    let _ = writeln!(out, "Protection:   {}", record.protection);
    let _ = writeln!(out, "Image base:   {:#x}", record.image_base);
    let _ = writeln!(out, "Entry point:  {:#x}", record.entry_point);
    match record.start_time {
        Some(t) => {
            let _ = writeln!(out, "Started:      {}", t.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        None => {
            let _ = writeln!(out, "Started:      unknown");
        }
    }
    let _ = writeln!(out, "Modules ({}):", record.modules.len());
    for module in &record.modules {
        let _ = writeln!(out, "  {}", module);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use herakles_process_explorer::Architecture;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2 KB");
        assert_eq!(format_bytes(50 * MB), "50.0 MB");
        assert_eq!(format_bytes(3 * GB / 2), "1.50 GB");
    }

    #[test]
    fn test_render_table_has_sentinel_arch() {
        let mut r = ProcessRecord::partial(4, "lsass.exe", 9);
        r.architecture = Architecture::Kernel;
        let table = render_table(&[&r]);
        assert!(table.lines().next().unwrap().contains("PROTECTION"));
        assert!(table.contains("lsass.exe"));
        assert!(table.lines().nth(1).unwrap().contains(" K "));
    }

    #[test]
    fn test_truncate_long_names() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("averyveryverylongname", 8), "averyve~");
    }

    #[test]
    fn test_render_record_lists_modules() {
        let mut r = ProcessRecord::partial(10, "game", 3);
        r.modules = vec!["game".into(), "libc.so.6".into()];
        let text = render_record(&r);
        assert!(text.contains("Modules (2):"));
        assert!(text.contains("  libc.so.6"));
        assert!(text.contains("Started:      unknown"));
    }
}
