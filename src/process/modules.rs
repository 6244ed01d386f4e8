//! Loaded-module enumeration from `/proc/<pid>/maps`.
//!
//! A module is a file with at least one executable mapping. Modules are
//! reported in the order their first mapping appears, so the main executable
//! comes first for ordinary processes. The base of a module is the start of
//! its first mapping.

use ahash::AHashMap as HashMap;
use std::fs;
use std::path::Path;

use crate::error::{ProcfsError, ProcfsResult};
use crate::process::handle::strip_deleted_suffix;

/// Upper bound on modules per process; extra modules are dropped silently.
pub const DEFAULT_MAX_MODULES: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedModule {
    /// Short file name, e.g. `libc.so.6`.
    pub name: String,
    pub path: String,
    pub base: u64,
}

/// One parsed maps line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Mapping<'a> {
    start: u64,
    executable: bool,
    path: &'a str,
}

/// Splits off the next whitespace-delimited field.
fn next_field(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    (&s[..end], &s[end..])
}

/// Parses a maps line; returns None for anonymous or pseudo mappings.
fn parse_maps_line(line: &str) -> Option<Mapping<'_>> {
    let (range, rest) = next_field(line);
    let (perms, rest) = next_field(rest);
    let (_offset, rest) = next_field(rest);
    let (_dev, rest) = next_field(rest);
    let (_inode, rest) = next_field(rest);

    // the pathname may contain spaces
    let path = rest.trim();
    if !path.starts_with('/') {
        return None;
    }

    let start_hex = range.split('-').next()?;
    let start = u64::from_str_radix(start_hex, 16).ok()?;

    Some(Mapping {
        start,
        executable: perms.as_bytes().get(2) == Some(&b'x'),
        path,
    })
}

/// Collects modules from the contents of a maps file.
pub fn parse_modules(content: &str, max_modules: usize) -> Vec<MappedModule> {
    // path -> (index in `order`, has executable mapping)
    let mut seen: HashMap<&str, (usize, bool)> = HashMap::new();
    let mut order: Vec<(&str, u64)> = Vec::new();

    for mapping in content.lines().filter_map(parse_maps_line) {
        match seen.get_mut(mapping.path) {
            Some((_, executable)) => *executable |= mapping.executable,
            None => {
                seen.insert(mapping.path, (order.len(), mapping.executable));
                order.push((mapping.path, mapping.start));
            }
        }
    }

    order
        .into_iter()
        .filter(|(path, _)| seen.get(path).is_some_and(|(_, exec)| *exec))
        .take(max_modules)
        .map(|(path, base)| {
            let path = strip_deleted_suffix(Path::new(path));
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            MappedModule {
                name,
                path: path.to_string_lossy().into_owned(),
                base,
            }
        })
        .collect()
}

/// Reads the module list of a process.
pub fn read_modules(proc_path: &Path, max_modules: usize) -> ProcfsResult<Vec<MappedModule>> {
    let maps_path = proc_path.join("maps");
    let content = fs::read_to_string(&maps_path).map_err(|e| ProcfsError::io(&maps_path, e))?;
    Ok(parse_modules(&content, max_modules))
}
