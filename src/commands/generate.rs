//! Generate testdata command implementation.
//!
//! Writes a synthetic process table as JSON, for use with `--test-data-file`.

use chrono::{Duration as ChronoDuration, Utc};
use herakles_process_explorer::{Access, Architecture, ProcessRecord, TestData};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const MB: u64 = 1024 * 1024;

/// Windows-style system processes, by name.
const SYSTEM_PROCESSES: &[(&str, u32)] = &[
    ("System", 4),
    ("Registry", 120),
    ("smss.exe", 388),
    ("csrss.exe", 512),
    ("wininit.exe", 600),
    ("services.exe", 680),
    ("lsass.exe", 700),
    ("svchost.exe", 812),
    ("svchost.exe", 840),
    ("Memory Compression", 1900),
];

/// Programs with a characteristic module set.
const PROFILES: &[(&str, &[&str])] = &[
    ("bash", &["bash", "libc.so.6", "libtinfo.so.6"]),
    ("nginx", &["nginx", "libc.so.6", "libssl.so.3", "libpcre2-8.so.0"]),
    ("postgres", &["postgres", "libc.so.6", "libpq.so.5"]),
    ("firefox", &["firefox", "libxul.so", "libc.so.6"]),
    ("game.exe", &["game.exe", "UnityPlayer.dll", "GameAssembly.dll", "EasyAntiCheat.dll"]),
    ("sim.exe", &["sim.exe", "UnityPlayer.dll", "mono-2.0-bdwgc.dll"]),
    ("shooter.exe", &["shooter.exe", "Shooter-UE5-Win64.dll", "BEClient_x64.dll", "BEDaisy.sys"]),
    ("packed.exe", &["packed.exe", "themida.dll"]),
];

fn random_process(rng: &mut impl Rng, pid: u32, name: &str, modules: &[&str]) -> ProcessRecord {
    let mut record = ProcessRecord::partial(pid, name, rng.gen_range(1..64));

    // Roughly one in eight processes is owned by someone else
    if rng.gen_ratio(1, 8) {
        return record;
    }

    record.access = Access::Full;
    record.full_path = format!("/usr/bin/{}", name);
    record.memory_usage_bytes = rng.gen_range(2 * MB..4096 * MB);
    record.architecture = *[Architecture::X64, Architecture::X64, Architecture::X86, Architecture::Arm64]
        .choose(rng)
        .unwrap_or(&Architecture::X64);
    record.is_elevated = rng.gen_ratio(1, 5);
    record.modules = modules.iter().map(|m| m.to_string()).collect();
    record.image_base = 0x5555_0000_0000 + u64::from(pid) * 0x1000_0000;
    record.entry_point = record.image_base + rng.gen_range(0x1000..0x20000);
    record.start_time = Some(Utc::now() - ChronoDuration::seconds(rng.gen_range(1..86_400)));
    record
}

/// Generates synthetic test data JSON file for testing purposes.
pub fn command_generate_testdata(output: PathBuf, count: usize, with_system: bool) -> anyhow::Result<()> {
    debug!(
        "Generating test data: count={}, with_system={}, output={}",
        count,
        with_system,
        output.display()
    );

    let processes = generate_processes(&mut rand::thread_rng(), count, with_system);
    let test_data = TestData::new(processes);

    let json_content = serde_json::to_string_pretty(&test_data)?;
    fs::write(&output, &json_content)?;

    println!(
        "✅ Generated test data: {} processes in {}",
        test_data.processes.len(),
        output.display()
    );

    Ok(())
}

fn generate_processes(rng: &mut impl Rng, count: usize, with_system: bool) -> Vec<ProcessRecord> {
    let mut processes = Vec::with_capacity(count + SYSTEM_PROCESSES.len());

    if with_system {
        for (name, pid) in SYSTEM_PROCESSES {
            let mut record = ProcessRecord::partial(*pid, *name, rng.gen_range(1..200));
            record.memory_usage_bytes = rng.gen_range(MB..512 * MB);
            processes.push(record);
        }
    }

    let mut pid: u32 = 2000;
    for i in 0..count {
        let (name, modules) = PROFILES[i % PROFILES.len()];
        processes.push(random_process(rng, pid, name, modules));
        pid += rng.gen_range(1..40);
    }

    processes
}

#[cfg(test)]
mod tests {
    use super::*;
    use herakles_process_explorer::{build_snapshot, BuildOptions, FixtureSource, SignatureSet};
    use tempfile::tempdir;

    #[test]
    fn test_generated_file_loads_as_fixture() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("testdata.json");
        command_generate_testdata(path.clone(), 16, true).unwrap();

        let source = FixtureSource::from_file(&path).unwrap();
        assert_eq!(source.records().len(), 16 + SYSTEM_PROCESSES.len());

        let snap = build_snapshot(&source, SignatureSet::builtin(), &BuildOptions::default());
        assert_eq!(snap.len(), 16 + SYSTEM_PROCESSES.len());
        // system processes are all sentinels and sort last
        let tail = &snap.records()[16..];
        assert!(tail.iter().all(|r| r.architecture.is_sentinel()));
    }

    #[test]
    fn test_generated_pids_are_unique() {
        let processes = generate_processes(&mut rand::thread_rng(), 64, true);
        let mut pids: Vec<u32> = processes.iter().map(|p| p.pid).collect();
        pids.sort_unstable();
        pids.dedup();
        assert_eq!(pids.len(), processes.len());
    }
}
