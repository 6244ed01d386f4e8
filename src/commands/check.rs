//! Check command implementation.
//!
//! Validates procfs access, privileges and configuration.

use herakles_process_explorer::process::{enumerate_processes, inspect_process, InspectOptions};
use herakles_process_explorer::Access;
use nix::unistd::geteuid;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::commands::load_signatures;
use crate::config::{validate_effective_config, Config};

/// Runs the requested checks. Returns whether all of them passed.
pub fn command_check(proc: bool, privileges: bool, all: bool, config: &Config) -> anyhow::Result<bool> {
    println!("🔍 Herakles Process Explorer - System Check");
    println!("===========================================");

    let opts = config.procfs_options();
    let mut all_ok = true;

    if proc || all {
        all_ok &= check_proc(&opts.root, opts.max_modules);
    }

    if privileges || all {
        check_privileges(&opts.root);
    }

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📊 Checking signatures...");
    match load_signatures(config) {
        Ok(set) => println!(
            "   ✅ {} engine and {} protection rules loaded",
            set.engines.len(),
            set.protections.len()
        ),
        Err(e) => {
            println!("   ❌ {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
    } else {
        println!("   ❌ Some checks failed - please review warnings");
    }
    Ok(all_ok)
}

fn check_proc(root: &Path, max_modules: usize) -> bool {
    println!("\n📁 Checking {} filesystem...", root.display());
    if !root.exists() {
        println!("   ❌ {} not found", root.display());
        return false;
    }
    println!("   ✅ {} accessible", root.display());

    let entries: Vec<_> = enumerate_processes(root, Some(5)).collect();
    if entries.is_empty() {
        println!("   ❌ Cannot read any process entries");
        return false;
    }
    println!("   ✅ Can read {} process entries", entries.len());

    // Own process is always inspectable when procfs works at all
    let own = enumerate_processes(root, None).find(|e| e.pid == std::process::id());
    match own {
        Some(entry) => {
            let opts = InspectOptions {
                max_modules,
                boot_time: None,
            };
            let record = inspect_process(&entry, &opts);
            if record.access == Access::Full {
                println!(
                    "   ✅ Self-inspection: {} ({} modules)",
                    record.architecture,
                    record.modules.len()
                );
            } else {
                println!("   ❌ Self-inspection returned a partial record");
                return false;
            }
        }
        None => println!("   ⚠️  Own process not visible under {}", root.display()),
    }
    true
}

fn check_privileges(root: &Path) {
    println!("\n🔐 Checking privileges...");
    if geteuid().is_root() {
        println!("   ✅ Running as root (uid=0)");
    } else {
        println!("   ⚠️  Not running as root - other users' processes will be partial records");
    }

    let init_exe = root.join("1").join("exe");
    match fs::read_link(&init_exe) {
        Ok(_) => println!("   ✅ Can query pid 1 ({})", init_exe.display()),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            println!("   ⚠️  Cannot query pid 1 - insufficient permissions");
            println!("      Grant capabilities: setcap cap_sys_ptrace,cap_dac_read_search+ep /path/to/binary");
        }
        Err(e) => println!("   ⚠️  Could not test pid 1 access: {}", e),
    }
}
