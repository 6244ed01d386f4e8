//! Signatures command implementation.
//!
//! Lists the classification rules in priority order.

use herakles_process_explorer::process::SignatureRule;

use crate::commands::load_signatures;
use crate::config::Config;

fn print_rules(title: &str, rules: &[SignatureRule], verbose: bool) {
    println!("\n🏷️  {} rules (first match wins)", title);
    println!("{}", "─".repeat(50));
    for (i, rule) in rules.iter().enumerate() {
        if verbose {
            println!("   {:>2}. {}", i + 1, rule.label);
            for pattern in &rule.patterns {
                println!("   │  ├─ 🔍 module contains: {}", pattern);
            }
        } else {
            println!("   {:>2}. {} ({} patterns)", i + 1, rule.label, rule.patterns.len());
        }
    }
}

pub fn command_signatures(verbose: bool, config: &Config) -> anyhow::Result<()> {
    let set = load_signatures(config)?;

    println!("📊 Herakles Process Explorer - Classification Signatures");
    println!("========================================================");
    if let Some(path) = &config.signatures_file {
        println!("Extra rules from: {}", path.display());
    }

    println!("\n🛡️  Kernel processes (exact name): {}", set.kernel_names.join(", "));
    println!("👻 Pseudo processes (exact name): {}", set.pseudo_exact.join(", "));
    println!("👻 Pseudo processes (name contains): {}", set.pseudo_contains.join(", "));

    print_rules("Engine", &set.engines, verbose);
    print_rules("Protection", &set.protections, verbose);

    println!(
        "\n📋 Total: {} engine and {} protection rules",
        set.engines.len(),
        set.protections.len()
    );
    Ok(())
}
