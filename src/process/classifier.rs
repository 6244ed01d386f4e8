//! Heuristic process classification.
//!
//! Classification is a pure function of a process name and its module list.
//! The rules are ordered `(patterns, label)` lists loaded from TOML: the
//! built-in set is embedded from `data/signatures.toml`, and a user file can
//! append more rules after it.
//!
//! All matching is ASCII case-insensitive. Patterns are lowercased once at
//! load time; names are lowercased per call.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

use crate::process::record::{NO_PROTECTION, UNKNOWN_ENGINE};

#[derive(Deserialize, Default)]
struct KernelSection {
    #[serde(default)]
    names: Vec<String>,
}

#[derive(Deserialize, Default)]
struct PseudoSection {
    #[serde(default)]
    exact: Vec<String>,
    #[serde(default)]
    contains: Vec<String>,
}

#[derive(Deserialize)]
struct RuleDef {
    label: String,
    patterns: Vec<String>,
}

/// Root structure for a signatures TOML file.
#[derive(Deserialize)]
struct SignaturesFile {
    #[serde(default)]
    kernel: KernelSection,
    #[serde(default)]
    pseudo: PseudoSection,
    #[serde(default)]
    engine: Vec<RuleDef>,
    #[serde(default)]
    protection: Vec<RuleDef>,
}

/// A label and the module-name substrings that select it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRule {
    pub label: String,
    /// Lowercased.
    pub patterns: Vec<String>,
}

impl SignatureRule {
    pub fn new(label: impl Into<String>, patterns: &[&str]) -> Self {
        Self {
            label: label.into(),
            patterns: patterns.iter().map(|p| p.to_ascii_lowercase()).collect(),
        }
    }

    fn matches_any(&self, lowered_modules: &[String]) -> bool {
        self.patterns
            .iter()
            .any(|p| lowered_modules.iter().any(|m| m.contains(p.as_str())))
    }
}

impl From<RuleDef> for SignatureRule {
    fn from(def: RuleDef) -> Self {
        Self {
            label: def.label,
            patterns: def.patterns.iter().map(|p| p.to_ascii_lowercase()).collect(),
        }
    }
}

/// Result of classifying one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub is_kernel: bool,
    pub is_pseudo: bool,
    pub engine: String,
    pub protection: String,
}

/// Ordered rule set used by the classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureSet {
    pub kernel_names: Vec<String>,
    pub pseudo_exact: Vec<String>,
    pub pseudo_contains: Vec<String>,
    pub engines: Vec<SignatureRule>,
    pub protections: Vec<SignatureRule>,
}

fn lowered(v: Vec<String>) -> Vec<String> {
    v.into_iter().map(|s| s.to_ascii_lowercase()).collect()
}

impl SignatureSet {
    /// Parses a signatures TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let parsed: SignaturesFile = toml::from_str(content)?;
        Ok(Self {
            kernel_names: lowered(parsed.kernel.names),
            pseudo_exact: lowered(parsed.pseudo.exact),
            pseudo_contains: lowered(parsed.pseudo.contains),
            engines: parsed.engine.into_iter().map(SignatureRule::from).collect(),
            protections: parsed.protection.into_iter().map(SignatureRule::from).collect(),
        })
    }

    /// The embedded default rules.
    pub fn builtin() -> &'static SignatureSet {
        &BUILTIN_SIGNATURES
    }

    /// Appends another set's rules after this one's, so existing rules keep
    /// their priority.
    pub fn extend(&mut self, other: SignatureSet) {
        self.kernel_names.extend(other.kernel_names);
        self.pseudo_exact.extend(other.pseudo_exact);
        self.pseudo_contains.extend(other.pseudo_contains);
        self.engines.extend(other.engines);
        self.protections.extend(other.protections);
    }

    /// Built-in rules plus the rules of an optional user file.
    pub fn load_with_overrides(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut set = Self::builtin().clone();
        if let Some(path) = path {
            let content = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read signatures file {}: {}", path.display(), e))?;
            let extra = Self::from_toml_str(&content)
                .map_err(|e| format!("Failed to parse signatures file {}: {}", path.display(), e))?;
            info!(
                "Loaded {} engine and {} protection rules from {}",
                extra.engines.len(),
                extra.protections.len(),
                path.display()
            );
            set.extend(extra);
        }
        Ok(set)
    }

    pub fn is_kernel_name(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.kernel_names.iter().any(|k| *k == name)
    }

    pub fn is_pseudo_name(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.pseudo_exact.iter().any(|p| *p == name)
            || self.pseudo_contains.iter().any(|p| name.contains(p.as_str()))
    }

    /// Classifies a process. Pure: no I/O, same input gives same output.
    pub fn classify<S: AsRef<str>>(&self, name: &str, modules: &[S]) -> Classification {
        let lowered_modules: Vec<String> = modules
            .iter()
            .map(|m| m.as_ref().to_ascii_lowercase())
            .collect();

        let first_match = |rules: &[SignatureRule], default: &str| {
            rules
                .iter()
                .find(|r| r.matches_any(&lowered_modules))
                .map(|r| r.label.clone())
                .unwrap_or_else(|| default.to_string())
        };

        Classification {
            is_kernel: self.is_kernel_name(name),
            is_pseudo: self.is_pseudo_name(name),
            engine: first_match(&self.engines, UNKNOWN_ENGINE),
            protection: first_match(&self.protections, NO_PROTECTION),
        }
    }
}

/// Built-in signatures embedded at compile time.
static BUILTIN_SIGNATURES: Lazy<SignatureSet> = Lazy::new(|| {
    let content = include_str!("../../data/signatures.toml");
    match SignatureSet::from_toml_str(content) {
        Ok(set) => set,
        Err(e) => {
            error!("Failed to parse built-in signatures: {}", e);
            SignatureSet::default()
        }
    }
});

/// Classifies with the built-in signatures.
pub fn classify_process<S: AsRef<str>>(name: &str, modules: &[S]) -> Classification {
    SignatureSet::builtin().classify(name, modules)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_MODULES: &[&str] = &[];

    // -------------------------------------------------------------------------
    // Kernel / pseudo sets
    // -------------------------------------------------------------------------

    #[test]
    fn test_builtin_signatures_parse() {
        let set = SignatureSet::builtin();
        assert_eq!(set.kernel_names.len(), 4);
        assert!(!set.engines.is_empty());
        assert!(!set.protections.is_empty());
    }

    #[test]
    fn test_kernel_names_exact_case_insensitive() {
        assert!(classify_process("lsass.exe", NO_MODULES).is_kernel);
        assert!(classify_process("LSASS.EXE", NO_MODULES).is_kernel);
        assert!(classify_process("Csrss.exe", NO_MODULES).is_kernel);
        // exact match only
        assert!(!classify_process("lsass.exe.bak", NO_MODULES).is_kernel);
        assert!(!classify_process("notepad.exe", NO_MODULES).is_kernel);
    }

    #[test]
    fn test_pseudo_names() {
        assert!(classify_process("System", NO_MODULES).is_pseudo);
        assert!(classify_process("Registry", NO_MODULES).is_pseudo);
        assert!(classify_process("Memory Compression", NO_MODULES).is_pseudo);
        assert!(classify_process("svchost.exe", NO_MODULES).is_pseudo);
        assert!(classify_process("System Idle Process", NO_MODULES).is_pseudo);
        assert!(classify_process("smss.exe", NO_MODULES).is_pseudo);
        // "system" is exact, not substring
        assert!(!classify_process("systemd", NO_MODULES).is_pseudo);
        assert!(!classify_process("chrome.exe", NO_MODULES).is_pseudo);
    }

    // -------------------------------------------------------------------------
    // Engine / protection rules
    // -------------------------------------------------------------------------

    #[test]
    fn test_engine_il2cpp() {
        let c = classify_process("game.exe", &["game.exe", "GameAssembly.dll"]);
        assert_eq!(c.engine, "Unity (IL2CPP)");
        assert_eq!(c.protection, "None");
    }

    #[test]
    fn test_engine_and_protection_together() {
        let c = classify_process("game.exe", &["UnityPlayer.dll", "EasyAntiCheat.exe"]);
        assert_eq!(c.engine, "Unity");
        assert_eq!(c.protection, "EAC");
    }

    #[test]
    fn test_first_rule_wins_regardless_of_module_order() {
        // IL2CPP outranks plain Unity even when UnityPlayer loads first
        let c = classify_process("game.exe", &["UnityPlayer.dll", "GameAssembly.dll"]);
        assert_eq!(c.engine, "Unity (IL2CPP)");

        let c = classify_process("game.exe", &["BEDaisy.sys", "themida.dll"]);
        assert_eq!(c.protection, "BattlEye");
    }

    #[test]
    fn test_unreal_and_mono() {
        assert_eq!(
            classify_process("shooter", &["ShooterGame-UE5-Win64.dll"]).engine,
            "Unreal Engine"
        );
        assert_eq!(
            classify_process("sim", &["UnityPlayer.dll", "mono-2.0-bdwgc.dll"]).engine,
            "Unity (Mono)"
        );
    }

    #[test]
    fn test_short_eac_module_names() {
        assert_eq!(classify_process("game", &["EAC_x64.dll"]).protection, "EAC");
        assert_eq!(classify_process("game", &["libeac64.so"]).protection, "EAC");
        // a bare "eac" inside an unrelated name is not enough
        assert_eq!(classify_process("game", &["libpeach.so", "beacon.dll"]).protection, "None");
    }

    #[test]
    fn test_no_match_defaults() {
        let c = classify_process("bash", &["bash", "libc.so.6"]);
        assert_eq!(c.engine, "Unknown");
        assert_eq!(c.protection, "None");
        assert!(!c.is_kernel);
        assert!(!c.is_pseudo);
    }

    #[test]
    fn test_classify_is_pure() {
        let modules = vec!["UnityPlayer.dll".to_string(), "VMProtectSDK64.dll".to_string()];
        let first = classify_process("app.exe", &modules);
        let second = classify_process("app.exe", &modules);
        assert_eq!(first, second);
        assert_eq!(first.protection, "VMProtect");
    }

    // -------------------------------------------------------------------------
    // Custom rule sets
    // -------------------------------------------------------------------------

    #[test]
    fn test_extend_appends_with_lower_priority() {
        let extra = SignatureSet::from_toml_str(
            r#"
            [[engine]]
            label = "Godot"
            patterns = ["libgodot"]

            [[engine]]
            label = "Shadowed"
            patterns = ["UnityPlayer"]
            "#,
        )
        .unwrap();

        let mut set = SignatureSet::builtin().clone();
        set.extend(extra);

        assert_eq!(set.classify("g", &["libgodot.so"]).engine, "Godot");
        // built-in Unity rule still comes first
        assert_eq!(set.classify("u", &["UnityPlayer.so"]).engine, "Unity");
    }

    #[test]
    fn test_from_toml_str_rejects_invalid() {
        assert!(SignatureSet::from_toml_str("[[engine]]\nlabel = 3").is_err());
    }

    #[test]
    fn test_load_with_overrides_missing_file() {
        let missing = Path::new("/nonexistent/herakles-signatures.toml");
        assert!(SignatureSet::load_with_overrides(Some(missing)).is_err());
        assert_eq!(
            &SignatureSet::load_with_overrides(None).unwrap(),
            SignatureSet::builtin()
        );
    }
}
