//! Build script for test-split-core
//!
//! Reads the parser policy tables from YAML (Single Source of Truth) and
//! generates Rust constants at compile time.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Policy tables in parser-rules.yaml
#[derive(Debug, Deserialize)]
struct ParserRules {
    #[allow(dead_code)]
    version: String,
    #[serde(default)]
    mock_affixes: Vec<String>,
    #[serde(default)]
    test_file_suffixes: Vec<String>,
    #[serde(default)]
    excluded_dirs: Vec<String>,
}

fn main() {
    let rules_path = "rules/parser-rules.yaml";

    println!("cargo:rerun-if-changed={}", rules_path);

    let yaml_content = fs::read_to_string(rules_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read parser-rules.yaml at '{}': {}. \
             Make sure the file exists at rules/parser-rules.yaml",
            rules_path, e
        )
    });

    let rules: ParserRules = serde_yaml::from_str(&yaml_content).unwrap_or_else(|e| {
        panic!("Failed to parse parser-rules.yaml: {}", e)
    });

    if rules.mock_affixes.is_empty() || rules.test_file_suffixes.is_empty() {
        panic!("parser-rules.yaml must define mock_affixes and test_file_suffixes");
    }

    let mock_affixes: Vec<&str> = rules.mock_affixes.iter().map(|s| s.as_str()).collect();
    let test_file_suffixes: Vec<&str> = rules.test_file_suffixes.iter().map(|s| s.as_str()).collect();
    let excluded_dirs: Vec<&str> = rules.excluded_dirs.iter().map(|s| s.as_str()).collect();

    let mut code = String::new();
    code.push_str("// Auto-generated by build.rs from parser-rules.yaml\n");
    code.push_str("// DO NOT EDIT MANUALLY - Edit rules/parser-rules.yaml instead\n\n");

    code.push_str(&format!(
        "/// Name prefixes/suffixes that mark a `const` as mock or fixture data\npub const MOCK_AFFIXES: &[&str] = &{:?};\n\n",
        mock_affixes
    ));

    code.push_str(&format!(
        "/// Filename suffixes recognized as TypeScript test files\npub const TEST_FILE_SUFFIXES: &[&str] = &{:?};\n\n",
        test_file_suffixes
    ));

    code.push_str(&format!(
        "/// Directory names skipped while scanning\npub const EXCLUDED_DIRS: &[&str] = &{:?};\n",
        excluded_dirs
    ));

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    let dest_path = Path::new(&out_dir).join("parser_rules.rs");

    fs::write(&dest_path, code).unwrap_or_else(|e| {
        panic!("Failed to write generated code to {:?}: {}", dest_path, e)
    });
}
