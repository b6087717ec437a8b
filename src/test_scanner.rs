use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::ParserConfig;
use crate::test_parser::{ParseResult, SourceParser, TestFileParser};

/// Result of scanning a directory tree for test files
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanResult {
    /// Root directory that was scanned
    pub root: PathBuf,
    /// Test files found, relative to root, sorted
    pub files: Vec<PathBuf>,
    /// Errors encountered during scanning (non-fatal)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub scan_errors: Vec<ScanError>,
}

/// Error encountered during tree scanning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanError {
    /// Path where error occurred
    pub path: String,
    /// Error message
    pub message: String,
}

/// Parse output for one discovered file
#[derive(Debug, Serialize, Deserialize)]
pub struct FileReport {
    /// Path relative to root
    pub path: PathBuf,
    pub line_count: usize,
    pub result: ParseResult,
}

/// A discovered file that could not be parsed
#[derive(Debug, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Totals across all parsed files
#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub file_count: usize,
    pub test_case_count: usize,
    pub category_count: usize,
    pub mock_count: usize,
    /// Every block node in every tree, nested ones included
    pub block_count: usize,
}

/// Result of parsing every test file under a root
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanReport {
    pub root: PathBuf,
    pub analyzed_at: String,
    pub summary: ScanSummary,
    pub files: Vec<FileReport>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub skipped: Vec<SkippedFile>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub scan_errors: Vec<ScanError>,
}

pub struct TestScanner {
    parser: TestFileParser,
    excluded_dirs: HashSet<String>,
}

impl TestScanner {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            excluded_dirs: config.excluded_dirs.iter().cloned().collect(),
            parser: TestFileParser::with_config(config.clone()),
        }
    }

    /// Find test files under `root`, pruning excluded directories.
    pub fn scan(&self, root: &Path) -> ScanResult {
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let mut files = Vec::new();
        let mut scan_errors = Vec::new();

        // Prune excluded directories during traversal; never prune the root itself.
        let walker = WalkDir::new(&root).into_iter()
            .filter_entry(|e| {
                if e.depth() > 0 && e.file_type().is_dir() {
                    return !e.file_name()
                        .to_str()
                        .map(|n| self.excluded_dirs.contains(n))
                        .unwrap_or(false);
                }
                true
            });

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    let path = e.path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "<unknown>".to_string());
                    warn!("Failed to read directory entry {}: {}", path, e);
                    scan_errors.push(ScanError {
                        path,
                        message: format!("Failed to read directory entry: {}", e),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if self.parser.can_parse(&path.to_string_lossy()) {
                files.push(make_relative(&root, path));
            }
        }

        files.sort();
        debug!("Found {} test files under {}", files.len(), root.display());

        ScanResult {
            root,
            files,
            scan_errors,
        }
    }

    /// Scan `root` and parse every test file in parallel.
    ///
    /// Files that cannot be read as UTF-8 text are reported in `skipped`;
    /// they never abort the batch.
    pub fn parse_all(&self, root: &Path) -> ScanReport {
        let scan = self.scan(root);

        let outcomes: Vec<Result<FileReport, SkippedFile>> = scan
            .files
            .par_iter()
            .map(|rel| {
                let full = scan.root.join(rel);
                match self.parser.parse_file(&full) {
                    Ok(parsed) => Ok(FileReport {
                        path: rel.clone(),
                        line_count: parsed.line_count,
                        result: parsed.result,
                    }),
                    Err(e) => {
                        warn!("Skipping {}: {}", rel.display(), e);
                        Err(SkippedFile {
                            path: rel.clone(),
                            reason: e.to_string(),
                        })
                    }
                }
            })
            .collect();

        let mut files = Vec::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(report) => files.push(report),
                Err(skip) => skipped.push(skip),
            }
        }

        let summary = summarize(&files);
        info!(
            "Parsed {} test files ({} test cases, {} skipped)",
            summary.file_count,
            summary.test_case_count,
            skipped.len()
        );

        ScanReport {
            root: scan.root,
            analyzed_at: chrono::Utc::now().to_rfc3339(),
            summary,
            files,
            skipped,
            scan_errors: scan.scan_errors,
        }
    }
}

impl Default for TestScanner {
    fn default() -> Self {
        Self::new(&ParserConfig::default())
    }
}

fn summarize(files: &[FileReport]) -> ScanSummary {
    let mut summary = ScanSummary {
        file_count: files.len(),
        ..Default::default()
    };

    for file in files {
        summary.test_case_count += file.result.test_cases.len();
        summary.category_count += file.result.categories.len();
        summary.mock_count += file.result.mock_data.len();
        summary.block_count += file
            .result
            .raw_data
            .blocks
            .iter()
            .map(|b| b.count_nodes())
            .sum::<usize>();
    }

    summary
}

fn make_relative(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|_| path.to_path_buf())
}
