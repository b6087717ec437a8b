//! Test file parser for extracting imports, mock data, test hierarchy and
//! complexity metrics from TypeScript test files.
//!
//! Parsing is line-oriented with brace-balance tracking; there is no
//! TypeScript grammar behind it. Every operation is pure and infallible on
//! text input, so one parser can be shared across threads.

mod imports;
mod mocks;
mod structure;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::config::ParserConfig;

pub use imports::{CategorizedImports, ImportCategory, ImportParser, ImportStatement};
pub use mocks::{MockParser, MockType, MockVariable};
pub use structure::{
    extract_categories, extract_test_cases, BlockKind, BlockMetadata, BlockWalk,
    StructureParser, TestBlock, HOOK_KEYWORDS,
};

/// Substrings counted as decision points by the cyclomatic estimate.
pub const DECISION_TOKENS: &[&str] = &["if ", "else ", "switch ", "for ", "while ", "&&", "||"];

/// Errors that can occur when parsing a file from disk.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a TypeScript test file: {0}")]
    UnsupportedFile(String),
}

/// Flattened mock record as exposed to downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockRecord {
    pub name: String,
    pub content: String,
    #[serde(rename = "type")]
    pub mock_type: MockType,
    pub complexity: usize,
    pub start_line: usize,
    pub end_line: usize,
}

impl From<&MockVariable> for MockRecord {
    fn from(mock: &MockVariable) -> Self {
        Self {
            name: mock.name.clone(),
            content: mock.content.clone(),
            mock_type: mock.mock_type,
            complexity: mock.complexity_score,
            start_line: mock.start_line,
            end_line: mock.end_line,
        }
    }
}

/// File-level complexity estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityMetrics {
    /// 1 + decision-token substring count over the whole file text
    pub cyclomatic_complexity: usize,
    /// Deepest leaf below a top-level block (a childless top-level block is 0)
    pub max_nesting_depth: usize,
    /// Length of the top-level block list, not a recursive node count
    pub total_blocks: usize,
}

impl ComplexityMetrics {
    pub fn compute(content: &str, blocks: &[TestBlock]) -> Self {
        Self {
            cyclomatic_complexity: cyclomatic_complexity(content),
            max_nesting_depth: max_nesting_depth(blocks),
            total_blocks: blocks.len(),
        }
    }
}

/// Intermediate extractor output kept for downstream reuse.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParseData {
    pub import_statements: Vec<ImportStatement>,
    pub mock_variables: Vec<MockVariable>,
    pub blocks: Vec<TestBlock>,
}

/// Unified parse output for one test file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    /// Raw import lines, in source order
    pub imports: Vec<String>,
    pub mock_data: Vec<MockRecord>,
    /// Indented describe names, depth-first
    pub categories: Vec<String>,
    /// Every `it` name, depth-first
    pub test_cases: Vec<String>,
    /// Hook keywords of top-level hook blocks only
    pub setup_hooks: Vec<String>,
    pub complexity_metrics: ComplexityMetrics,
    pub raw_data: RawParseData,
}

/// Parse result tagged with the file it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFile {
    pub path: PathBuf,
    pub line_count: usize,
    pub result: ParseResult,
}

/// Interface shared by test-file parsers.
pub trait SourceParser {
    /// Whether the parser handles files with this path.
    fn can_parse(&self, file_path: &str) -> bool;

    /// Parse file content.
    fn parse(&self, content: &str) -> ParseResult;
}

/// Orchestrates the import, mock and structure extractors.
#[derive(Debug)]
pub struct TestFileParser {
    config: ParserConfig,
    import_parser: ImportParser,
    mock_parser: MockParser,
    structure_parser: StructureParser,
}

impl TestFileParser {
    /// Create a parser with the built-in policy tables.
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            mock_parser: MockParser::new(config.mock_affixes.as_slice()),
            import_parser: ImportParser::new(),
            structure_parser: StructureParser::new(),
            config,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn import_parser(&self) -> &ImportParser {
        &self.import_parser
    }

    /// Read and parse a test file.
    pub fn parse_file(&self, path: &Path) -> Result<ParsedFile, ParserError> {
        let path_str = path.to_string_lossy();
        if !self.can_parse(&path_str) {
            return Err(ParserError::UnsupportedFile(path_str.to_string()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| ParserError::FileRead {
            path: path_str.to_string(),
            source,
        })?;

        let result = self.parse(&content);
        debug!(
            "Parsed {}: {} test cases, {} categories, {} mocks",
            path.display(),
            result.test_cases.len(),
            result.categories.len(),
            result.mock_data.len()
        );

        Ok(ParsedFile {
            path: path.to_path_buf(),
            line_count: content.split('\n').count(),
            result,
        })
    }
}

impl SourceParser for TestFileParser {
    fn can_parse(&self, file_path: &str) -> bool {
        self.config
            .test_file_suffixes
            .iter()
            .any(|suffix| file_path.ends_with(suffix.as_str()))
    }

    fn parse(&self, content: &str) -> ParseResult {
        let lines: Vec<&str> = content.split('\n').collect();

        let import_statements = self.import_parser.parse_imports(content);
        let imports = import_statements.iter().map(|s| s.raw.clone()).collect();

        let mock_variables = self.mock_parser.parse_mocks(&lines);
        let mock_data = mock_variables.iter().map(MockRecord::from).collect();

        let blocks = self.structure_parser.parse_structure(&lines);
        let categories = extract_categories(&blocks);
        let test_cases = extract_test_cases(&blocks);
        let setup_hooks = blocks
            .iter()
            .filter(|b| b.kind.is_hook())
            .map(|b| b.name.clone())
            .collect();

        let complexity_metrics = ComplexityMetrics::compute(content, &blocks);

        ParseResult {
            imports,
            mock_data,
            categories,
            test_cases,
            setup_hooks,
            complexity_metrics,
            raw_data: RawParseData {
                import_statements,
                mock_variables,
                blocks,
            },
        }
    }
}

impl Default for TestFileParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Substring-count estimate; `forecast ` does not match `for ` but
/// `platform && x` counts once for `&&`.
pub fn cyclomatic_complexity(content: &str) -> usize {
    1 + DECISION_TOKENS
        .iter()
        .map(|token| content.matches(token).count())
        .sum::<usize>()
}

/// Depth of the deepest leaf, counting each descent into `children` as one.
pub fn max_nesting_depth(blocks: &[TestBlock]) -> usize {
    let mut max_depth = 0;
    let mut stack: Vec<(&TestBlock, usize)> = blocks.iter().map(|b| (b, 0)).collect();

    while let Some((block, depth)) = stack.pop() {
        if block.children.is_empty() {
            max_depth = max_depth.max(depth);
        } else {
            stack.extend(block.children.iter().map(|c| (c, depth + 1)));
        }
    }

    max_depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SIMPLE: &str = "
import { Test } from '@nestjs/testing';
import { UserService } from './user.service';

const mockUser = {
  id: 1,
  name: 'Test User'
};

describe('UserService', () => {
  let service: UserService;

  beforeEach(() => {
    service = new UserService();
  });

  it('should return a user', () => {
    const result = service.findOne(1);
    expect(result).toEqual(mockUser);
  });

  it('should create a user', () => {
    const result = service.create(mockUser);
    expect(result).toBeDefined();
  });
});
";

    const NESTED: &str = "describe('Module', () => {
  describe('Create', () => {
    it('creates an entity', () => {
      if (flag && other) {
        expect(1).toBe(1);
      }
    });
  });
  describe('FindAll', () => {
    it('lists entities', () => {
      expect([]).toEqual([]);
    });
  });
});
";

    #[test]
    fn test_can_parse() {
        let parser = TestFileParser::new();
        assert!(parser.can_parse("test.spec.ts"));
        assert!(parser.can_parse("path/to/test.spec.tsx"));
        assert!(parser.can_parse("test.test.ts"));
        assert!(parser.can_parse("test.test.tsx"));
        assert!(!parser.can_parse("service.ts"));
        assert!(!parser.can_parse("component.tsx"));
        assert!(!parser.can_parse("index.js"));
        assert!(!parser.can_parse("user.SPEC.TS"));
    }

    #[test]
    fn test_simple_file() {
        let parser = TestFileParser::new();
        let result = parser.parse(SIMPLE);

        assert_eq!(result.imports.len(), 2);
        assert!(result.imports[0].contains("@nestjs/testing"));
        assert!(result.categories.is_empty());
        assert_eq!(result.test_cases, vec!["should return a user", "should create a user"]);
        assert_eq!(result.setup_hooks, Vec::<String>::new());
        assert_eq!(result.mock_data.len(), 1);
        assert_eq!(result.mock_data[0].name, "mockUser");
        assert_eq!(result.mock_data[0].mock_type, MockType::Object);
        assert_eq!(result.complexity_metrics.total_blocks, 1);
        assert_eq!(result.complexity_metrics.max_nesting_depth, 1);
    }

    #[test]
    fn test_only_top_level_hooks_are_setup_hooks() {
        let parser = TestFileParser::new();
        let content = "beforeEach(() => {\n  jest.resetAllMocks();\n});\n\ndescribe('Suite', () => {\n  afterEach(() => {\n    cleanup();\n  });\n  it('works', () => {\n    expect(true).toBe(true);\n  });\n});";
        let result = parser.parse(content);

        assert_eq!(result.setup_hooks, vec!["beforeEach"]);
        assert_eq!(result.complexity_metrics.total_blocks, 2);
        let suite = &result.raw_data.blocks[1];
        assert_eq!(suite.children[0].kind, BlockKind::AfterEach);
    }

    #[test]
    fn test_nested_categories() {
        let parser = TestFileParser::new();
        let result = parser.parse(NESTED);

        assert_eq!(result.categories, vec!["Create", "FindAll"]);
        assert_eq!(result.test_cases, vec!["creates an entity", "lists entities"]);
        assert_eq!(result.complexity_metrics.max_nesting_depth, 2);
        assert_eq!(result.complexity_metrics.total_blocks, 1);
        assert_eq!(result.complexity_metrics.cyclomatic_complexity, 3);
    }

    #[test]
    fn test_empty_content() {
        let parser = TestFileParser::new();
        let result = parser.parse("");

        assert!(result.imports.is_empty());
        assert!(result.mock_data.is_empty());
        assert!(result.categories.is_empty());
        assert!(result.test_cases.is_empty());
        assert!(result.setup_hooks.is_empty());
        assert_eq!(
            result.complexity_metrics,
            ComplexityMetrics { cyclomatic_complexity: 1, max_nesting_depth: 0, total_blocks: 0 }
        );
    }

    #[test]
    fn test_parse_is_deterministic() {
        let parser = TestFileParser::new();
        assert_eq!(parser.parse(NESTED), parser.parse(NESTED));
    }

    #[test]
    fn test_cyclomatic_substring_counts() {
        assert_eq!(cyclomatic_complexity(""), 1);
        assert_eq!(cyclomatic_complexity("const forecast = 1;"), 1);
        assert_eq!(cyclomatic_complexity("for (const x of xs) { if (a || b) {} else {} }"), 5);
        assert_eq!(cyclomatic_complexity("a &&&& b"), 3);
    }

    #[test]
    fn test_nesting_depth_childless_blocks() {
        let parser = TestFileParser::new();
        let result = parser.parse("it('a', () => {\n});\nit('b', () => {\n});");
        assert_eq!(result.complexity_metrics.max_nesting_depth, 0);
        assert_eq!(result.complexity_metrics.total_blocks, 2);
    }

    #[test]
    fn test_mock_record_matches_source_lines() {
        let parser = TestFileParser::new();
        let lines: Vec<&str> = SIMPLE.split('\n').collect();
        let result = parser.parse(SIMPLE);

        for mock in &result.mock_data {
            assert_eq!(mock.content, lines[mock.start_line..=mock.end_line].join("\n"));
        }
    }

    #[test]
    fn test_custom_config_changes_mock_detection() {
        let config = ParserConfig {
            mock_affixes: vec!["fake".to_string()],
            ..ParserConfig::default()
        };
        let parser = TestFileParser::with_config(config);
        let result = parser.parse("const fakeUser = { id: 1 };\nconst mockUser = { id: 2 };");

        assert_eq!(result.mock_data.len(), 1);
        assert_eq!(result.mock_data[0].name, "fakeUser");
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let parser = TestFileParser::new();
        let json = serde_json::to_value(parser.parse(SIMPLE)).unwrap();

        assert!(json.get("mockData").is_some());
        assert!(json.get("testCases").is_some());
        assert_eq!(json["mockData"][0]["type"], "object");
        assert_eq!(json["mockData"][0]["startLine"], 4);
        assert_eq!(json["complexityMetrics"]["totalBlocks"], 1);
        assert!(json["rawData"]["blocks"].is_array());
    }

    #[test]
    fn test_parse_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("user.spec.ts");
        fs::write(&path, NESTED).unwrap();

        let parser = TestFileParser::new();
        let parsed = parser.parse_file(&path).unwrap();
        assert_eq!(parsed.path, path);
        assert_eq!(parsed.result.categories, vec!["Create", "FindAll"]);
        assert_eq!(parsed.line_count, NESTED.split('\n').count());
    }

    #[test]
    fn test_parse_file_rejects_non_test_suffix() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("user.service.ts");
        fs::write(&path, "export class UserService {}").unwrap();

        let err = TestFileParser::new().parse_file(&path).unwrap_err();
        assert!(matches!(err, ParserError::UnsupportedFile(_)));
    }

    #[test]
    fn test_parse_file_missing() {
        let err = TestFileParser::new()
            .parse_file(Path::new("/nonexistent/a.spec.ts"))
            .unwrap_err();
        assert!(matches!(err, ParserError::FileRead { .. }));
    }

    #[test]
    fn test_parse_file_invalid_utf8() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.test.ts");
        fs::write(&path, [0xffu8, 0xfe, 0x00, 0x41]).unwrap();

        let err = TestFileParser::new().parse_file(&path).unwrap_err();
        assert!(matches!(err, ParserError::FileRead { .. }));
    }
}
