//! Import statement extraction.
//!
//! Imports are matched one physical line at a time. A statement split across
//! several lines (`import {\n  A,\n} from 'x'`) is not recognized.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::bracket_utils::{find_matching_bracket, split_respecting_brackets};

/// A single-line import statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStatement {
    /// The trimmed source line
    pub raw: String,
    /// Text between `import` and `from`, e.g. `{ Foo, Bar }` or `type { Baz }`
    pub imports_clause: String,
    /// Module path without quotes
    pub source: String,
    /// True when the clause contains `type` anywhere (including inside names)
    pub is_type_import: bool,
    /// 0-based line index
    pub line_number: usize,
}

/// Bucket an import falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportCategory {
    Types,
    Internal,
    TestUtils,
    External,
}

impl ImportCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportCategory::Types => "types",
            ImportCategory::Internal => "internal",
            ImportCategory::TestUtils => "test_utils",
            ImportCategory::External => "external",
        }
    }
}

/// Imports grouped by category, each group in source order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategorizedImports {
    pub internal: Vec<ImportStatement>,
    pub external: Vec<ImportStatement>,
    pub test_utils: Vec<ImportStatement>,
    pub types: Vec<ImportStatement>,
}

impl CategorizedImports {
    pub fn get(&self, category: ImportCategory) -> &[ImportStatement] {
        match category {
            ImportCategory::Types => &self.types,
            ImportCategory::Internal => &self.internal,
            ImportCategory::TestUtils => &self.test_utils,
            ImportCategory::External => &self.external,
        }
    }

    fn bucket_mut(&mut self, category: ImportCategory) -> &mut Vec<ImportStatement> {
        match category {
            ImportCategory::Types => &mut self.types,
            ImportCategory::Internal => &mut self.internal,
            ImportCategory::TestUtils => &mut self.test_utils,
            ImportCategory::External => &mut self.external,
        }
    }
}

/// Parser for TypeScript import statements.
#[derive(Debug)]
pub struct ImportParser {
    import_re: Regex,
}

impl ImportParser {
    pub fn new() -> Self {
        Self {
            // import { A, B } from './module'
            // import type { C } from "pkg"
            import_re: Regex::new(r#"^import\s+(.+?)\s+from\s+['"](.+?)['"]"#).unwrap(),
        }
    }

    /// Extract all single-line import statements.
    pub fn parse_imports(&self, content: &str) -> Vec<ImportStatement> {
        let mut imports = Vec::new();

        for (i, line) in content.split('\n').enumerate() {
            let trimmed = line.trim();
            if let Some(caps) = self.import_re.captures(trimmed) {
                let clause = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                let source = caps.get(2).map(|m| m.as_str()).unwrap_or("");
                imports.push(ImportStatement {
                    raw: trimmed.to_string(),
                    imports_clause: clause.to_string(),
                    source: source.to_string(),
                    is_type_import: clause.contains("type"),
                    line_number: i,
                });
            }
        }

        imports
    }

    /// Names brought into scope by an import, with `as` aliases resolved to
    /// the original name. A clause without braces is a single default import.
    pub fn extract_imported_names(&self, import: &ImportStatement) -> Vec<String> {
        let clause = import.imports_clause.as_str();

        let Some(open) = clause.find('{') else {
            return vec![clause.trim().to_string()];
        };

        let inner = match find_matching_bracket(clause, open, '{', '}') {
            Some(close) => &clause[open + 1..close],
            None => return Vec::new(),
        };

        split_respecting_brackets(inner, ',')
            .into_iter()
            .map(|name| match name.split_once(" as ") {
                Some((original, _alias)) => original.trim().to_string(),
                None => name.trim().to_string(),
            })
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Classify one import. Precedence: type-only, relative path,
    /// test/mock helper package, everything else.
    pub fn categorize(&self, import: &ImportStatement) -> ImportCategory {
        if import.is_type_import {
            ImportCategory::Types
        } else if import.source.starts_with('.') {
            ImportCategory::Internal
        } else if import.source.contains("test") || import.source.contains("mock") {
            ImportCategory::TestUtils
        } else {
            ImportCategory::External
        }
    }

    pub fn categorize_imports(&self, imports: &[ImportStatement]) -> CategorizedImports {
        let mut categorized = CategorizedImports::default();
        for import in imports {
            categorized.bucket_mut(self.categorize(import)).push(import.clone());
        }
        categorized
    }
}

impl Default for ImportParser {
    fn default() -> Self {
        Self::new()
    }
}
