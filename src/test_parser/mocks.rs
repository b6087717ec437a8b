//! Mock and fixture declaration extraction.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bracket_utils::find_declaration_end;

/// Shape of a mock declaration, inferred from its source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MockType {
    Function,
    Repository,
    Object,
    Array,
    Primitive,
}

impl MockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MockType::Function => "function",
            MockType::Repository => "repository",
            MockType::Object => "object",
            MockType::Array => "array",
            MockType::Primitive => "primitive",
        }
    }
}

impl fmt::Display for MockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `const` declaration whose name marks it as a test double or canned data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockVariable {
    pub name: String,
    /// Lines `start_line..=end_line` joined with `\n`
    pub content: String,
    pub start_line: usize,
    pub end_line: usize,
    pub mock_type: MockType,
    pub complexity_score: usize,
}

/// Parser for mock data and variables.
#[derive(Debug)]
pub struct MockParser {
    const_re: Regex,
    key_re: Regex,
    affixes: Vec<String>,
}

impl MockParser {
    /// `affixes` are matched case-insensitively against both ends of a name.
    pub fn new<S: AsRef<str>>(affixes: &[S]) -> Self {
        Self {
            // const mockUser = ...   /   const testData: User[] = ...
            const_re: Regex::new(r"^\s*const\s+(\w+)\s*[:=]").unwrap(),
            // key-like tokens: `id:`, `findOne:`
            key_re: Regex::new(r"\w+:").unwrap(),
            affixes: affixes
                .iter()
                .map(|a| a.as_ref().trim().to_lowercase())
                .filter(|a| !a.is_empty())
                .collect(),
        }
    }

    /// Extract mock declarations. Lines inside a captured declaration are
    /// never rescanned; a non-mock `const` only advances one line.
    pub fn parse_mocks(&self, lines: &[&str]) -> Vec<MockVariable> {
        let mut mocks = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let name = self
                .const_re
                .captures(lines[i])
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str());

            if let Some(name) = name {
                if self.is_mock_variable(name) {
                    let end_line = find_declaration_end(lines, i);
                    let content = lines[i..=end_line].join("\n");

                    mocks.push(MockVariable {
                        name: name.to_string(),
                        mock_type: self.infer_mock_type(&content),
                        complexity_score: self.mock_complexity(&content),
                        content,
                        start_line: i,
                        end_line,
                    });

                    i = end_line + 1;
                    continue;
                }
            }

            i += 1;
        }

        mocks
    }

    /// True when the lowercased name starts or ends with a configured affix.
    pub fn is_mock_variable(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.affixes
            .iter()
            .any(|affix| lower.starts_with(affix.as_str()) || lower.ends_with(affix.as_str()))
    }

    /// First matching rule wins: `jest.fn` anywhere, then braces (repository
    /// when the text mentions one), then brackets, else primitive.
    pub fn infer_mock_type(&self, content: &str) -> MockType {
        let lower = content.to_lowercase();

        if lower.contains("jest.fn") {
            MockType::Function
        } else if content.contains('{') && content.contains('}') {
            if lower.contains("repository") {
                MockType::Repository
            } else {
                MockType::Object
            }
        } else if content.contains('[') && content.contains(']') {
            MockType::Array
        } else {
            MockType::Primitive
        }
    }

    /// `{` + `[` + `key:` tokens + `=>` arrows.
    pub fn mock_complexity(&self, content: &str) -> usize {
        content.matches('{').count()
            + content.matches('[').count()
            + self.key_re.find_iter(content).count()
            + content.matches("=>").count()
    }
}
