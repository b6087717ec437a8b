//! Recovers the `describe` / `it` / hook hierarchy of a test file.
//!
//! Block extents come from brace balance, not from a grammar, so string
//! literals or regexes containing unbalanced braces will skew the result.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::bracket_utils::find_block_end;

/// Lifecycle hook keywords, in the order they are reported.
pub const HOOK_KEYWORDS: &[&str] = &["beforeEach", "afterEach", "beforeAll", "afterAll"];

/// Kind of test block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    Describe,
    It,
    BeforeEach,
    AfterEach,
    BeforeAll,
    AfterAll,
}

impl BlockKind {
    pub fn from_hook_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "beforeEach" => Some(BlockKind::BeforeEach),
            "afterEach" => Some(BlockKind::AfterEach),
            "beforeAll" => Some(BlockKind::BeforeAll),
            "afterAll" => Some(BlockKind::AfterAll),
            _ => None,
        }
    }

    pub fn is_hook(&self) -> bool {
        matches!(
            self,
            BlockKind::BeforeEach | BlockKind::AfterEach | BlockKind::BeforeAll | BlockKind::AfterAll
        )
    }
}

/// Per-kind annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BlockMetadata {
    #[serde(rename_all = "camelCase")]
    Describe {
        /// Leading whitespace characters on the start line
        indentation: usize,
        /// Indented describes are categories; a column-0 describe is the suite
        is_nested: bool,
    },
    #[serde(rename_all = "camelCase")]
    It {
        /// Occurrences of `expect(`
        assertion_count: usize,
        is_async: bool,
        line_count: usize,
    },
    Hook,
}

/// A node in the recovered test hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestBlock {
    pub kind: BlockKind,
    /// Quoted title for describe/it, the keyword itself for hooks
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub content: String,
    /// Only describes have children
    pub children: Vec<TestBlock>,
    pub metadata: BlockMetadata,
}

impl TestBlock {
    pub fn is_nested_category(&self) -> bool {
        matches!(self.metadata, BlockMetadata::Describe { is_nested: true, .. })
    }

    pub fn assertion_count(&self) -> usize {
        match self.metadata {
            BlockMetadata::It { assertion_count, .. } => assertion_count,
            _ => 0,
        }
    }

    /// Depth-first, pre-order traversal of this block and its descendants.
    pub fn walk(&self) -> BlockWalk<'_> {
        BlockWalk { stack: vec![self] }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count_nodes(&self) -> usize {
        self.walk().count()
    }
}

/// Pre-order iterator over a block tree, driven by an explicit stack.
pub struct BlockWalk<'a> {
    stack: Vec<&'a TestBlock>,
}

impl<'a> Iterator for BlockWalk<'a> {
    type Item = &'a TestBlock;

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.stack.pop()?;
        self.stack.extend(block.children.iter().rev());
        Some(block)
    }
}

/// An open describe whose children are still being discovered.
struct Frame {
    block: TestBlock,
    cursor: usize,
}

/// Parser for test structure (describe/it blocks).
#[derive(Debug)]
pub struct StructureParser {
    describe_re: Regex,
    it_re: Regex,
    hook_re: Regex,
}

impl StructureParser {
    pub fn new() -> Self {
        Self {
            // describe('Name', () => {
            describe_re: Regex::new(r#"describe\(['"](.+?)['"]\s*,"#).unwrap(),
            // it("does something", async () => {
            it_re: Regex::new(r#"it\(['"](.+?)['"]\s*,"#).unwrap(),
            hook_re: Regex::new(r"(beforeEach|afterEach|beforeAll|afterAll)\(").unwrap(),
        }
    }

    /// Parse the top-level blocks of a file. Blank and `//` lines are skipped;
    /// a line that fails one block pattern is tried against the next.
    pub fn parse_structure(&self, lines: &[&str]) -> Vec<TestBlock> {
        let mut blocks = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i].trim();

            if line.is_empty() || line.starts_with("//") {
                i += 1;
                continue;
            }

            let mut block = None;
            if line.contains("describe(") {
                block = self.parse_describe_block(lines, i);
            }
            if block.is_none() && line.contains("it(") {
                block = self.parse_it_block(lines, i);
            }
            if block.is_none() && contains_hook(line) {
                block = self.parse_hook(lines, i);
            }

            match block {
                Some(b) => {
                    i = b.end_line + 1;
                    blocks.push(b);
                }
                None => i += 1,
            }
        }

        blocks
    }

    /// Parse a describe block and all of its descendants.
    ///
    /// Children are discovered from `start + 1` up to (not including) the
    /// parent's end line; each child moves the cursor past its own end line.
    /// Nested describes are tracked on an explicit stack so deeply nested
    /// input cannot exhaust the call stack.
    pub fn parse_describe_block(&self, lines: &[&str], start: usize) -> Option<TestBlock> {
        let root = self.describe_header(lines, start)?;
        let mut stack = vec![Frame { cursor: root.start_line + 1, block: root }];

        while let Some(mut frame) = stack.pop() {
            if frame.cursor >= frame.block.end_line {
                match stack.last_mut() {
                    Some(parent) => {
                        parent.cursor = frame.block.end_line + 1;
                        parent.block.children.push(frame.block);
                    }
                    None => return Some(frame.block),
                }
                continue;
            }

            let cursor = frame.cursor;
            let line = lines[cursor].trim();

            if line.contains("describe(") {
                if let Some(child) = self.describe_header(lines, cursor) {
                    stack.push(frame);
                    stack.push(Frame { cursor: child.start_line + 1, block: child });
                    continue;
                }
                frame.cursor += 1;
            } else {
                let child = if line.contains("it(") {
                    self.parse_it_block(lines, cursor)
                } else if contains_hook(line) {
                    self.parse_hook(lines, cursor)
                } else {
                    None
                };

                match child {
                    Some(child) => {
                        frame.cursor = child.end_line + 1;
                        frame.block.children.push(child);
                    }
                    None => frame.cursor += 1,
                }
            }

            stack.push(frame);
        }

        None
    }

    /// Describe block without children.
    fn describe_header(&self, lines: &[&str], start: usize) -> Option<TestBlock> {
        let line = *lines.get(start)?;
        let name = self.describe_re.captures(line)?.get(1)?.as_str().to_string();
        let end = find_block_end(lines, start);
        let indentation = line.chars().take_while(|c| c.is_whitespace()).count();

        Some(TestBlock {
            kind: BlockKind::Describe,
            name,
            start_line: start,
            end_line: end,
            content: lines[start..=end].join("\n"),
            children: Vec::new(),
            metadata: BlockMetadata::Describe {
                indentation,
                is_nested: indentation > 0,
            },
        })
    }

    /// Parse an it (test case) block.
    pub fn parse_it_block(&self, lines: &[&str], start: usize) -> Option<TestBlock> {
        let line = *lines.get(start)?;
        let name = self.it_re.captures(line)?.get(1)?.as_str().to_string();
        let end = find_block_end(lines, start);
        let content = lines[start..=end].join("\n");

        let assertion_count = content.matches("expect(").count();
        let is_async = line.contains("async") || content.contains("await");

        Some(TestBlock {
            kind: BlockKind::It,
            name,
            start_line: start,
            end_line: end,
            content,
            children: Vec::new(),
            metadata: BlockMetadata::It {
                assertion_count,
                is_async,
                line_count: end - start + 1,
            },
        })
    }

    /// Parse a setup/teardown hook.
    pub fn parse_hook(&self, lines: &[&str], start: usize) -> Option<TestBlock> {
        let line = *lines.get(start)?;
        let keyword = self.hook_re.captures(line)?.get(1)?.as_str();
        let kind = BlockKind::from_hook_keyword(keyword)?;
        let end = find_block_end(lines, start);

        Some(TestBlock {
            kind,
            name: keyword.to_string(),
            start_line: start,
            end_line: end,
            content: lines[start..=end].join("\n"),
            children: Vec::new(),
            metadata: BlockMetadata::Hook,
        })
    }
}

impl Default for StructureParser {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_hook(line: &str) -> bool {
    HOOK_KEYWORDS.iter().any(|hook| line.contains(hook))
}

/// Names of indented (category) describes, depth-first in source order.
pub fn extract_categories(blocks: &[TestBlock]) -> Vec<String> {
    blocks
        .iter()
        .flat_map(TestBlock::walk)
        .filter(|b| b.kind == BlockKind::Describe && b.is_nested_category())
        .map(|b| b.name.clone())
        .collect()
}

/// Names of every `it` block, depth-first in source order.
pub fn extract_test_cases(blocks: &[TestBlock]) -> Vec<String> {
    blocks
        .iter()
        .flat_map(TestBlock::walk)
        .filter(|b| b.kind == BlockKind::It)
        .map(|b| b.name.clone())
        .collect()
}
