//! Utility functions for scanning source text while respecting balanced brackets.
//!
//! The line scanners work on a pre-split line array and report the index of
//! the line that closes a construct. They never fail: unbalanced input
//! degrades to the last line of the array.

/// Find the line where a `{}`-delimited block that begins at `start` closes.
///
/// The block is considered open once the running brace count first becomes
/// positive. The count is checked after each whole line, so a line such as
/// `}); it('next', () => {` keeps the block open.
///
/// # Examples
/// ```
/// use test_split_core::bracket_utils::find_block_end;
///
/// let lines = vec!["describe('A', () => {", "  it('b', () => {});", "});"];
/// assert_eq!(find_block_end(&lines, 0), 2);
/// ```
pub fn find_block_end(lines: &[&str], start: usize) -> usize {
    let mut brace_count: i64 = 0;
    let mut started = false;

    for (i, line) in lines.iter().enumerate().skip(start) {
        for c in line.chars() {
            match c {
                '{' => {
                    brace_count += 1;
                    if brace_count > 0 {
                        started = true;
                    }
                }
                '}' => brace_count -= 1,
                _ => {}
            }
        }

        if started && brace_count == 0 {
            return i;
        }
    }

    lines.len().saturating_sub(1)
}

/// Find the line that terminates a variable declaration starting at `start`.
///
/// Braces, parens and brackets are counted independently. The declaration
/// ends on the first line where all three counts are zero and the line
/// contains a `;`, so `const x = 5;` closes on its own line.
pub fn find_declaration_end(lines: &[&str], start: usize) -> usize {
    let mut brace_count: i64 = 0;
    let mut paren_count: i64 = 0;
    let mut bracket_count: i64 = 0;

    for (i, line) in lines.iter().enumerate().skip(start) {
        for c in line.chars() {
            match c {
                '{' => brace_count += 1,
                '}' => brace_count -= 1,
                '(' => paren_count += 1,
                ')' => paren_count -= 1,
                '[' => bracket_count += 1,
                ']' => bracket_count -= 1,
                _ => {}
            }
        }

        if brace_count == 0 && paren_count == 0 && bracket_count == 0 && line.contains(';') {
            return i;
        }
    }

    lines.len().saturating_sub(1)
}

/// Split a string by a delimiter, but ignore delimiters inside balanced brackets.
/// Supports <>, (), [], {}
///
/// # Examples
/// ```
/// use test_split_core::bracket_utils::split_respecting_brackets;
///
/// let result = split_respecting_brackets("Foo, Bar as Baz, Map<K, V>", ',');
/// assert_eq!(result, vec!["Foo", "Bar as Baz", "Map<K, V>"]);
/// ```
pub fn split_respecting_brackets(s: &str, delimiter: char) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut depth: u32 = 0;

    for c in s.chars() {
        match c {
            '<' | '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            '>' | ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            _ if c == delimiter && depth == 0 => {
                result.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        result.push(current.trim().to_string());
    }

    result
}

/// Find the byte index of a closing bracket that matches the opening bracket at start_byte_idx.
/// Handles nested brackets of the same type.
/// Returns None if no matching bracket is found.
pub fn find_matching_bracket(s: &str, start_byte_idx: usize, open: char, close: char) -> Option<usize> {
    let mut chars_iter = s.get(start_byte_idx..)?.char_indices();
    let (_, first_char) = chars_iter.next()?;
    if first_char != open {
        return None;
    }
    let mut depth: u32 = 1;
    for (offset, c) in chars_iter {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(start_byte_idx + offset);
            }
        }
    }
    None
}
