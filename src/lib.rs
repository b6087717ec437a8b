pub mod bracket_utils;
pub mod config;
pub mod test_parser;
pub mod test_scanner;

include!(concat!(env!("OUT_DIR"), "/parser_rules.rs"));

pub use config::ParserConfig;
pub use test_parser::{ParseResult, SourceParser, TestFileParser};
pub use test_scanner::TestScanner;
