//! `.ls8` program format.
//!
//! A simple text format:
//! - One byte per line, written as an 8-digit binary literal
//! - Everything from `#` to the end of a line is a comment
//! - Blank lines are ignored

use crate::cpu::MEMORY_SIZE;
use std::path::Path;
use std::io::{BufRead, BufReader};
use thiserror::Error;

/// A loaded program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    /// The program bytes, in load order.
    pub bytes: Vec<u8>,
    /// Original source lines (for debugging).
    pub source_lines: Vec<String>,
}

impl Program {
    /// Create a new empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a byte.
    pub fn push(&mut self, byte: u8, source: &str) {
        self.bytes.push(byte);
        self.source_lines.push(source.to_string());
    }

    /// Get the number of bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Parse `.ls8` source text.
pub fn parse_program(source: &str) -> Result<Program, LoadError> {
    let mut program = Program::new();

    for (line_num, line) in source.lines().enumerate() {
        parse_line(&mut program, line, line_num + 1)?;
    }

    Ok(program)
}

/// Load a `.ls8` file from disk.
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Program, LoadError> {
    let file = std::fs::File::open(path.as_ref())
        .map_err(|e| LoadError::IoError(e.to_string()))?;
    let reader = BufReader::new(file);

    let mut program = Program::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| LoadError::IoError(e.to_string()))?;
        parse_line(&mut program, &line, line_num + 1)?;
    }

    log::debug!("read {} bytes from {}", program.len(), path.as_ref().display());
    Ok(program)
}

fn parse_line(program: &mut Program, line: &str, line_num: usize) -> Result<(), LoadError> {
    // Strip the comment, then surrounding whitespace
    let code = line.split('#').next().unwrap_or("").trim();

    if code.is_empty() {
        return Ok(());
    }

    if code.len() != 8 || !code.chars().all(|c| c == '0' || c == '1') {
        return Err(LoadError::ParseError {
            line: line_num,
            message: format!("expected an 8-digit binary literal, found {:?}", code),
        });
    }

    let byte = u8::from_str_radix(code, 2).map_err(|e| LoadError::ParseError {
        line: line_num,
        message: e.to_string(),
    })?;

    if program.len() == MEMORY_SIZE {
        return Err(LoadError::ProgramTooLarge { line: line_num });
    }

    program.push(byte, line.trim());
    Ok(())
}

/// Errors that can occur while loading a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("program exceeds 256 bytes at line {line}")]
    ProgramTooLarge { line: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_comments_and_blanks() {
        let source = "\
# Print the number 8

10000010 # LDI R0,8
00000000
00001000
01000111 # PRN R0
00000000

00000001 # HLT
";
        let program = parse_program(source).unwrap();

        assert_eq!(program.bytes, vec![0x82, 0, 8, 0x47, 0, 0x01]);
        assert_eq!(program.source_lines[0], "10000010 # LDI R0,8");
    }

    #[test]
    fn test_comment_without_space() {
        let program = parse_program("00000001#HLT\n#only a comment\n").unwrap();
        assert_eq!(program.bytes, vec![0x01]);
    }

    #[test]
    fn test_rejects_bad_literals() {
        let err = parse_program("00000001\n0000201\n").unwrap_err();
        assert!(matches!(err, LoadError::ParseError { line: 2, .. }));

        assert!(matches!(
            parse_program("1000000010"),
            Err(LoadError::ParseError { line: 1, .. })
        ));
        assert!(matches!(
            parse_program("LDI R0,8"),
            Err(LoadError::ParseError { line: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_oversized_program() {
        let source = "00000000\n".repeat(MEMORY_SIZE + 1);
        assert_eq!(
            parse_program(&source),
            Err(LoadError::ProgramTooLarge { line: MEMORY_SIZE + 1 })
        );
    }

    #[test]
    fn test_demo_files_parse() {
        let call = parse_program(include_str!("../../demos/call.ls8")).unwrap();
        assert_eq!(call.len(), 30);
        assert_eq!(call.bytes[24], 0b1010_0000);

        let sctest = parse_program(include_str!("../../demos/sctest.ls8")).unwrap();
        assert_eq!(sctest.len(), 63);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_program("/nonexistent/program.ls8").unwrap_err();
        assert!(matches!(err, LoadError::IoError(_)));
    }

    #[test]
    fn test_load_demo_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/print8.ls8");
        let program = load_program(path).unwrap();
        assert_eq!(program.bytes, vec![0x82, 0, 8, 0x47, 0, 0x01]);
    }
}
