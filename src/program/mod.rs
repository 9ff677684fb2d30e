//! Program loading and inspection.
//!
//! This module provides:
//! - A loader for the `.ls8` text format (text → bytes)
//! - A disassembler (bytes → readable text)

pub mod loader;
pub mod disasm;

pub use loader::{Program, LoadError, parse_program, load_program};
pub use disasm::disassemble;
