//! # LS-8 Emulator
//!
//! An emulator for the LS-8, a small 8-bit computer with eight registers,
//! 256 bytes of memory and a downward-growing stack.
//!
//! Programs are written one instruction byte per line as binary literals
//! (`.ls8` files), loaded at address 0 and run until `HLT`.

pub mod cpu;
pub mod program;

// Re-export commonly used types
pub use cpu::{Machine, CpuState, CpuError, RunOutcome, Memory, RegisterFile, Flags, Opcode};
pub use program::{Program, LoadError, parse_program, load_program, disassemble};
