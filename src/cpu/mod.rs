//! CPU emulation for the LS-8.
//!
//! This module implements the complete LS-8 machine:
//! - 256 bytes of flat memory shared by code and stack
//! - 8 eight-bit registers, R7 doubling as the stack pointer
//! - a flags register written by CMP and read by JEQ/JNE
//! - 13 instructions whose length is encoded in the opcode's top two bits

pub mod memory;
pub mod registers;
pub mod decode;
pub mod alu;
pub mod execute;

pub use memory::{Memory, MemoryError, MEMORY_SIZE};
pub use registers::{RegisterFile, Flags, RegisterError, REGISTER_COUNT, SP, STACK_BASE};
pub use decode::{Opcode, DecodeError, instruction_len};
pub use alu::{AluOp, AluError};
pub use execute::{Machine, CpuError, CpuState, Flow, RunOutcome};
