//! LS-8 registers.
//!
//! The LS-8 has 8 general-purpose 8-bit registers, R0 through R7.
//! R7 is reserved as the stack pointer and starts at `0xF4`.
//! Compare results live in a separate flags register.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Number of general-purpose registers.
pub const REGISTER_COUNT: usize = 8;

/// Index of the stack pointer register.
pub const SP: u8 = 7;

/// Initial stack pointer value. The first push lands at `0xF3`.
pub const STACK_BASE: u8 = 0xF4;

/// Outcome of the most recent CMP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Flags {
    /// No CMP has executed yet. Neither JEQ nor JNE will jump.
    #[default]
    Unset,
    Equal,
    LessThan,
    GreaterThan,
}

impl Flags {
    /// Flags for comparing `a` against `b`.
    pub fn compare(a: u8, b: u8) -> Self {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Flags::LessThan,
            std::cmp::Ordering::Greater => Flags::GreaterThan,
            std::cmp::Ordering::Equal => Flags::Equal,
        }
    }

    /// True only after a CMP that found its operands equal.
    pub fn is_equal(self) -> bool {
        self == Flags::Equal
    }

    /// True only after a CMP that found its operands different.
    pub fn is_not_equal(self) -> bool {
        matches!(self, Flags::LessThan | Flags::GreaterThan)
    }
}

/// The LS-8 register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterFile {
    regs: [u8; REGISTER_COUNT],
}

impl RegisterFile {
    /// Create a register file with every register zeroed except SP.
    pub fn new() -> Self {
        let mut regs = [0; REGISTER_COUNT];
        regs[SP as usize] = STACK_BASE;
        Self { regs }
    }

    /// Reset to the power-on state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Read a register by the index found in an operand byte.
    pub fn get(&self, index: u8) -> Result<u8, RegisterError> {
        self.regs
            .get(index as usize)
            .copied()
            .ok_or(RegisterError::InvalidRegister(index))
    }

    /// Write a register by the index found in an operand byte.
    pub fn set(&mut self, index: u8, value: u8) -> Result<(), RegisterError> {
        let reg = self.regs
            .get_mut(index as usize)
            .ok_or(RegisterError::InvalidRegister(index))?;
        *reg = value;
        Ok(())
    }

    /// Current stack pointer.
    pub fn sp(&self) -> u8 {
        self.regs[SP as usize]
    }

    pub fn set_sp(&mut self, value: u8) {
        self.regs[SP as usize] = value;
    }

    /// All registers, R0 first.
    pub fn as_array(&self) -> &[u8; REGISTER_COUNT] {
        &self.regs
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from register access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("register index {0} out of range (R0-R7)")]
    InvalidRegister(u8),
}
