//! Arithmetic logic unit.
//!
//! The ALU works on raw register values and never touches machine state
//! itself; the execution engine writes the result back. Arithmetic is done
//! in a wider type and truncated to 8 bits, as fixed-width hardware would.

use crate::cpu::decode::Opcode;
use crate::cpu::registers::Flags;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// An ALU operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AluOp {
    Add,
    Mul,
    Cmp,
}

/// Effect of an ALU operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluResult {
    /// Store this value in the first operand register.
    Write(u8),
    /// Replace the flags; no register changes.
    Flags(Flags),
}

/// Add with 8-bit wraparound.
#[inline]
pub fn add(a: u8, b: u8) -> u8 {
    ((a as u16 + b as u16) & 0xFF) as u8
}

/// Multiply keeping the low 8 bits.
#[inline]
pub fn mul(a: u8, b: u8) -> u8 {
    ((a as u16 * b as u16) & 0xFF) as u8
}

/// Compare `a` against `b`.
#[inline]
pub fn cmp(a: u8, b: u8) -> Flags {
    Flags::compare(a, b)
}

impl AluOp {
    /// Apply the operation to two register values.
    pub fn apply(self, a: u8, b: u8) -> AluResult {
        match self {
            AluOp::Add => AluResult::Write(add(a, b)),
            AluOp::Mul => AluResult::Write(mul(a, b)),
            AluOp::Cmp => AluResult::Flags(cmp(a, b)),
        }
    }
}

impl TryFrom<Opcode> for AluOp {
    type Error = AluError;

    fn try_from(op: Opcode) -> Result<Self, Self::Error> {
        match op {
            Opcode::Add => Ok(AluOp::Add),
            Opcode::Mul => Ok(AluOp::Mul),
            Opcode::Cmp => Ok(AluOp::Cmp),
            other => Err(AluError::Unsupported(other.mnemonic().to_string())),
        }
    }
}

impl std::str::FromStr for AluOp {
    type Err = AluError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ADD" => Ok(AluOp::Add),
            "MUL" => Ok(AluOp::Mul),
            "CMP" => Ok(AluOp::Cmp),
            _ => Err(AluError::Unsupported(s.to_string())),
        }
    }
}

/// Errors raised by the ALU.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AluError {
    #[error("unsupported ALU operation: {0}")]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_add_wraps_mod_256(a: u8, b: u8) {
            prop_assert_eq!(add(a, b) as u32, (a as u32 + b as u32) % 256);
        }

        #[test]
        fn prop_mul_wraps_mod_256(a: u8, b: u8) {
            prop_assert_eq!(mul(a, b) as u32, (a as u32 * b as u32) % 256);
        }

        #[test]
        fn prop_cmp_matches_ordering(a: u8, b: u8) {
            let expected = if a < b {
                Flags::LessThan
            } else if a > b {
                Flags::GreaterThan
            } else {
                Flags::Equal
            };
            prop_assert_eq!(cmp(a, b), expected);
            prop_assert_ne!(cmp(a, b), Flags::Unset);
        }
    }

    #[test]
    fn test_overflow_examples() {
        assert_eq!(add(200, 100), 44);
        assert_eq!(mul(16, 16), 0);
        assert_eq!(mul(3, 4), 12);
    }

    #[test]
    fn test_apply() {
        assert_eq!(AluOp::Add.apply(1, 2), AluResult::Write(3));
        assert_eq!(AluOp::Mul.apply(255, 2), AluResult::Write(254));
        assert_eq!(AluOp::Cmp.apply(9, 9), AluResult::Flags(Flags::Equal));
    }

    #[test]
    fn test_from_opcode() {
        assert_eq!(AluOp::try_from(Opcode::Mul), Ok(AluOp::Mul));
        assert_eq!(
            AluOp::try_from(Opcode::Ldi),
            Err(AluError::Unsupported("LDI".to_string()))
        );
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("ADD".parse::<AluOp>(), Ok(AluOp::Add));
        assert_eq!("cmp".parse::<AluOp>(), Ok(AluOp::Cmp));
        assert!(matches!("SUB".parse::<AluOp>(), Err(AluError::Unsupported(name)) if name == "SUB"));
    }
}
