//! Instruction decoder for the LS-8.
//!
//! Every instruction starts with a one-byte opcode, followed by zero, one or
//! two operand bytes. The opcode layout is `AABCDDDD`:
//! - `AA`: number of operand bytes (0-2)
//! - `B`: set for ALU operations
//! - `C`: set for instructions that may set the PC directly
//! - `DDDD`: instruction identifier

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Total length in bytes of the instruction starting with `opcode`.
///
/// The operand count is stored in the two high bits, so this works for any
/// byte, including ones that do not name an instruction.
#[inline]
pub const fn instruction_len(opcode: u8) -> usize {
    (((opcode >> 6) & 0b11) + 1) as usize
}

/// An LS-8 opcode.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// Halt: stop execution
    Hlt = 0b0000_0001,
    /// Return: pop the return address and jump there
    Ret = 0b0001_0001,
    /// Push: SP -= 1; [SP] := reg
    Push = 0b0100_0101,
    /// Pop: reg := [SP]; SP += 1
    Pop = 0b0100_0110,
    /// Print: write reg as a decimal line
    Prn = 0b0100_0111,
    /// Call: push PC + 2, jump to reg
    Call = 0b0101_0000,
    /// Jump to reg
    Jmp = 0b0101_0100,
    /// Jump to reg if the last CMP was equal
    Jeq = 0b0101_0101,
    /// Jump to reg if the last CMP was not equal
    Jne = 0b0101_0110,
    /// Load immediate: reg := imm
    Ldi = 0b1000_0010,
    /// Add: regA := regA + regB
    Add = 0b1010_0000,
    /// Multiply: regA := regA * regB
    Mul = 0b1010_0010,
    /// Compare regA with regB, setting flags
    Cmp = 0b1010_0111,
}

impl Opcode {
    /// Full instruction length, opcode byte included.
    pub const fn len(self) -> usize {
        instruction_len(self as u8)
    }

    /// Number of operand bytes following the opcode.
    pub const fn operand_count(self) -> usize {
        self.len() - 1
    }

    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Hlt => "HLT",
            Opcode::Ret => "RET",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::Prn => "PRN",
            Opcode::Call => "CALL",
            Opcode::Jmp => "JMP",
            Opcode::Jeq => "JEQ",
            Opcode::Jne => "JNE",
            Opcode::Ldi => "LDI",
            Opcode::Add => "ADD",
            Opcode::Mul => "MUL",
            Opcode::Cmp => "CMP",
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        let op = match byte {
            0b0000_0001 => Opcode::Hlt,
            0b0001_0001 => Opcode::Ret,
            0b0100_0101 => Opcode::Push,
            0b0100_0110 => Opcode::Pop,
            0b0100_0111 => Opcode::Prn,
            0b0101_0000 => Opcode::Call,
            0b0101_0100 => Opcode::Jmp,
            0b0101_0101 => Opcode::Jeq,
            0b0101_0110 => Opcode::Jne,
            0b1000_0010 => Opcode::Ldi,
            0b1010_0000 => Opcode::Add,
            0b1010_0010 => Opcode::Mul,
            0b1010_0111 => Opcode::Cmp,
            _ => return Err(DecodeError::InvalidOpcode(byte)),
        };
        Ok(op)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode: {0:#010b}")]
    InvalidOpcode(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_len_from_high_bits() {
        assert_eq!(instruction_len(0b0000_0000), 1);
        assert_eq!(instruction_len(0b0111_1111), 2);
        assert_eq!(instruction_len(0b1000_0000), 3);
        // 0b11 would mean three operands; the formula still applies
        assert_eq!(instruction_len(0b1100_0000), 4);
    }

    #[test]
    fn test_operand_counts() {
        let expected = [
            (Opcode::Hlt, 0),
            (Opcode::Ret, 0),
            (Opcode::Push, 1),
            (Opcode::Pop, 1),
            (Opcode::Prn, 1),
            (Opcode::Call, 1),
            (Opcode::Jmp, 1),
            (Opcode::Jeq, 1),
            (Opcode::Jne, 1),
            (Opcode::Ldi, 2),
            (Opcode::Add, 2),
            (Opcode::Mul, 2),
            (Opcode::Cmp, 2),
        ];
        for (op, count) in expected {
            assert_eq!(op.operand_count(), count, "{}", op);
        }
    }

    #[test]
    fn test_decode_known_bytes() {
        for op in [Opcode::Hlt, Opcode::Ret, Opcode::Call, Opcode::Jne, Opcode::Cmp] {
            assert_eq!(Opcode::try_from(op as u8), Ok(op));
        }
        assert_eq!(Opcode::try_from(0x82), Ok(Opcode::Ldi));
        assert_eq!(Opcode::try_from(0x47), Ok(Opcode::Prn));
    }

    #[test]
    fn test_decode_unknown_byte() {
        assert_eq!(Opcode::try_from(0xFF), Err(DecodeError::InvalidOpcode(0xFF)));
        assert_eq!(Opcode::try_from(0x00), Err(DecodeError::InvalidOpcode(0x00)));
    }
}
