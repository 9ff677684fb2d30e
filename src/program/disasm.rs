//! Disassembler for LS-8 programs.
//!
//! Converts program bytes back to readable assembly.

use crate::cpu::decode::Opcode;

/// Disassemble the instruction at the start of `bytes`.
///
/// Returns the text and the number of bytes consumed. Bytes that are not
/// opcodes are shown as `???` and consume one byte.
pub fn disassemble_instruction(bytes: &[u8]) -> (String, usize) {
    let Some(&first) = bytes.first() else {
        return (String::new(), 0);
    };

    match Opcode::try_from(first) {
        Ok(op) => {
            let operands: Vec<Option<u8>> = (1..=op.operand_count()).map(|i| bytes.get(i).copied()).collect();
            (format_instruction(op, &operands), op.len().min(bytes.len()))
        }
        Err(_) => (format!("??? ; {:08b}", first), 1),
    }
}

/// Disassemble a whole program.
pub fn disassemble(bytes: &[u8]) -> String {
    let mut output = String::new();
    output.push_str("; LS-8 Disassembly\n");
    output.push_str("; -----------------\n\n");

    let mut addr = 0;
    while addr < bytes.len() {
        let (line, len) = disassemble_instruction(&bytes[addr..]);
        let raw: Vec<String> = bytes[addr..addr + len].iter().map(|b| format!("{:02X}", b)).collect();
        output.push_str(&format!("{:02X}: {:<12} ; {}\n", addr, line, raw.join(" ")));
        addr += len;
    }

    output
}

/// Format a decoded instruction as assembly text.
fn format_instruction(op: Opcode, operands: &[Option<u8>]) -> String {
    let reg = |i: usize| match operands.get(i).copied().flatten() {
        Some(r) => format!("R{}", r),
        None => "?".to_string(),
    };

    match op {
        Opcode::Hlt | Opcode::Ret => op.mnemonic().to_string(),
        Opcode::Ldi => {
            let imm = match operands.get(1).copied().flatten() {
                Some(v) => v.to_string(),
                None => "?".to_string(),
            };
            format!("LDI {},{}", reg(0), imm)
        }
        Opcode::Add | Opcode::Mul | Opcode::Cmp => format!("{} {},{}", op, reg(0), reg(1)),
        _ => format!("{} {}", op, reg(0)),
    }
}
