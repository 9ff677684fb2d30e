//! CPU execution engine for the LS-8.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::cpu::{Memory, RegisterFile};
use crate::cpu::alu::{AluError, AluOp, AluResult};
use crate::cpu::decode::Opcode;
use crate::cpu::memory::MemoryError;
use crate::cpu::registers::{Flags, RegisterError};
use serde::{Serialize, Deserialize};
use std::io::Write;
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has halted (executed HLT instruction).
    Halted,
    /// CPU stopped on an unrecognized opcode or an execution error.
    Faulted,
}

/// What the PC does after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Advance past the instruction and its operands.
    Continue,
    /// Set the PC to this address.
    Jump(u8),
}

/// Why a run stopped without a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// HLT executed.
    Halted,
    /// The byte at `address` is not an instruction.
    UnknownInstruction { opcode: u8, address: usize },
    /// The cycle budget ran out while the machine was still running.
    CycleLimit,
}

/// The LS-8 machine.
#[derive(Clone, Serialize, Deserialize)]
pub struct Machine {
    /// General-purpose registers, R7 is the stack pointer.
    pub regs: RegisterFile,
    /// Main memory.
    pub mem: Memory,
    /// Result of the last CMP.
    pub flags: Flags,
    /// Program counter.
    pub pc: usize,
    /// Instruction register: the opcode byte fetched last.
    pub ir: u8,
    /// Current execution state.
    pub state: CpuState,
    /// Instruction count (for profiling).
    pub cycles: u64,
    /// Last executed instruction (for debugging).
    last_instr: Option<Opcode>,
}

impl Machine {
    /// Create a machine in the power-on state.
    pub fn new() -> Self {
        Self {
            regs: RegisterFile::new(),
            mem: Memory::new(),
            flags: Flags::Unset,
            pc: 0,
            ir: 0,
            state: CpuState::Running,
            cycles: 0,
            last_instr: None,
        }
    }

    /// Reset the machine to the power-on state.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.flags = Flags::Unset;
        self.pc = 0;
        self.ir = 0;
        self.state = CpuState::Running;
        self.cycles = 0;
        self.last_instr = None;
    }

    /// Copy a program into memory starting at address 0.
    ///
    /// Opcodes are not validated here; bad bytes surface during execution.
    pub fn load(&mut self, program: &[u8]) -> Result<(), MemoryError> {
        self.mem.load_program(0, program)?;
        log::debug!("loaded {} bytes at 0x00", program.len());
        Ok(())
    }

    /// Execute a single instruction, writing any PRN output to `out`.
    ///
    /// Returns the instruction that was executed. Any error leaves the
    /// machine in [`CpuState::Faulted`].
    pub fn step<W: Write>(&mut self, out: &mut W) -> Result<Opcode, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        match self.cycle(out) {
            Ok(op) => Ok(op),
            Err(e) => {
                self.state = CpuState::Faulted;
                Err(e)
            }
        }
    }

    fn cycle<W: Write>(&mut self, out: &mut W) -> Result<Opcode, CpuError> {
        // Fetch
        self.ir = self.mem.read(self.pc)?;

        if log::log_enabled!(log::Level::Trace) {
            log::trace!("{}", self.trace_line());
        }

        // Decode
        let op = Opcode::try_from(self.ir).map_err(|_| CpuError::UnknownInstruction {
            opcode: self.ir,
            address: self.pc,
        })?;

        // Execute
        match self.execute(op, out)? {
            Flow::Continue => self.pc += op.len(),
            Flow::Jump(addr) => self.pc = addr as usize,
        }

        self.cycles += 1;
        self.last_instr = Some(op);

        Ok(op)
    }

    /// Run until HLT or an unrecognized opcode.
    ///
    /// An unrecognized opcode is reported in the outcome; every other error
    /// is fatal and returned.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<RunOutcome, CpuError> {
        self.run_until(out, None)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited<W: Write>(&mut self, out: &mut W, max_cycles: u64) -> Result<RunOutcome, CpuError> {
        self.run_until(out, Some(max_cycles))
    }

    fn run_until<W: Write>(&mut self, out: &mut W, max_cycles: Option<u64>) -> Result<RunOutcome, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        let start_cycles = self.cycles;

        while self.state == CpuState::Running {
            if let Some(max) = max_cycles {
                if self.cycles - start_cycles >= max {
                    log::debug!("cycle limit {} reached at pc={:#04x}", max, self.pc);
                    return Ok(RunOutcome::CycleLimit);
                }
            }

            match self.step(out) {
                Ok(_) => {}
                Err(CpuError::UnknownInstruction { opcode, address }) => {
                    log::warn!("unknown instruction {:#010b} at {:#04x}", opcode, address);
                    return Ok(RunOutcome::UnknownInstruction { opcode, address });
                }
                Err(e) => return Err(e),
            }
        }

        log::debug!("halted after {} cycles", self.cycles - start_cycles);
        Ok(RunOutcome::Halted)
    }

    /// Execute a decoded instruction.
    fn execute<W: Write>(&mut self, op: Opcode, out: &mut W) -> Result<Flow, CpuError> {
        match op {
            // ==================== Data Transfer ====================

            Opcode::Ldi => {
                let reg = self.operand(1)?;
                let value = self.operand(2)?;
                self.regs.set(reg, value)?;
                Ok(Flow::Continue)
            }

            Opcode::Prn => {
                let value = self.reg_operand(1)?;
                writeln!(out, "{}", value).map_err(|e| CpuError::Output(e.to_string()))?;
                Ok(Flow::Continue)
            }

            // ==================== Stack ====================

            Opcode::Push => {
                let value = self.reg_operand(1)?;
                self.push(value)?;
                Ok(Flow::Continue)
            }

            Opcode::Pop => {
                let reg = self.operand(1)?;
                // Validate the destination before touching SP
                self.regs.get(reg)?;
                let value = self.pop()?;
                self.regs.set(reg, value)?;
                Ok(Flow::Continue)
            }

            // ==================== Control Flow ====================

            Opcode::Call => {
                let reg = self.operand(1)?;
                // Validate the target before touching SP
                self.regs.get(reg)?;
                let ret = self.pc + op.len();
                let ret = u8::try_from(ret).map_err(|_| MemoryError::AddressOutOfRange(ret))?;
                self.push(ret)?;
                // Read after the push: CALL R7 jumps to the new SP
                Ok(Flow::Jump(self.regs.get(reg)?))
            }

            Opcode::Ret => Ok(Flow::Jump(self.pop()?)),

            Opcode::Jmp => Ok(Flow::Jump(self.reg_operand(1)?)),

            Opcode::Jeq => self.jump_if(self.flags.is_equal()),

            Opcode::Jne => self.jump_if(self.flags.is_not_equal()),

            Opcode::Hlt => {
                self.state = CpuState::Halted;
                Ok(Flow::Continue)
            }

            // ==================== Arithmetic ====================

            Opcode::Add | Opcode::Mul | Opcode::Cmp => self.alu(op),
        }
    }

    /// Run a two-register ALU instruction.
    fn alu(&mut self, op: Opcode) -> Result<Flow, CpuError> {
        let alu_op = AluOp::try_from(op)?;
        let reg_a = self.operand(1)?;
        let a = self.regs.get(reg_a)?;
        let b = self.reg_operand(2)?;

        match alu_op.apply(a, b) {
            AluResult::Write(value) => self.regs.set(reg_a, value)?,
            AluResult::Flags(flags) => self.flags = flags,
        }

        Ok(Flow::Continue)
    }

    fn jump_if(&self, condition: bool) -> Result<Flow, CpuError> {
        if condition {
            Ok(Flow::Jump(self.reg_operand(1)?))
        } else {
            Ok(Flow::Continue)
        }
    }

    /// Read the operand byte `n` bytes after the opcode.
    fn operand(&self, n: usize) -> Result<u8, CpuError> {
        Ok(self.mem.read(self.pc + n)?)
    }

    /// Read the register named by operand byte `n`.
    fn reg_operand(&self, n: usize) -> Result<u8, CpuError> {
        let reg = self.operand(n)?;
        Ok(self.regs.get(reg)?)
    }

    /// Push a byte: pre-decrement SP, then store.
    pub fn push(&mut self, value: u8) -> Result<(), CpuError> {
        let sp = self.regs.sp().checked_sub(1).ok_or(CpuError::StackOverflow)?;
        self.mem.write(sp as usize, value)?;
        self.regs.set_sp(sp);
        Ok(())
    }

    /// Pop a byte: load from SP, then post-increment.
    pub fn pop(&mut self) -> Result<u8, CpuError> {
        let sp = self.regs.sp();
        let next = sp.checked_add(1).ok_or(CpuError::StackUnderflow)?;
        let value = self.mem.read(sp as usize)?;
        self.regs.set_sp(next);
        Ok(value)
    }

    /// One-line dump of PC, the bytes at PC, all registers and the stack top.
    pub fn trace_line(&self) -> String {
        let byte_at = |addr: usize| self.mem.read(addr).unwrap_or(0);

        let mut line = format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            self.pc,
            byte_at(self.pc),
            byte_at(self.pc + 1),
            byte_at(self.pc + 2),
        );
        for value in self.regs.as_array() {
            line.push_str(&format!(" {:02X}", value));
        }
        line.push_str(&format!(" | {:02X}", byte_at(self.regs.sp() as usize)));
        line
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Opcode> {
        self.last_instr
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("state", &self.state)
            .field("pc", &self.pc)
            .field("flags", &self.flags)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("unknown instruction {opcode:#010b} at {address:#04x}")]
    UnknownInstruction { opcode: u8, address: usize },

    #[error("memory error: {0}")]
    MemoryError(#[from] MemoryError),

    #[error("{0}")]
    RegisterError(#[from] RegisterError),

    #[error("ALU contract violation: {0}")]
    UnsupportedAluOp(#[from] AluError),

    #[error("stack overflow: SP would drop below 0x00")]
    StackOverflow,

    #[error("stack underflow: SP would pass 0xff")]
    StackUnderflow,

    #[error("output error: {0}")]
    Output(String),
}
