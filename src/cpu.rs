// Copyright 2018 Ian Johnson

// This file is part of Chip-8.

// Chip-8 is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Chip-8 is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Chip-8.  If not, see <http://www.gnu.org/licenses/>.

//! The Chip-8 CPU.
//!
//! The main focus of this module is the `Cpu` struct, which owns the entire
//! state of a Chip-8 machine and provides one method per instruction.  It
//! does not fetch or decode opcodes: a front-end reads the opcode at `pc()`,
//! advances the program counter past it, and then calls the matching method
//! here.  The skip methods only add the *extra* two bytes on top of that.
//!
//! Likewise, the delay and sound timers are never decremented here; the
//! front-end is expected to do so at 60Hz through `set_dt` and `set_st`.
//!
//! Addresses given to `jump`, `call`, `store_address` and the font lookup
//! are masked to 12 bits.  `jump_plus` and `add_index` are not, which is how
//! the machine being reproduced behaves; callers relying on those to stay in
//! range must mask the result themselves.

use std::default::Default;
use std::io::Read;

use failure::Error;
use rand::{self, Rng, SeedableRng, XorShiftRng};

use ADDR_MASK;
use MEM_SIZE;
use PROG_SIZE;
use PROG_START;
use STACK_SIZE;
use display::{self, FONT, FONT_HEIGHT};
use register::{Register, N_REGISTERS};

/// The location at which to put the font glyphs.
const FONT_START: usize = 0x0;

/// An error resulting from a `CALL` with a full call stack.
#[derive(Debug, Fail, PartialEq, Eq)]
#[fail(display = "call stack overflowed")]
pub struct StackOverflowError;

/// An error resulting from a `RET` (or a stack inspection) with an empty call
/// stack.
#[derive(Debug, Fail, PartialEq, Eq)]
#[fail(display = "no subroutine to return from")]
pub struct StackUnderflowError;

/// An error resulting from a memory access past the end of memory.
#[derive(Debug, Fail, PartialEq, Eq)]
#[fail(display = "address out of bounds: {:#04X}", _0)]
pub struct AddressOutOfBoundsError(pub usize);

/// An error resulting from an input program being too large.
#[derive(Debug, Fail)]
#[fail(display = "input program is too large")]
pub struct ProgramTooLargeError;

/// The seed used in place of an all-zero seed, which `XorShiftRng` rejects.
pub const DEFAULT_SEED: [u32; 4] = [0x193A_6754, 0xA8A7_D469, 0x9783_0E05, 0x113B_A7BB];

/// Options for the CPU.
#[derive(Debug, Clone)]
pub struct Options {
    /// The seed for the random number generator (default `None`, meaning a
    /// seed is taken from the operating system).
    ///
    /// An all-zero seed is replaced with `DEFAULT_SEED`.
    pub seed: Option<[u32; 4]>,
    /// The capacity of the call stack (default 16).
    pub stack_size: usize,
}

impl Options {
    /// Returns the default set of options.
    pub fn new() -> Self {
        Options {
            seed: None,
            stack_size: STACK_SIZE,
        }
    }

    /// Returns a set of options useful for testing (e.g. a fixed seed).
    pub fn testing() -> Self {
        Options {
            seed: Some(DEFAULT_SEED),
            stack_size: STACK_SIZE,
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Options::new()
    }
}

/// A Chip-8 CPU.
///
/// The random number generator used by `store_random` is owned by the CPU,
/// so separate instances never share state.  Any `rand::Rng` can be
/// supplied through `with_rng`.
pub struct Cpu<R = XorShiftRng> {
    /// The internal memory.
    mem: [u8; MEM_SIZE],
    /// The display buffer.
    display: display::Buffer,
    /// The general-purpose registers `V0`-`VF`.
    regs: [u8; N_REGISTERS],
    /// The special register `I`.
    reg_i: u16,
    /// The delay timer.
    reg_dt: u8,
    /// The sound timer.
    reg_st: u8,
    /// The program counter.
    pc: u16,
    /// The call stack (for returning from subroutines).
    call_stack: Vec<u16>,
    /// The capacity of the call stack.
    stack_size: usize,
    /// The source of `RND` values.
    rng: R,
}

impl Cpu<XorShiftRng> {
    /// Returns a new CPU with the default options.
    pub fn new() -> Self {
        Cpu::with_options(Options::default())
    }

    /// Returns a new CPU using the given options.
    pub fn with_options(options: Options) -> Self {
        let rng = match options.seed {
            Some(seed) if seed == [0; 4] => {
                warn!("all-zero seed replaced with the default seed");
                XorShiftRng::from_seed(DEFAULT_SEED)
            }
            Some(seed) => XorShiftRng::from_seed(seed),
            None => rand::weak_rng(),
        };
        Cpu::build(rng, options.stack_size)
    }
}

impl<R: Rng> Cpu<R> {
    /// Returns a new CPU drawing its random numbers from the given generator.
    pub fn with_rng(rng: R) -> Self {
        Cpu::build(rng, STACK_SIZE)
    }

    fn build(rng: R, stack_size: usize) -> Self {
        let mut cpu = Cpu {
            mem: [0; MEM_SIZE],
            display: display::Buffer::new(),
            regs: [0; N_REGISTERS],
            reg_i: 0,
            reg_dt: 0,
            reg_st: 0,
            pc: 0,
            call_stack: Vec::with_capacity(stack_size),
            stack_size,
            rng,
        };

        // Copy the font into memory.
        for (i, glyph) in FONT.iter().enumerate() {
            let start = FONT_START + i * FONT_HEIGHT;
            let end = start + glyph.len();
            cpu.mem[start..end].copy_from_slice(glyph);
        }
        debug!("initialized CPU with a {}-entry call stack", stack_size);

        cpu
    }

    /// Loads program data from the specified source.
    pub fn load_program<T: Read>(&mut self, input: &mut T) -> Result<(), Error> {
        let mut read = 0;
        loop {
            let n = input.read(&mut self.mem[PROG_START + read..])?;
            if n == 0 {
                break;
            }
            read += n;
            if read == PROG_SIZE {
                // Try to see if we missed part of the file.
                let mut tmp = [0u8];
                if input.read(&mut tmp)? == 1 {
                    return Err(ProgramTooLargeError.into());
                }
                break;
            }
        }
        debug!("loaded {} bytes of program data at {:#05X}", read, PROG_START);
        Ok(())
    }

    /// Returns a reference to the display buffer.
    pub fn display(&self) -> &display::Buffer {
        &self.display
    }

    /// Returns a mutable reference to the display buffer.
    pub fn display_mut(&mut self) -> &mut display::Buffer {
        &mut self.display
    }

    /// Returns a reference to the internal memory.
    pub fn mem(&self) -> &[u8; MEM_SIZE] {
        &self.mem
    }

    /// Returns a mutable reference to the internal memory.
    pub fn mem_mut(&mut self) -> &mut [u8; MEM_SIZE] {
        &mut self.mem
    }

    /// Returns the value of register `I`.
    pub fn i(&self) -> u16 {
        self.reg_i
    }

    /// Sets the value of register `I`.
    pub fn set_i(&mut self, val: u16) {
        self.reg_i = val;
    }

    /// Returns the value of the delay timer.
    pub fn dt(&self) -> u8 {
        self.reg_dt
    }

    /// Sets the value of the delay timer.
    pub fn set_dt(&mut self, val: u8) {
        self.reg_dt = val;
    }

    /// Returns the value of the sound timer.
    pub fn st(&self) -> u8 {
        self.reg_st
    }

    /// Sets the value of the sound timer.
    pub fn set_st(&mut self, val: u8) {
        self.reg_st = val;
    }

    /// Returns the value in the given register.
    pub fn register(&self, reg: Register) -> u8 {
        self.regs[reg.index()]
    }

    /// Sets the given register to the given value.
    pub fn set_register(&mut self, reg: Register, val: u8) {
        self.regs[reg.index()] = val
    }

    /// Returns all the data registers, `V0` first.
    pub fn registers(&self) -> &[u8; N_REGISTERS] {
        &self.regs
    }

    /// Returns the value of the program counter.
    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Sets the value of the program counter.
    pub fn set_pc(&mut self, val: u16) {
        self.pc = val;
    }

    /// Returns the address on top of the call stack.
    pub fn stack(&self) -> Result<u16, StackUnderflowError> {
        self.call_stack.last().cloned().ok_or(StackUnderflowError)
    }

    /// Returns the number of addresses on the call stack.
    pub fn stack_depth(&self) -> usize {
        self.call_stack.len()
    }

    /// `CLS` (`00E0`).
    pub fn clear_screen(&mut self) {
        self.display.clear();
    }

    /// `RET` (`00EE`).
    ///
    /// On an empty call stack this fails and leaves the program counter as it
    /// was.
    pub fn ret(&mut self) -> Result<(), StackUnderflowError> {
        match self.call_stack.pop() {
            Some(addr) => {
                trace!("returning from {:#05X} to {:#05X}", self.pc, addr);
                self.pc = addr;
                Ok(())
            }
            None => {
                warn!("RET at {:#05X} with an empty call stack", self.pc);
                Err(StackUnderflowError)
            }
        }
    }

    /// `JP addr` (`1nnn`).
    pub fn jump(&mut self, addr: u16) {
        self.pc = addr & ADDR_MASK;
        trace!("jumped to {:#05X}", self.pc);
    }

    /// `CALL addr` (`2nnn`).
    ///
    /// The current program counter is pushed as the return address.
    pub fn call(&mut self, addr: u16) -> Result<(), StackOverflowError> {
        if self.call_stack.len() >= self.stack_size {
            warn!("CALL {:#05X} with a full call stack", addr & ADDR_MASK);
            return Err(StackOverflowError);
        }
        self.call_stack.push(self.pc);
        self.pc = addr & ADDR_MASK;
        trace!("called {:#05X} (depth {})", self.pc, self.call_stack.len());
        Ok(())
    }

    /// `SE Vx, byte` (`3xkk`).
    pub fn skip_equal_byte(&mut self, reg: Register, b: u8) {
        if self.register(reg) == b {
            self.skip();
        }
    }

    /// `SNE Vx, byte` (`4xkk`).
    pub fn skip_not_equal_byte(&mut self, reg: Register, b: u8) {
        if self.register(reg) != b {
            self.skip();
        }
    }

    /// `SE Vx, Vy` (`5xy0`).
    pub fn skip_equal_register(&mut self, reg1: Register, reg2: Register) {
        if self.register(reg1) == self.register(reg2) {
            self.skip();
        }
    }

    /// `LD Vx, byte` (`6xkk`).
    pub fn store_byte(&mut self, reg: Register, b: u8) {
        self.set_register(reg, b);
    }

    /// `ADD Vx, byte` (`7xkk`).  `VF` is left alone.
    pub fn add_byte(&mut self, reg: Register, b: u8) {
        let r = self.register(reg);
        self.set_register(reg, r.wrapping_add(b));
    }

    /// `LD Vx, Vy` (`8xy0`).
    pub fn store_register(&mut self, reg1: Register, reg2: Register) {
        let r2 = self.register(reg2);
        self.set_register(reg1, r2);
    }

    /// `OR Vx, Vy` (`8xy1`).
    pub fn or_registers(&mut self, reg1: Register, reg2: Register) {
        let r1 = self.register(reg1);
        let r2 = self.register(reg2);
        self.set_register(reg1, r1 | r2);
    }

    /// `AND Vx, Vy` (`8xy2`).
    pub fn and_registers(&mut self, reg1: Register, reg2: Register) {
        let r1 = self.register(reg1);
        let r2 = self.register(reg2);
        self.set_register(reg1, r1 & r2);
    }

    /// `XOR Vx, Vy` (`8xy3`).
    pub fn xor_registers(&mut self, reg1: Register, reg2: Register) {
        let r1 = self.register(reg1);
        let r2 = self.register(reg2);
        self.set_register(reg1, r1 ^ r2);
    }

    /// `ADD Vx, Vy` (`8xy4`), setting `VF` to 1 on carry or 0 otherwise.
    pub fn add_registers(&mut self, reg1: Register, reg2: Register) {
        let sum = self.register(reg1) as u16 + self.register(reg2) as u16;
        self.set_register(reg1, sum as u8);
        self.set_register(Register::VF, (sum > 0xFF) as u8);
    }

    /// `SUB Vx, Vy` (`8xy5`), setting `VF` to 0 on borrow or 1 otherwise.
    pub fn subtract(&mut self, reg1: Register, reg2: Register) {
        let r1 = self.register(reg1);
        let r2 = self.register(reg2);
        self.set_register(reg1, r1.wrapping_sub(r2));
        self.set_register(Register::VF, (r1 >= r2) as u8);
    }

    /// `SHR Vx, Vy` (`8xy6`): sets `Vx` to `Vy >> 1`, setting `VF` to the old
    /// lowest bit of `Vy`.
    pub fn shift_right(&mut self, reg1: Register, reg2: Register) {
        let r2 = self.register(reg2);
        self.set_register(reg1, r2 >> 1);
        self.set_register(Register::VF, r2 & 1);
    }

    /// `SUBN Vx, Vy` (`8xy7`): sets `Vx` to `Vy - Vx`, setting `VF` to 0 on
    /// borrow or 1 otherwise.
    pub fn subtract_reverse(&mut self, reg1: Register, reg2: Register) {
        let r1 = self.register(reg1);
        let r2 = self.register(reg2);
        self.set_register(reg1, r2.wrapping_sub(r1));
        self.set_register(Register::VF, (r2 >= r1) as u8);
    }

    /// `SHL Vx, Vy` (`8xyE`): sets `Vx` to `Vy << 1`, setting `VF` to the old
    /// highest bit of `Vy`.
    pub fn shift_left(&mut self, reg1: Register, reg2: Register) {
        let r2 = self.register(reg2);
        self.set_register(reg1, r2 << 1);
        self.set_register(Register::VF, (r2 & 1 << 7) >> 7);
    }

    /// `SNE Vx, Vy` (`9xy0`).
    pub fn skip_not_equal_register(&mut self, reg1: Register, reg2: Register) {
        if self.register(reg1) != self.register(reg2) {
            self.skip();
        }
    }

    /// `LD I, addr` (`Annn`).
    pub fn store_address(&mut self, addr: u16) {
        self.reg_i = addr & ADDR_MASK;
    }

    /// `JP V0, addr` (`Bnnn`).  The target is not masked.
    pub fn jump_plus(&mut self, addr: u16) {
        self.pc = addr.wrapping_add(self.register(Register::V0) as u16);
        trace!("jumped to {:#05X}", self.pc);
    }

    /// `RND Vx, byte` (`Cxkk`).
    pub fn store_random(&mut self, reg: Register, mask: u8) {
        let val = self.rng.gen::<u8>() & mask;
        self.set_register(reg, val);
    }

    /// `DRW Vx, Vy, nibble` (`Dxyn`).
    ///
    /// Draws the `n`-byte sprite at `I` to the position given by `Vx` and
    /// `Vy`, setting `VF` to 1 if any lit pixel was erased or 0 otherwise.
    pub fn draw(
        &mut self,
        reg1: Register,
        reg2: Register,
        n: u8,
    ) -> Result<(), AddressOutOfBoundsError> {
        let start = self.reg_i as usize;
        let end = self.check_range(start, n as usize)?;
        let x = self.register(reg1) as usize;
        let y = self.register(reg2) as usize;

        let collision = self.display.draw_sprite(&self.mem[start..end], x, y);
        self.set_register(Register::VF, collision as u8);
        Ok(())
    }

    /// `LD Vx, DT` (`Fx07`).
    pub fn store_delay_timer(&mut self, reg: Register) {
        let dt = self.dt();
        self.set_register(reg, dt);
    }

    /// `LD DT, Vx` (`Fx15`).
    pub fn set_delay_timer(&mut self, reg: Register) {
        let r = self.register(reg);
        self.set_dt(r);
    }

    /// `LD ST, Vx` (`Fx18`).
    pub fn set_sound_timer(&mut self, reg: Register) {
        let r = self.register(reg);
        self.set_st(r);
    }

    /// `ADD I, Vx` (`Fx1E`).  `VF` is left alone and the result is not
    /// masked.
    pub fn add_index(&mut self, reg: Register) {
        self.reg_i = self.reg_i.wrapping_add(self.register(reg) as u16);
    }

    /// `LD F, Vx` (`Fx29`): points `I` at the glyph for the digit in `Vx`.
    ///
    /// Values above `0xF` are not rejected; they simply point past the font.
    pub fn set_text_character(&mut self, reg: Register) {
        let r = self.register(reg) as usize;
        self.reg_i = (FONT_START + r * FONT_HEIGHT) as u16 & ADDR_MASK;
    }

    /// `LD B, Vx` (`Fx33`): stores the decimal digits of `Vx` at `I`, `I + 1`
    /// and `I + 2`, leaving `I` unchanged.
    pub fn store_bcd(&mut self, reg: Register) -> Result<(), AddressOutOfBoundsError> {
        let val = self.register(reg);
        let addr = self.reg_i as usize;
        self.check_range(addr, 3)?;

        self.mem[addr] = val / 100;
        self.mem[addr + 1] = val % 100 / 10;
        self.mem[addr + 2] = val % 10;
        Ok(())
    }

    /// `LD [I], Vx` (`Fx55`): stores `V0` through `Vx` at `I`, leaving `I`
    /// just past the last byte written.
    pub fn store_registers(&mut self, reg: Register) -> Result<(), AddressOutOfBoundsError> {
        let count = reg.index() + 1;
        let start = self.reg_i as usize;
        let end = self.check_range(start, count)?;

        self.mem[start..end].copy_from_slice(&self.regs[..count]);
        self.reg_i += count as u16;
        Ok(())
    }

    /// `LD Vx, [I]` (`Fx65`): loads `V0` through `Vx` from `I`, leaving `I`
    /// just past the last byte read.
    pub fn load_registers(&mut self, reg: Register) -> Result<(), AddressOutOfBoundsError> {
        let count = reg.index() + 1;
        let start = self.reg_i as usize;
        let end = self.check_range(start, count)?;

        self.regs[..count].copy_from_slice(&self.mem[start..end]);
        self.reg_i += count as u16;
        Ok(())
    }

    /// Advances the program counter past the next instruction.
    fn skip(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }

    /// Checks that `len` bytes starting at `start` all lie in memory,
    /// returning the end of the range.
    fn check_range(&self, start: usize, len: usize) -> Result<usize, AddressOutOfBoundsError> {
        let end = start + len;
        if end > MEM_SIZE {
            warn!("memory access at {:#05X}..{:#05X} is out of bounds", start, end);
            Err(AddressOutOfBoundsError(end - 1))
        } else {
            Ok(end)
        }
    }
}

impl Default for Cpu<XorShiftRng> {
    fn default() -> Self {
        Cpu::new()
    }
}
