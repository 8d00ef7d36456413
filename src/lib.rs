/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! The core of a Chip-8 emulator: registers, memory, call stack, timers and
//! the semantics of each instruction.
//!
//! Fetching and decoding opcodes is left to the caller, as is decrementing
//! the timers; see the `cpu` module for the details.

#[macro_use]
extern crate enum_primitive;
extern crate failure;
#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate log;
extern crate num;
extern crate rand;

/// The size of the Chip-8's memory, in bytes.
pub const MEM_SIZE: usize = 0xFFF;
/// The address where programs should be loaded.
pub const PROG_START: usize = 0x200;
/// The maximum size of a Chip-8 program, in bytes.
pub const PROG_SIZE: usize = MEM_SIZE - PROG_START;
/// The default capacity of the call stack.
pub const STACK_SIZE: usize = 16;
/// The mask applied to addresses to fit them onto the 12-bit address bus.
pub const ADDR_MASK: u16 = 0xFFF;

pub mod cpu;
pub mod display;
pub mod register;

pub use cpu::{AddressOutOfBoundsError, Cpu, Options, ProgramTooLargeError, StackOverflowError,
              StackUnderflowError};
pub use register::{Register, RegisterOutOfRangeError};
