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

//! The Chip-8 data registers.
//!
//! Every operation in the `cpu` module takes its register operands as a
//! `Register`, so an operand can never point outside the register file.  A
//! decoder working with raw nibbles can go through `Register::from_index`,
//! which rejects anything that doesn't name one of the sixteen registers.

use std::fmt;

use num::FromPrimitive;

/// The number of data registers.
pub const N_REGISTERS: usize = 16;

/// An error resulting from a register index outside `0x0`-`0xF`.
#[derive(Debug, Fail, PartialEq, Eq)]
#[fail(display = "register index out of range: {:#X}", _0)]
pub struct RegisterOutOfRangeError(pub u8);

enum_from_primitive! {
/// A Chip-8 register.
///
/// `VF` is an ordinary register, but several arithmetic operations also use
/// it as their carry/borrow flag output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    V0 = 0,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
    V7,
    V8,
    V9,
    VA,
    VB,
    VC,
    VD,
    VE,
    VF,
}
}

impl Register {
    /// Returns the register with the given index, or an error if the index
    /// is `0x10` or above.
    ///
    /// # Examples
    ///
    /// ```
    /// use chip8_cpu::Register;
    ///
    /// assert_eq!(Register::from_index(0xA).unwrap(), Register::VA);
    /// assert!(Register::from_index(0x10).is_err());
    /// ```
    pub fn from_index(index: u8) -> Result<Register, RegisterOutOfRangeError> {
        Register::from_u8(index).ok_or(RegisterOutOfRangeError(index))
    }

    /// Returns the position of this register in the register file.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", *self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_index() {
        for index in 0..N_REGISTERS as u8 {
            let reg = Register::from_index(index).unwrap();
            assert_eq!(reg.index(), index as usize);
        }
        for &index in [0x10u8, 0x1F, 0x80, 0xFF].iter() {
            assert_eq!(
                Register::from_index(index),
                Err(RegisterOutOfRangeError(index))
            );
        }
    }

    #[test]
    fn display() {
        assert_eq!(Register::V0.to_string(), "V0");
        assert_eq!(Register::VF.to_string(), "VF");
    }
}
