//! Width-tagged stand-ins for ciphertext values.
//!
//! Board and clue math goes exclusively through these types. Arithmetic
//! (`add`, `shl`) range-checks its result against the declared width and
//! fails with [`ValidationError::Overflow`]; a fixed-width overflow is a
//! broken precondition, never a silent wrap. Casts (`as_ct*`) truncate by
//! masking. `reveal` is the gateway-side read; no other code inspects the
//! inner value.

use serde::{Deserialize, Serialize};

use crate::{ValidationError, Word256};

/// Confidential 4-bit value. Invariant: inner value is `<= 0xF`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ct4(u8);

/// Confidential 8-bit value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ct8(u8);

/// Confidential 32-bit value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ct32(u32);

/// Confidential 256-bit value; the board and clue-cache representation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ct256(Word256);

/// Confidential boolean.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtBool(bool);

impl Ct4 {
    pub const ZERO: Self = Self(0);

    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if value > 0xF {
            return Err(ValidationError::Overflow { width: 4 });
        }
        Ok(Self(value))
    }

    pub fn add(self, rhs: Self) -> Result<Self, ValidationError> {
        Self::new(self.0 + rhs.0)
    }

    pub fn or(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }

    /// AND with a clear 4-bit mask; the mask itself is width-checked.
    pub fn and(self, mask: u8) -> Result<Self, ValidationError> {
        Self::new(mask)?;
        Ok(Self(self.0 & mask))
    }

    pub fn shl(self, shift: u8) -> Result<Self, ValidationError> {
        if self.0 == 0 {
            return Ok(self);
        }
        let shifted = (self.0 as u32).checked_shl(shift as u32).unwrap_or(u32::MAX);
        if shifted > 0xF {
            return Err(ValidationError::Overflow { width: 4 });
        }
        Ok(Self(shifted as u8))
    }

    pub fn shr(self, shift: u8) -> Self {
        Self(self.0.checked_shr(shift as u32).unwrap_or(0))
    }

    /// Gateway-side decryption stand-in.
    pub fn reveal(self) -> u8 {
        self.0
    }
}

impl Ct8 {
    pub const ZERO: Self = Self(0);

    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    pub fn add(self, rhs: Self) -> Result<Self, ValidationError> {
        match self.0.checked_add(rhs.0) {
            Some(sum) => Ok(Self(sum)),
            None => Err(ValidationError::Overflow { width: 8 }),
        }
    }

    pub fn and(self, mask: u8) -> Self {
        Self(self.0 & mask)
    }

    pub fn shr(self, shift: u8) -> Self {
        Self(self.0.checked_shr(shift as u32).unwrap_or(0))
    }

    pub fn as_ct4(self) -> Ct4 {
        Ct4(self.0 & 0xF)
    }

    pub fn reveal(self) -> u8 {
        self.0
    }
}

impl Ct32 {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn reveal(self) -> u32 {
        self.0
    }
}

impl Ct256 {
    pub const ZERO: Self = Self(Word256::ZERO);

    /// Wrap a clear word as a confidential one.
    pub const fn seal(value: Word256) -> Self {
        Self(value)
    }

    pub fn and(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }

    pub fn or(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }

    pub fn xor(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }

    pub fn eq(self, rhs: Self) -> CtBool {
        CtBool(self.0 == rhs.0)
    }

    pub fn shl(self, shift: u8) -> Result<Self, ValidationError> {
        match self.0.checked_shl(shift as u32) {
            Some(shifted) => Ok(Self(shifted)),
            None => Err(ValidationError::Overflow { width: 256 }),
        }
    }

    pub fn shr(self, shift: u8) -> Self {
        Self(self.0.shr(shift as u32))
    }

    pub fn as_ct4(self) -> Ct4 {
        Ct4((self.0.low_u64() & 0xF) as u8)
    }

    pub fn as_ct8(self) -> Ct8 {
        Ct8(self.0.low_u64() as u8)
    }

    pub fn as_ct32(self) -> Ct32 {
        Ct32(self.0.low_u64() as u32)
    }

    pub fn reveal(self) -> Word256 {
        self.0
    }
}

impl CtBool {
    pub const fn new(value: bool) -> Self {
        Self(value)
    }

    pub fn reveal(self) -> bool {
        self.0
    }
}
