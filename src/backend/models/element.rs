//! Element representations and their NA sentinels.
//!
//! Logical elements are tri-state bytes, integers reserve `i32::MIN`, doubles
//! use R's NA_real_ bit pattern (a NaN whose low word is 1954, distinct from
//! an ordinary NaN), character elements use `None`.

use super::r_type::RType;
use super::r_value::RValue;

pub const LOGICAL_FALSE: u8 = 0;
pub const LOGICAL_TRUE: u8 = 1;
pub const LOGICAL_NA: u8 = 0xFF;

pub const INT_NA: i32 = i32::MIN;

/// Bit pattern of R's `NA_real_`
pub const DOUBLE_NA_BITS: u64 = 0x7FF0_0000_0000_07A2;

#[inline]
pub fn double_na() -> f64 {
    f64::from_bits(DOUBLE_NA_BITS)
}

/// True only for NA_real_, not for other NaNs.
#[inline]
pub fn is_double_na(x: f64) -> bool {
    x.is_nan() && (x.to_bits() & 0xFFFF_FFFF) == 1954
}

#[inline]
pub fn logical_from_bool(b: bool) -> u8 {
    if b {
        LOGICAL_TRUE
    } else {
        LOGICAL_FALSE
    }
}

/// A complex number; NA when the real part is NA.
#[derive(Debug, Clone, Copy)]
pub struct RComplex {
    pub re: f64,
    pub im: f64,
}

impl RComplex {
    pub fn new(re: f64, im: f64) -> Self {
        RComplex { re, im }
    }
}

impl PartialEq for RComplex {
    fn eq(&self, other: &Self) -> bool {
        doubles_identical(self.re, other.re) && doubles_identical(self.im, other.im)
    }
}

/// Equality that treats NA == NA and NaN == NaN but keeps them apart.
pub fn doubles_identical(a: f64, b: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        a.is_nan() && b.is_nan() && is_double_na(a) == is_double_na(b)
    } else {
        a == b
    }
}

/// An element type stored in a vector.
pub trait Element: Clone {
    const TYPE: RType;

    /// The value used to fill holes when a vector is extended.
    fn na() -> Self;

    fn is_na(&self) -> bool;
}

impl Element for u8 {
    const TYPE: RType = RType::Logical;

    fn na() -> Self {
        LOGICAL_NA
    }

    fn is_na(&self) -> bool {
        *self == LOGICAL_NA
    }
}

impl Element for i32 {
    const TYPE: RType = RType::Integer;

    fn na() -> Self {
        INT_NA
    }

    fn is_na(&self) -> bool {
        *self == INT_NA
    }
}

impl Element for f64 {
    const TYPE: RType = RType::Double;

    fn na() -> Self {
        double_na()
    }

    fn is_na(&self) -> bool {
        is_double_na(*self)
    }
}

impl Element for RComplex {
    const TYPE: RType = RType::Complex;

    fn na() -> Self {
        RComplex::new(double_na(), 0.0)
    }

    fn is_na(&self) -> bool {
        is_double_na(self.re) || is_double_na(self.im)
    }
}

impl Element for Option<String> {
    const TYPE: RType = RType::Character;

    fn na() -> Self {
        None
    }

    fn is_na(&self) -> bool {
        self.is_none()
    }
}

// Lists have no NA; holes are NULL.
impl Element for RValue {
    const TYPE: RType = RType::List;

    fn na() -> Self {
        RValue::Null
    }

    fn is_na(&self) -> bool {
        false
    }
}
