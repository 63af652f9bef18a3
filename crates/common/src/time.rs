//! Exact rational time: (count, rate) pairs with integer arithmetic.
//!
//! A `RationalTime` is a frame or sample count at an explicit rate
//! (e.g. 30000/1001 fps for video frames, 48000/1 for audio samples).
//! All arithmetic is exact integer math; conversions between rates either
//! succeed exactly or fail with `TimeError::InexactRescale`. There is no
//! `Default` impl for either type: a missing rate is a fatal input error,
//! never a 30fps guess.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TimeError;

/// A frame or sample rate as a positive rational number.
///
/// Invariant: `num > 0 && den > 0`, enforced at construction and at
/// deserialization (`try_from`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RateParts", into = "RateParts")]
pub struct FrameRate {
    num: i32,
    den: i32,
}

/// Raw serde representation of a `FrameRate`, validated on the way in.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
struct RateParts {
    num: i32,
    den: i32,
}

impl TryFrom<RateParts> for FrameRate {
    type Error = TimeError;

    fn try_from(parts: RateParts) -> Result<Self, Self::Error> {
        FrameRate::new(parts.num, parts.den)
    }
}

impl From<FrameRate> for RateParts {
    fn from(rate: FrameRate) -> Self {
        Self {
            num: rate.num,
            den: rate.den,
        }
    }
}

impl FrameRate {
    pub const FPS_24: Self = Self { num: 24, den: 1 };
    pub const FPS_25: Self = Self { num: 25, den: 1 };
    pub const FPS_30: Self = Self { num: 30, den: 1 };
    pub const FPS_29_97: Self = Self {
        num: 30000,
        den: 1001,
    };
    pub const FPS_60: Self = Self { num: 60, den: 1 };
    pub const AUDIO_48K: Self = Self {
        num: 48000,
        den: 1,
    };

    /// Create a rate, rejecting non-positive numerator or denominator.
    pub fn new(num: i32, den: i32) -> Result<Self, TimeError> {
        if num <= 0 || den <= 0 {
            return Err(TimeError::InvalidRate { num, den });
        }
        Ok(Self { num, den })
    }

    pub fn num(self) -> i32 {
        self.num
    }

    pub fn den(self) -> i32 {
        self.den
    }

    /// Frames (or samples) per second as f64. Display/estimation only --
    /// never used for timeline arithmetic.
    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

/// A point or duration in time: `count` frames at `rate`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RationalTime {
    pub count: i64,
    pub rate: FrameRate,
}

impl RationalTime {
    pub fn new(count: i64, rate: FrameRate) -> Self {
        Self { count, rate }
    }

    pub fn zero(rate: FrameRate) -> Self {
        Self { count: 0, rate }
    }

    /// Add another time at the same rate.
    pub fn checked_add(self, other: Self) -> Result<Self, TimeError> {
        self.require_same_rate(other)?;
        let count = self
            .count
            .checked_add(other.count)
            .ok_or(TimeError::Overflow)?;
        Ok(Self { count, ..self })
    }

    /// Subtract another time at the same rate.
    pub fn checked_sub(self, other: Self) -> Result<Self, TimeError> {
        self.require_same_rate(other)?;
        let count = self
            .count
            .checked_sub(other.count)
            .ok_or(TimeError::Overflow)?;
        Ok(Self { count, ..self })
    }

    /// Offset by a raw frame count at this time's own rate.
    pub fn offset(self, frames: i64) -> Result<Self, TimeError> {
        let count = self.count.checked_add(frames).ok_or(TimeError::Overflow)?;
        Ok(Self { count, ..self })
    }

    /// Exact comparison across rates via i128 cross-multiplication.
    ///
    /// `a.count / (a.num/a.den)` vs `b.count / (b.num/b.den)` compares as
    /// `a.count * a.den * b.num` vs `b.count * b.den * a.num`.
    pub fn cmp_exact(self, other: Self) -> Ordering {
        let lhs = self.count as i128 * self.rate.den as i128 * other.rate.num as i128;
        let rhs = other.count as i128 * other.rate.den as i128 * self.rate.num as i128;
        lhs.cmp(&rhs)
    }

    /// Convert to a different rate. Fails if the conversion is not exact.
    ///
    /// `new_count = count * to.num * from.den / (from.num * to.den)`
    pub fn rescale(self, to: FrameRate) -> Result<Self, TimeError> {
        if self.rate == to {
            return Ok(self);
        }
        let numer = self.count as i128 * to.num as i128 * self.rate.den as i128;
        let denom = self.rate.num as i128 * to.den as i128;
        if numer % denom != 0 {
            return Err(TimeError::InexactRescale {
                count: self.count,
                from_num: self.rate.num,
                from_den: self.rate.den,
                to_num: to.num,
                to_den: to.den,
            });
        }
        let count = numer / denom;
        let count = i64::try_from(count).map_err(|_| TimeError::Overflow)?;
        Ok(Self { count, rate: to })
    }

    /// Seconds as f64. Display/estimation only.
    pub fn as_secs_f64(self) -> f64 {
        self.count as f64 * self.rate.den as f64 / self.rate.num as f64
    }

    fn require_same_rate(self, other: Self) -> Result<(), TimeError> {
        if self.rate != other.rate {
            return Err(TimeError::RateMismatch {
                left_num: self.rate.num,
                left_den: self.rate.den,
                right_num: other.rate.num,
                right_den: other.rate.den,
            });
        }
        Ok(())
    }
}

impl fmt::Display for RationalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.count, self.rate)
    }
}
