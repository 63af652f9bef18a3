//! Error types for rational time arithmetic (thiserror-based).

use thiserror::Error;

/// Errors from exact rational time arithmetic.
///
/// Every variant is a hard error: the kernel never substitutes a default
/// rate and never rounds an inexact conversion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeError {
    #[error("invalid frame rate {num}/{den}: numerator and denominator must be > 0")]
    InvalidRate { num: i32, den: i32 },

    #[error("rate mismatch: {left_num}/{left_den} vs {right_num}/{right_den}")]
    RateMismatch {
        left_num: i32,
        left_den: i32,
        right_num: i32,
        right_den: i32,
    },

    #[error("inexact rescale of count {count} from {from_num}/{from_den} to {to_num}/{to_den}")]
    InexactRescale {
        count: i64,
        from_num: i32,
        from_den: i32,
        to_num: i32,
        to_den: i32,
    },

    #[error("arithmetic overflow in rational time computation")]
    Overflow,
}
