//! Habitline streak computation.
//!
//! A streak is the number of consecutive calendar days, ending today or
//! yesterday, on which a habit has a completed check-in. Everything here
//! is pure: callers fetch the check-ins and pick the reference day.

pub mod day;
pub mod streak;

pub use day::{day_of, today};
pub use streak::{CheckInDay, completed_on, compute_streak};
