//! Bounded ring buffers for raw debug dump fragments.
//!
//! A [`ring::BoundedRecordBuffer`] keeps whole records under a byte budget,
//! evicting the oldest first. A [`ring::RingCollector`] owns one buffer per
//! named source and produces reports of what is retained.

pub mod error;
pub mod ring;
pub mod utils;
