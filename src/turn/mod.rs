//! Turn execution: threshold schedules, the stream-matching driver, and
//! batched persistence of matched commitments.

pub mod executor;
pub mod schedule;
pub mod writer;
