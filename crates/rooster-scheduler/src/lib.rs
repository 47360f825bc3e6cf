//! # Rooster Scheduler
//! Fires broadcast jobs at configured wall-clock times in a fixed UTC
//! offset, re-arming daily. Firing spawns the broadcast as an independent
//! task so the timer loop never blocks on a slow pass.

pub mod clock;
pub mod engine;

pub use clock::next_occurrence;
pub use engine::{Job, Scheduler, SchedulerState};
