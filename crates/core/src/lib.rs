//! Core library for the peekwatch anti-peek monitor.
//!
//! The detection worker owns a frame source, a face detector, a
//! stability evaluator, and an alert decision engine; reactions and
//! the UI observe it through fire-and-forget dispatch and a
//! latest-value mailbox. GUI, camera drivers, and detection models
//! live behind the domain traits in `capture`, `detection`, and
//! `reaction`.

pub mod capture;
pub mod config;
pub mod detection;
pub mod monitor;
pub mod reaction;
pub mod shared;
