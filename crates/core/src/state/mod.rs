//! State management for storyboard runs.
//!
//! This module provides:
//! - Stage status bookkeeping and the run state machine
//! - Resume planning and sub-item progress
//! - Cooperative cancellation
//! - RunRegistry for coordinating runs by identifier

pub mod cancellation;
pub mod manager;
pub mod planner;
pub mod progress;
pub mod run;
pub mod tracker;
