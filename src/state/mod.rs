//! State module for tracking run progress
//!
//! # Components
//!
//! - `RunState`: lifecycle of one source run (idle, running, completed, failed)

mod run_state;

pub use run_state::RunState;
