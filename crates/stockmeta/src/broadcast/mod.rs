//! Broadcasting of run events to any number of observers (CLI renderer,
//! log sinks, UI bridges).

pub mod progress;

pub use progress::ProgressBroadcaster;
