pub mod capturer;
pub mod progress;
