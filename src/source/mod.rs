pub mod surface;
pub mod threaded;
pub mod turntable;
