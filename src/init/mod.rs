//! One-time initialization: the singleton initializer, its options, and
//! the process-wide debug flag.

pub mod debug;
pub mod initializer;
pub mod options;
