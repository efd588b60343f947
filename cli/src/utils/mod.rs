pub mod date;
pub mod format;
pub mod logger;

pub use date::*;
pub use format::*;
pub use logger::*;
