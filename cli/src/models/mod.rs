pub mod price_history;
pub mod stats;
pub mod table;

pub use price_history::*;
pub use stats::*;
pub use table::*;
