pub mod loader;
pub mod provider;
pub mod yahoo;

pub use loader::*;
pub use provider::*;
pub use yahoo::*;
