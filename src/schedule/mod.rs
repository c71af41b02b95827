pub mod allocator;
pub mod analytics;
pub mod conflicts;
pub mod engine;
pub mod error;
pub mod graph;
pub mod types;
pub mod validator;


pub use allocator::*;
pub use analytics::*;
pub use conflicts::*;
pub use engine::*;
pub use error::*;
pub use graph::*;
pub use types::*;
pub use validator::*;
