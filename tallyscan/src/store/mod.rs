pub mod memory;
pub mod traits;

pub use memory::{MemoryCursor, MemoryStore};
pub use traits::{PageRequest, TableStore};
