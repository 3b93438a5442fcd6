mod source;

pub use source::{DiskStore, MemStore, UnitStore};
