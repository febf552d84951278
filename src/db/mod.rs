pub mod migrations;
pub mod repository;
pub mod store;

pub use store::KeyValueStore;
#[cfg(test)]
pub use store::MemoryStore;
