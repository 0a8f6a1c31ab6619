// # Zone-Map Store Implementations
//
// - `FileZoneMapStore`: line-oriented file, rewritten on every change
// - `MemoryZoneMapStore`: process-local, for tests and `--no-cache`

pub mod file;
pub mod memory;

pub use file::FileZoneMapStore;
pub use memory::MemoryZoneMapStore;
