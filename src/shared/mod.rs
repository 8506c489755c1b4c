//! Thread-safe building blocks shared by the pool and by callers
//! that need a safe counter or map of their own.

pub mod counter;
pub mod guarded_map;

pub use counter::AtomicCounter;
pub use guarded_map::GuardedMap;
