pub mod block_arena;
pub mod spin_lock_set;

pub use block_arena::BlockArena;
pub use spin_lock_set::SpinLockSet;
