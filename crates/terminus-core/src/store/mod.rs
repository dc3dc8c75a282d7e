// ── In-memory resource storage ──
//
// Collections are scoped to one invocation: owned values, mutated through
// `&mut self`, discarded with their owner.

pub mod collection;

pub use collection::Collection;
