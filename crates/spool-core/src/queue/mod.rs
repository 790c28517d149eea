//! Queue module: bounded buffer, handler pool, dispatch state machine.
//!
//! Envelope lifecycle:
//! - `send` appends an unlocked envelope (or overflows once send retries run out)
//! - a poll tick locks the first unlocked envelope and checks out a handler
//! - the dispatch job removes it on success, or unlocks it once its retry
//!   budget is spent; the handler returns to the pool either way
//! - a tick that selects an expired envelope drops it

mod dispatch;
mod memory;
mod pool;
mod retry;
mod state;

pub use dispatch::{DispatchJob, DispatchReport};
pub use memory::{InMemoryQueue, Tick};
pub use pool::{HandlerPool, HandlerSlot};
pub use retry::RetryPolicy;
pub use state::DispatchState;
