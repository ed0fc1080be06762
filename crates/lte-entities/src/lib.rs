pub mod entity_trait;
pub mod messagerouter;
pub mod sched;

// Re-export commonly used items from router
pub use entity_trait::LteEntityTrait;
pub use messagerouter::{MessageQueue, MessageRouter};
pub use sched::{FfMacScheduler, MacScheduler};
