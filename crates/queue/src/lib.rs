pub mod error;
pub mod failed;
pub mod memory;
pub mod policy;
pub mod queue;
pub mod retry;

pub use error::{JobError, QueueError};
pub use failed::FailedJob;
pub use memory::{MemoryJobQueue, QueueConfig};
pub use policy::JobPolicy;
pub use queue::{CleanReport, EnqueueOutcome, Job, JobProcessor, JobQueue};
pub use retry::RetryStrategy;
