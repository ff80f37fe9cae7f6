pub mod batch;
pub mod pool;
pub mod progress;

pub use batch::{batch_ranges, map_in_batches};
pub use pool::WorkerPool;
pub use progress::Progress;
