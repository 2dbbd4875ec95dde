mod outcome;
mod progress;
mod request;

pub use outcome::TransferOutcome;
pub use progress::{Progress, ProgressFn};
pub use request::{DEFAULT_CHUNK_SIZE, IoPriority, TransferRequest};
