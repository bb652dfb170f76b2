pub mod train;
pub mod watch;

pub use train::{StopReason, TrainConfig, TrainMode};
pub use watch::WatchMode;
