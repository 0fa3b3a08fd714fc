pub mod classifier;
pub mod condition;
pub mod config;
pub mod error;
pub mod page;
pub mod preprocess;
pub mod report;
pub mod scanner;
pub mod server;
pub mod task;
pub mod utils;

pub use condition::{NailCondition, PredictionResult};
pub use error::ScanError;
pub use scanner::NailScanner;
