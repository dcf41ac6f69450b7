pub mod common;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use common::{SourceImage, Upload};
pub use config::Configuration;
pub use coordinator::{AnalysisCoordinator, CoordinatorBuilder, Submission};
pub use error::{AppError, Capability, ErrorKind};
pub use logging::init_logging;
