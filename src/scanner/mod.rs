pub mod controller;
pub mod error;
pub mod publisher;
pub mod state;

pub use controller::ScannerController;
pub use error::ScanError;
pub use publisher::{ScannerEvent, StatePublisher};
pub use state::{PipelineEvent, PipelineState};
