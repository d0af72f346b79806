pub mod backends;
pub mod driver;
pub mod error;
pub mod pipeline;
pub mod summary;
pub mod sweep;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use backends::{build_backend, BackendKind, DrivenBackend, HttpBackend, ScrapeBackend};
pub use driver::{Bounds, DomDriver, ElementHandle};
pub use error::{DriverError, ScrapeError};
pub use pipeline::{Extraction, ExtractionInput, ExtractionPipeline, PipelineConfig, Strategy};
pub use summary::ScrapeSummary;
pub use sweep::{DrivenSweep, SweepConfig, SweepDelays, SweepSelectors};
