pub mod constants;
pub mod conversion;
pub mod dataset;
pub mod fixit;
pub mod ingest;
pub mod ingest_errors;
pub mod node;
pub mod ref_system;
pub mod state;

pub use dataset::{DataSet, DetectorGeometry, DetectorPosition, Spectrum};
pub use fixit::{FixRecord, Fixit};
pub use ingest::{ingest_entry, ingest_file, IngestOptions, IngestReport, IngestedDataSet};
pub use ingest_errors::IngestError;
pub use node::{MemNode, NxNode, NxValue};
pub use ref_system::{from_target_convention, to_target_convention, SphericalCoords};
pub use state::FileState;
