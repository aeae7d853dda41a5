pub mod cost_resolver;
pub mod enricher;
pub mod error;
pub mod fact_loader;
pub mod inventory_matcher;
pub mod pipeline;
pub mod types;
pub mod validator;

pub use cost_resolver::CostBook;
pub use enricher::{enrich_all, enrich_one};
pub use error::{PipelineError, PipelineResult};
pub use inventory_matcher::SnapshotIndex;
pub use pipeline::{MasterDatasetPipeline, MasterRun};
pub use types::{
    CostProfile, EnrichedTransaction, InventoryMatch, InventorySnapshot, PurchaseRecord,
    SalesTransaction, SnapshotType,
};
pub use validator::{validate, ValidationConfig, ValidationReport};
