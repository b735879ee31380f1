//! Call assistant knowledge base
//!
//! QA records, the ordered record store and the BFSI dataset generator

pub mod dataset;
pub mod store;
pub mod types;

pub use dataset::generate_bfsi_dataset;
pub use store::RecordStore;
pub use types::Record;
