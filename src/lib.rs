//! Materials Manager - construction materials pricelist registry
//!
//! Library core behind the CLI: a durable store of material price records,
//! user and job registries, per-job allocation ledgers, a JSON snapshot
//! exporter and a small HTTP shuttle for syncing the snapshot.

pub mod error;
pub mod ident;
pub mod ledger;
pub mod materials;
pub mod registry;
pub mod snapshot;
pub mod spreadsheet;
pub mod sync;
pub mod vendors;
pub mod web;

pub use error::{Error, Result};
pub use materials::{MaterialFields, MaterialRecord, PriceComparison, SearchFields, SortKey};
pub use registry::{Job, JobFields, UserFields, UserProfile};
pub use snapshot::Snapshot;
