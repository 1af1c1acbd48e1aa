//! `census-recon`: roster merge and census reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded row-sets, returns merged views,
//! field-level differences, manager groupings and composed drafts.
//! No file IO and no CLI dependencies.

pub mod authority;
pub mod compose;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod merge;
pub mod model;
pub mod record;
pub mod review;
pub mod summary;

pub use authority::{grant_edit, group, AuthorityGroup, AuthorityGroups, DirectoryColumns, EditGrant};
pub use compose::{compose, ComposeOptions, DraftEmail};
pub use config::{CensusConfig, MergePolicy, SourceRole};
pub use diff::{diff, reconcile, DifferenceEntry, DifferenceRecord};
pub use engine::run;
pub use error::ReconError;
pub use merge::{combine, merge, merge_required, merge_with_policy, require_sources};
pub use model::{MergedView, ReconInput, ReconResult};
pub use record::{CellValue, Identifier, TabularRecord};
pub use review::{ApprovalStatus, ReviewSession, SaveOutcome};
