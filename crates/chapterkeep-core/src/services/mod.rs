//! Leaf services composed by the download orchestrator.
//!
//! Each service takes its collaborators as injected `Arc<dyn Port>`s; there
//! is no process-wide instance. All persistent state lives behind the
//! registry store, so any number of instances can be built over it.

mod cleanup;
mod permission;
mod quota_probe;
mod registry;
mod size_estimator;
mod space_checker;

pub use cleanup::CleanupCoordinator;
pub use permission::PermissionNegotiator;
pub use quota_probe::StorageQuotaProbe;
pub use registry::OfflineRegistry;
pub use size_estimator::SizeEstimator;
pub use space_checker::SpaceAvailabilityChecker;
