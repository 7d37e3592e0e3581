//! Physical reconciler.
//!
//! Two cooperating halves keep the logical ledger and the physical world in
//! agreement:
//!
//! - the **sensor correlator** consumes shelf detections/removals and either
//!   confirms the matching pending operation or flags the event as
//!   unplanned;
//! - the **timeout sweeper** periodically rolls back pending operations
//!   whose sensor handshake never arrived.
//!
//! Both paths mutate state only under the owning shelf's lease, and every
//! operation advance is status-guarded inside the transaction, so a sweep or
//! confirm racing another instance is a no-op rather than a double apply.

pub mod reconciler;
pub mod sweeper;

pub use reconciler::PhysicalReconciler;
pub use sweeper::SweepReport;
