//! Operation-key scoped cancellation.
//!
//! A [`CancellationRegistry`] maps an [`OperationKey`] to the single live
//! [`CancellationHandle`] for that key. Coordinators hold a
//! [`RegistryLease`] for the lifetime of an operation; dropping the lease
//! releases the entry on every exit path.

mod key;
mod registry;

pub use key::OperationKey;
pub use registry::{CancellationHandle, CancellationRegistry, RegistryLease};
