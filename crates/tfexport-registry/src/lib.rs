//! tfexport Registry - Resource dependency registry
//!
//! Every exported object is described by a [`ResourceDescriptor`]. Producers
//! insert descriptors while the object graph is being built; render
//! functions later resolve cross references through the same registry.
//!
//! - **ResourceDescriptor**: one exported object and the expressions that refer to it
//! - **ResourceRegistry**: the lock-guarded store shared by all tasks of a run
//! - **DummyVariable**: a note that a placeholder replaced a secret value
//!
//! ## Lookup misses
//!
//! Resolving an object that was never inserted is not an error. The miss is
//! logged and an empty expression is returned, so a mostly complete export
//! stays usable and can be fixed by hand.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod descriptor;
pub mod dummy;
pub mod error;
pub mod registry;

// Re-exports
pub use descriptor::{ParameterType, Render, RenderFn, ResourceDescriptor, ResourceParameter};
pub use dummy::DummyVariable;
pub use error::{RenderError, RenderResult, Result};
pub use registry::{RenderJob, ResourceRegistry};
