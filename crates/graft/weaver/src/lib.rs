#![deny(unsafe_code)]
//! # graft-weaver
//!
//! Interface-injection weaving engine.
//!
//! Given a type from a compiled unit and an interface template from
//! another unit, [`WeavingEngine`] synthesizes the members the type is
//! missing (backing fields, property and event accessors, method stubs)
//! and registers the interface as implemented.
//!
//! ## Components
//!
//! - **PolicyResolver**: strategy override resolution and anomaly handling
//! - **CollisionGuard**: per-job visited set and insertion-time name check
//! - **AttributeProjector**: annotation copying and the injected marker
//! - **PropertySynthesizer / EventSynthesizer / MethodStubSynthesizer**
//! - **WeavingEngine**: per-job orchestration and the batch boundary
//!
//! Anomalies handled with [`ErrorStrategy::Terminate`](graft_model::ErrorStrategy)
//! abort the job with [`WeaveError::Terminated`]; the engine catches it
//! and marks the [`BatchContext`] as failed, which skips every later job.

mod accessor;
pub mod context;
pub mod engine;
pub mod error;
pub mod event;
pub mod guard;
pub mod job;
pub mod method;
pub mod policy;
pub mod projector;
pub mod property;

pub use context::{BatchContext, BatchId, BatchStats, JobOutcome};
pub use engine::{JobScope, WeavingEngine};
pub use error::{Anomaly, WeaveError, WeaveResult};
pub use event::EventSynthesizer;
pub use guard::{CollisionGuard, MemberKey, VisitedSet};
pub use job::{InjectionJob, JobsByType};
pub use method::MethodStubSynthesizer;
pub use policy::PolicyResolver;
pub use projector::AttributeProjector;
pub use property::PropertySynthesizer;
