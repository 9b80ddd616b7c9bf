#![deny(unsafe_code)]
//! # graft-preloader
//!
//! Batch driver for interface injection.
//!
//! A batch scans candidate plugin units, collects every
//! `InjectInterface` request from units marked `RequiresInjections`, then
//! patches each target unit with the [`graft_weaver::WeavingEngine`].
//! Hosts provide units through the [`host`] traits; [`JsonUnitStore`]
//! covers the on-disk case.
//!
//! ```text
//! Preloader::new(config)
//!     .plan(&plugins)          scan candidates, build the WeavePlan
//!     .run(&targets, &sink)    patch each target unit, optional dev dump
//!     .finish()                failure banner, BatchReport
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod host;
pub mod plan;

pub use batch::{BatchReport, Preloader, FAILURE_BANNER};
pub use config::{DevelConfig, LoggingConfig, PreloaderConfig};
pub use error::{HostError, HostResult, PreloaderError, PreloaderResult};
pub use host::{JsonUnitStore, MemoryUnitStore, UnitResolver, UnitSink, UnitSource};
pub use plan::{Planner, WeavePlan};
