//! Injection jobs.

use graft_model::{ErrorStrategy, InterfaceDefinition};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Jobs of one unit keyed by target type full name, in plan order.
pub type JobsByType = IndexMap<String, Vec<InjectionJob>>;

/// One request to make `target_type` implement `interface`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionJob {
    /// Full name of the type to edit.
    pub target_type: String,
    pub interface: InterfaceDefinition,
    /// Strategy inherited from the plugin unit and the request.
    #[serde(default)]
    pub strategy: ErrorStrategy,
}

impl InjectionJob {
    pub fn new(
        target_type: impl Into<String>,
        interface: InterfaceDefinition,
        strategy: ErrorStrategy,
    ) -> Self {
        Self {
            target_type: target_type.into(),
            interface,
            strategy,
        }
    }
}
