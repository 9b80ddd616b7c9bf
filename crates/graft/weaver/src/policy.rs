//! Error strategy resolution and anomaly handling.
//!
//! Strategies are declared with the `HandleErrors` annotation at four
//! levels: the plugin unit, the injection request, the interface and the
//! individual interface member. The most specific declared level wins;
//! with nothing declared the strategy is [`ErrorStrategy::Terminate`].

use graft_model::annotation::find_strategy;
use graft_model::{Annotation, ErrorStrategy};
use tracing::{error, warn};

use crate::error::{Anomaly, WeaveError, WeaveResult};

/// Stateless strategy resolver.
pub struct PolicyResolver;

impl PolicyResolver {
    /// Strategy for a member or interface carrying `annotations`, falling
    /// back to `inherited` when it declares none.
    pub fn resolve(inherited: ErrorStrategy, annotations: &[Annotation]) -> WeaveResult<ErrorStrategy> {
        Ok(find_strategy(annotations)?.unwrap_or(inherited))
    }

    /// Effective strategy from declared levels, outermost first.
    pub fn effective(levels: &[Option<ErrorStrategy>]) -> ErrorStrategy {
        levels.iter().rev().find_map(|level| *level).unwrap_or_default()
    }

    /// Apply `strategy` to `anomaly`.
    ///
    /// Returns `Err(WeaveError::Terminated)` for the terminate strategy; the
    /// caller propagates it to the engine boundary.
    pub fn handle(anomaly: Anomaly, strategy: ErrorStrategy) -> WeaveResult<()> {
        match strategy {
            ErrorStrategy::Terminate => {
                error!(%anomaly, "Weaving anomaly, terminating");
                Err(WeaveError::Terminated(anomaly))
            }
            ErrorStrategy::LogError => {
                error!(%anomaly, "Weaving anomaly");
                Ok(())
            }
            ErrorStrategy::LogWarning => {
                warn!(%anomaly, "Weaving anomaly");
                Ok(())
            }
            ErrorStrategy::Ignore => Ok(()),
        }
    }
}
