pub mod config;
pub mod domain;
pub mod errors;
pub mod estimate;
pub mod format;
pub mod gate;
pub mod reconcile;
pub mod reference;

pub use domain::profile::{PartialProfile, Profile};
pub use domain::verdict::SuitabilityVerdict;
pub use errors::{InterfaceError, SourceError};
pub use estimate::price::{MarketPrice, PriceProvenance, PriceResolver, PriceSource, QuoteFeed};
pub use estimate::yields::{HistoricalRecord, HistoricalYields, YieldProvenance, YieldRate, YieldResolver};
pub use estimate::{EstimateReport, Estimation, EstimationEngine, EstimationResult, EstimationSettings};
pub use gate::{GateDecision, SuitabilityGate, SuppressReason};
pub use reconcile::ProfileReconciler;
