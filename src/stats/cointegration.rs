//! Residual-based cointegration tests with endogenous structural breaks.
//!
//! $$
//! ADF^{*},\ Z_t^{*},\ Z_\alpha^{*}=\inf_{(\tau_1,\tau_2)}\{ADF,\ Z_t,\ Z_\alpha\}(\tau_1,\tau_2)
//! $$
//!
pub mod adf;
pub mod common;
pub mod critical_values;
pub mod design;
pub mod error;
pub mod hatemi_j;
pub mod kernel;
pub mod lrv;
pub mod phillips_perron;
pub mod search;

pub use common::CriticalValues;
pub use common::LagSelection;
pub use design::BreakPair;
pub use design::ModelSpec;
pub use design::Sample;
pub use error::CointError;
pub use error::CointResult;
pub use hatemi_j::HatemiConfig;
pub use hatemi_j::HatemiResult;
pub use hatemi_j::StatisticOutcome;
pub use hatemi_j::hatemi_j_test;
pub use kernel::BandwidthRule;
pub use kernel::VarianceMethod;
pub use search::SearchConfig;
