//! # hatemi-coint
//!
//! Residual-based cointegration testing with two unknown structural breaks
//! in the long-run relationship (Hatemi-J, 2008).
//!
//! ```ignore
//! use hatemi_coint::stats::cointegration::{hatemi_j_test, HatemiConfig, Sample};
//!
//! let sample = Sample::bivariate(&y, &x)?;
//! let res = hatemi_j_test(&sample, HatemiConfig::default())?;
//! println!("{res}");
//! ```
//!
pub mod stats;
