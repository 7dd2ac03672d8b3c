use thiserror::Error;

/// Errors raised by the structural-break cointegration test.
///
/// `LinearAlgebra` and `NumericalInstability` are normally produced for a
/// single break pair and recovered by the search; they only reach the caller
/// when no pair could be evaluated at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CointError {
  /// Invalid model id, bad trimming, mismatched sample, empty break grid.
  #[error("configuration error: {0}")]
  Configuration(String),
  /// Rank-deficient regressor matrix.
  #[error("linear algebra error: {0}")]
  LinearAlgebra(String),
  /// Non-finite statistic or non-positive long-run variance.
  #[error("numerical instability: {0}")]
  NumericalInstability(String),
  /// No tabulated critical values for this number of regressors.
  #[error("unsupported configuration: no critical values for {k} regressors (supported: 1..=4)")]
  UnsupportedConfiguration { k: usize },
}

pub type CointResult<T> = Result<T, CointError>;

impl CointError {
  pub(crate) fn config(msg: impl Into<String>) -> Self {
    CointError::Configuration(msg.into())
  }
}
