use nalgebra::DMatrix;
use nalgebra::DVector;

use super::error::CointError;
use super::error::CointResult;

/// Lag-order selection rule for the residual ADF regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LagSelection {
  Fixed(usize),
  Aic,
  Bic,
  TStat,
}

impl LagSelection {
  /// Map the conventional integer code (1 = AIC, 2 = BIC, 3 = t-stat).
  pub fn from_code(ic: u8) -> CointResult<Self> {
    match ic {
      1 => Ok(LagSelection::Aic),
      2 => Ok(LagSelection::Bic),
      3 => Ok(LagSelection::TStat),
      other => Err(CointError::config(format!(
        "invalid information criterion code {other} (expected 1, 2 or 3)"
      ))),
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      LagSelection::Fixed(_) => "fixed",
      LagSelection::Aic => "AIC",
      LagSelection::Bic => "BIC",
      LagSelection::TStat => "t-stat",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalValues {
  pub one_percent: f64,
  pub five_percent: f64,
  pub ten_percent: f64,
}

impl CriticalValues {
  pub fn value_at(self, alpha: f64) -> f64 {
    if alpha <= 0.01 {
      self.one_percent
    } else if alpha <= 0.05 {
      self.five_percent
    } else {
      self.ten_percent
    }
  }

  /// Left-tailed decision: the null of no cointegration is rejected when the
  /// statistic falls below the critical value.
  pub fn rejects(self, statistic: f64, alpha: f64) -> bool {
    statistic < self.value_at(alpha)
  }
}

#[derive(Debug, Clone)]
pub struct OlsResult {
  pub beta: Vec<f64>,
  pub std_err: Vec<f64>,
  pub residuals: Vec<f64>,
  pub sse: f64,
  pub sigma2: f64,
  pub nobs: usize,
  pub k: usize,
}

impl OlsResult {
  /// t-ratio of coefficient `idx`; `NaN` when its standard error vanishes.
  pub fn t_stat(&self, idx: usize) -> f64 {
    let se = self.std_err[idx];
    if se > 0.0 { self.beta[idx] / se } else { f64::NAN }
  }
}

pub fn difference(y: &[f64]) -> Vec<f64> {
  y.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Least squares via a thin SVD of `x`.
///
/// The numerical rank is checked against `max(n, k) · ε · σ_max`; a
/// rank-deficient design returns [`CointError::LinearAlgebra`] instead of a
/// meaningless solution.
pub fn ols(x: &DMatrix<f64>, y: &DVector<f64>) -> CointResult<OlsResult> {
  let (n, k) = x.shape();
  if y.len() != n {
    return Err(CointError::config(format!(
      "OLS row mismatch: {} responses for {n} design rows",
      y.len()
    )));
  }
  if k == 0 || n <= k {
    return Err(CointError::LinearAlgebra(format!(
      "OLS needs more observations than regressors (nobs = {n}, k = {k})"
    )));
  }

  let svd = x.clone().svd(true, true);
  let sigma_max = svd.singular_values.max();
  let tol = (n.max(k) as f64) * f64::EPSILON * sigma_max;
  let rank = svd.rank(tol);
  if rank < k {
    return Err(CointError::LinearAlgebra(format!(
      "design matrix is rank deficient (rank {rank} < {k} columns)"
    )));
  }

  let beta = svd
    .solve(y, tol)
    .map_err(|e| CointError::LinearAlgebra(e.to_string()))?;
  let residuals_vec = y - x * &beta;
  let residuals: Vec<f64> = residuals_vec.iter().copied().collect();
  let sse = residuals.iter().map(|u| u * u).sum::<f64>();
  let sigma2 = (sse / (n - k) as f64).max(0.0);

  // diag((X'X)^{-1}) = Σ_j (V_ij / s_j)^2
  let v_t = svd
    .v_t
    .as_ref()
    .ok_or_else(|| CointError::LinearAlgebra("SVD did not return V^T".into()))?;
  let mut std_err = vec![0.0; k];
  for (i, se) in std_err.iter_mut().enumerate() {
    let mut diag = 0.0;
    for (j, s) in svd.singular_values.iter().enumerate() {
      let v = v_t[(j, i)] / s;
      diag += v * v;
    }
    *se = (sigma2 * diag).max(0.0).sqrt();
  }

  Ok(OlsResult {
    beta: beta.iter().copied().collect(),
    std_err,
    residuals,
    sse,
    sigma2,
    nobs: n,
    k,
  })
}

pub fn aic_from_sse(sse: f64, nobs: usize, k: usize) -> f64 {
  let n = nobs as f64;
  n * (sse / n).ln() + 2.0 * k as f64
}

pub fn bic_from_sse(sse: f64, nobs: usize, k: usize) -> f64 {
  let n = nobs as f64;
  n * (sse / n).ln() + (k as f64) * n.ln()
}

/// AR(1) slope through the origin, `Σ u_t u_{t-1} / Σ u_{t-1}^2`.
pub fn ar1_coefficient(u: &[f64]) -> f64 {
  let (num, den) = u
    .windows(2)
    .fold((0.0, 0.0), |(num, den), w| (num + w[1] * w[0], den + w[0] * w[0]));
  if den > 0.0 { num / den } else { 0.0 }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use nalgebra::DMatrix;
  use nalgebra::DVector;

  use super::LagSelection;
  use super::ar1_coefficient;
  use super::ols;
  use crate::stats::cointegration::error::CointError;

  #[test]
  fn ols_recovers_exact_linear_relation() {
    let n = 30;
    let x = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { i as f64 });
    let y = DVector::from_fn(n, |i, _| 2.0 + 0.5 * i as f64);
    let fit = ols(&x, &y).unwrap();
    assert_abs_diff_eq!(fit.beta[0], 2.0, epsilon = 1e-10);
    assert_abs_diff_eq!(fit.beta[1], 0.5, epsilon = 1e-10);
    assert!(fit.sse < 1e-18);
    assert_eq!(fit.residuals.len(), n);
  }

  #[test]
  fn ols_flags_collinear_columns() {
    let n = 20;
    let x = DMatrix::from_fn(n, 3, |i, j| match j {
      0 => 1.0,
      1 => i as f64,
      _ => 2.0 * i as f64,
    });
    let y = DVector::from_fn(n, |i, _| i as f64);
    assert!(matches!(ols(&x, &y), Err(CointError::LinearAlgebra(_))));
  }

  #[test]
  fn ols_standard_errors_match_textbook_slope_formula() {
    let xs = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let ys = [1.1, 1.9, 3.2, 3.8, 5.3, 5.9];
    let x = DMatrix::from_fn(6, 2, |i, j| if j == 0 { 1.0 } else { xs[i] });
    let y = DVector::from_row_slice(&ys);
    let fit = ols(&x, &y).unwrap();
    let mean = xs.iter().sum::<f64>() / 6.0;
    let sxx = xs.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>();
    assert_abs_diff_eq!(fit.std_err[1], (fit.sigma2 / sxx).sqrt(), epsilon = 1e-10);
  }

  #[test]
  fn ar1_coefficient_of_geometric_sequence() {
    let u: Vec<f64> = (0..10).map(|t| 0.5f64.powi(t)).collect();
    assert_abs_diff_eq!(ar1_coefficient(&u), 0.5, epsilon = 1e-12);
  }

  #[test]
  fn lag_selection_codes() {
    assert_eq!(LagSelection::from_code(1).unwrap(), LagSelection::Aic);
    assert_eq!(LagSelection::from_code(2).unwrap(), LagSelection::Bic);
    assert_eq!(LagSelection::from_code(3).unwrap(), LagSelection::TStat);
    assert!(LagSelection::from_code(4).is_err());
  }
}
