//! Augmented Dickey-Fuller regression on cointegrating residuals.
//!
//! $$
//! \Delta\hat u_t=\pi\hat u_{t-1}+\sum_{j=1}^{L}\phi_j\Delta\hat u_{t-j}+e_t
//! $$
//!
use nalgebra::DMatrix;
use nalgebra::DVector;
use statrs::distribution::ContinuousCDF;
use statrs::distribution::Normal;

use super::common::LagSelection;
use super::common::OlsResult;
use super::common::aic_from_sse;
use super::common::bic_from_sse;
use super::common::difference;
use super::common::ols;
use super::error::CointError;
use super::error::CointResult;

/// Lag-selection settings for the residual ADF regression, fixed for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualAdf {
  /// Largest lag order considered.
  pub max_lags: usize,
  pub selection: LagSelection,
  /// Two-sided normal critical value used by [`LagSelection::TStat`].
  pub t_crit: f64,
}

/// Fitted residual ADF regression at the selected lag order.
#[derive(Debug, Clone, Copy)]
pub struct AdfFit {
  pub lag: usize,
  /// t-ratio on the lagged level `π`.
  pub statistic: f64,
  pub gamma: f64,
  pub std_err_gamma: f64,
  pub nobs: usize,
}

impl ResidualAdf {
  pub fn new(max_lags: usize, selection: LagSelection, tstat_alpha: f64) -> CointResult<Self> {
    Ok(Self {
      max_lags,
      selection,
      t_crit: tstat_critical_value(tstat_alpha)?,
    })
  }

  /// ADF statistic for the residual sequence `u`.
  pub fn statistic(&self, u: &[f64]) -> CointResult<AdfFit> {
    let max_lag = self.max_lags.min(max_feasible_lag(u.len()));
    let (lag, fit) = match self.selection {
      LagSelection::Fixed(p) => (p.min(max_lag), fit_adf(u, p.min(max_lag))?),
      LagSelection::Aic | LagSelection::Bic => self.select_by_ic(u, max_lag)?,
      LagSelection::TStat => self.select_by_tstat(u, max_lag)?,
    };

    let statistic = fit.t_stat(0);
    if !statistic.is_finite() {
      return Err(CointError::NumericalInstability(format!(
        "ADF t-ratio is not finite at lag {lag}"
      )));
    }
    Ok(AdfFit {
      lag,
      statistic,
      gamma: fit.beta[0],
      std_err_gamma: fit.std_err[0],
      nobs: fit.nobs,
    })
  }

  fn select_by_ic(&self, u: &[f64], max_lag: usize) -> CointResult<(usize, OlsResult)> {
    let mut best: Option<(f64, usize, OlsResult)> = None;
    let mut last_err = None;

    for lag in 0..=max_lag {
      let fit = match fit_adf(u, lag) {
        Ok(fit) => fit,
        Err(e) => {
          last_err = Some(e);
          continue;
        }
      };
      let score = match self.selection {
        LagSelection::Bic => bic_from_sse(fit.sse, fit.nobs, fit.k),
        _ => aic_from_sse(fit.sse, fit.nobs, fit.k),
      };
      if best.as_ref().map_or(true, |(s, _, _)| score < *s) {
        best = Some((score, lag, fit));
      }
    }

    match best {
      Some((_, lag, fit)) => Ok((lag, fit)),
      None => Err(last_err.unwrap_or_else(|| {
        CointError::LinearAlgebra("no ADF lag order could be fitted".into())
      })),
    }
  }

  fn select_by_tstat(&self, u: &[f64], max_lag: usize) -> CointResult<(usize, OlsResult)> {
    let mut last_err = None;
    for lag in (0..=max_lag).rev() {
      let fit = match fit_adf(u, lag) {
        Ok(fit) => fit,
        Err(e) => {
          last_err = Some(e);
          continue;
        }
      };
      if lag == 0 || fit.t_stat(fit.k - 1).abs() >= self.t_crit {
        return Ok((lag, fit));
      }
    }
    Err(last_err.unwrap_or_else(|| {
      CointError::LinearAlgebra("no ADF lag order could be fitted".into())
    }))
  }
}

/// Two-sided standard normal critical value at level `alpha`.
pub fn tstat_critical_value(alpha: f64) -> CointResult<f64> {
  if !(alpha > 0.0 && alpha < 1.0) {
    return Err(CointError::config(format!(
      "t-stat significance level must be in (0, 1), got {alpha}"
    )));
  }
  let normal = Normal::new(0.0, 1.0).map_err(|e| CointError::config(e.to_string()))?;
  Ok(normal.inverse_cdf(1.0 - alpha / 2.0))
}

/// Largest lag that leaves more observations than regressors.
fn max_feasible_lag(n: usize) -> usize {
  n.saturating_sub(3) / 2
}

fn build_adf_design(u: &[f64], lags: usize) -> CointResult<(DVector<f64>, DMatrix<f64>)> {
  let du = difference(u);
  let n_du = du.len();
  if n_du <= 2 * lags + 1 {
    return Err(CointError::LinearAlgebra(format!(
      "too many lags ({lags}) for {} residuals",
      u.len()
    )));
  }

  let nobs = n_du - lags;
  let lhs = DVector::from_fn(nobs, |r, _| du[r + lags]);
  let rhs = DMatrix::from_fn(nobs, 1 + lags, |r, c| {
    let t = r + lags;
    // du index t is original time t+1, so u[t] is the lagged level.
    if c == 0 { u[t] } else { du[t - c] }
  });
  Ok((lhs, rhs))
}

fn fit_adf(u: &[f64], lags: usize) -> CointResult<OlsResult> {
  let (lhs, rhs) = build_adf_design(u, lags)?;
  ols(&rhs, &lhs)
}
