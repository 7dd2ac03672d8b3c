//! Bias-corrected first-order autocorrelation and long-run variance of the
//! cointegrating residuals.
//!
//! $$
//! \hat\rho^{*}=\frac{\sum_{t=1}^{n-1}\hat u_t\hat u_{t+1}-\sum_{j=1}^{B}w(j/B)\hat\gamma(j)}{\sum_{t=1}^{n}\hat u_t^2},
//! \qquad
//! \hat\lambda^2=\hat\gamma(0)+2\sum_{j=1}^{B}w(j/B)\hat\gamma(j)
//! $$
//!
//! with `γ(j) = (1/n) Σ v_{t-j} v_t` over the quasi-differences
//! `v_t = û_t − ρ û_{t−1}`. The estimator runs in two passes: the plain
//! autocorrelation gives the uncorrected autocovariances and `ρ*`, then the
//! autocovariances are recomputed at `ρ*` for the long-run variance.
//!
use super::error::CointError;
use super::error::CointResult;
use super::kernel::BandwidthRule;
use super::kernel::Kernel;
use super::kernel::VarianceMethod;

/// Kernel and bandwidth rule, resolved once per test run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LrvEstimator {
  pub kernel: Kernel,
  pub bandwidth: BandwidthRule,
}

/// Autocovariances `γ(0..=B)` of the residuals quasi-differenced at `rho`.
#[derive(Debug, Clone, PartialEq)]
pub struct Autocovariances {
  pub rho: f64,
  pub gamma: Vec<f64>,
}

impl Autocovariances {
  pub fn bandwidth(&self) -> usize {
    self.gamma.len().saturating_sub(1)
  }

  /// `Σ_{j=1}^{B} w(j/B) γ(j)`.
  pub fn weighted_sum(&self, kernel: Kernel) -> f64 {
    let b = self.bandwidth();
    if b == 0 {
      return 0.0;
    }
    let b_f = b as f64;
    self
      .gamma
      .iter()
      .enumerate()
      .skip(1)
      .map(|(j, g)| kernel.weight(j as f64 / b_f) * g)
      .sum()
  }
}

/// Output of [`LrvEstimator::estimate`].
#[derive(Debug, Clone, PartialEq)]
pub struct LongRunVariance {
  /// Plain first-order autocorrelation `ρ̂`.
  pub rho: f64,
  /// Bias-corrected autocorrelation `ρ̂*`.
  pub rho_star: f64,
  /// Autocovariances recomputed at `ρ̂*`.
  pub corrected: Autocovariances,
  pub lrv: f64,
  /// `Σ û_t²`.
  pub sum_sq: f64,
  pub bandwidth: usize,
}

impl LrvEstimator {
  pub fn from_method(method: VarianceMethod, n: usize, bwl: Option<usize>) -> Self {
    Self {
      kernel: method.kernel(),
      bandwidth: method.bandwidth_rule(n, bwl),
    }
  }

  pub fn estimate(&self, u: &[f64]) -> CointResult<LongRunVariance> {
    let n = u.len();
    if n < 3 {
      return Err(CointError::NumericalInstability(format!(
        "long-run variance needs at least 3 residuals, got {n}"
      )));
    }
    let sum_sq = u.iter().map(|v| v * v).sum::<f64>();
    if !(sum_sq > 0.0 && sum_sq.is_finite()) {
      return Err(CointError::NumericalInstability(format!(
        "residual sum of squares is {sum_sq}"
      )));
    }
    let cross = lag_one_cross_product(u);
    let rho = cross / sum_sq;

    let bandwidth = self
      .bandwidth
      .bandwidth(self.kernel, &quasi_difference(u, rho), n - 2);

    let uncorrected = autocovariances(u, rho, bandwidth);
    let rho_star = bias_corrected_rho(cross, sum_sq, &uncorrected, self.kernel, n);
    let corrected = autocovariances(u, rho_star, bandwidth);
    let lrv = long_run_variance(&corrected, self.kernel);

    Ok(LongRunVariance {
      rho,
      rho_star,
      corrected,
      lrv,
      sum_sq,
      bandwidth,
    })
  }
}

/// `Σ_{t=1}^{n-1} û_t û_{t+1}`.
fn lag_one_cross_product(u: &[f64]) -> f64 {
  u.windows(2).map(|w| w[0] * w[1]).sum()
}

/// Plain first-order sample autocorrelation `Σ û_t û_{t+1} / Σ û_t²`.
pub fn first_order_autocorrelation(u: &[f64]) -> f64 {
  let sum_sq = u.iter().map(|v| v * v).sum::<f64>();
  lag_one_cross_product(u) / sum_sq
}

/// `v_t = û_t − ρ û_{t−1}` for `t = 2..n`.
pub fn quasi_difference(u: &[f64], rho: f64) -> Vec<f64> {
  u.windows(2).map(|w| w[1] - rho * w[0]).collect()
}

/// `γ(j) = (1/n) Σ_{t=j+1}^{n} v_{t−j} v_t` for `j = 0..=bandwidth`.
pub fn autocovariances(u: &[f64], rho: f64, bandwidth: usize) -> Autocovariances {
  let n_f = u.len() as f64;
  let v = quasi_difference(u, rho);
  let gamma = (0..=bandwidth)
    .map(|j| {
      if j >= v.len() {
        return 0.0;
      }
      v[j..].iter().zip(&v[..v.len() - j]).map(|(a, b)| a * b).sum::<f64>() / n_f
    })
    .collect();
  Autocovariances { rho, gamma }
}

/// Second pass input: `ρ̂* = Σ_{t=1}^{n-1} (û_t û_{t+1} − λ) / Σ û_t²`.
///
/// `λ = Σ_{j≥1} w(j/B) γ(j)` is a per-observation quantity under the `1/n`
/// autocovariance normalisation, so it is subtracted once per cross product.
pub fn bias_corrected_rho(
  cross: f64,
  sum_sq: f64,
  uncorrected: &Autocovariances,
  kernel: Kernel,
  n: usize,
) -> f64 {
  let lambda = uncorrected.weighted_sum(kernel);
  (cross - n.saturating_sub(1) as f64 * lambda) / sum_sq
}

/// `γ(0) + 2 Σ w(j/B) γ(j)` over the corrected autocovariances.
pub fn long_run_variance(corrected: &Autocovariances, kernel: Kernel) -> f64 {
  corrected.gamma[0] + 2.0 * corrected.weighted_sum(kernel)
}
