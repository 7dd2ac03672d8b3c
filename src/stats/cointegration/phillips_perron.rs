//! Phillips-Perron `Zα` and `Zt` built from the bias-corrected autocorrelation.
//!
//! $$
//! Z_\alpha=n(\hat\rho^{*}-1),\qquad Z_t=(\hat\rho^{*}-1)\sqrt{\textstyle\sum\hat u_t^2/\hat\lambda^2}
//! $$
//!
use super::error::CointError;
use super::error::CointResult;
use super::lrv::LongRunVariance;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhillipsPerronStats {
  pub za: f64,
  pub zt: f64,
}

/// Combine `ρ̂*`, the long-run variance and `Σ û_t²` into `Zα` and `Zt`.
///
/// A non-positive or non-finite long-run variance, or a non-finite statistic,
/// is reported as [`CointError::NumericalInstability`].
pub fn pp_statistics(lrv: &LongRunVariance, n: usize) -> CointResult<PhillipsPerronStats> {
  if !(lrv.lrv > 0.0 && lrv.lrv.is_finite()) {
    return Err(CointError::NumericalInstability(format!(
      "long-run variance is {} (bandwidth {})",
      lrv.lrv, lrv.bandwidth
    )));
  }
  let excess = lrv.rho_star - 1.0;
  let za = n as f64 * excess;
  let zt = excess * (lrv.sum_sq / lrv.lrv).sqrt();
  if !(za.is_finite() && zt.is_finite()) {
    return Err(CointError::NumericalInstability(format!(
      "Phillips-Perron statistics are not finite (Za = {za}, Zt = {zt})"
    )));
  }
  Ok(PhillipsPerronStats { za, zt })
}
