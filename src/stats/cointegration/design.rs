//! Break-conditioned regressor matrices for the cointegrating regression.
//!
//! $$
//! y_t=\mu_0+\mu_1D_{1t}+\mu_2D_{2t}+[\beta t]+\alpha_0'x_t+[\alpha_1'D_{1t}x_t+\alpha_2'D_{2t}x_t]+u_t
//! $$
//!
use impl_new_derive::ImplNew;
use nalgebra::DMatrix;
use nalgebra::DVector;
use ndarray::Array1;
use ndarray::Array2;

use super::error::CointError;
use super::error::CointResult;

/// Observed data: dependent series `y` (length n) and regressors `x` (n×k).
#[derive(Debug, Clone)]
pub struct Sample {
  y: Array1<f64>,
  x: Array2<f64>,
}

impl Sample {
  /// Validate and wrap the series.
  ///
  /// Checks row counts, `k ≥ 1` and finiteness. The number of regressors is
  /// not bounded here; `k > 4` only loses the critical values.
  pub fn new(y: Array1<f64>, x: Array2<f64>) -> CointResult<Self> {
    if y.len() != x.nrows() {
      return Err(CointError::config(format!(
        "y has {} observations but x has {} rows",
        y.len(),
        x.nrows()
      )));
    }
    if x.ncols() == 0 {
      return Err(CointError::config("at least one regressor is required"));
    }
    if !y.iter().chain(x.iter()).all(|v| v.is_finite()) {
      return Err(CointError::config("series must contain only finite values"));
    }
    Ok(Self { y, x })
  }

  /// Single-regressor convenience constructor.
  pub fn bivariate(y: &[f64], x: &[f64]) -> CointResult<Self> {
    let x = Array2::from_shape_vec((x.len(), 1), x.to_vec())
      .map_err(|e| CointError::config(e.to_string()))?;
    Self::new(Array1::from_vec(y.to_vec()), x)
  }

  pub fn n(&self) -> usize {
    self.y.len()
  }

  pub fn k(&self) -> usize {
    self.x.ncols()
  }

  pub fn y(&self) -> &Array1<f64> {
    &self.y
  }

  pub fn x(&self) -> &Array2<f64> {
    &self.x
  }

  pub(crate) fn response(&self) -> DVector<f64> {
    DVector::from_iterator(self.n(), self.y.iter().copied())
  }
}

/// Structural-break specification of the cointegrating regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelSpec {
  /// C: two level shifts.
  LevelShift,
  /// C/T: two level shifts plus a linear trend.
  LevelShiftTrend,
  /// C/S: level shifts and shifts in the cointegrating slopes.
  RegimeShift,
}

impl ModelSpec {
  /// Map the conventional model id (1 = C, 2 = C/T, 3 = C/S).
  pub fn from_code(model: u8) -> CointResult<Self> {
    match model {
      1 => Ok(ModelSpec::LevelShift),
      2 => Ok(ModelSpec::LevelShiftTrend),
      3 => Ok(ModelSpec::RegimeShift),
      other => Err(CointError::config(format!(
        "invalid model id {other} (expected 1, 2 or 3)"
      ))),
    }
  }

  pub fn code(self) -> u8 {
    match self {
      ModelSpec::LevelShift => 1,
      ModelSpec::LevelShiftTrend => 2,
      ModelSpec::RegimeShift => 3,
    }
  }

  pub fn short_label(self) -> &'static str {
    match self {
      ModelSpec::LevelShift => "C",
      ModelSpec::LevelShiftTrend => "C/T",
      ModelSpec::RegimeShift => "C/S",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      ModelSpec::LevelShift => "C (level shift)",
      ModelSpec::LevelShiftTrend => "C/T (level shift with trend)",
      ModelSpec::RegimeShift => "C/S (regime shift)",
    }
  }

  /// Number of design columns for `k` regressors.
  pub fn n_columns(self, k: usize) -> usize {
    match self {
      ModelSpec::LevelShift => 3 + k,
      ModelSpec::LevelShiftTrend => 4 + k,
      ModelSpec::RegimeShift => 3 + 3 * k,
    }
  }
}

/// Candidate break dates, 1-based. Observation `t` belongs to the second
/// regime of a break at `tb` when `t ≥ tb`.
#[derive(ImplNew, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BreakPair {
  pub tb1: usize,
  pub tb2: usize,
}

impl BreakPair {
  /// Break dates as fractions of the sample size.
  pub fn fractions(self, n: usize) -> (f64, f64) {
    let n = n as f64;
    (self.tb1 as f64 / n, self.tb2 as f64 / n)
  }
}

/// Build the regressor matrix for one break pair.
///
/// Column order: intercept, `D1`, `D2`, trend (C/T only), `x`, then `D1·x` and
/// `D2·x` (C/S only).
pub fn build_design_matrix(
  model: ModelSpec,
  breaks: BreakPair,
  sample: &Sample,
) -> CointResult<DMatrix<f64>> {
  let n = sample.n();
  let k = sample.k();
  let BreakPair { tb1, tb2 } = breaks;
  if tb1 < 1 || tb2 > n {
    return Err(CointError::config(format!(
      "break pair ({tb1}, {tb2}) outside [1, {n}]"
    )));
  }
  if tb1 >= tb2 {
    return Err(CointError::config(format!(
      "first break {tb1} must precede second break {tb2}"
    )));
  }

  let p = model.n_columns(k);
  let x = sample.x();
  let mut design = DMatrix::<f64>::zeros(n, p);

  for i in 0..n {
    let t = i + 1;
    let d1 = if t >= tb1 { 1.0 } else { 0.0 };
    let d2 = if t >= tb2 { 1.0 } else { 0.0 };
    design[(i, 0)] = 1.0;
    design[(i, 1)] = d1;
    design[(i, 2)] = d2;

    let mut col = 3;
    if model == ModelSpec::LevelShiftTrend {
      design[(i, col)] = t as f64;
      col += 1;
    }
    for j in 0..k {
      design[(i, col + j)] = x[[i, j]];
    }
    col += k;
    if model == ModelSpec::RegimeShift {
      for j in 0..k {
        design[(i, col + j)] = d1 * x[[i, j]];
        design[(i, col + k + j)] = d2 * x[[i, j]];
      }
    }
  }

  Ok(design)
}
