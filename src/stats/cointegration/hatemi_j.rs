//! Hatemi-J residual cointegration test with two unknown regime shifts.
//!
//! $$
//! ADF^{*}=\inf_{(\tau_1,\tau_2)\in T}ADF(\tau_1,\tau_2),\quad
//! Z_t^{*}=\inf Z_t(\tau_1,\tau_2),\quad
//! Z_\alpha^{*}=\inf Z_\alpha(\tau_1,\tau_2)
//! $$
//!
use std::fmt;

use prettytable::Table;
use prettytable::row;
use tracing::info;
use tracing::warn;

use super::adf::ResidualAdf;
use super::common::CriticalValues;
use super::common::LagSelection;
use super::critical_values::StatisticFamily;
use super::critical_values::critical_values;
use super::design::BreakPair;
use super::design::ModelSpec;
use super::design::Sample;
use super::error::CointError;
use super::error::CointResult;
use super::kernel::BandwidthRule;
use super::kernel::VarianceMethod;
use super::lrv::LrvEstimator;
use super::search::BreakGrid;
use super::search::Minimum;
use super::search::PairEvaluator;
use super::search::SearchConfig;
use super::search::SearchState;
use super::search::run_search;

/// Configuration for the two-break cointegration test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HatemiConfig {
  /// Structural-break specification of the cointegrating regression.
  pub model: ModelSpec,
  /// Fixed bandwidth for the Bartlett/QS kernels. `None` uses `round(4(n/100)^{2/9})`.
  pub bwl: Option<usize>,
  /// Lag-order selection for the residual ADF regression.
  pub lag_selection: LagSelection,
  /// Maximum ADF lag order.
  pub max_lags: usize,
  /// Long-run variance method for the Phillips-Perron statistics.
  pub variance: VarianceMethod,
  /// Trimming fraction in `(0, 0.5)`.
  pub trimm: f64,
  /// Significance level of the t-stat lag rule.
  pub tstat_alpha: f64,
  /// Significance level used for the reject decisions.
  pub alpha: f64,
  pub search: SearchConfig,
}

impl Default for HatemiConfig {
  fn default() -> Self {
    Self {
      model: ModelSpec::LevelShift,
      bwl: None,
      lag_selection: LagSelection::Aic,
      max_lags: 8,
      variance: VarianceMethod::QuadraticSpectral,
      trimm: 0.10,
      tstat_alpha: 0.05,
      alpha: 0.05,
      search: SearchConfig::default(),
    }
  }
}

impl HatemiConfig {
  /// Build a configuration from the conventional integer codes
  /// (`model` 1..=3, `ic` 1..=3, `varm` 1..=7).
  pub fn from_codes(
    model: u8,
    bwl: Option<usize>,
    ic: u8,
    pmax: usize,
    varm: u8,
    trimm: f64,
  ) -> CointResult<Self> {
    let cfg = Self {
      model: ModelSpec::from_code(model)?,
      bwl,
      lag_selection: LagSelection::from_code(ic)?,
      max_lags: pmax,
      variance: VarianceMethod::from_code(varm)?,
      trimm,
      ..Self::default()
    };
    cfg.validate()?;
    Ok(cfg)
  }

  fn validate(&self) -> CointResult<()> {
    if self.bwl == Some(0) {
      return Err(CointError::config("bandwidth bwl must be positive"));
    }
    if self.max_lags == 0 && !matches!(self.lag_selection, LagSelection::Fixed(_)) {
      return Err(CointError::config("maximum lag pmax must be positive"));
    }
    if !(self.trimm > 0.0 && self.trimm < 0.5) {
      return Err(CointError::config(format!(
        "trimming fraction must lie in (0, 0.5), got {}",
        self.trimm
      )));
    }
    if !(self.alpha > 0.0 && self.alpha < 1.0) {
      return Err(CointError::config("alpha must be in (0, 1)"));
    }
    Ok(())
  }
}

/// Minimized statistic of one family together with its break dates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticOutcome {
  pub statistic: f64,
  pub breaks: BreakPair,
  /// Break dates as fractions of the sample size.
  pub fractions: (f64, f64),
  /// ADF lag order at the minimizing pair (ADF only).
  pub lag: Option<usize>,
  /// Kernel bandwidth at the minimizing pair (Zt and Za only).
  pub bandwidth: Option<usize>,
  /// `None` when the number of regressors has no tabulated values.
  pub critical_values: Option<CriticalValues>,
  /// Whether the null of no cointegration is rejected at `alpha`.
  pub reject_null: Option<bool>,
}

impl StatisticOutcome {
  fn new(min: Minimum, n: usize, critical_values: Option<CriticalValues>, alpha: f64) -> Self {
    Self {
      statistic: min.statistic,
      breaks: min.breaks,
      fractions: min.breaks.fractions(n),
      lag: min.lag,
      bandwidth: min.bandwidth,
      critical_values,
      reject_null: critical_values.map(|cv| cv.rejects(min.statistic, alpha)),
    }
  }
}

/// Result of the two-break cointegration test.
#[derive(Debug, Clone, PartialEq)]
pub struct HatemiResult {
  pub adf: StatisticOutcome,
  pub zt: StatisticOutcome,
  pub za: StatisticOutcome,
  /// Number of observations.
  pub n: usize,
  /// Number of regressors.
  pub k: usize,
  pub model: ModelSpec,
  pub model_label: &'static str,
  pub trimm: f64,
  pub bwl: Option<usize>,
  pub lag_selection: LagSelection,
  pub max_lags: usize,
  pub variance: VarianceMethod,
  /// Bandwidth rule derived from `variance` and `bwl`.
  pub bandwidth_rule: BandwidthRule,
  pub alpha: f64,
  pub grid: BreakGrid,
  /// Admissible pairs in the grid.
  pub total_pairs: usize,
  pub evaluated_pairs: usize,
  pub skipped_rank_deficient: usize,
  pub skipped_numerical: usize,
  /// Pairs whose inputs were rejected before fitting.
  pub skipped_invalid: usize,
  /// Pairs left unvisited because the time budget expired.
  pub not_visited: usize,
  /// Why critical values are missing, when they are.
  pub critical_value_error: Option<CointError>,
}

impl HatemiResult {
  pub fn terminated_early(&self) -> bool {
    self.not_visited > 0
  }

  pub fn skipped_pairs(&self) -> usize {
    self.skipped_rank_deficient + self.skipped_numerical + self.skipped_invalid
  }

  /// Tabular summary of the three statistics.
  pub fn summary_table(&self) -> Table {
    let mut table = Table::new();
    table.add_row(row![
      "Test", "Statistic", "Breaks", "Fractions", "Lag/B", "CV 1%", "CV 5%", "CV 10%"
    ]);
    for (name, outcome) in [("ADF", &self.adf), ("Zt", &self.zt), ("Za", &self.za)] {
      let cv = |f: fn(&CriticalValues) -> f64| {
        outcome
          .critical_values
          .as_ref()
          .map_or_else(|| "n/a".to_string(), |c| format!("{:.3}", f(c)))
      };
      table.add_row(row![
        name,
        format!("{:.3}", outcome.statistic),
        format!("{}, {}", outcome.breaks.tb1, outcome.breaks.tb2),
        format!("{:.3}, {:.3}", outcome.fractions.0, outcome.fractions.1),
        outcome
          .lag
          .or(outcome.bandwidth)
          .map_or_else(|| "-".to_string(), |v| v.to_string()),
        cv(|c| c.one_percent),
        cv(|c| c.five_percent),
        cv(|c| c.ten_percent)
      ]);
    }
    table
  }
}

impl fmt::Display for HatemiResult {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "Hatemi-J cointegration test with two regime shifts")?;
    writeln!(
      f,
      "model: {}, n = {}, k = {}, trimming = {}",
      self.model_label, self.n, self.k, self.trimm
    )?;
    writeln!(
      f,
      "lag selection: {} (pmax = {}), long-run variance: {}, bwl = {}",
      self.lag_selection.label(),
      self.max_lags,
      self.variance.label(),
      self.bwl.map_or_else(|| "auto".to_string(), |b| b.to_string())
    )?;
    writeln!(
      f,
      "pairs: {} evaluated, {} skipped, {} not visited (of {})",
      self.evaluated_pairs,
      self.skipped_pairs(),
      self.not_visited,
      self.total_pairs
    )?;
    write!(f, "{}", self.summary_table())
  }
}

/// Two-break residual cointegration test of `y` on `x`.
///
/// Structural misconfiguration is reported before any pair is evaluated.
/// Degenerate break pairs are skipped; an error is returned only when no pair
/// could be evaluated. With more than four regressors the statistics are still
/// computed but `critical_values` are `None`.
pub fn hatemi_j_test(sample: &Sample, cfg: HatemiConfig) -> CointResult<HatemiResult> {
  cfg.validate()?;
  let n = sample.n();
  let k = sample.k();
  let p = cfg.model.n_columns(k);
  if n <= p + 2 {
    return Err(CointError::config(format!(
      "{n} observations are too few for {p} regressors under model {}",
      cfg.model.short_label()
    )));
  }
  let grid = BreakGrid::from_trimming(n, cfg.trimm)?;
  let total_pairs = grid.len();

  let adf = ResidualAdf::new(cfg.max_lags, cfg.lag_selection, cfg.tstat_alpha)?;
  let lrv = LrvEstimator::from_method(cfg.variance, n, cfg.bwl);
  let evaluator = PairEvaluator::new(cfg.model, sample, adf, lrv);

  info!(
    n,
    k,
    model = cfg.model.short_label(),
    pairs = total_pairs,
    "starting two-break cointegration search"
  );
  let state = run_search(&evaluator, &grid, cfg.search);
  info!(
    evaluated = state.evaluated,
    skipped = state.skipped(),
    not_visited = state.not_visited,
    "break-pair search finished"
  );

  let (adf_min, zt_min, za_min) = match (state.adf, state.zt, state.za) {
    (Some(a), Some(zt), Some(za)) => (a, zt, za),
    _ => return Err(no_evaluated_pairs(&state, total_pairs)),
  };

  let (adf_cv, za_cv, critical_value_error) = match (
    critical_values(k, StatisticFamily::AdfZt),
    critical_values(k, StatisticFamily::Za),
  ) {
    (Ok(a), Ok(z)) => (Some(a), Some(z), None),
    (Err(e), _) | (_, Err(e)) => {
      warn!(k, "no tabulated critical values; reporting statistics only");
      (None, None, Some(e))
    }
  };

  Ok(HatemiResult {
    adf: StatisticOutcome::new(adf_min, n, adf_cv, cfg.alpha),
    zt: StatisticOutcome::new(zt_min, n, adf_cv, cfg.alpha),
    za: StatisticOutcome::new(za_min, n, za_cv, cfg.alpha),
    n,
    k,
    model: cfg.model,
    model_label: cfg.model.label(),
    trimm: cfg.trimm,
    bwl: cfg.bwl,
    lag_selection: cfg.lag_selection,
    max_lags: cfg.max_lags,
    variance: cfg.variance,
    bandwidth_rule: cfg.variance.bandwidth_rule(n, cfg.bwl),
    alpha: cfg.alpha,
    grid,
    total_pairs,
    evaluated_pairs: state.evaluated,
    skipped_rank_deficient: state.skipped_rank_deficient,
    skipped_numerical: state.skipped_numerical,
    skipped_invalid: state.skipped_invalid,
    not_visited: state.not_visited,
    critical_value_error,
  })
}

fn no_evaluated_pairs(state: &SearchState, total: usize) -> CointError {
  let detail = format!(
    "all {} visited break pairs failed ({} rank deficient, {} numerical, {} invalid)",
    state.skipped(),
    state.skipped_rank_deficient,
    state.skipped_numerical,
    state.skipped_invalid
  );
  if state.skipped() == 0 {
    CointError::config(format!(
      "time budget expired before any of the {total} break pairs was evaluated"
    ))
  } else if state.skipped_invalid > state.skipped_rank_deficient.max(state.skipped_numerical) {
    CointError::Configuration(detail)
  } else if state.skipped_rank_deficient >= state.skipped_numerical {
    CointError::LinearAlgebra(detail)
  } else {
    CointError::NumericalInstability(detail)
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use ndarray::Array1;
  use ndarray::Array2;
  use rand::SeedableRng;
  use rand::rngs::StdRng;
  use rand_distr::Distribution;
  use rand_distr::Normal;
  use tracing_test::traced_test;

  use super::HatemiConfig;
  use super::hatemi_j_test;
  use super::no_evaluated_pairs;
  use crate::stats::cointegration::common::LagSelection;
  use crate::stats::cointegration::design::ModelSpec;
  use crate::stats::cointegration::design::Sample;
  use crate::stats::cointegration::error::CointError;
  use crate::stats::cointegration::kernel::BandwidthRule;
  use crate::stats::cointegration::kernel::VarianceMethod;
  use crate::stats::cointegration::search::SearchConfig;
  use crate::stats::cointegration::search::SearchState;

  fn cointegrated_with_shifts(n: usize, k: usize, seed: u64) -> Sample {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let mut x = Array2::<f64>::zeros((n, k));
    for j in 0..k {
      for t in 1..n {
        x[[t, j]] = x[[t - 1, j]] + noise.sample(&mut rng);
      }
    }
    let y = Array1::from_shape_fn(n, |t| {
      let shift = (if t >= n / 3 { 6.0 } else { 0.0 }) + (if t >= 2 * n / 3 { -8.0 } else { 0.0 });
      let slope: f64 = (0..k).map(|j| x[[t, j]]).sum();
      1.0 + shift + slope + 0.5 * noise.sample(&mut rng)
    });
    Sample::new(y, x).unwrap()
  }

  #[test]
  fn from_codes_maps_and_validates() {
    let cfg = HatemiConfig::from_codes(3, Some(5), 2, 6, 4, 0.15).unwrap();
    assert_eq!(cfg.model, ModelSpec::RegimeShift);
    assert_eq!(cfg.lag_selection, LagSelection::Bic);
    assert_eq!(cfg.variance, VarianceMethod::SpcBartlett);
    assert_eq!(cfg.max_lags, 6);
    assert!(HatemiConfig::from_codes(0, None, 1, 8, 1, 0.1).is_err());
    assert!(HatemiConfig::from_codes(1, Some(0), 1, 8, 1, 0.1).is_err());
    assert!(HatemiConfig::from_codes(1, None, 1, 0, 1, 0.1).is_err());
    assert!(HatemiConfig::from_codes(1, None, 1, 8, 1, 0.6).is_err());
  }

  #[test]
  #[traced_test]
  fn reports_counts_and_echoes_configuration() {
    let sample = cointegrated_with_shifts(80, 1, 1);
    let res = hatemi_j_test(&sample, HatemiConfig::default()).unwrap();
    assert_eq!(res.total_pairs, res.grid.len());
    assert_eq!(
      res.evaluated_pairs + res.skipped_pairs() + res.not_visited,
      res.total_pairs
    );
    assert_eq!((res.n, res.k), (80, 1));
    assert_eq!(res.model_label, ModelSpec::LevelShift.label());
    assert!(!res.terminated_early());
    assert_eq!(res.terminated_early(), res.not_visited > 0);
    assert!(res.adf.critical_values.is_some());
    assert!(logs_contain("break-pair search finished"));
  }

  #[test]
  fn too_many_regressors_keeps_statistics_without_critical_values() {
    let sample = cointegrated_with_shifts(120, 5, 2);
    let res = hatemi_j_test(&sample, HatemiConfig::default()).unwrap();
    assert!(res.adf.critical_values.is_none());
    assert!(res.za.reject_null.is_none());
    assert_eq!(
      res.critical_value_error,
      Some(CointError::UnsupportedConfiguration { k: 5 })
    );
    assert!(res.adf.statistic.is_finite());
  }

  #[test]
  fn short_sample_is_a_configuration_error() {
    let sample = cointegrated_with_shifts(12, 4, 3);
    let cfg = HatemiConfig {
      model: ModelSpec::RegimeShift,
      ..HatemiConfig::default()
    };
    assert!(matches!(
      hatemi_j_test(&sample, cfg),
      Err(CointError::Configuration(_))
    ));
  }

  #[test]
  fn exhausted_budget_without_evaluations_is_reported() {
    let sample = cointegrated_with_shifts(60, 1, 4);
    let cfg = HatemiConfig {
      search: SearchConfig {
        parallel: false,
        time_budget: Some(Duration::ZERO),
      },
      ..HatemiConfig::default()
    };
    assert!(matches!(
      hatemi_j_test(&sample, cfg),
      Err(CointError::Configuration(_))
    ));
  }

  #[test]
  fn display_contains_summary_rows() {
    let sample = cointegrated_with_shifts(60, 2, 5);
    let res = hatemi_j_test(&sample, HatemiConfig::default()).unwrap();
    let text = res.to_string();
    for needle in ["ADF", "Zt", "Za", "C (level shift)", "-6.928"] {
      assert!(text.contains(needle), "missing {needle} in\n{text}");
    }
  }

  #[test]
  fn phillips_perron_outcomes_report_their_bandwidth() {
    let sample = cointegrated_with_shifts(100, 1, 6);
    let res = hatemi_j_test(&sample, HatemiConfig::default()).unwrap();
    assert_eq!(res.bandwidth_rule, BandwidthRule::Fixed(4));
    assert_eq!(res.zt.bandwidth, Some(4));
    assert_eq!(res.za.bandwidth, Some(4));
    assert_eq!(res.adf.bandwidth, None);
    assert!(res.adf.lag.is_some());
    assert!(res.summary_table().to_string().contains("Lag/B"));
  }

  #[test]
  fn dominant_invalid_skips_are_a_configuration_error() {
    let state = SearchState {
      skipped_invalid: 5,
      skipped_rank_deficient: 2,
      skipped_numerical: 1,
      ..SearchState::default()
    };
    assert!(matches!(
      no_evaluated_pairs(&state, 8),
      CointError::Configuration(_)
    ));

    let state = SearchState {
      skipped_invalid: 1,
      skipped_rank_deficient: 4,
      ..SearchState::default()
    };
    assert!(matches!(
      no_evaluated_pairs(&state, 5),
      CointError::LinearAlgebra(_)
    ));
  }
}
