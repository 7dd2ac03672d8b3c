//! Enumeration of admissible break pairs and the three running minima.
//!
//! The grid is `T1 ≤ tb1 ≤ T2`, `tb1 + T1 ≤ tb2 ≤ T3` with `T1 = ⌊τn⌋`,
//! `T2 = ⌊(1−2τ)n⌋`, `T3 = ⌊(1−τ)n⌋`. Every pair is evaluated independently;
//! per-pair failures are recorded as skips and never abort the search.
//!
use std::time::Duration;
use std::time::Instant;

use nalgebra::DVector;
use rayon::prelude::*;
use tracing::debug;

use super::adf::ResidualAdf;
use super::common::ols;
use super::design::BreakPair;
use super::design::ModelSpec;
use super::design::Sample;
use super::design::build_design_matrix;
use super::error::CointError;
use super::error::CointResult;
use super::lrv::LrvEstimator;
use super::phillips_perron::pp_statistics;

/// Admissible break-date grid derived from the trimming fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakGrid {
  pub n: usize,
  pub t1: usize,
  pub t2: usize,
  pub t3: usize,
}

impl BreakGrid {
  pub fn from_trimming(n: usize, trimm: f64) -> CointResult<Self> {
    if !(trimm > 0.0 && trimm < 0.5) {
      return Err(CointError::config(format!(
        "trimming fraction must lie in (0, 0.5), got {trimm}"
      )));
    }
    let n_f = n as f64;
    let t1 = (trimm * n_f).floor() as usize;
    let t2 = ((1.0 - 2.0 * trimm) * n_f).floor() as usize;
    let t3 = ((1.0 - trimm) * n_f).floor() as usize;
    if t1 == 0 {
      return Err(CointError::config(format!(
        "sample of {n} observations is too small for trimming {trimm}"
      )));
    }
    if t1 > t2 || t1 + t1 > t3 {
      return Err(CointError::config(format!(
        "trimming {trimm} leaves no admissible break pairs for n = {n}"
      )));
    }
    Ok(Self { n, t1, t2, t3 })
  }

  /// Admissible second breaks for a given first break.
  pub fn tb2_range(&self, tb1: usize) -> std::ops::RangeInclusive<usize> {
    (tb1 + self.t1)..=self.t3
  }

  /// All pairs, `tb1` ascending then `tb2` ascending.
  pub fn pairs(&self) -> impl Iterator<Item = BreakPair> + '_ {
    (self.t1..=self.t2).flat_map(move |tb1| self.tb2_range(tb1).map(move |tb2| BreakPair::new(tb1, tb2)))
  }

  pub fn len(&self) -> usize {
    (self.t1..=self.t2)
      .map(|tb1| self.tb2_range(tb1).count())
      .sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Statistics of one successfully evaluated break pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairStatistics {
  pub breaks: BreakPair,
  pub adf: f64,
  pub adf_lag: usize,
  pub zt: f64,
  pub za: f64,
  /// Kernel bandwidth behind `zt` and `za`.
  pub bandwidth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
  /// Rank-deficient cointegrating or ADF regression.
  RankDeficient,
  /// Non-finite statistic or non-positive long-run variance.
  Numerical,
  /// Inputs rejected before fitting, e.g. a break outside the sample.
  Invalid,
}

impl From<&CointError> for SkipReason {
  fn from(err: &CointError) -> Self {
    match err {
      CointError::LinearAlgebra(_) => SkipReason::RankDeficient,
      CointError::NumericalInstability(_) => SkipReason::Numerical,
      CointError::Configuration(_) | CointError::UnsupportedConfiguration { .. } => {
        SkipReason::Invalid
      }
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairOutcome {
  Evaluated(PairStatistics),
  Skipped(BreakPair, SkipReason),
}

/// Per-pair pipeline: design matrix, OLS, residual ADF and Phillips-Perron.
#[derive(Debug, Clone)]
pub struct PairEvaluator<'a> {
  model: ModelSpec,
  sample: &'a Sample,
  response: DVector<f64>,
  adf: ResidualAdf,
  lrv: LrvEstimator,
}

impl<'a> PairEvaluator<'a> {
  pub fn new(model: ModelSpec, sample: &'a Sample, adf: ResidualAdf, lrv: LrvEstimator) -> Self {
    Self {
      model,
      sample,
      response: sample.response(),
      adf,
      lrv,
    }
  }

  pub fn evaluate(&self, breaks: BreakPair) -> PairOutcome {
    match self.try_evaluate(breaks) {
      Ok(stats) => PairOutcome::Evaluated(stats),
      Err(err) => {
        debug!(tb1 = breaks.tb1, tb2 = breaks.tb2, %err, "skipping break pair");
        PairOutcome::Skipped(breaks, SkipReason::from(&err))
      }
    }
  }

  fn try_evaluate(&self, breaks: BreakPair) -> CointResult<PairStatistics> {
    let design = build_design_matrix(self.model, breaks, self.sample)?;
    let fit = ols(&design, &self.response)?;
    let u = fit.residuals;

    let adf = self.adf.statistic(&u)?;
    let lrv = self.lrv.estimate(&u)?;
    let pp = pp_statistics(&lrv, u.len())?;

    Ok(PairStatistics {
      breaks,
      adf: adf.statistic,
      adf_lag: adf.lag,
      zt: pp.zt,
      za: pp.za,
      bandwidth: lrv.bandwidth,
    })
  }
}

/// Smallest value seen so far for one statistic family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimum {
  pub statistic: f64,
  pub breaks: BreakPair,
  /// Selected ADF lag order; `None` for the Phillips-Perron families.
  pub lag: Option<usize>,
  /// Kernel bandwidth; `None` for the ADF family.
  pub bandwidth: Option<usize>,
}

impl Minimum {
  /// Most negative wins; ties go to the lowest `(tb1, tb2)`.
  fn better_than(&self, other: &Minimum) -> bool {
    self.statistic < other.statistic
      || (self.statistic == other.statistic && self.breaks < other.breaks)
  }
}

fn offer(slot: &mut Option<Minimum>, candidate: Minimum) {
  match slot {
    Some(current) if !candidate.better_than(current) => {}
    _ => *slot = Some(candidate),
  }
}

fn merge_slot(slot: &mut Option<Minimum>, other: Option<Minimum>) {
  if let Some(candidate) = other {
    offer(slot, candidate);
  }
}

/// Three independent running minima plus evaluation counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
  pub adf: Option<Minimum>,
  pub zt: Option<Minimum>,
  pub za: Option<Minimum>,
  pub evaluated: usize,
  pub skipped_rank_deficient: usize,
  pub skipped_numerical: usize,
  pub skipped_invalid: usize,
  /// Pairs not reached before the time budget ran out.
  pub not_visited: usize,
}

impl SearchState {
  pub fn record(&mut self, outcome: PairOutcome) {
    match outcome {
      PairOutcome::Evaluated(stats) => {
        self.evaluated += 1;
        offer(
          &mut self.adf,
          Minimum {
            statistic: stats.adf,
            breaks: stats.breaks,
            lag: Some(stats.adf_lag),
            bandwidth: None,
          },
        );
        offer(
          &mut self.zt,
          Minimum {
            statistic: stats.zt,
            breaks: stats.breaks,
            lag: None,
            bandwidth: Some(stats.bandwidth),
          },
        );
        offer(
          &mut self.za,
          Minimum {
            statistic: stats.za,
            breaks: stats.breaks,
            lag: None,
            bandwidth: Some(stats.bandwidth),
          },
        );
      }
      PairOutcome::Skipped(_, SkipReason::RankDeficient) => self.skipped_rank_deficient += 1,
      PairOutcome::Skipped(_, SkipReason::Numerical) => self.skipped_numerical += 1,
      PairOutcome::Skipped(_, SkipReason::Invalid) => self.skipped_invalid += 1,
    }
  }

  /// Associative and commutative combination of two partial searches.
  pub fn merge(mut self, other: SearchState) -> SearchState {
    merge_slot(&mut self.adf, other.adf);
    merge_slot(&mut self.zt, other.zt);
    merge_slot(&mut self.za, other.za);
    self.evaluated += other.evaluated;
    self.skipped_rank_deficient += other.skipped_rank_deficient;
    self.skipped_numerical += other.skipped_numerical;
    self.skipped_invalid += other.skipped_invalid;
    self.not_visited += other.not_visited;
    self
  }

  pub fn skipped(&self) -> usize {
    self.skipped_rank_deficient + self.skipped_numerical + self.skipped_invalid
  }
}

/// Execution settings for the break-pair search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
  /// Evaluate first-break rows on the rayon pool.
  pub parallel: bool,
  /// Stop visiting new pairs once this much time has elapsed.
  pub time_budget: Option<Duration>,
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self {
      parallel: true,
      time_budget: None,
    }
  }
}

fn search_row(
  mut state: SearchState,
  evaluator: &PairEvaluator<'_>,
  grid: &BreakGrid,
  tb1: usize,
  deadline: Option<Instant>,
) -> SearchState {
  for tb2 in grid.tb2_range(tb1) {
    if deadline.is_some_and(|d| Instant::now() >= d) {
      state.not_visited += 1;
      continue;
    }
    state.record(evaluator.evaluate(BreakPair::new(tb1, tb2)));
  }
  state
}

/// Evaluate every admissible pair and return the merged minima.
///
/// The result does not depend on `cfg.parallel` or on how rayon splits the
/// work, as long as the whole grid is visited.
pub fn run_search(evaluator: &PairEvaluator<'_>, grid: &BreakGrid, cfg: SearchConfig) -> SearchState {
  let deadline = cfg.time_budget.map(|budget| Instant::now() + budget);
  if cfg.parallel {
    (grid.t1..=grid.t2)
      .into_par_iter()
      .fold(SearchState::default, |state, tb1| {
        search_row(state, evaluator, grid, tb1, deadline)
      })
      .reduce(SearchState::default, SearchState::merge)
  } else {
    (grid.t1..=grid.t2).fold(SearchState::default(), |state, tb1| {
      search_row(state, evaluator, grid, tb1, deadline)
    })
  }
}
