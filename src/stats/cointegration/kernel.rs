//! Kernel tapers and bandwidth rules for the residual long-run variance.
//!
//! $$
//! w_{B}(x)=\max(0,1-|x|),\qquad
//! w_{QS}(x)=\frac{3}{z^2}\Big(\frac{\sin z}{z}-\cos z\Big),\ z=\tfrac{6\pi x}{5}
//! $$
//!
use std::f64::consts::PI;

use super::common::ar1_coefficient;
use super::error::CointError;
use super::error::CointResult;

/// Bound on the AR(1) coefficient used by the SPC plug-in bandwidth.
pub const SPC_MAX_RHO: f64 = 0.97;
/// Kurozumi's upper-bound autocorrelation for the adaptive bandwidth.
pub const KUROZUMI_K: f64 = 0.7;

/// Kernel family applied to the autocovariances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
  /// Only lag zero contributes.
  Iid,
  /// Triangular (Newey-West) kernel.
  Bartlett,
  /// Quadratic Spectral kernel.
  QuadraticSpectral,
}

impl Kernel {
  /// Weight `w(x)` at the normalized lag `x = j / B`.
  pub fn weight(self, x: f64) -> f64 {
    match self {
      Kernel::Iid => {
        if x == 0.0 {
          1.0
        } else {
          0.0
        }
      }
      Kernel::Bartlett => (1.0 - x.abs()).max(0.0),
      Kernel::QuadraticSpectral => {
        let z = 6.0 * PI * x / 5.0;
        if z.abs() < 1e-2 {
          // sin(z)/z - cos(z) = z^2/3 - z^4/30 + z^6/840 - ...
          let z2 = z * z;
          1.0 - z2 / 10.0 + z2 * z2 / 280.0
        } else {
          3.0 * (z.sin() / z - z.cos()) / (z * z)
        }
      }
    }
  }
}

/// How the truncation lag `B` is chosen for each residual sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandwidthRule {
  /// No autocovariance correction at all.
  Zero,
  /// Same bandwidth for every break pair.
  Fixed(usize),
  /// Andrews AR(1) plug-in with the coefficient clipped to `±max_rho`.
  Andrews { max_rho: f64 },
  /// Kurozumi's adaptive rule: the plug-in bandwidth bounded by its value at `k`.
  Kurozumi { k: f64 },
}

impl BandwidthRule {
  /// Bandwidth for the series `v`, capped at `cap`.
  ///
  /// Data-driven rules fit an AR(1) through the origin to `v` and are therefore
  /// deterministic for a given sequence.
  pub fn bandwidth(self, kernel: Kernel, v: &[f64], cap: usize) -> usize {
    let raw = match self {
      BandwidthRule::Zero => 0.0,
      BandwidthRule::Fixed(b) => b as f64,
      BandwidthRule::Andrews { max_rho } => {
        let rho = ar1_coefficient(v).clamp(-max_rho, max_rho);
        plug_in_bandwidth(kernel, rho, v.len())
      }
      BandwidthRule::Kurozumi { k } => {
        let rho = ar1_coefficient(v).clamp(-SPC_MAX_RHO, SPC_MAX_RHO);
        plug_in_bandwidth(kernel, rho, v.len()).min(plug_in_bandwidth(kernel, k, v.len()))
      }
    };
    if raw.is_finite() {
      (raw.round().max(0.0) as usize).min(cap)
    } else {
      0
    }
  }
}

/// Andrews (1991) AR(1) plug-in bandwidth.
fn plug_in_bandwidth(kernel: Kernel, rho: f64, n: usize) -> f64 {
  let n = n as f64;
  let rho2 = rho * rho;
  match kernel {
    Kernel::Iid => 0.0,
    Kernel::Bartlett => {
      let alpha = 4.0 * rho2 / ((1.0 - rho).powi(2) * (1.0 + rho).powi(2));
      1.1447 * (alpha * n).powf(1.0 / 3.0)
    }
    Kernel::QuadraticSpectral => {
      let alpha = 4.0 * rho2 / (1.0 - rho).powi(4);
      1.3221 * (alpha * n).powf(1.0 / 5.0)
    }
  }
}

/// Default fixed bandwidth `round(4 (n/100)^{2/9})`.
pub fn default_bandwidth(n: usize) -> usize {
  (4.0 * (n as f64 / 100.0).powf(2.0 / 9.0)).round() as usize
}

/// Long-run variance method, one case per kernel and bandwidth rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarianceMethod {
  Iid,
  Bartlett,
  QuadraticSpectral,
  SpcBartlett,
  SpcQuadraticSpectral,
  KurozumiBartlett,
  KurozumiQuadraticSpectral,
}

impl VarianceMethod {
  /// Map the conventional integer code `1..=7`.
  pub fn from_code(varm: u8) -> CointResult<Self> {
    Ok(match varm {
      1 => VarianceMethod::Iid,
      2 => VarianceMethod::Bartlett,
      3 => VarianceMethod::QuadraticSpectral,
      4 => VarianceMethod::SpcBartlett,
      5 => VarianceMethod::SpcQuadraticSpectral,
      6 => VarianceMethod::KurozumiBartlett,
      7 => VarianceMethod::KurozumiQuadraticSpectral,
      other => {
        return Err(CointError::config(format!(
          "invalid variance method code {other} (expected 1..=7)"
        )));
      }
    })
  }

  pub fn code(self) -> u8 {
    match self {
      VarianceMethod::Iid => 1,
      VarianceMethod::Bartlett => 2,
      VarianceMethod::QuadraticSpectral => 3,
      VarianceMethod::SpcBartlett => 4,
      VarianceMethod::SpcQuadraticSpectral => 5,
      VarianceMethod::KurozumiBartlett => 6,
      VarianceMethod::KurozumiQuadraticSpectral => 7,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      VarianceMethod::Iid => "iid",
      VarianceMethod::Bartlett => "Bartlett",
      VarianceMethod::QuadraticSpectral => "Quadratic Spectral",
      VarianceMethod::SpcBartlett => "SPC Bartlett",
      VarianceMethod::SpcQuadraticSpectral => "SPC Quadratic Spectral",
      VarianceMethod::KurozumiBartlett => "Kurozumi Bartlett",
      VarianceMethod::KurozumiQuadraticSpectral => "Kurozumi Quadratic Spectral",
    }
  }

  pub fn kernel(self) -> Kernel {
    match self {
      VarianceMethod::Iid => Kernel::Iid,
      VarianceMethod::Bartlett
      | VarianceMethod::SpcBartlett
      | VarianceMethod::KurozumiBartlett => Kernel::Bartlett,
      VarianceMethod::QuadraticSpectral
      | VarianceMethod::SpcQuadraticSpectral
      | VarianceMethod::KurozumiQuadraticSpectral => Kernel::QuadraticSpectral,
    }
  }

  /// Bandwidth rule for a sample of `n` observations.
  ///
  /// `bwl` only applies to the fixed-bandwidth kernels; the data-driven
  /// variants always choose their own lag.
  pub fn bandwidth_rule(self, n: usize, bwl: Option<usize>) -> BandwidthRule {
    match self {
      VarianceMethod::Iid => BandwidthRule::Zero,
      VarianceMethod::Bartlett | VarianceMethod::QuadraticSpectral => {
        BandwidthRule::Fixed(bwl.unwrap_or_else(|| default_bandwidth(n)))
      }
      VarianceMethod::SpcBartlett | VarianceMethod::SpcQuadraticSpectral => BandwidthRule::Andrews {
        max_rho: SPC_MAX_RHO,
      },
      VarianceMethod::KurozumiBartlett | VarianceMethod::KurozumiQuadraticSpectral => {
        BandwidthRule::Kurozumi { k: KUROZUMI_K }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::BandwidthRule;
  use super::Kernel;
  use super::VarianceMethod;
  use super::default_bandwidth;

  #[test]
  fn bartlett_is_one_at_zero_and_vanishes_outside_unit_interval() {
    assert_eq!(Kernel::Bartlett.weight(0.0), 1.0);
    for x in [1.0, 1.5, -1.0, -3.0] {
      assert_eq!(Kernel::Bartlett.weight(x), 0.0);
    }
    assert_abs_diff_eq!(Kernel::Bartlett.weight(0.25), 0.75, epsilon = 1e-15);
  }

  #[test]
  fn quadratic_spectral_is_continuous_at_zero() {
    assert_eq!(Kernel::QuadraticSpectral.weight(0.0), 1.0);
    let mut prev = 1.0;
    for i in 1..=50 {
      let x = i as f64 * 1e-6;
      let w = Kernel::QuadraticSpectral.weight(x);
      assert!((w - 1.0).abs() < 1e-8, "w({x}) = {w}");
      assert!(w <= prev + 1e-15);
      prev = w;
    }
    // both branches agree around the switch point
    let x_switch = 1e-2 * 5.0 / (6.0 * std::f64::consts::PI);
    let below = Kernel::QuadraticSpectral.weight(x_switch * 0.999);
    let above = Kernel::QuadraticSpectral.weight(x_switch * 1.001);
    assert_abs_diff_eq!(below, above, epsilon = 1e-6);
  }

  #[test]
  fn quadratic_spectral_matches_closed_form() {
    let x: f64 = 0.8;
    let pi_x = std::f64::consts::PI * x;
    let z = 6.0 * pi_x / 5.0;
    let expected = 25.0 / (12.0 * pi_x * pi_x) * (z.sin() / z - z.cos());
    assert_abs_diff_eq!(Kernel::QuadraticSpectral.weight(x), expected, epsilon = 1e-12);
  }

  #[test]
  fn default_bandwidth_rule_of_thumb() {
    assert_eq!(default_bandwidth(100), 4);
    assert_eq!(default_bandwidth(200), 5);
  }

  #[test]
  fn fixed_bandwidth_uses_bwl_when_given() {
    let rule = VarianceMethod::Bartlett.bandwidth_rule(100, Some(7));
    assert_eq!(rule, BandwidthRule::Fixed(7));
    assert_eq!(rule.bandwidth(Kernel::Bartlett, &[0.0; 10], 8), 7);
    assert_eq!(rule.bandwidth(Kernel::Bartlett, &[0.0; 10], 3), 3);
    assert_eq!(
      VarianceMethod::Iid.bandwidth_rule(100, Some(7)),
      BandwidthRule::Zero
    );
  }

  #[test]
  fn data_driven_bandwidth_is_deterministic_and_bounded() {
    let v: Vec<f64> = (0..200)
      .map(|t| ((t as f64) * 0.37).sin() + 0.3 * ((t as f64) * 1.3).cos())
      .collect();
    for method in [
      VarianceMethod::SpcBartlett,
      VarianceMethod::SpcQuadraticSpectral,
      VarianceMethod::KurozumiBartlett,
      VarianceMethod::KurozumiQuadraticSpectral,
    ] {
      let rule = method.bandwidth_rule(v.len(), None);
      let b1 = rule.bandwidth(method.kernel(), &v, v.len() - 2);
      let b2 = rule.bandwidth(method.kernel(), &v, v.len() - 2);
      assert_eq!(b1, b2);
      assert!(b1 <= v.len() - 2);
    }
    let kuro = VarianceMethod::KurozumiBartlett.bandwidth_rule(v.len(), None);
    let spc = VarianceMethod::SpcBartlett.bandwidth_rule(v.len(), None);
    assert!(kuro.bandwidth(Kernel::Bartlett, &v, 198) <= spc.bandwidth(Kernel::Bartlett, &v, 198));
  }

  #[test]
  fn variance_method_codes_round_trip() {
    for code in 1..=7u8 {
      assert_eq!(VarianceMethod::from_code(code).unwrap().code(), code);
    }
    assert!(VarianceMethod::from_code(0).is_err());
    assert!(VarianceMethod::from_code(8).is_err());
  }
}
