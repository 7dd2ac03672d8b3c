//! Asymptotic critical values of the two-break residual cointegration test
//! (Hatemi-J, 2008), indexed by the number of regressors.

use super::common::CriticalValues;
use super::error::CointError;
use super::error::CointResult;

/// Statistic family sharing a row of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticFamily {
  /// ADF and `Zt` share the same distribution.
  AdfZt,
  Za,
}

pub const MAX_REGRESSORS: usize = 4;

const ADF_ZT: [CriticalValues; MAX_REGRESSORS] = [
  CriticalValues {
    one_percent: -6.503,
    five_percent: -6.015,
    ten_percent: -5.653,
  },
  CriticalValues {
    one_percent: -6.928,
    five_percent: -6.458,
    ten_percent: -6.224,
  },
  CriticalValues {
    one_percent: -7.833,
    five_percent: -7.352,
    ten_percent: -7.118,
  },
  CriticalValues {
    one_percent: -8.353,
    five_percent: -7.903,
    ten_percent: -7.705,
  },
];

const ZA: [CriticalValues; MAX_REGRESSORS] = [
  CriticalValues {
    one_percent: -90.704,
    five_percent: -76.003,
    ten_percent: -52.232,
  },
  CriticalValues {
    one_percent: -99.458,
    five_percent: -83.644,
    ten_percent: -76.806,
  },
  CriticalValues {
    one_percent: -118.577,
    five_percent: -104.860,
    ten_percent: -97.749,
  },
  CriticalValues {
    one_percent: -140.135,
    five_percent: -123.870,
    ten_percent: -116.169,
  },
];

/// Critical values for `k` regressors.
pub fn critical_values(k: usize, family: StatisticFamily) -> CointResult<CriticalValues> {
  if k == 0 || k > MAX_REGRESSORS {
    return Err(CointError::UnsupportedConfiguration { k });
  }
  Ok(match family {
    StatisticFamily::AdfZt => ADF_ZT[k - 1],
    StatisticFamily::Za => ZA[k - 1],
  })
}

#[cfg(test)]
mod tests {
  use super::StatisticFamily;
  use super::critical_values;
  use crate::stats::cointegration::common::CriticalValues;
  use crate::stats::cointegration::error::CointError;

  #[test]
  fn single_regressor_row_is_exact() {
    assert_eq!(
      critical_values(1, StatisticFamily::AdfZt).unwrap(),
      CriticalValues {
        one_percent: -6.503,
        five_percent: -6.015,
        ten_percent: -5.653,
      }
    );
    assert_eq!(
      critical_values(1, StatisticFamily::Za).unwrap(),
      CriticalValues {
        one_percent: -90.704,
        five_percent: -76.003,
        ten_percent: -52.232,
      }
    );
  }

  #[test]
  fn remaining_rows_are_exact() {
    let expected = [
      (2, [-6.928, -6.458, -6.224], [-99.458, -83.644, -76.806]),
      (3, [-7.833, -7.352, -7.118], [-118.577, -104.860, -97.749]),
      (4, [-8.353, -7.903, -7.705], [-140.135, -123.870, -116.169]),
    ];
    for (k, adf, za) in expected {
      let a = critical_values(k, StatisticFamily::AdfZt).unwrap();
      let z = critical_values(k, StatisticFamily::Za).unwrap();
      assert_eq!([a.one_percent, a.five_percent, a.ten_percent], adf);
      assert_eq!([z.one_percent, z.five_percent, z.ten_percent], za);
    }
  }

  #[test]
  fn more_than_four_regressors_is_unsupported() {
    assert_eq!(
      critical_values(5, StatisticFamily::AdfZt),
      Err(CointError::UnsupportedConfiguration { k: 5 })
    );
  }

  #[test]
  fn value_at_picks_row_entry() {
    let cv = critical_values(2, StatisticFamily::AdfZt).unwrap();
    assert_eq!(cv.value_at(0.01), -6.928);
    assert_eq!(cv.value_at(0.05), -6.458);
    assert_eq!(cv.value_at(0.10), -6.224);
    assert!(cv.rejects(-7.0, 0.05));
    assert!(!cv.rejects(-6.3, 0.05));
  }
}
