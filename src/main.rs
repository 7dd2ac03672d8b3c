use std::env;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use hatemi_coint::stats::cointegration::HatemiConfig;
use hatemi_coint::stats::cointegration::ModelSpec;
use hatemi_coint::stats::cointegration::Sample;
use hatemi_coint::stats::cointegration::hatemi_j_test;
use ndarray::Array1;
use ndarray::Array2;

/// Usage: `hatemi-coint <y-file> <x-file> [model]`
///
/// `y-file` holds one value per line, `x-file` one row of whitespace separated
/// regressors per line.
fn main() -> Result<()> {
  let args: Vec<String> = env::args().collect();
  if args.len() < 3 {
    bail!("usage: {} <y-file> <x-file> [model 1|2|3]", args[0]);
  }

  let y = read_matrix_from_file(&args[1])?;
  let x = read_matrix_from_file(&args[2])?;
  if y.iter().any(|row| row.len() != 1) {
    bail!("{} must contain exactly one value per line", args[1]);
  }
  let k = x.first().map_or(0, Vec::len);
  if x.iter().any(|row| row.len() != k) {
    bail!("{} must have the same number of columns on every line", args[2]);
  }

  let y = Array1::from_iter(y.into_iter().map(|row| row[0]));
  let x = Array2::from_shape_vec((x.len(), k), x.into_iter().flatten().collect())?;
  let sample = Sample::new(y, x)?;

  let model = match args.get(3) {
    Some(m) => m.parse().context("model must be 1, 2 or 3")?,
    None => 1,
  };
  let cfg = HatemiConfig {
    model: ModelSpec::from_code(model)?,
    ..HatemiConfig::default()
  };

  let res = hatemi_j_test(&sample, cfg)?;
  println!("{res}");
  Ok(())
}

fn read_matrix_from_file(filename: &str) -> Result<Vec<Vec<f64>>> {
  let file = File::open(filename).with_context(|| format!("cannot open {filename}"))?;
  let reader = BufReader::new(file);
  let mut data = Vec::new();

  for line in reader.lines() {
    let line = line?;
    if line.trim().is_empty() {
      continue;
    }
    let row = line
      .split_whitespace()
      .map(|v| v.parse::<f64>())
      .collect::<Result<Vec<_>, _>>()
      .with_context(|| format!("invalid number in {filename}: {line}"))?;
    data.push(row);
  }

  Ok(data)
}
