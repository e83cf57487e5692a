//! Per-bin statistics.
//!
//! [`CategoryStats`] keeps every observation once and computes any
//! [`Statistic`] when the bin is finalised, so a single pass over the input
//! serves whichever statistic the caller asked for.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::{AttributeValue, DggsError, Result};

/// Aggregate computed per bin and category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Statistic {
  Count,
  Sum,
  Min,
  Max,
  Mean,
  Median,
  Std,
  Var,
  Range,
  Minority,
  Majority,
  Variety,
}

impl Statistic {
  pub const ALL: [Statistic; 12] = [
    Statistic::Count,
    Statistic::Sum,
    Statistic::Min,
    Statistic::Max,
    Statistic::Mean,
    Statistic::Median,
    Statistic::Std,
    Statistic::Var,
    Statistic::Range,
    Statistic::Minority,
    Statistic::Majority,
    Statistic::Variety,
  ];

  #[must_use]
  pub fn name(self) -> &'static str {
    match self {
      Statistic::Count => "count",
      Statistic::Sum => "sum",
      Statistic::Min => "min",
      Statistic::Max => "max",
      Statistic::Mean => "mean",
      Statistic::Median => "median",
      Statistic::Std => "std",
      Statistic::Var => "var",
      Statistic::Range => "range",
      Statistic::Minority => "minority",
      Statistic::Majority => "majority",
      Statistic::Variety => "variety",
    }
  }

  /// Everything but `count` reads an attribute.
  #[must_use]
  pub fn needs_field(self) -> bool {
    self != Statistic::Count
  }

  /// Statistics over the raw attribute values rather than their numeric
  /// reading.
  #[must_use]
  pub fn is_frequency(self) -> bool {
    matches!(self, Statistic::Minority | Statistic::Majority | Statistic::Variety)
  }
}

impl fmt::Display for Statistic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Statistic {
  type Err = DggsError;

  fn from_str(s: &str) -> Result<Self> {
    let wanted = s.trim().to_ascii_lowercase();
    Statistic::ALL
      .into_iter()
      .find(|st| st.name() == wanted)
      .ok_or_else(|| DggsError::InvalidStatistic(s.to_string()))
  }
}

/// Observations falling into one (cell, category) bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryStats {
  count: u64,
  values: Vec<f64>,
  raw: Vec<String>,
}

impl CategoryStats {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Records one feature. `value` is the attribute read for the statistic,
  /// `None` when no field is configured.
  pub fn add(&mut self, value: Option<&AttributeValue>) {
    self.count += 1;
    let Some(value) = value.filter(|v| !v.is_null()) else {
      return;
    };
    if let Some(v) = value.as_f64() {
      self.values.push(v);
    }
    self.raw.push(value.to_string());
  }

  /// Number of features seen, including those without a usable value.
  #[must_use]
  pub fn count(&self) -> u64 {
    self.count
  }

  /// Parsed numeric values in insertion order.
  #[must_use]
  pub fn values(&self) -> &[f64] {
    &self.values
  }

  #[must_use]
  pub fn finalize(&self, stat: Statistic) -> AttributeValue {
    let v = &self.values;
    match stat {
      Statistic::Count => AttributeValue::Int(self.count as i64),
      Statistic::Sum => AttributeValue::Float(v.iter().sum()),
      Statistic::Min => v.iter().copied().reduce(f64::min).into(),
      Statistic::Max => v.iter().copied().reduce(f64::max).into(),
      Statistic::Mean => mean(v).into(),
      Statistic::Median => median(v).into(),
      Statistic::Std => AttributeValue::Float(variance(v).sqrt()),
      Statistic::Var => AttributeValue::Float(variance(v)),
      Statistic::Range => {
        let lo = v.iter().copied().reduce(f64::min);
        let hi = v.iter().copied().reduce(f64::max);
        AttributeValue::Float(match (lo, hi) {
          (Some(lo), Some(hi)) => hi - lo,
          _ => 0.0,
        })
      }
      Statistic::Minority => self.by_frequency(|count, best| count < best).into(),
      Statistic::Majority => self.by_frequency(|count, best| count > best).into(),
      Statistic::Variety => {
        let distinct: std::collections::HashSet<&str> = self.raw.iter().map(String::as_str).collect();
        AttributeValue::Int(distinct.len() as i64)
      }
    }
  }

  /// Raw value whose frequency wins under `better`; the first inserted
  /// value keeps ties.
  fn by_frequency(&self, better: impl Fn(usize, usize) -> bool) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for r in &self.raw {
      let c = counts.entry(r.as_str()).or_insert(0);
      if *c == 0 {
        order.push(r.as_str());
      }
      *c += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for value in order {
      let count = counts[value];
      match best {
        Some((_, b)) if !better(count, b) => {}
        _ => best = Some((value, count)),
      }
    }
    best.map(|(value, _)| value.to_string())
  }
}

fn mean(v: &[f64]) -> Option<f64> {
  (!v.is_empty()).then(|| v.iter().sum::<f64>() / v.len() as f64)
}

fn median(v: &[f64]) -> Option<f64> {
  if v.is_empty() {
    return None;
  }
  let mut sorted = v.to_vec();
  sorted.sort_by(f64::total_cmp);
  let mid = sorted.len() / 2;
  Some(if sorted.len() % 2 == 0 {
    (sorted[mid - 1] + sorted[mid]) / 2.0
  } else {
    sorted[mid]
  })
}

/// Sample variance, 0 with fewer than two values.
fn variance(v: &[f64]) -> f64 {
  if v.len() < 2 {
    return 0.0;
  }
  let m = v.iter().sum::<f64>() / v.len() as f64;
  v.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (v.len() - 1) as f64
}
