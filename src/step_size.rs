use core::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{BoundError, BoundResult};

/// Step size schedule for the multiplier update.
///
/// The update after iteration `k - 1` uses `α^k`, so the first update asks
/// for `k = 1`. Only [`StepSize::Harmonic`] and [`StepSize::InverseSqrt`]
/// satisfy the diverging-sum, vanishing-limit conditions that guarantee
/// convergence; a constant step only gets close to the dual optimum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepSize {
    /// `α^k = value`
    Constant {
        /// Step used for every update.
        value: f64,
    },
    /// `α^k = initial / k`
    Harmonic {
        /// Step of the first update.
        initial: f64,
    },
    /// `α^k = initial / sqrt(k)`
    InverseSqrt {
        /// Step of the first update.
        initial: f64,
    },
    /// `α^k = values[k - 1]`
    Sequence {
        /// Steps in update order.
        values: Vec<f64>,
    },
}

impl Default for StepSize {
    fn default() -> Self {
        Self::Harmonic { initial: 1.0 }
    }
}

impl StepSize {
    /// Step size for update `k` (1-based), `None` for `k = 0` or past the
    /// end of a [`StepSize::Sequence`].
    pub fn at(&self, k: usize) -> Option<f64> {
        if k == 0 {
            return None;
        }
        match self {
            Self::Constant { value } => Some(*value),
            Self::Harmonic { initial } => Some(initial / k as f64),
            Self::InverseSqrt { initial } => Some(initial / (k as f64).sqrt()),
            Self::Sequence { values } => values.get(k - 1).copied(),
        }
    }

    /// Checks that every step up to `budget` is positive, finite and that a
    /// caller-supplied sequence never grows.
    pub fn validate(&self, budget: usize) -> BoundResult<()> {
        let check_scale = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(BoundError::invalid_input(format!(
                    "step size {name} must be positive and finite, got {value}"
                )))
            }
        };
        match self {
            Self::Constant { value } => check_scale("value", *value),
            Self::Harmonic { initial } | Self::InverseSqrt { initial } => {
                check_scale("initial", *initial)
            }
            Self::Sequence { values } => {
                if values.len() < budget {
                    return Err(BoundError::invalid_input(format!(
                        "step size sequence has {} values but the iteration budget is {budget}",
                        values.len()
                    )));
                }
                if let Some((k, value)) = values
                    .iter()
                    .enumerate()
                    .find(|(_, v)| !(v.is_finite() && **v > 0.0))
                {
                    return Err(BoundError::invalid_input(format!(
                        "step size sequence entry {} must be positive and finite, got {value}",
                        k + 1
                    )));
                }
                if let Some((k, (prev, next))) = values
                    .iter()
                    .tuple_windows()
                    .enumerate()
                    .find(|(_, (prev, next))| next > prev)
                {
                    return Err(BoundError::invalid_input(format!(
                        "step size sequence increases at entry {}: {prev} -> {next}",
                        k + 2
                    )));
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for StepSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant { value } => write!(f, "constant:{value}"),
            Self::Harmonic { initial } => write!(f, "harmonic:{initial}"),
            Self::InverseSqrt { initial } => {
                write!(f, "inverse-sqrt:{initial}")
            }
            Self::Sequence { values } => {
                write!(f, "sequence:{}", values.iter().join(","))
            }
        }
    }
}

impl FromStr for StepSize {
    type Err = BoundError;

    /// Parses `constant:0.1`, `harmonic:1`, `inverse-sqrt:2` or
    /// `sequence:1,0.5,0.25`. A bare kind uses a scale of 1.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, arg) = match s.split_once(':') {
            Some((kind, arg)) => (kind.trim(), Some(arg.trim())),
            None => (s.trim(), None),
        };
        let parse_f64 = |v: &str| {
            v.trim().parse::<f64>().map_err(|_| {
                BoundError::invalid_input(format!(
                    "could not parse step size value '{v}'"
                ))
            })
        };
        let scale = || arg.map_or(Ok(1.0), parse_f64);
        match kind {
            "constant" => Ok(Self::Constant { value: scale()? }),
            "harmonic" => Ok(Self::Harmonic { initial: scale()? }),
            "inverse-sqrt" | "inverse_sqrt" => {
                Ok(Self::InverseSqrt { initial: scale()? })
            }
            "sequence" => {
                let values = arg
                    .unwrap_or_default()
                    .split(',')
                    .filter(|v| !v.trim().is_empty())
                    .map(parse_f64)
                    .collect::<BoundResult<Vec<f64>>>()?;
                Ok(Self::Sequence { values })
            }
            other => Err(BoundError::invalid_input(format!(
                "unknown step size schedule '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests;
