//! Piecewise-linear function, used as the dioptre-to-hardware lens map.

use serde_json::Value;
use thiserror::Error;

use crate::error::ConfigError;

/// Errors raised while building a [`Pwl`].
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum PwlError {
    /// Points must be appended with strictly increasing x.
    #[error("points must be strictly increasing in x ({prev} then {next})")]
    NonIncreasing {
        /// x of the last accepted point.
        prev: f64,
        /// x of the rejected point.
        next: f64,
    },
}

/// Closed interval on the x axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// Lower bound.
    pub start: f64,
    /// Upper bound.
    pub end: f64,
}

impl Interval {
    /// Clamp `x` into the interval.
    pub fn clip(&self, x: f64) -> f64 {
        x.clamp(self.start, self.end)
    }
}

/// Piecewise-linear function over strictly increasing knots.
///
/// Evaluation interpolates linearly between neighbouring knots and clamps to
/// the end values outside the domain, so the function is monotone
/// non-decreasing whenever the knot ys are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pwl {
    points: Vec<(f64, f64)>,
}

impl Pwl {
    /// Create an empty function.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (x, y) pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (f64, f64)>) -> Result<Self, PwlError> {
        let mut pwl = Self::new();
        for (x, y) in pairs {
            pwl.append(x, y)?;
        }
        Ok(pwl)
    }

    /// Parse from a tuning document value: a flat `[x0, y0, x1, y1, ...]`
    /// array of numbers.
    pub fn read(value: &Value) -> Result<Self, ConfigError> {
        let raw = value
            .as_array()
            .ok_or(ConfigError::MapFormat)?
            .iter()
            .map(Value::as_f64)
            .collect::<Option<Vec<f64>>>()
            .ok_or(ConfigError::MapFormat)?;
        if raw.len() % 2 != 0 {
            return Err(ConfigError::MapArity(raw.len()));
        }
        Ok(Self::from_pairs(
            raw.chunks_exact(2).map(|pair| (pair[0], pair[1])),
        )?)
    }

    /// Append a knot. `x` must exceed the previous knot's x.
    pub fn append(&mut self, x: f64, y: f64) -> Result<(), PwlError> {
        if let Some(&(prev, _)) = self.points.last() {
            if x <= prev {
                return Err(PwlError::NonIncreasing { prev, next: x });
            }
        }
        self.points.push((x, y));
        Ok(())
    }

    /// Whether the function has no knots.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of knots.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// The x range covered by the knots. Empty functions report a
    /// degenerate interval at zero.
    pub fn domain(&self) -> Interval {
        match (self.points.first(), self.points.last()) {
            (Some(&(start, _)), Some(&(end, _))) => Interval { start, end },
            _ => Interval {
                start: 0.0,
                end: 0.0,
            },
        }
    }

    /// Evaluate at `x`, clamping outside the domain.
    pub fn eval(&self, x: f64) -> f64 {
        let points = self.points.as_slice();
        match points {
            [] => 0.0,
            [(_, y)] => *y,
            _ => {
                let (x0, y0) = points[0];
                if x <= x0 {
                    return y0;
                }
                let (xn, yn) = points[points.len() - 1];
                if x >= xn {
                    return yn;
                }
                // First knot strictly right of x; its predecessor exists
                // because x > points[0].x.
                let i = points
                    .iter()
                    .position(|&(px, _)| x < px)
                    .unwrap_or(points.len() - 1);
                let (xa, ya) = points[i - 1];
                let (xb, yb) = points[i];
                ya + (x - xa) * (yb - ya) / (xb - xa)
            }
        }
    }
}
