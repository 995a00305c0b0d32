// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Easing functions.

use core::str::FromStr;

/// Where the jump happens in a [`Easing::Steps`] function.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum StepPosition {
    /// Jump at the start of each interval.
    Start,
    /// Jump at the end of each interval.
    #[default]
    End,
}

/// Maps linear progress in `[0, 1]` to eased progress.
///
/// # Example
///
/// ```rust
/// use trellis_animation::Easing;
///
/// assert_eq!(Easing::Linear.apply(0.25), 0.25);
/// assert_eq!(Easing::QuadIn.apply(0.5), 0.25);
/// assert_eq!("ease-in-out".parse::<Easing>(), Ok(Easing::EaseInOut));
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum Easing {
    /// No easing.
    #[default]
    Linear,
    /// `cubic-bezier(0.25, 0.1, 0.25, 1.0)`.
    Ease,
    /// `cubic-bezier(0.42, 0, 1, 1)`.
    EaseIn,
    /// `cubic-bezier(0, 0, 0.58, 1)`.
    EaseOut,
    /// `cubic-bezier(0.42, 0, 0.58, 1)`.
    EaseInOut,
    /// `t²`.
    QuadIn,
    /// `1 - (1 - t)²`.
    QuadOut,
    /// Quadratic in, then out.
    QuadInOut,
    /// `t³`.
    CubicIn,
    /// `1 - (1 - t)³`.
    CubicOut,
    /// Cubic in, then out.
    CubicInOut,
    /// A cubic Bézier through `(0, 0)`, `(x1, y1)`, `(x2, y2)`, `(1, 1)`.
    CubicBezier(f64, f64, f64, f64),
    /// A staircase with the given number of steps.
    Steps(u32, StepPosition),
}

impl Easing {
    /// Applies the easing to `t`, which is clamped to `[0, 1]` first.
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Ease => cubic_bezier(t, 0.25, 0.1, 0.25, 1.0),
            Self::EaseIn => cubic_bezier(t, 0.42, 0.0, 1.0, 1.0),
            Self::EaseOut => cubic_bezier(t, 0.0, 0.0, 0.58, 1.0),
            Self::EaseInOut => cubic_bezier(t, 0.42, 0.0, 0.58, 1.0),
            Self::QuadIn => t * t,
            Self::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - u * u / 2.0
                }
            }
            Self::CubicIn => t * t * t,
            Self::CubicOut => {
                let u = 1.0 - t;
                1.0 - u * u * u
            }
            Self::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - u * u * u / 2.0
                }
            }
            Self::CubicBezier(x1, y1, x2, y2) => cubic_bezier(t, x1, y1, x2, y2),
            Self::Steps(0, _) => t,
            Self::Steps(steps, position) => steps_at(t, steps, position),
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "t is clamped to [0, 1] so t * steps fits in u32"
)]
fn steps_at(t: f64, steps: u32, position: StepPosition) -> f64 {
    let n = f64::from(steps);
    let scaled = t * n;
    let floor = f64::from(scaled as u32);
    let stepped = match position {
        StepPosition::End => floor,
        StepPosition::Start if scaled > floor => floor + 1.0,
        StepPosition::Start => floor.max(if t > 0.0 { 1.0 } else { 0.0 }),
    };
    (stepped / n).min(1.0)
}

/// Evaluates a CSS-style cubic Bézier timing curve at progress `t`.
///
/// Inverts the x polynomial with Newton-Raphson, then samples y.
#[must_use]
pub fn cubic_bezier(t: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let bezier = |s: f64, p1: f64, p2: f64| {
        let u = 1.0 - s;
        3.0 * u * u * s * p1 + 3.0 * u * s * s * p2 + s * s * s
    };
    let dx = |s: f64| {
        let u = 1.0 - s;
        3.0 * u * u * x1 + 6.0 * u * s * (x2 - x1) + 3.0 * s * s * (1.0 - x2)
    };

    let mut s = t;
    for _ in 0..8 {
        let error = bezier(s, x1, x2) - t;
        if error.abs() < 1e-7 {
            break;
        }
        let slope = dx(s);
        if slope.abs() < 1e-7 {
            break;
        }
        s = (s - error / slope).clamp(0.0, 1.0);
    }
    bezier(s, y1, y2)
}

/// An easing name that did not parse.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown easing function")]
pub struct ParseEasingError;

impl FromStr for Easing {
    type Err = ParseEasingError;

    /// Accepts the keyword names (`linear`, `ease`, `ease-in`, `quad-out`,
    /// `cubic-in-out`, ...), `cubic-bezier(x1, y1, x2, y2)` and
    /// `steps(n)` / `steps(n, start|end)`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let keyword = match text {
            "linear" => Some(Self::Linear),
            "ease" => Some(Self::Ease),
            "ease-in" => Some(Self::EaseIn),
            "ease-out" => Some(Self::EaseOut),
            "ease-in-out" => Some(Self::EaseInOut),
            "quad-in" => Some(Self::QuadIn),
            "quad-out" => Some(Self::QuadOut),
            "quad-in-out" => Some(Self::QuadInOut),
            "cubic-in" => Some(Self::CubicIn),
            "cubic-out" => Some(Self::CubicOut),
            "cubic-in-out" => Some(Self::CubicInOut),
            _ => None,
        };
        if let Some(easing) = keyword {
            return Ok(easing);
        }

        let (name, args) = text
            .strip_suffix(')')
            .and_then(|t| t.split_once('('))
            .ok_or(ParseEasingError)?;
        let mut args = args.split(',').map(str::trim);
        match name.trim() {
            "cubic-bezier" => {
                let mut next = || -> Result<f64, ParseEasingError> {
                    args.next()
                        .and_then(|a| a.parse().ok())
                        .ok_or(ParseEasingError)
                };
                let easing = Self::CubicBezier(next()?, next()?, next()?, next()?);
                if args.next().is_some() {
                    return Err(ParseEasingError);
                }
                Ok(easing)
            }
            "steps" => {
                let steps = args
                    .next()
                    .and_then(|a| a.parse().ok())
                    .ok_or(ParseEasingError)?;
                let position = match args.next() {
                    None | Some("end") => StepPosition::End,
                    Some("start") => StepPosition::Start,
                    Some(_) => return Err(ParseEasingError),
                };
                Ok(Self::Steps(steps, position))
            }
            _ => Err(ParseEasingError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn every_curve_hits_endpoints() {
        let curves = [
            Easing::Linear,
            Easing::Ease,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
            Easing::QuadIn,
            Easing::QuadOut,
            Easing::QuadInOut,
            Easing::CubicIn,
            Easing::CubicOut,
            Easing::CubicInOut,
            Easing::CubicBezier(0.3, 0.0, 0.7, 1.0),
            Easing::Steps(4, StepPosition::End),
        ];
        for easing in curves {
            assert!(close(easing.apply(0.0), 0.0), "{easing:?} at 0");
            assert!(close(easing.apply(1.0), 1.0), "{easing:?} at 1");
        }
    }

    #[test]
    fn input_is_clamped() {
        assert_eq!(Easing::Linear.apply(-1.0), 0.0);
        assert_eq!(Easing::Linear.apply(2.0), 1.0);
    }

    #[test]
    fn linear_bezier_is_identity() {
        for i in 0..=10 {
            let t = f64::from(i) / 10.0;
            assert!(close(cubic_bezier(t, 0.0, 0.0, 1.0, 1.0), t), "t = {t}");
        }
    }

    #[test]
    fn ease_in_out_is_symmetric() {
        assert!(close(Easing::EaseInOut.apply(0.5), 0.5));
        assert!(Easing::EaseIn.apply(0.25) < 0.25);
        assert!(Easing::EaseOut.apply(0.25) > 0.25);
    }

    #[test]
    fn steps_jump() {
        let end = Easing::Steps(4, StepPosition::End);
        assert_eq!(end.apply(0.1), 0.0);
        assert_eq!(end.apply(0.3), 0.25);
        let start = Easing::Steps(4, StepPosition::Start);
        assert_eq!(start.apply(0.1), 0.25);
        assert_eq!(start.apply(0.25), 0.25);
        assert_eq!(start.apply(0.0), 0.0);
    }

    #[test]
    fn parses_keywords_and_functions() {
        assert_eq!("linear".parse(), Ok(Easing::Linear));
        assert_eq!("cubic-out".parse(), Ok(Easing::CubicOut));
        assert_eq!(
            "cubic-bezier(0.1, 0.2, 0.3, 0.4)".parse(),
            Ok(Easing::CubicBezier(0.1, 0.2, 0.3, 0.4))
        );
        assert_eq!("steps(3)".parse(), Ok(Easing::Steps(3, StepPosition::End)));
        assert_eq!(
            "steps(3, start)".parse(),
            Ok(Easing::Steps(3, StepPosition::Start))
        );
        assert_eq!("bounce".parse::<Easing>(), Err(ParseEasingError));
        assert_eq!("cubic-bezier(1, 2)".parse::<Easing>(), Err(ParseEasingError));
    }
}
