use glam::Vec4;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
}

/// Scalar evaluated over a particle's normalized lifetime (0 = born, 1 = dead).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MinMaxCurve {
    Constant { value: f32 },
    Curve { keys: Vec<CurveKey>, #[serde(default = "one")] multiplier: f32 },
}

fn one() -> f32 {
    1.0
}

impl Default for MinMaxCurve {
    fn default() -> Self {
        Self::constant(0.0)
    }
}

impl MinMaxCurve {
    pub fn constant(value: f32) -> Self {
        Self::Constant { value }
    }

    pub fn linear(start: f32, end: f32) -> Self {
        Self::Curve {
            keys: vec![CurveKey { time: 0.0, value: start }, CurveKey { time: 1.0, value: end }],
            multiplier: 1.0,
        }
    }

    pub fn evaluate(&self, t: f32) -> f32 {
        match self {
            Self::Constant { value } => *value,
            Self::Curve { keys, multiplier } => sample_keys(keys, t, |k| k.time, |k| k.value) * multiplier,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct GradientKey {
    pub time: f32,
    pub color: [f32; 4],
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ColorGradient {
    pub keys: Vec<GradientKey>,
}

impl ColorGradient {
    pub fn new(start: Vec4, end: Vec4) -> Self {
        Self {
            keys: vec![
                GradientKey { time: 0.0, color: start.to_array() },
                GradientKey { time: 1.0, color: end.to_array() },
            ],
        }
    }

    pub fn evaluate(&self, t: f32) -> Vec4 {
        if self.keys.is_empty() {
            return Vec4::ONE;
        }
        sample_keys(&self.keys, t, |k| k.time, |k| Vec4::from_array(k.color))
    }
}

/// Linear interpolation between keys sorted by time; holds the end values outside the key range.
fn sample_keys<K, T>(keys: &[K], t: f32, time: impl Fn(&K) -> f32, value: impl Fn(&K) -> T) -> T
where
    T: Copy + Default + std::ops::Add<Output = T> + std::ops::Mul<f32, Output = T>,
{
    let Some(first) = keys.first() else {
        return T::default();
    };
    if t <= time(first) {
        return value(first);
    }
    for pair in keys.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if t <= time(b) {
            let span = time(b) - time(a);
            if span <= f32::EPSILON {
                return value(b);
            }
            let f = (t - time(a)) / span;
            return value(a) * (1.0 - f) + value(b) * f;
        }
    }
    keys.last().map(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_curve_interpolates_and_clamps() {
        let curve = MinMaxCurve::linear(0.0, 2.0);
        assert!((curve.evaluate(0.25) - 0.5).abs() < 1e-6);
        assert!((curve.evaluate(-1.0) - 0.0).abs() < 1e-6);
        assert!((curve.evaluate(3.0) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn curve_multiplier_scales_result() {
        let curve = MinMaxCurve::Curve { keys: vec![CurveKey { time: 0.0, value: 1.0 }], multiplier: 3.0 };
        assert!((curve.evaluate(0.7) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn gradient_blends_colors() {
        let gradient = ColorGradient::new(Vec4::ONE, Vec4::new(0.0, 0.0, 0.0, 0.0));
        let mid = gradient.evaluate(0.5);
        assert!((mid - Vec4::splat(0.5)).length() < 1e-6);
    }

    #[test]
    fn curves_deserialize_from_json() {
        let curve: MinMaxCurve = serde_json::from_str(
            r#"{ "mode": "curve", "keys": [{ "time": 0.0, "value": 1.0 }, { "time": 1.0, "value": 0.0 }] }"#,
        )
        .expect("curve json");
        assert!((curve.evaluate(0.5) - 0.5).abs() < 1e-6);
    }
}
