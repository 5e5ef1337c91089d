//! Curve (trajectory) types.
//!
//! A curve is an ordered list of locations with their velocities, sampled from
//! the track points of a mechanism.
use crate::{Error, MultiD as _, Result, Vec3};
use std::cell::OnceCell;

// Subtracted from every resampling distance to stay before the end point
const RESAMPLE_EPS: f64 = 1e-8;

/// A sample of a curve.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct CurvePoint {
    /// Location of the sample
    pub location: Vec3,
    /// Velocity of the sample
    pub velocity: Vec3,
}

impl CurvePoint {
    /// Create a new sample.
    pub const fn new(location: Vec3, velocity: Vec3) -> Self {
        Self { location, velocity }
    }

    /// Linear interpolation of both the location and the velocity.
    pub fn interp(&self, rhs: &Self, ratio: f64) -> Self {
        Self {
            location: self.location.interp(&rhs.location, ratio),
            velocity: self.velocity.interp(&rhs.velocity, ratio),
        }
    }
}

/// An ordered list of [`CurvePoint`].
///
/// The total length is computed once and cached.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, Default)]
pub struct Curve {
    points: Vec<CurvePoint>,
    #[cfg_attr(feature = "serde", serde(skip))]
    total_length: OnceCell<f64>,
}

impl PartialEq for Curve {
    fn eq(&self, other: &Self) -> bool {
        self.points == other.points
    }
}

impl From<Vec<CurvePoint>> for Curve {
    fn from(points: Vec<CurvePoint>) -> Self {
        Self::new(points)
    }
}

impl Curve {
    /// Create a curve from samples.
    pub fn new(points: Vec<CurvePoint>) -> Self {
        Self { points, total_length: OnceCell::new() }
    }

    /// The samples in order.
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Replace the samples. The cached length is dropped.
    pub fn set_points(&mut self, points: Vec<CurvePoint>) {
        self.points = points;
        self.total_length = OnceCell::new();
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Return true if there is no sample.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First sample.
    pub fn first(&self) -> Option<&CurvePoint> {
        self.points.first()
    }

    /// Last sample.
    pub fn last(&self) -> Option<&CurvePoint> {
        self.points.last()
    }

    /// Sum of the distances between consecutive samples.
    pub fn total_length(&self) -> f64 {
        *self.total_length.get_or_init(|| {
            self.points
                .windows(2)
                .map(|w| w[0].location.distance_to(&w[1].location))
                .sum()
        })
    }

    /// Return true if the first and the last locations are within `tol`.
    pub fn is_closed(&self, tol: f64) -> bool {
        match (self.first(), self.last()) {
            (Some(a), Some(b)) => a.location.distance_to(&b.location) <= tol,
            _ => false,
        }
    }

    /// Map every sample to a new curve.
    pub fn transform<F>(&self, f: F) -> Self
    where
        F: Fn(&CurvePoint) -> CurvePoint,
    {
        Self::new(self.points.iter().map(f).collect())
    }

    /// Resample the curve into `n` samples with equal arc length between
    /// them.
    ///
    /// The first sample is kept. The last sample is taken just before the end
    /// of the polyline.
    pub fn resample(&self, n: usize) -> Result<Self> {
        if n < 2 {
            return Err(Error::TooFewSamples { required: 2, provided: n });
        }
        if self.points.is_empty() {
            return Err(Error::TooFewSamples { required: 1, provided: 0 });
        }
        let seg = self.total_length() / (n - 1) as f64;
        let mut current = self.points[0];
        let mut index = 1;
        let mut out = Vec::with_capacity(n);
        out.push(current);
        for _ in 1..n {
            (current, index) = next_point(&current, index, &self.points, seg);
            out.push(current);
        }
        Ok(Self::new(out))
    }
}

// Walk the polyline from `current` (located before `pts[start]`) for `length`
// and return the point with the index at the end of its segment
fn next_point(
    current: &CurvePoint,
    start: usize,
    pts: &[CurvePoint],
    length: f64,
) -> (CurvePoint, usize) {
    let target = length - RESAMPLE_EPS;
    let last = pts.len() - 1;
    let mut index = start.min(last);
    let mut dist = 0.;
    let mut prev = *current;
    let mut check = prev.location.distance_to(&pts[index].location);
    while dist + check < target && index < last {
        dist += check;
        index += 1;
        prev = pts[index - 1];
        check = prev.location.distance_to(&pts[index].location);
    }
    let ratio = if check > 0. {
        ((target - dist) / check).clamp(0., 1.)
    } else {
        0.
    };
    (prev.interp(&pts[index], ratio), index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn polyline(locs: &[[f64; 3]]) -> Curve {
        locs.iter()
            .map(|&l| CurvePoint::new(l.into(), Vec3::ZERO))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn length_is_cached_until_replaced() {
        let mut c = polyline(&[[0., 0., 0.], [3., 4., 0.], [3., 4., 2.]]);
        assert_eq!(c.total_length(), 7.);
        assert_eq!(c.total_length(), 7.);
        c.set_points(polyline(&[[0., 0., 0.], [1., 0., 0.]]).points().to_vec());
        assert_eq!(c.total_length(), 1.);
    }

    #[test]
    fn resample_straight_line() {
        // Uneven spacing on a line
        let c = polyline(&[[0., 0., 0.], [0.1, 0., 0.], [1.7, 0., 0.], [2., 0., 0.], [4., 0., 0.]]);
        let r = c.resample(9).unwrap();
        assert_eq!(r.len(), 9);
        assert_abs_diff_eq!(r.total_length(), c.total_length(), epsilon = 1e-6);
        for (i, p) in r.points().iter().enumerate() {
            assert_abs_diff_eq!(p.location.x, 0.5 * i as f64, epsilon = 1e-6);
        }
    }

    #[test]
    fn resample_keeps_end_points() {
        let c = polyline(&[[0., 0., 0.], [1., 0., 0.], [1., 1., 0.], [0., 1., 1.], [2., 2., 2.]]);
        for n in [2, 3, 7, 50] {
            let r = c.resample(n).unwrap();
            assert_eq!(r.len(), n);
            assert_eq!(r.first(), c.first());
            let (a, b) = (r.last().unwrap().location, c.last().unwrap().location);
            assert_abs_diff_eq!(a.distance_to(&b), 0., epsilon = 1e-6);
        }
    }

    #[test]
    fn resample_interpolates_velocity() {
        let c = Curve::new(vec![
            CurvePoint::new(Vec3::ZERO, Vec3::ZERO),
            CurvePoint::new(Vec3::X, Vec3::new(0., 2., 0.)),
        ]);
        let r = c.resample(3).unwrap();
        assert_abs_diff_eq!(r.points()[1].velocity.y, 1., epsilon = 1e-6);
    }

    #[test]
    fn resample_degenerate() {
        assert!(matches!(
            Curve::default().resample(5),
            Err(Error::TooFewSamples { .. })
        ));
        let c = polyline(&[[1., 1., 1.]]);
        assert!(c.resample(1).is_err());
        let r = c.resample(4).unwrap();
        assert!(r.points().iter().all(|p| p.location == Vec3::new(1., 1., 1.)));
        // Repeated points do not divide by zero
        let c = polyline(&[[0., 0., 0.], [0., 0., 0.], [1., 0., 0.], [1., 0., 0.]]);
        let r = c.resample(5).unwrap();
        assert!(r.points().iter().all(|p| p.location.x.is_finite()));
    }

    #[test]
    fn closed_curve() {
        assert!(polyline(&[[0., 0., 0.], [1., 0., 0.], [0., 0., 0.]]).is_closed(1e-9));
        assert!(!polyline(&[[0., 0., 0.], [1., 0., 0.]]).is_closed(1e-9));
        assert!(!Curve::default().is_closed(1.));
    }
}
