use super::{MechanismState, MemberId};
use crate::{Curve, CurvePoint, MultiD as _, Vec3};

/// A sampled curve is cyclic if its first and last positions are closer than
/// this distance.
pub const CYCLIC_TOL: f64 = 0.01;

/// A point fixed on a member.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackPoint {
    /// The member
    pub member: MemberId,
    /// Location in the member frame
    pub location: Vec3,
}

impl TrackPoint {
    /// Create a new track point.
    pub const fn new(member: MemberId, location: Vec3) -> Self {
        Self { member, location }
    }

    /// World position under the state.
    pub fn position(&self, state: &MechanismState) -> Vec3 {
        state[self.member].relative_location(&self.location)
    }
}

/// Records the world positions of a track point over the solved times.
#[derive(Clone, Debug, PartialEq)]
pub struct MechanismOutput {
    track: TrackPoint,
    // Sorted by time
    samples: Vec<(f64, Vec3)>,
}

impl MechanismOutput {
    /// Create an empty output.
    pub const fn new(track: TrackPoint) -> Self {
        Self { track, samples: Vec::new() }
    }

    /// The tracked point.
    pub fn track_point(&self) -> &TrackPoint {
        &self.track
    }

    /// Record the position at time `t`.
    ///
    /// A sample at the same time is replaced, a non-finite time is ignored.
    pub fn apply_time(&mut self, t: f64, state: &MechanismState) {
        if !t.is_finite() {
            return;
        }
        let p = self.track.position(state);
        let i = self.samples.partition_point(|(ti, _)| *ti < t);
        match self.samples.get_mut(i) {
            Some(s) if s.0 == t => s.1 = p,
            _ => self.samples.insert(i, (t, p)),
        }
    }

    /// Drop all samples.
    pub fn reset(&mut self) {
        self.samples.clear();
    }

    /// Time and position samples in ascending time order.
    pub fn samples(&self) -> &[(f64, Vec3)] {
        &self.samples
    }

    /// Return true if the first and last positions meet.
    pub fn is_cyclic(&self) -> bool {
        match (self.samples.first(), self.samples.last()) {
            (Some((_, p0)), Some((_, p1))) => p0.distance_to(p1) <= CYCLIC_TOL,
            _ => false,
        }
    }

    /// The sampled curve with estimated velocities.
    ///
    /// Interior velocities are the derivative of the quadratic through the
    /// sample and its two neighbors. The end points use one-sided differences,
    /// or wrap around if the curve is cyclic.
    pub fn curve(&self) -> Curve {
        let s = &self.samples;
        let n = s.len();
        if n < 2 {
            let pts = s.iter().map(|(_, p)| CurvePoint::new(*p, Vec3::ZERO)).collect();
            return Curve::new(pts);
        }
        let cyclic = self.is_cyclic();
        let pts = (0..n)
            .map(|i| {
                let (t, p) = s[i];
                let v = if i == 0 {
                    if cyclic {
                        let prev = (t - (s[n - 1].0 - s[n - 2].0), s[n - 2].1);
                        lagrange_velocity(prev, s[0], s[1])
                    } else {
                        (s[1].1 - p) / (s[1].0 - t)
                    }
                } else if i == n - 1 {
                    if cyclic {
                        let next = (t + (s[1].0 - s[0].0), s[1].1);
                        lagrange_velocity(s[n - 2], s[n - 1], next)
                    } else {
                        (p - s[n - 2].1) / (t - s[n - 2].0)
                    }
                } else {
                    lagrange_velocity(s[i - 1], s[i], s[i + 1])
                };
                CurvePoint::new(p, v)
            })
            .collect();
        Curve::new(pts)
    }
}

// Derivative at `t1` of the quadratic through three samples
fn lagrange_velocity(
    (t0, p0): (f64, Vec3),
    (t1, p1): (f64, Vec3),
    (t2, p2): (f64, Vec3),
) -> Vec3 {
    let l0 = (t1 - t2) / ((t0 - t1) * (t0 - t2));
    let l1 = ((t1 - t2) + (t1 - t0)) / ((t1 - t0) * (t1 - t2));
    let l2 = (t1 - t0) / ((t2 - t0) * (t2 - t1));
    p0 * l0 + p1 * l1 + p2 * l2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{gcs::Member, Quat, Shape};
    use approx::assert_abs_diff_eq;
    use std::f64::consts::TAU;

    fn output_of(f: impl Fn(f64) -> Vec3, times: &[f64]) -> MechanismOutput {
        let mut state = MechanismState::new();
        let a = state.add_member(Member::default());
        let mut output = MechanismOutput::new(TrackPoint::new(a, Vec3::ZERO));
        for &t in times {
            state.update_from_raw_values(&[f(t).x, f(t).y, f(t).z, 1., 0., 0., 0.]);
            output.apply_time(t, &state);
        }
        output
    }

    #[test]
    fn samples_are_sorted() {
        let times = [0.5, 0., f64::NAN, 1., 0.25, 0.5, f64::INFINITY];
        let output = output_of(|t| Vec3::new(t, 0., 0.), &times);
        let times = output.samples().iter().map(|(t, _)| *t).collect::<Vec<_>>();
        assert_eq!(times, [0., 0.25, 0.5, 1.]);
        let mut output = output;
        output.reset();
        assert!(output.samples().is_empty());
        assert!(output.curve().is_empty());
    }

    #[test]
    fn track_point_follows_member() {
        let mut state = MechanismState::new();
        let a = state.add_member(Member::new(
            Vec3::new(0., 0., 1.),
            Quat::from_axis_angle(Vec3::Z, TAU / 4.),
            Shape::default(),
        ));
        let p = TrackPoint::new(a, Vec3::X).position(&state);
        assert_abs_diff_eq!(&p.to_array()[..], &[0., 1., 1.][..], epsilon = 1e-12);
    }

    #[test]
    fn quadratic_velocity_is_exact() {
        // x = t^2 on uneven steps
        let output = output_of(|t| Vec3::new(t * t, 1., 0.), &[0., 0.1, 0.3, 0.35, 0.8]);
        let curve = output.curve();
        for (cp, (t, _)) in curve.points()[1..4].iter().zip(&output.samples()[1..4]) {
            assert_abs_diff_eq!(cp.velocity.x, 2. * t, epsilon = 1e-9);
            assert_abs_diff_eq!(cp.velocity.y, 0., epsilon = 1e-9);
        }
        // One-sided at the open ends
        assert_abs_diff_eq!(curve.points()[0].velocity.x, 0.1, epsilon = 1e-9);
        assert_abs_diff_eq!(curve.points()[4].velocity.x, 1.15, epsilon = 1e-9);
    }

    #[test]
    fn cyclic_velocity_wraps_around() {
        let times = (0..=20).map(|i| i as f64 / 20.).collect::<Vec<_>>();
        let circle = |t: f64| Vec3::new((TAU * t).cos(), (TAU * t).sin(), 0.);
        let output = output_of(circle, &times);
        assert!(output.is_cyclic());
        let curve = output.curve();
        let [first, last] = [curve.first().unwrap(), curve.last().unwrap()];
        assert_abs_diff_eq!(first.velocity.x, last.velocity.x, epsilon = 1e-9);
        assert_abs_diff_eq!(first.velocity.y, last.velocity.y, epsilon = 1e-9);
        // Tangent of the circle
        assert!(first.velocity.x.abs() < 1e-9);
        assert!(first.velocity.y > 0.);
    }

    #[test]
    fn single_sample_has_no_velocity() {
        let output = output_of(|_| Vec3::new(1., 2., 3.), &[0.4]);
        let curve = output.curve();
        assert_eq!(curve.len(), 1);
        assert_eq!(curve.points()[0].velocity, Vec3::ZERO);
    }
}
