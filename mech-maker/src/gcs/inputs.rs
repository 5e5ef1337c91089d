use super::{Constraint, Frame, MemberId};
use crate::{Error, MultiD, Quat, Result, Vec3};

/// A pair of constraint parameters interpolated from `start` to `end`.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Ramp<T> {
    /// Parameters at the start of the window
    pub start: [T; 2],
    /// Parameters at the end of the window
    pub end: [T; 2],
}

impl<T: MultiD> Ramp<T> {
    /// Create a new ramp.
    pub const fn new(start: [T; 2], end: [T; 2]) -> Self {
        Self { start, end }
    }

    /// Constant parameters.
    pub const fn hold(params: [T; 2]) -> Self {
        Self::new(params, params)
    }

    /// Parameters at `ratio` of the window.
    pub fn params(&self, ratio: f64) -> [T; 2] {
        let [s1, s2] = &self.start;
        let [e1, e2] = &self.end;
        [s1.interp(e1, ratio), s2.interp(e2, ratio)]
    }
}

/// The driven quantity of an input.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum Drive {
    /// Drive a location
    Location(Ramp<Vec3>),
    /// Drive an orientation
    Orientation(Ramp<Quat>),
    /// Drive an axis direction
    Axis(Ramp<Vec3>),
    /// Drive a pin, location and axis
    Pin(Ramp<Vec3>, Ramp<Vec3>),
    /// Drive the full pose, location and orientation
    All(Ramp<Vec3>, Ramp<Quat>),
}

impl Drive {
    fn constraint(&self, frames: [Frame; 2], ratio: f64) -> Constraint {
        let location = |r: &Ramp<Vec3>| Constraint::Location { frames, locations: r.params(ratio) };
        let orientation =
            |r: &Ramp<Quat>| Constraint::Orientation { frames, orientations: r.params(ratio) };
        match self {
            Self::Location(r) => location(r),
            Self::Orientation(r) => orientation(r),
            Self::Axis(r) => Constraint::axis(frames, r.params(ratio)),
            Self::Pin(r1, r2) => {
                Constraint::Group(vec![location(r1), Constraint::axis(frames, r2.params(ratio))])
            }
            Self::All(r1, r2) => Constraint::Group(vec![location(r1), orientation(r2)]),
        }
    }

    fn same_kind(&self, rhs: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(rhs)
    }
}

/// A time-windowed constraint generator, a driven degree of freedom.
///
/// Inside the window `[t0, t1]`, the constraint parameters are interpolated at
/// the ratio `(t - t0) / (t1 - t0)`. Outside the window, the input is
/// inactive.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct MechanismInput {
    frames: [Frame; 2],
    window: [f64; 2],
    drive: Drive,
}

impl MechanismInput {
    /// Drive a member relative to the world.
    pub fn fixed(member: MemberId, window: [f64; 2], drive: Drive) -> Result<Self> {
        Self::new([Frame::Member(member), Frame::World], window, drive)
    }

    /// Drive two members relative to each other.
    pub fn relative(m1: MemberId, m2: MemberId, window: [f64; 2], drive: Drive) -> Result<Self> {
        Self::new([Frame::Member(m1), Frame::Member(m2)], window, drive)
    }

    /// Create from the frames directly.
    ///
    /// Fails if the window has no width.
    pub fn new(frames: [Frame; 2], window: [f64; 2], drive: Drive) -> Result<Self> {
        let [start, end] = window;
        // Also rejects NaN
        if !(start.is_finite() && end.is_finite() && start < end) {
            return Err(Error::EmptyWindow { start, end });
        }
        Ok(Self { frames, window, drive })
    }

    /// Frames of the driven quantity.
    pub fn frames(&self) -> [Frame; 2] {
        self.frames
    }

    /// The time window `[t0, t1]`.
    pub fn window(&self) -> [f64; 2] {
        self.window
    }

    /// The driven quantity.
    pub fn drive(&self) -> &Drive {
        &self.drive
    }

    /// Members driven by this input.
    pub fn members(&self) -> impl Iterator<Item = MemberId> + '_ {
        self.frames.iter().filter_map(Frame::member)
    }

    /// Interpolation ratio at time `t`, `None` if outside the window.
    pub fn ratio(&self, t: f64) -> Option<f64> {
        let [t0, t1] = self.window;
        (t0..=t1).contains(&t).then(|| (t - t0) / (t1 - t0))
    }

    /// The constraint at time `t`, `None` if outside the window.
    pub fn constraint(&self, t: f64) -> Option<Constraint> {
        self.ratio(t).map(|ratio| self.drive.constraint(self.frames, ratio))
    }

    /// Return true if both inputs drive the same kind of quantity between the
    /// same pair of frames, in either order, and their windows share more
    /// than an end point.
    ///
    /// Windows touching at an end point are allowed, which stitches two ramps
    /// together.
    pub fn overlaps(&self, rhs: &Self) -> bool {
        let [a0, a1] = self.window;
        let [b0, b1] = rhs.window;
        let [f1, f2] = rhs.frames;
        let same_frames = self.frames == [f1, f2] || self.frames == [f2, f1];
        same_frames && self.drive.same_kind(&rhs.drive) && a0 < b1 && b0 < a1
    }
}
