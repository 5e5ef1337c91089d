use super::{MechanismState, MemberId};
use crate::{MultiD as _, Quat, Vec3};

/// Reference frame of a constrained quantity.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Frame {
    /// The quantity is given in world coordinates
    World,
    /// The quantity is given in the local frame of a member
    Member(MemberId),
}

impl Frame {
    /// Member of the frame, if any.
    pub const fn member(&self) -> Option<MemberId> {
        match self {
            Self::World => None,
            Self::Member(id) => Some(*id),
        }
    }

    fn location(&self, state: &MechanismState, p: &Vec3) -> Vec3 {
        match self {
            Self::World => *p,
            Self::Member(id) => state[*id].relative_location(p),
        }
    }

    fn axis(&self, state: &MechanismState, a: &Vec3) -> Vec3 {
        match self {
            Self::World => *a,
            Self::Member(id) => state[*id].relative_axis(a),
        }
    }

    fn orientation(&self, state: &MechanismState, q: &Quat) -> Quat {
        match self {
            Self::World => *q,
            Self::Member(id) => state[*id].relative_orientation(q),
        }
    }
}

/// A plane `normal · p = offset`.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    /// Normal of the plane
    pub normal: Vec3,
    /// Offset along the normal
    pub offset: f64,
}

impl Plane {
    /// Create a new plane.
    pub const fn new(normal: Vec3, offset: f64) -> Self {
        Self { normal, offset }
    }

    /// The plane `z = z0`.
    pub const fn z(z0: f64) -> Self {
        Self::new(Vec3::Z, z0)
    }

    /// Signed plane equation at a point.
    pub fn eval(&self, p: &Vec3) -> f64 {
        self.normal.dot(p) - self.offset
    }
}

/// Geometric constraint, a non-negative residual over member poses.
///
/// The residual is zero if and only if the constraint is satisfied. The
/// primitive variants relate the same quantity expressed in two frames. A
/// "fixed" constraint uses [`Frame::World`] as its second frame, a "relative"
/// constraint uses two members.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
    /// Squared distance between two points
    Location {
        /// Frames of the points
        frames: [Frame; 2],
        /// Points in their frames
        locations: [Vec3; 2],
    },
    /// Squared angle between two orientations
    Orientation {
        /// Frames of the orientations
        frames: [Frame; 2],
        /// Orientations in their frames
        orientations: [Quat; 2],
    },
    /// Squared angle between two axes
    Axis {
        /// Frames of the axes
        frames: [Frame; 2],
        /// Unit axes in their frames
        axes: [Vec3; 2],
    },
    /// Squared plane equation at a point of a member
    OnPlane {
        /// The member
        member: MemberId,
        /// Point in the member frame
        location: Vec3,
        /// Plane in the world frame
        plane: Plane,
    },
    /// Sum of the sub-constraints
    Group(Vec<Constraint>),
}

impl Constraint {
    /// Location equality between a member point and a world point.
    pub fn fixed_location(member: MemberId, [local, global]: [Vec3; 2]) -> Self {
        Self::Location {
            frames: [Frame::Member(member), Frame::World],
            locations: [local, global],
        }
    }

    /// Location equality between points of two members.
    pub fn relative_location(m1: MemberId, m2: MemberId, locations: [Vec3; 2]) -> Self {
        Self::Location { frames: [Frame::Member(m1), Frame::Member(m2)], locations }
    }

    /// Orientation equality between a member and the world.
    pub fn fixed_orientation(member: MemberId, orientations: [Quat; 2]) -> Self {
        Self::Orientation { frames: [Frame::Member(member), Frame::World], orientations }
    }

    /// Orientation equality between two members.
    pub fn relative_orientation(m1: MemberId, m2: MemberId, orientations: [Quat; 2]) -> Self {
        Self::Orientation { frames: [Frame::Member(m1), Frame::Member(m2)], orientations }
    }

    /// Axis alignment between a member axis and a world axis.
    pub fn fixed_axis(member: MemberId, axes: [Vec3; 2]) -> Self {
        Self::axis([Frame::Member(member), Frame::World], axes)
    }

    /// Axis alignment between axes of two members.
    pub fn relative_axis(m1: MemberId, m2: MemberId, axes: [Vec3; 2]) -> Self {
        Self::axis([Frame::Member(m1), Frame::Member(m2)], axes)
    }

    /// Axis alignment, the axes are normalized.
    pub fn axis(frames: [Frame; 2], axes: [Vec3; 2]) -> Self {
        Self::Axis { frames, axes: axes.map(|a| a.normalized()) }
    }

    /// Keep a member point on a world plane.
    pub fn on_plane(member: MemberId, location: Vec3, plane: Plane) -> Self {
        Self::OnPlane { member, location, plane }
    }

    /// Revolute joint to the world, location equality plus axis alignment.
    pub fn fixed_pin(member: MemberId, locations: [Vec3; 2], axes: [Vec3; 2]) -> Self {
        Self::Group(vec![
            Self::fixed_location(member, locations),
            Self::fixed_axis(member, axes),
        ])
    }

    /// Revolute joint between two members.
    pub fn relative_pin(m1: MemberId, m2: MemberId, locations: [Vec3; 2], axes: [Vec3; 2]) -> Self {
        Self::Group(vec![
            Self::relative_location(m1, m2, locations),
            Self::relative_axis(m1, m2, axes),
        ])
    }

    /// Fully fixed to the world, location plus orientation equality.
    pub fn fixed_all(member: MemberId, locations: [Vec3; 2], orientations: [Quat; 2]) -> Self {
        Self::Group(vec![
            Self::fixed_location(member, locations),
            Self::fixed_orientation(member, orientations),
        ])
    }

    /// Rigidly attached members, location plus orientation equality.
    pub fn relative_all(
        m1: MemberId,
        m2: MemberId,
        locations: [Vec3; 2],
        orientations: [Quat; 2],
    ) -> Self {
        Self::Group(vec![
            Self::relative_location(m1, m2, locations),
            Self::relative_orientation(m1, m2, orientations),
        ])
    }

    /// Combine constraints.
    pub fn group<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        Self::Group(iter.into_iter().collect())
    }

    /// Residual of the constraint under the current poses.
    pub fn eval(&self, state: &MechanismState) -> f64 {
        match self {
            Self::Location { frames: [f1, f2], locations: [p1, p2] } => {
                (f1.location(state, p1) - f2.location(state, p2)).sq_magnitude()
            }
            Self::Orientation { frames: [f1, f2], orientations: [q1, q2] } => {
                let q1 = f1.orientation(state, q1);
                let q2 = f2.orientation(state, q2);
                (q2 / q1).to_rotation().angle().powi(2)
            }
            Self::Axis { frames: [f1, f2], axes: [a1, a2] } => {
                f1.axis(state, a1).angle_to(&f2.axis(state, a2)).powi(2)
            }
            Self::OnPlane { member, location, plane } => {
                plane.eval(&state[*member].relative_location(location)).powi(2)
            }
            Self::Group(group) => group.iter().map(|c| c.eval(state)).sum(),
        }
    }

    /// Sub-constraints of a group, empty for the primitive constraints.
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Group(group) => group,
            _ => &[],
        }
    }

    /// Members referenced by the constraint, may contain duplicates.
    pub fn members(&self) -> Vec<MemberId> {
        match self {
            Self::Location { frames, .. }
            | Self::Orientation { frames, .. }
            | Self::Axis { frames, .. } => frames.iter().filter_map(Frame::member).collect(),
            Self::OnPlane { member, .. } => vec![*member],
            Self::Group(group) => group.iter().flat_map(Self::members).collect(),
        }
    }
}
