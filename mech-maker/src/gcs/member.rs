use crate::{Quat, Shape, Vec3};

/// Handle of a member, assigned when the member is added to a mechanism.
///
/// The handle is the index of the member in its [`MechanismState`].
///
/// [`MechanismState`]: super::MechanismState
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(pub(crate) usize);

impl MemberId {
    /// Index of the member.
    pub const fn index(&self) -> usize {
        self.0
    }
}

/// A rigid body with a pose and an outline in its local frame.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Member {
    /// Location of the local origin
    pub location: Vec3,
    /// Orientation of the local frame
    pub orientation: Quat,
    shape: Shape,
}

impl Member {
    /// Create a new member. The orientation is normalized.
    pub fn new(location: Vec3, orientation: Quat, shape: Shape) -> Self {
        Self { location, orientation: orientation.to_rotation(), shape }
    }

    /// World location of a local point.
    pub fn relative_location(&self, location: &Vec3) -> Vec3 {
        location.rotate(&self.orientation) + self.location
    }

    /// World direction of a local axis.
    pub fn relative_axis(&self, axis: &Vec3) -> Vec3 {
        axis.rotate(&self.orientation)
    }

    /// World orientation of a local orientation.
    pub fn relative_orientation(&self, orientation: &Quat) -> Quat {
        (self.orientation * *orientation).to_rotation()
    }

    /// Outline in the local frame.
    pub fn local_shape(&self) -> &Shape {
        &self.shape
    }

    /// Outline in the world frame.
    pub fn shape(&self) -> Shape {
        self.shape.transform(|p| self.relative_location(p))
    }
}
