use super::{Member, MemberId};
use crate::{Quat, Shape, Vec3};
use std::ops::{Index, Range};

/// Number of variables of a member pose, `[x, y, z, w, qx, qy, qz]`.
pub const POSE_DIM: usize = 7;

/// Members of a mechanism and their flat parameter vector.
///
/// The member of handle `i` owns the slice `i * 7..i * 7 + 7`.
#[derive(Clone, Debug, Default)]
pub struct MechanismState {
    members: Vec<Member>,
}

impl MechanismState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a member and return its handle.
    pub fn add_member(&mut self, member: Member) -> MemberId {
        self.members.push(member);
        MemberId(self.members.len() - 1)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Return true if there is no member.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Return true if the handle is registered.
    pub fn contains(&self, id: MemberId) -> bool {
        id.0 < self.members.len()
    }

    /// Get a member.
    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.get(id.0)
    }

    /// All members in handle order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Range of the member in the flat vector.
    pub fn range(&self, id: MemberId) -> Range<usize> {
        id.0 * POSE_DIM..(id.0 + 1) * POSE_DIM
    }

    /// Length of the flat vector.
    pub fn dim(&self) -> usize {
        self.members.len() * POSE_DIM
    }

    /// Flatten the member poses.
    pub fn to_raw_values(&self) -> Vec<f64> {
        let mut v = Vec::with_capacity(self.dim());
        for m in &self.members {
            v.extend(m.location.to_array());
            v.extend(m.orientation.to_array());
        }
        v
    }

    /// Write the member poses from a flat vector.
    ///
    /// The orientations are normalized.
    pub fn update_from_raw_values(&mut self, vals: &[f64]) {
        debug_assert_eq!(vals.len(), self.dim());
        for (m, v) in self.members.iter_mut().zip(vals.chunks_exact(POSE_DIM)) {
            m.location = Vec3::new(v[0], v[1], v[2]);
            m.orientation = Quat::rotation(v[3], v[4], v[5], v[6]);
        }
    }

    /// Write the member poses as stored, without normalization.
    ///
    /// The values are expected to come from [`Self::to_raw_values`].
    pub fn restore_raw_values(&mut self, vals: &[f64]) {
        debug_assert_eq!(vals.len(), self.dim());
        for (m, v) in self.members.iter_mut().zip(vals.chunks_exact(POSE_DIM)) {
            m.location = Vec3::new(v[0], v[1], v[2]);
            m.orientation = Quat::new(v[3], v[4], v[5], v[6]);
        }
    }

    /// World outlines of all members.
    pub fn shapes(&self) -> Vec<Shape> {
        self.members.iter().map(Member::shape).collect()
    }
}

impl Index<MemberId> for MechanismState {
    type Output = Member;

    fn index(&self, id: MemberId) -> &Member {
        &self.members[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MultiD as _;

    #[test]
    fn raw_values_round_trip() {
        let mut state = MechanismState::new();
        let a = state.add_member(Member::new(Vec3::new(1., 2., 3.), Quat::IDENTITY, Shape::line(1.)));
        let b = state.add_member(Member::new(
            Vec3::new(-1., 0., 0.5),
            Quat::from_axis_angle(Vec3::new(1., 1., 0.), 0.3),
            Shape::line(2.),
        ));
        assert_eq!(state.range(b), 7..14);
        let raw = state.to_raw_values();
        assert_eq!(raw.len(), 14);
        assert_eq!(raw[..3], [1., 2., 3.]);
        let before = state.members().to_vec();
        state.update_from_raw_values(&raw);
        assert_eq!(state[a], before[0]);
        let (qa, qb) = (state[b].orientation, before[1].orientation);
        assert!((qa - qb).magnitude() < 1e-15);
        assert_eq!(state.shapes().len(), 2);
    }

    #[test]
    fn apply_normalizes_orientation() {
        let mut state = MechanismState::new();
        let a = state.add_member(Member::default());
        state.update_from_raw_values(&[0., 0., 0., 2., 0., 0., 0.]);
        assert_eq!(state[a].orientation, Quat::IDENTITY);
        let raw = [1., 2., 3., 0.6, 0., 0.8, 0.];
        state.restore_raw_values(&raw);
        assert_eq!(state.to_raw_values(), raw);
    }
}
