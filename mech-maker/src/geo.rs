//! Geometric building blocks: vectors and quaternions.
//!
//! All the types are plain `Copy` values. The operations return new
//! instances instead of modifying in place.
use nalgebra as na;
use std::{
    fmt,
    ops::{Add, Div, Index, Mul, Neg, Sub},
};

// Below this length a vector is treated as zero
const EPS: f64 = 1e-12;

/// Shared algebra of the multidimensional values.
///
/// Vectors interpolate linearly, quaternions interpolate spherically.
pub trait MultiD:
    Copy
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
{
    /// Inner product.
    fn dot(&self, rhs: &Self) -> f64;

    /// Interpolate from `self` (ratio 0) to `rhs` (ratio 1).
    fn interp(&self, rhs: &Self, ratio: f64) -> Self {
        *self * (1. - ratio) + *rhs * ratio
    }

    /// Squared length.
    fn sq_magnitude(&self) -> f64 {
        self.dot(self)
    }

    /// Length.
    fn magnitude(&self) -> f64 {
        self.sq_magnitude().sqrt()
    }

    /// Unit value in the same direction.
    ///
    /// A zero value stays zero.
    fn normalized(&self) -> Self {
        let m = self.magnitude();
        if m < EPS {
            *self
        } else {
            *self / m
        }
    }

    /// Length of the difference.
    fn distance_to(&self, rhs: &Self) -> f64 {
        (*rhs - *self).magnitude()
    }

    /// Angle between two values in `[0, π]`.
    ///
    /// The cosine is clamped before `acos`, and a zero operand gives zero.
    fn angle_to(&self, rhs: &Self) -> f64 {
        let m = self.magnitude() * rhs.magnitude();
        if m < EPS {
            return 0.;
        }
        (self.dot(rhs) / m).clamp(-1., 1.).acos()
    }
}

macro_rules! impl_multi_d {
    ($ty:ident, $prefix:literal, $($f:ident),+) => {
        impl Add for $ty {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self { $($f: self.$f + rhs.$f),+ }
            }
        }

        impl Sub for $ty {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self { $($f: self.$f - rhs.$f),+ }
            }
        }

        impl Neg for $ty {
            type Output = Self;
            fn neg(self) -> Self {
                Self { $($f: -self.$f),+ }
            }
        }

        impl Mul<f64> for $ty {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self {
                Self { $($f: self.$f * rhs),+ }
            }
        }

        impl Mul<$ty> for f64 {
            type Output = $ty;
            fn mul(self, rhs: $ty) -> $ty {
                rhs * self
            }
        }

        impl Div<f64> for $ty {
            type Output = Self;
            fn div(self, rhs: f64) -> Self {
                Self { $($f: self.$f / rhs),+ }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                let coords = [$(self.$f.to_string()),+];
                write!(f, "{}<{}>", $prefix, coords.join(","))
            }
        }
    };
}

/// 2D vector.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Vec2 {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl_multi_d!(Vec2, "Vec2", x, y);

impl MultiD for Vec2 {
    fn dot(&self, rhs: &Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y
    }
}

impl Vec2 {
    /// Create a new vector.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Z value of the cross product.
    pub fn cross(&self, rhs: &Self) -> f64 {
        self.x * rhs.y - self.y * rhs.x
    }
}

impl Index<usize> for Vec2 {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        match i {
            0 => &self.x,
            1 => &self.y,
            _ => panic!("index {i} out of range for Vec2"),
        }
    }
}

/// 3D vector.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Vec3 {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl_multi_d!(Vec3, "Vec3", x, y, z);

impl MultiD for Vec3 {
    fn dot(&self, rhs: &Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }
}

impl Vec3 {
    /// Zero vector.
    pub const ZERO: Self = Self::new(0., 0., 0.);
    /// Unit X axis.
    pub const X: Self = Self::new(1., 0., 0.);
    /// Unit Y axis.
    pub const Y: Self = Self::new(0., 1., 0.);
    /// Unit Z axis.
    pub const Z: Self = Self::new(0., 0., 1.);

    /// Create a new vector.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Cross product.
    pub fn cross(&self, rhs: &Self) -> Self {
        Self {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    /// Rotate by a rotation quaternion, `q * v / q`.
    pub fn rotate(&self, q: &Quat) -> Self {
        let p = *q * Quat::new(0., self.x, self.y, self.z) / *q;
        Self::new(p.x, p.y, p.z)
    }

    /// Coordinates as an array.
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Index<usize> for Vec3 {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("index {i} out of range for Vec3"),
        }
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Vec3> for na::Vector3<f64> {
    fn from(v: Vec3) -> Self {
        na::Vector3::new(v.x, v.y, v.z)
    }
}

impl From<na::Vector3<f64>> for Vec3 {
    fn from(v: na::Vector3<f64>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Quaternion `w + xi + yj + zk`.
///
/// A quaternion built as a rotation ([`Quat::rotation()`],
/// [`Quat::from_axis_angle()`], [`Quat::to_rotation()`]) always has unit
/// length. The operators `*` and `/` between quaternions are the raw Hamilton
/// product and quotient.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quat {
    /// Real part
    pub w: f64,
    /// I part
    pub x: f64,
    /// J part
    pub y: f64,
    /// K part
    pub z: f64,
}

impl_multi_d!(Quat, "Quat", w, x, y, z);

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl MultiD for Quat {
    fn dot(&self, rhs: &Self) -> f64 {
        self.w * rhs.w + self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    /// Spherical interpolation.
    ///
    /// The relative rotation `rhs / self` is scaled by `ratio` in its angle
    /// (taken in `[0, 2π]`, so the rotation is never shortcut) and composed
    /// back onto `self`.
    fn interp(&self, rhs: &Self, ratio: f64) -> Self {
        let (axis, angle) = (*rhs / *self).to_rotation().to_axis_angle();
        (Self::from_axis_angle(axis, angle * ratio) * *self).to_rotation()
    }
}

impl Mul for Quat {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self {
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        }
    }
}

impl Div for Quat {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        self * rhs.inverse()
    }
}

impl Quat {
    /// Identity rotation.
    pub const IDENTITY: Self = Self::new(1., 0., 0., 0.);

    /// Create a free quaternion.
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Create a rotation quaternion, normalized to unit length.
    pub fn rotation(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self::new(w, x, y, z).to_rotation()
    }

    /// Normalize to a rotation. A zero quaternion becomes the identity.
    pub fn to_rotation(self) -> Self {
        let m = self.magnitude();
        if m < EPS {
            Self::IDENTITY
        } else {
            self / m
        }
    }

    /// Rotation of `angle` radians around `axis`.
    ///
    /// A zero angle or a zero axis gives the identity.
    pub fn from_axis_angle(axis: Vec3, angle: f64) -> Self {
        if angle == 0. || axis.magnitude() < EPS {
            return Self::IDENTITY;
        }
        let axis = axis.normalized();
        let (s, c) = (angle / 2.).sin_cos();
        Self::rotation(c, axis.x * s, axis.y * s, axis.z * s)
    }

    /// Conjugate, which is the inverse of a rotation.
    pub fn inverse(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Rotation angle `2 acos(w)` in `[0, 2π]`.
    pub fn angle(&self) -> f64 {
        2. * self.w.clamp(-1., 1.).acos()
    }

    /// Rotation axis, zero if there is no rotation.
    pub fn axis(&self) -> Vec3 {
        self.axis_from_angle(self.angle())
    }

    /// Axis and angle of the rotation.
    pub fn to_axis_angle(&self) -> (Vec3, f64) {
        let angle = self.angle();
        (self.axis_from_angle(angle), angle)
    }

    // A full turn keeps its axis in a tiny vector part
    fn axis_from_angle(&self, angle: f64) -> Vec3 {
        let v = Vec3::new(self.x, self.y, self.z);
        let m = v.magnitude();
        if angle == 0. || m == 0. {
            Vec3::ZERO
        } else {
            v / m
        }
    }

    /// Coordinates as an array, `[w, x, y, z]`.
    pub const fn to_array(self) -> [f64; 4] {
        [self.w, self.x, self.y, self.z]
    }
}

impl From<Quat> for na::UnitQuaternion<f64> {
    fn from(q: Quat) -> Self {
        na::UnitQuaternion::from_quaternion(na::Quaternion::new(q.w, q.x, q.y, q.z))
    }
}

impl From<na::UnitQuaternion<f64>> for Quat {
    fn from(q: na::UnitQuaternion<f64>) -> Self {
        Self::rotation(q.w, q.i, q.j, q.k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    fn assert_quat_eq(a: Quat, b: Quat) {
        assert_abs_diff_eq!(&a.to_array()[..], &b.to_array()[..], epsilon = 1e-9);
    }

    #[test]
    fn rotation_preserves_magnitude() {
        let v = Vec3::new(1.5, -2., 0.25);
        for (axis, angle) in [
            (Vec3::X, 0.3),
            (Vec3::new(1., 1., 0.), 2.),
            (Vec3::new(-0.2, 0.7, 3.), 5.9),
            (Vec3::Z, PI),
        ] {
            let q = Quat::from_axis_angle(axis, angle);
            assert_abs_diff_eq!(q.magnitude(), 1., epsilon = 1e-12);
            assert_abs_diff_eq!(v.rotate(&q).magnitude(), v.magnitude(), epsilon = 1e-12);
        }
    }

    #[test]
    fn rotate_quarter_turn() {
        let q = Quat::from_axis_angle(Vec3::Z, FRAC_PI_2);
        let v = Vec3::X.rotate(&q);
        assert_abs_diff_eq!(&v.to_array()[..], &[0., 1., 0.][..], epsilon = 1e-12);
    }

    #[test]
    fn axis_angle_round_trip() {
        let q = Quat::from_axis_angle(Vec3::new(0., 3., 4.), 1.2);
        let (axis, angle) = q.to_axis_angle();
        assert_abs_diff_eq!(angle, 1.2, epsilon = 1e-12);
        assert_abs_diff_eq!(&axis.to_array()[..], &[0., 0.6, 0.8][..], epsilon = 1e-12);
        // The angle is never folded into (-π, π]
        assert_abs_diff_eq!(Quat::from_axis_angle(Vec3::Z, 1.9 * PI).angle(), 1.9 * PI, epsilon = 1e-9);
    }

    #[test]
    fn interp_end_points() {
        let pairs = [
            (Quat::IDENTITY, Quat::from_axis_angle(Vec3::Z, 1.)),
            (
                Quat::from_axis_angle(Vec3::X, 0.4),
                Quat::from_axis_angle(Vec3::new(1., 2., 3.), 2.5),
            ),
            (Quat::IDENTITY, Quat::from_axis_angle(Vec3::X, 0.95 * TAU)),
        ];
        for (q1, q2) in pairs {
            assert_quat_eq(q1.interp(&q2, 0.), q1);
            assert_quat_eq(q1.interp(&q2, 1.), q2);
        }
    }

    #[test]
    fn interp_takes_the_long_way() {
        let end = Quat::from_axis_angle(Vec3::Z, 1.5 * PI);
        let mid = Quat::IDENTITY.interp(&end, 0.5);
        assert_quat_eq(mid, Quat::from_axis_angle(Vec3::Z, 0.75 * PI));
    }

    #[test]
    fn interp_full_turn() {
        let turn = Quat::from_axis_angle(Vec3::Z, TAU);
        let (axis, angle) = turn.to_axis_angle();
        assert_abs_diff_eq!(angle, TAU, epsilon = 1e-9);
        assert_abs_diff_eq!(&axis.to_array()[..], &[0., 0., 1.][..], epsilon = 1e-12);
        assert_quat_eq(Quat::IDENTITY.interp(&turn, 0.5), Quat::from_axis_angle(Vec3::Z, PI));
        assert_quat_eq(Quat::IDENTITY.interp(&turn, 0.25), Quat::from_axis_angle(Vec3::Z, FRAC_PI_2));
    }

    #[test]
    fn degenerate_guards() {
        // Zero vectors
        assert_eq!(Vec3::ZERO.angle_to(&Vec3::X), 0.);
        assert_eq!(Vec3::ZERO.normalized(), Vec3::ZERO);
        assert_eq!(Quat::from_axis_angle(Vec3::ZERO, 1.), Quat::IDENTITY);
        assert_eq!(Quat::new(0., 0., 0., 0.).to_rotation(), Quat::IDENTITY);
        // Parallel axes overshooting the cosine
        let a = Vec3::new(0.1, 0.2, 0.3);
        assert_abs_diff_eq!(a.angle_to(&(a * 3.)), 0., epsilon = 1e-7);
        assert_abs_diff_eq!(a.angle_to(&-a), PI, epsilon = 1e-9);
        // Antipodal quaternions are the same rotation
        let q = Quat::from_axis_angle(Vec3::Y, 0.7);
        let p = q.interp(&-q, 0.5);
        assert!(p.to_array().iter().all(|c| c.is_finite()));
        assert_eq!(Quat::IDENTITY.axis(), Vec3::ZERO);
        assert!(Quat::new(1. + 1e-15, 0., 0., 0.).angle().is_finite());
    }

    #[test]
    fn vector_algebra() {
        let a = Vec3::new(1., 2., 3.);
        let b = Vec3::new(-1., 0.5, 2.);
        assert_eq!(a + b, Vec3::new(0., 2.5, 5.));
        assert_eq!(a - b, Vec3::new(2., 1.5, 1.));
        assert_eq!(2. * a, a * 2.);
        assert_eq!(a.interp(&b, 0.5), Vec3::new(0., 1.25, 2.5));
        assert_eq!(a.cross(&b).dot(&a), 0.);
        assert_eq!(Vec2::new(1., 0.).cross(&Vec2::new(0., 1.)), 1.);
        assert_eq!(a.to_string(), "Vec3<1,2,3>");
        assert_eq!(a[2], 3.);
    }

    #[test]
    fn nalgebra_conversion() {
        let q = Quat::from_axis_angle(Vec3::new(1., -1., 0.5), 0.8);
        let v = Vec3::new(0.3, 0.2, -1.);
        let nq = na::UnitQuaternion::from(q);
        let nv = nq * na::Vector3::from(v);
        assert_abs_diff_eq!(&Vec3::from(nv).to_array()[..], &v.rotate(&q).to_array()[..], epsilon = 1e-12);
        assert_quat_eq(Quat::from(nq), q);
    }
}
