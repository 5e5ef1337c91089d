//! Shape descriptors of curves.
//!
//! A curve is resampled by arc length, moved to its centroid, aligned with
//! its principal axes, and scaled to a unit extent along the first axis.
//! The descriptors of two curves are compared by their squared differences.
//!
//! ```
//! use mech_maker::{Curve, CurvePoint, CurveFeature, Vec3};
//!
//! let ellipse = |a: f64, b: f64| {
//!     let pts = (0..=90)
//!         .map(|i| std::f64::consts::TAU * i as f64 / 90.)
//!         .map(|t| CurvePoint::new(Vec3::new(a * t.cos(), b * t.sin(), 0.), Vec3::ZERO))
//!         .collect::<Vec<_>>();
//!     Curve::new(pts)
//! };
//! let f1 = CurveFeature::new(&ellipse(2., 1.), 60).unwrap();
//! let f2 = CurveFeature::new(&ellipse(3., 1.), 60).unwrap();
//! assert_eq!(f1.compare(&f1), 0.);
//! assert_eq!(f1.compare(&f2), f2.compare(&f1));
//! ```
use crate::{Curve, CurvePoint, Error, MultiD as _, Quat, Result, Vec2, Vec3};
use nalgebra as na;

// Below this extent a curve has no principal direction
const EPS: f64 = 1e-12;

/// Number of the descriptors.
pub const FEATURE_NUM: usize = 6;

/// Canonicalized curve and its descriptors.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct CurveFeature {
    centroid: Vec3,
    axes: [Vec3; 3],
    orientation: Quat,
    translated: Curve,
    scaled: Curve,
    features: [f64; FEATURE_NUM],
}

impl CurveFeature {
    /// Extract the features from `samples` samples of the curve.
    ///
    /// Fails if the curve is empty, if `samples < 2`, or if the curve has no
    /// extent.
    pub fn new(curve: &Curve, samples: usize) -> Result<Self> {
        let sampled = curve.resample(samples)?;
        let centroid = sampled
            .points()
            .iter()
            .fold(Vec3::ZERO, |acc, p| acc + p.location)
            / sampled.len() as f64;
        let translated = sampled.transform(|p| CurvePoint::new(p.location - centroid, p.velocity));
        let axes = principal_axes(&translated);
        let orientation = canonical_orientation(&axes);
        let rotated = translated.transform(|p| {
            CurvePoint::new(p.location.rotate(&orientation), p.velocity.rotate(&orientation))
        });
        let lx = extent(rotated.points().iter().map(|p| p.location.x));
        if lx < EPS {
            return Err(Error::DegenerateCurve);
        }
        let scaled = rotated.transform(|p| CurvePoint::new(p.location / lx, p.velocity / lx));
        let features = [
            scaled.total_length(),
            ellipticity(&scaled, Vec3::X, Vec3::Y),
            ellipticity(&scaled, Vec3::Y, Vec3::Z),
            ellipticity(&scaled, Vec3::X, Vec3::Z),
            centroid.magnitude(),
            orientation.angle(),
        ];
        tracing::debug!(?features, "curve features");
        Ok(Self { centroid, axes, orientation, translated, scaled, features })
    }

    /// The descriptors.
    ///
    /// In order: the length of the scaled curve, the ellipticities of the XY,
    /// YZ and XZ planes, the distance of the centroid to the origin, and the
    /// angle of the aligning rotation.
    pub fn features(&self) -> [f64; FEATURE_NUM] {
        self.features
    }

    /// Sum of the squared differences of the descriptors.
    pub fn compare(&self, rhs: &Self) -> f64 {
        self.features.iter().zip(&rhs.features).map(|(a, b)| (a - b) * (a - b)).sum()
    }

    /// Principal axes in decreasing variance, a right-handed frame.
    pub fn axes(&self) -> [Vec3; 3] {
        self.axes
    }

    /// Mean location of the samples.
    pub fn centroid(&self) -> Vec3 {
        self.centroid
    }

    /// Rotation from the world frame to the principal frame.
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// The curve moved to the centroid, and the principal axes as the
    /// velocities of a curve at the origin.
    pub fn curves(&self) -> [Curve; 2] {
        let axes = self.axes.iter().map(|a| CurvePoint::new(Vec3::ZERO, *a)).collect();
        [self.translated.clone(), Curve::new(axes)]
    }

    /// The canonicalized curve.
    pub fn scaled_curve(&self) -> &Curve {
        &self.scaled
    }
}

// Eigenvectors of the covariance, with the largest component of each axis
// positive and the last axis completing a right-handed frame
fn principal_axes(curve: &Curve) -> [Vec3; 3] {
    let cov = curve
        .points()
        .iter()
        .map(|p| na::Vector3::from(p.location))
        .fold(na::Matrix3::zeros(), |acc, d| acc + d * d.transpose())
        / curve.len() as f64;
    let eigen = cov.symmetric_eigen();
    let mut order = [0, 1, 2];
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));
    let mut axes = order.map(|i| canonical_sign(eigen.eigenvectors.column(i).into_owned().into()));
    if axes[0].cross(&axes[1]).dot(&axes[2]) < 0. {
        axes[2] = -axes[2];
    }
    axes
}

fn canonical_sign(v: Vec3) -> Vec3 {
    let a = v.to_array();
    let i = (0..3).max_by(|&i, &j| a[i].abs().total_cmp(&a[j].abs())).unwrap_or(0);
    if a[i] < 0. {
        -v
    } else {
        v
    }
}

// The rotation taking each axis onto the world X, Y, Z
fn canonical_orientation(axes: &[Vec3; 3]) -> Quat {
    let rows = axes.map(|a| na::Vector3::from(a).transpose());
    let rot = na::Rotation3::from_matrix_unchecked(na::Matrix3::from_rows(&rows));
    let q = Quat::from(na::UnitQuaternion::from_rotation_matrix(&rot));
    if q.w < 0. {
        -q
    } else {
        q
    }
}

fn extent<I>(iter: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (min, max) = iter
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| (min.min(v), max.max(v)));
    if min <= max {
        max - min
    } else {
        0.
    }
}

// Ratio of the minor extent to the major extent on a plane
fn ellipticity(curve: &Curve, v1: Vec3, v2: Vec3) -> f64 {
    let locs = curve
        .points()
        .iter()
        .map(|p| Vec2::new(p.location.dot(&v1), p.location.dot(&v2)))
        .collect::<Vec<_>>();
    let l_max = extent(locs.iter().map(|p| p.x));
    let l_min = extent(locs.iter().map(|p| p.y));
    if l_max < EPS {
        0.
    } else {
        l_min / l_max
    }
}
