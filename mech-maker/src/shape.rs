use crate::Vec3;

/// Outline of a member, an ordered list of points in its local frame.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Shape {
    points: Vec<Vec3>,
}

impl Shape {
    /// Create a shape from points.
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    /// A straight link of `len` along the local X axis.
    pub fn line(len: f64) -> Self {
        Self::new(vec![Vec3::ZERO, Vec3::new(len, 0., 0.)])
    }

    /// Append a point.
    pub fn add_point(&mut self, point: Vec3) {
        self.points.push(point);
    }

    /// The points in order.
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Map every point to a new shape.
    pub fn transform<F>(&self, f: F) -> Self
    where
        F: Fn(&Vec3) -> Vec3,
    {
        Self::new(self.points.iter().map(f).collect())
    }
}

impl From<Vec<Vec3>> for Shape {
    fn from(points: Vec<Vec3>) -> Self {
        Self::new(points)
    }
}
