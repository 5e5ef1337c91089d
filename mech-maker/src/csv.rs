//! Functions for reading/writing CSV format.
//!
//! Curves are written as rows of `x,y,z,vx,vy,vz` without a header.
pub use csv::Error;
use crate::{Curve, CurvePoint, Vec3};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::io::Cursor;

/// A row of a curve in CSV.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct CurveRecord {
    /// Location X
    pub x: f64,
    /// Location Y
    pub y: f64,
    /// Location Z
    pub z: f64,
    /// Velocity X
    pub vx: f64,
    /// Velocity Y
    pub vy: f64,
    /// Velocity Z
    pub vz: f64,
}

impl From<&CurvePoint> for CurveRecord {
    fn from(p: &CurvePoint) -> Self {
        let CurvePoint { location: l, velocity: v } = p;
        Self { x: l.x, y: l.y, z: l.z, vx: v.x, vy: v.y, vz: v.z }
    }
}

impl From<CurveRecord> for CurvePoint {
    fn from(r: CurveRecord) -> Self {
        Self::new(Vec3::new(r.x, r.y, r.z), Vec3::new(r.vx, r.vy, r.vz))
    }
}

/// Parse CSV from string.
///
/// Lines starting with `#` are skipped.
pub fn parse_csv<D>(s: &str) -> Result<Vec<D>, Error>
where
    D: DeserializeOwned,
{
    ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .from_reader(Cursor::new(s))
        .deserialize()
        .collect()
}

/// Dump CSV to string.
pub fn dump_csv<'a, C, S>(c: C) -> crate::Result<String>
where
    C: Into<std::borrow::Cow<'a, [S]>>,
    S: Serialize + Clone + 'a,
{
    let mut w = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    let v = c.into().into_owned();
    v.into_iter().try_for_each(|c| w.serialize(c))?;
    let buf = w.into_inner().map_err(|e| Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Parse a curve from CSV rows.
pub fn parse_curve(s: &str) -> crate::Result<Curve> {
    let rows = parse_csv::<CurveRecord>(s)?;
    Ok(Curve::new(rows.into_iter().map(CurvePoint::from).collect()))
}

/// Dump a curve to CSV rows.
pub fn dump_curve(curve: &Curve) -> crate::Result<String> {
    let rows = curve.points().iter().map(CurveRecord::from).collect::<Vec<_>>();
    dump_csv(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_rows() {
        let curve = Curve::new(vec![
            CurvePoint::new(Vec3::new(0., 1., 2.), Vec3::X),
            CurvePoint::new(Vec3::new(0.5, 1., -2.), Vec3::ZERO),
        ]);
        let s = dump_curve(&curve).unwrap();
        assert_eq!(s.lines().next(), Some("0.0,1.0,2.0,1.0,0.0,0.0"));
        assert_eq!(s.lines().count(), 2);
        assert_eq!(parse_curve(&s).unwrap(), curve);
        let s = format!("# location, velocity\n{s}");
        assert_eq!(parse_curve(&s).unwrap(), curve);
        assert!(parse_curve("1,2,3\n").is_err());
    }
}
