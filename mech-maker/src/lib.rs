//! Mech🔩maker solves linkage mechanisms by geometric constraints, tracks the
//! curves of their points, and compares the curves by shape descriptors.
//!
//! ```
//! use mech_maker::{gcs::*, CurveFeature, Quat, Shape, Vec3};
//!
//! let mut mech = Mechanism::planar(BfgsSolver::default(), 0.);
//! let crank = mech.add_member(Member::new(Vec3::ZERO, Quat::IDENTITY, Shape::line(1.)));
//! mech.add_constraint(Constraint::fixed_location(crank, [Vec3::ZERO, Vec3::ZERO]))
//!     .unwrap();
//! let drive = Drive::Axis(Ramp::new([Vec3::X, Vec3::X], [Vec3::X, Vec3::Y]));
//! mech.add_input(MechanismInput::fixed(crank, [0., 1.], drive).unwrap())
//!     .unwrap();
//! mech.add_track_point(TrackPoint::new(crank, Vec3::X)).unwrap();
//! let times = (0..=10).map(|i| i as f64 / 10.).collect::<Vec<_>>();
//! assert!(mech.solve_times(&times).into_iter().all(|ok| ok));
//! let feature = CurveFeature::new(&mech.curves()[0], 20).unwrap();
//! assert_eq!(feature.compare(&feature), 0.);
//! ```
#![cfg_attr(doc_cfg, feature(doc_cfg))]
#![warn(missing_docs)]
pub use crate::{curve::*, error::*, feature::*, geo::*, shape::*};

#[cfg(feature = "csv")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "csv")))]
pub mod csv;
mod curve;
mod error;
mod feature;
pub mod gcs;
mod geo;
mod shape;
