//! Geometric constraint system of linkage mechanisms.
//!
//! A [`Mechanism`] owns the poses of its members, solves them with a
//! [`Solver`] at each time, and samples its outputs into curves.
pub use self::{
    constraint::{Constraint, Frame, Plane},
    inputs::{Drive, MechanismInput, Ramp},
    mechanism::Mechanism,
    member::{Member, MemberId},
    outputs::{MechanismOutput, TrackPoint, CYCLIC_TOL},
    solver::{BfgsSolver, SolveReport, Solver, SolverCfg},
    state::{MechanismState, POSE_DIM},
};

mod constraint;
mod inputs;
mod mechanism;
mod member;
mod outputs;
mod solver;
mod state;
