use super::*;
use crate::{Curve, Error, Result, Shape, Vec3};
use std::collections::HashMap;

// Cache key of a time, `-0.` and `0.` share the same key
fn time_key(t: f64) -> u64 {
    if t == 0. {
        0f64.to_bits()
    } else {
        t.to_bits()
    }
}

/// A mechanism assembled from members, constraints, inputs and outputs.
///
/// Setting the time activates the inputs whose window contains it and solves
/// the member poses. Solved poses are cached per time, the cache is dropped
/// whenever the assembly changes.
///
/// ```
/// use mech_maker::{gcs::*, Quat, Shape, Vec3};
///
/// let mut mech = Mechanism::planar(BfgsSolver::default(), 0.);
/// let crank = mech.add_member(Member::new(Vec3::ZERO, Quat::IDENTITY, Shape::line(1.)));
/// mech.add_constraint(Constraint::fixed_location(crank, [Vec3::ZERO, Vec3::ZERO]))
///     .unwrap();
/// let spin = Drive::Axis(Ramp::new([Vec3::X, Vec3::X], [Vec3::X, Vec3::Y]));
/// mech.add_input(MechanismInput::fixed(crank, [0., 1.], spin).unwrap()).unwrap();
/// mech.add_track_point(TrackPoint::new(crank, Vec3::X)).unwrap();
/// assert_eq!(mech.solve_times(&[0., 0.5, 1.]), [true; 3]);
/// assert_eq!(mech.curves()[0].len(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct Mechanism<S: Solver = BfgsSolver> {
    solver: S,
    state: MechanismState,
    time: f64,
    constraints: Vec<Constraint>,
    inputs: Vec<MechanismInput>,
    outputs: Vec<MechanismOutput>,
    solved: HashMap<u64, Vec<f64>>,
    plane: Option<f64>,
}

impl Default for Mechanism {
    fn default() -> Self {
        Self::new(BfgsSolver::default())
    }
}

impl<S: Solver> Mechanism<S> {
    /// Create an empty mechanism.
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            state: MechanismState::new(),
            time: 0.,
            constraints: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            solved: HashMap::new(),
            plane: None,
        }
    }

    /// Create an empty planar mechanism.
    ///
    /// Every added member is kept on the plane `z = z0` with its local z axis
    /// along the world z axis.
    pub fn planar(solver: S, z0: f64) -> Self {
        Self { plane: Some(z0), ..Self::new(solver) }
    }

    /// The plane height if the mechanism is planar.
    pub fn plane(&self) -> Option<f64> {
        self.plane
    }

    /// Add a member and return its handle.
    pub fn add_member(&mut self, member: Member) -> MemberId {
        let id = self.state.add_member(member);
        if let Some(z0) = self.plane {
            self.constraints.push(Constraint::on_plane(id, Vec3::ZERO, Plane::z(z0)));
            self.constraints.push(Constraint::fixed_axis(id, [Vec3::Z, Vec3::Z]));
        }
        self.invalidate();
        id
    }

    /// Add a persistent constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<()> {
        self.check_members(constraint.members())?;
        self.constraints.push(constraint);
        self.invalidate();
        Ok(())
    }

    /// Add an input.
    ///
    /// Fails if it overlaps an input of the same kind between the same
    /// frames.
    pub fn add_input(&mut self, input: MechanismInput) -> Result<()> {
        self.check_members(input.members())?;
        if let Some(other) = self.inputs.iter().find(|other| other.overlaps(&input)) {
            let [start, end] = other.window();
            return Err(Error::OverlappingInput { start, end });
        }
        self.inputs.push(input);
        self.invalidate();
        Ok(())
    }

    /// Add an output tracking a member point.
    ///
    /// The output is filled with the already solved times.
    pub fn add_track_point(&mut self, track: TrackPoint) -> Result<()> {
        self.check_members([track.member])?;
        let mut output = MechanismOutput::new(track);
        let current = self.state.to_raw_values();
        for (key, vals) in &self.solved {
            self.state.restore_raw_values(vals);
            output.apply_time(f64::from_bits(*key), &self.state);
        }
        self.state.restore_raw_values(&current);
        self.outputs.push(output);
        Ok(())
    }

    fn check_members<I>(&self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = MemberId>,
    {
        match ids.into_iter().find(|id| !self.state.contains(*id)) {
            Some(id) => Err(Error::UnknownMember(id.index())),
            None => Ok(()),
        }
    }

    fn invalidate(&mut self) {
        if !self.solved.is_empty() {
            tracing::debug!(solved = self.solved.len(), "drop the solved states");
        }
        self.solved.clear();
        self.outputs.iter_mut().for_each(MechanismOutput::reset);
    }

    /// Replace the solver.
    pub fn set_solver(&mut self, solver: S) {
        self.solver = solver;
    }

    /// The solver.
    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// The mutable solver.
    pub fn solver_mut(&mut self) -> &mut S {
        &mut self.solver
    }

    /// The current member poses.
    pub fn state(&self) -> &MechanismState {
        &self.state
    }

    /// Get a member.
    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.state.member(id)
    }

    /// Persistent constraints, including the planar ones.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The inputs.
    pub fn inputs(&self) -> &[MechanismInput] {
        &self.inputs
    }

    /// The outputs.
    pub fn outputs(&self) -> &[MechanismOutput] {
        &self.outputs
    }

    /// The last set time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Return true if the time is solved and cached.
    pub fn is_solved(&self, t: f64) -> bool {
        self.solved.contains_key(&time_key(t))
    }

    /// World outlines of all members.
    pub fn shapes(&self) -> Vec<Shape> {
        self.state.shapes()
    }

    /// Curves of all outputs.
    pub fn curves(&self) -> Vec<Curve> {
        self.outputs.iter().map(MechanismOutput::curve).collect()
    }

    /// Constraints active at time `t`.
    pub fn constraints_at(&self, t: f64) -> Vec<Constraint> {
        let inputs = self.inputs.iter().filter_map(|input| input.constraint(t));
        self.constraints.iter().cloned().chain(inputs).collect()
    }

    /// Set the time and solve the member poses.
    ///
    /// A solved time is restored from the cache. Return false if the
    /// configuration cannot be solved. A non-finite time is never solved and
    /// leaves the mechanism untouched.
    pub fn set_time(&mut self, t: f64) -> bool {
        self.solve_time(t, None)
    }

    /// Set the time, calling `iter_callback` with the world outlines of the
    /// members after each solver iteration.
    ///
    /// The callback is not called if the time is cached.
    pub fn set_time_with<C>(&mut self, t: f64, mut iter_callback: C) -> bool
    where
        C: FnMut(&[Shape]),
    {
        self.solve_time(t, Some(&mut iter_callback))
    }

    /// Solve a series of times in order.
    pub fn solve_times(&mut self, times: &[f64]) -> Vec<bool> {
        times.iter().map(|t| self.set_time(*t)).collect()
    }

    /// Solve a series of times in order, calling `callback` after each time
    /// with its result.
    pub fn solve_times_with<C>(&mut self, times: &[f64], mut callback: C) -> Vec<bool>
    where
        C: FnMut(bool, &Self),
    {
        times
            .iter()
            .map(|t| {
                let ok = self.set_time(*t);
                callback(ok, self);
                ok
            })
            .collect()
    }

    fn solve_time(&mut self, t: f64, iter_callback: Option<&mut dyn FnMut(&[Shape])>) -> bool {
        if !t.is_finite() {
            tracing::warn!(t, "skip a non-finite time");
            return false;
        }
        self.time = t;
        let key = time_key(t);
        if let Some(vals) = self.solved.get(&key) {
            tracing::debug!(t, "restore the solved state");
            self.state.restore_raw_values(vals);
            return true;
        }
        let constraints = self.constraints_at(t);
        if !self.solver.solve_with(&mut self.state, &constraints, iter_callback) {
            let residual = constraints.iter().map(|c| c.eval(&self.state)).sum::<f64>();
            tracing::warn!(t, residual, "failed to solve the mechanism");
            return false;
        }
        tracing::debug!(t, "solved");
        self.solved.insert(key, self.state.to_raw_values());
        for output in &mut self.outputs {
            output.apply_time(t, &self.state);
        }
        true
    }
}
