use super::{Constraint, MechanismState};
use crate::Shape;
use nalgebra::{DMatrix, DVector};

// Sufficient decrease factor of the Armijo condition
const ARMIJO: f64 = 1e-4;
// Maximum halvings of the step length
const MAX_HALVING: usize = 40;
// Curvature threshold of the BFGS update
const CURVATURE_EPS: f64 = 1e-12;

/// Solver settings.
///
/// ```
/// use mech_maker::gcs::SolverCfg;
///
/// let cfg = SolverCfg::default().tolerance(1e-12).max_iter(1000);
/// assert_eq!(cfg.max_iter, 1000);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct SolverCfg {
    /// The configuration is solved if the total residual is under this value
    pub tolerance: f64,
    /// Maximum number of iterations
    pub max_iter: usize,
    /// Step of the central differences
    pub diff_step: f64,
    /// Stop if the gradient norm is under this value
    pub grad_tol: f64,
}

impl Default for SolverCfg {
    fn default() -> Self {
        Self { tolerance: 1e-10, max_iter: 500, diff_step: 1e-6, grad_tol: 1e-12 }
    }
}

impl SolverCfg {
    /// Set the residual tolerance.
    pub fn tolerance(self, tolerance: f64) -> Self {
        assert!(tolerance >= 0.);
        Self { tolerance, ..self }
    }

    /// Set the maximum number of iterations.
    pub fn max_iter(self, max_iter: usize) -> Self {
        Self { max_iter, ..self }
    }

    /// Set the step of the central differences.
    pub fn diff_step(self, diff_step: f64) -> Self {
        assert!(diff_step > 0.);
        Self { diff_step, ..self }
    }

    /// Set the gradient tolerance.
    pub fn grad_tol(self, grad_tol: f64) -> Self {
        Self { grad_tol, ..self }
    }
}

/// Statistics of a solve.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SolveReport {
    /// Iterations taken
    pub iterations: usize,
    /// Total residual at the end
    pub residual: f64,
}

/// A constraint solver.
///
/// Adjusts the member poses of a state in place to bring the sum of the
/// constraint residuals under a tolerance. An unsolvable configuration
/// returns `false`, the poses are then left at the solver's best attempt.
pub trait Solver {
    /// Solve the constraints, calling `iter_callback` with the world outlines
    /// of the members after each iteration.
    fn solve_with(
        &mut self,
        state: &mut MechanismState,
        constraints: &[Constraint],
        iter_callback: Option<&mut dyn FnMut(&[Shape])>,
    ) -> bool;

    /// Solve the constraints.
    fn solve(&mut self, state: &mut MechanismState, constraints: &[Constraint]) -> bool {
        self.solve_with(state, constraints, None)
    }
}

impl<S: Solver + ?Sized> Solver for &mut S {
    fn solve_with(
        &mut self,
        state: &mut MechanismState,
        constraints: &[Constraint],
        iter_callback: Option<&mut dyn FnMut(&[Shape])>,
    ) -> bool {
        (**self).solve_with(state, constraints, iter_callback)
    }
}

/// Quasi-Newton minimizer of the total residual.
///
/// The gradient is taken by central differences over the flat pose vector,
/// the inverse Hessian is approximated by BFGS updates, and each step is
/// chosen by Armijo backtracking. The orientations are re-projected onto
/// unit quaternions after every step.
#[derive(Clone, Debug, Default)]
pub struct BfgsSolver {
    cfg: SolverCfg,
    report: SolveReport,
}

impl BfgsSolver {
    /// Create a solver with the settings.
    pub fn new(cfg: SolverCfg) -> Self {
        Self { cfg, report: SolveReport::default() }
    }

    /// Solver settings.
    pub fn cfg(&self) -> &SolverCfg {
        &self.cfg
    }

    /// Mutable solver settings.
    pub fn cfg_mut(&mut self) -> &mut SolverCfg {
        &mut self.cfg
    }

    /// Statistics of the last solve.
    pub fn last_report(&self) -> SolveReport {
        self.report
    }

    fn gradient(
        &self,
        state: &mut MechanismState,
        constraints: &[Constraint],
        x: &DVector<f64>,
    ) -> DVector<f64> {
        let h = self.cfg.diff_step;
        let mut xp = x.clone();
        let mut g = DVector::zeros(x.len());
        for i in 0..x.len() {
            xp[i] = x[i] + h;
            let fp = objective(state, constraints, &xp);
            xp[i] = x[i] - h;
            let fm = objective(state, constraints, &xp);
            xp[i] = x[i];
            g[i] = (fp - fm) / (2. * h);
        }
        state.update_from_raw_values(x.as_slice());
        g
    }
}

impl Solver for BfgsSolver {
    fn solve_with(
        &mut self,
        state: &mut MechanismState,
        constraints: &[Constraint],
        mut iter_callback: Option<&mut dyn FnMut(&[Shape])>,
    ) -> bool {
        let tol = self.cfg.tolerance;
        let mut f = constraints.iter().map(|c| c.eval(state)).sum::<f64>();
        if state.is_empty() || f <= tol {
            self.report = SolveReport { iterations: 0, residual: f };
            return f <= tol;
        }
        let mut x = DVector::from_vec(state.to_raw_values());
        let n = x.len();
        let mut iterations = 0;
        let mut h_inv = DMatrix::<f64>::identity(n, n);
        let mut g = self.gradient(state, constraints, &x);
        while iterations < self.cfg.max_iter && f > tol && g.norm() > self.cfg.grad_tol {
            let mut d = -(&h_inv * &g);
            let mut slope = g.dot(&d);
            let mut steepest = false;
            if slope >= 0. {
                h_inv.fill_with_identity();
                d = -&g;
                slope = -g.norm_squared();
                steepest = true;
            }
            let (x_new, f_new) = match line_search(state, constraints, &x, f, &d, slope) {
                Some(v) => v,
                None if steepest => break,
                None => {
                    // Restart from the steepest descent
                    h_inv.fill_with_identity();
                    let d = -&g;
                    let slope = -g.norm_squared();
                    match line_search(state, constraints, &x, f, &d, slope) {
                        Some(v) => v,
                        None => break,
                    }
                }
            };
            iterations += 1;
            // Project the quaternions back onto the unit sphere
            state.update_from_raw_values(x_new.as_slice());
            let x_new = DVector::from_vec(state.to_raw_values());
            let g_new = self.gradient(state, constraints, &x_new);
            let s = &x_new - &x;
            let y = &g_new - &g;
            let sy = s.dot(&y);
            if sy > CURVATURE_EPS {
                let hy = &h_inv * &y;
                let c = (sy + y.dot(&hy)) / (sy * sy);
                h_inv += &s * s.transpose() * c;
                h_inv -= (&hy * s.transpose() + &s * hy.transpose()) / sy;
            }
            tracing::trace!(iterations, residual = f_new, step = s.norm());
            x = x_new;
            f = f_new;
            g = g_new;
            if let Some(callback) = iter_callback.as_mut() {
                callback(&state.shapes());
            }
        }
        state.update_from_raw_values(x.as_slice());
        self.report = SolveReport { iterations, residual: f };
        f <= tol
    }
}

fn objective(state: &mut MechanismState, constraints: &[Constraint], x: &DVector<f64>) -> f64 {
    state.update_from_raw_values(x.as_slice());
    constraints.iter().map(|c| c.eval(state)).sum()
}

fn line_search(
    state: &mut MechanismState,
    constraints: &[Constraint],
    x: &DVector<f64>,
    f: f64,
    d: &DVector<f64>,
    slope: f64,
) -> Option<(DVector<f64>, f64)> {
    let mut step = 1.;
    for _ in 0..MAX_HALVING {
        let x_new = x + d * step;
        let f_new = objective(state, constraints, &x_new);
        if f_new.is_finite() && f_new <= f + ARMIJO * step * slope {
            return Some((x_new, f_new));
        }
        step *= 0.5;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{gcs::Member, Quat, Vec3};
    use approx::assert_abs_diff_eq;

    #[test]
    fn no_constraint_is_trivial() {
        let mut state = MechanismState::new();
        let a = state.add_member(Member::new(
            Vec3::new(1., 2., 3.),
            Quat::from_axis_angle(Vec3::X, 0.4),
            Shape::line(1.),
        ));
        let before = state[a].clone();
        let mut solver = BfgsSolver::default();
        assert!(solver.solve(&mut state, &[]));
        assert_eq!(state[a], before);
        assert_eq!(solver.last_report().iterations, 0);
        // Also for an empty state
        assert!(solver.solve(&mut MechanismState::new(), &[]));
    }

    #[test]
    fn move_to_fixed_location() {
        let mut state = MechanismState::new();
        let a = state.add_member(Member::new(Vec3::ZERO, Quat::IDENTITY, Shape::line(1.)));
        let target = Vec3::new(0.5, -1., 2.);
        let cs = [Constraint::fixed_location(a, [Vec3::ZERO, target])];
        let mut solver = BfgsSolver::default();
        let mut calls = 0;
        let ok = solver.solve_with(&mut state, &cs, Some(&mut |shapes: &[Shape]| {
            assert_eq!(shapes.len(), 1);
            calls += 1;
        }));
        assert!(ok);
        let report = solver.last_report();
        assert_eq!(calls, report.iterations);
        assert!(report.residual <= solver.cfg().tolerance);
        assert_abs_diff_eq!(state[a].location.x, target.x, epsilon = 1e-4);
        assert_abs_diff_eq!(state[a].location.z, target.z, epsilon = 1e-4);
    }

    #[test]
    fn orientation_stays_normalized() {
        let mut state = MechanismState::new();
        let a = state.add_member(Member::default());
        let target = Quat::from_axis_angle(Vec3::new(1., 1., 0.), 1.2);
        let cs = [Constraint::fixed_orientation(a, [Quat::IDENTITY, target])];
        let mut solver = BfgsSolver::new(SolverCfg::default().max_iter(1000));
        assert!(solver.solve(&mut state, &cs));
        let q = state[a].orientation;
        assert_abs_diff_eq!(q.w * q.w + q.x * q.x + q.y * q.y + q.z * q.z, 1., epsilon = 1e-12);
        assert!(cs[0].eval(&state) <= 1e-10);
    }

    #[test]
    fn contradiction_is_unsolvable() {
        let mut state = MechanismState::new();
        let a = state.add_member(Member::default());
        let cs = [
            Constraint::fixed_location(a, [Vec3::ZERO, Vec3::ZERO]),
            Constraint::fixed_location(a, [Vec3::ZERO, Vec3::X]),
        ];
        let mut solver = BfgsSolver::new(SolverCfg::default().max_iter(50));
        assert!(!solver.solve(&mut state, &cs));
        // The best attempt sits between the two targets
        assert_abs_diff_eq!(state[a].location.x, 0.5, epsilon = 1e-3);
        assert_abs_diff_eq!(solver.last_report().residual, 0.5, epsilon = 1e-6);
    }
}
