//! Principal pivoting engines for the box LCP.
//!
//! Both engines work on the same partitioned representation. Every variable
//! is either *free* (`w = 0`, `x` solved from the reduced system) or *bound*
//! (`x` pinned at `lo` or `hi`, `w` whatever the system says). Free
//! variables always occupy the leading permuted indexes `0..num_free`, so the
//! reduced system is the leading principal block of the permuted matrix and
//! moving a variable between the sets is a single row/column swap at the
//! block boundary.
//!
//! - **Murty** starts with every variable free, solves, and flips the
//!   lowest-indexed variable that violates its sign/bound condition.
//! - **Cottle–Dantzig** starts at `x = 0` and brings one driving variable at
//!   a time into complementarity, moving it continuously and using a ratio
//!   test to catch the first free variable hitting a bound or bound variable
//!   whose `w` reaches zero.
//!
//! Both terminate for P-matrices; symmetric positive definite systems
//! qualify.

use std::time::{Duration, Instant};

use nalgebra::{DMatrix, DVector};
use tracing::trace;

use crate::{LcpAlgorithm, LcpError, MatrixPermutation, VariableState};

/// Denominators smaller than this are treated as zero in the ratio test.
const PIVOT_EPSILON: f64 = 1e-14;

/// Whether `lo` means "no lower bound" (`-inf` or `-f64::MAX`).
pub(crate) fn is_lower_unbounded(lo: f64) -> bool {
    lo <= -f64::MAX
}

/// Whether `hi` means "no upper bound" (`+inf` or `f64::MAX`).
pub(crate) fn is_upper_unbounded(hi: f64) -> bool {
    hi >= f64::MAX
}

/// Whether a variable can never be bound.
pub(crate) fn is_unbounded(lo: f64, hi: f64) -> bool {
    is_lower_unbounded(lo) && is_upper_unbounded(hi)
}

/// Pivot and wall-clock allowance for one solve.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Budget {
    max_iterations: usize,
    max_time: f64,
    start: Instant,
    deadline: Option<Instant>,
}

impl Budget {
    pub(crate) fn new(max_iterations: usize, max_time: f64) -> Self {
        let start = Instant::now();
        let deadline = if max_time > 0.0 {
            Duration::try_from_secs_f64(max_time)
                .ok()
                .and_then(|d| start.checked_add(d))
        } else {
            None
        };
        Self {
            max_iterations,
            max_time,
            start,
            deadline,
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Fail if another pivot after `pivots` would exceed the budget.
    pub(crate) fn check(&self, pivots: usize) -> Result<(), LcpError> {
        if pivots >= self.max_iterations {
            return Err(LcpError::IterationLimit { iterations: pivots });
        }
        let out_of_time =
            self.max_time <= 0.0 || self.deadline.is_some_and(|d| Instant::now() >= d);
        if out_of_time {
            return Err(LcpError::TimeLimit {
                elapsed: self.elapsed().as_secs_f64(),
                iterations: pivots,
            });
        }
        Ok(())
    }
}

/// Solution of one (sub)problem, in that problem's original order.
#[derive(Debug, Clone)]
pub(crate) struct PivotOutcome {
    pub x: DVector<f64>,
    pub w: DVector<f64>,
    pub states: Vec<VariableState>,
    pub iterations: usize,
}

/// Solve `A x = b + w` with box complementarity on `[lo, hi]`.
///
/// `a` is consumed and permuted in place.
pub(crate) fn run(
    algorithm: LcpAlgorithm,
    a: DMatrix<f64>,
    b: &DVector<f64>,
    lo: &DVector<f64>,
    hi: &DVector<f64>,
    budget: &Budget,
    tolerance: f64,
) -> Result<PivotOutcome, LcpError> {
    if a.nrows() == 0 {
        return Ok(PivotOutcome {
            x: DVector::zeros(0),
            w: DVector::zeros(0),
            states: Vec::new(),
            iterations: 0,
        });
    }

    let mut engine = Pivoting::new(a, b, lo, hi, tolerance);

    // With every variable unbounded or pinned the partition is known up
    // front and the solve is a single linear system. Anything else costs
    // budget before the first partition is even evaluated.
    let needs_pivoting = (0..engine.len()).any(|i| !is_unbounded(lo[i], hi[i]) && lo[i] != hi[i]);
    let iterations = if needs_pivoting {
        budget.check(0)?;
        match algorithm {
            LcpAlgorithm::Murty => engine.murty(budget)?,
            LcpAlgorithm::CottleDantzig => engine.cottle_dantzig(budget)?,
        }
    } else {
        engine.free_all_unpinned();
        0
    };

    // Recompute from the final partition so accumulated ratio-test drift
    // does not leak into the answer.
    let (x, w) = engine.evaluate()?;
    engine.label_pinned(&w);

    Ok(PivotOutcome {
        x,
        w,
        states: engine.states,
        iterations,
    })
}

/// What stopped a Cottle–Dantzig step.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Blocking {
    /// The driver's `w` reached zero.
    Driver,
    /// The driver reached one of its own bounds.
    DriverBound(VariableState),
    /// A free variable reached a bound.
    FreeHitsBound(usize, VariableState),
    /// A bound variable's `w` reached zero.
    BoundReleases(usize),
}

struct Pivoting<'a> {
    perm: MatrixPermutation,
    b: &'a DVector<f64>,
    lo: &'a DVector<f64>,
    hi: &'a DVector<f64>,
    /// Indexed by original variable.
    states: Vec<VariableState>,
    num_free: usize,
    tolerance: f64,
}

impl<'a> Pivoting<'a> {
    fn new(
        a: DMatrix<f64>,
        b: &'a DVector<f64>,
        lo: &'a DVector<f64>,
        hi: &'a DVector<f64>,
        tolerance: f64,
    ) -> Self {
        let n = a.nrows();
        Self {
            perm: MatrixPermutation::new(a),
            b,
            lo,
            hi,
            states: vec![VariableState::AtLower; n],
            num_free: 0,
            tolerance,
        }
    }

    fn len(&self) -> usize {
        self.perm.len()
    }

    /// `lo == hi`: the variable can only ever sit on its bound.
    fn is_pinned(&self, i: usize) -> bool {
        self.lo[i] == self.hi[i]
    }

    fn bound_value(&self, i: usize) -> f64 {
        match self.states[i] {
            VariableState::AtUpper => self.hi[i],
            VariableState::AtLower | VariableState::Free => self.lo[i],
        }
    }

    /// Move a bound variable into the free block.
    fn promote(&mut self, i: usize) {
        let p = self.perm.permuted_index_of(i);
        debug_assert!(p >= self.num_free, "variable {i} is already free");
        self.perm.swap_rows_and_columns(p, self.num_free);
        self.num_free += 1;
        self.states[i] = VariableState::Free;
    }

    /// Move a free variable out of the free block onto a bound.
    fn demote(&mut self, i: usize, state: VariableState) {
        let p = self.perm.permuted_index_of(i);
        debug_assert!(p < self.num_free, "variable {i} is not free");
        self.num_free -= 1;
        self.perm.swap_rows_and_columns(p, self.num_free);
        self.states[i] = state;
    }

    fn move_to(&mut self, i: usize, next: VariableState) {
        match (self.states[i], next) {
            (VariableState::Free, VariableState::AtLower | VariableState::AtUpper) => {
                self.demote(i, next);
            }
            (VariableState::AtLower | VariableState::AtUpper, VariableState::Free) => {
                self.promote(i);
            }
            _ => self.states[i] = next,
        }
    }

    /// Factor the leading free block.
    fn factor_free_block(&self) -> Result<Option<nalgebra::Cholesky<f64, nalgebra::Dyn>>, LcpError> {
        let nf = self.num_free;
        if nf == 0 {
            return Ok(None);
        }
        self.perm
            .matrix()
            .view((0, 0), (nf, nf))
            .clone_owned()
            .cholesky()
            .map(Some)
            .ok_or(LcpError::NotPositiveDefinite { size: nf })
    }

    /// Solve the reduced system for the current partition.
    ///
    /// Returns `(x, w)` in original order with `w` exactly zero on free
    /// variables and `x` exactly on the bound for bound variables.
    fn evaluate(&self) -> Result<(DVector<f64>, DVector<f64>), LcpError> {
        let n = self.len();
        let nf = self.num_free;
        let a = self.perm.matrix();

        let mut x = DVector::zeros(n);
        for p in nf..n {
            x[p] = self.bound_value(self.perm.original_index_of(p));
        }

        if let Some(chol) = self.factor_free_block()? {
            let mut rhs = DVector::from_fn(nf, |p, _| self.b[self.perm.original_index_of(p)]);
            if nf < n {
                rhs -= a.view((0, nf), (nf, n - nf)) * x.rows(nf, n - nf);
            }
            x.rows_mut(0, nf).copy_from(&chol.solve(&rhs));
        }

        let mut w = a * &x - self.perm.permute(self.b);
        w.rows_mut(0, nf).fill(0.0);

        Ok((self.perm.unpermute(&x), self.perm.unpermute(&w)))
    }

    /// Pinned variables satisfy either bound; report the one `w` agrees with.
    fn label_pinned(&mut self, w: &DVector<f64>) {
        for i in 0..self.len() {
            if self.is_pinned(i) {
                self.states[i] = if w[i] >= 0.0 {
                    VariableState::AtLower
                } else {
                    VariableState::AtUpper
                };
            }
        }
    }

    fn free_all_unpinned(&mut self) {
        for i in 0..self.len() {
            if !self.is_pinned(i) {
                self.promote(i);
            }
        }
    }

    /// Murty's least-index principal pivoting.
    fn murty(&mut self, budget: &Budget) -> Result<usize, LcpError> {
        self.free_all_unpinned();

        let mut pivots = 0;
        loop {
            let (x, w) = self.evaluate()?;
            let Some((i, next)) = self.least_index_violation(&x, &w) else {
                return Ok(pivots);
            };
            budget.check(pivots)?;
            trace!(
                variable = i,
                from = ?self.states[i],
                to = ?next,
                free = self.num_free,
                "murty pivot"
            );
            self.move_to(i, next);
            pivots += 1;
        }
    }

    fn least_index_violation(
        &self,
        x: &DVector<f64>,
        w: &DVector<f64>,
    ) -> Option<(usize, VariableState)> {
        let tol = self.tolerance;
        (0..self.len()).find_map(|i| match self.states[i] {
            VariableState::Free if x[i] < self.lo[i] - tol => Some((i, VariableState::AtLower)),
            VariableState::Free if x[i] > self.hi[i] + tol => Some((i, VariableState::AtUpper)),
            VariableState::AtLower if !self.is_pinned(i) && w[i] < -tol => {
                Some((i, VariableState::Free))
            }
            VariableState::AtUpper if !self.is_pinned(i) && w[i] > tol => {
                Some((i, VariableState::Free))
            }
            _ => None,
        })
    }

    /// Cottle–Dantzig principal pivoting with a ratio test.
    fn cottle_dantzig(&mut self, budget: &Budget) -> Result<usize, LcpError> {
        let n = self.len();
        let mut x = DVector::zeros(n);
        let mut w = -self.b.clone();
        let mut processed = vec![false; n];
        let mut pivots = 0;

        for d in 0..n {
            loop {
                if let Some(state) = self.settled(d, x[d], w[d]) {
                    if state == VariableState::Free {
                        w[d] = 0.0;
                        self.promote(d);
                    } else {
                        self.states[d] = state;
                    }
                    break;
                }

                budget.check(pivots)?;
                pivots += 1;

                // The driver sits right after the free block.
                let nf = self.num_free;
                let pd = self.perm.permuted_index_of(d);
                self.perm.swap_rows_and_columns(pd, nf);

                let s = if w[d] < 0.0 { 1.0 } else { -1.0 };
                let (dx, dw) = self.direction(s)?;
                let (t, blocking) = self.ratio_test(d, s, &x, &w, &dx, &dw, &processed)?;

                x.axpy(t, &dx, 1.0);
                w.axpy(t, &dw, 1.0);
                trace!(driver = d, step = t, ?blocking, free = nf, "cottle-dantzig pivot");

                match blocking {
                    Blocking::Driver => {
                        w[d] = 0.0;
                        self.promote(d);
                        break;
                    }
                    Blocking::DriverBound(state) => {
                        self.states[d] = state;
                        x[d] = self.bound_value(d);
                        break;
                    }
                    Blocking::FreeHitsBound(j, state) => {
                        self.demote(j, state);
                        x[j] = self.bound_value(j);
                    }
                    Blocking::BoundReleases(j) => {
                        w[j] = 0.0;
                        self.promote(j);
                    }
                }
            }
            processed[d] = true;
        }

        Ok(pivots)
    }

    /// Whether driver `d` already satisfies complementarity, and how.
    fn settled(&self, d: usize, xd: f64, wd: f64) -> Option<VariableState> {
        let tol = self.tolerance;
        let (lo, hi) = (self.lo[d], self.hi[d]);

        if self.is_pinned(d) {
            return Some(if wd >= 0.0 {
                VariableState::AtLower
            } else {
                VariableState::AtUpper
            });
        }

        let at_lo = xd <= lo + tol;
        let at_hi = xd >= hi - tol;
        if wd.abs() <= tol {
            return Some(if at_lo {
                VariableState::AtLower
            } else if at_hi {
                VariableState::AtUpper
            } else {
                VariableState::Free
            });
        }
        if wd > 0.0 && at_lo {
            return Some(VariableState::AtLower);
        }
        if wd < 0.0 && at_hi {
            return Some(VariableState::AtUpper);
        }
        None
    }

    /// Change in `(x, w)`, original order, per unit move of the driver in
    /// direction `s`. The driver is at permuted index `num_free`.
    fn direction(&self, s: f64) -> Result<(DVector<f64>, DVector<f64>), LcpError> {
        let n = self.len();
        let nf = self.num_free;
        let tail = n - nf;
        let a = self.perm.matrix();

        let mut dx = DVector::zeros(n);
        let mut dw = DVector::zeros(n);
        dx[self.perm.original_index_of(nf)] = s;

        let mut dw_tail = a.column(nf).rows(nf, tail) * s;
        if let Some(chol) = self.factor_free_block()? {
            // Keep w = 0 on the free block: A_FF dx_F = -A_Fd s.
            let dx_free = chol.solve(&a.column(nf).rows(0, nf).clone_owned()) * (-s);
            dw_tail += a.view((nf, 0), (tail, nf)) * &dx_free;
            for p in 0..nf {
                dx[self.perm.original_index_of(p)] = dx_free[p];
            }
        }
        for k in 0..tail {
            dw[self.perm.original_index_of(nf + k)] = dw_tail[k];
        }

        Ok((dx, dw))
    }

    /// Largest step along `(dx, dw)` that keeps every processed variable
    /// complementary, and what blocks it.
    #[allow(clippy::too_many_arguments)]
    fn ratio_test(
        &self,
        d: usize,
        s: f64,
        x: &DVector<f64>,
        w: &DVector<f64>,
        dx: &DVector<f64>,
        dw: &DVector<f64>,
        processed: &[bool],
    ) -> Result<(f64, Blocking), LcpError> {
        let mut best: Option<(f64, Blocking)> = None;
        let mut consider = |t: f64, blocking: Blocking| {
            if best.is_none_or(|(t_best, _)| t < t_best) {
                best = Some((t.max(0.0), blocking));
            }
        };

        if s * dw[d] > PIVOT_EPSILON {
            consider(-w[d] / dw[d], Blocking::Driver);
        }
        if s > 0.0 && !is_upper_unbounded(self.hi[d]) {
            consider(self.hi[d] - x[d], Blocking::DriverBound(VariableState::AtUpper));
        }
        if s < 0.0 && !is_lower_unbounded(self.lo[d]) {
            consider(x[d] - self.lo[d], Blocking::DriverBound(VariableState::AtLower));
        }

        for j in 0..self.len() {
            if j == d {
                continue;
            }
            match self.states[j] {
                VariableState::Free => {
                    if dx[j] < -PIVOT_EPSILON && !is_lower_unbounded(self.lo[j]) {
                        consider(
                            (self.lo[j] - x[j]) / dx[j],
                            Blocking::FreeHitsBound(j, VariableState::AtLower),
                        );
                    } else if dx[j] > PIVOT_EPSILON && !is_upper_unbounded(self.hi[j]) {
                        consider(
                            (self.hi[j] - x[j]) / dx[j],
                            Blocking::FreeHitsBound(j, VariableState::AtUpper),
                        );
                    }
                }
                _ if !processed[j] || self.is_pinned(j) => {}
                VariableState::AtLower if dw[j] < -PIVOT_EPSILON => {
                    consider(-w[j] / dw[j], Blocking::BoundReleases(j));
                }
                VariableState::AtUpper if dw[j] > PIVOT_EPSILON => {
                    consider(-w[j] / dw[j], Blocking::BoundReleases(j));
                }
                _ => {}
            }
        }

        best.ok_or(LcpError::NotPositiveDefinite {
            size: self.num_free + 1,
        })
    }
}
