//! Dense Gauss-Jordan elimination for the small systems the solver builds.

use ord_subset::OrdSubsetIterExt;

pub type Matrix = Vec<Vec<f64>>;

/// Entries below this, relative to the largest entry of their part of the
/// matrix, count as zero.
const RELATIVE_EPS: f64 = 1e-10;

/// Reduced row-echelon form of a matrix.
pub struct Echelon {
    pub rows: Matrix,
    /// `pivots[r]` is the pivot column of row `r`; rows past the end are zero
    /// on the eliminated columns.
    pub pivots: Vec<usize>,
    /// Zero cutoff for the eliminated columns.
    pub eps: f64,
}

/// Gauss-Jordan elimination with partial pivoting over the first `columns`
/// columns. Any columns after them (right-hand sides) are carried along.
pub fn reduce(mut rows: Matrix, columns: usize) -> Echelon {
    let eps = RELATIVE_EPS * max_abs(rows.iter().flat_map(|row| row.iter().take(columns)));
    let mut pivots = Vec::new();

    for col in 0..columns {
        let r = pivots.len();
        if r == rows.len() {
            break;
        }
        let best = match (r..rows.len()).ord_subset_max_by_key(|&i| rows[i][col].abs()) {
            Some(best) if rows[best][col].abs() > eps => best,
            _ => continue,
        };
        rows.swap(r, best);

        let pivot = rows[r][col];
        for x in rows[r].iter_mut() {
            *x /= pivot;
        }
        let pivot_row = rows[r].clone();
        for (i, row) in rows.iter_mut().enumerate() {
            let factor = row[col];
            if i == r || factor == 0.0 {
                continue;
            }
            for (x, p) in row.iter_mut().zip(&pivot_row) {
                *x -= factor * p;
            }
        }
        pivots.push(col);
    }
    Echelon { rows, pivots, eps }
}

impl Echelon {
    /// Per column, whether its unknown has a single value: a pivot column whose
    /// row does not involve any free column.
    pub fn determined(&self, columns: usize) -> Vec<bool> {
        let free: Vec<usize> = (0..columns).filter(|c| !self.pivots.contains(c)).collect();
        let mut determined = vec![false; columns];
        for (r, &col) in self.pivots.iter().enumerate() {
            determined[col] = free.iter().all(|&f| self.rows[r][f].abs() <= self.eps);
        }
        determined
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum LinearSolution {
    Inconsistent,
    /// `None` marks an unknown left free by the system.
    Solved(Vec<Option<f64>>),
}

/// Solve `a * x = b` exactly, reporting every determined unknown.
pub fn solve(a: &[Vec<f64>], b: &[f64]) -> LinearSolution {
    let columns = a.first().map_or(0, |row| row.len());
    let augmented: Matrix = a
        .iter()
        .zip(b)
        .map(|(row, rhs)| {
            let mut row = row.clone();
            row.push(*rhs);
            row
        })
        .collect();
    let echelon = reduce(augmented, columns);

    // a zero row is contradictory only if its right-hand side is nonzero on
    // the scale of `b`, not of `a`
    let rhs_eps = RELATIVE_EPS * max_abs(b.iter());
    let rank = echelon.pivots.len();
    if echelon.rows[rank..]
        .iter()
        .any(|row| row[columns].abs() > rhs_eps)
    {
        return LinearSolution::Inconsistent;
    }

    let determined = echelon.determined(columns);
    let mut values = vec![None; columns];
    for (r, &col) in echelon.pivots.iter().enumerate() {
        if determined[col] {
            values[col] = Some(echelon.rows[r][columns]);
        }
    }
    LinearSolution::Solved(values)
}

fn max_abs<'a>(entries: impl Iterator<Item = &'a f64>) -> f64 {
    entries.map(|x| x.abs()).fold(0.0, f64::max)
}

/// Unique solution of a square system, `None` if singular.
pub fn solve_unique(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    match solve(a, b) {
        LinearSolution::Solved(values) => values.into_iter().collect(),
        LinearSolution::Inconsistent => None,
    }
}
