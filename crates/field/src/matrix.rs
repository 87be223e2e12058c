//! Dense matrices over `Z_p`.
//!
//! Entries are stored row-major as reduced `u64` values. Row reduction uses
//! partial pivoting on the largest raw residue in the column, normalizes each
//! pivot row so the pivot is one, and eliminates below it. Solutions of
//! under-determined systems fix every free variable to zero so results are
//! reproducible.

use crate::numtheory::{add_mod, min_primitive_root, mod_pow, mul_mod};
use crate::{FieldError, Zp};
use rand::Rng;
use std::fmt;

/// A `rows × cols` matrix over `Z_prime`.
#[derive(Clone, PartialEq, Eq)]
pub struct ZpMatrix {
    rows: usize,
    cols: usize,
    prime: u64,
    data: Vec<u64>,
}

impl ZpMatrix {
    /// All-zero matrix.
    pub fn zeros(rows: usize, cols: usize, prime: u64) -> Self {
        assert!(prime >= 2, "field modulus must be at least 2, got {prime}");
        Self {
            rows,
            cols,
            prime,
            data: vec![0; rows * cols],
        }
    }

    pub fn identity(size: usize, prime: u64) -> Self {
        let mut m = Self::zeros(size, size, prime);
        for i in 0..size {
            m.data[i * size + i] = 1 % prime;
        }
        m
    }

    /// Build from explicit rows. All rows must have equal length and share
    /// the modulus `prime`.
    pub fn from_rows(rows: &[Vec<Zp>], prime: u64) -> Result<Self, FieldError> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut m = Self::zeros(rows.len(), cols, prime);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(FieldError::DimensionMismatch {
                    expected: (1, cols),
                    actual: (1, row.len()),
                });
            }
            for (j, v) in row.iter().enumerate() {
                m.checked_set(i, j, *v)?;
            }
        }
        Ok(m)
    }

    /// A `1 × n` matrix.
    pub fn row_vector(values: &[Zp], prime: u64) -> Result<Self, FieldError> {
        Self::from_rows(&[values.to_vec()], prime)
    }

    /// An `n × 1` matrix.
    pub fn column_vector(values: &[Zp], prime: u64) -> Result<Self, FieldError> {
        Ok(Self::row_vector(values, prime)?.transpose())
    }

    /// Matrix with uniformly random entries.
    pub fn random<R: Rng + ?Sized>(rows: usize, cols: usize, prime: u64, rng: &mut R) -> Self {
        let mut m = Self::zeros(rows, cols, prime);
        for v in &mut m.data {
            *v = rng.gen_range(0..prime);
        }
        m
    }

    /// Vandermonde matrix over the contiguous points `1..=cols`:
    /// `A[i][j] = (j + 1)^i`.
    pub fn vandermonde(rows: usize, cols: usize, prime: u64) -> Self {
        let points: Vec<u64> = (1..=cols as u64).map(|x| x % prime).collect();
        Self::vandermonde_raw(rows, &points, prime)
    }

    /// Vandermonde matrix over explicit points: `A[i][j] = points[j]^i`.
    pub fn vandermonde_at(rows: usize, points: &[Zp], prime: u64) -> Result<Self, FieldError> {
        let mut raw = Vec::with_capacity(points.len());
        for p in points {
            if p.prime() != prime {
                return Err(mismatch(prime, p.prime()));
            }
            raw.push(p.value());
        }
        Ok(Self::vandermonde_raw(rows, &raw, prime))
    }

    /// Vandermonde matrix over successive powers of the field's minimum
    /// primitive root `w`: `A[i][j] = (w^j)^i`.
    pub fn primitive_vandermonde(rows: usize, cols: usize, prime: u64) -> Result<Self, FieldError> {
        let w = min_primitive_root(prime)?;
        let points: Vec<u64> = (0..cols as u64).map(|j| mod_pow(w, j, prime)).collect();
        Ok(Self::vandermonde_raw(rows, &points, prime))
    }

    fn vandermonde_raw(rows: usize, points: &[u64], prime: u64) -> Self {
        let cols = points.len();
        let mut m = Self::zeros(rows, cols, prime);
        for (j, &x) in points.iter().enumerate() {
            let mut power = 1 % prime;
            for i in 0..rows {
                m.data[i * cols + j] = power;
                power = mul_mod(power, x, prime);
            }
        }
        m
    }

    /// Horizontal concatenation `[a | b]`.
    pub fn concat(a: &ZpMatrix, b: &ZpMatrix) -> Result<Self, FieldError> {
        if a.prime != b.prime {
            return Err(mismatch(a.prime, b.prime));
        }
        if a.rows != b.rows {
            return Err(FieldError::DimensionMismatch {
                expected: (a.rows, b.cols),
                actual: (b.rows, b.cols),
            });
        }
        let cols = a.cols + b.cols;
        let mut m = Self::zeros(a.rows, cols, a.prime);
        for i in 0..a.rows {
            m.data[i * cols..i * cols + a.cols].copy_from_slice(a.raw_row(i));
            m.data[i * cols + a.cols..(i + 1) * cols].copy_from_slice(b.raw_row(i));
        }
        Ok(m)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn prime(&self) -> u64 {
        self.prime
    }

    /// Entry at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the position is out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Zp {
        Zp::new(self.prime, self.data[self.index(row, col)])
    }

    /// Overwrite the entry at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the position is out of bounds or `value` is from another field.
    pub fn set(&mut self, row: usize, col: usize, value: Zp) {
        assert_eq!(value.prime(), self.prime, "element from a different field");
        let idx = self.index(row, col);
        self.data[idx] = value.value();
    }

    fn checked_set(&mut self, row: usize, col: usize, value: Zp) -> Result<(), FieldError> {
        if value.prime() != self.prime {
            return Err(mismatch(self.prime, value.prime()));
        }
        let idx = self.index(row, col);
        self.data[idx] = value.value();
        Ok(())
    }

    pub fn row(&self, row: usize) -> Vec<Zp> {
        self.raw_row(row)
            .iter()
            .map(|&v| Zp::new(self.prime, v))
            .collect()
    }

    pub fn column(&self, col: usize) -> Vec<Zp> {
        (0..self.rows).map(|i| self.get(i, col)).collect()
    }

    /// Entries in row-major order.
    pub fn to_vec(&self) -> Vec<Zp> {
        self.data.iter().map(|&v| Zp::new(self.prime, v)).collect()
    }

    /// Copy of the rectangle `rows × cols` (half-open ranges).
    pub fn submatrix(
        &self,
        rows: std::ops::Range<usize>,
        cols: std::ops::Range<usize>,
    ) -> Result<Self, FieldError> {
        if rows.end > self.rows || cols.end > self.cols || rows.start > rows.end || cols.start > cols.end
        {
            return Err(FieldError::DimensionMismatch {
                expected: (self.rows, self.cols),
                actual: (rows.end, cols.end),
            });
        }
        let width = cols.end - cols.start;
        let mut m = Self::zeros(rows.end - rows.start, width, self.prime);
        for (dst, src) in rows.enumerate() {
            m.data[dst * width..(dst + 1) * width]
                .copy_from_slice(&self.raw_row(src)[cols.clone()]);
        }
        Ok(m)
    }

    pub fn transpose(&self) -> Self {
        let mut m = Self::zeros(self.cols, self.rows, self.prime);
        for i in 0..self.rows {
            for j in 0..self.cols {
                m.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        m
    }

    /// Matrix product `self × rhs`.
    pub fn times(&self, rhs: &ZpMatrix) -> Result<Self, FieldError> {
        if self.prime != rhs.prime {
            return Err(mismatch(self.prime, rhs.prime));
        }
        if self.cols != rhs.rows {
            return Err(FieldError::DimensionMismatch {
                expected: (self.cols, rhs.cols),
                actual: (rhs.rows, rhs.cols),
            });
        }
        let p = self.prime;
        let mut m = Self::zeros(self.rows, rhs.cols, p);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                if a == 0 {
                    continue;
                }
                for j in 0..rhs.cols {
                    let idx = i * rhs.cols + j;
                    m.data[idx] = add_mod(m.data[idx], mul_mod(a, rhs.data[k * rhs.cols + j], p), p);
                }
            }
        }
        Ok(m)
    }

    /// Entry-wise sum.
    pub fn plus(&self, rhs: &ZpMatrix) -> Result<Self, FieldError> {
        if self.prime != rhs.prime {
            return Err(mismatch(self.prime, rhs.prime));
        }
        if (self.rows, self.cols) != (rhs.rows, rhs.cols) {
            return Err(FieldError::DimensionMismatch {
                expected: (self.rows, self.cols),
                actual: (rhs.rows, rhs.cols),
            });
        }
        let mut m = self.clone();
        for (a, b) in m.data.iter_mut().zip(&rhs.data) {
            *a = add_mod(*a, *b, self.prime);
        }
        Ok(m)
    }

    /// Multiply row `i` by `scalars[i]`.
    pub fn scale_rows(&self, scalars: &[Zp]) -> Result<Self, FieldError> {
        if scalars.len() != self.rows {
            return Err(FieldError::DimensionMismatch {
                expected: (self.rows, 1),
                actual: (scalars.len(), 1),
            });
        }
        let mut m = self.clone();
        for (i, s) in scalars.iter().enumerate() {
            if s.prime() != self.prime {
                return Err(mismatch(self.prime, s.prime()));
            }
            for v in m.raw_row_mut(i) {
                *v = mul_mod(*v, s.value(), self.prime);
            }
        }
        Ok(m)
    }

    /// Row-reduce in place, choosing pivots only among the first
    /// `pivot_cols` columns. Returns the number of non-zero rows afterwards.
    pub fn eliminate(&mut self, pivot_cols: usize) -> Result<usize, FieldError> {
        let p = self.prime;
        let pivot_cols = pivot_cols.min(self.cols);
        let (mut i, mut j) = (0, 0);
        while i < self.rows && j < pivot_cols {
            let max = (i..self.rows)
                .max_by_key(|&k| (self.data[k * self.cols + j], std::cmp::Reverse(k)))
                .unwrap_or(i);

            if self.data[max * self.cols + j] != 0 {
                self.swap_rows(i, max);
                let inv = Zp::new(p, self.data[i * self.cols + j]).inverse()?.value();
                for v in self.raw_row_mut(i) {
                    *v = mul_mod(*v, inv, p);
                }
                for u in i + 1..self.rows {
                    let factor = self.data[u * self.cols + j];
                    if factor == 0 {
                        continue;
                    }
                    for v in 0..self.cols {
                        let sub = mul_mod(self.data[i * self.cols + v], factor, p);
                        let idx = u * self.cols + v;
                        self.data[idx] = add_mod(self.data[idx], p - sub, p);
                    }
                }
                i += 1;
            }
            j += 1;
        }

        Ok((0..self.rows)
            .filter(|&k| self.raw_row(k).iter().any(|&v| v != 0))
            .count())
    }

    /// Row-reduce an augmented matrix `[A | b]`, never pivoting on the last
    /// column. Returns the number of non-zero rows.
    pub fn gauss(&mut self) -> Result<usize, FieldError> {
        self.eliminate(self.cols.saturating_sub(1))
    }

    /// Rank of the matrix.
    pub fn rank(&self) -> Result<usize, FieldError> {
        let mut copy = self.clone();
        copy.eliminate(self.cols)
    }

    /// Inverse via Gauss-Jordan elimination on `[A | I]`.
    pub fn inverse(&self) -> Result<Self, FieldError> {
        if self.rows != self.cols {
            return Err(FieldError::DimensionMismatch {
                expected: (self.rows, self.rows),
                actual: (self.rows, self.cols),
            });
        }
        let n = self.rows;
        let p = self.prime;
        let mut aug = Self::concat(self, &Self::identity(n, p))?;
        aug.eliminate(n)?;

        for d in 0..n {
            if aug.data[d * aug.cols + d] != 1 {
                return Err(FieldError::SingularMatrix);
            }
        }
        for col in (0..n).rev() {
            for row in 0..col {
                let factor = aug.data[row * aug.cols + col];
                if factor == 0 {
                    continue;
                }
                for v in 0..aug.cols {
                    let sub = mul_mod(aug.data[col * aug.cols + v], factor, p);
                    let idx = row * aug.cols + v;
                    aug.data[idx] = add_mod(aug.data[idx], p - sub, p);
                }
            }
        }
        aug.submatrix(0..n, n..2 * n)
    }

    /// Solve `self · x = b`.
    ///
    /// Returns `Ok(None)` when the system is inconsistent. Variables without a
    /// pivot are set to zero.
    pub fn solve(&self, b: &[Zp]) -> Result<Option<Vec<Zp>>, FieldError> {
        let unknowns = self.cols;
        let mut aug = Self::concat(self, &Self::column_vector(b, self.prime)?)?;
        aug.gauss()?;

        let mut solution = vec![0u64; unknowns];
        let p = self.prime;
        for row in (0..aug.rows).rev() {
            let lead = aug.raw_row(row).iter().position(|&v| v != 0);
            match lead {
                None => continue,
                Some(col) if col < unknowns => {
                    let mut value = aug.data[row * aug.cols + unknowns];
                    for c in col + 1..unknowns {
                        let sub = mul_mod(aug.data[row * aug.cols + c], solution[c], p);
                        value = add_mod(value, p - sub, p);
                    }
                    // The pivot was normalized to one during elimination.
                    solution[col] = value;
                }
                _ => return Ok(None),
            }
        }
        Ok(Some(solution.into_iter().map(|v| Zp::new(p, v)).collect()))
    }

    fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        row * self.cols + col
    }

    fn raw_row(&self, row: usize) -> &[u64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    fn raw_row_mut(&mut self, row: usize) -> &mut [u64] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for c in 0..self.cols {
            self.data.swap(a * self.cols + c, b * self.cols + c);
        }
    }
}

fn mismatch(left: u64, right: u64) -> FieldError {
    FieldError::ModulusMismatch {
        left: left.to_string(),
        right: right.to_string(),
    }
}

impl fmt::Debug for ZpMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZpMatrix")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("prime", &self.prime)
            .finish()
    }
}

impl fmt::Display for ZpMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            let row: Vec<String> = self.raw_row(i).iter().map(u64::to_string).collect();
            writeln!(f, "{}", row.join("   "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const P: u64 = 29;

    fn zp(v: u64) -> Zp {
        Zp::new(P, v)
    }

    #[test]
    fn test_vandermonde_contiguous() {
        let v = ZpMatrix::vandermonde(3, 4, P);
        assert_eq!(v.row(0), vec![zp(1), zp(1), zp(1), zp(1)]);
        assert_eq!(v.row(1), vec![zp(1), zp(2), zp(3), zp(4)]);
        assert_eq!(v.row(2), vec![zp(1), zp(4), zp(9), zp(16)]);
    }

    #[test]
    fn test_vandermonde_explicit_points() {
        let v = ZpMatrix::vandermonde_at(3, &[zp(2), zp(7)], P).unwrap();
        assert_eq!(v.column(0), vec![zp(1), zp(2), zp(4)]);
        assert_eq!(v.column(1), vec![zp(1), zp(7), zp(49)]);
    }

    #[test]
    fn test_primitive_vandermonde() {
        // 2 is the minimum primitive root of 29.
        let v = ZpMatrix::primitive_vandermonde(2, 4, P).unwrap();
        assert_eq!(v.row(1), vec![zp(1), zp(2), zp(4), zp(8)]);
        assert!(ZpMatrix::primitive_vandermonde(2, 4, 21).is_err());
    }

    #[test]
    fn test_times_and_identity() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let a = ZpMatrix::random(3, 3, P, &mut rng);
        let i = ZpMatrix::identity(3, P);
        assert_eq!(a.times(&i).unwrap(), a);
        assert!(a.times(&ZpMatrix::zeros(2, 2, P)).is_err());
    }

    #[test]
    fn test_inverse() {
        let v = ZpMatrix::vandermonde(4, 4, P);
        let inv = v.inverse().unwrap();
        assert_eq!(v.times(&inv).unwrap(), ZpMatrix::identity(4, P));
        assert_eq!(inv.times(&v).unwrap(), ZpMatrix::identity(4, P));
    }

    #[test]
    fn test_singular_inverse() {
        let m = ZpMatrix::from_rows(&[vec![zp(1), zp(2)], vec![zp(2), zp(4)]], P).unwrap();
        assert_eq!(m.inverse(), Err(FieldError::SingularMatrix));
        assert_eq!(m.rank().unwrap(), 1);
    }

    #[test]
    fn test_solve_unique() {
        // x + y = 5, x - y = 1  =>  x = 3, y = 2
        let a = ZpMatrix::from_rows(&[vec![zp(1), zp(1)], vec![zp(1), Zp::from_signed(P, -1)]], P)
            .unwrap();
        let x = a.solve(&[zp(5), zp(1)]).unwrap().unwrap();
        assert_eq!(x, vec![zp(3), zp(2)]);
    }

    #[test]
    fn test_solve_free_variable_is_zero() {
        // x + y = 4 with y free.
        let a = ZpMatrix::from_rows(&[vec![zp(1), zp(1)], vec![zp(2), zp(2)]], P).unwrap();
        let x = a.solve(&[zp(4), zp(8)]).unwrap().unwrap();
        assert_eq!(x, vec![zp(4), zp(0)]);
    }

    #[test]
    fn test_solve_inconsistent() {
        let a = ZpMatrix::from_rows(&[vec![zp(1), zp(1)], vec![zp(1), zp(1)]], P).unwrap();
        assert_eq!(a.solve(&[zp(1), zp(2)]).unwrap(), None);
    }

    #[test]
    fn test_transpose_concat_submatrix() {
        let a = ZpMatrix::from_rows(&[vec![zp(1), zp(2), zp(3)]], P).unwrap();
        let t = a.transpose();
        assert_eq!((t.rows(), t.cols()), (3, 1));
        let c = ZpMatrix::concat(&a, &a).unwrap();
        assert_eq!(c.row(0), vec![zp(1), zp(2), zp(3), zp(1), zp(2), zp(3)]);
        let s = c.submatrix(0..1, 2..4).unwrap();
        assert_eq!(s.row(0), vec![zp(3), zp(1)]);
    }

    #[test]
    fn test_scale_rows() {
        let a = ZpMatrix::from_rows(&[vec![zp(1), zp(2)], vec![zp(3), zp(4)]], P).unwrap();
        let s = a.scale_rows(&[zp(2), Zp::from_signed(P, -1)]).unwrap();
        assert_eq!(s.row(0), vec![zp(2), zp(4)]);
        assert_eq!(s.row(1), vec![zp(26), zp(25)]);
    }
}
