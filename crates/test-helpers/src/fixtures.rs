//! Codeword fixtures for decoder tests.

use mpcsim_field::{Polynomial, Zp};

/// `f(x) = 3 + 2x` over `Z_29` evaluated at `1..=5`: `5, 7, 9, 11, 13`.
pub fn small_line_codeword() -> (Vec<Zp>, Vec<Zp>) {
    let f = Polynomial::new(29, vec![Zp::new(29, 3), Zp::new(29, 2)]);
    codeword(&f, 5)
}

/// Evaluate `f` at `1..=n`.
pub fn codeword(f: &Polynomial, n: u64) -> (Vec<Zp>, Vec<Zp>) {
    let xs: Vec<Zp> = (1..=n).map(|x| Zp::new(f.prime(), x)).collect();
    let ys = xs.iter().map(|&x| f.evaluate(x)).collect();
    (xs, ys)
}

/// Largest number of errors a degree-`degree` code of length `n` corrects.
pub fn error_budget(n: usize, degree: usize) -> usize {
    n.saturating_sub(degree + 1) / 2
}
