//! Univariate polynomials over `Z_p`.

use crate::{FieldError, Zp};
use rand::Rng;
use std::fmt;

/// A polynomial with coefficients stored lowest degree first.
///
/// Trailing zero coefficients are trimmed, so the zero polynomial has no
/// coefficients and no degree.
#[derive(Clone, PartialEq, Eq)]
pub struct Polynomial {
    coeffs: Vec<Zp>,
    prime: u64,
}

impl Polynomial {
    /// Build from coefficients (lowest degree first).
    ///
    /// # Panics
    ///
    /// Panics if a coefficient is not in `Z_prime`.
    pub fn new(prime: u64, coeffs: Vec<Zp>) -> Self {
        assert!(
            coeffs.iter().all(|c| c.prime() == prime),
            "coefficient from a different field"
        );
        let mut p = Self { coeffs, prime };
        p.trim();
        p
    }

    pub fn zero(prime: u64) -> Self {
        Self {
            coeffs: Vec::new(),
            prime,
        }
    }

    pub fn constant(value: Zp) -> Self {
        Self::new(value.prime(), vec![value])
    }

    /// Random polynomial of the given degree bound with a fixed constant term.
    ///
    /// Higher coefficients are uniform, so the actual degree can be lower
    /// than `degree` when the leading draw is zero.
    pub fn sample<R: Rng + ?Sized>(constant: Zp, degree: usize, rng: &mut R) -> Self {
        let prime = constant.prime();
        let mut coeffs = Vec::with_capacity(degree + 1);
        coeffs.push(constant);
        coeffs.extend((0..degree).map(|_| Zp::random(prime, rng)));
        Self::new(prime, coeffs)
    }

    /// The unique polynomial of degree `< points.len()` through `points`.
    pub fn interpolate(points: &[(Zp, Zp)], prime: u64) -> Result<Self, FieldError> {
        let mut result = Self::zero(prime);
        for (i, &(xi, yi)) in points.iter().enumerate() {
            let mut basis = Self::constant(Zp::one(prime));
            let mut denom = Zp::one(prime);
            for (j, &(xj, _)) in points.iter().enumerate() {
                if i == j {
                    continue;
                }
                if xi == xj {
                    return Err(FieldError::DuplicatePoint(xi.value()));
                }
                basis = basis.mul(&Self::new(prime, vec![-xj, Zp::one(prime)]));
                denom *= xi - xj;
            }
            let scale = yi.try_div(denom)?;
            result = result.add(&basis.scale(scale));
        }
        Ok(result)
    }

    pub fn prime(&self) -> u64 {
        self.prime
    }

    pub fn coefficients(&self) -> &[Zp] {
        &self.coeffs
    }

    /// Coefficient of `x^i` (zero past the degree).
    pub fn coefficient(&self, i: usize) -> Zp {
        self.coeffs.get(i).copied().unwrap_or_else(|| Zp::zero(self.prime))
    }

    /// `None` for the zero polynomial.
    pub fn degree(&self) -> Option<usize> {
        self.coeffs.len().checked_sub(1)
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Horner evaluation.
    pub fn evaluate(&self, x: Zp) -> Zp {
        x.evaluate_polynomial(&self.coeffs)
    }

    pub fn add(&self, rhs: &Polynomial) -> Polynomial {
        self.check_field(rhs);
        let len = self.coeffs.len().max(rhs.coeffs.len());
        let coeffs = (0..len)
            .map(|i| self.coefficient(i) + rhs.coefficient(i))
            .collect();
        Self::new(self.prime, coeffs)
    }

    pub fn sub(&self, rhs: &Polynomial) -> Polynomial {
        self.add(&rhs.scale(Zp::from_signed(self.prime, -1)))
    }

    pub fn mul(&self, rhs: &Polynomial) -> Polynomial {
        self.check_field(rhs);
        if self.is_zero() || rhs.is_zero() {
            return Self::zero(self.prime);
        }
        let mut coeffs = vec![Zp::zero(self.prime); self.coeffs.len() + rhs.coeffs.len() - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            for (j, &b) in rhs.coeffs.iter().enumerate() {
                coeffs[i + j] += a * b;
            }
        }
        Self::new(self.prime, coeffs)
    }

    pub fn scale(&self, factor: Zp) -> Polynomial {
        Self::new(self.prime, self.coeffs.iter().map(|&c| c * factor).collect())
    }

    /// Long division: returns `(quotient, remainder)` with
    /// `deg(remainder) < deg(divisor)`.
    pub fn div_rem(&self, divisor: &Polynomial) -> Result<(Polynomial, Polynomial), FieldError> {
        self.check_field(divisor);
        let Some(div_deg) = divisor.degree() else {
            return Err(FieldError::DivisionByZero);
        };
        let lead_inv = divisor.coeffs[div_deg].inverse()?;

        let mut rem = self.coeffs.clone();
        let Some(self_deg) = self.degree().filter(|&d| d >= div_deg) else {
            return Ok((Self::zero(self.prime), self.clone()));
        };
        let mut quot = vec![Zp::zero(self.prime); self_deg - div_deg + 1];

        for k in (0..quot.len()).rev() {
            let factor = rem[k + div_deg] * lead_inv;
            quot[k] = factor;
            if factor.is_zero() {
                continue;
            }
            for (j, &d) in divisor.coeffs.iter().enumerate() {
                rem[k + j] -= factor * d;
            }
        }
        Ok((Self::new(self.prime, quot), Self::new(self.prime, rem)))
    }

    /// Quotient of an exact division, or `None` if the remainder is non-zero
    /// or the divisor is zero.
    pub fn div_exact(&self, divisor: &Polynomial) -> Option<Polynomial> {
        match self.div_rem(divisor) {
            Ok((q, r)) if r.is_zero() => Some(q),
            _ => None,
        }
    }

    fn trim(&mut self) {
        while self.coeffs.last().is_some_and(Zp::is_zero) {
            self.coeffs.pop();
        }
    }

    fn check_field(&self, other: &Polynomial) {
        assert_eq!(
            self.prime, other.prime,
            "cannot combine polynomials over Z_{} and Z_{}",
            self.prime, other.prime
        );
    }
}

impl fmt::Debug for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polynomial(Z_{}: {})", self.prime, self)
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let terms: Vec<String> = self
            .coeffs
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_zero())
            .map(|(i, c)| match i {
                0 => format!("{c}"),
                1 => format!("{c}x"),
                _ => format!("{c}x^{i}"),
            })
            .collect();
        write!(f, "{}", terms.join(" + "))
    }
}
