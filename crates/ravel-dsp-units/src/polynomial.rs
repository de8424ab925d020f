// SPDX-License-Identifier: MIT

//! Polynomials in z⁻¹ for transfer-function composition.
//!
//! Every digital filter here is defined by a z-domain transfer function
//! `H(z) = p(z)/q(z)` where `p` and `q` are polynomials of z⁻¹. Chaining
//! filters multiplies their transfer functions, so a chain of small
//! filters can be collapsed into one filter by multiplying numerators
//! and denominators and handing the products to `set_transfer`.
//!
//! Coefficients are stored from the highest power of z⁻¹ down to the
//! constant term: `[a2, a1, a0]` represents `a2·z⁻² + a1·z⁻¹ + a0`.

use std::ops::{Index, Mul};

/// A polynomial in z⁻¹, highest power first. Never empty: the zero
/// polynomial is `[0.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coeffs: Vec<f32>,
}

impl Polynomial {
    /// The zero polynomial.
    pub fn zero() -> Self {
        Self { coeffs: vec![0.0] }
    }

    /// A constant polynomial.
    pub fn constant(value: f32) -> Self {
        Self {
            coeffs: vec![value],
        }
    }

    /// Build from coefficients ordered highest power of z⁻¹ first.
    ///
    /// An empty vector is treated as the zero polynomial.
    pub fn from_coeffs(coeffs: Vec<f32>) -> Self {
        if coeffs.is_empty() {
            Self::zero()
        } else {
            Self { coeffs }
        }
    }

    /// The degree (one less than the coefficient count). Leading zeros
    /// are not stripped, matching how filters report fixed-shape
    /// coefficient sets.
    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    /// Coefficients, highest power of z⁻¹ first.
    pub fn coeffs(&self) -> &[f32] {
        &self.coeffs
    }

    /// The constant (z⁰) term.
    pub fn constant_term(&self) -> f32 {
        *self.coeffs.last().expect("polynomial is never empty")
    }

    /// Evaluate at `x` (substituting `x` for z⁻¹) by Horner's rule.
    pub fn evaluate(&self, x: f32) -> f32 {
        self.coeffs.iter().fold(0.0, |acc, &c| acc * x + c)
    }
}

impl Index<usize> for Polynomial {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.coeffs[index]
    }
}

impl Mul for &Polynomial {
    type Output = Polynomial;

    /// Polynomial product by convolution. This is the filter-chain
    /// collapse operation.
    fn mul(self, rhs: &Polynomial) -> Polynomial {
        let mut coeffs = vec![0.0f32; self.coeffs.len() + rhs.coeffs.len() - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            for (j, &b) in rhs.coeffs.iter().enumerate() {
                coeffs[i + j] += a * b;
            }
        }
        Polynomial { coeffs }
    }
}

impl Mul for Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: Polynomial) -> Polynomial {
        &self * &rhs
    }
}
