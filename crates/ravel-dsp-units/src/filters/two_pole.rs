// SPDX-License-Identifier: MIT

//! Two-pole IIR filter.
//!
//! The standard second-order resonance filter:
//! `y[n] = gain*b0*x[n] - a1*y[n-1] - a2*y[n-2]`. A complex-conjugate
//! pole pair placed with [`set_resonance`](TwoPoleFilter::set_resonance)
//! produces a bandpass peak at the pole angle; the closer the pole
//! radius is to one, the narrower the peak.
//!
//! Frequencies are normalized: frequency divided by sample rate, e.g.
//! 7 kHz at 44100 Hz is `7000/44100 = 0.15873`.

use num_complex::Complex32;

use ravel_dsp_lib::two_pole::{two_pole_process, two_pole_step};
use ravel_dsp_lib::types::TwoPole;

use crate::filters::AudioFilter;
use crate::polynomial::Polynomial;

/// Second-order recursive filter with two feedback terms.
///
/// Output is delayed by two frames (the recursion depth); the two
/// pending frames are retrievable with [`flush`](TwoPoleFilter::flush).
/// Raw coefficient setters perform no stability check and trust the
/// caller; [`set_poles`](TwoPoleFilter::set_poles) and
/// [`set_resonance`](TwoPoleFilter::set_resonance) are the checked paths.
#[derive(Debug, Clone)]
pub struct TwoPoleFilter {
    core: TwoPole,
    vectorize: bool,
}

impl TwoPoleFilter {
    /// Create a single-channel pass-through filter.
    pub fn new() -> Self {
        Self::with_channels(1)
    }

    /// Create a pass-through filter for `channels` interleaved channels.
    pub fn with_channels(channels: usize) -> Self {
        Self {
            core: TwoPole::new(channels),
            vectorize: true,
        }
    }

    /// Create a filter with the given coefficients:
    /// `y[n] = b0*x[n] - a1*y[n-1] - a2*y[n-2]`.
    pub fn with_coeff(channels: usize, b0: f32, a1: f32, a2: f32) -> Self {
        let mut f = Self::with_channels(channels);
        f.core.b0 = b0;
        f.core.a1 = a1;
        f.core.a2 = a2;
        f.core.update();
        f
    }

    /// Whether block processing uses the matrix-unrolled fast path.
    pub fn vectorize(&self) -> bool {
        self.vectorize
    }

    /// Select between the vectorized block path and the per-frame
    /// reference path.
    pub fn set_vectorize(&mut self, vectorize: bool) {
        self.vectorize = vectorize;
    }

    /// Set the coefficients from `b` and `a` vectors, normalizing by
    /// `a[0]`. Missing entries default to `b = [1]`, `a = [1, 0, 0]`;
    /// entries past the filter order are ignored. No stability check.
    pub fn set_coeff(&mut self, bvals: &[f32], avals: &[f32]) {
        let a0 = avals.first().copied().unwrap_or(1.0);
        self.core.b0 = bvals.first().copied().unwrap_or(1.0) / a0;
        self.core.a1 = avals.get(1).copied().unwrap_or(0.0) / a0;
        self.core.a2 = avals.get(2).copied().unwrap_or(0.0) / a0;
        self.core.update();
    }

    /// Set the feed-forward coefficient.
    pub fn set_b_coeff(&mut self, b0: f32) {
        self.core.b0 = b0;
        self.core.update();
    }

    /// Set both feedback coefficients. No stability check.
    pub fn set_a_coeff(&mut self, a1: f32, a2: f32) {
        self.core.a1 = a1;
        self.core.a2 = a2;
        self.core.update();
    }

    /// Place a complex-conjugate pole pair at the given normalized
    /// frequency and radius.
    ///
    /// With `normalize`, `b0` is set to the magnitude of the denominator
    /// evaluated at `z = e^{j2πfrequency}`, making the response exactly
    /// unity at that frequency (the overall peak sits slightly above it
    /// when the radius is not close to one). Neither the frequency nor
    /// the radius is retained.
    ///
    /// # Panics
    /// Panics if `|radius| >= 1` (the poles would leave the unit circle).
    pub fn set_resonance(&mut self, frequency: f32, radius: f32, normalize: bool) {
        assert!(radius.abs() < 1.0, "radius {radius} is out of range");
        let omega = 2.0 * std::f32::consts::PI * frequency;
        self.core.a2 = radius * radius;
        self.core.a1 = -2.0 * radius * omega.cos();

        if normalize {
            let z = Complex32::from_polar(1.0, -omega);
            let den = Complex32::new(1.0, 0.0) + self.core.a1 * z + self.core.a2 * z * z;
            self.core.b0 = den.norm();
        }
        self.core.update();
    }

    /// Place both poles on the real axis with unity `b0`.
    ///
    /// # Panics
    /// Panics if either `|pole| >= 1`.
    pub fn set_poles(&mut self, pole1: f32, pole2: f32) {
        assert!(pole1.abs() < 1.0, "pole {pole1} is out of range");
        assert!(pole2.abs() < 1.0, "pole {pole2} is out of range");
        self.core.a1 = -pole1 - pole2;
        self.core.a2 = pole1 * pole2;
        self.core.b0 = 1.0;
        self.core.update();
    }

    /// Set coefficients from a transfer function `H(z) = p(z)/q(z)`,
    /// normalizing by the constant term of `q`. Chained filters
    /// collapse into one by multiplying their transfer polynomials and
    /// passing the products here.
    pub fn set_transfer(&mut self, p: &Polynomial, q: &Polynomial) {
        let a0 = q.constant_term();
        let deg = q.degree();
        self.core.b0 = p.constant_term() / a0;
        self.core.a1 = if deg < 1 { 0.0 } else { q[deg - 1] / a0 };
        self.core.a2 = if deg < 2 { 0.0 } else { q[deg - 2] / a0 };
        self.core.update();
    }

    /// The numerator polynomial of the transfer function.
    pub fn numerator(&self) -> Polynomial {
        Polynomial::constant(self.core.b0)
    }

    /// The denominator polynomial of the transfer function.
    pub fn denominator(&self) -> Polynomial {
        Polynomial::from_coeffs(vec![self.core.a2, self.core.a1, 1.0])
    }
}

impl Default for TwoPoleFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioFilter for TwoPoleFilter {
    fn channels(&self) -> usize {
        self.core.channels()
    }

    fn set_channels(&mut self, channels: usize) {
        self.core.set_channels(channels);
    }

    fn step(&mut self, gain: f32, input: &[f32], output: &mut [f32]) {
        two_pole_step(output, input, gain, &mut self.core);
    }

    fn calculate(&mut self, gain: f32, input: &[f32], output: &mut [f32]) {
        if self.vectorize {
            two_pole_process(output, input, gain, &mut self.core);
        } else {
            let channels = self.core.channels();
            for (out, inp) in output
                .chunks_exact_mut(channels)
                .zip(input.chunks_exact(channels))
            {
                two_pole_step(out, inp, gain, &mut self.core);
            }
        }
    }

    fn flush(&mut self, output: &mut [f32]) -> usize {
        for (out, s) in output.iter_mut().zip(self.core.outs.iter_mut()) {
            *out = *s;
            *s = 0.0;
        }
        2
    }

    fn clear(&mut self) {
        self.core.clear();
    }

    fn b_coeff(&self) -> Vec<f32> {
        vec![self.core.b0]
    }

    fn a_coeff(&self) -> Vec<f32> {
        vec![1.0, self.core.a1, self.core.a2]
    }
}
