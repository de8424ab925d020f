// SPDX-License-Identifier: MIT

//! One-pole IIR filter.
//!
//! The standard first-order lowpass: `y[n] = gain*b0*x[n] - a1*y[n-1]`.
//! A positive pole close to 1 gives a lowpass; use
//! [`set_lowpass`](OnePoleFilter::set_lowpass) to place it from a
//! normalized cutoff frequency. For first-order work this is markedly
//! cheaper than a general IIR filter.
//!
//! Frequencies are normalized: frequency divided by sample rate, e.g.
//! 7 kHz at 44100 Hz is `7000/44100 = 0.15873`.

use ravel_dsp_lib::one_pole::{one_pole_process, one_pole_step};
use ravel_dsp_lib::types::OnePole;

use crate::filters::AudioFilter;
use crate::polynomial::Polynomial;

/// First-order recursive filter with one feedback term.
///
/// Output is delayed by one frame (the recursion depth); the pending
/// frame is retrievable with [`flush`](OnePoleFilter::flush). Raw
/// coefficient setters perform no stability check and trust the caller;
/// [`set_pole`](OnePoleFilter::set_pole) is the checked path.
#[derive(Debug, Clone)]
pub struct OnePoleFilter {
    core: OnePole,
    vectorize: bool,
}

impl OnePoleFilter {
    /// Create a single-channel pass-through filter.
    pub fn new() -> Self {
        Self::with_channels(1)
    }

    /// Create a pass-through filter for `channels` interleaved channels.
    pub fn with_channels(channels: usize) -> Self {
        Self {
            core: OnePole::new(channels),
            vectorize: true,
        }
    }

    /// Create a filter with the given coefficients:
    /// `y[n] = b0*x[n] - a1*y[n-1]`.
    pub fn with_coeff(channels: usize, b0: f32, a1: f32) -> Self {
        let mut f = Self::with_channels(channels);
        f.core.b0 = b0;
        f.core.a1 = a1;
        f.core.update();
        f
    }

    /// Whether block processing uses the matrix-unrolled fast path.
    pub fn vectorize(&self) -> bool {
        self.vectorize
    }

    /// Select between the vectorized block path and the per-frame
    /// reference path. Both produce the same output to rounding.
    pub fn set_vectorize(&mut self, vectorize: bool) {
        self.vectorize = vectorize;
    }

    /// Set the coefficients from `b` and `a` vectors, normalizing by
    /// `a[0]`. Missing entries default to `b = [1]`, `a = [1, 0]`;
    /// entries past the filter order are ignored. No stability check.
    pub fn set_coeff(&mut self, bvals: &[f32], avals: &[f32]) {
        let a0 = avals.first().copied().unwrap_or(1.0);
        self.core.b0 = bvals.first().copied().unwrap_or(1.0) / a0;
        self.core.a1 = avals.get(1).copied().unwrap_or(0.0) / a0;
        self.core.update();
    }

    /// Set the feed-forward coefficient.
    pub fn set_b_coeff(&mut self, b0: f32) {
        self.core.b0 = b0;
        self.core.update();
    }

    /// Set the feedback coefficient. No stability check.
    pub fn set_a_coeff(&mut self, a1: f32) {
        self.core.a1 = a1;
        self.core.update();
    }

    /// Configure as a single-pole lowpass with the given normalized
    /// cutoff frequency. The frequency itself is not retained.
    pub fn set_lowpass(&mut self, frequency: f32) {
        let t = frequency as f64 * std::f64::consts::PI * 2.0;
        self.core.b0 = (t / (t + 1.0)) as f32;
        self.core.a1 = self.core.b0 - 1.0;
        self.core.update();
    }

    /// The pole position on the real axis of the z-plane.
    pub fn pole(&self) -> f32 {
        -self.core.a1
    }

    /// Place the pole on the real axis and normalize for unity peak
    /// gain: at DC for a positive pole (lowpass), at Nyquist for a
    /// negative one (highpass).
    ///
    /// # Panics
    /// Panics if `|pole| >= 1` (the filter would be unstable).
    pub fn set_pole(&mut self, pole: f32) {
        assert!(pole.abs() < 1.0, "pole {pole} is out of range");
        self.core.a1 = -pole;
        self.core.b0 = 1.0 - pole.abs();
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
        self.core.update();
    }

    /// The numerator polynomial of the transfer function.
    pub fn numerator(&self) -> Polynomial {
        Polynomial::constant(self.core.b0)
    }

    /// The denominator polynomial of the transfer function.
    pub fn denominator(&self) -> Polynomial {
        Polynomial::from_coeffs(vec![self.core.a1, 1.0])
    }
}

impl Default for OnePoleFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioFilter for OnePoleFilter {
    fn channels(&self) -> usize {
        self.core.channels()
    }

    fn set_channels(&mut self, channels: usize) {
        self.core.set_channels(channels);
    }

    fn step(&mut self, gain: f32, input: &[f32], output: &mut [f32]) {
        one_pole_step(output, input, gain, &mut self.core);
    }

    fn calculate(&mut self, gain: f32, input: &[f32], output: &mut [f32]) {
        if self.vectorize {
            one_pole_process(output, input, gain, &mut self.core);
        } else {
            let channels = self.core.channels();
            for (out, inp) in output
                .chunks_exact_mut(channels)
                .zip(input.chunks_exact(channels))
            {
                one_pole_step(out, inp, gain, &mut self.core);
            }
        }
    }

    fn flush(&mut self, output: &mut [f32]) -> usize {
        for (out, s) in output.iter_mut().zip(self.core.outs.iter_mut()) {
            *out = *s;
            *s = 0.0;
        }
        1
    }

    fn clear(&mut self) {
        self.core.clear();
    }

    fn b_coeff(&self) -> Vec<f32> {
        vec![self.core.b0]
    }

    fn a_coeff(&self) -> Vec<f32> {
        vec![1.0, self.core.a1]
    }
}
