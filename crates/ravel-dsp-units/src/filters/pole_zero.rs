// SPDX-License-Identifier: MIT

//! Pole-zero filter.
//!
//! One pole and one zero:
//! `y[n] = gain*(b0*x[n] + b1*x[n-1]) - a1*y[n-1]`. This shape covers
//! the simplest useful highpass, the first-order allpass, and the
//! DC-blocking filter (zero pinned at z = 1 with a pole just inside the
//! unit circle) — each available as a named preset computed in closed
//! form.
//!
//! Frequencies are normalized: frequency divided by sample rate, e.g.
//! 7 kHz at 44100 Hz is `7000/44100 = 0.15873`.

use ravel_dsp_lib::pole_zero::{pole_zero_process, pole_zero_step};
use ravel_dsp_lib::types::PoleZero;

use crate::filters::AudioFilter;

/// First-order filter with one feedback and one feed-forward delay term.
///
/// Keeps two delay lines — stored outputs and stored gain-scaled
/// inputs. [`flush`](PoleZeroFilter::flush) writes the output line (one
/// frame) and clears both. Output is delayed by one frame. Raw
/// coefficient setters perform no stability check; the named presets
/// are the checked paths.
#[derive(Debug, Clone)]
pub struct PoleZeroFilter {
    core: PoleZero,
    vectorize: bool,
}

impl PoleZeroFilter {
    /// Create a single-channel pass-through filter.
    pub fn new() -> Self {
        Self::with_channels(1)
    }

    /// Create a pass-through filter for `channels` interleaved channels.
    pub fn with_channels(channels: usize) -> Self {
        Self {
            core: PoleZero::new(channels),
            vectorize: true,
        }
    }

    /// Create a filter with the given coefficients:
    /// `y[n] = b0*x[n] + b1*x[n-1] - a1*y[n-1]`.
    pub fn with_coeff(channels: usize, b0: f32, b1: f32, a1: f32) -> Self {
        let mut f = Self::with_channels(channels);
        f.core.b0 = b0;
        f.core.b1 = b1;
        f.core.a1 = a1;
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
    /// `a[0]`. Missing entries default to `b = [1, 0]`, `a = [1, 0]`;
    /// entries past the filter order are ignored. No stability check.
    pub fn set_coeff(&mut self, bvals: &[f32], avals: &[f32]) {
        let a0 = avals.first().copied().unwrap_or(1.0);
        self.core.b0 = bvals.first().copied().unwrap_or(1.0) / a0;
        self.core.b1 = bvals.get(1).copied().unwrap_or(0.0) / a0;
        self.core.a1 = avals.get(1).copied().unwrap_or(0.0) / a0;
        self.core.update();
    }

    /// Set both feed-forward coefficients, leaving the pole unchanged.
    pub fn set_b_coeff(&mut self, b0: f32, b1: f32) {
        self.core.b0 = b0;
        self.core.b1 = b1;
        self.core.update();
    }

    /// Set the feedback coefficient, leaving the zero unchanged. No
    /// stability check.
    pub fn set_a_coeff(&mut self, a1: f32) {
        self.core.a1 = a1;
        self.core.update();
    }

    /// Configure as the simplest effective first-order highpass for the
    /// given normalized cutoff frequency. The frequency is not retained.
    pub fn set_highpass(&mut self, frequency: f32) {
        let b0 = (1.0 / (frequency as f64 * std::f64::consts::PI * 2.0 + 1.0)) as f32;
        self.core.b0 = b0;
        self.core.b1 = -b0;
        self.core.a1 = -b0;
        self.core.update();
    }

    /// Configure as a first-order allpass: unity gain at every
    /// frequency, phase set by `coefficient`.
    ///
    /// # Panics
    /// Panics if `|coefficient| >= 1` (the filter would be unstable).
    pub fn set_allpass(&mut self, coefficient: f32) {
        assert!(
            coefficient.abs() < 1.0,
            "coefficient {coefficient} is out of range"
        );
        self.core.b0 = coefficient;
        self.core.b1 = 1.0;
        self.core.a1 = coefficient;
        self.core.update();
    }

    /// Configure as a DC-blocking filter: zero fixed at z = 1, pole at
    /// the given position. The pole should sit close to (but inside)
    /// the unit circle to minimize low-frequency attenuation.
    ///
    /// # Panics
    /// Panics if `|pole| >= 1`.
    pub fn set_block_zero(&mut self, pole: f32) {
        assert!(pole.abs() < 1.0, "pole {pole} is out of range");
        self.core.b0 = 1.0;
        self.core.b1 = -1.0;
        self.core.a1 = -pole;
        self.core.update();
    }
}

impl Default for PoleZeroFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioFilter for PoleZeroFilter {
    fn channels(&self) -> usize {
        self.core.channels()
    }

    fn set_channels(&mut self, channels: usize) {
        self.core.set_channels(channels);
    }

    fn step(&mut self, gain: f32, input: &[f32], output: &mut [f32]) {
        pole_zero_step(output, input, gain, &mut self.core);
    }

    fn calculate(&mut self, gain: f32, input: &[f32], output: &mut [f32]) {
        if self.vectorize {
            pole_zero_process(output, input, gain, &mut self.core);
        } else {
            let channels = self.core.channels();
            for (out, inp) in output
                .chunks_exact_mut(channels)
                .zip(input.chunks_exact(channels))
            {
                pole_zero_step(out, inp, gain, &mut self.core);
            }
        }
    }

    fn flush(&mut self, output: &mut [f32]) -> usize {
        self.core.inns.clear();
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
        vec![self.core.b0, self.core.b1]
    }

    fn a_coeff(&self) -> Vec<f32> {
        vec![1.0, self.core.a1]
    }
}
