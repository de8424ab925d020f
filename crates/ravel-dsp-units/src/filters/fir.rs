// SPDX-License-Identifier: MIT

//! General FIR filter.
//!
//! Purely feed-forward convolution of arbitrary order:
//! `y[n] = gain*(b0*x[n] + b1*x[n-1] + ... + bk*x[n-k])`. With no
//! feedback there is no stability constraint — any coefficient vector
//! is acceptable — and no output delay, so `flush` has nothing to
//! write; it exists to keep the filter signature uniform for generic
//! callers.

use ravel_dsp_lib::fir::{fir_process, fir_step};
use ravel_dsp_lib::types::Fir;

use crate::filters::AudioFilter;

/// Feed-forward filter of arbitrary order.
///
/// The delay line holds `len(b) - 1` frames of gain-scaled input per
/// channel. Changing the coefficient vector resizes and zeroes it.
#[derive(Debug, Clone)]
pub struct FirFilter {
    core: Fir,
    vectorize: bool,
}

impl FirFilter {
    /// Create a single-channel pass-through filter (`b = [1]`).
    pub fn new() -> Self {
        Self::with_channels(1)
    }

    /// Create a pass-through filter for `channels` interleaved channels.
    pub fn with_channels(channels: usize) -> Self {
        Self {
            core: Fir::new(channels),
            vectorize: true,
        }
    }

    /// Create a filter with the given coefficient vector
    /// `[b0, b1, ..., bk]`.
    pub fn with_coeff(channels: usize, bvals: &[f32]) -> Self {
        let mut f = Self::with_channels(channels);
        f.core.set_b_coeff(bvals);
        f
    }

    /// Whether block processing uses the channel-specialized fast path.
    pub fn vectorize(&self) -> bool {
        self.vectorize
    }

    /// Select between the block fast path and the per-frame reference
    /// path.
    pub fn set_vectorize(&mut self, vectorize: bool) {
        self.vectorize = vectorize;
    }

    /// The filter order (`len(b) - 1`).
    pub fn order(&self) -> usize {
        self.core.order()
    }

    /// Set the coefficients from `b` and `a` vectors. Only `a[0]` is
    /// honored (everything is divided by it); further feedback terms do
    /// not exist for a FIR filter and are ignored. An empty `b` yields
    /// the zero filter.
    pub fn set_coeff(&mut self, bvals: &[f32], avals: &[f32]) {
        let a0 = avals.first().copied().unwrap_or(1.0);
        if a0 == 1.0 {
            self.core.set_b_coeff(bvals);
        } else {
            let scaled: Vec<f32> = bvals.iter().map(|&b| b / a0).collect();
            self.core.set_b_coeff(&scaled);
        }
    }

    /// Set the feed-forward coefficient vector `[b0, b1, ..., bk]`,
    /// resizing the delay line to the new order.
    pub fn set_b_coeff(&mut self, bvals: &[f32]) {
        self.core.set_b_coeff(bvals);
    }
}

impl Default for FirFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioFilter for FirFilter {
    fn channels(&self) -> usize {
        self.core.channels()
    }

    fn set_channels(&mut self, channels: usize) {
        self.core.set_channels(channels);
    }

    fn step(&mut self, gain: f32, input: &[f32], output: &mut [f32]) {
        fir_step(output, input, gain, &mut self.core);
    }

    fn calculate(&mut self, gain: f32, input: &[f32], output: &mut [f32]) {
        if self.vectorize {
            fir_process(output, input, gain, &mut self.core);
        } else {
            let channels = self.core.channels();
            for (out, inp) in output
                .chunks_exact_mut(channels)
                .zip(input.chunks_exact(channels))
            {
                fir_step(out, inp, gain, &mut self.core);
            }
        }
    }

    fn flush(&mut self, _output: &mut [f32]) -> usize {
        self.core.clear();
        0
    }

    fn clear(&mut self) {
        self.core.clear();
    }

    fn b_coeff(&self) -> Vec<f32> {
        self.core.b_coeff()
    }

    fn a_coeff(&self) -> Vec<f32> {
        vec![1.0]
    }
}
