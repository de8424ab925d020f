// SPDX-License-Identifier: MIT

//! Core data types for the filter kernels.
//!
//! Each filter type bundles its normalized coefficients, the acceleration
//! matrices derived from them, and the delay-line state for the configured
//! channel count. The matrices let the block kernels produce four outputs
//! of a recursive filter from one matrix-vector style application; they
//! are read-only byproducts of the coefficients and must be rebuilt with
//! [`update`](OnePole::update) whenever a coefficient or the channel count
//! changes. `update` also reallocates and zeroes the delay lines, so a
//! reconfigured filter always starts from silence.
//!
//! The derivation: unrolling `y[n] = k·x[n] - a1·y[n-1]` four steps gives
//!
//! ```text
//!   [y0 y1 y2 y3] = y[-1]·[c0 c1 c2 c3] + [x0 x1 x2 x3]·D
//! ```
//!
//! where `ck = (-a1)^(k+1)` and `D` is upper unitriangular with the same
//! powers on its superdiagonals. Second-order recursions get one power
//! row per stored output. The dual-channel (`c2`/`d2`) forms interleave
//! two channels into one 4-lane group, so a lane group covers two frames.

use crate::buffer::AlignedF32;

// ─── OnePole ───────────────────────────────────────────────────────────────

/// First-order recursive filter kernel: `y[n] = b0*x[n] - a1*y[n-1]`.
///
/// Stores one delayed output per channel; block output is therefore
/// delayed by one frame relative to the input.
#[derive(Debug, Clone)]
pub struct OnePole {
    channels: usize,
    /// Feed-forward coefficient.
    pub b0: f32,
    /// Feedback coefficient.
    pub a1: f32,
    /// Powers of `-a1` (single-channel recursion row).
    pub c1: [f32; 4],
    /// Input propagation matrix, one row per broadcast lane.
    pub d1: [[f32; 4]; 4],
    /// Recursion rows for the interleaved dual-channel form.
    pub c2: [[f32; 4]; 2],
    /// Input propagation matrix for the dual-channel form.
    pub d2: [[f32; 4]; 4],
    /// Delayed outputs, one per channel.
    pub outs: AlignedF32,
}

impl OnePole {
    /// Create a pass-through kernel (`b0 = 1`, `a1 = 0`) for `channels`.
    pub fn new(channels: usize) -> Self {
        assert!(channels > 0, "channel count must be non-zero");
        let mut f = Self {
            channels,
            b0: 1.0,
            a1: 0.0,
            c1: [0.0; 4],
            d1: [[0.0; 4]; 4],
            c2: [[0.0; 4]; 2],
            d2: [[0.0; 4]; 4],
            outs: AlignedF32::default(),
        };
        f.update();
        f
    }

    /// The number of interleaved channels this kernel processes.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Change the channel count. Reallocates and zeroes the delay line.
    pub fn set_channels(&mut self, channels: usize) {
        assert!(channels > 0, "channel count must be non-zero");
        self.channels = channels;
        self.update();
    }

    /// Rebuild the acceleration matrices from the current coefficients
    /// and reset the delay line. Must be called after mutating `b0`/`a1`.
    pub fn update(&mut self) {
        let a1 = self.a1;
        self.c1[0] = -a1;
        self.c1[1] = -a1 * self.c1[0];
        self.c1[2] = -a1 * self.c1[1];
        self.c1[3] = -a1 * self.c1[2];

        let c = self.c1;
        self.d1 = [
            [1.0, c[0], c[1], c[2]],
            [0.0, 1.0, c[0], c[1]],
            [0.0, 0.0, 1.0, c[0]],
            [0.0, 0.0, 0.0, 1.0],
        ];

        self.c2 = [[-a1, 0.0, a1 * a1, 0.0], [0.0, -a1, 0.0, a1 * a1]];
        self.d2 = [
            [1.0, 0.0, -a1, 0.0],
            [0.0, 1.0, 0.0, -a1],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];

        self.outs.reset(self.channels);
    }

    /// Zero the delay line, keeping coefficients and matrices.
    pub fn clear(&mut self) {
        self.outs.clear();
    }
}

impl Default for OnePole {
    fn default() -> Self {
        Self::new(1)
    }
}

// ─── TwoPole ───────────────────────────────────────────────────────────────

/// Second-order recursive filter kernel:
/// `y[n] = b0*x[n] - a1*y[n-1] - a2*y[n-2]`.
///
/// Stores two delayed outputs per channel (`outs[ch]` the older,
/// `outs[channels + ch]` the newer); block output is delayed by two
/// frames relative to the input.
#[derive(Debug, Clone)]
pub struct TwoPole {
    channels: usize,
    /// Feed-forward coefficient.
    pub b0: f32,
    /// First feedback coefficient.
    pub a1: f32,
    /// Second feedback coefficient.
    pub a2: f32,
    /// Recursion rows: `c1[0]` multiplies `y[n-2]`, `c1[1]` multiplies `y[n-1]`.
    pub c1: [[f32; 4]; 2],
    /// Input propagation matrix.
    pub d1: [[f32; 4]; 4],
    /// Recursion rows for the dual-channel form (whole trailing lane group).
    pub c2: [[f32; 4]; 4],
    /// Input propagation matrix for the dual-channel form.
    pub d2: [[f32; 4]; 4],
    /// Delayed outputs: older frame then newer frame, `channels` each.
    pub outs: AlignedF32,
}

impl TwoPole {
    /// Create a pass-through kernel (`b0 = 1`, `a1 = a2 = 0`) for `channels`.
    pub fn new(channels: usize) -> Self {
        assert!(channels > 0, "channel count must be non-zero");
        let mut f = Self {
            channels,
            b0: 1.0,
            a1: 0.0,
            a2: 0.0,
            c1: [[0.0; 4]; 2],
            d1: [[0.0; 4]; 4],
            c2: [[0.0; 4]; 4],
            d2: [[0.0; 4]; 4],
            outs: AlignedF32::default(),
        };
        f.update();
        f
    }

    /// The number of interleaved channels this kernel processes.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Change the channel count. Reallocates and zeroes the delay line.
    pub fn set_channels(&mut self, channels: usize) {
        assert!(channels > 0, "channel count must be non-zero");
        self.channels = channels;
        self.update();
    }

    /// Rebuild the acceleration matrices from the current coefficients
    /// and reset the delay line.
    pub fn update(&mut self) {
        let (a1, a2) = (self.a1, self.a2);

        // Order-2 recurrence over the unit impulses of y[n-2] and y[n-1]
        let mut p = [0.0f32; 4];
        let mut q = [0.0f32; 4];
        p[0] = -a2;
        q[0] = -a1;
        p[1] = -a1 * p[0];
        q[1] = -a1 * q[0] - a2;
        p[2] = -a1 * p[1] - a2 * p[0];
        q[2] = -a1 * q[1] - a2 * q[0];
        p[3] = -a1 * p[2] - a2 * p[1];
        q[3] = -a1 * q[2] - a2 * q[1];
        self.c1 = [p, q];

        self.d1 = [
            [1.0, q[0], q[1], q[2]],
            [0.0, 1.0, q[0], q[1]],
            [0.0, 0.0, 1.0, q[0]],
            [0.0, 0.0, 0.0, 1.0],
        ];

        self.c2 = [
            [-a2, 0.0, a1 * a2, 0.0],
            [0.0, -a2, 0.0, a1 * a2],
            [-a1, 0.0, a1 * a1 - a2, 0.0],
            [0.0, -a1, 0.0, a1 * a1 - a2],
        ];
        self.d2 = [
            [1.0, 0.0, -a1, 0.0],
            [0.0, 1.0, 0.0, -a1],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];

        self.outs.reset(2 * self.channels);
    }

    /// Zero the delay line, keeping coefficients and matrices.
    pub fn clear(&mut self) {
        self.outs.clear();
    }
}

impl Default for TwoPole {
    fn default() -> Self {
        Self::new(1)
    }
}

// ─── PoleZero ──────────────────────────────────────────────────────────────

/// First-order pole-zero filter kernel:
/// `y[n] = b0*x[n] + b1*x[n-1] - a1*y[n-1]`.
///
/// Keeps two parallel delay lines: the delayed outputs (feedback term)
/// and the delayed gain-scaled inputs (feed-forward term). Block output
/// is delayed by one frame relative to the input.
#[derive(Debug, Clone)]
pub struct PoleZero {
    channels: usize,
    /// Zero-order feed-forward coefficient.
    pub b0: f32,
    /// First-order feed-forward coefficient.
    pub b1: f32,
    /// Feedback coefficient.
    pub a1: f32,
    /// Powers of `-a1` (the recursion is OnePole-shaped once the
    /// feed-forward term has been formed).
    pub c1: [f32; 4],
    /// Input propagation matrix.
    pub d1: [[f32; 4]; 4],
    /// Recursion rows for the dual-channel form.
    pub c2: [[f32; 4]; 2],
    /// Input propagation matrix for the dual-channel form.
    pub d2: [[f32; 4]; 4],
    /// Delayed outputs, one per channel.
    pub outs: AlignedF32,
    /// Delayed gain-scaled inputs, one per channel.
    pub inns: AlignedF32,
}

impl PoleZero {
    /// Create a pass-through kernel (`b0 = 1`, `b1 = a1 = 0`) for `channels`.
    pub fn new(channels: usize) -> Self {
        assert!(channels > 0, "channel count must be non-zero");
        let mut f = Self {
            channels,
            b0: 1.0,
            b1: 0.0,
            a1: 0.0,
            c1: [0.0; 4],
            d1: [[0.0; 4]; 4],
            c2: [[0.0; 4]; 2],
            d2: [[0.0; 4]; 4],
            outs: AlignedF32::default(),
            inns: AlignedF32::default(),
        };
        f.update();
        f
    }

    /// The number of interleaved channels this kernel processes.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Change the channel count. Reallocates and zeroes both delay lines.
    pub fn set_channels(&mut self, channels: usize) {
        assert!(channels > 0, "channel count must be non-zero");
        self.channels = channels;
        self.update();
    }

    /// Rebuild the acceleration matrices from the current coefficients
    /// and reset both delay lines.
    pub fn update(&mut self) {
        let a1 = self.a1;
        self.c1[0] = -a1;
        self.c1[1] = -a1 * self.c1[0];
        self.c1[2] = -a1 * self.c1[1];
        self.c1[3] = -a1 * self.c1[2];

        let c = self.c1;
        self.d1 = [
            [1.0, c[0], c[1], c[2]],
            [0.0, 1.0, c[0], c[1]],
            [0.0, 0.0, 1.0, c[0]],
            [0.0, 0.0, 0.0, 1.0],
        ];

        self.c2 = [[-a1, 0.0, a1 * a1, 0.0], [0.0, -a1, 0.0, a1 * a1]];
        self.d2 = [
            [1.0, 0.0, -a1, 0.0],
            [0.0, 1.0, 0.0, -a1],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];

        self.outs.reset(self.channels);
        self.inns.reset(self.channels);
    }

    /// Zero both delay lines, keeping coefficients and matrices.
    pub fn clear(&mut self) {
        self.outs.clear();
        self.inns.clear();
    }
}

impl Default for PoleZero {
    fn default() -> Self {
        Self::new(1)
    }
}

// ─── Fir ───────────────────────────────────────────────────────────────────

/// Feed-forward filter kernel of arbitrary order:
/// `y[n] = b0*x[n] + b1*x[n-1] + ... + bk*x[n-k]`.
///
/// No feedback means no recursion matrices, no stability constraint, and
/// no output delay. The delay line stores `order` frames of gain-scaled
/// input, frame-interleaved, oldest frame first.
#[derive(Debug, Clone)]
pub struct Fir {
    channels: usize,
    /// Zero-order feed-forward coefficient.
    pub b0: f32,
    /// Remaining coefficients, oldest lag first: `bval[j] = b[order - j]`.
    /// This matches the delay-line layout so the convolution indexes both
    /// in the same direction.
    pub(crate) bval: Vec<f32>,
    /// Delayed gain-scaled inputs: `order` frames, oldest first.
    pub inns: AlignedF32,
}

impl Fir {
    /// Create a pass-through kernel (`b = [1]`) for `channels`.
    pub fn new(channels: usize) -> Self {
        assert!(channels > 0, "channel count must be non-zero");
        let mut f = Self {
            channels,
            b0: 1.0,
            bval: Vec::new(),
            inns: AlignedF32::default(),
        };
        f.update();
        f
    }

    /// The number of interleaved channels this kernel processes.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Change the channel count. Reallocates and zeroes the delay line.
    pub fn set_channels(&mut self, channels: usize) {
        assert!(channels > 0, "channel count must be non-zero");
        self.channels = channels;
        self.update();
    }

    /// The filter order (number of delayed taps, `len(b) - 1`).
    pub fn order(&self) -> usize {
        self.bval.len()
    }

    /// Set the feed-forward coefficients from `[b0, b1, ..., bk]`.
    ///
    /// An empty slice yields the zero filter (all output silenced), not
    /// pass-through. Any coefficient vector is acceptable; with no
    /// feedback there is no stability constraint.
    pub fn set_b_coeff(&mut self, bvals: &[f32]) {
        match bvals.split_first() {
            None => {
                self.b0 = 0.0;
                self.bval.clear();
            }
            Some((&b0, tail)) => {
                self.b0 = b0;
                self.bval.clear();
                self.bval.extend(tail.iter().rev());
            }
        }
        self.update();
    }

    /// The feed-forward coefficients in `[b0, b1, ..., bk]` order.
    pub fn b_coeff(&self) -> Vec<f32> {
        let mut result = Vec::with_capacity(self.bval.len() + 1);
        result.push(self.b0);
        result.extend(self.bval.iter().rev());
        result
    }

    /// Resize and zero the delay line for the current order and channel
    /// count.
    pub fn update(&mut self) {
        self.inns.reset(self.bval.len() * self.channels);
    }

    /// Zero the delay line, keeping coefficients.
    pub fn clear(&mut self) {
        self.inns.clear();
    }
}

impl Default for Fir {
    fn default() -> Self {
        Self::new(1)
    }
}
