// SPDX-License-Identifier: MIT

//! Channelized audio filters.
//!
//! Four sibling filter types share one calling convention without any
//! inheritance between them: coefficient management, per-frame `step`,
//! block `calculate` with channel-count-specialized fast paths, and
//! delay-line `flush`/`clear`. The [`AudioFilter`] trait captures that
//! convention so mixer code can be written once and monomorphized per
//! filter type — generic dispatch, never virtual.
//!
//! None of these types are thread safe, by design: they sit on the
//! real-time audio callback path where locking is unacceptable. The
//! owner must confine each instance to one thread at a time.

pub mod fir;
pub mod one_pole;
pub mod pole_zero;
pub mod two_pole;

pub use fir::FirFilter;
pub use one_pole::OnePoleFilter;
pub use pole_zero::PoleZeroFilter;
pub use two_pole::TwoPoleFilter;

/// The calling convention shared by every filter type.
///
/// `calculate` on an implementor is numerically equivalent (to rounding
/// reordering, about 1e-5 relative) to calling `step` once per frame
/// from the same starting state, regardless of which internal fast path
/// runs. Recursive filters emit their output delayed by the number of
/// feedback coefficients; `flush` drains exactly that pending history.
pub trait AudioFilter {
    /// The number of interleaved channels processed per frame.
    fn channels(&self) -> usize;

    /// Change the channel count, reallocating and zeroing all delay
    /// lines. Panics if `channels` is zero.
    fn set_channels(&mut self, channels: usize);

    /// Filter one frame. `input` and `output` hold one sample per
    /// channel. `gain` scales the input, not the coefficients.
    fn step(&mut self, gain: f32, input: &[f32], output: &mut [f32]);

    /// Filter an interleaved block of `input.len() / channels` frames.
    fn calculate(&mut self, gain: f32, input: &[f32], output: &mut [f32]);

    /// Write the pending delayed output to `output` and clear all delay
    /// lines. Returns the number of frames (not samples) written.
    fn flush(&mut self, output: &mut [f32]) -> usize;

    /// Zero all delay lines, keeping coefficients.
    fn clear(&mut self);

    /// The normalized feed-forward coefficients.
    fn b_coeff(&self) -> Vec<f32>;

    /// The normalized feedback coefficients; the leading entry is
    /// always reported as 1.
    fn a_coeff(&self) -> Vec<f32>;
}
