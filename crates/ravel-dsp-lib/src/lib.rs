// SPDX-License-Identifier: MIT

//! # ravel-dsp-lib
//!
//! Low-level DSP kernels for the Ravel audio graph.
//!
//! This crate provides the numeric layer under `ravel-dsp-units`: the
//! filter kernels that turn interleaved multi-channel sample streams
//! into filtered streams, plus the aligned storage and packed math they
//! are built on. It includes:
//!
//! - **Aligned buffers**: exclusively owned, 16-byte-aligned f32 storage
//! - **Packed math**: add, multiply, scale, gain ramps, clamp
//! - **Filter kernels**: one-pole, two-pole, pole-zero, and FIR block
//!   processing with per-channel-count specializations
//!
//! ## Design
//!
//! Recursive filters resist vectorization because `y[n]` depends on
//! `y[n-1]`. The kernels here use matrix precomputation instead: the
//! recursion is unrolled four frames ahead into a row of pole powers
//! plus a triangular input-propagation matrix, so four outputs come
//! from one matrix-vector style application and only the last lane is
//! carried between groups. The kernels are written as plain lane
//! arithmetic and compiled for AVX2+FMA, AVX, SSE4.1, and NEON via the
//! `multiversion` crate; the best variant is selected at runtime.
//!
//! Every block kernel is numerically interchangeable with a sequence of
//! per-frame `*_step` calls — streaming in chunks of any size produces
//! the same output as processing the whole signal at once. The kernels
//! are not thread safe; each one is meant to be owned and driven by a
//! single audio thread.

pub mod buffer;
pub mod fir;
pub mod math;
pub mod one_pole;
pub mod pole_zero;
pub mod two_pole;
pub mod types;
