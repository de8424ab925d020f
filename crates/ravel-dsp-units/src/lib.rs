// SPDX-License-Identifier: MIT

//! # ravel-dsp-units
//!
//! Channelized audio filters for the Ravel audio graph, built on the
//! kernels in [`ravel_dsp_lib`]. It includes:
//!
//! - **Filters**: one-pole lowpass, two-pole resonance, pole-zero
//!   (highpass / allpass / DC-blocker), and general FIR
//! - **Transfer functions**: polynomials in z⁻¹ so filter chains can be
//!   collapsed into a single filter by polynomial multiplication
//!
//! ## Contract
//!
//! Every filter processes interleaved multi-channel `f32` streams and
//! keeps its recursive state across block boundaries: streaming a
//! signal through `calculate` in chunks of any size produces the same
//! output as processing it in one call, which in turn matches a pure
//! per-frame `step` loop. Recursive filters emit output delayed by the
//! number of feedback coefficients; `flush` drains exactly that pending
//! history.
//!
//! The mixer graph drives these objects from a single audio thread; no
//! filter here is thread safe, and none of them block, allocate on the
//! processing path, or log.

pub mod filters;
pub mod polynomial;

pub use filters::{AudioFilter, FirFilter, OnePoleFilter, PoleZeroFilter, TwoPoleFilter};
pub use polynomial::Polynomial;
