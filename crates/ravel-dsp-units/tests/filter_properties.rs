// SPDX-License-Identifier: MIT
//
// Contract-level properties that hold across the filter family:
// cleared filters are silent, flush drains exactly the pending history,
// failed setters leave the filter untouched, and transfer-function
// products collapse a filter chain into a single equivalent filter.

use std::panic::{catch_unwind, AssertUnwindSafe};

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use ravel_dsp_units::{AudioFilter, FirFilter, OnePoleFilter, PoleZeroFilter, TwoPoleFilter};

fn noise(seed: u64, len: usize) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
}

fn assert_silent_after_clear<F: AudioFilter>(f: &mut F, context: &str) {
    let channels = f.channels();
    let input = noise(0x51E7, 64 * channels);
    let mut output = vec![0.0f32; input.len()];
    f.calculate(1.0, &input, &mut output);

    f.clear();
    let zeros = vec![0.0f32; 32 * channels];
    let mut silent = vec![1.0f32; zeros.len()];
    f.calculate(1.0, &zeros, &mut silent);
    assert!(
        silent.iter().all(|&x| x == 0.0),
        "{context}: zero input after clear must give zero output"
    );
}

#[test]
fn clear_silences_every_filter() {
    let mut one = OnePoleFilter::with_coeff(2, 0.5, -0.6);
    assert_silent_after_clear(&mut one, "one_pole");

    let mut two = TwoPoleFilter::with_coeff(3, 0.4, -1.0, 0.5);
    assert_silent_after_clear(&mut two, "two_pole");

    let mut pz = PoleZeroFilter::with_coeff(2, 1.0, -1.0, -0.95);
    assert_silent_after_clear(&mut pz, "pole_zero");

    let mut fir = FirFilter::with_coeff(4, &[0.25, 0.25, 0.25, 0.25]);
    assert_silent_after_clear(&mut fir, "fir");
}

#[test]
fn one_pole_flush_is_the_next_frame() {
    // After N frames, the flushed value must equal what frame N+1's
    // output would have been with no further input.
    let channels = 2;
    let input = noise(0xF1, 37 * channels);

    let mut f = OnePoleFilter::with_coeff(channels, 0.7, -0.4);
    let mut out = vec![0.0f32; input.len()];
    f.calculate(1.0, &input, &mut out);

    let mut continued = f.clone();
    let zeros = vec![0.0f32; channels];
    let mut next = vec![0.0f32; channels];
    continued.step(1.0, &zeros, &mut next);

    let mut flushed = vec![0.0f32; channels];
    assert_eq!(f.flush(&mut flushed), 1);
    assert_eq!(flushed, next);
}

#[test]
fn two_pole_flush_is_the_next_two_frames() {
    let channels = 2;
    let input = noise(0xF2, 41 * channels);

    let mut f = TwoPoleFilter::with_coeff(channels, 0.5, -0.9, 0.45);
    let mut out = vec![0.0f32; input.len()];
    f.calculate(1.0, &input, &mut out);

    let mut continued = f.clone();
    let zeros = vec![0.0f32; channels];
    let mut next1 = vec![0.0f32; channels];
    let mut next2 = vec![0.0f32; channels];
    continued.step(1.0, &zeros, &mut next1);
    continued.step(1.0, &zeros, &mut next2);

    let mut flushed = vec![0.0f32; 2 * channels];
    assert_eq!(f.flush(&mut flushed), 2);
    assert_eq!(&flushed[..channels], &next1[..]);
    assert_eq!(&flushed[channels..], &next2[..]);
}

#[test]
fn failed_setters_leave_state_intact() {
    // A rejected preset must not partially apply: coefficients and
    // history survive untouched.
    let input = noise(0xA70, 32);

    let mut f = TwoPoleFilter::new();
    f.set_resonance(0.1, 0.8, true);
    let mut out = vec![0.0f32; 32];
    f.calculate(1.0, &input, &mut out);

    let before_b = f.b_coeff();
    let before_a = f.a_coeff();
    let snapshot = f.clone();

    let result = catch_unwind(AssertUnwindSafe(|| f.set_poles(0.5, 1.5)));
    assert!(result.is_err(), "set_poles(0.5, 1.5) must reject");

    assert_eq!(f.b_coeff(), before_b);
    assert_eq!(f.a_coeff(), before_a);

    // The delay line survives too: both copies continue identically
    let tail = noise(0xA71, 32);
    let mut out_a = vec![0.0f32; 32];
    let mut out_b = vec![0.0f32; 32];
    f.calculate(1.0, &tail, &mut out_a);
    snapshot.clone().calculate(1.0, &tail, &mut out_b);
    assert_eq!(out_a, out_b);
}

#[test]
fn one_pole_chain_collapses_into_two_pole() {
    // Filter chaining is multiplication in the transfer domain: two
    // cascaded one-pole filters must equal the single two-pole filter
    // built from the products of their transfer polynomials. Each
    // one-pole stage delays by one frame and the two-pole delays by
    // two, so the alignment works out exactly.
    let f1 = OnePoleFilter::with_coeff(1, 0.4, -0.5);
    let f2 = OnePoleFilter::with_coeff(1, 0.8, 0.25);

    let p = f1.numerator() * f2.numerator();
    let q = f1.denominator() * f2.denominator();
    let mut collapsed = TwoPoleFilter::new();
    collapsed.set_transfer(&p, &q);

    let input = noise(0xCA5C, 256);
    let mut stage1 = vec![0.0f32; 256];
    let mut cascade = vec![0.0f32; 256];
    let mut single = vec![0.0f32; 256];

    let mut f1 = f1;
    let mut f2 = f2;
    f1.calculate(1.0, &input, &mut stage1);
    f2.calculate(1.0, &stage1, &mut cascade);
    collapsed.calculate(1.0, &input, &mut single);

    for i in 0..256 {
        assert!(
            (cascade[i] - single[i]).abs() < 1e-5,
            "collapsed chain diverged at sample {i}: {} vs {}",
            cascade[i],
            single[i]
        );
    }
}

#[test]
fn dc_block_converges_while_streaming() {
    // The DC blocker must hold its convergence across many small blocks,
    // not just one long run.
    let mut f = PoleZeroFilter::with_channels(2);
    f.set_block_zero(0.995);

    let block = vec![0.6f32; 2 * 7];
    let mut out = vec![0.0f32; 2 * 7];
    let mut last = 1.0f32;
    for _ in 0..4000 {
        f.calculate(1.0, &block, &mut out);
        last = out[out.len() - 1];
    }
    assert!(
        last.abs() < 1e-3,
        "DC must be cancelled under streaming, got {last}"
    );
}

#[test]
fn gain_is_applied_at_the_input() {
    // calculate(g, x) == calculate(1, g*x) for every filter type; the
    // gain scales the signal, never the coefficients.
    let input = noise(0x6A1, 48);
    let scaled: Vec<f32> = input.iter().map(|x| x * 1.7).collect();

    let mut a = PoleZeroFilter::with_coeff(1, 0.9, -0.3, 0.2);
    let mut b = a.clone();

    let mut out_gain = vec![0.0f32; 48];
    let mut out_pre = vec![0.0f32; 48];
    a.calculate(1.7, &input, &mut out_gain);
    b.calculate(1.0, &scaled, &mut out_pre);

    for i in 0..48 {
        assert!(
            (out_gain[i] - out_pre[i]).abs() < 1e-5,
            "gain placement mismatch at sample {i}"
        );
    }
}

#[test]
fn channel_change_invalidates_history() {
    let input = noise(0xCC, 64);
    let mut f = OnePoleFilter::with_coeff(1, 0.5, -0.7);
    let mut out = vec![0.0f32; 64];
    f.calculate(1.0, &input, &mut out);

    f.set_channels(4);
    let zeros = vec![0.0f32; 4 * 8];
    let mut silent = vec![1.0f32; 4 * 8];
    f.calculate(1.0, &zeros, &mut silent);
    assert!(silent.iter().all(|&x| x == 0.0));
}
