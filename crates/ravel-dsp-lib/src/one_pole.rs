// SPDX-License-Identifier: MIT

//! One-pole filter block kernels.
//!
//! A first-order recursion cannot be vectorized directly because each
//! output depends on the previous one. The block kernels instead use the
//! matrix form precomputed in [`OnePole::update`]: four outputs are
//! assembled as the carried output times a row of pole powers plus the
//! gain-scaled inputs propagated through an upper-triangular matrix. The
//! last lane seeds the next group, so state carries across block
//! boundaries exactly as in the per-frame recursion.
//!
//! All `*_process_*` kernels require the frame count to be a multiple of
//! four; [`one_pole_process`] dispatches on channel count and finishes
//! any remainder with [`one_pole_step`], making a block call numerically
//! equivalent to a sequence of per-frame steps. Outputs trail inputs by
//! one frame (the recursion depth); the pending frame stays in the
//! kernel's delay line.

use multiversion::multiversion;

use crate::types::OnePole;

/// Filter one frame (one sample per channel), emitting the delayed frame.
pub fn one_pole_step(dst: &mut [f32], src: &[f32], gain: f32, f: &mut OnePole) {
    let (b0, a1) = (f.b0, f.a1);
    for (ch, out) in f.outs.iter_mut().enumerate() {
        dst[ch] = *out;
        *out = gain * b0 * src[ch] - a1 * *out;
    }
}

/// Filter a single-channel block. Frame count must be a multiple of 4.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn one_pole_process_x1(dst: &mut [f32], src: &[f32], gain: f32, f: &mut OnePole) {
    debug_assert_eq!(f.channels(), 1);
    debug_assert_eq!(src.len() % 4, 0);
    let k = gain * f.b0;
    let c = f.c1;
    let d = f.d1;

    let mut prev = f.outs[0];
    for (out, inp) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let x = [k * inp[0], k * inp[1], k * inp[2], k * inp[3]];
        let mut y = [prev * c[0], prev * c[1], prev * c[2], prev * c[3]];
        for j in 0..4 {
            y[0] += x[j] * d[j][0];
            y[1] += x[j] * d[j][1];
            y[2] += x[j] * d[j][2];
            y[3] += x[j] * d[j][3];
        }
        out[0] = prev;
        out[1] = y[0];
        out[2] = y[1];
        out[3] = y[2];
        prev = y[3];
    }
    f.outs[0] = prev;
}

/// Filter an interleaved stereo block. Each 4-lane group holds two
/// frames, so the recursion rows couple lanes two apart.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn one_pole_process_x2(dst: &mut [f32], src: &[f32], gain: f32, f: &mut OnePole) {
    debug_assert_eq!(f.channels(), 2);
    debug_assert_eq!(src.len() % 8, 0);
    let k = gain * f.b0;
    let ca = f.c2[0];
    let cb = f.c2[1];
    let d = f.d2;

    let mut prev = [0.0, 0.0, f.outs[0], f.outs[1]];
    for (out, inp) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let x = [k * inp[0], k * inp[1], k * inp[2], k * inp[3]];
        let mut y = [
            prev[2] * ca[0] + prev[3] * cb[0],
            prev[2] * ca[1] + prev[3] * cb[1],
            prev[2] * ca[2] + prev[3] * cb[2],
            prev[2] * ca[3] + prev[3] * cb[3],
        ];
        for j in 0..4 {
            y[0] += x[j] * d[j][0];
            y[1] += x[j] * d[j][1];
            y[2] += x[j] * d[j][2];
            y[3] += x[j] * d[j][3];
        }
        out[0] = prev[2];
        out[1] = prev[3];
        out[2] = y[0];
        out[3] = y[1];
        prev = y;
    }
    f.outs[0] = prev[2];
    f.outs[1] = prev[3];
}

/// Filter an interleaved 3-channel block.
///
/// A deinterleaving gather for three lanes has no portable payoff, so
/// each channel runs through the strided kernel.
pub fn one_pole_process_x3(dst: &mut [f32], src: &[f32], gain: f32, f: &mut OnePole) {
    debug_assert_eq!(f.channels(), 3);
    one_pole_process_stride(dst, src, gain, f, 0);
    one_pole_process_stride(dst, src, gain, f, 1);
    one_pole_process_stride(dst, src, gain, f, 2);
}

/// Filter an interleaved 4-channel block. One frame fills a lane group,
/// so the recursion runs element-wise with no matrix at all.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn one_pole_process_x4(dst: &mut [f32], src: &[f32], gain: f32, f: &mut OnePole) {
    debug_assert_eq!(f.channels(), 4);
    debug_assert_eq!(src.len() % 16, 0);
    let k = gain * f.b0;
    let na1 = -f.a1;

    let mut prev = [f.outs[0], f.outs[1], f.outs[2], f.outs[3]];
    for (out, inp) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let t = [
            k * inp[0] + na1 * prev[0],
            k * inp[1] + na1 * prev[1],
            k * inp[2] + na1 * prev[2],
            k * inp[3] + na1 * prev[3],
        ];
        out.copy_from_slice(&prev);
        prev = t;
    }
    f.outs.copy_from_slice(&prev);
}

/// Filter an interleaved 8-channel (7.1) block, two lane groups per frame.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn one_pole_process_x8(dst: &mut [f32], src: &[f32], gain: f32, f: &mut OnePole) {
    debug_assert_eq!(f.channels(), 8);
    debug_assert_eq!(src.len() % 32, 0);
    let k = gain * f.b0;
    let na1 = -f.a1;

    let mut prev = [0.0f32; 8];
    prev.copy_from_slice(&f.outs);
    for (out, inp) in dst.chunks_exact_mut(8).zip(src.chunks_exact(8)) {
        let mut t = [0.0f32; 8];
        for ch in 0..8 {
            t[ch] = k * inp[ch] + na1 * prev[ch];
        }
        out.copy_from_slice(&prev);
        prev = t;
    }
    f.outs.copy_from_slice(&prev);
}

/// Filter one channel of an interleaved block with an arbitrary channel
/// count, reading and writing every `channels`-th sample starting at
/// `channel`. Both buffers cover the full interleaved block.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn one_pole_process_stride(
    dst: &mut [f32],
    src: &[f32],
    gain: f32,
    f: &mut OnePole,
    channel: usize,
) {
    let stride = f.channels();
    debug_assert!(channel < stride);
    let frames = src.len() / stride;
    debug_assert_eq!(frames % 4, 0);
    let k = gain * f.b0;
    let c = f.c1;
    let d = f.d1;

    let mut prev = f.outs[channel];
    let mut base = channel;
    for _ in (0..frames).step_by(4) {
        let x = [
            k * src[base],
            k * src[base + stride],
            k * src[base + 2 * stride],
            k * src[base + 3 * stride],
        ];
        let mut y = [prev * c[0], prev * c[1], prev * c[2], prev * c[3]];
        for j in 0..4 {
            y[0] += x[j] * d[j][0];
            y[1] += x[j] * d[j][1];
            y[2] += x[j] * d[j][2];
            y[3] += x[j] * d[j][3];
        }
        dst[base] = prev;
        dst[base + stride] = y[0];
        dst[base + 2 * stride] = y[1];
        dst[base + 3 * stride] = y[2];
        prev = y[3];
        base += 4 * stride;
    }
    f.outs[channel] = prev;
}

/// Filter an interleaved block of any length, auto-dispatching on the
/// kernel's channel count. The multiple-of-4 prefix takes the matrix
/// path; the remainder is stepped per frame, so the result matches a
/// pure per-frame run bit-for-bit in state layout.
pub fn one_pole_process(dst: &mut [f32], src: &[f32], gain: f32, f: &mut OnePole) {
    debug_assert_eq!(dst.len(), src.len());
    let channels = f.channels();
    let size = src.len() / channels;
    let valid = size - (size % 4);
    let split = valid * channels;

    if valid > 0 {
        match channels {
            1 => one_pole_process_x1(&mut dst[..split], &src[..split], gain, f),
            2 => one_pole_process_x2(&mut dst[..split], &src[..split], gain, f),
            3 => one_pole_process_x3(&mut dst[..split], &src[..split], gain, f),
            4 => one_pole_process_x4(&mut dst[..split], &src[..split], gain, f),
            8 => one_pole_process_x8(&mut dst[..split], &src[..split], gain, f),
            _ => {
                for ch in 0..channels {
                    one_pole_process_stride(&mut dst[..split], &src[..split], gain, f, ch);
                }
            }
        }
    }
    for ii in valid..size {
        let lo = ii * channels;
        let hi = lo + channels;
        one_pole_step(&mut dst[lo..hi], &src[lo..hi], gain, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i as f32 * 0.37).sin()).collect()
    }

    fn step_reference(src: &[f32], gain: f32, f: &mut OnePole) -> Vec<f32> {
        let channels = f.channels();
        let mut dst = vec![0.0; src.len()];
        for (out, inp) in dst.chunks_exact_mut(channels).zip(src.chunks_exact(channels)) {
            one_pole_step(out, inp, gain, f);
        }
        dst
    }

    #[test]
    fn impulse_response_is_delayed_geometric_decay() {
        let mut f = OnePole::new(1);
        f.b0 = 0.5;
        f.a1 = -0.5;
        f.update();

        let mut src = vec![0.0f32; 8];
        src[0] = 1.0;
        let mut dst = vec![0.0f32; 8];
        one_pole_process_x1(&mut dst, &src, 1.0, &mut f);

        let expected = [0.0, 0.5, 0.25, 0.125, 0.0625, 0.03125, 0.015625, 0.0078125];
        for (i, &e) in expected.iter().enumerate() {
            assert_approx_eq!(f32, dst[i], e, epsilon = 1e-7);
        }
    }

    #[test]
    fn x1_matches_step_sequence() {
        let src = ramp(64);
        let mut fa = OnePole::new(1);
        fa.b0 = 0.8;
        fa.a1 = 0.3;
        fa.update();
        let mut fb = fa.clone();

        let mut block = vec![0.0; 64];
        one_pole_process_x1(&mut block, &src, 0.7, &mut fa);
        let scalar = step_reference(&src, 0.7, &mut fb);

        for i in 0..64 {
            assert_approx_eq!(f32, block[i], scalar[i], epsilon = 1e-5);
        }
        assert_approx_eq!(f32, fa.outs[0], fb.outs[0], epsilon = 1e-5);
    }

    #[test]
    fn x2_matches_step_sequence() {
        let src = ramp(64);
        let mut fa = OnePole::new(2);
        fa.b0 = 0.6;
        fa.a1 = -0.4;
        fa.update();
        let mut fb = fa.clone();

        let mut block = vec![0.0; 64];
        one_pole_process_x2(&mut block, &src, 1.0, &mut fa);
        let scalar = step_reference(&src, 1.0, &mut fb);

        for i in 0..64 {
            assert_approx_eq!(f32, block[i], scalar[i], epsilon = 1e-5);
        }
    }

    #[test]
    fn x4_matches_step_sequence() {
        let src = ramp(64);
        let mut fa = OnePole::new(4);
        fa.b0 = 0.9;
        fa.a1 = 0.25;
        fa.update();
        let mut fb = fa.clone();

        let mut block = vec![0.0; 64];
        one_pole_process_x4(&mut block, &src, 0.5, &mut fa);
        let scalar = step_reference(&src, 0.5, &mut fb);

        for i in 0..64 {
            assert_approx_eq!(f32, block[i], scalar[i], epsilon = 1e-5);
        }
    }

    #[test]
    fn stride_matches_step_sequence_for_five_channels() {
        let src = ramp(80);
        let mut fa = OnePole::new(5);
        fa.b0 = 0.7;
        fa.a1 = 0.1;
        fa.update();
        let mut fb = fa.clone();

        let mut block = vec![0.0; 80];
        for ch in 0..5 {
            one_pole_process_stride(&mut block, &src, 1.0, &mut fa, ch);
        }
        let scalar = step_reference(&src, 1.0, &mut fb);

        for i in 0..80 {
            assert_approx_eq!(f32, block[i], scalar[i], epsilon = 1e-5);
        }
    }

    #[test]
    fn process_handles_ragged_tail() {
        // 13 frames: 12 through the matrix path, 1 stepped
        let src = ramp(13);
        let mut fa = OnePole::new(1);
        fa.b0 = 0.5;
        fa.a1 = -0.3;
        fa.update();
        let mut fb = fa.clone();

        let mut block = vec![0.0; 13];
        one_pole_process(&mut block, &src, 1.0, &mut fa);
        let scalar = step_reference(&src, 1.0, &mut fb);

        for i in 0..13 {
            assert_approx_eq!(f32, block[i], scalar[i], epsilon = 1e-5);
        }
        assert_approx_eq!(f32, fa.outs[0], fb.outs[0], epsilon = 1e-5);
    }

    #[test]
    fn state_carries_across_blocks() {
        // Two 8-frame blocks must equal one 16-frame block
        let src = ramp(16);
        let mut fa = OnePole::new(1);
        fa.b0 = 0.5;
        fa.a1 = 0.5;
        fa.update();
        let mut fb = fa.clone();

        let mut split = vec![0.0; 16];
        one_pole_process_x1(&mut split[..8], &src[..8], 1.0, &mut fa);
        one_pole_process_x1(&mut split[8..], &src[8..], 1.0, &mut fa);

        let mut whole = vec![0.0; 16];
        one_pole_process_x1(&mut whole, &src, 1.0, &mut fb);

        for i in 0..16 {
            assert_approx_eq!(f32, split[i], whole[i], epsilon = 1e-6);
        }
    }
}
