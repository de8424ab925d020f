// SPDX-License-Identifier: MIT

//! Two-pole filter block kernels.
//!
//! Same block-unrolling idea as the one-pole kernels, one order up: four
//! outputs are produced from the two carried outputs times their
//! recurrence rows plus the inputs propagated through the triangular
//! matrix. Because the recursion depth is two, outputs trail inputs by
//! two frames and the carried state is the last two lanes of each group.
//!
//! Kernel frame counts must be multiples of four; [`two_pole_process`]
//! dispatches and steps the remainder.

use multiversion::multiversion;

use crate::types::TwoPole;

/// Filter one frame, emitting the frame delayed by two.
///
/// `outs[ch]` holds the older stored output, `outs[channels + ch]` the
/// newer; the step rotates them.
pub fn two_pole_step(dst: &mut [f32], src: &[f32], gain: f32, f: &mut TwoPole) {
    let channels = f.channels();
    let (b0, a1, a2) = (f.b0, f.a1, f.a2);
    for ch in 0..channels {
        dst[ch] = f.outs[ch];
        let t = gain * b0 * src[ch] - a1 * f.outs[ch + channels] - a2 * f.outs[ch];
        f.outs[ch] = f.outs[ch + channels];
        f.outs[ch + channels] = t;
    }
}

/// Filter a single-channel block. Frame count must be a multiple of 4.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn two_pole_process_x1(dst: &mut [f32], src: &[f32], gain: f32, f: &mut TwoPole) {
    debug_assert_eq!(f.channels(), 1);
    debug_assert_eq!(src.len() % 4, 0);
    let k = gain * f.b0;
    let cp = f.c1[0];
    let cq = f.c1[1];
    let d = f.d1;

    // prev[2] is y[n-2], prev[3] is y[n-1]
    let mut prev = [0.0, 0.0, f.outs[0], f.outs[1]];
    for (out, inp) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let x = [k * inp[0], k * inp[1], k * inp[2], k * inp[3]];
        let mut y = [
            prev[2] * cp[0] + prev[3] * cq[0],
            prev[2] * cp[1] + prev[3] * cq[1],
            prev[2] * cp[2] + prev[3] * cq[2],
            prev[2] * cp[3] + prev[3] * cq[3],
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

/// Filter an interleaved stereo block. A lane group is two frames, so
/// the carried state is the entire previous group and every lane feeds
/// the recursion rows.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn two_pole_process_x2(dst: &mut [f32], src: &[f32], gain: f32, f: &mut TwoPole) {
    debug_assert_eq!(f.channels(), 2);
    debug_assert_eq!(src.len() % 8, 0);
    let k = gain * f.b0;
    let c = f.c2;
    let d = f.d2;

    let mut prev = [f.outs[0], f.outs[1], f.outs[2], f.outs[3]];
    for (out, inp) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let x = [k * inp[0], k * inp[1], k * inp[2], k * inp[3]];
        let mut y = [0.0f32; 4];
        for m in 0..4 {
            y[0] += prev[m] * c[m][0];
            y[1] += prev[m] * c[m][1];
            y[2] += prev[m] * c[m][2];
            y[3] += prev[m] * c[m][3];
        }
        for j in 0..4 {
            y[0] += x[j] * d[j][0];
            y[1] += x[j] * d[j][1];
            y[2] += x[j] * d[j][2];
            y[3] += x[j] * d[j][3];
        }
        out.copy_from_slice(&prev);
        prev = y;
    }
    f.outs.copy_from_slice(&prev);
}

/// Filter an interleaved 3-channel block via the strided kernel.
pub fn two_pole_process_x3(dst: &mut [f32], src: &[f32], gain: f32, f: &mut TwoPole) {
    debug_assert_eq!(f.channels(), 3);
    two_pole_process_stride(dst, src, gain, f, 0);
    two_pole_process_stride(dst, src, gain, f, 1);
    two_pole_process_stride(dst, src, gain, f, 2);
}

/// Filter an interleaved 4-channel block. One frame per lane group;
/// the recursion runs element-wise over two carried frames.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn two_pole_process_x4(dst: &mut [f32], src: &[f32], gain: f32, f: &mut TwoPole) {
    debug_assert_eq!(f.channels(), 4);
    debug_assert_eq!(src.len() % 16, 0);
    let k = gain * f.b0;
    let (na1, na2) = (-f.a1, -f.a2);

    let mut prev2 = [f.outs[0], f.outs[1], f.outs[2], f.outs[3]];
    let mut prev1 = [f.outs[4], f.outs[5], f.outs[6], f.outs[7]];
    for (out, inp) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let t = [
            k * inp[0] + na1 * prev1[0] + na2 * prev2[0],
            k * inp[1] + na1 * prev1[1] + na2 * prev2[1],
            k * inp[2] + na1 * prev1[2] + na2 * prev2[2],
            k * inp[3] + na1 * prev1[3] + na2 * prev2[3],
        ];
        out.copy_from_slice(&prev2);
        prev2 = prev1;
        prev1 = t;
    }
    f.outs[..4].copy_from_slice(&prev2);
    f.outs[4..].copy_from_slice(&prev1);
}

/// Filter an interleaved 8-channel (7.1) block.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn two_pole_process_x8(dst: &mut [f32], src: &[f32], gain: f32, f: &mut TwoPole) {
    debug_assert_eq!(f.channels(), 8);
    debug_assert_eq!(src.len() % 32, 0);
    let k = gain * f.b0;
    let (na1, na2) = (-f.a1, -f.a2);

    let mut prev2 = [0.0f32; 8];
    let mut prev1 = [0.0f32; 8];
    prev2.copy_from_slice(&f.outs[..8]);
    prev1.copy_from_slice(&f.outs[8..]);
    for (out, inp) in dst.chunks_exact_mut(8).zip(src.chunks_exact(8)) {
        let mut t = [0.0f32; 8];
        for ch in 0..8 {
            t[ch] = k * inp[ch] + na1 * prev1[ch] + na2 * prev2[ch];
        }
        out.copy_from_slice(&prev2);
        prev2 = prev1;
        prev1 = t;
    }
    f.outs[..8].copy_from_slice(&prev2);
    f.outs[8..].copy_from_slice(&prev1);
}

/// Filter one channel of an interleaved block with an arbitrary channel
/// count. Both buffers cover the full interleaved block.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn two_pole_process_stride(
    dst: &mut [f32],
    src: &[f32],
    gain: f32,
    f: &mut TwoPole,
    channel: usize,
) {
    let stride = f.channels();
    debug_assert!(channel < stride);
    let frames = src.len() / stride;
    debug_assert_eq!(frames % 4, 0);
    let k = gain * f.b0;
    let cp = f.c1[0];
    let cq = f.c1[1];
    let d = f.d1;

    let mut prev = [0.0, 0.0, f.outs[channel], f.outs[channel + stride]];
    let mut base = channel;
    for _ in (0..frames).step_by(4) {
        let x = [
            k * src[base],
            k * src[base + stride],
            k * src[base + 2 * stride],
            k * src[base + 3 * stride],
        ];
        let mut y = [
            prev[2] * cp[0] + prev[3] * cq[0],
            prev[2] * cp[1] + prev[3] * cq[1],
            prev[2] * cp[2] + prev[3] * cq[2],
            prev[2] * cp[3] + prev[3] * cq[3],
        ];
        for j in 0..4 {
            y[0] += x[j] * d[j][0];
            y[1] += x[j] * d[j][1];
            y[2] += x[j] * d[j][2];
            y[3] += x[j] * d[j][3];
        }
        dst[base] = prev[2];
        dst[base + stride] = prev[3];
        dst[base + 2 * stride] = y[0];
        dst[base + 3 * stride] = y[1];
        prev = y;
        base += 4 * stride;
    }
    f.outs[channel] = prev[2];
    f.outs[channel + stride] = prev[3];
}

/// Filter an interleaved block of any length, auto-dispatching on the
/// kernel's channel count and stepping the non-multiple-of-4 remainder.
pub fn two_pole_process(dst: &mut [f32], src: &[f32], gain: f32, f: &mut TwoPole) {
    debug_assert_eq!(dst.len(), src.len());
    let channels = f.channels();
    let size = src.len() / channels;
    let valid = size - (size % 4);
    let split = valid * channels;

    if valid > 0 {
        match channels {
            1 => two_pole_process_x1(&mut dst[..split], &src[..split], gain, f),
            2 => two_pole_process_x2(&mut dst[..split], &src[..split], gain, f),
            3 => two_pole_process_x3(&mut dst[..split], &src[..split], gain, f),
            4 => two_pole_process_x4(&mut dst[..split], &src[..split], gain, f),
            8 => two_pole_process_x8(&mut dst[..split], &src[..split], gain, f),
            _ => {
                for ch in 0..channels {
                    two_pole_process_stride(&mut dst[..split], &src[..split], gain, f, ch);
                }
            }
        }
    }
    for ii in valid..size {
        let lo = ii * channels;
        let hi = lo + channels;
        two_pole_step(&mut dst[lo..hi], &src[lo..hi], gain, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i as f32 * 0.23).cos()).collect()
    }

    fn step_reference(src: &[f32], gain: f32, f: &mut TwoPole) -> Vec<f32> {
        let channels = f.channels();
        let mut dst = vec![0.0; src.len()];
        for (out, inp) in dst.chunks_exact_mut(channels).zip(src.chunks_exact(channels)) {
            two_pole_step(out, inp, gain, f);
        }
        dst
    }

    fn resonant(channels: usize) -> TwoPole {
        let mut f = TwoPole::new(channels);
        f.b0 = 0.3;
        f.a1 = -1.2;
        f.a2 = 0.72;
        f.update();
        f
    }

    #[test]
    fn output_is_delayed_two_frames() {
        let mut f = TwoPole::new(1);
        let mut src = vec![0.0f32; 8];
        src[0] = 1.0;
        let mut dst = vec![0.0f32; 8];
        two_pole_process_x1(&mut dst, &src, 1.0, &mut f);

        // Pass-through coefficients: impulse appears two frames late
        assert_eq!(dst[0], 0.0);
        assert_eq!(dst[1], 0.0);
        assert_approx_eq!(f32, dst[2], 1.0, epsilon = 1e-7);
        assert_approx_eq!(f32, dst[3], 0.0, epsilon = 1e-7);
    }

    #[test]
    fn x1_matches_step_sequence() {
        let src = ramp(64);
        let mut fa = resonant(1);
        let mut fb = fa.clone();

        let mut block = vec![0.0; 64];
        two_pole_process_x1(&mut block, &src, 0.9, &mut fa);
        let scalar = step_reference(&src, 0.9, &mut fb);

        for i in 0..64 {
            assert_approx_eq!(f32, block[i], scalar[i], epsilon = 1e-4);
        }
        assert_approx_eq!(f32, fa.outs[0], fb.outs[0], epsilon = 1e-4);
        assert_approx_eq!(f32, fa.outs[1], fb.outs[1], epsilon = 1e-4);
    }

    #[test]
    fn x2_matches_step_sequence() {
        let src = ramp(64);
        let mut fa = resonant(2);
        let mut fb = fa.clone();

        let mut block = vec![0.0; 64];
        two_pole_process_x2(&mut block, &src, 1.0, &mut fa);
        let scalar = step_reference(&src, 1.0, &mut fb);

        for i in 0..64 {
            assert_approx_eq!(f32, block[i], scalar[i], epsilon = 1e-4);
        }
    }

    #[test]
    fn x4_matches_step_sequence() {
        let src = ramp(64);
        let mut fa = resonant(4);
        let mut fb = fa.clone();

        let mut block = vec![0.0; 64];
        two_pole_process_x4(&mut block, &src, 1.0, &mut fa);
        let scalar = step_reference(&src, 1.0, &mut fb);

        for i in 0..64 {
            assert_approx_eq!(f32, block[i], scalar[i], epsilon = 1e-4);
        }
    }

    #[test]
    fn stride_matches_step_sequence_for_six_channels() {
        let src = ramp(96);
        let mut fa = resonant(6);
        let mut fb = fa.clone();

        let mut block = vec![0.0; 96];
        for ch in 0..6 {
            two_pole_process_stride(&mut block, &src, 1.0, &mut fa, ch);
        }
        let scalar = step_reference(&src, 1.0, &mut fb);

        for i in 0..96 {
            assert_approx_eq!(f32, block[i], scalar[i], epsilon = 1e-4);
        }
    }

    #[test]
    fn process_handles_ragged_tail() {
        let src = ramp(22);
        let mut fa = resonant(2);
        let mut fb = fa.clone();

        let mut block = vec![0.0; 22];
        two_pole_process(&mut block, &src, 1.0, &mut fa);
        let scalar = step_reference(&src, 1.0, &mut fb);

        for i in 0..22 {
            assert_approx_eq!(f32, block[i], scalar[i], epsilon = 1e-4);
        }
        for ch in 0..4 {
            assert_approx_eq!(f32, fa.outs[ch], fb.outs[ch], epsilon = 1e-4);
        }
    }

    #[test]
    fn state_carries_across_blocks() {
        let src = ramp(32);
        let mut fa = resonant(1);
        let mut fb = fa.clone();

        let mut split = vec![0.0; 32];
        two_pole_process_x1(&mut split[..12], &src[..12], 1.0, &mut fa);
        two_pole_process_x1(&mut split[12..], &src[12..], 1.0, &mut fa);

        let mut whole = vec![0.0; 32];
        two_pole_process_x1(&mut whole, &src, 1.0, &mut fb);

        for i in 0..32 {
            assert_approx_eq!(f32, split[i], whole[i], epsilon = 1e-4);
        }
    }
}
