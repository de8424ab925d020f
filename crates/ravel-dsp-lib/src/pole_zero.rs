// SPDX-License-Identifier: MIT

//! Pole-zero filter block kernels.
//!
//! The feed-forward half needs the previous input sample, so each lane
//! group first forms the effective input `t[k] = b0*xg[k] + b1*xg[k-1]`,
//! where `xg` is the gain-scaled input and the lane before the group
//! head comes out of the stored input delay line. That hand-off — part
//! of the lookback living in the previous block, part in the current
//! one — is the delicate boundary here; once `t` exists the recursion is
//! exactly the one-pole matrix form.
//!
//! Kernel frame counts must be multiples of four; [`pole_zero_process`]
//! dispatches and steps the remainder. Output trails input by one frame.

use multiversion::multiversion;

use crate::types::PoleZero;

/// Filter one frame, emitting the delayed frame.
pub fn pole_zero_step(dst: &mut [f32], src: &[f32], gain: f32, f: &mut PoleZero) {
    let (b0, b1, a1) = (f.b0, f.b1, f.a1);
    let channels = f.channels();
    for ch in 0..channels {
        dst[ch] = f.outs[ch];
        f.outs[ch] = gain * b0 * src[ch] + b1 * f.inns[ch] - a1 * f.outs[ch];
        f.inns[ch] = gain * src[ch];
    }
}

/// Filter a single-channel block. Frame count must be a multiple of 4.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn pole_zero_process_x1(dst: &mut [f32], src: &[f32], gain: f32, f: &mut PoleZero) {
    debug_assert_eq!(f.channels(), 1);
    debug_assert_eq!(src.len() % 4, 0);
    let (b0, b1) = (f.b0, f.b1);
    let c = f.c1;
    let d = f.d1;

    let mut pout = f.outs[0];
    let mut pinn = f.inns[0];
    for (out, inp) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let xg = [gain * inp[0], gain * inp[1], gain * inp[2], gain * inp[3]];
        // Effective feed-forward input; lane 0 looks back into the delay line
        let t = [
            b0 * xg[0] + b1 * pinn,
            b0 * xg[1] + b1 * xg[0],
            b0 * xg[2] + b1 * xg[1],
            b0 * xg[3] + b1 * xg[2],
        ];
        let mut y = [pout * c[0], pout * c[1], pout * c[2], pout * c[3]];
        for j in 0..4 {
            y[0] += t[j] * d[j][0];
            y[1] += t[j] * d[j][1];
            y[2] += t[j] * d[j][2];
            y[3] += t[j] * d[j][3];
        }
        out[0] = pout;
        out[1] = y[0];
        out[2] = y[1];
        out[3] = y[2];
        pout = y[3];
        pinn = xg[3];
    }
    f.outs[0] = pout;
    f.inns[0] = pinn;
}

/// Filter an interleaved stereo block; lane groups hold two frames, so
/// the input lookback shifts by two lanes.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn pole_zero_process_x2(dst: &mut [f32], src: &[f32], gain: f32, f: &mut PoleZero) {
    debug_assert_eq!(f.channels(), 2);
    debug_assert_eq!(src.len() % 8, 0);
    let (b0, b1) = (f.b0, f.b1);
    let ca = f.c2[0];
    let cb = f.c2[1];
    let d = f.d2;

    let mut pout = [0.0, 0.0, f.outs[0], f.outs[1]];
    let mut pinn = [0.0, 0.0, f.inns[0], f.inns[1]];
    for (out, inp) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let xg = [gain * inp[0], gain * inp[1], gain * inp[2], gain * inp[3]];
        let t = [
            b0 * xg[0] + b1 * pinn[2],
            b0 * xg[1] + b1 * pinn[3],
            b0 * xg[2] + b1 * xg[0],
            b0 * xg[3] + b1 * xg[1],
        ];
        let mut y = [
            pout[2] * ca[0] + pout[3] * cb[0],
            pout[2] * ca[1] + pout[3] * cb[1],
            pout[2] * ca[2] + pout[3] * cb[2],
            pout[2] * ca[3] + pout[3] * cb[3],
        ];
        for j in 0..4 {
            y[0] += t[j] * d[j][0];
            y[1] += t[j] * d[j][1];
            y[2] += t[j] * d[j][2];
            y[3] += t[j] * d[j][3];
        }
        out[0] = pout[2];
        out[1] = pout[3];
        out[2] = y[0];
        out[3] = y[1];
        pout = y;
        pinn = xg;
    }
    f.outs[0] = pout[2];
    f.outs[1] = pout[3];
    f.inns[0] = pinn[2];
    f.inns[1] = pinn[3];
}

/// Filter an interleaved 3-channel block via the strided kernel.
pub fn pole_zero_process_x3(dst: &mut [f32], src: &[f32], gain: f32, f: &mut PoleZero) {
    debug_assert_eq!(f.channels(), 3);
    pole_zero_process_stride(dst, src, gain, f, 0);
    pole_zero_process_stride(dst, src, gain, f, 1);
    pole_zero_process_stride(dst, src, gain, f, 2);
}

/// Filter an interleaved 4-channel block. One frame per lane group; the
/// input lookback is simply the previous frame's lane group.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn pole_zero_process_x4(dst: &mut [f32], src: &[f32], gain: f32, f: &mut PoleZero) {
    debug_assert_eq!(f.channels(), 4);
    debug_assert_eq!(src.len() % 16, 0);
    let (b0, b1, na1) = (f.b0, f.b1, -f.a1);

    let mut pout = [f.outs[0], f.outs[1], f.outs[2], f.outs[3]];
    let mut pinn = [f.inns[0], f.inns[1], f.inns[2], f.inns[3]];
    for (out, inp) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let xg = [gain * inp[0], gain * inp[1], gain * inp[2], gain * inp[3]];
        let t = [
            b0 * xg[0] + b1 * pinn[0] + na1 * pout[0],
            b0 * xg[1] + b1 * pinn[1] + na1 * pout[1],
            b0 * xg[2] + b1 * pinn[2] + na1 * pout[2],
            b0 * xg[3] + b1 * pinn[3] + na1 * pout[3],
        ];
        out.copy_from_slice(&pout);
        pout = t;
        pinn = xg;
    }
    f.outs.copy_from_slice(&pout);
    f.inns.copy_from_slice(&pinn);
}

/// Filter an interleaved 8-channel (7.1) block.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn pole_zero_process_x8(dst: &mut [f32], src: &[f32], gain: f32, f: &mut PoleZero) {
    debug_assert_eq!(f.channels(), 8);
    debug_assert_eq!(src.len() % 32, 0);
    let (b0, b1, na1) = (f.b0, f.b1, -f.a1);

    let mut pout = [0.0f32; 8];
    let mut pinn = [0.0f32; 8];
    pout.copy_from_slice(&f.outs);
    pinn.copy_from_slice(&f.inns);
    for (out, inp) in dst.chunks_exact_mut(8).zip(src.chunks_exact(8)) {
        let mut t = [0.0f32; 8];
        let mut xg = [0.0f32; 8];
        for ch in 0..8 {
            xg[ch] = gain * inp[ch];
            t[ch] = b0 * xg[ch] + b1 * pinn[ch] + na1 * pout[ch];
        }
        out.copy_from_slice(&pout);
        pout = t;
        pinn = xg;
    }
    f.outs.copy_from_slice(&pout);
    f.inns.copy_from_slice(&pinn);
}

/// Filter one channel of an interleaved block with an arbitrary channel
/// count. Both buffers cover the full interleaved block.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn pole_zero_process_stride(
    dst: &mut [f32],
    src: &[f32],
    gain: f32,
    f: &mut PoleZero,
    channel: usize,
) {
    let stride = f.channels();
    debug_assert!(channel < stride);
    let frames = src.len() / stride;
    debug_assert_eq!(frames % 4, 0);
    let (b0, b1) = (f.b0, f.b1);
    let c = f.c1;
    let d = f.d1;

    let mut pout = f.outs[channel];
    let mut pinn = f.inns[channel];
    let mut base = channel;
    for _ in (0..frames).step_by(4) {
        let xg = [
            gain * src[base],
            gain * src[base + stride],
            gain * src[base + 2 * stride],
            gain * src[base + 3 * stride],
        ];
        let t = [
            b0 * xg[0] + b1 * pinn,
            b0 * xg[1] + b1 * xg[0],
            b0 * xg[2] + b1 * xg[1],
            b0 * xg[3] + b1 * xg[2],
        ];
        let mut y = [pout * c[0], pout * c[1], pout * c[2], pout * c[3]];
        for j in 0..4 {
            y[0] += t[j] * d[j][0];
            y[1] += t[j] * d[j][1];
            y[2] += t[j] * d[j][2];
            y[3] += t[j] * d[j][3];
        }
        dst[base] = pout;
        dst[base + stride] = y[0];
        dst[base + 2 * stride] = y[1];
        dst[base + 3 * stride] = y[2];
        pout = y[3];
        pinn = xg[3];
        base += 4 * stride;
    }
    f.outs[channel] = pout;
    f.inns[channel] = pinn;
}

/// Filter an interleaved block of any length, auto-dispatching on the
/// kernel's channel count and stepping the non-multiple-of-4 remainder.
pub fn pole_zero_process(dst: &mut [f32], src: &[f32], gain: f32, f: &mut PoleZero) {
    debug_assert_eq!(dst.len(), src.len());
    let channels = f.channels();
    let size = src.len() / channels;
    let valid = size - (size % 4);
    let split = valid * channels;

    if valid > 0 {
        match channels {
            1 => pole_zero_process_x1(&mut dst[..split], &src[..split], gain, f),
            2 => pole_zero_process_x2(&mut dst[..split], &src[..split], gain, f),
            3 => pole_zero_process_x3(&mut dst[..split], &src[..split], gain, f),
            4 => pole_zero_process_x4(&mut dst[..split], &src[..split], gain, f),
            8 => pole_zero_process_x8(&mut dst[..split], &src[..split], gain, f),
            _ => {
                for ch in 0..channels {
                    pole_zero_process_stride(&mut dst[..split], &src[..split], gain, f, ch);
                }
            }
        }
    }
    for ii in valid..size {
        let lo = ii * channels;
        let hi = lo + channels;
        pole_zero_step(&mut dst[lo..hi], &src[lo..hi], gain, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i as f32 * 0.31).sin() * 0.8).collect()
    }

    fn step_reference(src: &[f32], gain: f32, f: &mut PoleZero) -> Vec<f32> {
        let channels = f.channels();
        let mut dst = vec![0.0; src.len()];
        for (out, inp) in dst.chunks_exact_mut(channels).zip(src.chunks_exact(channels)) {
            pole_zero_step(out, inp, gain, f);
        }
        dst
    }

    fn dc_blocker(channels: usize) -> PoleZero {
        let mut f = PoleZero::new(channels);
        f.b0 = 1.0;
        f.b1 = -1.0;
        f.a1 = -0.99;
        f.update();
        f
    }

    #[test]
    fn x1_matches_step_sequence() {
        let src = ramp(64);
        let mut fa = dc_blocker(1);
        let mut fb = fa.clone();

        let mut block = vec![0.0; 64];
        pole_zero_process_x1(&mut block, &src, 0.8, &mut fa);
        let scalar = step_reference(&src, 0.8, &mut fb);

        for i in 0..64 {
            assert_approx_eq!(f32, block[i], scalar[i], epsilon = 1e-4);
        }
        assert_approx_eq!(f32, fa.outs[0], fb.outs[0], epsilon = 1e-4);
        assert_approx_eq!(f32, fa.inns[0], fb.inns[0], epsilon = 1e-4);
    }

    #[test]
    fn x2_matches_step_sequence() {
        let src = ramp(64);
        let mut fa = dc_blocker(2);
        let mut fb = fa.clone();

        let mut block = vec![0.0; 64];
        pole_zero_process_x2(&mut block, &src, 1.0, &mut fa);
        let scalar = step_reference(&src, 1.0, &mut fb);

        for i in 0..64 {
            assert_approx_eq!(f32, block[i], scalar[i], epsilon = 1e-4);
        }
    }

    #[test]
    fn x4_matches_step_sequence() {
        let src = ramp(64);
        let mut fa = dc_blocker(4);
        let mut fb = fa.clone();

        let mut block = vec![0.0; 64];
        pole_zero_process_x4(&mut block, &src, 1.0, &mut fa);
        let scalar = step_reference(&src, 1.0, &mut fb);

        for i in 0..64 {
            assert_approx_eq!(f32, block[i], scalar[i], epsilon = 1e-4);
        }
    }

    #[test]
    fn stride_matches_step_sequence_for_five_channels() {
        let src = ramp(80);
        let mut fa = dc_blocker(5);
        let mut fb = fa.clone();

        let mut block = vec![0.0; 80];
        for ch in 0..5 {
            pole_zero_process_stride(&mut block, &src, 1.0, &mut fa, ch);
        }
        let scalar = step_reference(&src, 1.0, &mut fb);

        for i in 0..80 {
            assert_approx_eq!(f32, block[i], scalar[i], epsilon = 1e-4);
        }
    }

    #[test]
    fn block_boundary_hand_off() {
        // The lookback for the head of the second block lives in the
        // first block's tail; split processing must match the whole run.
        let src = ramp(32);
        let mut fa = dc_blocker(1);
        let mut fb = fa.clone();

        let mut split = vec![0.0; 32];
        pole_zero_process_x1(&mut split[..12], &src[..12], 1.0, &mut fa);
        pole_zero_process_x1(&mut split[12..], &src[12..], 1.0, &mut fa);

        let mut whole = vec![0.0; 32];
        pole_zero_process_x1(&mut whole, &src, 1.0, &mut fb);

        for i in 0..32 {
            assert_approx_eq!(f32, split[i], whole[i], epsilon = 1e-5);
        }
    }

    #[test]
    fn process_handles_ragged_tail() {
        let src = ramp(15);
        let mut fa = dc_blocker(1);
        let mut fb = fa.clone();

        let mut block = vec![0.0; 15];
        pole_zero_process(&mut block, &src, 1.0, &mut fa);
        let scalar = step_reference(&src, 1.0, &mut fb);

        for i in 0..15 {
            assert_approx_eq!(f32, block[i], scalar[i], epsilon = 1e-4);
        }
    }

    #[test]
    fn gain_scales_both_taps() {
        // y = gain*(b0*x[n] + b1*x[n-1]) - a1*y[n-1]: the stored input
        // is gain-scaled, so the b1 term sees the gain too.
        let mut f = PoleZero::new(1);
        f.b0 = 1.0;
        f.b1 = 1.0;
        f.a1 = 0.0;
        f.update();

        let src = [1.0, 1.0, 1.0, 1.0];
        let mut dst = [0.0; 4];
        pole_zero_process_x1(&mut dst, &src, 2.0, &mut f);
        // Delayed one frame: [0, 2*1, 2*(1+1), 2*(1+1)]
        assert_approx_eq!(f32, dst[0], 0.0, epsilon = 1e-7);
        assert_approx_eq!(f32, dst[1], 2.0, epsilon = 1e-7);
        assert_approx_eq!(f32, dst[2], 4.0, epsilon = 1e-7);
        assert_approx_eq!(f32, dst[3], 4.0, epsilon = 1e-7);
    }
}
