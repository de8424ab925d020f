// SPDX-License-Identifier: MIT

//! Feed-forward (FIR) filter block kernels.
//!
//! With no feedback there is nothing to unroll — the work is a sliding
//! dot product — but the delay-line hand-off still matters: lag `d` for
//! output frame `i` reads the stored history while `i < d` and the
//! current block once `i >= d`. Coefficients are stored oldest lag
//! first (matching the delay-line layout), so both regions index
//! forward.
//!
//! The channel-count specializations share one frame-major core,
//! monomorphized per lane count; the strided kernel covers everything
//! else one channel at a time. Unlike the recursive filters, FIR output
//! is not delayed.

use multiversion::multiversion;

use crate::types::Fir;

/// Filter one frame (one sample per channel).
pub fn fir_step(dst: &mut [f32], src: &[f32], gain: f32, f: &mut Fir) {
    let channels = f.channels();
    let bsize = f.bval.len();

    for ch in 0..channels {
        let mut t = gain * f.b0 * src[ch];
        for bjj in 0..bsize {
            t += f.bval[bjj] * f.inns[bjj * channels + ch];
        }
        dst[ch] = t;
    }

    if bsize > 0 {
        // Shift the delay line one frame and append the scaled input
        f.inns.copy_within(channels.., 0);
        let tail = (bsize - 1) * channels;
        for ch in 0..channels {
            f.inns[tail + ch] = gain * src[ch];
        }
    }
}

/// Frame-major convolution over `C` interleaved channels.
///
/// Monomorphized per channel count so the per-frame inner loops unroll
/// over a fixed lane width.
#[inline(always)]
fn fir_block<const C: usize>(
    dst: &mut [f32],
    src: &[f32],
    gain: f32,
    b0: f32,
    bval: &[f32],
    inns: &mut [f32],
) {
    let bsize = bval.len();
    let size = src.len() / C;

    for ii in 0..size {
        for ch in 0..C {
            let mut t = gain * b0 * src[ii * C + ch];
            let mut bjj = 0;
            // Lags still inside the stored history
            while ii + bjj < bsize {
                t += bval[bjj] * inns[(ii + bjj) * C + ch];
                bjj += 1;
            }
            // Lags satisfied by the current block
            while bjj < bsize {
                t += gain * bval[bjj] * src[(ii + bjj - bsize) * C + ch];
                bjj += 1;
            }
            dst[ii * C + ch] = t;
        }
    }

    refill_delay::<C>(src, gain, bsize, inns, size);
}

/// Rewrite the delay line with the last `bsize` frames of scaled input.
///
/// When the block is shorter than the filter order, part of the old
/// history is still live: shift it down and append the whole block.
#[inline(always)]
fn refill_delay<const C: usize>(src: &[f32], gain: f32, bsize: usize, inns: &mut [f32], size: usize) {
    if size >= bsize {
        for j in 0..bsize {
            for ch in 0..C {
                inns[j * C + ch] = gain * src[(size - bsize + j) * C + ch];
            }
        }
    } else {
        inns.copy_within(size * C.., 0);
        let keep = bsize - size;
        for j in 0..size {
            for ch in 0..C {
                inns[(keep + j) * C + ch] = gain * src[j * C + ch];
            }
        }
    }
}

/// Filter a single-channel block. Frame count must be a multiple of 4.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn fir_process_x1(dst: &mut [f32], src: &[f32], gain: f32, f: &mut Fir) {
    debug_assert_eq!(f.channels(), 1);
    debug_assert_eq!(src.len() % 4, 0);
    let b0 = f.b0;
    fir_block::<1>(dst, src, gain, b0, &f.bval, &mut f.inns);
}

/// Filter an interleaved stereo block.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn fir_process_x2(dst: &mut [f32], src: &[f32], gain: f32, f: &mut Fir) {
    debug_assert_eq!(f.channels(), 2);
    debug_assert_eq!(src.len() % 8, 0);
    let b0 = f.b0;
    fir_block::<2>(dst, src, gain, b0, &f.bval, &mut f.inns);
}

/// Filter an interleaved 3-channel block via the strided kernel.
pub fn fir_process_x3(dst: &mut [f32], src: &[f32], gain: f32, f: &mut Fir) {
    debug_assert_eq!(f.channels(), 3);
    fir_process_stride(dst, src, gain, f, 0);
    fir_process_stride(dst, src, gain, f, 1);
    fir_process_stride(dst, src, gain, f, 2);
}

/// Filter an interleaved 4-channel block, one frame per lane group.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn fir_process_x4(dst: &mut [f32], src: &[f32], gain: f32, f: &mut Fir) {
    debug_assert_eq!(f.channels(), 4);
    debug_assert_eq!(src.len() % 16, 0);
    let b0 = f.b0;
    fir_block::<4>(dst, src, gain, b0, &f.bval, &mut f.inns);
}

/// Filter an interleaved 8-channel (7.1) block.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn fir_process_x8(dst: &mut [f32], src: &[f32], gain: f32, f: &mut Fir) {
    debug_assert_eq!(f.channels(), 8);
    debug_assert_eq!(src.len() % 32, 0);
    let b0 = f.b0;
    fir_block::<8>(dst, src, gain, b0, &f.bval, &mut f.inns);
}

/// Filter one channel of an interleaved block with an arbitrary channel
/// count. Both buffers cover the full interleaved block.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn fir_process_stride(dst: &mut [f32], src: &[f32], gain: f32, f: &mut Fir, channel: usize) {
    let stride = f.channels();
    debug_assert!(channel < stride);
    let size = src.len() / stride;
    debug_assert_eq!(size % 4, 0);
    let b0 = f.b0;
    let bsize = f.bval.len();
    let bval = &f.bval;
    let inns = &mut f.inns;

    for ii in 0..size {
        let mut t = gain * b0 * src[ii * stride + channel];
        let mut bjj = 0;
        while ii + bjj < bsize {
            t += bval[bjj] * inns[(ii + bjj) * stride + channel];
            bjj += 1;
        }
        while bjj < bsize {
            t += gain * bval[bjj] * src[(ii + bjj - bsize) * stride + channel];
            bjj += 1;
        }
        dst[ii * stride + channel] = t;
    }

    if size >= bsize {
        for j in 0..bsize {
            inns[j * stride + channel] = gain * src[(size - bsize + j) * stride + channel];
        }
    } else {
        let keep = bsize - size;
        for j in 0..keep {
            inns[j * stride + channel] = inns[(j + size) * stride + channel];
        }
        for j in 0..size {
            inns[(keep + j) * stride + channel] = gain * src[j * stride + channel];
        }
    }
}

/// Filter an interleaved block of any length, auto-dispatching on the
/// kernel's channel count and stepping the non-multiple-of-4 remainder.
pub fn fir_process(dst: &mut [f32], src: &[f32], gain: f32, f: &mut Fir) {
    debug_assert_eq!(dst.len(), src.len());
    let channels = f.channels();
    let size = src.len() / channels;
    let valid = size - (size % 4);
    let split = valid * channels;

    if valid > 0 {
        match channels {
            1 => fir_process_x1(&mut dst[..split], &src[..split], gain, f),
            2 => fir_process_x2(&mut dst[..split], &src[..split], gain, f),
            3 => fir_process_x3(&mut dst[..split], &src[..split], gain, f),
            4 => fir_process_x4(&mut dst[..split], &src[..split], gain, f),
            8 => fir_process_x8(&mut dst[..split], &src[..split], gain, f),
            _ => {
                for ch in 0..channels {
                    fir_process_stride(&mut dst[..split], &src[..split], gain, f, ch);
                }
            }
        }
    }
    for ii in valid..size {
        let lo = ii * channels;
        let hi = lo + channels;
        fir_step(&mut dst[lo..hi], &src[lo..hi], gain, f);
    }
}
