//! Gradient coverage producers: a linear ramp between two points and an
//! elliptical radial falloff. Both emit `Mask8` coverage; pair them with
//! a color table through `Lookup` to get color gradients.
//!
//! Both evaluate incrementally in integer arithmetic and are careful to
//! produce bit-identical pixels regardless of how the caller slices a row
//! into render requests.

use std::sync::OnceLock;

use crate::basics::{
    min_value, round_to_int, IntRect, EPSILON, FULL_RECT, MAX_RENDER_LENGTH, RADIAL_SQRT_BITS,
};
use crate::error::{Error, Result};
use crate::pixel::Mask8;
use crate::renderer::Renderer;
use crate::span::SpanBuffer;

// ============================================================================
// LinearAscend
// ============================================================================

/// Coverage ascending linearly from 0 at the start point to 255 at the
/// end point, constant beyond either end. The ramp is evaluated in
/// 16-bit fixed point per pixel.
pub struct LinearAscend {
    start: i32,
    dx: i32,
    dy: i32,
}

impl LinearAscend {
    pub fn new(start_x: f64, start_y: f64, end_x: f64, end_y: f64) -> Self {
        let dx0 = end_x - start_x;
        let dy0 = end_y - start_y;
        let mut l = (dx0 * dx0 + dy0 * dy0).sqrt();
        if l != 0.0 {
            l = 1.0 / l;
        }
        l *= l * 65536.0;
        let dx = round_to_int(dx0 * l);
        let dy = round_to_int(dy0 * l);
        LinearAscend {
            start: round_to_int(-start_x * dx as f64 - start_y * dy as f64),
            dx,
            dy,
        }
    }
}

impl Renderer<Mask8> for LinearAscend {
    fn calc_bounds(&self) -> IntRect {
        FULL_RECT
    }

    fn render(&self, x: i32, y: i32, length: i32, output: &mut SpanBuffer<Mask8>) {
        debug_assert!(0 < length && length <= MAX_RENDER_LENGTH);

        let mut ki = self
            .start
            .wrapping_add(x.wrapping_mul(self.dx))
            .wrapping_add(y.wrapping_mul(self.dy));
        let dk = self.dx;

        let mut i = 0;
        while i < length {
            if ki <= 0 || ki >= 1 << 16 || dk == 0 {
                // Constant region left or right of the transition; find
                // where the ramp re-enters, if it does.
                let mut edge = length;
                if ki <= 0 && dk > 0 {
                    edge = min_value(i + 1 - ki / dk, length);
                } else if ki >= 1 << 16 && dk < 0 {
                    edge = min_value(i + 1 + (ki - (1 << 16)) / -dk, length);
                }
                debug_assert!(i < edge);
                output.add_solid(edge - i, min_value(max0(ki >> 8), 255) as u8);
                ki = ki.wrapping_add(dk.wrapping_mul(edge - i));
                i = edge;
            } else {
                let left_edge = i;
                let mut right_edge = length;
                if dk > 0 {
                    right_edge = min_value(i + ((1 << 16) - ki + (dk - 1)) / dk, length);
                } else if dk < 0 {
                    right_edge = min_value(i + (ki + (-dk - 1)) / -dk, length);
                }
                debug_assert!(i < right_edge);
                let pixels = output.add_variable(right_edge - left_edge, false);
                while i < right_edge {
                    debug_assert!((0..=255).contains(&(ki >> 8)));
                    pixels[(i - left_edge) as usize] = (ki >> 8) as u8;
                    ki = ki.wrapping_add(dk);
                    i += 1;
                }
                debug_assert!(i >= length || ki <= 0 || ki >= 1 << 16);
            }
        }
    }
}

#[inline]
fn max0(v: i32) -> i32 {
    if v > 0 {
        v
    } else {
        0
    }
}

// ============================================================================
// RadialAscend
// ============================================================================

/// Coverage falling off radially from 255 at the center to 0 at the
/// ellipse edge. `di` tracks the squared normalized distance in integer
/// form via second-order forward differencing; an inverse square-root
/// table turns it into coverage.
pub struct RadialAscend {
    center_x: f64,
    center_y: f64,
    width: f64,
    height: f64,
    hk: f64,
    wk: f64,
}

fn sqrt_table() -> &'static [u8; 1 << RADIAL_SQRT_BITS] {
    static TABLE: OnceLock<[u8; 1 << RADIAL_SQRT_BITS]> = OnceLock::new();
    TABLE.get_or_init(|| {
        // Inverted so that the center of the gradient maps to 255 and the
        // surroundings to full transparency.
        let mut table = [0u8; 1 << RADIAL_SQRT_BITS];
        let max = ((1usize << RADIAL_SQRT_BITS) - 1) as f64;
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = (255 - round_to_int((i as f64 / max).sqrt() * 255.0)) as u8;
        }
        table
    })
}

impl RadialAscend {
    /// `width` and `height` are the ellipse radii; their magnitudes must
    /// be in (0, 32767] or the fixed-point evaluation would overflow.
    pub fn new(center_x: f64, center_y: f64, width: f64, height: f64) -> Result<Self> {
        let w = width.abs();
        let h = height.abs();
        if !(w > 0.0) || w > 32767.0 {
            return Err(Error::RadiusOverflow(width));
        }
        if !(h > 0.0) || h > 32767.0 {
            return Err(Error::RadiusOverflow(height));
        }
        sqrt_table();
        Ok(RadialAscend {
            center_x,
            center_y,
            width: w,
            height: h,
            hk: (1u32 << 30) as f64 / (h * h),
            wk: (1u32 << 30) as f64 / (w * w),
        })
    }
}

impl Renderer<Mask8> for RadialAscend {
    fn calc_bounds(&self) -> IntRect {
        let left = (self.center_x - self.width).floor() as i32;
        let top = (self.center_y - self.height).floor() as i32;
        IntRect::new(
            left,
            top,
            (self.center_x + self.width).ceil() as i32 - left,
            (self.center_y + self.height).ceil() as i32 - top,
        )
    }

    fn render(&self, x: i32, y: i32, length: i32, output: &mut SpanBuffer<Mask8>) {
        debug_assert!(0 < length && length <= MAX_RENDER_LENGTH);
        let table = sqrt_table();

        // Left and right edge of the ellipse slice covering this row.
        let dy = y as f64 + 0.5 - self.center_y;
        let a = 1.0 - dy * dy / (self.height * self.height);
        let row_width = if a > EPSILON {
            self.width * a.sqrt()
        } else {
            0.0
        };
        let row_start = self.center_x - row_width;
        let row_start_int = round_to_int(row_start);
        let left_edge = min_value(max0(row_start_int - x), length);
        let right_edge = min_value(round_to_int(row_start + row_width * 2.0 - x as f64), length);

        let mut i = 0;
        while i < length {
            if i < left_edge || i >= right_edge {
                debug_assert!(i == 0 || i == right_edge);
                let edge = if i < left_edge { left_edge } else { length };
                output.add_transparent(edge - i);
                i = edge;
            } else {
                debug_assert_eq!(i, left_edge);

                let steps = x + i - row_start_int;
                debug_assert!(steps >= 0);
                let dx = row_start_int as f64 - self.center_x;
                let dpp = 2.0 * self.wk;
                let dp = (2.0 * dx - 1.0) * self.wk + dpp * 0.5;
                let d = dy * dy * self.hk + dx * dx * self.wk + dp * 0.5;
                debug_assert!(dpp >= 0.0);
                let dppi = (dpp + 0.5).floor() as u32;
                debug_assert!(steps < 1 << 16);
                let dp0 = round_to_int(dp);

                // steps * (steps + 1) / 2 without intermediate overflow
                let tri = if steps & 1 != 0 {
                    steps.wrapping_mul((steps + 1) >> 1)
                } else {
                    (steps >> 1).wrapping_mul(steps + 1)
                };
                let mut dpi = dp0.wrapping_add((steps as u32).wrapping_mul(dppi) as i32);
                let mut di = round_to_int(d)
                    .wrapping_add(steps.wrapping_mul(dp0))
                    .wrapping_add(dppi.wrapping_mul(tri as u32) as i32);

                let pixels = output.add_variable(right_edge - left_edge, false);
                let mut pi = 0usize;

                // Lead up to the next absolute x divisible by 4 so the
                // group-of-four precision choice below is the same no
                // matter how the row was sliced into requests.
                while (i + x) & 3 != 0 && i < right_edge {
                    pixels[pi] = radial_pixel_single(table, di);
                    pi += 1;
                    dpi = dpi.wrapping_add(dppi as i32);
                    di = di.wrapping_add(dpi);
                    i += 1;
                }
                while i + 4 <= right_edge {
                    let mut z0 = di;
                    dpi = dpi.wrapping_add(dppi as i32);
                    di = di.wrapping_add(dpi);
                    let mut z1 = di;
                    dpi = dpi.wrapping_add(dppi as i32);
                    di = di.wrapping_add(dpi);
                    let mut z2 = di;
                    dpi = dpi.wrapping_add(dppi as i32);
                    di = di.wrapping_add(dpi);
                    let mut z3 = di;
                    dpi = dpi.wrapping_add(dppi as i32);
                    di = di.wrapping_add(dpi);

                    let mut all_z = z0 | z1 | z2 | z3;
                    if all_z & !((1 << 30) - 1) != 0 {
                        z0 = clamp30(z0);
                        z1 = clamp30(z1);
                        z2 = clamp30(z2);
                        z3 = clamp30(z3);
                        all_z = z0 | z1 | z2 | z3;
                    }

                    // For small distances, shift the table input up by 8
                    // and the output down by 4 (the output factor is the
                    // square root of the input factor) for extra
                    // resolution near the center.
                    if all_z < 1 << (30 - 8) {
                        let sqrt_shift = (30 - RADIAL_SQRT_BITS) - 8;
                        pixels[pi] = (((255 << 4) - 255 + table[(z0 >> sqrt_shift) as usize] as i32)
                            >> 4) as u8;
                        pixels[pi + 1] = (((255 << 4) - 255
                            + table[(z1 >> sqrt_shift) as usize] as i32)
                            >> 4) as u8;
                        pixels[pi + 2] = (((255 << 4) - 255
                            + table[(z2 >> sqrt_shift) as usize] as i32)
                            >> 4) as u8;
                        pixels[pi + 3] = (((255 << 4) - 255
                            + table[(z3 >> sqrt_shift) as usize] as i32)
                            >> 4) as u8;
                    } else {
                        let sqrt_shift = 30 - RADIAL_SQRT_BITS;
                        pixels[pi] = table[(z0 >> sqrt_shift) as usize];
                        pixels[pi + 1] = table[(z1 >> sqrt_shift) as usize];
                        pixels[pi + 2] = table[(z2 >> sqrt_shift) as usize];
                        pixels[pi + 3] = table[(z3 >> sqrt_shift) as usize];
                    }

                    pi += 4;
                    i += 4;
                }
                while i < right_edge {
                    pixels[pi] = radial_pixel_single(table, di);
                    pi += 1;
                    dpi = dpi.wrapping_add(dppi as i32);
                    di = di.wrapping_add(dpi);
                    i += 1;
                }
            }
        }
    }
}

#[inline]
fn clamp30(z: i32) -> i32 {
    min_value(max0(z), (1 << 30) - 1)
}

#[inline]
fn radial_pixel_single(table: &[u8; 1 << RADIAL_SQRT_BITS], di: i32) -> u8 {
    let z = clamp30(di);
    let precision = ((z < 1 << (30 - 8)) as i32) << 2;
    let sqrt_shift = (30 - RADIAL_SQRT_BITS as i32) - precision - precision;
    (((255 << precision) - 255 + table[(z >> sqrt_shift) as usize] as i32) >> precision) as u8
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::tests::render_row;

    #[test]
    fn test_linear_ramp_endpoints_and_monotonicity() {
        let gradient = LinearAscend::new(0.0, 0.0, 100.0, 0.0);
        let row = render_row(&gradient, 0, 0, 101);
        assert_eq!(row[0], 0);
        assert_eq!(row[100], 0xFF);
        for pair in row.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn test_linear_constant_outside_transition() {
        let gradient = LinearAscend::new(10.0, 0.0, 20.0, 0.0);
        let row = render_row(&gradient, 0, 5, 40);
        assert!(row[..10].iter().all(|&p| p == 0));
        assert!(row[21..].iter().all(|&p| p == 0xFF));
    }

    #[test]
    fn test_linear_descending() {
        let gradient = LinearAscend::new(20.0, 0.0, 10.0, 0.0);
        let row = render_row(&gradient, 0, 0, 30);
        for pair in row.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
        assert_eq!(row[0], 0xFF);
        assert_eq!(row[29], 0);
    }

    #[test]
    fn test_linear_vertical_rows_are_solid() {
        let gradient = LinearAscend::new(0.0, 0.0, 0.0, 10.0);
        let mut output = SpanBuffer::<Mask8>::new();
        gradient.render(0, 5, 64, &mut output);
        // dx is zero, so the whole row is one solid span
        assert_eq!(output.span_at(0).length(), 64);
        assert!(output.span_at(0).is_solid());
    }

    #[test]
    fn test_linear_span_length_invariance() {
        let gradient = LinearAscend::new(3.0, 0.0, 47.0, 0.0);
        let whole = render_row(&gradient, 0, 0, 64);
        for chunk in [1i32, 3, 7, 16, 33] {
            let mut pieces = Vec::new();
            let mut x = 0;
            while x < 64 {
                let len = chunk.min(64 - x);
                pieces.extend(render_row(&gradient, x, 0, len));
                x += len;
            }
            assert_eq!(pieces, whole, "chunk size {chunk}");
        }
    }

    #[test]
    fn test_radial_rejects_bad_radii() {
        assert!(RadialAscend::new(0.0, 0.0, 0.0, 10.0).is_err());
        assert!(RadialAscend::new(0.0, 0.0, 10.0, 40000.0).is_err());
        assert!(RadialAscend::new(0.0, 0.0, 10.0, 10.0).is_ok());
    }

    #[test]
    fn test_radial_bounds() {
        let gradient = RadialAscend::new(10.0, 10.0, 5.0, 4.0).unwrap();
        assert_eq!(gradient.calc_bounds(), IntRect::new(5, 6, 10, 8));
    }

    #[test]
    fn test_radial_profile() {
        let gradient = RadialAscend::new(16.0, 16.5, 10.0, 10.0).unwrap();
        // the row through the center: bright middle, transparent outside
        let row = render_row(&gradient, 0, 16, 32);
        assert_eq!(row[0], 0);
        assert_eq!(row[31], 0);
        // half a pixel off the exact center: 255 * (1 - 0.5/10)
        assert!((240..=244).contains(&row[16]));
        // coverage decreases moving right from the center
        for x in 16..26 {
            assert!(row[x + 1] <= row[x], "column {x}");
        }
        // a row outside the ellipse is fully transparent
        assert!(render_row(&gradient, 0, 30, 32).iter().all(|&p| p == 0));
    }

    #[test]
    fn test_radial_span_length_invariance() {
        let gradient = RadialAscend::new(16.0, 16.5, 12.0, 9.0).unwrap();
        for y in [8, 12, 16, 20] {
            let whole = render_row(&gradient, 0, y, 40);
            for chunk in [1i32, 5, 11, 17] {
                let mut pieces = Vec::new();
                let mut x = 0;
                while x < 40 {
                    let len = chunk.min(40 - x);
                    pieces.extend(render_row(&gradient, x, y, len));
                    x += len;
                }
                assert_eq!(pieces, whole, "row {y} chunk {chunk}");
            }
        }
    }
}
