//! Texture sampling: renders an image raster through the inverse of an
//! affine transformation, with bilinear interpolation where the mapping
//! is fractional.
//!
//! At construction the inverse transform is classified so rendering can
//! take the cheapest path: plain runs for identity mappings, pointer
//! stepping for integer mappings, and one- or two-axis interpolation
//! otherwise. Outside the image the texture either wraps (tiling) or is
//! transparent.

use log::debug;

use crate::basics::{wrap, IntRect, FULL_RECT, MAX_RENDER_LENGTH, MAX_SPAN_BITS};
use crate::fixed::Fixed32_32;
use crate::path::Path;
use crate::pixel::PixelFormat;
use crate::raster::RasterView;
use crate::renderer::Renderer;
use crate::span::SpanBuffer;
use crate::transform::AffineTransform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransformType {
    /// The transformation could not be inverted (extreme scaling);
    /// nothing is drawn.
    Invalid,
    /// Exact copy.
    Identity,
    /// Integer steps (90-degree rotations, integer translation).
    Integer,
    /// Horizontal upscaling; interpolate vertically per run.
    Upscale,
    /// Fractional horizontal mapping only.
    FractionalX,
    /// Fractional vertical mapping only.
    FractionalY,
    /// Interpolate every pixel.
    Arbitrary,
}

/// An image raster sampled through an affine transformation.
pub struct Texture<'a, T: PixelFormat> {
    pixels: &'a [T::Pixel],
    stride: i32,
    /// Index of the image rect's top-left pixel, so sample coordinates
    /// are zero-based within `image_bounds`.
    base: isize,
    image_bounds: IntRect,
    opaque: bool,
    wrap: bool,
    output_bounds: IntRect,
    transform_type: TransformType,
    dxx: Fixed32_32,
    dxy: Fixed32_32,
    dyx: Fixed32_32,
    dyy: Fixed32_32,
    ox: Fixed32_32,
    oy: Fixed32_32,
    hop: i32,
}

impl<'a, T: PixelFormat> Texture<'a, T> {
    /// Sample `image` (restricted to `source_rect`) under
    /// `transformation`. With `wrap` the image tiles the whole plane;
    /// otherwise everything outside the transformed image is transparent.
    pub fn new(
        image: RasterView<'a, T>,
        wrap: bool,
        transformation: &AffineTransform,
        source_rect: IntRect,
    ) -> Self {
        let image_bounds = image.bounds().calc_intersection(&source_rect);
        let (pixels, stride, origin) = image.raw_parts();
        let base = origin
            + (image_bounds.top - image.bounds().top) as isize * stride as isize
            + (image_bounds.left - image.bounds().left) as isize;

        let mut result = Texture {
            pixels,
            stride,
            base,
            image_bounds,
            opaque: image.is_opaque(),
            wrap,
            output_bounds: FULL_RECT,
            transform_type: TransformType::Invalid,
            dxx: Fixed32_32::ZERO,
            dxy: Fixed32_32::ZERO,
            dyx: Fixed32_32::ZERO,
            dyy: Fixed32_32::ZERO,
            ox: Fixed32_32::ZERO,
            oy: Fixed32_32::ZERO,
            hop: 0,
        };

        let mut inverse = *transformation;
        if !inverse.invert() {
            debug!("texture transformation is not invertible; rendering nothing");
            return result;
        }

        if !wrap {
            // Approximate output boundaries by transforming the image
            // rectangle, padded for interpolation margins.
            let mut p = Path::new();
            p.add_rect(
                (image_bounds.left - 1) as f64,
                (image_bounds.top - 1) as f64,
                (image_bounds.width + 1) as f64,
                (image_bounds.height + 1) as f64,
            );
            p.transform(transformation);
            let mut bounds = p.calc_int_bounds();
            bounds.left -= 1;
            bounds.top -= 1;
            bounds.width += 3;
            bounds.height += 3;
            result.output_bounds = bounds;
        }

        result.dxx = Fixed32_32::from_f64(inverse.matrix[0][0]);
        result.dxy = Fixed32_32::from_f64(inverse.matrix[1][0]);
        result.dyx = Fixed32_32::from_f64(inverse.matrix[0][1]);
        result.dyy = Fixed32_32::from_f64(inverse.matrix[1][1]);

        // Offset by the image corner in integer space so source clipping
        // stays exact.
        result.ox = Fixed32_32::from_f64(inverse.matrix[0][2])
            .add(Fixed32_32::from_parts(-image_bounds.left, 0));
        result.oy = Fixed32_32::from_f64(inverse.matrix[1][2])
            .add(Fixed32_32::from_parts(-image_bounds.top, 0));
        result.hop = result.dxy.high32() * stride + result.dxx.high32();

        let horizontal_interpolation = result.dxx.low32() != 0
            || result.dyx.low32() != 0
            || (result.ox.low32() >> 24) != 0;
        let vertical_interpolation = result.dxy.low32() != 0
            || result.dyy.low32() != 0
            || (result.oy.low32() >> 24) != 0;
        let no_interpolation = !horizontal_interpolation && !vertical_interpolation;

        result.transform_type = if result.dxx.high32() == 1
            && result.dxy.high32() == 0
            && result.dyx.high32() == 0
            && result.dyy.high32() == 1
            && no_interpolation
        {
            TransformType::Identity
        } else if no_interpolation {
            TransformType::Integer
        } else if result.dxx.high32() >= -1
            && result.dxx.high32() <= 0
            && result.dxy.high32() == 0
            && result.dxy.low32() == 0
        {
            TransformType::Upscale
        } else if !vertical_interpolation {
            TransformType::FractionalX
        } else if !horizontal_interpolation {
            TransformType::FractionalY
        } else {
            TransformType::Arbitrary
        };
        result
    }

    #[inline]
    fn sample(&self, offset: isize) -> T::Pixel {
        self.pixels[offset as usize]
    }

    fn calc_start_position(&self, x: i32, y: i32) -> (Fixed32_32, Fixed32_32) {
        match self.transform_type {
            TransformType::Identity => (
                Fixed32_32::from_parts(self.ox.high32() + x, 0),
                Fixed32_32::from_parts(self.oy.high32() + y, 0),
            ),
            TransformType::Integer => (
                Fixed32_32::from_parts(
                    self.ox.high32() + x * self.dxx.high32() + y * self.dyx.high32(),
                    0,
                ),
                Fixed32_32::from_parts(
                    self.oy.high32() + x * self.dxy.high32() + y * self.dyy.high32(),
                    0,
                ),
            ),
            _ => (
                self.ox.add(self.dxx.mul_i32(x)).add(self.dyx.mul_i32(y)),
                self.oy.add(self.dxy.mul_i32(x)).add(self.dyy.mul_i32(y)),
            ),
        }
    }

    /// Emit transparent pixels until the sample position enters the image
    /// (or the request ends). Wrapping instead folds the position into
    /// the image and consumes nothing.
    fn find_image(
        &self,
        length: i32,
        sx: &mut Fixed32_32,
        sy: &mut Fixed32_32,
        output: &mut SpanBuffer<T>,
    ) -> i32 {
        debug_assert!(length > 0);

        if self.wrap {
            *sx = Fixed32_32::from_parts(wrap(sx.high32(), self.image_bounds.width), sx.low32());
            *sy = Fixed32_32::from_parts(wrap(sy.high32(), self.image_bounds.height), sy.low32());
            return 0;
        }

        let col = sx.high32();
        let row = sy.high32();

        if self.transform_type == TransformType::Identity {
            let span_length = if row < 0
                || row >= self.image_bounds.height
                || col >= self.image_bounds.width
            {
                length
            } else {
                crate::basics::min_value(-col, length)
            };
            output.add_transparent(span_length);
            debug_assert_eq!(sx.low32(), 0);
            *sx = Fixed32_32::from_parts(col + span_length, 0);
            return span_length;
        }

        // Binary search for the longest run that stays outside the image
        // (like a long division, one power of two at a time).
        let mut span_length = 0;
        for shift in (0..=MAX_SPAN_BITS).rev() {
            let nx = sx.add(self.dxx.shift_left(shift));
            let ny = sy.add(self.dxy.shift_left(shift));
            if (col < -1 && nx.high32() < -1)
                || (col >= self.image_bounds.width && nx.high32() >= self.image_bounds.width)
                || (row < -1 && ny.high32() < -1)
                || (row >= self.image_bounds.height && ny.high32() >= self.image_bounds.height)
            {
                span_length += 1 << shift;
                if span_length >= length {
                    output.add_transparent(length);
                    return length;
                }
                *sx = nx;
                *sy = ny;
            }
        }

        // One step into the image.
        span_length += 1;
        *sx = sx.add(self.dxx);
        *sy = sy.add(self.dxy);

        output.add_transparent(span_length);
        span_length
    }

    /// Bilinear interpolation along the image border, sampling missing
    /// neighbors as transparent (or wrapped).
    fn interpolate_edge(
        &self,
        length: i32,
        sx: &mut Fixed32_32,
        sy: &mut Fixed32_32,
        output: &mut SpanBuffer<T>,
    ) -> i32 {
        debug_assert!(length > 0);

        let width = self.image_bounds.width;
        let height = self.image_bounds.height;
        let stride = self.stride as isize;
        let mut col = sx.high32();
        let mut row = sy.high32();
        let mut s = self.base + row as isize * stride + col as isize;
        let mut buffer = [T::transparent(); MAX_RENDER_LENGTH as usize];
        let mut count = 0usize;

        loop {
            let c00;
            let c10;
            let c01;
            let c11;
            if self.wrap {
                let x0 = if col >= 0 { 0 } else { width as isize };
                let x1 = if col + 1 < width {
                    1
                } else {
                    1 - width as isize
                };
                let y0 = if row >= 0 { 0 } else { height as isize * stride };
                let y1 = if row + 1 < height {
                    stride
                } else {
                    stride - height as isize * stride
                };
                c00 = self.sample(s + x0 + y0);
                c10 = self.sample(s + x1 + y0);
                c01 = self.sample(s + x0 + y1);
                c11 = self.sample(s + x1 + y1);
            } else {
                c00 = if col >= 0 && row >= 0 {
                    self.sample(s)
                } else {
                    T::transparent()
                };
                c10 = if col + 1 < width && row >= 0 {
                    self.sample(s + 1)
                } else {
                    T::transparent()
                };
                c01 = if col >= 0 && row + 1 < height {
                    self.sample(s + stride)
                } else {
                    T::transparent()
                };
                c11 = if col + 1 < width && row + 1 < height {
                    self.sample(s + stride + 1)
                } else {
                    T::transparent()
                };
            }

            let mut delta;
            loop {
                let col_fraction = sx.low32() >> 24;
                let row_fraction = sy.low32() >> 24;
                let argb0 = T::interpolate(c00, c10, col_fraction);
                let argb1 = T::interpolate(c01, c11, col_fraction);
                buffer[count] = T::interpolate(argb0, argb1, row_fraction);
                count += 1;
                delta = (self.hop + sx.add_carry(self.dxx)) as isize
                    + ((-sy.add_carry(self.dxy)) & self.stride) as isize;
                // The sample can stay put even across a row/column change
                // (a 1x1 image), so the position is compared directly.
                if sx.high32() != col || sy.high32() != row || count as i32 >= length {
                    break;
                }
            }

            s += delta;
            col = sx.high32();
            row = sy.high32();

            if count as i32 >= length
                || !(col >= -1 && col < width && row >= -1 && row < height)
                || !(col == -1 || col == width - 1 || row == -1 || row == height - 1)
            {
                break;
            }
        }

        output.add_slice(count as i32, &buffer[..count], self.wrap && self.opaque);
        count as i32
    }

    /// Produce pixels while the sample position stays strictly inside the
    /// image, using the classified fast path.
    fn interpolate_inside(
        &self,
        length: i32,
        sx: &mut Fixed32_32,
        sy: &mut Fixed32_32,
        output: &mut SpanBuffer<T>,
    ) -> i32 {
        debug_assert!(length > 0);

        let width = self.image_bounds.width;
        let height = self.image_bounds.height;
        let mut span_length = 0;

        if self.transform_type == TransformType::Identity {
            span_length = crate::basics::min_value(width - sx.high32(), length);
        } else {
            // Binary search for the longest run that stays inside.
            let mut ex = *sx;
            let mut ey = *sy;
            for shift in (0..=MAX_SPAN_BITS).rev() {
                let nx = ex.add(self.dxx.shift_left(shift));
                let ny = ey.add(self.dxy.shift_left(shift));
                if nx.high32() >= 0
                    && nx.high32() + 1 < width
                    && ny.high32() >= 0
                    && ny.high32() + 1 < height
                {
                    span_length += 1 << shift;
                    if span_length >= length {
                        span_length = length - 1;
                        break;
                    }
                    ex = nx;
                    ey = ny;
                }
            }
            span_length += 1;
        }

        let stride = self.stride as isize;
        let mut s = self.base + sy.high32() as isize * stride + sx.high32() as isize;
        match self.transform_type {
            TransformType::Identity => {
                let start = s as usize;
                output.add_slice(
                    span_length,
                    &self.pixels[start..start + span_length as usize],
                    self.opaque,
                );
                *sx = sx.add(Fixed32_32::from_parts(span_length, 0));
            }

            TransformType::Integer => {
                let pixels = output.add_variable(span_length, self.opaque);
                for p in pixels.iter_mut() {
                    *p = self.sample(s);
                    s += self.hop as isize;
                }
                *sx = sx.add(Fixed32_32::from_parts(span_length * self.dxx.high32(), 0));
                *sy = sy.add(Fixed32_32::from_parts(span_length * self.dxy.high32(), 0));
            }

            TransformType::Upscale => {
                let pixels = output.add_variable(span_length, self.opaque);
                let mut i = 0usize;
                while (i as i32) < span_length {
                    let row_fraction = sy.low32() >> 24;
                    let argb0 = T::interpolate(self.sample(s), self.sample(s + stride), row_fraction);
                    let argb1 =
                        T::interpolate(self.sample(s + 1), self.sample(s + stride + 1), row_fraction);
                    let mut delta;
                    loop {
                        pixels[i] = T::interpolate(argb0, argb1, sx.low32() >> 24);
                        delta = self.hop + sx.add_carry(self.dxx);
                        i += 1;
                        if i as i32 >= span_length || delta != 0 {
                            break;
                        }
                    }
                    s += delta as isize;
                }
            }

            TransformType::FractionalX => {
                let pixels = output.add_variable(span_length, self.opaque);
                for p in pixels.iter_mut() {
                    *p = T::interpolate(self.sample(s), self.sample(s + 1), sx.low32() >> 24);
                    s += (self.hop + sx.add_carry(self.dxx)) as isize;
                }
                *sy = sy.add(Fixed32_32::from_parts(span_length * self.dxy.high32(), 0));
            }

            TransformType::FractionalY => {
                let pixels = output.add_variable(span_length, self.opaque);
                for p in pixels.iter_mut() {
                    *p = T::interpolate(self.sample(s), self.sample(s + stride), sy.low32() >> 24);
                    s += self.hop as isize + ((-sy.add_carry(self.dxy)) & self.stride) as isize;
                }
                *sx = sx.add(Fixed32_32::from_parts(span_length * self.dxx.high32(), 0));
            }

            TransformType::Arbitrary => {
                debug_assert!(
                    sx.high32() >= 0 && sx.high32() + 1 < width && sy.high32() >= 0
                        && sy.high32() + 1 < height
                );
                let pixels = output.add_variable(span_length, self.opaque);
                for p in pixels.iter_mut() {
                    let col_fraction = sx.low32() >> 24;
                    let row_fraction = sy.low32() >> 24;
                    *p = T::interpolate_bilinear(
                        self.sample(s),
                        self.sample(s + 1),
                        self.sample(s + stride),
                        self.sample(s + stride + 1),
                        col_fraction,
                        row_fraction,
                    );
                    s += (self.hop + sx.add_carry(self.dxx)) as isize
                        + ((-sy.add_carry(self.dxy)) & self.stride) as isize;
                }
            }

            TransformType::Invalid => unreachable!(),
        }

        span_length
    }
}

impl<'a, T: PixelFormat> Renderer<T> for Texture<'a, T> {
    fn calc_bounds(&self) -> IntRect {
        self.output_bounds
    }

    fn render(&self, x: i32, y: i32, length: i32, output: &mut SpanBuffer<T>) {
        debug_assert!(0 < length && length <= MAX_RENDER_LENGTH);

        if self.transform_type == TransformType::Invalid
            || y < self.output_bounds.top
            || y >= self.output_bounds.calc_bottom()
            || x + length <= self.output_bounds.left
            || x >= self.output_bounds.calc_right()
        {
            output.add_transparent(length);
            return;
        }

        let (mut sx, mut sy) = self.calc_start_position(x, y);

        let (col_margin, row_margin) = match self.transform_type {
            TransformType::Identity | TransformType::Integer => (0, 0),
            TransformType::FractionalX => (1, 0),
            TransformType::FractionalY => (0, 1),
            _ => (1, 1),
        };

        let mut offset = 0;
        while offset < length {
            let col = sx.high32();
            let row = sy.high32();
            let span_length = if col < -col_margin
                || col >= self.image_bounds.width
                || row < -row_margin
                || row >= self.image_bounds.height
            {
                self.find_image(length - offset, &mut sx, &mut sy, output)
            } else if col < 0
                || col + col_margin >= self.image_bounds.width
                || row < 0
                || row + row_margin >= self.image_bounds.height
            {
                self.interpolate_edge(length - offset, &mut sx, &mut sy, output)
            } else {
                self.interpolate_inside(length - offset, &mut sx, &mut sy, output)
            };
            offset += span_length;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::Argb32;
    use crate::raster::SelfContainedRaster;
    use crate::renderer::tests::render_row;

    fn checker_image() -> SelfContainedRaster<Argb32> {
        let mut raster =
            SelfContainedRaster::<Argb32>::new(IntRect::new(0, 0, 4, 4), true).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                let p = if (x + y) % 2 == 0 { 0xFFFFFFFF } else { 0xFF000000 };
                raster.set_pixel(x, y, p);
            }
        }
        raster
    }

    #[test]
    fn test_identity_copies_image() {
        let image = checker_image();
        let texture = Texture::new(
            image.view(),
            false,
            &AffineTransform::identity(),
            FULL_RECT,
        );
        for y in 0..4 {
            assert_eq!(
                render_row(&texture, 0, y, 4),
                render_row(&image, 0, y, 4),
                "row {y}"
            );
        }
        // outside the image everything is transparent
        assert_eq!(render_row(&texture, 0, 10, 4), vec![0u32; 4]);
        assert_eq!(render_row(&texture, -8, 0, 4), vec![0u32; 4]);
    }

    #[test]
    fn test_identity_partial_overlap() {
        let image = checker_image();
        let texture = Texture::new(
            image.view(),
            false,
            &AffineTransform::identity(),
            FULL_RECT,
        );
        let row = render_row(&texture, -2, 0, 8);
        assert_eq!(row[0], 0);
        assert_eq!(row[1], 0);
        assert_eq!(row[2], image.get_pixel(0, 0));
        assert_eq!(row[5], image.get_pixel(3, 0));
        assert_eq!(row[6], 0);
    }

    #[test]
    fn test_integer_translation() {
        let image = checker_image();
        let transform = AffineTransform::identity().translate(10.0, 5.0);
        let texture = Texture::new(image.view(), false, &transform, FULL_RECT);
        assert_eq!(
            render_row(&texture, 10, 5, 4),
            render_row(&image, 0, 0, 4)
        );
    }

    #[test]
    fn test_wrap_tiles() {
        let image = checker_image();
        let texture = Texture::new(image.view(), true, &AffineTransform::identity(), FULL_RECT);
        assert_eq!(texture.calc_bounds(), FULL_RECT);
        let reference = render_row(&texture, 0, 1, 4);
        assert_eq!(render_row(&texture, 4, 1, 4), reference);
        assert_eq!(render_row(&texture, -4, 5, 4), reference);
        assert_eq!(render_row(&texture, 40, 41, 4), reference);
    }

    #[test]
    fn test_rotation_quarter_turn() {
        let image = checker_image();
        // rotate 90 degrees around the image center
        let transform =
            AffineTransform::identity().rotate_about(std::f64::consts::PI / 2.0, 2.0, 2.0);
        let texture = Texture::new(image.view(), false, &transform, FULL_RECT);
        // the inverse maps destination (x, y) to source (y, 4 - x); the
        // x = 0 column samples source row 4, which is outside
        for y in 0..4 {
            assert_eq!(render_row(&texture, 0, y, 1)[0], 0, "pixel (0, {y})");
            for x in 1..4 {
                let expected = image.get_pixel(y, 4 - x);
                assert_eq!(
                    render_row(&texture, x, y, 1)[0],
                    expected,
                    "pixel ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn test_fractional_translation_interpolates() {
        let mut raster =
            SelfContainedRaster::<Argb32>::new(IntRect::new(0, 0, 4, 1), false).unwrap();
        raster.set_pixel(1, 0, 0xFF000000);
        raster.set_pixel(2, 0, 0xFF000000);
        let transform = AffineTransform::identity().translate(0.5, 0.0);
        let texture = Texture::new(raster.view(), false, &transform, FULL_RECT);
        let row = render_row(&texture, 0, 0, 5);
        // the half-pixel shift blends each pair of neighbors: fully
        // black between the two black pixels, half-faded on each side
        assert_eq!(row[0], 0);
        assert_eq!(row[2], 0xFF000000);
        let blended = row[1] >> 24;
        assert!((0x7E..=0x81).contains(&blended), "alpha {blended:#X}");
        let blended = row[3] >> 24;
        assert!((0x7E..=0x81).contains(&blended), "alpha {blended:#X}");
    }

    #[test]
    fn test_upscale_doubles_image() {
        let mut raster =
            SelfContainedRaster::<Argb32>::new(IntRect::new(0, 0, 2, 2), true).unwrap();
        raster.set_pixel(0, 0, 0xFF000000);
        raster.set_pixel(1, 0, 0xFFFFFFFF);
        raster.set_pixel(0, 1, 0xFFFFFFFF);
        raster.set_pixel(1, 1, 0xFF000000);
        let transform = AffineTransform::identity().scale_uniform(2.0);
        let texture = Texture::new(raster.view(), false, &transform, FULL_RECT);
        let row = render_row(&texture, 0, 0, 4);
        assert_eq!(row[0], 0xFF000000);
        assert_eq!(row[1], 0xFF7F7F7F);
        assert_eq!(row[2], 0xFFFFFFFF);
        // the last column interpolates toward the transparent outside
        let alpha = row[3] >> 24;
        assert!((0x70..0xFF).contains(&alpha), "alpha {alpha:#X}");
    }

    #[test]
    fn test_non_invertible_renders_nothing() {
        let image = checker_image();
        let transform = AffineTransform::identity().scale(0.0, 1.0);
        let texture = Texture::new(image.view(), false, &transform, FULL_RECT);
        assert_eq!(render_row(&texture, 0, 0, 4), vec![0u32; 4]);
    }

    #[test]
    fn test_source_rect_restricts_sampling() {
        let image = checker_image();
        let texture = Texture::new(
            image.view(),
            false,
            &AffineTransform::identity(),
            IntRect::new(1, 1, 2, 2),
        );
        let row = render_row(&texture, 0, 1, 4);
        assert_eq!(row[0], 0);
        assert_eq!(row[1], image.get_pixel(1, 1));
        assert_eq!(row[2], image.get_pixel(2, 1));
        assert_eq!(row[3], 0);
    }
}
