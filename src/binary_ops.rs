//! Binary span operators: alpha blending, saturating addition, and
//! per-pixel multiplication.
//!
//! Each operator pulls its right-hand input into a scratch buffer, trims
//! runs that its identity laws decide outright (fully opaque overlay,
//! maximum or transparent masks), renders the left-hand input only for the
//! remaining range, and walks both span streams in lockstep, splitting
//! spans so matched pairs have equal length.

use crate::basics::{IntRect, MAX_RENDER_LENGTH};
use crate::pixel::{MultiplyBy, PixelFormat};
use crate::renderer::Renderer;
use crate::span::{align_spans, SpanBuffer};

/// `target[i] = blend(background[i], foreground)` with a 4-wide unroll.
fn blend_solid_to_pixels<T: PixelFormat>(
    target: &mut [T::Pixel],
    foreground: T::Pixel,
    background: &[T::Pixel],
) {
    let count = target.len();
    let mut i = 0;
    while i + 4 <= count {
        let a0 = background[i];
        let a1 = background[i + 1];
        let a2 = background[i + 2];
        let a3 = background[i + 3];
        target[i] = T::blend(a0, foreground);
        target[i + 1] = T::blend(a1, foreground);
        target[i + 2] = T::blend(a2, foreground);
        target[i + 3] = T::blend(a3, foreground);
        i += 4;
    }
    while i < count {
        target[i] = T::blend(background[i], foreground);
        i += 1;
    }
}

/// `target[i] = blend(background[i], foreground[i])` with a 4-wide unroll.
fn blend_pixels_to_pixels<T: PixelFormat>(
    target: &mut [T::Pixel],
    foreground: &[T::Pixel],
    background: &[T::Pixel],
) {
    let count = target.len();
    let mut i = 0;
    while i + 4 <= count {
        let a0 = background[i];
        let a1 = background[i + 1];
        let a2 = background[i + 2];
        let a3 = background[i + 3];
        let b0 = foreground[i];
        let b1 = foreground[i + 1];
        let b2 = foreground[i + 2];
        let b3 = foreground[i + 3];
        target[i] = T::blend(a0, b0);
        target[i + 1] = T::blend(a1, b1);
        target[i + 2] = T::blend(a2, b2);
        target[i + 3] = T::blend(a3, b3);
        i += 4;
    }
    while i < count {
        target[i] = T::blend(background[i], foreground[i]);
        i += 1;
    }
}

/// True when the buffer holds exactly one span and it is solid transparent.
fn is_single_transparent<T: PixelFormat>(buffer: &SpanBuffer<T>) -> bool {
    buffer.end() > 0
        && buffer.span_at(0).length() as usize == buffer.end()
        && buffer.is_span_transparent(0)
}

/// True when the buffer holds exactly one span and it is solid maximum.
fn is_single_maximum<T: PixelFormat>(buffer: &SpanBuffer<T>) -> bool {
    buffer.end() > 0
        && buffer.span_at(0).length() as usize == buffer.end()
        && buffer.is_span_maximum(0)
}

// ============================================================================
// Blender
// ============================================================================

/// Porter-Duff "over": the overlay `b` composited onto the background `a`.
/// Input bounds are cached at construction.
pub struct Blender<'a, T: PixelFormat> {
    renderer_a: &'a dyn Renderer<T>,
    renderer_b: &'a dyn Renderer<T>,
    bounds_a: IntRect,
    bounds_b: IntRect,
}

impl<'a, T: PixelFormat> Blender<'a, T> {
    /// `renderer_a` is the background, `renderer_b` the overlay.
    pub fn new(renderer_a: &'a dyn Renderer<T>, renderer_b: &'a dyn Renderer<T>) -> Self {
        Blender {
            bounds_a: renderer_a.calc_bounds(),
            bounds_b: renderer_b.calc_bounds(),
            renderer_a,
            renderer_b,
        }
    }
}

impl<'a, T: PixelFormat> Renderer<T> for Blender<'a, T> {
    fn calc_bounds(&self) -> IntRect {
        self.bounds_a.calc_union(&self.bounds_b)
    }

    fn render(&self, x: i32, y: i32, length: i32, output: &mut SpanBuffer<T>) {
        debug_assert!(0 < length && length <= MAX_RENDER_LENGTH);

        let intersects = |b: &IntRect| {
            y >= b.top && y <= b.top + b.height && x + length > b.left && x < b.left + b.width
        };
        let intersects_a = intersects(&self.bounds_a);
        let intersects_b = intersects(&self.bounds_b);
        if !intersects_a && !intersects_b {
            output.add_transparent(length);
            return;
        } else if !intersects_b {
            self.renderer_a.render(x, y, length, output);
            return;
        } else if !intersects_a {
            self.renderer_b.render(x, y, length, output);
            return;
        }

        let mut spans_b = SpanBuffer::<T>::new();
        self.renderer_b.render(x, y, length, &mut spans_b);
        if is_single_transparent(&spans_b) {
            self.renderer_a.render(x, y, length, output);
            return;
        }

        // Fully opaque overlay runs at either end replace the background
        // outright, so the background is only pulled for the middle.
        let mut x = x;
        let mut right = x + length;
        let mut begin_b = spans_b.begin();
        let end_b = spans_b.end();
        while begin_b != end_b && spans_b.span_at(begin_b).is_opaque() {
            x += spans_b.span_at(begin_b).length();
            output.add_from(&spans_b, begin_b);
            begin_b += spans_b.span_at(begin_b).length() as usize;
        }
        let mut trimmed_end = end_b;
        while trimmed_end != begin_b && {
            let prev = spans_b.prev_pos(trimmed_end);
            spans_b.span_at(prev).is_opaque()
        } {
            trimmed_end = spans_b.prev_pos(trimmed_end);
            right -= spans_b.span_at(trimmed_end).length();
        }

        let mut spans_a = SpanBuffer::<T>::new();
        if x < right {
            self.renderer_a.render(x, y, right - x, &mut spans_a);
        }

        let mut it_a = spans_a.begin();
        let mut it_b = begin_b;
        while it_a != spans_a.end() {
            debug_assert!(it_b != end_b);
            align_spans(&mut spans_a, it_a, &mut spans_b, it_b);
            let span_a = spans_a.span_at(it_a);
            let span_b = spans_b.span_at(it_b);
            let span_length = span_a.length();
            if spans_b.is_span_transparent(it_b) {
                output.add_from(&spans_a, it_a);
            } else if span_b.is_opaque() {
                output.add_from(&spans_b, it_b);
            } else if span_a.is_solid() && span_b.is_solid() {
                output.add_solid(
                    span_length,
                    T::blend(spans_a.solid_pixel(it_a), spans_b.solid_pixel(it_b)),
                );
            } else {
                let opaque = span_a.is_opaque();
                if span_a.is_solid() {
                    let pixel_a = spans_a.solid_pixel(it_a);
                    let pixels = output.add_variable(span_length, opaque);
                    let pixels_b = spans_b.variable_pixels(it_b, span_length);
                    let count = span_length as usize;
                    let mut i = 0;
                    while i + 4 <= count {
                        let b0 = pixels_b[i];
                        let b1 = pixels_b[i + 1];
                        let b2 = pixels_b[i + 2];
                        let b3 = pixels_b[i + 3];
                        pixels[i] = T::blend(pixel_a, b0);
                        pixels[i + 1] = T::blend(pixel_a, b1);
                        pixels[i + 2] = T::blend(pixel_a, b2);
                        pixels[i + 3] = T::blend(pixel_a, b3);
                        i += 4;
                    }
                    while i < count {
                        pixels[i] = T::blend(pixel_a, pixels_b[i]);
                        i += 1;
                    }
                } else if span_b.is_solid() {
                    let pixel_b = spans_b.solid_pixel(it_b);
                    let pixels = output.add_variable(span_length, opaque);
                    blend_solid_to_pixels::<T>(
                        pixels,
                        pixel_b,
                        spans_a.variable_pixels(it_a, span_length),
                    );
                } else {
                    let pixels = output.add_variable(span_length, opaque);
                    blend_pixels_to_pixels::<T>(
                        pixels,
                        spans_b.variable_pixels(it_b, span_length),
                        spans_a.variable_pixels(it_a, span_length),
                    );
                }
            }
            it_a += span_length as usize;
            it_b += span_length as usize;
        }
        let mut tail = trimmed_end;
        while tail != end_b {
            output.add_from(&spans_b, tail);
            tail += spans_b.span_at(tail).length() as usize;
        }
    }
}

// ============================================================================
// Adder
// ============================================================================

/// Channel-wise saturating addition of two renderers.
pub struct Adder<'a, T: PixelFormat> {
    renderer_a: &'a dyn Renderer<T>,
    renderer_b: &'a dyn Renderer<T>,
}

impl<'a, T: PixelFormat> Adder<'a, T> {
    pub fn new(renderer_a: &'a dyn Renderer<T>, renderer_b: &'a dyn Renderer<T>) -> Self {
        Adder {
            renderer_a,
            renderer_b,
        }
    }
}

impl<'a, T: PixelFormat> Renderer<T> for Adder<'a, T> {
    fn calc_bounds(&self) -> IntRect {
        self.renderer_a
            .calc_bounds()
            .calc_union(&self.renderer_b.calc_bounds())
    }

    fn render(&self, x: i32, y: i32, length: i32, output: &mut SpanBuffer<T>) {
        debug_assert!(0 < length && length <= MAX_RENDER_LENGTH);

        let mut spans_b = SpanBuffer::<T>::new();
        self.renderer_b.render(x, y, length, &mut spans_b);
        if is_single_transparent(&spans_b) {
            self.renderer_a.render(x, y, length, output);
            return;
        }

        // Saturated runs at either end stay saturated no matter what the
        // other input holds.
        let mut left_edge = x;
        let mut right_edge = x + length;
        let mut begin_b = spans_b.begin();
        let mut end_b = spans_b.end();
        while begin_b != end_b && spans_b.is_span_maximum(begin_b) {
            left_edge += spans_b.span_at(begin_b).length();
            begin_b += spans_b.span_at(begin_b).length() as usize;
        }
        while end_b != begin_b && {
            let prev = spans_b.prev_pos(end_b);
            spans_b.is_span_maximum(prev)
        } {
            end_b = spans_b.prev_pos(end_b);
            right_edge -= spans_b.span_at(end_b).length();
        }
        if left_edge - x > 0 {
            output.add_solid(left_edge - x, T::maximum());
        }

        let mut spans_a = SpanBuffer::<T>::new();
        if left_edge < right_edge {
            self.renderer_a
                .render(left_edge, y, right_edge - left_edge, &mut spans_a);
        }

        let mut it_a = spans_a.begin();
        let mut it_b = begin_b;
        while it_a != spans_a.end() {
            debug_assert!(it_b != end_b);
            align_spans(&mut spans_a, it_a, &mut spans_b, it_b);
            let span_a = spans_a.span_at(it_a);
            let span_b = spans_b.span_at(it_b);
            let span_length = span_a.length();
            if spans_a.is_span_maximum(it_a) || spans_b.is_span_transparent(it_b) {
                output.add_from(&spans_a, it_a);
            } else if spans_b.is_span_maximum(it_b) || spans_a.is_span_transparent(it_a) {
                output.add_from(&spans_b, it_b);
            } else if span_a.is_solid() && span_b.is_solid() {
                output.add_solid(
                    span_length,
                    T::add(spans_a.solid_pixel(it_a), spans_b.solid_pixel(it_b)),
                );
            } else {
                let opaque = span_a.is_opaque() || span_b.is_opaque();
                let pixels = output.add_variable(span_length, opaque);
                let count = span_length as usize;
                if span_a.is_solid() {
                    let pixel_a = spans_a.solid_pixel(it_a);
                    let pixels_b = spans_b.variable_pixels(it_b, span_length);
                    for i in 0..count {
                        pixels[i] = T::add(pixel_a, pixels_b[i]);
                    }
                } else if span_b.is_solid() {
                    let pixel_b = spans_b.solid_pixel(it_b);
                    let pixels_a = spans_a.variable_pixels(it_a, span_length);
                    for i in 0..count {
                        pixels[i] = T::add(pixels_a[i], pixel_b);
                    }
                } else {
                    let pixels_a = spans_a.variable_pixels(it_a, span_length);
                    let pixels_b = spans_b.variable_pixels(it_b, span_length);
                    for i in 0..count {
                        pixels[i] = T::add(pixels_a[i], pixels_b[i]);
                    }
                }
            }
            it_a += span_length as usize;
            it_b += span_length as usize;
        }
        if x + length - right_edge > 0 {
            output.add_solid(x + length - right_edge, T::maximum());
        }
    }
}

// ============================================================================
// Multiplier
// ============================================================================

/// Per-pixel multiplication, typically masking color by coverage.
pub struct Multiplier<'a, A: MultiplyBy<B>, B: PixelFormat> {
    renderer_a: &'a dyn Renderer<A>,
    renderer_b: &'a dyn Renderer<B>,
}

impl<'a, A: MultiplyBy<B>, B: PixelFormat> Multiplier<'a, A, B> {
    pub fn new(renderer_a: &'a dyn Renderer<A>, renderer_b: &'a dyn Renderer<B>) -> Self {
        Multiplier {
            renderer_a,
            renderer_b,
        }
    }
}

impl<'a, A: MultiplyBy<B>, B: PixelFormat> Renderer<A> for Multiplier<'a, A, B> {
    fn calc_bounds(&self) -> IntRect {
        self.renderer_a
            .calc_bounds()
            .calc_intersection(&self.renderer_b.calc_bounds())
    }

    fn render(&self, x: i32, y: i32, length: i32, output: &mut SpanBuffer<A>) {
        debug_assert!(0 < length && length <= MAX_RENDER_LENGTH);

        let mut spans_b = SpanBuffer::<B>::new();
        self.renderer_b.render(x, y, length, &mut spans_b);
        if is_single_maximum(&spans_b) {
            self.renderer_a.render(x, y, length, output);
            return;
        }

        // Transparent mask runs at either end wipe the output.
        let mut left_edge = x;
        let mut right_edge = x + length;
        let mut begin_b = spans_b.begin();
        let mut end_b = spans_b.end();
        while begin_b != end_b && spans_b.is_span_transparent(begin_b) {
            left_edge += spans_b.span_at(begin_b).length();
            begin_b += spans_b.span_at(begin_b).length() as usize;
        }
        while end_b != begin_b && {
            let prev = spans_b.prev_pos(end_b);
            spans_b.is_span_transparent(prev)
        } {
            end_b = spans_b.prev_pos(end_b);
            right_edge -= spans_b.span_at(end_b).length();
        }
        if left_edge - x > 0 {
            output.add_transparent(left_edge - x);
        }

        let mut spans_a = SpanBuffer::<A>::new();
        if right_edge - left_edge > 0 {
            self.renderer_a
                .render(left_edge, y, right_edge - left_edge, &mut spans_a);
        }

        let mut it_a = spans_a.begin();
        let mut it_b = begin_b;
        while it_a != spans_a.end() {
            debug_assert!(it_b != end_b);
            align_spans(&mut spans_a, it_a, &mut spans_b, it_b);
            let span_a = spans_a.span_at(it_a);
            let span_b = spans_b.span_at(it_b);
            let span_length = span_a.length();
            if spans_a.is_span_transparent(it_a) || spans_b.is_span_maximum(it_b) {
                output.add_from(&spans_a, it_a);
            } else if spans_b.is_span_transparent(it_b) {
                output.add_transparent(span_length);
            } else if span_a.is_solid() && span_b.is_solid() {
                output.add_solid(
                    span_length,
                    A::multiply(spans_a.solid_pixel(it_a), spans_b.solid_pixel(it_b)),
                );
            } else {
                let opaque = span_a.is_opaque() && span_b.is_opaque();
                let pixels = output.add_variable(span_length, opaque);
                let count = span_length as usize;
                if span_a.is_solid() {
                    let pixel_a = spans_a.solid_pixel(it_a);
                    let pixels_b = spans_b.variable_pixels(it_b, span_length);
                    for i in 0..count {
                        pixels[i] = A::multiply(pixel_a, pixels_b[i]);
                    }
                } else if span_b.is_solid() {
                    let pixel_b = spans_b.solid_pixel(it_b);
                    let pixels_a = spans_a.variable_pixels(it_a, span_length);
                    for i in 0..count {
                        pixels[i] = A::multiply(pixels_a[i], pixel_b);
                    }
                } else {
                    let pixels_a = spans_a.variable_pixels(it_a, span_length);
                    let pixels_b = spans_b.variable_pixels(it_b, span_length);
                    for i in 0..count {
                        pixels[i] = A::multiply(pixels_a[i], pixels_b[i]);
                    }
                }
            }
            it_a += span_length as usize;
            it_b += span_length as usize;
        }

        if x + length - right_edge > 0 {
            output.add_transparent(x + length - right_edge);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::IntRect;
    use crate::pixel::{Argb32, Mask8};
    use crate::renderer::tests::render_row;
    use crate::renderer::{Solid, SolidRect};

    #[test]
    fn test_blender_bounds_union() {
        let a = SolidRect::<Argb32>::new(0xFF111111, IntRect::new(0, 0, 4, 4));
        let b = SolidRect::<Argb32>::new(0xFF222222, IntRect::new(10, 10, 4, 4));
        let blended = Blender::new(&a, &b);
        assert_eq!(blended.calc_bounds(), IntRect::new(0, 0, 14, 14));
    }

    #[test]
    fn test_blender_transparent_overlay_passes_background() {
        let background = Solid::<Argb32>::new(0xFF808080);
        let overlay = Solid::<Argb32>::new(0);
        let blended = Blender::new(&background, &overlay);
        assert_eq!(render_row(&blended, 0, 0, 4), vec![0xFF808080; 4]);
    }

    #[test]
    fn test_blender_opaque_overlay_replaces_background() {
        let background = Solid::<Argb32>::new(0xFF808080);
        let overlay = Solid::<Argb32>::new(0xFF123456);
        let blended = Blender::new(&background, &overlay);
        assert_eq!(render_row(&blended, 0, 0, 4), vec![0xFF123456; 4]);
    }

    #[test]
    fn test_blender_half_red_over_gray() {
        let background = Solid::<Argb32>::new(0xFF808080);
        let overlay = Solid::<Argb32>::new(0x80800000);
        let blended = Blender::new(&background, &overlay);
        assert_eq!(render_row(&blended, 0, 0, 4), vec![0xFFC04040; 4]);
    }

    #[test]
    fn test_blender_partial_overlay() {
        let background = Solid::<Argb32>::new(0xFF808080);
        let overlay = SolidRect::<Argb32>::new(0xFF000000, IntRect::new(1, 0, 2, 1));
        let blended = Blender::new(&background, &overlay);
        assert_eq!(
            render_row(&blended, 0, 0, 4),
            vec![0xFF808080, 0xFF000000, 0xFF000000, 0xFF808080]
        );
    }

    #[test]
    fn test_blender_mixed_solid_variable_spans() {
        // overlay alternates transparent/solid spans against a variable-ish
        // background composed of two rects
        let bg_left = SolidRect::<Argb32>::new(0xFF440000, IntRect::new(0, 0, 2, 1));
        let bg_right = SolidRect::<Argb32>::new(0xFF004400, IntRect::new(2, 0, 2, 1));
        let background = Blender::new(&bg_left, &bg_right);
        let overlay = SolidRect::<Argb32>::new(0x80400000, IntRect::new(1, 0, 2, 1));
        let blended = Blender::new(&background, &overlay);
        let row = render_row(&blended, 0, 0, 4);
        assert_eq!(row[0], 0xFF440000);
        assert_eq!(row[1], Argb32::blend(0xFF440000, 0x80400000));
        assert_eq!(row[2], Argb32::blend(0xFF004400, 0x80400000));
        assert_eq!(row[3], 0xFF004400);
    }

    #[test]
    fn test_adder_identities() {
        let p = SolidRect::<Mask8>::new(0x40, IntRect::new(0, 0, 4, 1));
        let transparent = Solid::<Mask8>::new(0);
        let maximum = Solid::<Mask8>::new(0xFF);

        let plus_zero = Adder::new(&p, &transparent);
        assert_eq!(render_row(&plus_zero, 0, 0, 4), vec![0x40; 4]);

        let plus_max = Adder::new(&p, &maximum);
        assert_eq!(render_row(&plus_max, 0, 0, 4), vec![0xFF; 4]);
    }

    #[test]
    fn test_adder_saturates() {
        let a = Solid::<Mask8>::new(0xC0);
        let b = SolidRect::<Mask8>::new(0xC0, IntRect::new(1, 0, 2, 1));
        let sum = Adder::new(&a, &b);
        assert_eq!(render_row(&sum, 0, 0, 4), vec![0xC0, 0xFF, 0xFF, 0xC0]);
    }

    #[test]
    fn test_multiplier_identities() {
        let p = SolidRect::<Argb32>::new(0x80402010, IntRect::new(0, 0, 4, 1));
        let maximum = Solid::<Mask8>::new(0xFF);
        let transparent = Solid::<Mask8>::new(0);

        let by_max: Multiplier<Argb32, Mask8> = Multiplier::new(&p, &maximum);
        assert_eq!(render_row(&by_max, 0, 0, 4), vec![0x80402010; 4]);

        let by_zero: Multiplier<Argb32, Mask8> = Multiplier::new(&p, &transparent);
        assert_eq!(render_row(&by_zero, 0, 0, 4), vec![0; 4]);
    }

    #[test]
    fn test_multiplier_masks_color() {
        let color = Solid::<Argb32>::new(0xFFFFFFFF);
        let mask = SolidRect::<Mask8>::new(0x7F, IntRect::new(1, 0, 1, 1));
        let masked: Multiplier<Argb32, Mask8> = Multiplier::new(&color, &mask);
        assert_eq!(render_row(&masked, 0, 0, 3), vec![0, 0x7F7F7F7F, 0]);
        assert_eq!(masked.calc_bounds(), IntRect::new(1, 0, 1, 1));
    }

    #[test]
    fn test_multiplier_mask_by_mask() {
        let a = Solid::<Mask8>::new(0x80);
        let b = Solid::<Mask8>::new(0x80);
        let product: Multiplier<Mask8, Mask8> = Multiplier::new(&a, &b);
        assert_eq!(render_row(&product, 0, 0, 2), vec![0x40; 2]);
    }
}
