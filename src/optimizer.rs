//! Span re-analysis: turns variable spans that secretly contain constant
//! or fully opaque runs back into solid/opaque spans, so downstream
//! operators can take their fast paths. Useful between an expensive
//! producer (texture sampling) and a consumer that benefits from span
//! flags (blending into a raster).

use crate::basics::{IntRect, MAX_RENDER_LENGTH};
use crate::pixel::PixelFormat;
use crate::renderer::Renderer;
use crate::span::SpanBuffer;

/// Wraps a source renderer and re-analyzes its variable spans.
pub struct Optimizer<'a, T: PixelFormat> {
    source: &'a dyn Renderer<T>,
}

impl<'a, T: PixelFormat> Optimizer<'a, T> {
    pub fn new(source: &'a dyn Renderer<T>) -> Self {
        Optimizer { source }
    }
}

fn output_variable<T: PixelFormat>(
    pixels: &[T::Pixel],
    begin: usize,
    end: usize,
    opaque: bool,
    output: &mut SpanBuffer<T>,
) -> usize {
    if end > begin {
        output.add_slice((end - begin) as i32, &pixels[begin..end], opaque);
    }
    end
}

/// Consume a constant run of at least four pixels starting at `begin`.
fn analyze_solid<T: PixelFormat>(
    pixels: &[T::Pixel],
    begin: usize,
    output: &mut SpanBuffer<T>,
) -> usize {
    debug_assert!(begin + 4 <= pixels.len());
    debug_assert!(
        pixels[begin + 1] == pixels[begin]
            && pixels[begin + 2] == pixels[begin]
            && pixels[begin + 3] == pixels[begin]
    );
    let mut p = begin + 4;
    while p != pixels.len() && pixels[p] == pixels[begin] {
        p += 1;
    }
    output.add_solid((p - begin) as i32, pixels[begin]);
    p
}

#[inline]
fn four_equal<T: PixelFormat>(pixels: &[T::Pixel], p: usize) -> bool {
    p + 4 <= pixels.len()
        && pixels[p + 1] == pixels[p]
        && pixels[p + 2] == pixels[p]
        && pixels[p + 3] == pixels[p]
}

/// Consume opaque pixels starting at `start`, extracting solid runs.
/// Returns the index of the first non-opaque pixel (or the end).
fn analyze_opaque<T: PixelFormat>(
    pixels: &[T::Pixel],
    start: usize,
    output: &mut SpanBuffer<T>,
) -> usize {
    let end = pixels.len();
    let mut begin = start;
    let mut p = start;
    while p != end && T::is_opaque(pixels[p]) {
        if four_equal::<T>(pixels, p) {
            let flushed = output_variable(pixels, begin, p, true, output);
            p = analyze_solid(pixels, flushed, output);
            begin = p;
        } else {
            p += 1;
        }
    }
    output_variable(pixels, begin, p, true, output)
}

/// Consume a whole variable span with no opacity guarantee, extracting
/// solid and opaque runs as they appear.
fn analyze_non_opaque<T: PixelFormat>(pixels: &[T::Pixel], output: &mut SpanBuffer<T>) {
    let end = pixels.len();
    let mut begin = 0;
    let mut p = 0;
    while p != end {
        if four_equal::<T>(pixels, p) {
            let flushed = output_variable(pixels, begin, p, false, output);
            p = analyze_solid(pixels, flushed, output);
            begin = p;
        } else if p + 4 <= end
            && T::is_opaque(pixels[p])
            && T::is_opaque(pixels[p + 1])
            && T::is_opaque(pixels[p + 2])
            && T::is_opaque(pixels[p + 3])
        {
            let flushed = output_variable(pixels, begin, p, false, output);
            p = analyze_opaque(pixels, flushed, output);
            begin = p;
        } else {
            p += 1;
        }
    }
    output_variable(pixels, begin, p, false, output);
}

impl<'a, T: PixelFormat> Renderer<T> for Optimizer<'a, T> {
    fn calc_bounds(&self) -> IntRect {
        self.source.calc_bounds()
    }

    fn render(&self, x: i32, y: i32, length: i32, output: &mut SpanBuffer<T>) {
        debug_assert!(0 < length && length <= MAX_RENDER_LENGTH);
        let mut input = SpanBuffer::<T>::new();
        self.source.render(x, y, length, &mut input);
        let mut pos = input.begin();
        while pos != input.end() {
            let span = input.span_at(pos);
            let span_length = span.length();
            if span.is_solid() {
                output.add_from(&input, pos);
            } else {
                let pixels = input.variable_pixels(pos, span_length);
                if span.is_opaque() {
                    let consumed = analyze_opaque(pixels, 0, output);
                    debug_assert_eq!(consumed, pixels.len());
                } else {
                    analyze_non_opaque(pixels, output);
                }
            }
            pos += span_length as usize;
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

    fn raster_from_row(row: &[u32]) -> SelfContainedRaster<Argb32> {
        let mut raster =
            SelfContainedRaster::<Argb32>::new(IntRect::new(0, 0, row.len() as i32, 1), false)
                .unwrap();
        for (x, &p) in row.iter().enumerate() {
            raster.set_pixel(x as i32, 0, p);
        }
        raster
    }

    #[test]
    fn test_constant_run_becomes_solid() {
        let raster = raster_from_row(&[0x80402010; 8]);
        let optimizer = Optimizer::new(&raster);
        let mut output = SpanBuffer::<Argb32>::new();
        optimizer.render(0, 0, 8, &mut output);
        let span = output.span_at(0);
        assert!(span.is_solid());
        assert_eq!(span.length(), 8);
        assert_eq!(output.solid_pixel(0), 0x80402010);
    }

    #[test]
    fn test_opaque_run_is_flagged() {
        let row = [
            0x10000000, 0xFF000001, 0xFF000002, 0xFF000003, 0xFF000004, 0x20000000, 0x20000001,
            0x20000002,
        ];
        let raster = raster_from_row(&row);
        let optimizer = Optimizer::new(&raster);
        let mut output = SpanBuffer::<Argb32>::new();
        optimizer.render(0, 0, 8, &mut output);
        // leading non-opaque pixel, then an opaque variable run, then the rest
        let first = output.span_at(0);
        assert!(!first.is_solid());
        assert!(!first.is_opaque());
        assert_eq!(first.length(), 1);
        let second = output.span_at(1);
        assert!(second.is_opaque());
        assert!(!second.is_solid());
        assert_eq!(second.length(), 4);
    }

    #[test]
    fn test_output_pixels_unchanged() {
        let row = [
            0x11111111, 0x22222222, 0x22222222, 0x22222222, 0x22222222, 0x33333333, 0x44444444,
            0x55555555,
        ];
        let raster = raster_from_row(&row);
        let optimizer = Optimizer::new(&raster);
        assert_eq!(render_row(&optimizer, 0, 0, 8), render_row(&raster, 0, 0, 8));
    }
}
