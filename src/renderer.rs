//! The renderer trait and the basic leaf/wrapper nodes.
//!
//! A renderer is anything that can produce pixel spans for an arbitrary
//! horizontal run. Rendering is pull-based: the consumer asks for a run of
//! up to [`MAX_RENDER_LENGTH`] pixels at a coordinate, and the renderer
//! appends spans totaling exactly that many pixels. Composite nodes
//! (blending, clipping, masking) recursively pull from their inputs.

use crate::basics::{min_value, IntRect, FULL_RECT, MAX_RENDER_LENGTH};
use crate::pixel::PixelFormat;
use crate::span::SpanBuffer;

/// A producer of pixel spans.
///
/// Renderer expression trees are DAGs of borrowed nodes; one tree is used
/// from one thread at a time. `render` must deposit spans totaling exactly
/// `length` pixels into `output`.
pub trait Renderer<T: PixelFormat> {
    /// Bounding rectangle outside which output is guaranteed transparent.
    /// Unbounded renderers return [`FULL_RECT`].
    fn calc_bounds(&self) -> IntRect;

    /// Produce `length` pixels starting at `(x, y)`.
    fn render(&self, x: i32, y: i32, length: i32, output: &mut SpanBuffer<T>);
}

impl<T: PixelFormat, R: Renderer<T> + ?Sized> Renderer<T> for &R {
    fn calc_bounds(&self) -> IntRect {
        (**self).calc_bounds()
    }

    fn render(&self, x: i32, y: i32, length: i32, output: &mut SpanBuffer<T>) {
        (**self).render(x, y, length, output)
    }
}

// ============================================================================
// Solid
// ============================================================================

/// Renders a single constant pixel value everywhere.
pub struct Solid<T: PixelFormat> {
    pixel: T::Pixel,
}

impl<T: PixelFormat> Solid<T> {
    pub fn new(pixel: T::Pixel) -> Self {
        debug_assert!(T::is_valid(pixel));
        Solid { pixel }
    }
}

impl<T: PixelFormat> Renderer<T> for Solid<T> {
    fn calc_bounds(&self) -> IntRect {
        FULL_RECT
    }

    fn render(&self, _x: i32, _y: i32, length: i32, output: &mut SpanBuffer<T>) {
        debug_assert!(0 < length && length <= MAX_RENDER_LENGTH);
        output.add_solid(length, self.pixel);
    }
}

// ============================================================================
// SolidRect
// ============================================================================

/// A solid color inside a rectangle, transparent outside it.
pub struct SolidRect<T: PixelFormat> {
    pixel: T::Pixel,
    rect: IntRect,
}

impl<T: PixelFormat> SolidRect<T> {
    pub fn new(pixel: T::Pixel, rect: IntRect) -> Self {
        debug_assert!(T::is_valid(pixel));
        SolidRect { pixel, rect }
    }
}

impl<T: PixelFormat> Renderer<T> for SolidRect<T> {
    fn calc_bounds(&self) -> IntRect {
        self.rect
    }

    fn render(&self, x: i32, y: i32, length: i32, output: &mut SpanBuffer<T>) {
        debug_assert!(0 < length && length <= MAX_RENDER_LENGTH);
        let mut x = x;
        let mut length = length;
        if y >= self.rect.top && y < self.rect.calc_bottom() {
            if x < self.rect.left {
                let c = min_value(self.rect.left - x, length);
                output.add_transparent(c);
                x += c;
                length -= c;
            }
            debug_assert!(length >= 0);
            if length > 0 && x < self.rect.calc_right() {
                let c = min_value(self.rect.calc_right() - x, length);
                output.add_solid(c, self.pixel);
                length -= c;
            }
        }
        if length > 0 {
            output.add_transparent(length);
        }
    }
}

// ============================================================================
// Clipper
// ============================================================================

/// Confines a source renderer's output to a rectangle; everything outside
/// is transparent.
pub struct Clipper<'a, T: PixelFormat> {
    source: &'a dyn Renderer<T>,
    rect: IntRect,
}

impl<'a, T: PixelFormat> Clipper<'a, T> {
    pub fn new(source: &'a dyn Renderer<T>, rect: IntRect) -> Self {
        Clipper { source, rect }
    }
}

impl<'a, T: PixelFormat> Renderer<T> for Clipper<'a, T> {
    fn calc_bounds(&self) -> IntRect {
        self.rect.calc_intersection(&self.source.calc_bounds())
    }

    fn render(&self, x: i32, y: i32, length: i32, output: &mut SpanBuffer<T>) {
        debug_assert!(0 < length && length <= MAX_RENDER_LENGTH);
        let mut x = x;
        let mut length = length;
        if y >= self.rect.top && y < self.rect.calc_bottom() {
            if x < self.rect.left {
                let c = min_value(self.rect.left - x, length);
                output.add_transparent(c);
                x += c;
                length -= c;
            }
            debug_assert!(length >= 0);
            if length > 0 && x < self.rect.calc_right() {
                let c = min_value(self.rect.calc_right() - x, length);
                self.source.render(x, y, c, output);
                length -= c;
            }
        }
        if length > 0 {
            output.add_transparent(length);
        }
    }
}

// ============================================================================
// Offsetter
// ============================================================================

/// Translates another renderer by an integer offset.
pub struct Offsetter<'a, T: PixelFormat> {
    source: &'a dyn Renderer<T>,
    offset_x: i32,
    offset_y: i32,
}

impl<'a, T: PixelFormat> Offsetter<'a, T> {
    pub fn new(source: &'a dyn Renderer<T>, offset_x: i32, offset_y: i32) -> Self {
        Offsetter {
            source,
            offset_x,
            offset_y,
        }
    }
}

impl<'a, T: PixelFormat> Renderer<T> for Offsetter<'a, T> {
    fn calc_bounds(&self) -> IntRect {
        self.source.calc_bounds().offset(self.offset_x, self.offset_y)
    }

    fn render(&self, x: i32, y: i32, length: i32, output: &mut SpanBuffer<T>) {
        debug_assert!(0 < length && length <= MAX_RENDER_LENGTH);
        self.source
            .render(x - self.offset_x, y - self.offset_y, length, output)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pixel::{Argb32, Mask8};

    /// Render one row into a flat pixel vector for easy assertions.
    pub(crate) fn render_row<T: PixelFormat, R: Renderer<T>>(
        renderer: &R,
        x: i32,
        y: i32,
        length: i32,
    ) -> Vec<T::Pixel> {
        let mut output = SpanBuffer::<T>::new();
        renderer.render(x, y, length, &mut output);
        assert_eq!(output.total_length(), length);
        let mut result = Vec::with_capacity(length as usize);
        let mut pos = output.begin();
        while pos != output.end() {
            let span = output.span_at(pos);
            if span.is_solid() {
                result.extend(std::iter::repeat(output.solid_pixel(pos)).take(span.length() as usize));
            } else {
                result.extend_from_slice(output.variable_pixels(pos, span.length()));
            }
            pos += span.length() as usize;
        }
        result
    }

    #[test]
    fn test_solid_renders_one_span() {
        let solid = Solid::<Argb32>::new(0xFF112233);
        let mut output = SpanBuffer::new();
        solid.render(-5, 100, 16, &mut output);
        assert_eq!(output.end(), 16);
        let span = output.span_at(0);
        assert!(span.is_solid());
        assert!(span.is_opaque());
        assert_eq!(output.solid_pixel(0), 0xFF112233);
        assert_eq!(solid.calc_bounds(), FULL_RECT);
    }

    #[test]
    fn test_solid_opaque_flag_follows_alpha() {
        let translucent = Solid::<Argb32>::new(0x80404040);
        let mut output = SpanBuffer::new();
        translucent.render(0, 0, 4, &mut output);
        assert!(!output.span_at(0).is_opaque());
    }

    #[test]
    fn test_solid_rect_clips() {
        let rect = IntRect::new(2, 0, 3, 2);
        let node = SolidRect::<Mask8>::new(0xFF, rect);
        assert_eq!(node.calc_bounds(), rect);
        assert_eq!(
            render_row(&node, 0, 0, 8),
            vec![0, 0, 0xFF, 0xFF, 0xFF, 0, 0, 0]
        );
        // row outside is fully transparent
        assert_eq!(render_row(&node, 0, 5, 8), vec![0; 8]);
        // request starting inside the rect
        assert_eq!(render_row(&node, 3, 1, 4), vec![0xFF, 0xFF, 0, 0]);
    }

    #[test]
    fn test_clipper() {
        let solid = Solid::<Mask8>::new(0xAA);
        let clipped = Clipper::new(&solid, IntRect::new(1, 1, 2, 1));
        assert_eq!(clipped.calc_bounds(), IntRect::new(1, 1, 2, 1));
        assert_eq!(render_row(&clipped, 0, 1, 5), vec![0, 0xAA, 0xAA, 0, 0]);
        assert_eq!(render_row(&clipped, 0, 0, 5), vec![0; 5]);
    }

    #[test]
    fn test_offsetter() {
        let rect = SolidRect::<Mask8>::new(0x55, IntRect::new(0, 0, 2, 1));
        let moved = Offsetter::new(&rect, 3, 1);
        assert_eq!(moved.calc_bounds(), IntRect::new(3, 1, 2, 1));
        assert_eq!(render_row(&moved, 0, 1, 6), vec![0, 0, 0, 0x55, 0x55, 0]);
        assert_eq!(render_row(&moved, 0, 0, 6), vec![0; 6]);
    }
}
