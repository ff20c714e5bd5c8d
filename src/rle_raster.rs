//! Run-length encoded rasters: cached renderer output in compressed form.
//!
//! An `RLERaster` stores spans as 16-bit words (14-bit length plus solid
//! and opaque bits) with a per-row directory, so repeated rendering of
//! static content costs far less memory than a full pixel buffer. A
//! cursor memo makes sequential left-to-right, top-to-bottom rendering
//! O(spans); any other access order restarts from the row directory.

use std::cell::Cell;

use crate::basics::{min_value, IntRect, MAX_RENDER_LENGTH};
use crate::binary_ops::{Adder, Blender, Multiplier};
use crate::pixel::{MultiplyBy, PixelFormat};
use crate::renderer::{Renderer, Solid};
use crate::span::SpanBuffer;
use crate::unary_ops::Inverter;

const RLE_SOLID: u16 = 0x8000;
const RLE_OPAQUE: u16 = 0x4000;
const RLE_LENGTH_MASK: u16 = 0x3FFF;

/// A renderer cached into run-length encoded rows.
pub struct RLERaster<T: PixelFormat> {
    bounds: IntRect,
    spans: Vec<u16>,
    pixels: Vec<T::Pixel>,
    rows: Vec<(usize, usize)>,
    last_x: Cell<i32>,
    last_y: Cell<i32>,
    last_span_index: Cell<usize>,
    last_pixel_index: Cell<usize>,
    opaque: bool,
}

impl<T: PixelFormat> RLERaster<T> {
    /// Capture `source` over `bounds`.
    pub fn new(bounds: IntRect, source: &dyn Renderer<T>) -> Self {
        Self::build(bounds, source)
    }

    /// An empty (fully transparent) RLE raster.
    pub fn new_transparent(bounds: IntRect) -> Self {
        Self::build(bounds, &Solid::<T>::new(T::transparent()))
    }

    fn build(bounds: IntRect, source: &dyn Renderer<T>) -> Self {
        let mut result = RLERaster {
            bounds,
            spans: Vec::new(),
            pixels: Vec::new(),
            rows: Vec::new(),
            last_x: Cell::new(bounds.left),
            last_y: Cell::new(bounds.top),
            last_span_index: Cell::new(0),
            last_pixel_index: Cell::new(0),
            opaque: true,
        };

        let right = bounds.calc_right();
        let bottom = bounds.calc_bottom();
        for y in bounds.top..bottom {
            result.rows.push((result.spans.len(), result.pixels.len()));
            let mut first = true;
            let mut x = bounds.left;
            while x < right {
                let length = min_value(right - x, MAX_RENDER_LENGTH);
                let mut output = SpanBuffer::<T>::new();
                source.render(x, y, length, &mut output);
                let mut pos = output.begin();
                while pos != output.end() {
                    let span = output.span_at(pos);
                    let span_length = span.length();
                    debug_assert!(span_length < 0x4000);
                    let solid_span = span.is_solid();
                    let opaque_span = span.is_opaque();
                    let encoded = span_length as u16
                        | if solid_span { RLE_SOLID } else { 0 }
                        | if opaque_span { RLE_OPAQUE } else { 0 };
                    let can_merge = !first
                        && (encoded & 0xC000) == (*result.spans.last().unwrap() & 0xC000)
                        && (!solid_span
                            || output.solid_pixel(pos) == *result.pixels.last().unwrap())
                        && ((result.spans.last().unwrap() & RLE_LENGTH_MASK) as i32 + span_length)
                            < 0x4000;
                    if can_merge {
                        *result.spans.last_mut().unwrap() += span_length as u16;
                        if !solid_span {
                            result
                                .pixels
                                .extend_from_slice(output.variable_pixels(pos, span_length));
                        }
                    } else {
                        result.spans.push(encoded);
                        if solid_span {
                            result.pixels.push(output.solid_pixel(pos));
                        } else {
                            result
                                .pixels
                                .extend_from_slice(output.variable_pixels(pos, span_length));
                        }
                    }
                    if !opaque_span {
                        result.opaque = false;
                    }
                    first = false;
                    pos += span_length as usize;
                }
                x += length;
            }
        }
        if result.rows.is_empty() {
            result.opaque = false;
        }
        result
    }

    /// Replace the contents by re-capturing `source` over the same bounds.
    pub fn fill(&mut self, source: &dyn Renderer<T>) {
        *self = Self::build(self.bounds, source);
    }

    /// Blend `source` over the current contents.
    pub fn blend_in(&mut self, source: &dyn Renderer<T>) {
        let rebuilt = {
            let blended = Blender::new(&*self, source);
            Self::build(self.bounds, &blended)
        };
        *self = rebuilt;
    }

    /// Saturating-add `source` onto the current contents.
    pub fn add_in(&mut self, source: &dyn Renderer<T>) {
        let rebuilt = {
            let added = Adder::new(&*self, source);
            Self::build(self.bounds, &added)
        };
        *self = rebuilt;
    }

    /// Multiply the current contents by `source`.
    pub fn multiply_in<B: PixelFormat>(&mut self, source: &dyn Renderer<B>)
    where
        T: MultiplyBy<B>,
    {
        let rebuilt = {
            let multiplied = Multiplier::new(&*self, source);
            Self::build(self.bounds, &multiplied)
        };
        *self = rebuilt;
    }

    /// Invert the current contents channel-wise.
    pub fn invert_contents(&mut self) {
        let rebuilt = {
            let inverted = Inverter::new(&*self);
            Self::build(self.bounds, &inverted)
        };
        *self = rebuilt;
    }

    /// True when every stored span was produced with full alpha.
    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    /// Compressed size in stored span words (diagnostics and tests).
    pub fn span_count(&self) -> usize {
        self.spans.len()
    }
}

impl<T: PixelFormat> Renderer<T> for RLERaster<T> {
    fn calc_bounds(&self) -> IntRect {
        self.bounds
    }

    fn render(&self, x: i32, y: i32, length: i32, output: &mut SpanBuffer<T>) {
        debug_assert!(0 < length && length <= MAX_RENDER_LENGTH);
        let mut x = x;
        let mut length = length;
        if y >= self.bounds.top && y < self.bounds.calc_bottom() {
            if x < self.bounds.left {
                let c = min_value(self.bounds.left - x, length);
                output.add_transparent(c);
                x += c;
                length -= c;
            }
            debug_assert!(length >= 0);
            let (mut span_index, mut pixel_index, mut sx) =
                if y != self.last_y.get() || x < self.last_x.get() {
                    let row = self.rows[(y - self.bounds.top) as usize];
                    (row.0, row.1, self.bounds.left)
                } else {
                    (
                        self.last_span_index.get(),
                        self.last_pixel_index.get(),
                        self.last_x.get(),
                    )
                };
            let right = self.bounds.calc_right();
            while length > 0 && x < right {
                let mut c = min_value(right - x, length);
                let mut l = (self.spans[span_index] & RLE_LENGTH_MASK) as i32;
                while x >= sx + l {
                    sx += l;
                    pixel_index += if self.spans[span_index] & RLE_SOLID != 0 {
                        1
                    } else {
                        l as usize
                    };
                    span_index += 1;
                    debug_assert!(pixel_index < self.pixels.len());
                    debug_assert!(span_index < self.spans.len());
                    l = (self.spans[span_index] & RLE_LENGTH_MASK) as i32;
                }
                c = min_value(c, sx + l - x);
                if self.spans[span_index] & RLE_SOLID != 0 {
                    output.add_solid(c, self.pixels[pixel_index]);
                } else {
                    let start = pixel_index + (x - sx) as usize;
                    output.add_slice(
                        c,
                        &self.pixels[start..start + c as usize],
                        self.spans[span_index] & RLE_OPAQUE != 0,
                    );
                }
                x += c;
                length -= c;
            }
            self.last_x.set(sx);
            self.last_y.set(y);
            self.last_span_index.set(span_index);
            self.last_pixel_index.set(pixel_index);
        }
        if length > 0 {
            output.add_transparent(length);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::{Argb32, Mask8};
    use crate::renderer::tests::render_row;
    use crate::renderer::SolidRect;

    #[test]
    fn test_round_trip_matches_source() {
        let rect = SolidRect::<Mask8>::new(0x80, IntRect::new(2, 1, 3, 2));
        let rle = RLERaster::new(IntRect::new(0, 0, 8, 4), &rect);
        for y in 0..4 {
            assert_eq!(
                render_row(&rle, 0, y, 8),
                render_row(&rect, 0, y, 8),
                "row {y}"
            );
        }
        assert!(!rle.is_opaque());
    }

    #[test]
    fn test_transparent_constructor() {
        let rle = RLERaster::<Argb32>::new_transparent(IntRect::new(0, 0, 4, 2));
        assert_eq!(render_row(&rle, 0, 0, 4), vec![0u32; 4]);
    }

    #[test]
    fn test_sequential_and_random_access_agree() {
        let rect = SolidRect::<Mask8>::new(0xAA, IntRect::new(1, 0, 5, 2));
        let rle = RLERaster::new(IntRect::new(0, 0, 8, 2), &rect);
        // sequential pulls in small chunks
        let mut sequential = Vec::new();
        for x in (0..8).step_by(2) {
            sequential.extend(render_row(&rle, x, 1, 2));
        }
        // restart from a left coordinate after having advanced
        let restart = render_row(&rle, 0, 1, 8);
        assert_eq!(sequential, restart);
    }

    #[test]
    fn test_merges_adjacent_chunks() {
        // a row wider than one render chunk compresses into one solid span
        let rect = SolidRect::<Mask8>::new(0xFF, IntRect::new(0, 0, 400, 1));
        let rle = RLERaster::new(IntRect::new(0, 0, 400, 1), &rect);
        assert_eq!(rle.span_count(), 1);
        assert!(rle.is_opaque());
    }

    #[test]
    fn test_blend_in_and_invert() {
        let bounds = IntRect::new(0, 0, 4, 1);
        let mut rle = RLERaster::<Mask8>::new_transparent(bounds);
        let rect = SolidRect::<Mask8>::new(0x40, IntRect::new(1, 0, 2, 1));
        rle.blend_in(&rect);
        assert_eq!(render_row(&rle, 0, 0, 4), vec![0, 0x40, 0x40, 0]);
        rle.blend_in(&rect);
        assert_eq!(render_row(&rle, 0, 0, 4), vec![0, 0x80, 0x80, 0]);
        rle.invert_contents();
        assert_eq!(render_row(&rle, 0, 0, 4), vec![0xFF, 0x7F, 0x7F, 0xFF]);
    }

    #[test]
    fn test_multiply_in() {
        let bounds = IntRect::new(0, 0, 4, 1);
        let solid = SolidRect::<Mask8>::new(0x80, bounds);
        let mut rle = RLERaster::new(bounds, &solid);
        let mask = SolidRect::<Mask8>::new(0x80, IntRect::new(0, 0, 2, 1));
        rle.multiply_in(&mask);
        assert_eq!(render_row(&rle, 0, 0, 4), vec![0x40, 0x40, 0, 0]);
    }
}
