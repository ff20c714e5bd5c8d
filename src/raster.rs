//! Pixel rasters: in-memory buffers that can be rendered *from* (as span
//! sources) and rendered *to* (by pulling a renderer expression row by
//! row).
//!
//! [`Raster`] borrows caller-owned memory; [`SelfContainedRaster`] owns
//! its allocation. Strides are expressed in pixels and may be negative
//! for bottom-up buffers; in that case the slice's first row is the
//! bottommost one.

use crate::basics::{min_value, IntRect, MAX_RENDER_LENGTH};
use crate::error::{check_canvas_bounds, Result};
use crate::pixel::{MultiplyBy, PixelFormat};
use crate::renderer::Renderer;
use crate::span::SpanBuffer;

/// A read-only view of raster memory: enough to sample pixels and to
/// serve render requests. Copyable, so renderers like `Texture` can
/// snapshot it at construction.
#[derive(Clone, Copy)]
pub struct RasterView<'a, T: PixelFormat> {
    pixels: &'a [T::Pixel],
    stride: i32,
    origin: usize,
    bounds: IntRect,
    opaque: bool,
}

impl<'a, T: PixelFormat> RasterView<'a, T> {
    pub fn new(pixels: &'a [T::Pixel], stride: i32, bounds: IntRect, opaque: bool) -> Self {
        let origin = origin_for(stride, &bounds);
        debug_assert!(pixels.len() >= (bounds.width * bounds.height) as usize);
        RasterView {
            pixels,
            stride,
            origin,
            bounds,
            opaque,
        }
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        index_for(self.origin, self.stride, &self.bounds, x, y)
    }

    pub fn bounds(&self) -> IntRect {
        self.bounds
    }

    pub fn stride(&self) -> i32 {
        self.stride
    }

    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> T::Pixel {
        self.pixels[self.index(x, y)]
    }

    /// A horizontal run of `length` pixels starting at `(x, y)`.
    pub fn row_slice(&self, x: i32, y: i32, length: i32) -> &'a [T::Pixel] {
        let start = self.index(x, y);
        &self.pixels[start..start + length as usize]
    }

    /// Storage, stride, and the index of the bounds' top-left pixel.
    pub(crate) fn raw_parts(&self) -> (&'a [T::Pixel], i32, isize) {
        (self.pixels, self.stride, self.origin as isize)
    }
}

#[inline]
fn origin_for(stride: i32, bounds: &IntRect) -> usize {
    if stride >= 0 {
        0
    } else {
        ((bounds.height - 1) as isize * -stride as isize) as usize
    }
}

#[inline]
fn index_for(origin: usize, stride: i32, bounds: &IntRect, x: i32, y: i32) -> usize {
    debug_assert!(
        bounds.left <= x && x < bounds.calc_right() && bounds.top <= y && y < bounds.calc_bottom()
    );
    (origin as isize
        + (y - bounds.top) as isize * stride as isize
        + (x - bounds.left) as isize) as usize
}

/// Serve a span request from raster memory: transparent outside the
/// bounds, a copied pixel run inside.
fn render_view<T: PixelFormat>(
    view: &RasterView<'_, T>,
    x: i32,
    y: i32,
    length: i32,
    output: &mut SpanBuffer<T>,
) {
    debug_assert!(0 < length && length <= MAX_RENDER_LENGTH);
    let bounds = view.bounds;
    let mut x = x;
    let mut length = length;
    if y >= bounds.top && y < bounds.calc_bottom() {
        if x < bounds.left {
            let c = min_value(bounds.left - x, length);
            output.add_transparent(c);
            x += c;
            length -= c;
        }
        debug_assert!(length >= 0);
        if length > 0 && x < bounds.calc_right() {
            let c = min_value(bounds.calc_right() - x, length);
            output.add_slice(c, view.row_slice(x, y, c), view.opaque);
            length -= c;
        }
    }
    if length > 0 {
        output.add_transparent(length);
    }
}

impl<'a, T: PixelFormat> Renderer<T> for RasterView<'a, T> {
    fn calc_bounds(&self) -> IntRect {
        self.bounds
    }

    fn render(&self, x: i32, y: i32, length: i32, output: &mut SpanBuffer<T>) {
        render_view(self, x, y, length, output);
    }
}

// ============================================================================
// Raster
// ============================================================================

/// A raster over caller-owned memory. The slice covers exactly the bounds
/// area; the raster does not own it.
///
/// If `opaque` is passed as true the caller promises the buffer never
/// holds transparent pixels.
pub struct Raster<'a, T: PixelFormat> {
    pixels: &'a mut [T::Pixel],
    stride: i32,
    origin: usize,
    bounds: IntRect,
    opaque: bool,
}

impl<'a, T: PixelFormat> Raster<'a, T> {
    pub fn new(pixels: &'a mut [T::Pixel], stride: i32, bounds: IntRect, opaque: bool) -> Self {
        debug_assert!(pixels.len() >= (bounds.width * bounds.height) as usize);
        let origin = origin_for(stride, &bounds);
        Raster {
            pixels,
            stride,
            origin,
            bounds,
            opaque,
        }
    }

    pub fn view(&self) -> RasterView<'_, T> {
        RasterView {
            pixels: self.pixels,
            stride: self.stride,
            origin: self.origin,
            bounds: self.bounds,
            opaque: self.opaque,
        }
    }

    pub fn bounds(&self) -> IntRect {
        self.bounds
    }

    pub fn stride(&self) -> i32 {
        self.stride
    }

    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        index_for(self.origin, self.stride, &self.bounds, x, y)
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> T::Pixel {
        self.pixels[self.index(x, y)]
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, pixel: T::Pixel) {
        let index = self.index(x, y);
        self.pixels[index] = pixel;
    }

    /// Replace `area` with the source's output. `area` must lie within
    /// the raster bounds.
    pub fn fill(&mut self, source: &dyn Renderer<T>, area: IntRect) {
        fill_impl(
            source,
            area,
            self.origin,
            self.stride,
            &self.bounds,
            self.pixels,
        );
    }

    /// Blend the source over the raster contents (Porter-Duff "over"),
    /// touching only the intersection with the source's bounds.
    pub fn blend_with(&mut self, source: &dyn Renderer<T>) {
        let area = self.bounds.calc_intersection(&source.calc_bounds());
        blend_impl(
            source,
            area,
            self.origin,
            self.stride,
            &self.bounds,
            self.pixels,
        );
    }

    /// Saturating-add the source onto the raster contents.
    pub fn add_with(&mut self, source: &dyn Renderer<T>) {
        let area = self.bounds.calc_intersection(&source.calc_bounds());
        add_impl(
            source,
            area,
            self.origin,
            self.stride,
            &self.bounds,
            self.pixels,
        );
    }

    /// Multiply the raster contents by the source (e.g. apply a mask).
    /// The whole raster is affected; outside the source's bounds the
    /// mask is transparent and the pixels are cleared.
    pub fn multiply_with<B: PixelFormat>(&mut self, source: &dyn Renderer<B>)
    where
        T: MultiplyBy<B>,
    {
        multiply_impl::<T, B>(
            source,
            self.bounds,
            self.origin,
            self.stride,
            &self.bounds,
            self.pixels,
        );
    }
}

impl<'a, T: PixelFormat> Renderer<T> for Raster<'a, T> {
    fn calc_bounds(&self) -> IntRect {
        self.bounds
    }

    fn render(&self, x: i32, y: i32, length: i32, output: &mut SpanBuffer<T>) {
        render_view(&self.view(), x, y, length, output);
    }
}

// ============================================================================
// SelfContainedRaster
// ============================================================================

/// A raster owning its pixel storage, initialized to transparent.
#[derive(Clone)]
pub struct SelfContainedRaster<T: PixelFormat> {
    storage: Vec<T::Pixel>,
    stride: i32,
    bounds: IntRect,
    opaque: bool,
}

impl<T: PixelFormat> SelfContainedRaster<T> {
    /// Allocate a raster covering `bounds`. The bounds must satisfy the
    /// canvas limits (left/top in [-32768, 32767], width/height in
    /// [1, 32767]).
    ///
    /// If `opaque` is true the caller promises to never store
    /// transparent pixels in it.
    pub fn new(bounds: IntRect, opaque: bool) -> Result<Self> {
        check_canvas_bounds(&bounds)?;
        Ok(SelfContainedRaster {
            storage: vec![T::transparent(); (bounds.width * bounds.height) as usize],
            stride: bounds.width,
            bounds,
            opaque,
        })
    }

    pub fn bounds(&self) -> IntRect {
        self.bounds
    }

    pub fn stride(&self) -> i32 {
        self.stride
    }

    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    pub fn view(&self) -> RasterView<'_, T> {
        RasterView {
            pixels: &self.storage,
            stride: self.stride,
            origin: 0,
            bounds: self.bounds,
            opaque: self.opaque,
        }
    }

    /// Borrow as a mutable raster for fill/blend operations.
    pub fn as_raster(&mut self) -> Raster<'_, T> {
        Raster {
            pixels: &mut self.storage,
            stride: self.stride,
            origin: 0,
            bounds: self.bounds,
            opaque: self.opaque,
        }
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> T::Pixel {
        self.storage[index_for(0, self.stride, &self.bounds, x, y)]
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, pixel: T::Pixel) {
        let index = index_for(0, self.stride, &self.bounds, x, y);
        self.storage[index] = pixel;
    }

    pub fn pixels(&self) -> &[T::Pixel] {
        &self.storage
    }
}

impl<T: PixelFormat> Renderer<T> for SelfContainedRaster<T> {
    fn calc_bounds(&self) -> IntRect {
        self.bounds
    }

    fn render(&self, x: i32, y: i32, length: i32, output: &mut SpanBuffer<T>) {
        render_view(&self.view(), x, y, length, output);
    }
}

// ============================================================================
// Row-chunk driver and in-place composition loops
// ============================================================================

/// Walk `area` row by row in requests of at most `MAX_RENDER_LENGTH`
/// pixels, handing each chunk's spans plus the matching destination row
/// slice to `apply`.
fn for_each_chunk<T: PixelFormat, B: PixelFormat>(
    source: &dyn Renderer<B>,
    area: IntRect,
    origin: usize,
    stride: i32,
    bounds: &IntRect,
    pixels: &mut [T::Pixel],
    mut apply: impl FnMut(&SpanBuffer<B>, &mut [T::Pixel]),
) {
    if area.is_empty() {
        return;
    }
    debug_assert!(bounds.calc_union(&area) == *bounds);
    let right = area.calc_right();
    let bottom = area.calc_bottom();
    for y in area.top..bottom {
        let mut x = area.left;
        while x < right {
            let length = min_value(right - x, MAX_RENDER_LENGTH);
            let mut output = SpanBuffer::<B>::new();
            source.render(x, y, length, &mut output);
            let start = index_for(origin, stride, bounds, x, y);
            apply(&output, &mut pixels[start..start + length as usize]);
            x += length;
        }
    }
}

fn fill_impl<T: PixelFormat>(
    source: &dyn Renderer<T>,
    area: IntRect,
    origin: usize,
    stride: i32,
    bounds: &IntRect,
    pixels: &mut [T::Pixel],
) {
    for_each_chunk::<T, T>(source, area, origin, stride, bounds, pixels, |spans, row| {
        let mut pos = spans.begin();
        let mut offset = 0usize;
        while pos != spans.end() {
            let span = spans.span_at(pos);
            let count = span.length() as usize;
            if span.is_solid() {
                row[offset..offset + count].fill(spans.solid_pixel(pos));
            } else {
                row[offset..offset + count]
                    .copy_from_slice(spans.variable_pixels(pos, span.length()));
            }
            offset += count;
            pos += count;
        }
    });
}

fn blend_impl<T: PixelFormat>(
    source: &dyn Renderer<T>,
    area: IntRect,
    origin: usize,
    stride: i32,
    bounds: &IntRect,
    pixels: &mut [T::Pixel],
) {
    for_each_chunk::<T, T>(source, area, origin, stride, bounds, pixels, |spans, row| {
        let mut pos = spans.begin();
        let mut offset = 0usize;
        while pos != spans.end() {
            let span = spans.span_at(pos);
            let count = span.length() as usize;
            let target = &mut row[offset..offset + count];
            if span.is_solid() {
                let color = spans.solid_pixel(pos);
                if T::is_opaque(color) {
                    target.fill(color);
                } else if !T::is_transparent(color) {
                    for p in target.iter_mut() {
                        *p = T::blend(*p, color);
                    }
                }
            } else if span.is_opaque() {
                target.copy_from_slice(spans.variable_pixels(pos, span.length()));
            } else {
                for (p, &c) in target.iter_mut().zip(spans.variable_pixels(pos, span.length())) {
                    *p = T::blend(*p, c);
                }
            }
            offset += count;
            pos += count;
        }
    });
}

fn add_impl<T: PixelFormat>(
    source: &dyn Renderer<T>,
    area: IntRect,
    origin: usize,
    stride: i32,
    bounds: &IntRect,
    pixels: &mut [T::Pixel],
) {
    for_each_chunk::<T, T>(source, area, origin, stride, bounds, pixels, |spans, row| {
        let mut pos = spans.begin();
        let mut offset = 0usize;
        while pos != spans.end() {
            let span = spans.span_at(pos);
            let count = span.length() as usize;
            let target = &mut row[offset..offset + count];
            if span.is_solid() {
                let color = spans.solid_pixel(pos);
                if T::is_maximum(color) {
                    target.fill(color);
                } else if !T::is_transparent(color) {
                    for p in target.iter_mut() {
                        *p = T::add(*p, color);
                    }
                }
            } else {
                for (p, &c) in target.iter_mut().zip(spans.variable_pixels(pos, span.length())) {
                    *p = T::add(*p, c);
                }
            }
            offset += count;
            pos += count;
        }
    });
}

fn multiply_impl<T: MultiplyBy<B>, B: PixelFormat>(
    source: &dyn Renderer<B>,
    area: IntRect,
    origin: usize,
    stride: i32,
    bounds: &IntRect,
    pixels: &mut [T::Pixel],
) {
    for_each_chunk::<T, B>(source, area, origin, stride, bounds, pixels, |spans, row| {
        let mut pos = spans.begin();
        let mut offset = 0usize;
        while pos != spans.end() {
            let span = spans.span_at(pos);
            let count = span.length() as usize;
            let target = &mut row[offset..offset + count];
            if span.is_solid() {
                let factor = spans.solid_pixel(pos);
                if B::is_transparent(factor) {
                    target.fill(T::transparent());
                } else if !B::is_maximum(factor) {
                    for p in target.iter_mut() {
                        *p = T::multiply(*p, factor);
                    }
                }
            } else {
                for (p, &m) in target.iter_mut().zip(spans.variable_pixels(pos, span.length())) {
                    *p = T::multiply(*p, m);
                }
            }
            offset += count;
            pos += count;
        }
    });
}

// ============================================================================
// Tests
// ============================================================================
