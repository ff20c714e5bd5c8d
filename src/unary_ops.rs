//! Per-pixel unary renderers: inversion, format conversion, and table
//! lookup. All three pull their source into a scratch buffer and map each
//! span through a pixel function, preserving the span structure.

use crate::basics::{IntRect, FULL_RECT, MAX_RENDER_LENGTH};
use crate::lookup_table::LookupTable;
use crate::pixel::{ConvertFrom, Mask8, PixelFormat};
use crate::renderer::Renderer;
use crate::span::SpanBuffer;

/// Pull `source` and re-emit every span through `process`, computing the
/// variable-span opaque flag with `opaque_for` (solid spans derive their
/// flags from the produced pixel).
fn render_unary<S, T>(
    source: &dyn Renderer<S>,
    x: i32,
    y: i32,
    length: i32,
    output: &mut SpanBuffer<T>,
    opaque_for: impl Fn(bool) -> bool,
    process: impl Fn(&[S::Pixel], &mut [T::Pixel]),
) where
    S: PixelFormat,
    T: PixelFormat,
{
    debug_assert!(0 < length && length <= MAX_RENDER_LENGTH);
    let mut input = SpanBuffer::<S>::new();
    source.render(x, y, length, &mut input);
    let mut pos = input.begin();
    while pos != input.end() {
        let span = input.span_at(pos);
        let span_length = span.length();
        if span.is_solid() {
            let source_pixel = [input.solid_pixel(pos)];
            let mut target_pixel = [T::transparent()];
            process(&source_pixel, &mut target_pixel);
            output.add_solid(span_length, target_pixel[0]);
        } else {
            let opaque = opaque_for(span.is_opaque());
            let target = output.add_variable(span_length, opaque);
            process(input.variable_pixels(pos, span_length), target);
        }
        pos += span_length as usize;
    }
}

// ============================================================================
// Inverter
// ============================================================================

/// Bitwise NOT of every channel of the source.
pub struct Inverter<'a, T: PixelFormat> {
    source: &'a dyn Renderer<T>,
}

impl<'a, T: PixelFormat> Inverter<'a, T> {
    pub fn new(source: &'a dyn Renderer<T>) -> Self {
        Inverter { source }
    }
}

impl<'a, T: PixelFormat> Renderer<T> for Inverter<'a, T> {
    /// Inverting transparent yields maximum, so the output is unbounded.
    fn calc_bounds(&self) -> IntRect {
        FULL_RECT
    }

    fn render(&self, x: i32, y: i32, length: i32, output: &mut SpanBuffer<T>) {
        render_unary(
            self.source,
            x,
            y,
            length,
            output,
            |_| false,
            |source, target| {
                for (t, &s) in target.iter_mut().zip(source) {
                    *t = T::invert(s);
                }
            },
        );
    }
}

// ============================================================================
// Converter
// ============================================================================

/// Converts every pixel from format `S` to format `T`.
pub struct Converter<'a, S: PixelFormat, T: ConvertFrom<S>> {
    source: &'a dyn Renderer<S>,
    _target: std::marker::PhantomData<T>,
}

impl<'a, S: PixelFormat, T: ConvertFrom<S>> Converter<'a, S, T> {
    pub fn new(source: &'a dyn Renderer<S>) -> Self {
        Converter {
            source,
            _target: std::marker::PhantomData,
        }
    }
}

impl<'a, S: PixelFormat, T: ConvertFrom<S>> Renderer<T> for Converter<'a, S, T> {
    fn calc_bounds(&self) -> IntRect {
        if T::is_transparent(T::convert(S::transparent())) {
            self.source.calc_bounds()
        } else {
            FULL_RECT
        }
    }

    fn render(&self, x: i32, y: i32, length: i32, output: &mut SpanBuffer<T>) {
        render_unary(
            self.source,
            x,
            y,
            length,
            output,
            |source_opaque| source_opaque,
            |source, target| {
                for (t, &s) in target.iter_mut().zip(source) {
                    *t = T::convert(s);
                }
            },
        );
    }
}

// ============================================================================
// Lookup
// ============================================================================

/// Maps mask coverage through a 256-entry color table (gradient ramps,
/// gamma correction).
pub struct Lookup<'a, T: PixelFormat> {
    source: &'a dyn Renderer<Mask8>,
    table: &'a LookupTable<T>,
}

impl<'a, T: PixelFormat> Lookup<'a, T> {
    pub fn new(source: &'a dyn Renderer<Mask8>, table: &'a LookupTable<T>) -> Self {
        Lookup { source, table }
    }
}

impl<'a, T: PixelFormat> Renderer<T> for Lookup<'a, T> {
    fn calc_bounds(&self) -> IntRect {
        if T::is_transparent(self.table.get(0)) {
            self.source.calc_bounds()
        } else {
            FULL_RECT
        }
    }

    fn render(&self, x: i32, y: i32, length: i32, output: &mut SpanBuffer<T>) {
        let table = self.table;
        render_unary(
            self.source,
            x,
            y,
            length,
            output,
            |_| table.is_opaque(),
            |source, target| {
                for (t, &s) in target.iter_mut().zip(source) {
                    *t = table.get(s);
                }
            },
        );
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::IntRect;
    use crate::pixel::Argb32;
    use crate::renderer::tests::render_row;
    use crate::renderer::{Solid, SolidRect};

    #[test]
    fn test_inverter() {
        let solid = Solid::<Argb32>::new(0x00000000);
        let inverted = Inverter::new(&solid);
        assert_eq!(inverted.calc_bounds(), FULL_RECT);
        assert_eq!(render_row(&inverted, 0, 0, 3), vec![0xFFFFFFFF; 3]);
    }

    #[test]
    fn test_inverter_involution() {
        let rect = SolidRect::<Mask8>::new(0x5A, IntRect::new(1, 0, 2, 1));
        let once = Inverter::new(&rect);
        let twice = Inverter::new(&once);
        assert_eq!(render_row(&twice, 0, 0, 4), render_row(&rect, 0, 0, 4));
    }

    #[test]
    fn test_converter_round_trip() {
        let rect = SolidRect::<Mask8>::new(0x80, IntRect::new(0, 0, 2, 1));
        let as_color: Converter<Mask8, Argb32> = Converter::new(&rect);
        let back: Converter<Argb32, Mask8> = Converter::new(&as_color);
        assert_eq!(render_row(&back, 0, 0, 4), render_row(&rect, 0, 0, 4));
        // mask -> color conversion keeps bounds since transparent stays transparent
        assert_eq!(as_color.calc_bounds(), IntRect::new(0, 0, 2, 1));
    }

    #[test]
    fn test_converter_broadcast() {
        let rect = SolidRect::<Mask8>::new(0xFF, IntRect::new(0, 0, 1, 1));
        let as_color: Converter<Mask8, Argb32> = Converter::new(&rect);
        assert_eq!(render_row(&as_color, 0, 0, 2), vec![0xFFFFFFFF, 0]);
    }

    #[test]
    fn test_lookup() {
        let mut table = [0u32; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = <Argb32 as crate::pixel::ConvertFrom<Mask8>>::convert(i as u8);
        }
        let table = LookupTable::<Argb32>::from_pixels(&table);
        let rect = SolidRect::<Mask8>::new(0x80, IntRect::new(0, 0, 2, 1));
        let looked_up = Lookup::new(&rect, &table);
        // table[0] is transparent so bounds follow the source
        assert_eq!(looked_up.calc_bounds(), IntRect::new(0, 0, 2, 1));
        assert_eq!(render_row(&looked_up, 0, 0, 3), vec![0x80808080, 0x80808080, 0]);
    }

    #[test]
    fn test_lookup_nontransparent_zero_is_unbounded() {
        let table = LookupTable::<Argb32>::from_pixels(&[0xFF000000; 256]);
        let rect = SolidRect::<Mask8>::new(0x80, IntRect::new(0, 0, 2, 1));
        let looked_up = Lookup::new(&rect, &table);
        assert_eq!(looked_up.calc_bounds(), FULL_RECT);
    }
}
