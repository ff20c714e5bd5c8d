//! # spanline
//!
//! Pull-based 2D vector graphics rasterization: an analytic anti-aliased
//! polygon rasterizer composed with a lazy span algebra over premultiplied
//! ARGB color and 8-bit coverage masks.
//!
//! Everything that produces pixels implements [`renderer::Renderer`]:
//! a destination raster iterates over rows and asks the renderer
//! expression for spans of up to 256 pixels at a coordinate; the
//! expression recursively pulls from its inputs. Spans carry solid and
//! opaque flags so composite operators can skip per-pixel work wherever
//! an identity law applies.
//!
//! - **Leaves** — [`renderer::Solid`], [`renderer::SolidRect`], rasters,
//!   [`gradient::LinearAscend`] / [`gradient::RadialAscend`] coverage
//!   ramps, and [`texture::Texture`] image sampling.
//! - **Operators** — [`binary_ops::Blender`] (Porter-Duff over),
//!   [`binary_ops::Adder`], [`binary_ops::Multiplier`] (masking),
//!   [`unary_ops::Inverter`], [`unary_ops::Converter`],
//!   [`unary_ops::Lookup`], [`renderer::Clipper`],
//!   [`renderer::Offsetter`], and [`optimizer::Optimizer`].
//! - **Geometry** — [`path::Path`] construction with curve flattening,
//!   stroking, dashing, SVG path data, and affine transforms, rasterized
//!   by [`polygon_mask::PolygonMask`].
//!
//! ```
//! use spanline::prelude::*;
//!
//! let mut canvas = SelfContainedRaster::<Argb32>::new(IntRect::new(0, 0, 64, 64), false)?;
//! let mut shape = Path::new();
//! shape.add_circle(32.0, 32.0, 24.0, 1.0);
//! let mask = PolygonMask::new(&shape, canvas.bounds(), FillRule::NonZero);
//! let red = Solid::<Argb32>::new(0xFFCC2200);
//! let filled = Multiplier::new(&red, &mask);
//! canvas.as_raster().blend_with(&filled);
//! # Ok::<(), spanline::error::Error>(())
//! ```

// Foundation types and math
pub mod basics;
pub mod error;
pub mod fixed;

// Pixel formats and spans
pub mod pixel;
pub mod span;

// Renderer algebra
pub mod binary_ops;
pub mod optimizer;
pub mod renderer;
pub mod unary_ops;

// Pixel sources
pub mod gradient;
pub mod lookup_table;
pub mod raster;
pub mod rle_raster;
pub mod texture;

// Geometry
pub mod dash;
pub mod path;
pub mod polygon_mask;
pub mod stroke;
pub mod svg_path;
pub mod transform;

/// Common imports for typical rendering code.
pub mod prelude {
    pub use crate::basics::{IntPoint, IntRect, Point, Rect, Vertex, MAX_RENDER_LENGTH};
    pub use crate::binary_ops::{Adder, Blender, Multiplier};
    pub use crate::error::{Error, Result, SvgPathError};
    pub use crate::gradient::{LinearAscend, RadialAscend};
    pub use crate::lookup_table::{GammaTable, Gradient, GradientStop, LookupTable};
    pub use crate::optimizer::Optimizer;
    pub use crate::path::{Path, PathOp};
    pub use crate::pixel::{Argb32, Mask8, PixelFormat};
    pub use crate::polygon_mask::{FillRule, PolygonMask};
    pub use crate::raster::{Raster, RasterView, SelfContainedRaster};
    pub use crate::renderer::{Clipper, Offsetter, Renderer, Solid, SolidRect};
    pub use crate::rle_raster::RLERaster;
    pub use crate::span::{Span, SpanBuffer};
    pub use crate::stroke::{EndCapStyle, JointStyle};
    pub use crate::svg_path::parse_svg_path;
    pub use crate::texture::Texture;
    pub use crate::transform::AffineTransform;
    pub use crate::unary_ops::{Converter, Inverter, Lookup};
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    /// Fill a small canvas through the whole stack: path, stroke, mask,
    /// gradient lookup, blend.
    #[test]
    fn test_end_to_end_gradient_stroke() {
        let bounds = IntRect::new(0, 0, 32, 32);
        let mut canvas = SelfContainedRaster::<Argb32>::new(bounds, false).unwrap();

        let mut shape = Path::new();
        shape.move_to(4.0, 16.0).line_to(28.0, 16.0);
        shape.stroke(8.0, EndCapStyle::Butt, JointStyle::Bevel, 2.0, 1.0);
        let mask = PolygonMask::new(&shape, bounds, FillRule::NonZero);

        let ramp = Gradient::<Argb32>::from_endpoints(0xFF000000, 0xFFFFFFFF);
        let ascend = LinearAscend::new(4.0, 0.0, 28.0, 0.0);
        let colors = Lookup::new(&ascend, &ramp);
        let filled: Multiplier<Argb32, Mask8> = Multiplier::new(&colors, &mask);
        canvas.as_raster().blend_with(&filled);

        // inside the stroke the gradient ascends; outside stays clear
        assert_eq!(canvas.get_pixel(16, 2), 0);
        let left = canvas.get_pixel(6, 16) & 0xFF;
        let right = canvas.get_pixel(26, 16) & 0xFF;
        assert!(left < right);
        assert_eq!(canvas.get_pixel(16, 16) >> 24, 0xFF);
    }

    /// The SVG front end drives the same pipeline.
    #[test]
    fn test_end_to_end_svg_fill() {
        let bounds = IntRect::new(0, 0, 16, 16);
        let mut canvas = SelfContainedRaster::<Argb32>::new(bounds, false).unwrap();
        let shape = Path::from_svg("M2 2 H14 V14 H2 Z", 1.0).unwrap();
        let mask = PolygonMask::new(&shape, bounds, FillRule::NonZero);
        let green = Solid::<Argb32>::new(0xFF00AA00);
        let filled: Multiplier<Argb32, Mask8> = Multiplier::new(&green, &mask);
        canvas.as_raster().blend_with(&filled);
        assert_eq!(canvas.get_pixel(8, 8), 0xFF00AA00);
        assert_eq!(canvas.get_pixel(0, 0), 0);
        assert_eq!(canvas.get_pixel(15, 15), 0);
    }

    /// Premultiplication survives an arbitrary operator pipeline.
    #[test]
    fn test_pipeline_preserves_premultiplication() {
        let bounds = IntRect::new(0, 0, 8, 8);
        let mut canvas = SelfContainedRaster::<Argb32>::new(bounds, false).unwrap();
        let mut shape = Path::new();
        shape.add_circle(4.0, 4.0, 3.0, 1.0);
        let mask = PolygonMask::new(&shape, bounds, FillRule::NonZero);
        let color = Solid::<Argb32>::new(0x80400060);
        let filled: Multiplier<Argb32, Mask8> = Multiplier::new(&color, &mask);
        let background = Solid::<Argb32>::new(0x40202020);
        let blended = Blender::new(&background, &filled);
        canvas.as_raster().fill(&blended, bounds);
        for y in 0..8 {
            for x in 0..8 {
                let p = canvas.get_pixel(x, y);
                assert!(crate::pixel::Argb32::is_valid(p), "({x}, {y}) = {p:08X}");
            }
        }
    }
}
