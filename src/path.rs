//! Path construction: an ordered sequence of move/line/close instructions
//! with curve flattening, shape helpers, and affine transformation.
//!
//! Curves are flattened at construction time into line segments using
//! forward differencing; the segment count scales with the square root of
//! the second derivative's magnitude times the caller's curve quality.

use crate::basics::{max_value, min_value, IntRect, Rect, Vertex, EPSILON, PI2};
use crate::transform::AffineTransform;

/// Upper limit on circle subdivisions; beyond roughly 200 the segment
/// angles no longer change visibly at any magnification.
pub(crate) const MAX_CIRCLE_DIVISIONS: f64 = 200.0;
/// Smallest circle-like shape: an octagon.
pub(crate) const MIN_CIRCLE_DIVISIONS: f64 = 8.0;

pub(crate) const MAX_SPLINE_SEGMENTS: i32 = 200;

/// Per-step rotation vector `(rx, ry)` for approximating a circle of the
/// given diameter at the given quality. Returns the step angle.
pub(crate) fn calc_circle_rotation_vector(
    curve_quality: f64,
    diameter: f64,
    rx: &mut f64,
    ry: &mut f64,
) -> f64 {
    let t = if diameter < EPSILON {
        PI2
    } else {
        min_value(
            max_value(1.0 / (curve_quality * diameter).sqrt(), PI2 / MAX_CIRCLE_DIVISIONS),
            PI2 / MIN_CIRCLE_DIVISIONS,
        )
    };
    *rx = t.cos();
    *ry = t.sin();
    t
}

/// A path instruction opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOp {
    Move,
    Line,
    Close,
}

/// One path instruction. A `Close` instruction's vertex repeats the
/// coordinates of the sub-path's opening `Move`, which lets traversal
/// treat it as the closing edge without look-back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instruction {
    pub op: PathOp,
    pub vertex: Vertex,
}

impl Instruction {
    pub(crate) fn new(op: PathOp, vertex: Vertex) -> Self {
        Instruction { op, vertex }
    }

    pub(crate) fn placeholder() -> Self {
        Instruction {
            op: PathOp::Move,
            vertex: Vertex::new(0.0, 0.0),
        }
    }
}

/// Recorded drawing commands for shapes that can be filled, stroked, or
/// dashed. Construction methods chain.
#[derive(Debug, Clone, Default)]
pub struct Path {
    instructions: Vec<Instruction>,
    open_index: Option<usize>,
}

impl Path {
    pub fn new() -> Self {
        Path {
            instructions: Vec::new(),
            open_index: None,
        }
    }

    pub fn clear(&mut self) -> &mut Self {
        self.instructions.clear();
        self.open_index = None;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub(crate) fn raw_mut(&mut self) -> &mut Vec<Instruction> {
        &mut self.instructions
    }

    pub(crate) fn set_open_index(&mut self, index: Option<usize>) {
        self.open_index = index;
    }

    /// The current pen position: the last instruction's vertex.
    pub fn get_position(&self) -> Vertex {
        self.instructions
            .last()
            .map(|i| i.vertex)
            .unwrap_or(Vertex::new(0.0, 0.0))
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.instructions
            .push(Instruction::new(PathOp::Move, Vertex::new(x, y)));
        self.open_index = Some(self.instructions.len() - 1);
        self
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.instructions
            .push(Instruction::new(PathOp::Line, Vertex::new(x, y)));
        self
    }

    /// Close the open sub-path, re-emitting its opening coordinates.
    pub fn close(&mut self) -> &mut Self {
        let vertex = self
            .open_index
            .map(|i| self.instructions[i].vertex)
            .unwrap_or(Vertex::new(0.0, 0.0));
        self.instructions.push(Instruction::new(PathOp::Close, vertex));
        self
    }

    /// Close every sub-path that is not already closed.
    pub fn close_all(&mut self) -> &mut Self {
        let mut closed = Vec::with_capacity(self.instructions.len() + 8);
        let mut open_coordinates = Vertex::new(0.0, 0.0);
        let instructions = &self.instructions;
        let mut it = 0;
        while it < instructions.len() {
            let begin = it;
            loop {
                if instructions[it].op != PathOp::Line {
                    open_coordinates = instructions[it].vertex;
                }
                it += 1;
                if it == instructions.len()
                    || (instructions[it - 1].op == PathOp::Line
                        && instructions[it].op == PathOp::Move)
                {
                    break;
                }
            }
            closed.extend_from_slice(&instructions[begin..it]);
            if instructions[it - 1].op != PathOp::Close {
                closed.push(Instruction::new(PathOp::Close, open_coordinates));
            }
        }
        self.instructions = closed;
        self.open_index = self.instructions.len().checked_sub(1);
        self
    }

    /// Concatenate another path, transferring its open sub-path.
    pub fn append(&mut self, other: &Path) -> &mut Self {
        let offset = self.instructions.len();
        self.instructions.extend_from_slice(&other.instructions);
        if let Some(open) = other.open_index {
            self.open_index = Some(open + offset);
        }
        self
    }

    /// Bounding box over all instruction vertices.
    pub fn calc_float_bounds(&self) -> Rect<f64> {
        let mut result = Rect::default();
        let mut it = self.instructions.iter();
        if let Some(first) = it.next() {
            result.left = first.vertex.x;
            result.top = first.vertex.y;
            let mut right = result.left;
            let mut bottom = result.top;
            for instruction in it {
                result.left = min_value(result.left, instruction.vertex.x);
                result.top = min_value(result.top, instruction.vertex.y);
                right = max_value(right, instruction.vertex.x);
                bottom = max_value(bottom, instruction.vertex.y);
            }
            result.width = right - result.left;
            result.height = bottom - result.top;
        }
        result
    }

    /// Bounding box in whole pixels (outward rounded).
    pub fn calc_int_bounds(&self) -> IntRect {
        let b = self.calc_float_bounds();
        let left = b.left.floor() as i32;
        let top = b.top.floor() as i32;
        IntRect {
            left,
            top,
            width: (b.left + b.width).ceil() as i32 - left,
            height: (b.top + b.height).ceil() as i32 - top,
        }
    }

    /// Flatten a quadratic Bezier to the end point `(x, y)`.
    pub fn quadratic_to(
        &mut self,
        control_x: f64,
        control_y: f64,
        x: f64,
        y: f64,
        curve_quality: f64,
    ) -> &mut Self {
        let p0 = self.get_position();
        let mut px = p0.x;
        let mut py = p0.y;

        let c1x = 2.0 * (control_x - px);
        let c1y = 2.0 * (control_y - py);
        let c2x = 2.0 * (px - 2.0 * control_x + x);
        let c2y = 2.0 * (py - 2.0 * control_y + y);

        // The norm of the (constant) second derivative measures how much
        // the direction twists; it decides the segment count.
        let d = (c2x * c2x + c2y * c2y).sqrt();
        let n = min_value(
            ((d * 0.707 * curve_quality).sqrt() + 0.5) as i32 + 1,
            MAX_SPLINE_SEGMENTS,
        );

        let m = 1.0 / n as f64;
        let px2 = c2x * m * m;
        let py2 = c2y * m * m;
        let mut px1 = c1x * m + 0.5 * px2;
        let mut py1 = c1y * m + 0.5 * py2;

        for _ in 0..n {
            px += px1;
            py += py1;
            px1 += px2;
            py1 += py2;
            self.line_to(px, py);
        }
        self
    }

    /// Flatten a cubic Bezier to the end point `(x, y)`.
    #[allow(clippy::too_many_arguments)]
    pub fn cubic_to(
        &mut self,
        control1_x: f64,
        control1_y: f64,
        control2_x: f64,
        control2_y: f64,
        x: f64,
        y: f64,
        curve_quality: f64,
    ) -> &mut Self {
        let p0 = self.get_position();
        let mut px = p0.x;
        let mut py = p0.y;

        let c1x = 3.0 * (control1_x - px);
        let c1y = 3.0 * (control1_y - py);
        let c2x = 6.0 * (px - 2.0 * control1_x + control2_x);
        let c2y = 6.0 * (py - 2.0 * control1_y + control2_y);
        let c3x = 6.0 * (x - px + 3.0 * (control1_x - control2_x));
        let c3y = 6.0 * (y - py + 3.0 * (control1_y - control2_y));

        // For a cubic the second derivative itself twists; its maximum
        // magnitude is at one of the curve ends, and that decides the
        // segment count.
        let k2x = 6.0 * (control1_x - 2.0 * control2_x + x);
        let k2y = 6.0 * (control1_y - 2.0 * control2_y + y);
        let d = max_value(c2x * c2x + c2y * c2y, k2x * k2x + k2y * k2y).sqrt();
        let n = min_value(
            ((d * 0.707 * curve_quality).sqrt() + 0.5) as i32 + 1,
            MAX_SPLINE_SEGMENTS,
        );

        let m = 1.0 / n as f64;
        let px3 = c3x * m * m * m;
        let py3 = c3y * m * m * m;
        let mut px2 = c2x * m * m + px3;
        let mut py2 = c2y * m * m + py3;
        let mut px1 = c1x * m + 0.5 * px2 - px3 / 3.0;
        let mut py1 = c1y * m + 0.5 * py2 - py3 / 3.0;

        for _ in 0..n {
            px += px1;
            py += py1;
            px1 += px2;
            py1 += py2;
            px2 += px3;
            py2 += py3;
            self.line_to(px, py);
        }
        self
    }

    /// Sweep an arc by rotating the current point around a center.
    /// `aspect_ratio` stretches the x axis; the sweep terminates exactly
    /// at the requested angle.
    pub fn arc_sweep(
        &mut self,
        center_x: f64,
        center_y: f64,
        sweep_radians: f64,
        aspect_ratio: f64,
        curve_quality: f64,
    ) -> &mut Self {
        debug_assert!((-PI2..=PI2).contains(&sweep_radians));
        debug_assert!(aspect_ratio > 0.0 && aspect_ratio < 1.0e10);
        debug_assert!(curve_quality > 0.0);

        let pos = self.get_position();
        let sx = (pos.x - center_x) / aspect_ratio;
        let sy = pos.y - center_y;
        let diameter = max_value(2.0 * aspect_ratio.abs(), 2.0) * (sx * sx + sy * sy).sqrt();
        let mut rx = 0.0;
        let mut ry = 0.0;
        let t = calc_circle_rotation_vector(curve_quality, diameter, &mut rx, &mut ry);
        let mut s = sweep_radians;
        if s < 0.0 {
            s = -s;
            ry = -ry;
        }
        let mut px = sx;
        let mut py = sy;
        let mut r = t;
        while r < s - EPSILON {
            let nx = px * rx - py * ry;
            let ny = px * ry + py * rx;
            px = nx;
            py = ny;
            r += t;
            self.line_to(center_x + px * aspect_ratio, center_y + py);
        }
        rx = sweep_radians.cos();
        ry = sweep_radians.sin();
        px = sx * rx - sy * ry;
        py = sx * ry + sy * rx;
        self.line_to(center_x + px * aspect_ratio, center_y + py);
        self
    }

    /// Reposition the pen by rotating the current point around a center
    /// without drawing. Adjusts a trailing `Move` in place.
    pub fn arc_move(
        &mut self,
        center_x: f64,
        center_y: f64,
        sweep_radians: f64,
        aspect_ratio: f64,
    ) -> &mut Self {
        debug_assert!((-PI2..=PI2).contains(&sweep_radians));
        debug_assert!(aspect_ratio > 0.0 && aspect_ratio < 1.0e10);

        let pos = self.get_position();
        let sx = (pos.x - center_x) / aspect_ratio;
        let sy = pos.y - center_y;

        let rx = sweep_radians.cos();
        let ry = sweep_radians.sin();
        let px = sx * rx - sy * ry;
        let py = sx * ry + sy * rx;

        let end_x = center_x + px * aspect_ratio;
        let end_y = center_y + py;

        match self.instructions.last_mut() {
            Some(last) if last.op == PathOp::Move => {
                last.vertex = Vertex::new(end_x, end_y);
            }
            _ => {
                self.move_to(end_x, end_y);
            }
        }
        self
    }

    pub fn add_line(&mut self, start_x: f64, start_y: f64, end_x: f64, end_y: f64) -> &mut Self {
        self.move_to(start_x, start_y).line_to(end_x, end_y)
    }

    pub fn add_rect(&mut self, left: f64, top: f64, width: f64, height: f64) -> &mut Self {
        self.add_line(left, top, left + width, top)
            .line_to(left + width, top + height)
            .line_to(left, top + height)
            .close()
    }

    pub fn add_ellipse(
        &mut self,
        center_x: f64,
        center_y: f64,
        radius_x: f64,
        radius_y: f64,
        curve_quality: f64,
    ) -> &mut Self {
        debug_assert!(curve_quality > 0.0);
        if radius_x.abs() < EPSILON {
            self.add_line(center_x, center_y - radius_y, center_x, center_y + radius_y);
        } else if radius_y.abs() < EPSILON {
            self.add_line(center_x - radius_x, center_y, center_x + radius_x, center_y);
        } else {
            let sweep_sign = if (radius_x < 0.0) != (radius_y < 0.0) {
                -1.0
            } else {
                1.0
            };
            self.move_to(center_x + radius_x, center_y);
            self.arc_sweep(
                center_x,
                center_y,
                sweep_sign * PI2,
                sweep_sign * radius_x / radius_y,
                curve_quality,
            );
        }
        self.close()
    }

    pub fn add_circle(
        &mut self,
        center_x: f64,
        center_y: f64,
        radius: f64,
        curve_quality: f64,
    ) -> &mut Self {
        debug_assert!(curve_quality > 0.0);
        self.move_to(center_x + radius, center_y);
        self.arc_sweep(center_x, center_y, PI2, 1.0, curve_quality);
        self.close()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_rounded_rect(
        &mut self,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
        corner_width: f64,
        corner_height: f64,
        curve_quality: f64,
    ) -> &mut Self {
        if corner_width < EPSILON || corner_height < EPSILON {
            return self.add_rect(left, top, width, height);
        }
        let ratio = corner_width / corner_height;
        let right = left + width;
        let bottom = top + height;
        let quarter = std::f64::consts::PI * 0.5;
        self.add_line(left + corner_width, top, right - corner_width, top);
        self.arc_sweep(right - corner_width, top + corner_height, quarter, ratio, curve_quality);
        self.line_to(right, top + corner_height);
        self.line_to(right, bottom - corner_height);
        self.arc_sweep(
            right - corner_width,
            bottom - corner_height,
            quarter,
            ratio,
            curve_quality,
        );
        self.line_to(right - corner_width, bottom);
        self.line_to(left + corner_width, bottom);
        self.arc_sweep(
            left + corner_width,
            bottom - corner_height,
            quarter,
            ratio,
            curve_quality,
        );
        self.line_to(left, bottom - corner_height);
        self.line_to(left, top + corner_height);
        self.arc_sweep(left + corner_width, top + corner_height, quarter, ratio, curve_quality);
        self.close()
    }

    /// A star polygon alternating between two radii.
    pub fn add_star(
        &mut self,
        center_x: f64,
        center_y: f64,
        points: i32,
        radius1: f64,
        radius2: f64,
        rotation: f64,
    ) -> &mut Self {
        debug_assert!(points > 0);
        let mut px = rotation.sin();
        let mut py = -rotation.cos();
        let t = PI2 / points as f64;
        let rx = t.cos();
        let ry = t.sin();
        let mut s = radius1;
        self.move_to(center_x + px * s, center_y + py * s);
        let mut r = t;
        while r < PI2 - EPSILON {
            s = (radius1 + radius2) - s;
            let nx = px * rx - py * ry;
            let ny = px * ry + py * rx;
            px = nx;
            py = ny;
            r += t;
            self.line_to(center_x + px * s, center_y + py * s);
        }
        self.close()
    }

    /// Transform every vertex by an affine matrix.
    pub fn transform(&mut self, transformation: &AffineTransform) -> &mut Self {
        if *transformation != AffineTransform::identity() {
            for instruction in &mut self.instructions {
                instruction.vertex = transformation.apply(instruction.vertex);
            }
        }
        self
    }

    /// Replace the path with the outline of its stroke. The result is
    /// meant to be filled with the non-zero rule.
    pub fn stroke(
        &mut self,
        width: f64,
        end_caps: crate::stroke::EndCapStyle,
        joints: crate::stroke::JointStyle,
        miter_limit: f64,
        curve_quality: f64,
    ) -> &mut Self {
        crate::stroke::stroke_path(self, width, end_caps, joints, miter_limit, curve_quality);
        self
    }

    /// Replace the path with a dashed version of itself.
    pub fn dash(&mut self, dash_length: f64, gap_length: f64, dash_offset: f64) -> &mut Self {
        crate::dash::dash_path(self, dash_length, gap_length, dash_offset);
        self
    }

    /// Parse SVG path data and append it to this path.
    pub fn append_svg_path(
        &mut self,
        data: &str,
        curve_quality: f64,
    ) -> Result<&mut Self, crate::error::SvgPathError> {
        crate::svg_path::parse_svg_path(data, curve_quality, self)?;
        Ok(self)
    }

    /// Build a path from SVG path data.
    pub fn from_svg(data: &str, curve_quality: f64) -> Result<Path, crate::error::SvgPathError> {
        let mut path = Path::new();
        crate::svg_path::parse_svg_path(data, curve_quality, &mut path)?;
        Ok(path)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }

    #[test]
    fn test_close_repeats_open_vertex() {
        let mut path = Path::new();
        path.move_to(3.0, 4.0).line_to(5.0, 6.0).close();
        let instructions = path.instructions();
        assert_eq!(instructions[2].op, PathOp::Close);
        assert_eq!(instructions[2].vertex, Vertex::new(3.0, 4.0));
    }

    #[test]
    fn test_close_without_move_uses_origin() {
        let mut path = Path::new();
        path.close();
        assert_eq!(path.instructions()[0].vertex, Vertex::new(0.0, 0.0));
    }

    #[test]
    fn test_append_transfers_open_index() {
        let mut a = Path::new();
        a.move_to(0.0, 0.0).line_to(1.0, 0.0);
        let mut b = Path::new();
        b.move_to(5.0, 5.0).line_to(6.0, 5.0);
        a.append(&b);
        a.close();
        // the close belongs to b's sub-path
        let last = a.instructions().last().unwrap();
        assert_eq!(last.vertex, Vertex::new(5.0, 5.0));
    }

    #[test]
    fn test_close_all() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0)
            .line_to(1.0, 0.0)
            .move_to(5.0, 5.0)
            .line_to(6.0, 5.0)
            .close()
            .move_to(8.0, 8.0)
            .line_to(9.0, 8.0);
        path.close_all();
        let closes: Vec<&Instruction> = path
            .instructions()
            .iter()
            .filter(|i| i.op == PathOp::Close)
            .collect();
        assert_eq!(closes.len(), 3);
        assert_eq!(closes[0].vertex, Vertex::new(0.0, 0.0));
        assert_eq!(closes[2].vertex, Vertex::new(8.0, 8.0));
    }

    #[test]
    fn test_bounds() {
        let mut path = Path::new();
        path.move_to(1.5, 2.5).line_to(-3.5, 7.0).line_to(4.0, -1.0);
        let float_bounds = path.calc_float_bounds();
        assert_near(float_bounds.left, -3.5);
        assert_near(float_bounds.top, -1.0);
        assert_near(float_bounds.width, 7.5);
        assert_near(float_bounds.height, 8.0);
        assert_eq!(path.calc_int_bounds(), IntRect::new(-4, -1, 8, 8));
    }

    #[test]
    fn test_quadratic_reaches_endpoint() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).quadratic_to(5.0, 10.0, 10.0, 0.0, 1.0);
        let end = path.get_position();
        assert_near(end.x, 10.0);
        assert_near(end.y, 0.0);
        // all flattened vertices stay within the control polygon's box
        for i in path.instructions() {
            assert!(i.vertex.y >= -1e-9 && i.vertex.y <= 5.0 + 1e-9);
        }
    }

    #[test]
    fn test_quadratic_midpoint() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).quadratic_to(5.0, 10.0, 10.0, 0.0, 1.0);
        // B(1/2) = (5, 5); find the closest flattened vertex
        let closest = path
            .instructions()
            .iter()
            .map(|i| ((i.vertex.x - 5.0).powi(2) + (i.vertex.y - 5.0).powi(2)).sqrt())
            .fold(f64::MAX, f64::min);
        assert!(closest < 0.5);
    }

    #[test]
    fn test_cubic_reaches_endpoint() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0)
            .cubic_to(0.0, 10.0, 10.0, 10.0, 10.0, 0.0, 1.0);
        let end = path.get_position();
        assert_near(end.x, 10.0);
        assert_near(end.y, 0.0);
        assert!(path.len() > 3);
    }

    #[test]
    fn test_curve_quality_scales_segments() {
        let mut coarse = Path::new();
        coarse.move_to(0.0, 0.0).quadratic_to(50.0, 100.0, 100.0, 0.0, 0.1);
        let mut fine = Path::new();
        fine.move_to(0.0, 0.0).quadratic_to(50.0, 100.0, 100.0, 0.0, 10.0);
        assert!(fine.len() > coarse.len());
    }

    #[test]
    fn test_arc_sweep_full_circle_closes() {
        let mut path = Path::new();
        path.move_to(10.0, 0.0).arc_sweep(0.0, 0.0, PI2, 1.0, 1.0);
        let end = path.get_position();
        assert_near(end.x, 10.0);
        assert_near(end.y, 0.0);
        // every vertex lies on the circle
        for i in path.instructions() {
            let r = (i.vertex.x * i.vertex.x + i.vertex.y * i.vertex.y).sqrt();
            assert!((r - 10.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_arc_sweep_quarter() {
        let mut path = Path::new();
        path.move_to(10.0, 0.0)
            .arc_sweep(0.0, 0.0, std::f64::consts::PI / 2.0, 1.0, 1.0);
        let end = path.get_position();
        assert_near(end.x, 0.0);
        assert_near(end.y, 10.0);
    }

    #[test]
    fn test_arc_move_rotates_pen() {
        let mut path = Path::new();
        path.move_to(10.0, 0.0).arc_move(0.0, 0.0, std::f64::consts::PI / 2.0, 1.0);
        // the trailing move was adjusted in place
        assert_eq!(path.len(), 1);
        let end = path.get_position();
        assert_near(end.x, 0.0);
        assert_near(end.y, 10.0);
    }

    #[test]
    fn test_add_rect_shape() {
        let mut path = Path::new();
        path.add_rect(1.0, 2.0, 3.0, 4.0);
        let ops: Vec<PathOp> = path.instructions().iter().map(|i| i.op).collect();
        assert_eq!(
            ops,
            vec![PathOp::Move, PathOp::Line, PathOp::Line, PathOp::Line, PathOp::Close]
        );
        assert_eq!(path.calc_int_bounds(), IntRect::new(1, 2, 3, 4));
    }

    #[test]
    fn test_add_star_vertex_count() {
        let mut path = Path::new();
        path.add_star(0.0, 0.0, 5, 10.0, 4.0, 0.0);
        // 1 move + 9 lines + close
        assert_eq!(path.len(), 11);
    }

    #[test]
    fn test_add_circle_bounds() {
        let mut path = Path::new();
        path.add_circle(5.0, 5.0, 3.0, 1.0);
        let b = path.calc_float_bounds();
        assert!(b.left >= 2.0 - 1e-9 && b.left <= 2.2);
        assert!(b.top >= 2.0 - 1e-9 && b.top <= 2.2);
    }

    #[test]
    fn test_transform_translate_rotate() {
        let mut path = Path::new();
        path.move_to(1.0, 0.0).line_to(2.0, 0.0);
        path.transform(&AffineTransform::identity().translate(10.0, 5.0));
        assert_eq!(path.get_position(), Vertex::new(12.0, 5.0));
        let mut path = Path::new();
        path.move_to(1.0, 0.0);
        path.transform(&AffineTransform::identity().rotate(std::f64::consts::PI / 2.0));
        let end = path.get_position();
        assert_near(end.x, 0.0);
        assert_near(end.y, 1.0);
    }
}
