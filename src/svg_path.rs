//! SVG 1.1 path-data parsing: the `M/L/H/V/C/S/Q/T/A/Z` command set with
//! relative forms, smooth-command reflection state, and elliptical arcs
//! converted from endpoint to center parameterization.
//!
//! Curves flatten straight into line instructions through the path's own
//! curve methods. Coordinates beyond a magnitude of 10^6 are rejected.

use crate::basics::{max_value, Vertex, EPSILON, PI2};
use crate::error::SvgPathError;
use crate::path::Path;
use crate::transform::AffineTransform;

const COORDINATE_LIMIT: f64 = 1_000_000.0;

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(data: &'a str) -> Self {
        Scanner {
            bytes: data.as_bytes(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eat_space(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Skip whitespace and at most one separating comma.
    fn eat_space_and_comma(&mut self) {
        self.eat_space();
        if self.peek() == Some(b',') {
            self.pos += 1;
            self.eat_space();
        }
    }

    /// Parse a floating-point number at the cursor; the cursor does not
    /// move on failure.
    fn parse_double(&mut self) -> Option<f64> {
        let start = self.pos;
        let mut p = self.pos;
        let bytes = self.bytes;
        if p < bytes.len() && (bytes[p] == b'+' || bytes[p] == b'-') {
            p += 1;
        }
        let mut digits = 0;
        while p < bytes.len() && bytes[p].is_ascii_digit() {
            p += 1;
            digits += 1;
        }
        if p < bytes.len() && bytes[p] == b'.' {
            p += 1;
            while p < bytes.len() && bytes[p].is_ascii_digit() {
                p += 1;
                digits += 1;
            }
        }
        if digits == 0 {
            return None;
        }
        if p < bytes.len() && (bytes[p] == b'e' || bytes[p] == b'E') {
            let mut q = p + 1;
            if q < bytes.len() && (bytes[q] == b'+' || bytes[q] == b'-') {
                q += 1;
            }
            let mut exp_digits = 0;
            while q < bytes.len() && bytes[q].is_ascii_digit() {
                q += 1;
                exp_digits += 1;
            }
            if exp_digits > 0 {
                p = q;
            }
        }
        let text = std::str::from_utf8(&bytes[start..p]).ok()?;
        let value: f64 = text.parse().ok()?;
        self.pos = p;
        Some(value)
    }

    /// A coordinate: finite and within the magnitude limit.
    fn parse_coordinate(&mut self) -> Option<f64> {
        let saved = self.pos;
        match self.parse_double() {
            Some(v) if v.is_finite() && v.abs() <= COORDINATE_LIMIT => Some(v),
            _ => {
                self.pos = saved;
                None
            }
        }
    }

    fn parse_coordinate_pair(&mut self, accept_leading_comma: bool) -> Option<Vertex> {
        let saved = self.pos;
        if accept_leading_comma {
            self.eat_space_and_comma();
        } else {
            self.eat_space();
        }
        let x = match self.parse_coordinate() {
            Some(x) => x,
            None => {
                self.pos = saved;
                return None;
            }
        };
        self.eat_space_and_comma();
        match self.parse_coordinate() {
            Some(y) => Some(Vertex::new(x, y)),
            None => {
                self.pos = saved;
                None
            }
        }
    }

    fn parse_int(&mut self) -> Option<i32> {
        let start = self.pos;
        let mut p = self.pos;
        let bytes = self.bytes;
        if p < bytes.len() && (bytes[p] == b'+' || bytes[p] == b'-') {
            p += 1;
        }
        let mut digits = 0;
        while p < bytes.len() && bytes[p].is_ascii_digit() {
            p += 1;
            digits += 1;
        }
        if digits == 0 {
            return None;
        }
        let text = std::str::from_utf8(&bytes[start..p]).ok()?;
        let value: i32 = text.parse().ok()?;
        self.pos = p;
        Some(value)
    }
}

fn to_absolute(path: &Path, is_relative: bool, v: Vertex) -> Vertex {
    if is_relative {
        let pos = path.get_position();
        Vertex::new(pos.x + v.x, pos.y + v.y)
    } else {
        v
    }
}

/// Parse SVG path data and append the resulting instructions to `path`.
pub fn parse_svg_path(
    data: &str,
    curve_quality: f64,
    path: &mut Path,
) -> Result<(), SvgPathError> {
    debug_assert!(curve_quality > 0.0);
    let mut scanner = Scanner::new(data);
    let mut quadratic_reflection = Vertex::new(0.0, 0.0);
    let mut cubic_reflection = Vertex::new(0.0, 0.0);

    scanner.eat_space();
    if scanner.at_end() {
        return Ok(());
    }
    if scanner.peek() != Some(b'M') && scanner.peek() != Some(b'm') {
        return Err(SvgPathError::MissingInitialMove);
    }

    while !scanner.at_end() {
        scanner.eat_space();
        if scanner.at_end() {
            break;
        }
        let raw = scanner.peek().unwrap();
        scanner.pos += 1;
        let is_relative = raw.is_ascii_lowercase();
        let command = raw.to_ascii_uppercase() as char;
        if command != 'T' {
            quadratic_reflection = Vertex::new(0.0, 0.0);
        }
        if command != 'S' {
            cubic_reflection = Vertex::new(0.0, 0.0);
        }
        let mut first = true;
        match command {
            'M' => {
                let v = match scanner.parse_coordinate_pair(false) {
                    Some(v) => v,
                    None => return Err(SvgPathError::BadCommandSyntax('M')),
                };
                let v = to_absolute(path, is_relative, v);
                path.move_to(v.x, v.y);
                while let Some(v) = scanner.parse_coordinate_pair(true) {
                    let v = to_absolute(path, is_relative, v);
                    path.line_to(v.x, v.y);
                }
            }

            'L' => {
                let mut v = match scanner.parse_coordinate_pair(false) {
                    Some(v) => v,
                    None => return Err(SvgPathError::BadCommandSyntax('L')),
                };
                loop {
                    let a = to_absolute(path, is_relative, v);
                    path.line_to(a.x, a.y);
                    match scanner.parse_coordinate_pair(true) {
                        Some(next) => v = next,
                        None => break,
                    }
                }
            }

            'H' | 'V' => {
                let mut pos = path.get_position();
                let mut committed = scanner.pos;
                scanner.eat_space();
                while let Some(v) = scanner.parse_coordinate() {
                    if command == 'H' {
                        if is_relative {
                            pos.x += v;
                        } else {
                            pos.x = v;
                        }
                    } else if is_relative {
                        pos.y += v;
                    } else {
                        pos.y = v;
                    }
                    path.line_to(pos.x, pos.y);
                    committed = scanner.pos;
                    scanner.eat_space_and_comma();
                }
                scanner.pos = committed;
            }

            'C' => loop {
                let saved = scanner.pos;
                let triple = (|| {
                    let bcp = scanner.parse_coordinate_pair(!first)?;
                    let ecp = scanner.parse_coordinate_pair(true)?;
                    let v = scanner.parse_coordinate_pair(true)?;
                    Some((bcp, ecp, v))
                })();
                match triple {
                    Some((bcp, ecp, v)) => {
                        first = false;
                        let bcp = to_absolute(path, is_relative, bcp);
                        let ecp = to_absolute(path, is_relative, ecp);
                        let v = to_absolute(path, is_relative, v);
                        cubic_reflection = Vertex::new(v.x - ecp.x, v.y - ecp.y);
                        path.cubic_to(bcp.x, bcp.y, ecp.x, ecp.y, v.x, v.y, curve_quality);
                    }
                    None => {
                        scanner.pos = saved;
                        break;
                    }
                }
            },

            'S' => loop {
                let saved = scanner.pos;
                let pair = (|| {
                    let ecp = scanner.parse_coordinate_pair(!first)?;
                    let v = scanner.parse_coordinate_pair(true)?;
                    Some((ecp, v))
                })();
                match pair {
                    Some((ecp, v)) => {
                        first = false;
                        let pos = path.get_position();
                        let bcp =
                            Vertex::new(pos.x + cubic_reflection.x, pos.y + cubic_reflection.y);
                        let ecp = to_absolute(path, is_relative, ecp);
                        let v = to_absolute(path, is_relative, v);
                        cubic_reflection = Vertex::new(v.x - ecp.x, v.y - ecp.y);
                        path.cubic_to(bcp.x, bcp.y, ecp.x, ecp.y, v.x, v.y, curve_quality);
                    }
                    None => {
                        scanner.pos = saved;
                        break;
                    }
                }
            },

            'Q' => loop {
                let saved = scanner.pos;
                let pair = (|| {
                    let cp = scanner.parse_coordinate_pair(!first)?;
                    let v = scanner.parse_coordinate_pair(true)?;
                    Some((cp, v))
                })();
                match pair {
                    Some((cp, v)) => {
                        first = false;
                        let cp = to_absolute(path, is_relative, cp);
                        let v = to_absolute(path, is_relative, v);
                        quadratic_reflection = Vertex::new(v.x - cp.x, v.y - cp.y);
                        path.quadratic_to(cp.x, cp.y, v.x, v.y, curve_quality);
                    }
                    None => {
                        scanner.pos = saved;
                        break;
                    }
                }
            },

            'T' => loop {
                match scanner.parse_coordinate_pair(!first) {
                    Some(v) => {
                        first = false;
                        let pos = path.get_position();
                        let cp = Vertex::new(
                            pos.x + quadratic_reflection.x,
                            pos.y + quadratic_reflection.y,
                        );
                        let v = to_absolute(path, is_relative, v);
                        quadratic_reflection = Vertex::new(v.x - cp.x, v.y - cp.y);
                        path.quadratic_to(cp.x, cp.y, v.x, v.y, curve_quality);
                    }
                    None => break,
                }
            },

            'A' => loop {
                let saved = scanner.pos;
                let args = (|| {
                    let radii = scanner.parse_coordinate_pair(!first)?;
                    scanner.eat_space_and_comma();
                    let x_axis_rotation = scanner.parse_coordinate()?;
                    scanner.eat_space_and_comma();
                    let large_arc_flag = scanner.parse_int()?;
                    scanner.eat_space_and_comma();
                    let sweep_flag = scanner.parse_int()?;
                    let v = scanner.parse_coordinate_pair(true)?;
                    Some((radii, x_axis_rotation, large_arc_flag, sweep_flag, v))
                })();
                let (radii, x_axis_rotation, large_arc_flag, sweep_flag, v) = match args {
                    Some(a) => a,
                    None => {
                        scanner.pos = saved;
                        break;
                    }
                };
                first = false;
                let v = to_absolute(path, is_relative, v);
                let rx = radii.x.abs();
                let ry = radii.y.abs();
                if rx >= EPSILON && ry >= EPSILON {
                    let mut start_pos = path.get_position();
                    let mut end_pos = v;
                    let mut affine_reverse = AffineTransform::identity();
                    if x_axis_rotation != 0.0 {
                        // Work in a frame where the ellipse axes align
                        // with the coordinate axes.
                        affine_reverse =
                            AffineTransform::identity().rotate(x_axis_rotation * (PI2 / 360.0));
                        let mut affine_forward = affine_reverse;
                        let inverted = affine_forward.invert();
                        debug_assert!(inverted);
                        start_pos = affine_forward.apply(start_pos);
                        end_pos = affine_forward.apply(end_pos);
                    }
                    let dx = end_pos.x - start_pos.x;
                    let dy = end_pos.y - start_pos.y;
                    if dx.abs() >= EPSILON || dy.abs() >= EPSILON {
                        let large_arc_sign = if large_arc_flag != 0 { 1.0 } else { -1.0 };
                        let sweep_sign = if sweep_flag != 0 {
                            large_arc_sign
                        } else {
                            -large_arc_sign
                        };
                        let aspect_ratio = rx / ry;
                        let l = dx * dx + (aspect_ratio * dy) * (aspect_ratio * dy);
                        let b = max_value(4.0 * rx * rx / l - 1.0, EPSILON);
                        let a = sweep_sign * (b * 0.25).sqrt();
                        let center_x = start_pos.x + dx * 0.5 + a * dy * aspect_ratio;
                        let center_y = start_pos.y + dy * 0.5 - a * dx / aspect_ratio;
                        let sweep_radians = sweep_sign
                            * (large_arc_sign * std::f64::consts::PI + std::f64::consts::PI
                                - ((b - 1.0) / (1.0 + b)).acos());
                        if x_axis_rotation != 0.0 {
                            let mut temp_path = Path::new();
                            temp_path.line_to(start_pos.x, start_pos.y);
                            temp_path.arc_sweep(
                                center_x,
                                center_y,
                                sweep_radians,
                                aspect_ratio,
                                curve_quality,
                            );
                            temp_path.transform(&affine_reverse);
                            path.append(&temp_path);
                        } else {
                            path.arc_sweep(
                                center_x,
                                center_y,
                                sweep_radians,
                                aspect_ratio,
                                curve_quality,
                            );
                        }
                    }
                }
                path.line_to(v.x, v.y);
            },

            'Z' => {
                path.close();
            }

            _ => return Err(SvgPathError::UnknownCommand(raw as char)),
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathOp;

    fn assert_near(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }

    #[test]
    fn test_basic_square() {
        let path = Path::from_svg("M0 0 L10 0 L10 10 L0 10 Z", 1.0).unwrap();
        let ops: Vec<PathOp> = path.instructions().iter().map(|i| i.op).collect();
        assert_eq!(
            ops,
            vec![PathOp::Move, PathOp::Line, PathOp::Line, PathOp::Line, PathOp::Close]
        );
        assert_eq!(path.instructions()[4].vertex, Vertex::new(0.0, 0.0));
    }

    #[test]
    fn test_relative_commands() {
        let path = Path::from_svg("m1 1 l2 0 l0 2 z", 1.0).unwrap();
        let v: Vec<Vertex> = path.instructions().iter().map(|i| i.vertex).collect();
        assert_eq!(v[0], Vertex::new(1.0, 1.0));
        assert_eq!(v[1], Vertex::new(3.0, 1.0));
        assert_eq!(v[2], Vertex::new(3.0, 3.0));
    }

    #[test]
    fn test_implicit_line_after_move() {
        // extra coordinate pairs after M become line-tos
        let path = Path::from_svg("M0 0 5 0 5 5", 1.0).unwrap();
        let ops: Vec<PathOp> = path.instructions().iter().map(|i| i.op).collect();
        assert_eq!(ops, vec![PathOp::Move, PathOp::Line, PathOp::Line]);
    }

    #[test]
    fn test_horizontal_and_vertical() {
        let path = Path::from_svg("M1 2 H5 V7 h-2 v-3", 1.0).unwrap();
        let v: Vec<Vertex> = path.instructions().iter().map(|i| i.vertex).collect();
        assert_eq!(v[1], Vertex::new(5.0, 2.0));
        assert_eq!(v[2], Vertex::new(5.0, 7.0));
        assert_eq!(v[3], Vertex::new(3.0, 7.0));
        assert_eq!(v[4], Vertex::new(3.0, 4.0));
    }

    #[test]
    fn test_separators_and_notation() {
        let path = Path::from_svg("M 1e1,2.5 L -3.5e-1 .25", 1.0).unwrap();
        let v: Vec<Vertex> = path.instructions().iter().map(|i| i.vertex).collect();
        assert_eq!(v[0], Vertex::new(10.0, 2.5));
        assert_near(v[1].x, -0.35);
        assert_near(v[1].y, 0.25);
    }

    #[test]
    fn test_cubic_and_smooth() {
        let path = Path::from_svg("M0 0 C 0 10, 10 10, 10 0 S 20 -10, 20 0", 1.0).unwrap();
        let end = path.get_position();
        assert_near(end.x, 20.0);
        assert_near(end.y, 0.0);
        assert!(path.len() > 4);
    }

    #[test]
    fn test_quadratic_and_smooth() {
        let path = Path::from_svg("M0 0 Q 5 10, 10 0 T 20 0", 1.0).unwrap();
        let end = path.get_position();
        assert_near(end.x, 20.0);
        assert_near(end.y, 0.0);
        // the smooth half mirrors the first: some vertex dips below zero
        let min_y = path
            .instructions()
            .iter()
            .map(|i| i.vertex.y)
            .fold(f64::MAX, f64::min);
        assert!(min_y < -3.0);
    }

    #[test]
    fn test_arc_reaches_endpoint() {
        let path = Path::from_svg("M0 0 A 5 5 0 0 1 10 0", 1.0).unwrap();
        let end = path.get_position();
        assert_near(end.x, 10.0);
        assert_near(end.y, 0.0);
        assert!(path.len() > 3);
    }

    #[test]
    fn test_arc_with_rotation() {
        let path = Path::from_svg("M0 0 A 10 5 30 0 1 10 4", 1.0).unwrap();
        let end = path.get_position();
        assert_near(end.x, 10.0);
        assert_near(end.y, 4.0);
    }

    #[test]
    fn test_degenerate_arc_is_line() {
        let path = Path::from_svg("M0 0 A 0 5 0 0 1 10 0", 1.0).unwrap();
        let ops: Vec<PathOp> = path.instructions().iter().map(|i| i.op).collect();
        assert_eq!(ops, vec![PathOp::Move, PathOp::Line]);
    }

    #[test]
    fn test_must_begin_with_move() {
        assert_eq!(
            Path::from_svg("L10 0", 1.0).unwrap_err(),
            SvgPathError::MissingInitialMove
        );
        // empty and whitespace-only inputs are fine
        assert!(Path::from_svg("", 1.0).unwrap().is_empty());
        assert!(Path::from_svg("   ", 1.0).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_move_arguments() {
        assert_eq!(
            Path::from_svg("M banana", 1.0).unwrap_err(),
            SvgPathError::BadCommandSyntax('M')
        );
        assert_eq!(
            Path::from_svg("M 1", 1.0).unwrap_err(),
            SvgPathError::BadCommandSyntax('M')
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            Path::from_svg("M0 0 X 5 5", 1.0).unwrap_err(),
            SvgPathError::UnknownCommand('X')
        );
    }

    #[test]
    fn test_coordinate_limit() {
        assert!(Path::from_svg("M2000000 0", 1.0).is_err());
        assert!(Path::from_svg("M999999 0", 1.0).is_ok());
    }

    #[test]
    fn test_multiple_subpaths() {
        let path = Path::from_svg("M0 0 L1 0 Z M5 5 L6 5 Z", 1.0).unwrap();
        let moves = path
            .instructions()
            .iter()
            .filter(|i| i.op == PathOp::Move)
            .count();
        assert_eq!(moves, 2);
    }
}
