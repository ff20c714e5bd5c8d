//! Stroke outline construction: expands a path's center line into a
//! closed outline covering the stroked area, honoring end caps, joint
//! styles, and a clipped miter limit.
//!
//! Each sub-path is traced twice, once along each side, offsetting every
//! segment by its perpendicular. Inner joints collapse to the offset-line
//! intersection when it exists; outer joints expand per the joint style.
//! The result is meant to be filled with the non-zero rule.

use crate::basics::{max_value, Vertex, EPSILON};
use crate::path::{calc_circle_rotation_vector, Instruction, Path, PathOp};

/// End cap shape for open sub-paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndCapStyle {
    Butt,
    Round,
    Square,
}

/// Joint shape at path corners. Miters are clipped at the miter limit
/// rather than falling back to a bevel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointStyle {
    Bevel,
    Curve,
    Miter,
}

/// One stroke segment: start vertex, delta per half-width unit, and
/// length in half-width units.
#[derive(Debug, Clone, Copy)]
struct StrokeSegment {
    v: Vertex,
    d: Vertex,
    l: f64,
}

impl StrokeSegment {
    fn new(v: Vertex, d: Vertex, l: f64) -> Self {
        StrokeSegment { v, d, l }
    }

    fn terminal(v: Vertex) -> Self {
        StrokeSegment {
            v,
            d: Vertex::new(0.0, 0.0),
            l: 0.0,
        }
    }
}

fn line_to(outline: &mut Vec<Instruction>, x: f64, y: f64) {
    outline.push(Instruction::new(PathOp::Line, Vertex::new(x, y)));
}

/// Arc around a joint: rotate a point about `(bx0, by0)`'s segment start
/// until it crosses into the forward half-plane of `(bdx, bdy)`. The arc
/// is always less than half a turn, so the plane test terminates it.
#[allow(clippy::too_many_arguments)]
fn stroke_rounded(
    outline: &mut Vec<Instruction>,
    ax1: f64,
    ay1: f64,
    bx0: f64,
    by0: f64,
    bdx: f64,
    bdy: f64,
    rx: f64,
    ry: f64,
) {
    let mut px = ax1 - bx0 + bdy;
    let mut py = ay1 - by0 - bdx;
    loop {
        line_to(outline, bx0 - bdy + px, by0 + bdx + py);
        let nx = px * rx - py * ry;
        let ny = px * ry + py * rx;
        px = nx;
        py = ny;
        if px * bdx + py * bdy >= 0.0 {
            break;
        }
    }
    line_to(outline, bx0, by0);
}

/// Emit the cap at a sub-path end. Square caps were pre-extended before
/// tracing, so they share the butt code here.
fn stroke_end(
    outline: &mut Vec<Instruction>,
    direction: f64,
    segs: &[StrokeSegment],
    end_caps: EndCapStyle,
    rx: f64,
    ry: f64,
) {
    let o = if direction >= 0.0 { 0 } else { 1 };
    let adx = segs[0].d.x * direction;
    let ady = segs[0].d.y * direction;
    let ax1 = segs[1 - o].v.x + ady;
    let ay1 = segs[1 - o].v.y - adx;

    let bx0 = ax1 - ady * 2.0;
    let by0 = ay1 + adx * 2.0;
    if end_caps == EndCapStyle::Round {
        stroke_rounded(outline, ax1, ay1, bx0, by0, -adx, -ady, rx, ry);
    } else {
        line_to(outline, ax1, ay1);
        line_to(outline, bx0, by0);
    }
}

/// Emit the outline along one side of the joint between two consecutive
/// segments. `direction` is +1 for the left side (following the path) and
/// -1 for the right side (walked in reverse).
#[allow(clippy::too_many_arguments)]
fn stroke_one_side(
    outline: &mut Vec<Instruction>,
    direction: f64,
    seg_a: &[StrokeSegment],
    seg_b: &[StrokeSegment],
    joints: JointStyle,
    miter_limit_w: f64,
    rx: f64,
    ry: f64,
) {
    let o = if direction >= 0.0 { 0 } else { 1 };

    let al = seg_a[0].l;
    let adx = seg_a[0].d.x * direction;
    let ady = seg_a[0].d.y * direction;
    let ax0 = seg_a[o].v.x + ady;
    let ay0 = seg_a[o].v.y - adx;
    let ax1 = seg_a[1 - o].v.x + ady;
    let ay1 = seg_a[1 - o].v.y - adx;
    let bl = seg_b[0].l;
    let bdx = seg_b[0].d.x * direction;
    let bdy = seg_b[0].d.y * direction;
    let bx0 = seg_b[o].v.x + bdy;
    let by0 = seg_b[o].v.y - bdx;

    // Inner joint when B lies inside A's half-plane (or the segments are
    // practically collinear).
    if (bx0 - ax1) * bdx < (ay1 - by0) * bdy + EPSILON * 2.0 {
        let d = bdx * ady - adx * bdy;
        let mut v = 0.0;
        let mut w = 0.0;
        if d.abs() >= EPSILON {
            v = (bdy * (ax0 - bx0) - bdx * (ay0 - by0)) / d;
            w = (ady * (ax0 - bx0) - adx * (ay0 - by0)) / d;
        }
        if v >= 0.0 && v <= al && w >= 0.0 && w <= bl {
            // Offset lines cross before either segment ends.
            line_to(outline, ax0 + adx * v, ay0 + ady * v);
        } else {
            // Fall back to a rhombus that fills correctly under non-zero.
            line_to(outline, ax1, ay1);
            line_to(outline, bx0, by0);
        }
    } else {
        match joints {
            JointStyle::Miter => {
                let d = bdx * ady - adx * bdy;
                let w = if d.abs() >= EPSILON {
                    (ady * (ax0 - bx0) - adx * (ay0 - by0)) / d
                } else {
                    0.0
                };
                if w > miter_limit_w {
                    line_to(outline, bx0 + bdx * w, by0 + bdy * w);
                } else {
                    // Clip the spike at the miter limit.
                    line_to(outline, ax1 - adx * miter_limit_w, ay1 - ady * miter_limit_w);
                    line_to(outline, bx0 + bdx * miter_limit_w, by0 + bdy * miter_limit_w);
                }
            }
            JointStyle::Bevel => {
                line_to(outline, ax1, ay1);
                line_to(outline, bx0, by0);
            }
            JointStyle::Curve => {
                stroke_rounded(outline, ax1, ay1, bx0, by0, bdx, bdy, rx, ry);
            }
        }
    }
}

/// Replace `path` with its stroke outline.
pub(crate) fn stroke_path(
    path: &mut Path,
    width: f64,
    end_caps: EndCapStyle,
    joints: JointStyle,
    miter_limit: f64,
    curve_quality: f64,
) {
    debug_assert!(width >= 0.0);
    debug_assert!(miter_limit >= 1.0);
    debug_assert!(curve_quality > 0.0);

    let mut outline: Vec<Instruction> = Vec::with_capacity(path.len() * 3);
    let width = max_value(width, EPSILON);

    let rcp_width = 2.0 / width;
    let miter_limit_w = if joints == JointStyle::Miter {
        -(miter_limit * miter_limit - 1.0).sqrt()
    } else {
        0.0
    };
    let mut rx = 0.0;
    let mut ry = 0.0;
    if joints == JointStyle::Curve || end_caps == EndCapStyle::Round {
        calc_circle_rotation_vector(curve_quality, width, &mut rx, &mut ry);
    }

    let mut lv = Vertex::new(0.0, 0.0);
    let mut segs: Vec<StrokeSegment> = Vec::with_capacity(path.len() + 2);

    let instructions = path.instructions();
    let mut it = 0;
    while it < instructions.len() {
        segs.clear();
        while it < instructions.len() && instructions[it].op != PathOp::Line {
            lv = instructions[it].vertex;
            it += 1;
        }
        let mut is_closed = false;
        while it < instructions.len() && instructions[it].op != PathOp::Move && !is_closed {
            is_closed = instructions[it].op == PathOp::Close;
            let nv = instructions[it].vertex;
            let dx = nv.x - lv.x;
            let dy = nv.y - lv.y;
            let mut l = dx * dx + dy * dy;
            if l >= EPSILON {
                l = l.sqrt() * rcp_width;
                segs.push(StrokeSegment::new(lv, Vertex::new(dx / l, dy / l), l));
                lv = nv;
            }
            it += 1;
        }
        // A degenerate sub-path still draws a dot: one cap's worth of
        // circle or square.
        if segs.is_empty() {
            segs.push(StrokeSegment::new(lv, Vertex::new(width * 0.5, 0.0), 1.0));
        }

        let count = segs.len();
        segs.push(StrokeSegment::terminal(lv));

        let mut first_vertex_index = outline.len();
        outline.push(Instruction::placeholder());

        if is_closed {
            for i in 0..count - 1 {
                stroke_one_side(
                    &mut outline,
                    1.0,
                    &segs[i..],
                    &segs[i + 1..],
                    joints,
                    miter_limit_w,
                    rx,
                    ry,
                );
            }
            stroke_one_side(
                &mut outline,
                1.0,
                &segs[count - 1..],
                &segs[0..],
                joints,
                miter_limit_w,
                rx,
                ry,
            );
            let position = outline.last().unwrap().vertex;
            outline.last_mut().unwrap().op = PathOp::Close;
            outline[first_vertex_index] = Instruction::new(PathOp::Move, position);
            first_vertex_index = outline.len();
            outline.push(Instruction::placeholder());
            for i in (1..count).rev() {
                stroke_one_side(
                    &mut outline,
                    -1.0,
                    &segs[i..],
                    &segs[i - 1..],
                    joints,
                    miter_limit_w,
                    rx,
                    ry,
                );
            }
            stroke_one_side(
                &mut outline,
                -1.0,
                &segs[0..],
                &segs[count - 1..],
                joints,
                miter_limit_w,
                rx,
                ry,
            );
        } else {
            if end_caps == EndCapStyle::Square {
                // Pre-extend both ends by half the width; the caps then
                // trace like butt caps with longer segments.
                segs[0].v.x -= segs[0].d.x;
                segs[0].v.y -= segs[0].d.y;
                segs[0].l += 1.0;
                segs[count].v.x += segs[count - 1].d.x;
                segs[count].v.y += segs[count - 1].d.y;
                segs[count - 1].l += 1.0;
            }
            for i in 0..count - 1 {
                stroke_one_side(
                    &mut outline,
                    1.0,
                    &segs[i..],
                    &segs[i + 1..],
                    joints,
                    miter_limit_w,
                    rx,
                    ry,
                );
            }
            stroke_end(&mut outline, 1.0, &segs[count - 1..], end_caps, rx, ry);
            for i in (1..count).rev() {
                stroke_one_side(
                    &mut outline,
                    -1.0,
                    &segs[i..],
                    &segs[i - 1..],
                    joints,
                    miter_limit_w,
                    rx,
                    ry,
                );
            }
            stroke_end(&mut outline, -1.0, &segs[0..], end_caps, rx, ry);
        }

        let position = outline.last().unwrap().vertex;
        outline.last_mut().unwrap().op = PathOp::Close;
        outline[first_vertex_index] = Instruction::new(PathOp::Move, position);
    }

    *path.raw_mut() = outline;
    path.set_open_index(None);
}

// ============================================================================
// Tests
// ============================================================================
