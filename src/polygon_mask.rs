//! Analytic polygon rasterization: converts a path into an anti-aliased
//! coverage mask, renderable row by row through the span interface.
//!
//! Edges are converted to segments with 8 sub-pixel fraction bits. For
//! each rendered row every engaged segment deposits signed area into a
//! per-column delta array; integrating the deltas left to right and
//! mapping the running sum through the fill rule yields 8-bit coverage.
//! Because the deltas are column-exact, output is bit-identical no matter
//! how a row is sliced into render requests. Rows must be visited top to
//! bottom; requesting a row above the last one rewinds to the top.

use std::cell::RefCell;

use log::warn;

use crate::basics::{
    max_value, min_value, sort_pair, IntRect, Rect, EMPTY_RECT, MAX_RENDER_LENGTH,
};
use crate::fixed::Fixed32_32;
use crate::path::{Path, PathOp};
use crate::pixel::Mask8;
use crate::renderer::Renderer;
use crate::span::SpanBuffer;

const FRACT_BITS: i32 = 8;
const FRACT_MASK: i32 = (1 << FRACT_BITS) - 1;
const FRACT_ONE: i32 = 1 << FRACT_BITS;
const COVERAGE_BITS: i32 = 8;

/// Marks a segment retired from the current row so the horizontal order
/// pass drops it.
const RETIRED: i32 = -0x7FFF_FFFF;

// ============================================================================
// Fill rules
// ============================================================================

/// Mapping from the signed winding accumulator to coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    /// Coverage is the absolute winding sum, saturated.
    NonZero,
    /// Coverage folds back on every winding overlap.
    EvenOdd,
}

impl FillRule {
    fn process_coverage(self, source: &[i32], destination: &mut [u8]) {
        match self {
            FillRule::NonZero => {
                for (d, &s) in destination.iter_mut().zip(source) {
                    *d = min_value(s.wrapping_abs() >> (COVERAGE_BITS + FRACT_BITS - 8), 0xFF)
                        as u8;
                }
            }
            FillRule::EvenOdd => {
                const K: i32 = 1 << (COVERAGE_BITS + FRACT_BITS);
                for (d, &s) in destination.iter_mut().zip(source) {
                    let c = if s & K != 0 {
                        (!s & (K - 1)) + 1
                    } else {
                        s & (K - 1)
                    };
                    *d = min_value(c >> (COVERAGE_BITS + FRACT_BITS - 8), 0xFF) as u8;
                }
            }
        }
    }
}

// ============================================================================
// Segment
// ============================================================================

/// One polygon edge prepared for scanline traversal. Vertical range is in
/// 8-bit-fraction fixed point; `x` tracks the intersection with the top
/// of the current row in 32.32 fixed point (of 8-bit-fraction units).
#[derive(Debug, Clone, Copy)]
struct Segment {
    top_y: i32,
    bottom_y: i32,
    x: Fixed32_32,
    dx: Fixed32_32,
    /// Signed unit coverage deposited per column crossed; the sign
    /// carries the winding direction.
    coverage_by_x: i32,
    current_y: i32,
    left_edge: i32,
    right_edge: i32,
}

impl Segment {
    fn sentinel() -> Self {
        Segment {
            top_y: i32::MAX,
            bottom_y: i32::MAX,
            x: Fixed32_32::ZERO,
            dx: Fixed32_32::ZERO,
            coverage_by_x: 0,
            current_y: i32::MAX,
            left_edge: 0,
            right_edge: 0,
        }
    }
}

// ============================================================================
// PolygonMask
// ============================================================================

/// Per-render mutable state, kept in a `RefCell` because rendering is
/// observationally const but advances cursors. One thread at a time.
struct State {
    segments: Vec<Segment>,
    row: i32,
    engaged_start: usize,
    engaged_end: usize,
    coverage_delta: Vec<i32>,
    /// Segment indices ordered by (top row, left edge).
    vertical: Vec<usize>,
    /// Segment indices kept in left-edge order for the current row.
    horizontal: Vec<usize>,
}

/// A coverage-mask renderer for a filled path.
///
/// The clip rectangle must cover (or exceed) the full bounds of whatever
/// pulls from the mask. A path with non-finite or out-of-range vertices
/// produces an *invalid* mask: `is_valid()` reports false and every
/// render request yields full transparency.
pub struct PolygonMask {
    bounds: IntRect,
    fill_rule: FillRule,
    valid: bool,
    state: RefCell<State>,
}

impl PolygonMask {
    /// Largest vertex magnitude (in canvas units) the fixed-point segment
    /// setup can represent.
    const VERTEX_LIMIT: f64 = (0x7FFF_FFFF >> FRACT_BITS) as f64;

    pub fn new(path: &Path, clip_bounds: IntRect, fill_rule: FillRule) -> Self {
        // Clamp the clip rectangle to the numeric limits the rasterizer
        // handles.
        debug_assert!(clip_bounds.width >= 0 && clip_bounds.height >= 0);
        let limit = 0x7FFF_FFFF >> FRACT_BITS;
        let mut cb = clip_bounds;
        cb.left = max_value(-limit, min_value(cb.left, limit));
        cb.top = max_value(-limit, min_value(cb.top, limit));
        let right_bound = max_value(-limit, min_value(clip_bounds.calc_right(), limit));
        let bottom_bound = max_value(-limit, min_value(clip_bounds.calc_bottom(), limit));
        cb.width = max_value(0, right_bound - cb.left);
        cb.height = max_value(0, bottom_bound - cb.top);

        let invalid = || {
            warn!("polygon mask rejected path with non-finite or out-of-range vertex");
            PolygonMask {
                bounds: EMPTY_RECT,
                fill_rule,
                valid: false,
                state: RefCell::new(State {
                    segments: Vec::new(),
                    row: 0,
                    engaged_start: 0,
                    engaged_end: 0,
                    coverage_delta: Vec::new(),
                    vertical: Vec::new(),
                    horizontal: Vec::new(),
                }),
            }
        };

        let mut segments: Vec<Segment> = Vec::with_capacity(path.len() + 1);
        let mut min_y = 0x3FFF_FFFF;
        let mut min_x = 0x3FFF_FFFF;
        let mut max_y = -0x3FFF_FFFF;
        let mut max_x = -0x3FFF_FFFF;
        let top = cb.top << FRACT_BITS;
        let right = right_bound << FRACT_BITS;
        let bottom = bottom_bound << FRACT_BITS;
        let mut lx = 0;
        let mut ly = 0;

        let to_fixed = |v: f64| -> Option<i32> {
            if !v.is_finite() || v.abs() > Self::VERTEX_LIMIT {
                None
            } else {
                Some(crate::basics::round_to_int(v * FRACT_ONE as f64))
            }
        };

        let instructions = path.instructions();
        let mut i = 0;
        while i < instructions.len() {
            // Begin a new contour.
            while i < instructions.len() && instructions[i].op == PathOp::Move {
                let v = instructions[i].vertex;
                match (to_fixed(v.x), to_fixed(v.y)) {
                    (Some(x), Some(y)) => {
                        lx = x;
                        ly = y;
                    }
                    _ => return invalid(),
                }
                i += 1;
            }
            while i < instructions.len() && instructions[i].op != PathOp::Move {
                let v = instructions[i].vertex;
                let (nx, ny) = match (to_fixed(v.x), to_fixed(v.y)) {
                    (Some(x), Some(y)) => (x, y),
                    _ => return invalid(),
                };
                let mut x0 = lx;
                let mut y0 = ly;
                let mut x1 = nx;
                let mut y1 = ny;
                lx = nx;
                ly = ny;
                let mut reversed = false;
                if y0 > y1 {
                    // Segments always run from top to bottom.
                    std::mem::swap(&mut y0, &mut y1);
                    std::mem::swap(&mut x0, &mut x1);
                    reversed = true;
                }

                // Skip horizontal edges and edges fully outside the clip.
                if y0 != y1 && y1 > top && y0 < bottom && min_value(x0, x1) < right {
                    let mut seg = Segment {
                        top_y: y0,
                        bottom_y: y1,
                        x: Fixed32_32::from_parts(x0, 0),
                        dx: Fixed32_32::ZERO,
                        coverage_by_x: 0,
                        current_y: 0,
                        left_edge: x0 >> FRACT_BITS,
                        right_edge: 0,
                    };
                    let mut coverage_by_x = 1 << (COVERAGE_BITS + FRACT_BITS);
                    let dx = x1 - x0;
                    if dx != 0 {
                        let dy = y1 - y0;
                        seg.dx = Fixed32_32::divide(dx, dy);
                        debug_assert!(dy >= 0);
                        let dy_by_dx = Fixed32_32::divide(dy, dx.abs());
                        // A shallow edge covers each column by dy/|dx|;
                        // steeper than one row per column keeps the
                        // saturated default.
                        if dy_by_dx.high32() == 0 {
                            coverage_by_x = dy_by_dx
                                .shift_left((COVERAGE_BITS + FRACT_BITS) as u32)
                                .high32();
                        }
                    }
                    seg.coverage_by_x = if reversed { -coverage_by_x } else { coverage_by_x };
                    if top > seg.top_y {
                        // Starts above the clip: advance to the clip top.
                        seg.x = seg.x.add(seg.dx.mul_i32(top - seg.top_y));
                        seg.top_y = top;
                        seg.left_edge = seg.x.high32() >> FRACT_BITS;
                    }
                    seg.current_y = seg.top_y;
                    seg.right_edge = seg.left_edge;
                    segments.push(seg);
                }

                min_y = min_value(min_y, y0);
                max_y = max_value(max_y, y1);
                sort_pair(&mut x0, &mut x1);
                min_x = min_value(min_x, x0);
                max_x = max_value(max_x, x1);
                i += 1;
            }
        }

        // Sentinel so the scan loops need no index checks.
        segments.push(Segment::sentinel());

        let mut bounds = Rect {
            left: min_x >> FRACT_BITS,
            top: min_y >> FRACT_BITS,
            width: 0,
            height: 0,
        };
        bounds.width = ((max_x + FRACT_MASK) >> FRACT_BITS) - bounds.left;
        bounds.height = ((max_y + FRACT_MASK) >> FRACT_BITS) - bounds.top;
        let bounds = bounds.calc_intersection(&cb);
        let coverage_delta =
            vec![0i32; min_value(bounds.width + 1, MAX_RENDER_LENGTH + 1) as usize];

        let mask = PolygonMask {
            bounds,
            fill_rule,
            valid: true,
            state: RefCell::new(State {
                segments,
                row: 0,
                engaged_start: 0,
                engaged_end: 0,
                coverage_delta,
                vertical: Vec::new(),
                horizontal: Vec::new(),
            }),
        };
        rewind(&mut mask.state.borrow_mut(), mask.bounds);
        mask
    }

    /// False when the path had a non-finite or out-of-range vertex; such
    /// a mask renders as fully transparent.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }
}

/// Reset rendering state so the next request starts from the top row.
fn rewind(state: &mut State, bounds: IntRect) {
    let State {
        segments,
        row,
        engaged_start,
        engaged_end,
        coverage_delta,
        vertical,
        horizontal,
    } = state;
    *row = bounds.top;
    *engaged_start = 0;
    *engaged_end = 0;
    coverage_delta.fill(0);
    for seg in segments.iter_mut() {
        if seg.current_y != seg.top_y {
            let dy = seg.current_y - seg.top_y;
            seg.x = seg.x.add(seg.dx.mul_i32(-dy));
            seg.current_y = seg.top_y;
        }
        seg.left_edge = seg.x.high32() >> FRACT_BITS;
        seg.right_edge = seg.left_edge;
    }

    vertical.clear();
    vertical.extend(0..segments.len());
    let segments: &[Segment] = segments;
    vertical.sort_unstable_by_key(|&i| (segments[i].top_y >> FRACT_BITS, segments[i].left_edge));
    // The horizontal list starts identical and is kept in x order
    // incrementally while rendering.
    horizontal.clear();
    horizontal.extend_from_slice(vertical);
}

impl Renderer<Mask8> for PolygonMask {
    fn calc_bounds(&self) -> IntRect {
        if self.valid {
            self.bounds
        } else {
            EMPTY_RECT
        }
    }

    fn render(&self, x: i32, y: i32, length: i32, output: &mut SpanBuffer<Mask8>) {
        if !self.valid {
            output.add_transparent(length);
            return;
        }
        debug_assert!(0 < length && length <= MAX_RENDER_LENGTH);
        let mut x = x;
        let mut length = length;
        let clip_left = self.bounds.left;
        let clip_right = self.bounds.calc_right();
        if x + length <= clip_left || x >= clip_right {
            output.add_transparent(length);
            return;
        }
        let mut right_clip = 0;
        if x < clip_left {
            let left_clip = clip_left - x;
            output.add_transparent(left_clip);
            x = clip_left;
            length -= left_clip;
        }
        if x + length > clip_right {
            right_clip = x + length - clip_right;
            length -= right_clip;
        }
        let clip_top = self.bounds.top;
        let clip_bottom = clip_top + self.bounds.height;
        if y < clip_top || y >= clip_bottom {
            output.add_transparent(length);
            if right_clip > 0 {
                output.add_transparent(right_clip);
            }
            return;
        }

        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;

        if y < state.row {
            rewind(state, self.bounds);
        }

        let State {
            segments,
            row,
            engaged_start,
            engaged_end,
            coverage_delta,
            vertical,
            horizontal,
        } = state;

        if y > *row {
            // Catch engaged and soon-to-engage segments up to this row.
            let y_fixed = y << FRACT_BITS;
            let mut seg_index = *engaged_start;
            while segments[vertical[seg_index]].top_y < y_fixed {
                let seg_id = vertical[seg_index];
                let seg = &mut segments[seg_id];
                let dy = y_fixed - seg.current_y;
                if dy > 0 {
                    seg.x = seg.x.add(seg.dx.mul_i32(dy));
                    seg.current_y = y_fixed;
                }
                seg_index += 1;
            }
            *row = y;
        }

        let row_fixed = *row << FRACT_BITS;

        let mut include_index = *engaged_end;
        while segments[vertical[include_index]].top_y < row_fixed + FRACT_ONE {
            include_index += 1;
        }

        // Merge newly engaged segments into the x-ordered list (both
        // sublists are sorted by left edge already; engaged entries hold
        // request-relative edges, new ones absolute columns).
        {
            let mut insert_index = include_index as isize - 1;
            let mut h_index = *engaged_end as isize - 1;
            let mut v_index = insert_index;
            let low = *engaged_start as isize;
            let high = *engaged_end as isize;
            while insert_index >= low && (v_index >= high || h_index != insert_index) {
                let take_engaged = v_index < high
                    || (h_index >= low
                        && segments[horizontal[h_index as usize]].left_edge
                            > segments[vertical[v_index as usize]].left_edge - x);
                if take_engaged {
                    let moved = horizontal[h_index as usize];
                    horizontal[insert_index as usize] = moved;
                    h_index -= 1;
                } else {
                    horizontal[insert_index as usize] = vertical[v_index as usize];
                    v_index -= 1;
                }
                insert_index -= 1;
            }
        }

        // Deposit each engaged segment's signed area into the delta array.
        *engaged_end = include_index;
        let mut integrate_index = *engaged_start;
        for draw_index in *engaged_start..*engaged_end {
            let seg_id = vertical[draw_index];
            let seg = &mut segments[seg_id];

            if row_fixed >= seg.bottom_y {
                seg.left_edge = RETIRED;
                vertical.swap(integrate_index, draw_index);
                integrate_index += 1;
                continue;
            }

            let coverage_by_x = seg.coverage_by_x;
            // Signed total area this segment contributes to this row.
            let mut remaining: i32;
            let dx_step: Fixed32_32;
            if row_fixed < seg.top_y || row_fixed + FRACT_ONE > seg.bottom_y {
                // Partial row (entering or leaving): scale by the
                // sub-pixel overlap.
                let dy = (min_value(seg.bottom_y - row_fixed, FRACT_ONE)
                    - max_value(seg.top_y - row_fixed, 0)) as u16;
                remaining = (if coverage_by_x < 0 {
                    -(1 << COVERAGE_BITS)
                } else {
                    1 << COVERAGE_BITS
                }) * dy as i32;
                dx_step = seg.dx.mul_u16(dy);
            } else {
                remaining = if coverage_by_x < 0 {
                    -(1 << (COVERAGE_BITS + FRACT_BITS))
                } else {
                    1 << (COVERAGE_BITS + FRACT_BITS)
                };
                dx_step = seg.dx.shift_left(FRACT_BITS as u32);
            }
            let mut left_x = seg.x.high32();
            let mut right_x = seg.x.add(dx_step).high32();
            sort_pair(&mut left_x, &mut right_x);
            let mut left_col = (left_x >> FRACT_BITS) - x;
            let right_col = (right_x >> FRACT_BITS) - x;
            let left_sub = left_x & FRACT_MASK;
            let right_sub = right_x & FRACT_MASK;

            if left_col >= length {
                // Entirely right of the request.
                seg.left_edge = length;
                seg.right_edge = length;
            } else if right_col < 0 {
                // Entirely left of the request: all area lands at column 0.
                seg.left_edge = 0;
                seg.right_edge = 0;
                coverage_delta[0] += remaining;
            } else if left_col == right_col {
                // Both endpoints in one column: split the area between
                // the two boundaries by the x centroid.
                seg.left_edge = left_col;
                let coverage =
                    (2 * FRACT_ONE - left_sub - right_sub) * remaining >> (FRACT_BITS + 1);
                coverage_delta[left_col as usize] += coverage;
                coverage_delta[(left_col + 1) as usize] += remaining - coverage;
                seg.right_edge = left_col + 1;
            } else {
                // Area already spent left of the interior run.
                let covered: i32;
                if left_col < 0 {
                    // Enters from the clip left: precharge column 0.
                    seg.left_edge = 0;
                    let mut c = (min_value(right_col, 0) - left_col) * coverage_by_x;
                    c += -left_sub * coverage_by_x >> FRACT_BITS;
                    coverage_delta[0] += c;
                    covered = c;
                    left_col = 0;
                } else {
                    // Left partial pixel split between its boundaries.
                    seg.left_edge = left_col;
                    let lx = FRACT_ONE - left_sub;
                    let c = lx * coverage_by_x >> FRACT_BITS;
                    let coverage = lx * c >> (FRACT_BITS + 1);
                    coverage_delta[left_col as usize] += coverage;
                    coverage_delta[(left_col + 1) as usize] += c - coverage;
                    covered = c;
                    left_col += 1;
                }
                let col_count = right_col - left_col;
                if col_count > 0 {
                    // Interior columns: half a unit at each end of the
                    // run, a full unit at interior boundaries.
                    coverage_delta[left_col as usize] += coverage_by_x >> 1;
                    let end = min_value(left_col + col_count, length);
                    for col in (left_col + 1)..end {
                        coverage_delta[col as usize] += coverage_by_x;
                    }
                    coverage_delta[end as usize] += coverage_by_x - (coverage_by_x >> 1);
                }
                if right_col < length {
                    // Right partial pixel gets whatever area is left.
                    remaining -= covered + col_count * coverage_by_x;
                    let coverage = (2 * FRACT_ONE - right_sub) * remaining >> (FRACT_BITS + 1);
                    coverage_delta[right_col as usize] += coverage;
                    coverage_delta[(right_col + 1) as usize] += remaining - coverage;
                    seg.right_edge = right_col + 1;
                } else {
                    // Exits past the clip right: no right partial inside.
                    seg.right_edge = length;
                }
            }
        }

        // Drop retired segments from the horizontal list and restore its
        // left-edge order for the survivors.
        {
            let mut order_index = *engaged_end as isize - 1;
            let mut sort_index = order_index;
            while order_index >= integrate_index as isize {
                let candidate = horizontal[sort_index as usize];
                if segments[candidate].left_edge != RETIRED {
                    let mut seek_index = order_index as usize;
                    while seek_index < *engaged_end - 1
                        && segments[horizontal[seek_index + 1]].left_edge
                            < segments[candidate].left_edge
                    {
                        let moved = horizontal[seek_index + 1];
                        horizontal[seek_index] = moved;
                        seek_index += 1;
                    }
                    horizontal[seek_index] = candidate;
                    order_index -= 1;
                }
                sort_index -= 1;
            }
        }
        *engaged_start = integrate_index;

        // Integrate the deltas and emit mask spans: solid runs between
        // engaged extents, variable coverage inside them.
        let mut coverage_acc = 0i32;
        let mut col = 0i32;
        let mut scan_index = integrate_index;
        while col < length {
            let mut nx = if scan_index < *engaged_end {
                segments[horizontal[scan_index]].left_edge
            } else {
                length
            };
            if nx > col {
                coverage_acc += coverage_delta[col as usize];
                let source = [coverage_acc];
                let mut pixel = [0u8];
                self.fill_rule.process_coverage(&source, &mut pixel);
                coverage_delta[col as usize] = 0;
                output.add_solid(nx - col, pixel[0]);
                col = nx;
            }

            // Extend the active extent while the next segment starts
            // within (or nearly within) the current one.
            if scan_index < *engaged_end {
                nx = segments[horizontal[scan_index]].right_edge;
                while scan_index + 1 < *engaged_end
                    && nx + 4 >= segments[horizontal[scan_index + 1]].left_edge
                {
                    scan_index += 1;
                    nx = max_value(segments[horizontal[scan_index]].right_edge, nx);
                }
                scan_index += 1;
            }

            if nx > col {
                let span_length = nx - col;
                for i in 0..span_length {
                    coverage_acc += coverage_delta[(col + i) as usize];
                    coverage_delta[(col + i) as usize] = coverage_acc;
                }
                let pixels = output.add_variable(span_length, false);
                self.fill_rule.process_coverage(
                    &coverage_delta[col as usize..(col + span_length) as usize],
                    pixels,
                );
                for i in 0..span_length {
                    coverage_delta[(col + i) as usize] = 0;
                }
                col = nx;
            }
        }

        coverage_delta[length as usize] = 0;
        if right_clip > 0 {
            output.add_transparent(right_clip);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
