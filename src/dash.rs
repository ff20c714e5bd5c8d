//! Dashing: walks each sub-path at unit speed, toggling the pen at every
//! stripe/gap boundary. A closed sub-path that starts and ends pen-down
//! is rotated so its first vertex sits at the last stripe's start, which
//! keeps the seam stripe continuous across the join.

use crate::basics::{min_value, Vertex, EPSILON};
use crate::path::{Instruction, Path, PathOp};

/// Replace `path` with a dashed version of itself. `dash_offset` shifts
/// the stripe pattern along the path and should lie in
/// `[0, dash_length + gap_length)`.
pub(crate) fn dash_path(path: &mut Path, dash_length: f64, gap_length: f64, dash_offset: f64) {
    debug_assert!(dash_length >= 0.0);
    debug_assert!(gap_length >= 0.0);
    debug_assert!(dash_offset >= 0.0 && dash_offset <= dash_length + gap_length);

    if gap_length < EPSILON {
        return;
    }

    let mut dashed: Vec<Instruction> = Vec::new();
    let init_r = (dash_length - dash_offset) % (dash_length + gap_length);
    let mut lv = Vertex::new(0.0, 0.0);
    let instructions = path.instructions();
    let mut it = 0;
    while it < instructions.len() {
        while it < instructions.len() && instructions[it].op != PathOp::Line {
            lv = instructions[it].vertex;
            it += 1;
        }
        if it != instructions.len() {
            let first_dash_index = dashed.len();
            let mut last_dash_index = first_dash_index;
            dashed.push(Instruction::new(PathOp::Move, lv));
            let mut first_pen_down = true;
            let mut r = init_r;
            if r < 0.0 {
                first_pen_down = false;
                r += gap_length;
            }
            let mut pen_down = first_pen_down;
            let mut is_closed = false;
            while it < instructions.len() && instructions[it].op != PathOp::Move && !is_closed {
                is_closed = instructions[it].op == PathOp::Close;
                let mut dx = instructions[it].vertex.x - lv.x;
                let mut dy = instructions[it].vertex.y - lv.y;
                let mut l = dx * dx + dy * dy;
                if l >= EPSILON {
                    l = l.sqrt();
                    dx /= l;
                    dy /= l;
                    loop {
                        let n = min_value(l, r);
                        lv.x += n * dx;
                        lv.y += n * dy;
                        l -= n;
                        r -= n;
                        if pen_down {
                            dashed.push(Instruction::new(PathOp::Line, lv));
                            if r <= 0.0 {
                                pen_down = false;
                                r += gap_length;
                            }
                        } else if r <= 0.0 {
                            pen_down = true;
                            last_dash_index = dashed.len();
                            dashed.push(Instruction::new(PathOp::Move, lv));
                            r += dash_length;
                        }
                        if l <= 0.0 {
                            break;
                        }
                    }
                }
                it += 1;
            }
            if first_dash_index != last_dash_index && is_closed && pen_down && first_pen_down {
                // Closed and pen-down at both ends: rotate so the final
                // stripe flows into the first one.
                dashed[first_dash_index].op = PathOp::Line;
                dashed[first_dash_index..].rotate_left(last_dash_index - first_dash_index);
            }
        }
    }

    *path.raw_mut() = dashed;
    let open = path.len().checked_sub(1);
    path.set_open_index(open);
}

// ============================================================================
// Tests
// ============================================================================
