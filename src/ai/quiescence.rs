// Quiescence search: at the horizon, keep searching captures until the
// position goes quiet, so the static evaluation is never taken in the
// middle of an exchange. The side to move may always "stand pat" on
// the current evaluation.

use crate::board::movegen::MoveList;
use crate::board::position::Position;

use super::evaluation::evaluate_relative;
use super::move_ordering::{capture_score, is_capture};
use super::search::MAX_PLY;

pub fn quiescence(
    pos: &mut Position,
    mut alpha: i32,
    beta: i32,
    ply: usize,
    nodes: &mut u64,
) -> i32 {
    *nodes += 1;

    let stand_pat = evaluate_relative(pos);
    if ply >= MAX_PLY {
        return stand_pat;
    }
    if stand_pat >= beta {
        return beta;
    }
    if stand_pat > alpha {
        alpha = stand_pat;
    }

    let mut captures: MoveList = pos
        .legal_moves()
        .into_iter()
        .filter(|mv| is_capture(pos, *mv))
        .collect();
    captures.sort_by_cached_key(|&mv| -capture_score(pos, mv).unwrap_or(0));

    for mv in captures {
        pos.make(mv);
        let score = -quiescence(pos, -beta, -alpha, ply + 1, nodes);
        pos.undo();

        if score >= beta {
            return beta;
        }
        if score > alpha {
            alpha = score;
        }
    }

    alpha
}
