// Iterative-deepening negamax with alpha-beta pruning.
//
// The search owns its transposition table, killer/history tables, the
// principal-variation table and the node counter; nothing is shared
// between concurrent searches. Alpha-beta is fail-hard: a cutoff
// returns beta, a node where no move raises alpha returns alpha.

use rand::Rng;

use crate::board::movegen::MoveList;
use crate::board::moves::Move;
use crate::board::position::Position;

use super::move_ordering::{is_capture, order_moves, HistoryTable, KillerMoves};
use super::quiescence::quiescence;
use super::transposition_table::{Bound, TableEntry, TranspositionTable};

/// Mate sentinel, larger than any material evaluation. A mate found at
/// ply p scores CHECKMATE - p, so shorter mates win.
pub const CHECKMATE: i32 = 10_000;
pub const STALEMATE: i32 = 0;

/// Default iterative-deepening target.
pub const DEPTH: u8 = 5;

/// Hard bound on the search stack and the heuristic tables.
pub const MAX_PLY: usize = 64;

pub struct Search {
    table: TranspositionTable,
    killers: KillerMoves,
    history: HistoryTable,
    pv_table: Box<[[Option<Move>; MAX_PLY]; MAX_PLY]>,
    pv_length: [usize; MAX_PLY],
    pub nodes: u64,
    max_depth: u8,
}

impl Search {
    pub fn new() -> Self {
        Self::with_depth(DEPTH)
    }

    pub fn with_depth(max_depth: u8) -> Self {
        Self {
            table: TranspositionTable::new(),
            killers: KillerMoves::new(),
            history: HistoryTable::new(),
            pv_table: Box::new([[None; MAX_PLY]; MAX_PLY]),
            pv_length: [0; MAX_PLY],
            nodes: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Pick the best move by deepening from 1 to the configured depth.
    /// Returns None only when the side to move has no legal moves.
    pub fn best_move(&mut self, pos: &mut Position) -> Option<Move> {
        self.killers.clear();
        self.history.clear();
        self.nodes = 0;

        let mut best = None;
        for depth in 1..=self.max_depth {
            let score = self.negamax(pos, -CHECKMATE, CHECKMATE, depth, 0);
            if self.pv_length[0] > 0 {
                best = self.pv_table[0][0];
            }
            log::info!(
                "depth {} score {} nodes {} pv {}",
                depth,
                score,
                self.nodes,
                self.principal_variation()
            );
            // A forced mate does not get better with more depth.
            if score.abs() >= CHECKMATE - MAX_PLY as i32 {
                break;
            }
        }
        best
    }

    /// The principal variation of the last completed iteration, in
    /// algebraic form.
    pub fn principal_variation(&self) -> String {
        self.pv_table[0][..self.pv_length[0]]
            .iter()
            .flatten()
            .map(|mv| mv.to_algebra())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn negamax(
        &mut self,
        pos: &mut Position,
        mut alpha: i32,
        mut beta: i32,
        depth: u8,
        ply: usize,
    ) -> i32 {
        self.pv_length[ply] = ply;
        self.nodes += 1;

        if ply >= MAX_PLY - 1 {
            return quiescence(pos, alpha, beta, ply, &mut self.nodes);
        }

        let mut preferred = None;

        if let Some(entry) = self.table.probe(pos.hash) {
            preferred = entry.best_move;
            // Root cutoffs are skipped: the caller needs a move, not
            // just a score.
            if ply > 0 && entry.depth >= depth {
                let score = score_from_table(entry.score, ply);
                match entry.bound {
                    Bound::Exact => return score,
                    Bound::Lower => alpha = alpha.max(score),
                    Bound::Upper => beta = beta.min(score),
                }
                if alpha >= beta {
                    return score;
                }
            }
        }

        if depth == 0 {
            return quiescence(pos, alpha, beta, ply, &mut self.nodes);
        }

        // Captured after the probe so a window narrowed by a stored
        // bound is not mistaken for an exact score below.
        let original_alpha = alpha;

        let mut moves = pos.legal_moves();
        if moves.is_empty() {
            return if pos.in_check() {
                -(CHECKMATE - ply as i32)
            } else {
                STALEMATE
            };
        }
        order_moves(pos, &mut moves, preferred, &self.killers, &self.history, ply);

        let mut best_move = None;

        for mv in moves {
            pos.make(mv);
            let score = -self.negamax(pos, -beta, -alpha, depth - 1, ply + 1);
            pos.undo();

            if score >= beta {
                // Quiet refutations feed the ordering heuristics.
                if !is_capture(pos, mv) {
                    self.killers.store(ply, mv);
                    self.history.update(mv, depth);
                }
                self.table.store(TableEntry {
                    key: pos.hash,
                    depth,
                    score: score_to_table(beta, ply),
                    bound: Bound::Lower,
                    best_move: Some(mv),
                });
                return beta;
            }

            if score > alpha {
                alpha = score;
                best_move = Some(mv);

                self.pv_table[ply][ply] = Some(mv);
                for i in ply + 1..self.pv_length[ply + 1] {
                    self.pv_table[ply][i] = self.pv_table[ply + 1][i];
                }
                self.pv_length[ply] = self.pv_length[ply + 1].max(ply + 1);
            }
        }

        let bound = if alpha > original_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.table.store(TableEntry {
            key: pos.hash,
            depth,
            score: score_to_table(alpha, ply),
            bound,
            best_move,
        });
        alpha
    }
}

impl Default for Search {
    fn default() -> Self {
        Self::new()
    }
}

/// Mate scores are stored relative to the probing node, not the root,
/// so a cached mate stays correct at any ply.
fn score_to_table(score: i32, ply: usize) -> i32 {
    if score >= CHECKMATE - MAX_PLY as i32 {
        score + ply as i32
    } else if score <= -(CHECKMATE - MAX_PLY as i32) {
        score - ply as i32
    } else {
        score
    }
}

fn score_from_table(score: i32, ply: usize) -> i32 {
    if score >= CHECKMATE - MAX_PLY as i32 {
        score - ply as i32
    } else if score <= -(CHECKMATE - MAX_PLY as i32) {
        score + ply as i32
    } else {
        score
    }
}

/// Uniformly random fallback for hosts that want a move even when the
/// search was cancelled.
pub fn random_move(moves: &MoveList) -> Option<Move> {
    if moves.is_empty() {
        return None;
    }
    let mut rng = rand::thread_rng();
    Some(moves[rng.gen_range(0..moves.len())])
}
