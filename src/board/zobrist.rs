// Zobrist keys for position hashing.
//
// One random 64-bit key per (piece, square), one for the side to move,
// one per castling-rights mask and one per en-passant file. Keys come
// from a fixed seed so hashes are reproducible across runs; the table
// is generated once and read-only afterwards.

use std::sync::LazyLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::bitboard::squares;
use crate::board::piece::Piece;
use crate::board::position::Position;

pub struct ZobristKeys {
    /// Indexed `[piece][square]` in board-array order.
    pub piece: [[u64; 64]; 12],
    /// XORed in when black is to move.
    pub side: u64,
    /// Indexed by the 4-bit castling-rights mask.
    pub castle: [u64; 16],
    /// Indexed by the en-passant target file.
    pub ep_file: [u64; 8],
}

impl ZobristKeys {
    fn generate() -> Self {
        let mut rng = StdRng::seed_from_u64(0x9d3c_0fab_51e6_24c7);

        let mut piece = [[0u64; 64]; 12];
        for board in &mut piece {
            for square in board.iter_mut() {
                *square = rng.gen();
            }
        }

        let mut castle = [0u64; 16];
        for key in &mut castle {
            *key = rng.gen();
        }

        let mut ep_file = [0u64; 8];
        for key in &mut ep_file {
            *key = rng.gen();
        }

        Self {
            piece,
            side: rng.gen(),
            castle,
            ep_file,
        }
    }
}

pub static ZOBRIST: LazyLock<ZobristKeys> = LazyLock::new(ZobristKeys::generate);

/// Hash a position from scratch. Used after FEN import and to check
/// the incrementally maintained hash.
pub fn hash_of(pos: &Position) -> u64 {
    let mut hash = 0u64;

    for piece in Piece::ALL {
        for square in squares(pos.boards[piece.index()]) {
            hash ^= ZOBRIST.piece[piece.index()][square];
        }
    }

    hash ^= ZOBRIST.castle[pos.rights.index()];

    if pos.ep != 0 {
        hash ^= ZOBRIST.ep_file[ep_file_of(pos.ep)];
    }

    if !pos.white_to_move {
        hash ^= ZOBRIST.side;
    }

    hash
}

/// File index of a nonzero en-passant file mask. The mask's topmost
/// bit sits on rank 8, so its leading-zero count is the file.
pub fn ep_file_of(ep: u64) -> usize {
    debug_assert_ne!(ep, 0);
    ep.leading_zeros() as usize
}
