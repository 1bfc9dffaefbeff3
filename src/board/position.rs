// Game state and the make/undo protocol.
//
// Twelve piece boards plus side to move, castling rights, the
// en-passant target file, the move log and its history stacks, and an
// incrementally maintained Zobrist hash. Boards are mutated in place;
// no per-move allocation beyond the log/stack pushes.

use crate::board::bitboard::{popcount, square_bit, squares};
use crate::board::masks::FILES;
use crate::board::moves::{Move, MoveKind};
use crate::board::movegen::{self, MoveList};
use crate::board::piece::Piece;
use crate::board::zobrist::{self, ep_file_of, ZOBRIST};
use crate::errors::EngineError;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -";

/// Castling rights for both sides. Bits are only ever lost by make and
/// only restored by undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastleRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastleRights {
    pub const ALL: CastleRights = CastleRights {
        white_kingside: true,
        white_queenside: true,
        black_kingside: true,
        black_queenside: true,
    };

    pub const NONE: CastleRights = CastleRights {
        white_kingside: false,
        white_queenside: false,
        black_kingside: false,
        black_queenside: false,
    };

    /// 4-bit mask, the index into the Zobrist castle keys.
    pub fn index(self) -> usize {
        self.white_kingside as usize
            | (self.white_queenside as usize) << 1
            | (self.black_kingside as usize) << 2
            | (self.black_queenside as usize) << 3
    }
}

/// Home squares of the castling rooks: h1, a1, h8, a8.
pub const WHITE_KINGSIDE_ROOK: usize = 63;
pub const WHITE_QUEENSIDE_ROOK: usize = 56;
pub const BLACK_KINGSIDE_ROOK: usize = 7;
pub const BLACK_QUEENSIDE_ROOK: usize = 0;

#[derive(Clone)]
pub struct Position {
    /// One board per `Piece::ALL` entry.
    pub boards: [u64; 12],
    pub white_to_move: bool,
    pub rights: CastleRights,
    /// File mask of the en-passant destination, 0 when unavailable.
    pub ep: u64,
    pub hash: u64,
    pub move_log: Vec<Move>,
    /// En-passant state per ply, seeded with the initial value, so the
    /// stack is always one longer than the move log.
    pub ep_history: Vec<u64>,
    pub rights_history: Vec<CastleRights>,
    /// What each logged move captured, for undo and animation.
    captures: Vec<Option<Piece>>,
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl Position {
    /// The standard initial array.
    pub fn new() -> Position {
        Self::from_fen(START_FEN).expect("the initial position is valid")
    }

    /// Import the placement, side, castling and en-passant fields of a
    /// FEN string. Halfmove and fullmove counters are accepted but
    /// ignored.
    pub fn from_fen(fen: &str) -> Result<Position, EngineError> {
        let bad = |msg: &str| EngineError::InvalidFen(format!("{msg} in `{fen}`"));

        let mut parts = fen.split_whitespace();
        let placement = parts.next().ok_or_else(|| bad("missing placement"))?;

        let mut boards = [0u64; 12];
        let rows: Vec<&str> = placement.split('/').collect();
        if rows.len() != 8 {
            return Err(bad("expected 8 ranks"));
        }
        for (row, rank) in rows.iter().enumerate() {
            let mut col = 0usize;
            for c in rank.chars() {
                if let Some(run) = c.to_digit(10) {
                    if !(1..=8).contains(&run) {
                        return Err(bad("bad empty-square count"));
                    }
                    col += run as usize;
                } else if let Some(piece) = Piece::from_fen_char(c) {
                    if col >= 8 {
                        return Err(bad("rank overflows"));
                    }
                    boards[piece.index()] |= square_bit(row * 8 + col);
                    col += 1;
                } else {
                    return Err(bad("unknown piece letter"));
                }
            }
            if col != 8 {
                return Err(bad("rank does not describe 8 squares"));
            }
        }

        if popcount(boards[Piece::WhiteKing.index()]) != 1
            || popcount(boards[Piece::BlackKing.index()]) != 1
        {
            return Err(bad("each side needs exactly one king"));
        }

        let white_to_move = match parts.next() {
            Some("w") => true,
            Some("b") => false,
            _ => return Err(bad("missing or bad side to move")),
        };

        let mut rights = CastleRights::NONE;
        match parts.next() {
            None | Some("-") => {}
            Some(field) => {
                for c in field.chars() {
                    match c {
                        'K' => rights.white_kingside = true,
                        'Q' => rights.white_queenside = true,
                        'k' => rights.black_kingside = true,
                        'q' => rights.black_queenside = true,
                        _ => return Err(bad("bad castling field")),
                    }
                }
            }
        }

        let ep = match parts.next() {
            None | Some("-") => 0,
            Some(field) => {
                let mut chars = field.chars();
                match chars.next() {
                    Some(c @ 'a'..='h') => {
                        if chars.next().map(|r| !r.is_ascii_digit()).unwrap_or(false) {
                            return Err(bad("bad en-passant field"));
                        }
                        FILES[c as usize - 'a' as usize]
                    }
                    _ => return Err(bad("bad en-passant field")),
                }
            }
        };

        let mut pos = Position {
            boards,
            white_to_move,
            rights,
            ep,
            hash: 0,
            move_log: Vec::new(),
            ep_history: vec![ep],
            rights_history: vec![rights],
            captures: Vec::new(),
        };
        pos.hash = zobrist::hash_of(&pos);
        Ok(pos)
    }

    /// The piece occupying a square, if any.
    pub fn piece_on(&self, square: usize) -> Option<Piece> {
        let bit = square_bit(square);
        Piece::ALL
            .into_iter()
            .find(|p| self.boards[p.index()] & bit != 0)
    }

    /// 8x8 grid for display, row 0 = rank 8.
    pub fn mailbox(&self) -> [[Option<Piece>; 8]; 8] {
        let mut grid = [[None; 8]; 8];
        for piece in Piece::ALL {
            for sq in squares(self.boards[piece.index()]) {
                grid[sq / 8][sq % 8] = Some(piece);
            }
        }
        grid
    }

    /// All legal moves for the side to move.
    pub fn legal_moves(&self) -> MoveList {
        movegen::generate(self)
    }

    /// Whether the side to move's king is attacked.
    pub fn in_check(&self) -> bool {
        let (king, unsafe_squares) = if self.white_to_move {
            (
                self.boards[Piece::WhiteKing.index()],
                movegen::attacked_by_black(&self.boards),
            )
        } else {
            (
                self.boards[Piece::BlackKing.index()],
                movegen::attacked_by_white(&self.boards),
            )
        };
        king & unsafe_squares != 0
    }

    /// The piece taken by the most recent move, if it was a capture.
    pub fn last_captured(&self) -> Option<Piece> {
        self.captures.last().copied().flatten()
    }

    /// Apply a move from the legal list.
    pub fn make(&mut self, mv: Move) {
        let kind = mv.kind();
        let from = mv.from_square();
        let to = mv.to_square();
        let mover = self
            .piece_on(from)
            .expect("move start square must be occupied");
        let captured = match kind {
            MoveKind::EnPassant { captured, .. } => self.piece_on(captured),
            _ => self.piece_on(to),
        };
        let castle = castle_rook_shift(mover, mv, from);

        let new_ep = match kind {
            MoveKind::Normal { from, to }
                if (mover == Piece::WhitePawn || mover == Piece::BlackPawn)
                    && from.abs_diff(to) == 16 =>
            {
                FILES[to % 8]
            }
            _ => 0,
        };
        let new_rights = updated_rights(self.rights, mover, from, to, captured);

        self.hash ^= move_hash_delta(
            mover,
            kind,
            castle,
            captured,
            self.ep,
            new_ep,
            self.rights,
            new_rights,
        );

        apply_to_boards(&mut self.boards, kind, castle);

        self.ep = new_ep;
        self.rights = new_rights;
        self.white_to_move = !self.white_to_move;
        self.move_log.push(mv);
        self.ep_history.push(new_ep);
        self.rights_history.push(new_rights);
        self.captures.push(captured);

        self.assert_consistent();
    }

    /// Reverse the most recent move. Does nothing on an empty log.
    pub fn undo(&mut self) {
        let Some(mv) = self.move_log.pop() else {
            return;
        };
        self.ep_history.pop();
        self.rights_history.pop();
        let captured = self.captures.pop().expect("capture stack tracks the log");
        let old_ep = *self.ep_history.last().expect("stack holds the seed entry");
        let old_rights = *self
            .rights_history
            .last()
            .expect("stack holds the seed entry");

        let kind = mv.kind();
        let from = mv.from_square();
        let to = mv.to_square();
        let from_bit = square_bit(from);
        let to_bit = square_bit(to);

        let (mover, castle) = match kind {
            MoveKind::Promotion { piece, .. } => {
                let pawn = if piece.is_white() {
                    Piece::WhitePawn
                } else {
                    Piece::BlackPawn
                };
                self.boards[piece.index()] &= !to_bit;
                self.boards[pawn.index()] |= from_bit;
                if let Some(cap) = captured {
                    self.boards[cap.index()] |= to_bit;
                }
                (pawn, None)
            }
            MoveKind::EnPassant {
                captured: cap_sq, ..
            } => {
                let mover = self
                    .piece_on(to)
                    .expect("the moved pawn sits on the target square");
                self.boards[mover.index()] &= !to_bit;
                self.boards[mover.index()] |= from_bit;
                let cap = captured.expect("en passant always captures");
                self.boards[cap.index()] |= square_bit(cap_sq);
                (mover, None)
            }
            MoveKind::Normal { .. } => {
                let mover = self
                    .piece_on(to)
                    .expect("the moved piece sits on the target square");
                self.boards[mover.index()] &= !to_bit;
                self.boards[mover.index()] |= from_bit;
                if let Some(cap) = captured {
                    self.boards[cap.index()] |= to_bit;
                }
                let castle = castle_rook_shift(mover, mv, from);
                if let Some((rook, rook_from, rook_to)) = castle {
                    self.boards[rook.index()] &= !square_bit(rook_to);
                    self.boards[rook.index()] |= square_bit(rook_from);
                }
                (mover, castle)
            }
        };

        // XOR is its own inverse, so the identical delta restores the
        // previous hash.
        self.hash ^= move_hash_delta(
            mover,
            kind,
            castle,
            captured,
            old_ep,
            self.ep,
            old_rights,
            self.rights,
        );

        self.ep = old_ep;
        self.rights = old_rights;
        self.white_to_move = !self.white_to_move;

        self.assert_consistent();
    }

    /// Export the current state as FEN.
    pub fn to_fen(&self) -> String {
        let grid = self.mailbox();
        let mut fen = String::new();
        for (row, rank) in grid.iter().enumerate() {
            let mut empty = 0;
            for square in rank {
                match square {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if row < 7 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(if self.white_to_move { 'w' } else { 'b' });

        fen.push(' ');
        let mut rights = String::new();
        if self.rights.white_kingside {
            rights.push('K');
        }
        if self.rights.white_queenside {
            rights.push('Q');
        }
        if self.rights.black_kingside {
            rights.push('k');
        }
        if self.rights.black_queenside {
            rights.push('q');
        }
        if rights.is_empty() {
            rights.push('-');
        }
        fen.push_str(&rights);

        fen.push(' ');
        if self.ep == 0 {
            fen.push('-');
        } else {
            fen.push((b'a' + ep_file_of(self.ep) as u8) as char);
            // The target square sits behind the pawn that just pushed.
            fen.push(if self.white_to_move { '6' } else { '3' });
        }

        fen.push_str(" 0 1");
        fen
    }

    fn assert_consistent(&self) {
        #[cfg(debug_assertions)]
        {
            let xor = self.boards.iter().fold(0u64, |acc, b| acc ^ b);
            let or = self.boards.iter().fold(0u64, |acc, b| acc | b);
            debug_assert_eq!(xor, or, "piece boards overlap");
            debug_assert_eq!(popcount(self.boards[Piece::WhiteKing.index()]), 1);
            debug_assert_eq!(popcount(self.boards[Piece::BlackKing.index()]), 1);
            debug_assert_eq!(self.hash, zobrist::hash_of(self), "hash out of sync");
            debug_assert_eq!(self.move_log.len() + 1, self.ep_history.len());
            debug_assert_eq!(self.move_log.len() + 1, self.rights_history.len());
        }
    }
}

/// The rook relocation implied by a castle code, when `mv` really is a
/// castle: the mover is the right king standing on its home square.
pub(crate) fn castle_rook_shift(mover: Piece, mv: Move, from: usize) -> Option<(Piece, usize, usize)> {
    match (&mv.code(), mover) {
        (b"7476", Piece::WhiteKing) if from == 60 => {
            Some((Piece::WhiteRook, WHITE_KINGSIDE_ROOK, 61))
        }
        (b"7472", Piece::WhiteKing) if from == 60 => {
            Some((Piece::WhiteRook, WHITE_QUEENSIDE_ROOK, 59))
        }
        (b"0406", Piece::BlackKing) if from == 4 => {
            Some((Piece::BlackRook, BLACK_KINGSIDE_ROOK, 5))
        }
        (b"0402", Piece::BlackKing) if from == 4 => {
            Some((Piece::BlackRook, BLACK_QUEENSIDE_ROOK, 3))
        }
        _ => None,
    }
}

/// Per-board mutation shared by make and the generator's legality
/// probe. For a normal move every board that holds the start square
/// moves its piece; every other board clears the destination, which
/// handles captures without naming the victim.
pub(crate) fn apply_to_boards(
    boards: &mut [u64; 12],
    kind: MoveKind,
    castle: Option<(Piece, usize, usize)>,
) {
    match kind {
        MoveKind::Normal { from, to } => {
            let from_bit = square_bit(from);
            let to_bit = square_bit(to);
            for board in boards.iter_mut() {
                if *board & from_bit != 0 {
                    *board &= !from_bit;
                    *board |= to_bit;
                } else {
                    *board &= !to_bit;
                }
            }
            if let Some((rook, rook_from, rook_to)) = castle {
                boards[rook.index()] &= !square_bit(rook_from);
                boards[rook.index()] |= square_bit(rook_to);
            }
        }
        MoveKind::Promotion { from, to, piece } => {
            let from_bit = square_bit(from);
            let to_bit = square_bit(to);
            for (i, board) in boards.iter_mut().enumerate() {
                if i == piece.index() {
                    *board |= to_bit;
                } else {
                    // The pawn leaves the start square; any victim
                    // leaves the promotion square.
                    *board &= !(from_bit | to_bit);
                }
            }
        }
        MoveKind::EnPassant { from, to, captured } => {
            let from_bit = square_bit(from);
            let to_bit = square_bit(to);
            let cap_bit = square_bit(captured);
            for board in boards.iter_mut() {
                *board &= !cap_bit;
                if *board & from_bit != 0 {
                    *board &= !from_bit;
                    *board |= to_bit;
                }
            }
        }
    }
}

/// Castling rights after a move: a king move drops both of its side's
/// bits, a rook leaving a home square drops that bit, and capturing a
/// rook on its home square drops the victim's bit.
fn updated_rights(
    rights: CastleRights,
    mover: Piece,
    from: usize,
    to: usize,
    captured: Option<Piece>,
) -> CastleRights {
    let mut rights = rights;

    match mover {
        Piece::WhiteKing => {
            rights.white_kingside = false;
            rights.white_queenside = false;
        }
        Piece::BlackKing => {
            rights.black_kingside = false;
            rights.black_queenside = false;
        }
        Piece::WhiteRook => match from {
            WHITE_KINGSIDE_ROOK => rights.white_kingside = false,
            WHITE_QUEENSIDE_ROOK => rights.white_queenside = false,
            _ => {}
        },
        Piece::BlackRook => match from {
            BLACK_KINGSIDE_ROOK => rights.black_kingside = false,
            BLACK_QUEENSIDE_ROOK => rights.black_queenside = false,
            _ => {}
        },
        _ => {}
    }

    match captured {
        Some(Piece::WhiteRook) => match to {
            WHITE_KINGSIDE_ROOK => rights.white_kingside = false,
            WHITE_QUEENSIDE_ROOK => rights.white_queenside = false,
            _ => {}
        },
        Some(Piece::BlackRook) => match to {
            BLACK_KINGSIDE_ROOK => rights.black_kingside = false,
            BLACK_QUEENSIDE_ROOK => rights.black_queenside = false,
            _ => {}
        },
        _ => {}
    }

    rights
}

/// The XOR delta a move applies to the hash. Undo feeds the same
/// arguments back in to cancel it.
#[allow(clippy::too_many_arguments)]
fn move_hash_delta(
    mover: Piece,
    kind: MoveKind,
    castle: Option<(Piece, usize, usize)>,
    captured: Option<Piece>,
    ep_before: u64,
    ep_after: u64,
    rights_before: CastleRights,
    rights_after: CastleRights,
) -> u64 {
    let keys = &*ZOBRIST;
    let mut delta = 0u64;

    match kind {
        MoveKind::Normal { from, to } => {
            delta ^= keys.piece[mover.index()][from];
            delta ^= keys.piece[mover.index()][to];
            if let Some(cap) = captured {
                delta ^= keys.piece[cap.index()][to];
            }
        }
        MoveKind::Promotion { from, to, piece } => {
            delta ^= keys.piece[mover.index()][from];
            delta ^= keys.piece[piece.index()][to];
            if let Some(cap) = captured {
                delta ^= keys.piece[cap.index()][to];
            }
        }
        MoveKind::EnPassant {
            from,
            to,
            captured: cap_sq,
        } => {
            delta ^= keys.piece[mover.index()][from];
            delta ^= keys.piece[mover.index()][to];
            let cap = captured.expect("en passant always captures");
            delta ^= keys.piece[cap.index()][cap_sq];
        }
    }

    if let Some((rook, rook_from, rook_to)) = castle {
        delta ^= keys.piece[rook.index()][rook_from];
        delta ^= keys.piece[rook.index()][rook_to];
    }

    delta ^= keys.castle[rights_before.index()];
    delta ^= keys.castle[rights_after.index()];

    if ep_before != 0 {
        delta ^= keys.ep_file[ep_file_of(ep_before)];
    }
    if ep_after != 0 {
        delta ^= keys.ep_file[ep_file_of(ep_after)];
    }

    delta ^ keys.side
}
