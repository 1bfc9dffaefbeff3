use super::*;

// ==================== HELPER FUNCTIONS ====================

/// Parse a FEN that the test knows is valid.
pub fn pos(fen: &str) -> Position {
    Position::from_fen(fen).unwrap_or_else(|e| panic!("{e}"))
}

/// Wire codes of a move list.
pub fn codes(moves: &MoveList) -> Vec<String> {
    moves.iter().map(|mv| mv.to_string()).collect()
}

pub fn has_code(moves: &MoveList, code: &str) -> bool {
    moves.iter().any(|mv| mv.to_string() == code)
}

/// Apply a wire code after checking it is actually legal.
pub fn make_code(position: &mut Position, code: &str) {
    let mv = Move::parse(code).unwrap();
    assert!(
        position.legal_moves().contains(&mv),
        "{code} is not legal in {}",
        position.to_fen()
    );
    position.make(mv);
}

/// Moves starting from the given square.
pub fn moves_from(moves: &MoveList, square: usize) -> Vec<Move> {
    moves
        .iter()
        .copied()
        .filter(|mv| mv.from_square() == square)
        .collect()
}

// ==================== TEST MODULES ====================

mod piece_movement;
