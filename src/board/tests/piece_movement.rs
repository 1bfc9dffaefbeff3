use super::*;

#[test]
fn knights_from_the_start() {
    let moves = Position::new().legal_moves();
    let knight_codes = ["7150", "7152", "7655", "7657"]; // Na3 Nc3 Nf3 Nh3
    for code in knight_codes {
        assert!(has_code(&moves, code), "missing {code}");
    }
    let from_b1 = moves_from(&moves, 7 * 8 + 1);
    let from_g1 = moves_from(&moves, 7 * 8 + 6);
    assert_eq!(from_b1.len() + from_g1.len(), 4);
}

#[test]
fn rook_range_on_an_open_board() {
    let position = pos("4k3/8/8/8/3R4/8/8/4K3 w - -");
    let moves = position.legal_moves();
    assert_eq!(moves_from(&moves, 4 * 8 + 3).len(), 14);
}

#[test]
fn bishop_range_on_an_open_board() {
    let position = pos("4k3/8/8/8/3B4/8/8/4K3 w - -");
    let moves = position.legal_moves();
    assert_eq!(moves_from(&moves, 4 * 8 + 3).len(), 13);
}

#[test]
fn queen_combines_rook_and_bishop() {
    let position = pos("4k3/8/8/8/3Q4/8/8/4K3 w - -");
    let moves = position.legal_moves();
    assert_eq!(moves_from(&moves, 4 * 8 + 3).len(), 27);
}

#[test]
fn king_has_eight_neighbours_in_the_open() {
    let position = pos("4k3/8/8/8/4K3/8/8/8 w - -");
    let moves = position.legal_moves();
    assert_eq!(moves_from(&moves, 4 * 8 + 4).len(), 8);
}

#[test]
fn sliders_stop_at_friendly_pieces() {
    // Rook d4 with a friendly pawn on d6: the file is cut short but
    // the pawn's square is not a target.
    let position = pos("4k3/8/3P4/8/3R4/8/8/4K3 w - -");
    let moves = position.legal_moves();
    let rook_moves = moves_from(&moves, 4 * 8 + 3);
    assert!(rook_moves.iter().any(|mv| mv.to_string() == "4333")); // d4d5
    assert!(!rook_moves.iter().any(|mv| mv.to_string() == "4323")); // d4d6 blocked
    assert_eq!(rook_moves.len(), 11);
}

#[test]
fn sliders_capture_the_first_enemy_piece_only() {
    // Rook d4, black pawns d6 and d7: d6 is capturable, d7 shielded.
    let position = pos("4k3/3p4/3p4/8/3R4/8/8/4K3 w - -");
    let moves = position.legal_moves();
    let rook_moves = moves_from(&moves, 4 * 8 + 3);
    assert!(rook_moves.iter().any(|mv| mv.to_string() == "4323")); // d4xd6
    assert!(!rook_moves.iter().any(|mv| mv.to_string() == "4313"));
}

#[test]
fn pieces_may_not_capture_the_king() {
    // A black rook stares at the white king; no generated black move
    // ends on e1.
    let position = pos("3k4/8/8/8/8/8/4r3/4K3 b - -");
    let moves = position.legal_moves();
    assert!(moves.iter().all(|mv| mv.to_square() != 7 * 8 + 4));
}
