// Console host: a human plays the engine over stdin, or a perft run
// for correctness work. The engine plays from the opening book while
// the game stays in it, then switches to the search.

use std::io::{self, BufRead, Write};

use clap::Parser;

use tarrasch::ai::{self, Search, DEPTH};
use tarrasch::board::{perft, Move, MoveKind, Piece, Position};
use tarrasch::book::OpeningBook;
use tarrasch::errors::EngineError;

#[derive(Parser)]
#[command(name = "tarrasch", about = "A bitboard chess engine")]
struct Args {
    /// Play the black pieces.
    #[arg(long)]
    black: bool,

    /// Start from this FEN instead of the initial position.
    #[arg(long)]
    fen: Option<String>,

    /// Maximum search depth.
    #[arg(long, default_value_t = DEPTH)]
    depth: u8,

    /// Verbose engine output.
    #[arg(short, long)]
    debug: bool,

    /// Run a perft-divide at this depth and exit.
    #[arg(long)]
    perft: Option<u32>,
}

fn main() -> Result<(), EngineError> {
    let args = Args::parse();
    env_logger::Builder::from_default_env()
        .filter_level(if args.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let mut pos = match &args.fen {
        Some(fen) => Position::from_fen(fen)?,
        None => Position::new(),
    };

    if let Some(depth) = args.perft {
        perft::perft_divide(&mut pos, depth);
        return Ok(());
    }

    let human_plays_white = !args.black;
    let mut search = Search::with_depth(args.depth);
    let book = OpeningBook::main_lines();
    let mut rng = rand::thread_rng();
    let stdin = io::stdin();

    println!("moves as e2e4 (e7e8q to promote, O-O / O-O-O to castle); quit to exit");

    loop {
        print_board(&pos);
        let moves = pos.legal_moves();
        if moves.is_empty() {
            if pos.in_check() {
                let winner = if pos.white_to_move { "black" } else { "white" };
                println!("checkmate, {winner} wins");
            } else {
                println!("stalemate");
            }
            break;
        }

        if pos.white_to_move == human_plays_white {
            print!("> ");
            io::stdout().flush().ok();
            let Some(Ok(line)) = stdin.lock().lines().next() else {
                break;
            };
            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            if input == "quit" {
                break;
            }
            if input == "undo" {
                // Take back the engine's reply as well.
                pos.undo();
                pos.undo();
                continue;
            }
            match find_move(&moves, input, &pos) {
                Some(mv) => pos.make(mv),
                None => println!("{}", EngineError::InvalidMove(input.to_string())),
            }
        } else {
            let played: Vec<String> = pos.move_log.iter().map(|mv| mv.to_algebra()).collect();
            let from_book = book
                .sample(&played, &mut rng)
                .and_then(|algebra| moves.iter().copied().find(|mv| mv.to_algebra() == algebra));
            if from_book.is_some() {
                log::debug!("still in book after {} moves", played.len());
            }
            let mv = from_book
                .or_else(|| search.best_move(&mut pos))
                .or_else(|| ai::random_move(&moves));
            match mv {
                Some(mv) => {
                    println!("engine plays {}", pretty(mv, &pos));
                    pos.make(mv);
                }
                None => break,
            }
        }
    }

    Ok(())
}

/// Resolve a typed move against the legal list. Accepts two-square
/// algebra (with promotion suffix), castle names, or the raw wire
/// code.
fn find_move(moves: &[Move], input: &str, pos: &Position) -> Option<Move> {
    let wanted = match input {
        "O-O" | "0-0" => {
            if pos.white_to_move {
                "e1g1".to_string()
            } else {
                "e8g8".to_string()
            }
        }
        "O-O-O" | "0-0-0" => {
            if pos.white_to_move {
                "e1c1".to_string()
            } else {
                "e8c8".to_string()
            }
        }
        other => other.to_string(),
    };
    moves
        .iter()
        .copied()
        .find(|mv| mv.to_algebra().eq_ignore_ascii_case(&wanted) || mv.to_string() == wanted)
}

/// Castles print as O-O/O-O-O, everything else in two-square algebra.
fn pretty(mv: Move, pos: &Position) -> String {
    if let MoveKind::Normal { from, to } = mv.kind() {
        let king = if pos.white_to_move {
            Piece::WhiteKing
        } else {
            Piece::BlackKing
        };
        if pos.piece_on(from) == Some(king) && from.abs_diff(to) == 2 {
            return if to % 8 == 6 { "O-O" } else { "O-O-O" }.to_string();
        }
    }
    mv.to_algebra()
}

fn print_board(pos: &Position) {
    let grid = pos.mailbox();
    for (row, rank) in grid.iter().enumerate() {
        print!("{} ", 8 - row);
        for square in rank {
            match square {
                Some(piece) => print!(" {}", piece.fen_char()),
                None => print!(" ."),
            }
        }
        println!();
    }
    println!("   a b c d e f g h");
}
