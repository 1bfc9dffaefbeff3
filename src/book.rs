// Opening book: a trie over move sequences in two-square algebraic
// form. The root is the empty game; each node maps a move string to
// the continuations the book knows after it.

use std::collections::HashMap;

use rand::Rng;

#[derive(Default)]
struct BookNode {
    children: HashMap<String, BookNode>,
    /// A prepared line ends here; deeper play is out of book.
    terminal: bool,
}

pub struct OpeningBook {
    root: BookNode,
}

impl OpeningBook {
    /// Build a book from lines of space-separated moves ("e2e4 e7e5
    /// g1f3 ...").
    pub fn from_lines<'a, I>(lines: I) -> OpeningBook
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut root = BookNode::default();
        for line in lines {
            let mut node = &mut root;
            for token in line.split_whitespace() {
                node = node.children.entry(token.to_string()).or_default();
            }
            node.terminal = true;
        }
        OpeningBook { root }
    }

    /// A small set of mainline openings.
    pub fn main_lines() -> OpeningBook {
        Self::from_lines(MAIN_LINES.iter().copied())
    }

    /// The continuations the book knows after the played sequence, or
    /// None once the game has left the book. A line-end marker closes
    /// the book even when longer lines share the prefix.
    pub fn lookup(&self, played: &[String]) -> Option<Vec<&str>> {
        let mut node = &self.root;
        for mv in played {
            node = node.children.get(mv)?;
        }
        if node.terminal || node.children.is_empty() {
            None
        } else {
            Some(node.children.keys().map(String::as_str).collect())
        }
    }

    /// Pick uniformly among the continuations at the current node.
    pub fn sample<R: Rng>(&self, played: &[String], rng: &mut R) -> Option<String> {
        let mut choices = self.lookup(played)?;
        // HashMap iteration order is arbitrary; sort so a seeded rng
        // gives reproducible games.
        choices.sort_unstable();
        Some(choices[rng.gen_range(0..choices.len())].to_string())
    }
}

const MAIN_LINES: &[&str] = &[
    "e2e4 e7e5 g1f3 b8c6 f1b5 a7a6 b5a4 g8f6 e1g1 f8e7",
    "e2e4 e7e5 g1f3 b8c6 f1c4 f8c5 c2c3 g8f6 d2d3 d7d6",
    "e2e4 e7e5 g1f3 g8f6 f3e5 d7d6 e5f3 f6e4 d2d4 d6d5",
    "e2e4 c7c5 g1f3 d7d6 d2d4 c5d4 f3d4 g8f6 b1c3 a7a6",
    "e2e4 c7c5 g1f3 b8c6 d2d4 c5d4 f3d4 g8f6 b1c3 e7e5",
    "e2e4 e7e6 d2d4 d7d5 b1c3 g8f6 c1g5 f8e7 e4e5 f6d7",
    "e2e4 c7c6 d2d4 d7d5 b1c3 d5e4 c3e4 c8f5 e4g3 f5g6",
    "d2d4 d7d5 c2c4 e7e6 b1c3 g8f6 c1g5 f8e7 e2e3 e8g8",
    "d2d4 d7d5 c2c4 c7c6 g1f3 g8f6 b1c3 d5c4 a2a4 c8f5",
    "d2d4 g8f6 c2c4 e7e6 b1c3 f8b4 e2e3 e8g8 f1d3 d7d5",
    "d2d4 g8f6 c2c4 g7g6 b1c3 f8g7 e2e4 d7d6 g1f3 e8g8",
    "g1f3 d7d5 g2g3 g8f6 f1g2 e7e6 e1g1 f8e7 d2d4 e8g8",
    "c2c4 e7e5 b1c3 g8f6 g1f3 b8c6 g2g3 d7d5 c4d5 f6d5",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Position;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn played(moves: &[&str]) -> Vec<String> {
        moves.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn root_offers_the_first_moves() {
        let book = OpeningBook::main_lines();
        let choices = book.lookup(&[]).unwrap();
        assert!(choices.contains(&"e2e4"));
        assert!(choices.contains(&"d2d4"));
        assert!(choices.contains(&"g1f3"));
        assert!(choices.contains(&"c2c4"));
    }

    #[test]
    fn follows_a_known_line() {
        let book = OpeningBook::main_lines();
        let choices = book.lookup(&played(&["e2e4", "e7e5", "g1f3"])).unwrap();
        assert!(choices.contains(&"b8c6"));
    }

    #[test]
    fn leaves_the_book_on_unknown_moves() {
        let book = OpeningBook::main_lines();
        assert!(book.lookup(&played(&["h2h4"])).is_none());
        assert!(book
            .lookup(&played(&["e2e4", "e7e5", "g1f3", "g8h6"]))
            .is_none());
    }

    #[test]
    fn line_ends_are_out_of_book() {
        let book = OpeningBook::from_lines(["e2e4 e7e5"]);
        assert!(book.lookup(&played(&["e2e4", "e7e5"])).is_none());
    }

    #[test]
    fn a_line_end_marker_closes_longer_lines_too() {
        let book = OpeningBook::from_lines(["e2e4 e7e5", "e2e4 e7e5 g1f3 b8c6"]);
        assert!(book.lookup(&played(&["e2e4"])).is_some());
        assert!(book.lookup(&played(&["e2e4", "e7e5"])).is_none());
        assert!(book.sample(&played(&["e2e4", "e7e5"]), &mut StdRng::seed_from_u64(1)).is_none());
    }

    #[test]
    fn every_main_line_replays_legally() {
        for line in MAIN_LINES {
            let mut position = Position::new();
            for token in line.split_whitespace() {
                let mv = position
                    .legal_moves()
                    .into_iter()
                    .find(|mv| mv.to_algebra() == token)
                    .unwrap_or_else(|| {
                        panic!("{token} is not legal after `{}`", position.to_fen())
                    });
                position.make(mv);
            }
        }
    }

    #[test]
    fn sample_returns_a_known_continuation() {
        let book = OpeningBook::main_lines();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let pick = book.sample(&[], &mut rng).unwrap();
            assert!(book.lookup(&[]).unwrap().contains(&pick.as_str()));
        }
    }

    #[test]
    fn empty_book_is_always_out_of_book() {
        let book = OpeningBook::from_lines(std::iter::empty());
        assert!(book.lookup(&[]).is_none());
    }
}
