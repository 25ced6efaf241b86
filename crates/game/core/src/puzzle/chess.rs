use super::{PuzzleModule, Surface};

/// White to move: find the fork.
const POSITION: [(&str, char); 6] = [
    ("f5", 'N'),
    ("g8", 'k'),
    ("e8", 'q'),
    ("c8", 'r'),
    ("h8", 'r'),
    ("a1", 'K'),
];

#[derive(Default)]
pub struct ChessFork;

impl ChessFork {
    pub fn new() -> Self {
        Self
    }

    /// ASCII board, rank 8 first. Uppercase is white.
    pub fn board() -> Vec<String> {
        let mut rows = Vec::with_capacity(9);
        for rank in (1..=8).rev() {
            let mut row = format!("{rank} ");
            for file in 'a'..='h' {
                let square = format!("{file}{rank}");
                let piece = POSITION
                    .iter()
                    .find(|(sq, _)| *sq == square)
                    .map(|(_, p)| *p)
                    .unwrap_or('.');
                row.push(piece);
                row.push(' ');
            }
            rows.push(row.trim_end().to_owned());
        }
        rows.push("  a b c d e f g h".to_owned());
        rows
    }
}

impl PuzzleModule for ChessFork {
    fn id(&self) -> &'static str {
        "chess"
    }

    fn title(&self) -> &'static str {
        "Forked Timeline"
    }

    fn mount(&mut self, surface: &mut dyn Surface) {
        surface.print_line(&format!("[GAME] {}", self.title()));
        for row in Self::board() {
            surface.print_line(&row);
        }
        surface.print_line("Solve via terminal: solve chess <MOVE>  (e.g., Nd6)");
    }
}
