//! Routing observatory: three code snippets, each sending Jack to a node.
use super::{PuzzleModule, Surface};

/// Snippet key → source shown by `showcode`.
pub const SNIPPETS: [(&str, &str); 3] = [
    (
        "A",
        "dest = 'N2'\nif 7 % 2 == 1:\n    dest = 'N4'\nprint(dest)",
    ),
    (
        "B",
        "x = 20\nif x > 10:\n    next_node = 'N5'\nelse:\n    next_node = 'N3'",
    ),
    (
        "C",
        "route = 'N1'\nfor _ in range(2):\n    route = 'N6'\nprint(route)",
    ),
];

/// Snippet key → node the snippet routes to.
pub const ROUTES: [(&str, &str); 3] = [("A", "N4"), ("B", "N5"), ("C", "N6")];

pub fn snippet(key: &str) -> Option<&'static str> {
    SNIPPETS
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, src)| *src)
}

pub fn destination(key: &str) -> Option<&'static str> {
    ROUTES
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, node)| *node)
}

/// Answer-scratch key recording a correctly routed snippet.
pub fn answer_key(question: &str) -> String {
    format!("codes.{}", question.to_ascii_uppercase())
}

/// Answer-scratch key of the snippet last shown.
pub const LAST_SHOWN_KEY: &str = "codes.last_shown";

#[derive(Default)]
pub struct CodeObservatory;

impl CodeObservatory {
    pub fn new() -> Self {
        Self
    }
}

impl PuzzleModule for CodeObservatory {
    fn id(&self) -> &'static str {
        "codes"
    }

    fn title(&self) -> &'static str {
        "Where Did Jack Go?"
    }

    fn mount(&mut self, surface: &mut dyn Surface) {
        surface.print_line(&format!("[GAME] {}", self.title()));
        surface.print_line("Three snippets, three destinations. Read each one:");
        surface.print_line("  showcode <A|B|C>");
        surface.print_line("Then route it: solve code <A|B|C> <NODE>");
    }
}
