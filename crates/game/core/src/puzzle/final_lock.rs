use super::{PuzzleModule, Surface};

const RIDDLES: [&str; 6] = [
    "Why do devs hate nature? Too many bugs.",
    "Why did cache break up with RAM? Too clingy.",
    "Why was the keyboard sleepy? It had two shifts.",
    "Why did the loop stop? It needed a break.",
    "Why was the function calm? It had closure.",
    "Why did the process nap? It was waiting on I/O.",
];

/// Panel of the goal node. The lock itself is checked by `unlock`.
#[derive(Default)]
pub struct AxisLock;

impl AxisLock {
    pub fn new() -> Self {
        Self
    }
}

impl PuzzleModule for AxisLock {
    fn id(&self) -> &'static str {
        "final"
    }

    fn title(&self) -> &'static str {
        "Axis Lock"
    }

    fn mount(&mut self, surface: &mut dyn Surface) {
        surface.print_line(&format!("[GAME] {}", self.title()));
        for (i, riddle) in RIDDLES.iter().enumerate() {
            surface.print_line(&format!("{}) {riddle}", i + 1));
        }
        surface.print_line("Type: unlock <password>");
    }
}
