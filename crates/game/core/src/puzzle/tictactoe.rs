use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use super::{ModuleContext, ModuleError, ModuleReport, PuzzleModule, Surface};
use crate::schedule::TaskId;

const ROUNDS: usize = 4;
const BOT_MOVE: u32 = 1;
const BOT_DELAY: Duration = Duration::from_millis(150);

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mark {
    X,
    O,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Won,
    Lost,
    Draw,
}

impl Outcome {
    fn letter(self) -> char {
        match self {
            Outcome::Won => 'W',
            Outcome::Lost => 'L',
            Outcome::Draw => 'D',
        }
    }
}

/// Four rounds of tic-tac-toe against a random, slightly delayed bot.
pub struct TicTacToeSequence {
    board: [Option<Mark>; 9],
    results: Vec<Outcome>,
    bot_pending: Option<TaskId>,
    rng: StdRng,
}

impl TicTacToeSequence {
    pub fn new(seed: u64) -> Self {
        Self {
            board: [None; 9],
            results: Vec::new(),
            bot_pending: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn finished(&self) -> bool {
        self.results.len() >= ROUNDS
    }

    fn status_line(&self) -> String {
        let results: String = self.results.iter().map(|o| o.letter()).collect();
        let round = (self.results.len() + 1).min(ROUNDS);
        let results = if results.is_empty() {
            "(none)".to_owned()
        } else {
            results
        };
        format!("[TTT] Round {round}/{ROUNDS} | Results: {results}")
    }

    fn render(&self, cx: &mut ModuleContext<'_>) {
        for row in self.board.chunks(3).enumerate().map(|(r, cells)| {
            cells
                .iter()
                .enumerate()
                .map(|(c, cell)| match cell {
                    Some(Mark::X) => "X".to_owned(),
                    Some(Mark::O) => "O".to_owned(),
                    None => (r * 3 + c + 1).to_string(),
                })
                .collect::<Vec<_>>()
                .join(" | ")
        }) {
            cx.print(format!("  {row}"));
        }
    }

    fn winner(&self) -> Option<Outcome> {
        for [a, b, c] in LINES {
            if let Some(mark) = self.board[a]
                && self.board[b] == Some(mark)
                && self.board[c] == Some(mark)
            {
                return Some(match mark {
                    Mark::X => Outcome::Won,
                    Mark::O => Outcome::Lost,
                });
            }
        }
        self.board.iter().all(Option::is_some).then_some(Outcome::Draw)
    }

    fn reset_round(&mut self, cx: &mut ModuleContext<'_>) {
        if let Some(task) = self.bot_pending.take() {
            cx.timers.cancel(task);
        }
        self.board = [None; 9];
    }

    fn end_round(&mut self, outcome: Outcome, cx: &mut ModuleContext<'_>) {
        self.results.push(outcome);
        cx.print(format!("[TTT] Round ended: {}", outcome.letter()));
        self.board = [None; 9];
        if self.finished() {
            cx.print("[TTT] Sequence complete. Try: solve tictactoe");
        } else {
            cx.print(self.status_line());
        }
    }

    fn player_move(&mut self, raw: Option<&String>, cx: &mut ModuleContext<'_>) {
        if self.finished() {
            cx.print("[TTT] Sequence already complete.");
            return;
        }
        if self.bot_pending.is_some() {
            cx.print("[TTT] Wait for the bot.");
            return;
        }
        let cell = match raw.and_then(|r| r.parse::<usize>().ok()) {
            Some(n @ 1..=9) => n - 1,
            _ => {
                cx.print("Usage: mark <1-9>");
                return;
            }
        };
        if self.board[cell].is_some() {
            cx.print("[TTT] That cell is taken.");
            return;
        }
        self.board[cell] = Some(Mark::X);
        if let Some(outcome) = self.winner() {
            self.end_round(outcome, cx);
            return;
        }
        self.render(cx);
        self.bot_pending = Some(cx.timers.schedule(BOT_DELAY, BOT_MOVE));
    }

    fn bot_move(&mut self, cx: &mut ModuleContext<'_>) {
        self.bot_pending = None;
        let free: Vec<usize> = (0..9).filter(|&i| self.board[i].is_none()).collect();
        let Some(&cell) = free.choose(&mut self.rng) else {
            self.end_round(Outcome::Draw, cx);
            return;
        };
        self.board[cell] = Some(Mark::O);
        cx.print(format!("[TTT] Bot plays {}.", cell + 1));
        match self.winner() {
            Some(outcome) => self.end_round(outcome, cx),
            None => self.render(cx),
        }
    }
}

impl PuzzleModule for TicTacToeSequence {
    fn id(&self) -> &'static str {
        "tictactoe"
    }

    fn title(&self) -> &'static str {
        "Win/Lose Sequence"
    }

    fn mount(&mut self, surface: &mut dyn Surface) {
        surface.print_line(&format!("[GAME] {}", self.title()));
        surface.print_line("Play four rounds: mark <1-9>. Inspect: ttt status | ttt reset");
        surface.print_line("When the sequence is done: solve tictactoe");
    }

    fn on_command(
        &mut self,
        cmd: &str,
        args: &[String],
        cx: &mut ModuleContext<'_>,
    ) -> Result<bool, ModuleError> {
        match cmd {
            "mark" => self.player_move(args.first(), cx),
            "ttt" => match args.first().map(String::as_str) {
                Some("reset") => {
                    self.reset_round(cx);
                    cx.print("[TTT] Round reset.");
                    self.render(cx);
                }
                Some("status") | None => {
                    cx.print(self.status_line());
                    self.render(cx);
                }
                Some(_) => cx.print("Usage: ttt status|reset"),
            },
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn on_timer(&mut self, tag: u32, cx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        if tag != BOT_MOVE {
            return Err(ModuleError::Inconsistent {
                module: "tictactoe",
                reason: format!("unexpected timer tag {tag}"),
            });
        }
        self.bot_move(cx);
        Ok(())
    }

    fn report(&self) -> ModuleReport {
        if self.finished() {
            ModuleReport::Success
        } else {
            ModuleReport::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::testing::{Harness, args};

    fn play_round(module: &mut TicTacToeSequence, harness: &mut Harness) {
        let rounds_before = module.results.len();
        for cell in 1..=9 {
            if module.results.len() > rounds_before {
                return;
            }
            let cell = cell.to_string();
            if module.board[cell.parse::<usize>().unwrap() - 1].is_some() {
                continue;
            }
            module
                .on_command("mark", &args(&[cell.as_str()]), &mut harness.cx())
                .unwrap();
            for tag in harness.timers.take_all() {
                module.on_timer(tag, &mut harness.cx()).unwrap();
            }
        }
    }

    #[test]
    fn bot_replies_after_delay() {
        let mut harness = Harness::new("N5");
        let mut module = TicTacToeSequence::new(9);
        module
            .on_command("mark", &args(&["5"]), &mut harness.cx())
            .unwrap();
        assert!(module.bot_pending.is_some());

        module
            .on_command("mark", &args(&["1"]), &mut harness.cx())
            .unwrap();
        assert!(harness.surface.contains("[TTT] Wait for the bot."));

        for tag in harness.timers.take_all() {
            module.on_timer(tag, &mut harness.cx()).unwrap();
        }
        assert_eq!(module.board.iter().filter(|c| c.is_some()).count(), 2);
    }

    #[test]
    fn sequence_reports_success_after_four_rounds() {
        let mut harness = Harness::new("N5");
        let mut module = TicTacToeSequence::new(11);
        for _ in 0..ROUNDS {
            assert_eq!(module.report(), ModuleReport::Pending);
            play_round(&mut module, &mut harness);
        }
        assert_eq!(module.results.len(), ROUNDS);
        assert_eq!(module.report(), ModuleReport::Success);
    }

    #[test]
    fn reset_cancels_pending_bot_move() {
        let mut harness = Harness::new("N5");
        let mut module = TicTacToeSequence::new(1);
        module
            .on_command("mark", &args(&["1"]), &mut harness.cx())
            .unwrap();
        module
            .on_command("ttt", &args(&["reset"]), &mut harness.cx())
            .unwrap();
        assert!(module.bot_pending.is_none());
        assert_eq!(harness.timers.pending(), 0);
        assert!(module.board.iter().all(Option::is_none));
    }

    #[test]
    fn unrelated_commands_are_declined() {
        let mut harness = Harness::new("N5");
        let mut module = TicTacToeSequence::new(1);
        assert_eq!(module.on_command("help", &[], &mut harness.cx()), Ok(false));
    }
}
