use std::time::Duration;

use super::{ModuleContext, ModuleError, ModuleReport, PuzzleModule, Surface};
use crate::schedule::TaskId;

const STONES: u32 = 21;
const MAX_TAKE: u32 = 3;
const BOT_MOVE: u32 = 1;
const BOT_DELAY: Duration = Duration::from_millis(220);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Turn {
    Player,
    Bot,
    Done { won: bool },
}

/// Misère Nim: take 1-3 stones, whoever takes the last one loses.
///
/// The bot always tries to leave `1 mod 4` stones, so whoever moves first
/// from a losing position cannot win. `nim reset bot` hands it the first move.
pub struct NimLab {
    stones: u32,
    turn: Turn,
    bot_pending: Option<TaskId>,
}

impl NimLab {
    pub fn new() -> Self {
        Self {
            stones: STONES,
            turn: Turn::Player,
            bot_pending: None,
        }
    }

    /// Stones the bot takes from `stones`.
    fn bot_take(stones: u32) -> u32 {
        let take = match (stones.saturating_sub(1)) % 4 {
            0 => 1,
            n => n,
        };
        take.min(MAX_TAKE).min(stones)
    }

    fn status_line(&self) -> String {
        let turn = match self.turn {
            Turn::Player => "YOU",
            Turn::Bot => "BOT",
            Turn::Done { .. } => "DONE",
        };
        format!("[NIM] Stones left: {} | Turn: {turn}", self.stones)
    }

    fn reset(&mut self, bot_first: bool, cx: &mut ModuleContext<'_>) {
        if let Some(task) = self.bot_pending.take() {
            cx.timers.cancel(task);
        }
        self.stones = STONES;
        cx.print(format!("[NIM] New game with {STONES} stones."));
        if bot_first {
            self.turn = Turn::Bot;
            self.bot_pending = Some(cx.timers.schedule(BOT_DELAY, BOT_MOVE));
        } else {
            self.turn = Turn::Player;
        }
    }

    fn player_take(&mut self, raw: Option<&String>, cx: &mut ModuleContext<'_>) {
        match self.turn {
            Turn::Player => {}
            Turn::Bot => {
                cx.print("[NIM] Wait for the bot.");
                return;
            }
            Turn::Done { .. } => {
                cx.print("[NIM] Game over. Start again with: nim reset [you|bot]");
                return;
            }
        }
        let take = match raw.and_then(|r| r.parse::<u32>().ok()) {
            Some(n) if (1..=MAX_TAKE).contains(&n) && n <= self.stones => n,
            _ => {
                cx.print("Usage: take <1|2|3>");
                return;
            }
        };
        self.stones -= take;
        cx.print(format!("You take {take}. Stones left: {}", self.stones));
        if self.stones == 0 {
            self.turn = Turn::Done { won: false };
            cx.print("You took the last stone and lose this run.");
            return;
        }
        self.turn = Turn::Bot;
        self.bot_pending = Some(cx.timers.schedule(BOT_DELAY, BOT_MOVE));
    }

    fn bot_move(&mut self, cx: &mut ModuleContext<'_>) {
        self.bot_pending = None;
        if self.turn != Turn::Bot {
            return;
        }
        let take = Self::bot_take(self.stones);
        self.stones -= take;
        cx.print(format!("Bot takes {take}. Stones left: {}", self.stones));
        if self.stones == 0 {
            self.turn = Turn::Done { won: true };
            cx.print("Bot took the last stone and loses. You win.");
        } else {
            self.turn = Turn::Player;
        }
    }
}

impl Default for NimLab {
    fn default() -> Self {
        Self::new()
    }
}

impl PuzzleModule for NimLab {
    fn id(&self) -> &'static str {
        "dilemma"
    }

    fn title(&self) -> &'static str {
        "Nim Lab"
    }

    fn mount(&mut self, surface: &mut dyn Surface) {
        surface.print_line(&format!("[GAME] {}", self.title()));
        surface.print_line("Take 1, 2, or 3 stones each turn: take <n>");
        surface.print_line("Whoever takes the LAST stone loses.");
        surface.print_line("Hint: first-vs-second matters in Nim. Plan ahead.");
        surface.print_line("Solve via terminal: solve dilemma");
    }

    fn start(&mut self, cx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        cx.print(format!("[GAME] {} started.", self.title()));
        cx.print(self.status_line());
        Ok(())
    }

    fn on_command(
        &mut self,
        cmd: &str,
        args: &[String],
        cx: &mut ModuleContext<'_>,
    ) -> Result<bool, ModuleError> {
        match cmd {
            "take" => self.player_take(args.first(), cx),
            "nim" => match (args.first().map(String::as_str), args.get(1).map(String::as_str)) {
                (None | Some("status"), _) => cx.print(self.status_line()),
                (Some("reset"), None | Some("you")) => self.reset(false, cx),
                (Some("reset"), Some("bot")) => self.reset(true, cx),
                _ => cx.print("Usage: nim [status | reset [you|bot]]"),
            },
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn on_timer(&mut self, tag: u32, cx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        if tag != BOT_MOVE {
            return Err(ModuleError::Inconsistent {
                module: "dilemma",
                reason: format!("unexpected timer tag {tag}"),
            });
        }
        self.bot_move(cx);
        Ok(())
    }

    fn report(&self) -> ModuleReport {
        match self.turn {
            Turn::Done { won: true } => ModuleReport::Success,
            Turn::Done { won: false } => ModuleReport::Failure,
            _ => ModuleReport::Pending,
        }
    }
}
