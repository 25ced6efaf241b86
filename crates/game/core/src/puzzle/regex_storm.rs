use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};

use super::{ModuleContext, ModuleError, PuzzleModule, Surface};

const PREFIXES: [&str; 4] = ["TIME", "NODE", "JACK", "ECHO"];
const SUFFIXES: [&str; 3] = ["A", "B", "C"];

/// Patterns that match every generated text.
const MATCHING: [&str; 4] = [
    r"^(TIME|NODE|JACK|ECHO)-\d+[ABC]$",
    r"^[A-Z]{4}-\d{2,4}[ABC]$",
    r"^[A-Z]+-\d+[A-C]$",
    r"^[A-Z]+-\d+[A-Z]$",
];

/// Patterns that match none of them.
const DISTRACTORS: [&str; 6] = [
    r"^(TIME|NODE|JACK|ECHO)\d+[ABC]$",
    r"^[A-Z]{4}-\d{5}[ABC]$",
    r"^(TIME|NODE|JACK|ECHO)-[A-Z]+[ABC]$",
    r"^\d+-[A-Z]{4}[ABC]$",
    r"^[A-Z]{4}-\d{2,4}$",
    r"^(TIME|NODE|JACK|ECHO)-\d+$",
];

pub const TEXT_KEY: &str = "regex.text";
pub const CORRECT_KEY: &str = "regex.correct";

pub fn choice_key(pick: &str) -> String {
    format!("regex.choice.{pick}")
}

const REROLL: u32 = 1;
const REROLL_EVERY: Duration = Duration::from_secs(20);

/// Pick the pattern matching a text that rerolls on a timer.
pub struct PatternStorm {
    rng: StdRng,
}

impl PatternStorm {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn roll(&mut self, cx: &mut ModuleContext<'_>) {
        let prefix = PREFIXES.choose(&mut self.rng).copied().unwrap_or(PREFIXES[0]);
        let suffix = SUFFIXES.choose(&mut self.rng).copied().unwrap_or(SUFFIXES[0]);
        let digits: u32 = self.rng.random_range(10..=9999);
        let text = format!("{prefix}-{digits}{suffix}");

        let correct = MATCHING.choose(&mut self.rng).copied().unwrap_or(MATCHING[0]);
        let mut choices: Vec<&str> = DISTRACTORS
            .choose_multiple(&mut self.rng, 3)
            .copied()
            .collect();
        choices.push(correct);
        choices.shuffle(&mut self.rng);

        cx.answers.insert(TEXT_KEY.to_owned(), text);
        cx.answers.insert(CORRECT_KEY.to_owned(), correct.to_owned());
        for (i, pattern) in choices.iter().enumerate() {
            cx.answers
                .insert(choice_key(&(i + 1).to_string()), (*pattern).to_owned());
        }
    }

    fn show(cx: &mut ModuleContext<'_>) {
        let text = cx.answers.get(TEXT_KEY).cloned().unwrap_or_default();
        cx.print(format!("TEXT:  {text}"));
        for pick in 1..=4 {
            let pattern = cx
                .answers
                .get(&choice_key(&pick.to_string()))
                .cloned()
                .unwrap_or_default();
            cx.print(format!("  {pick}) {pattern}"));
        }
    }
}

impl PuzzleModule for PatternStorm {
    fn id(&self) -> &'static str {
        "regex"
    }

    fn title(&self) -> &'static str {
        "Pattern Storm"
    }

    fn mount(&mut self, surface: &mut dyn Surface) {
        surface.print_line(&format!("[GAME] {}", self.title()));
        surface.print_line("The text changes every few seconds. `regex` shows the current one.");
        surface.print_line("Solve: solve regex <1|2|3|4>");
    }

    fn start(&mut self, cx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        self.roll(cx);
        Self::show(cx);
        cx.timers.schedule(REROLL_EVERY, REROLL);
        Ok(())
    }

    fn on_command(
        &mut self,
        cmd: &str,
        _args: &[String],
        cx: &mut ModuleContext<'_>,
    ) -> Result<bool, ModuleError> {
        if cmd != "regex" {
            return Ok(false);
        }
        Self::show(cx);
        Ok(true)
    }

    fn on_timer(&mut self, tag: u32, cx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        if tag != REROLL {
            return Err(ModuleError::Inconsistent {
                module: "regex",
                reason: format!("unexpected timer tag {tag}"),
            });
        }
        self.roll(cx);
        cx.print("[REGEX] The storm shifts.");
        Self::show(cx);
        cx.timers.schedule(REROLL_EVERY, REROLL);
        Ok(())
    }
}
