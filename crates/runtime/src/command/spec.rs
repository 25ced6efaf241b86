//! Command table entries.

use super::CommandError;

/// Application command bound to a context method.
pub type Handler<C> = fn(&mut C, &[String]) -> Result<(), CommandError>;

/// Built-in terminal commands owned by the router itself.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Builtin {
    Help,
    Man,
    Clear,
    History,
    Alias,
    Sleep,
    Echo,
    Whoami,
    Vars,
    Set,
    Get,
    Del,
    Quit,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// `(usage, summary, long help)`
    fn docs(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Builtin::Help => (
                "help [command]",
                "List commands or show help for one command.",
                "Examples:\n  help\n  help travel\n  help solve",
            ),
            Builtin::Man => (
                "man <command>",
                "Man-page style help for a command.",
                "Example:\n  man solve",
            ),
            Builtin::Clear => (
                "clear",
                "Clear terminal output.",
                "Clears the terminal and stops any text still being revealed.",
            ),
            Builtin::History => (
                "history [n]",
                "Show recent command history.",
                "Shows the last n commands (default 50, at most 200).\nExamples:\n  history\n  history 20",
            ),
            Builtin::Alias => (
                "alias | alias name=value | alias -d name",
                "List/set/delete aliases.",
                "Aliases replace the first word of a command.\nExamples:\n  alias\n  alias n=nodes\n  alias -d n",
            ),
            Builtin::Sleep => (
                "sleep <seconds>",
                "Pause briefly (dramatic effect).",
                "Caps at 5 seconds.",
            ),
            Builtin::Echo => ("echo <text...>", "Print text.", "Example:\n  echo hello world"),
            Builtin::Whoami => (
                "whoami",
                "Show player name.",
                "Reads the player name from the encrypted save state.",
            ),
            Builtin::Vars => (
                "vars",
                "List terminal variables.",
                "Use `set` and `get` to manage variables.",
            ),
            Builtin::Set => (
                "set <key> <value...>",
                "Set a terminal variable.",
                "Example:\n  set key AURORA",
            ),
            Builtin::Get => ("get <key>", "Get a terminal variable.", "Example:\n  get key"),
            Builtin::Del => (
                "del <key>",
                "Delete a terminal variable.",
                "Example:\n  del key",
            ),
            Builtin::Quit => (
                "quit",
                "Exit the game.",
                "Saves one last time and ends the session.",
            ),
        }
    }
}

pub enum Action<C> {
    Builtin(Builtin),
    Handler(Handler<C>),
}

impl<C> Clone for Action<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Action<C> {}

/// One row of the command table.
pub struct CommandSpec<C> {
    pub name: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
    pub help: &'static str,
    pub action: Action<C>,
}

impl<C> CommandSpec<C> {
    /// Application command whose long help repeats its summary.
    pub fn new(
        name: &'static str,
        usage: &'static str,
        summary: &'static str,
        handler: Handler<C>,
    ) -> Self {
        Self {
            name,
            usage,
            summary,
            help: summary,
            action: Action::Handler(handler),
        }
    }

    pub fn with_help(mut self, help: &'static str) -> Self {
        self.help = help;
        self
    }

    pub(crate) fn builtin(builtin: Builtin) -> Self {
        let (usage, summary, help) = builtin.docs();
        Self {
            name: builtin.name(),
            usage,
            summary,
            help,
            action: Action::Builtin(builtin),
        }
    }
}
