use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use strum::IntoEnumIterator;

use super::{Action, Builtin, CommandContext, CommandError, CommandSpec};

/// Alias expansions allowed for one input line.
pub const MAX_ALIAS_DEPTH: usize = 16;
/// Lines kept for `history`.
pub const HISTORY_CAPACITY: usize = 200;

const DEFAULT_HISTORY_WINDOW: usize = 50;
const MAX_SLEEP_SECS: f64 = 5.0;

const DEFAULT_ALIASES: [(&str, &str); 4] =
    [("?", "help"), ("cls", "clear"), ("q", "quit"), ("exit", "quit")];

pub struct CommandRouter<C> {
    commands: BTreeMap<&'static str, CommandSpec<C>>,
    aliases: BTreeMap<String, String>,
    history: VecDeque<String>,
    /// Lines ever recorded, for stable history numbering.
    recorded: usize,
}

impl<C: CommandContext> Default for CommandRouter<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CommandContext> CommandRouter<C> {
    /// Router with the built-ins and default aliases registered.
    pub fn new() -> Self {
        let mut router = Self {
            commands: BTreeMap::new(),
            aliases: DEFAULT_ALIASES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
            recorded: 0,
        };
        for builtin in Builtin::iter() {
            router.register(CommandSpec::builtin(builtin));
        }
        router
    }

    /// Adds or replaces a command.
    pub fn register(&mut self, spec: CommandSpec<C>) {
        self.commands.insert(spec.name, spec);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    /// Records `raw` in the history and dispatches it.
    pub fn run(&mut self, cx: &mut C, raw: &str) {
        let raw = raw.trim();
        if raw.is_empty() {
            return;
        }
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(raw.to_owned());
        self.recorded += 1;

        let mut expanded = Vec::new();
        self.dispatch(cx, raw, &mut expanded);
    }

    fn dispatch(&mut self, cx: &mut C, raw: &str, expanded: &mut Vec<String>) {
        let Some(parts) = shlex::split(raw) else {
            cx.print("[ERR] Could not parse command (bad quotes?).");
            return;
        };
        let Some((cmd, args)) = parts.split_first() else {
            return;
        };

        if let Some(target) = self.aliases.get(cmd).cloned() {
            if expanded.len() >= MAX_ALIAS_DEPTH || expanded.contains(cmd) {
                cx.print(&format!("[ERR] Alias loop detected at '{cmd}'."));
                return;
            }
            expanded.push(cmd.clone());
            let rest = shlex::try_join(args.iter().map(String::as_str))
                .unwrap_or_else(|_| args.join(" "));
            let line = format!("{target} {rest}");
            self.dispatch(cx, line.trim(), expanded);
            return;
        }

        match cx.offer_to_module(cmd, args) {
            Ok(true) => return,
            Ok(false) => {}
            Err(err) => {
                tracing::trace!(target: "runtime::command", command = %cmd, error = %err, "module interception failed");
            }
        }

        let Some(action) = self.commands.get(cmd.as_str()).map(|spec| spec.action) else {
            cx.print("Unknown command. Type `help`.");
            return;
        };

        match action {
            Action::Builtin(builtin) => self.run_builtin(builtin, cx, args),
            Action::Handler(handler) => match handler(cx, args) {
                Ok(()) => {}
                Err(CommandError::Rejected(rejection)) => cx.print(&rejection.to_string()),
                Err(err) => {
                    tracing::debug!(target: "runtime::command", command = %cmd, error = %err, "handler failed");
                    cx.print(&format!("[ERR] command failed: {err}"));
                }
            },
        }
    }

    fn run_builtin(&mut self, builtin: Builtin, cx: &mut C, args: &[String]) {
        match builtin {
            Builtin::Help => self.help(cx, args),
            Builtin::Man => self.man(cx, args),
            Builtin::Clear => cx.clear_screen(),
            Builtin::History => self.show_history(cx, args),
            Builtin::Alias => self.alias(cx, args),
            Builtin::Sleep => sleep(cx, args),
            Builtin::Echo => cx.print(&args.join(" ")),
            Builtin::Whoami => {
                let name = cx.player_name().unwrap_or("?").to_owned();
                cx.print(&name);
            }
            Builtin::Vars => {
                let lines: Vec<String> = cx
                    .vars_mut()
                    .iter()
                    .map(|(k, v)| format!("{k} = {v}"))
                    .collect();
                if lines.is_empty() {
                    cx.print("(no vars set)");
                }
                for line in lines {
                    cx.print(&line);
                }
            }
            Builtin::Set => {
                let Some((key, value)) = args.split_first().filter(|(_, v)| !v.is_empty()) else {
                    cx.print("Usage: set <key> <value...>");
                    return;
                };
                cx.vars_mut().insert(key.clone(), value.join(" "));
                cx.print(&format!("[OK] {key} set"));
            }
            Builtin::Get => {
                let Some(key) = args.first() else {
                    cx.print("Usage: get <key>");
                    return;
                };
                let value = cx
                    .vars_mut()
                    .get(key)
                    .cloned()
                    .unwrap_or_else(|| "(null)".to_owned());
                cx.print(&value);
            }
            Builtin::Del => {
                let Some(key) = args.first() else {
                    cx.print("Usage: del <key>");
                    return;
                };
                if cx.vars_mut().remove(key).is_some() {
                    cx.print(&format!("[OK] deleted {key}"));
                } else {
                    cx.print("[ERR] no such var");
                }
            }
            Builtin::Quit => {
                cx.print("[OK] quitting...");
                cx.request_quit();
            }
        }
    }

    fn help(&self, cx: &mut C, args: &[String]) {
        if let Some(name) = args.first() {
            match self.commands.get(name.as_str()) {
                Some(spec) => {
                    cx.print(&format!("{} - {}", spec.name, spec.summary));
                    cx.print(&format!("Usage: {}", spec.usage));
                }
                None => cx.print("[ERR] Unknown command."),
            }
            return;
        }

        cx.print("Commands:");
        for (name, spec) in &self.commands {
            cx.print(&format!("  {name:<10} - {}", spec.summary));
        }
        cx.print("Tip: `man <cmd>` for details. Use quotes like a shell.");
    }

    fn man(&self, cx: &mut C, args: &[String]) {
        let Some(name) = args.first() else {
            cx.print("Usage: man <command>");
            return;
        };
        let Some(spec) = self.commands.get(name.as_str()) else {
            cx.print("[ERR] Unknown command.");
            return;
        };
        cx.print(&format!("=== MAN {} ===", spec.name));
        cx.print(&format!("USAGE: {}", spec.usage));
        cx.print(&format!("INFO:  {}", spec.help));
    }

    fn show_history(&self, cx: &mut C, args: &[String]) {
        let window = match args.first() {
            None => DEFAULT_HISTORY_WINDOW,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) => n.clamp(1, HISTORY_CAPACITY as i64) as usize,
                Err(_) => {
                    cx.print("[ERR] history n must be a number.");
                    return;
                }
            },
        };

        let skip = self.history.len().saturating_sub(window);
        let first_number = self.recorded - self.history.len() + skip + 1;
        for (offset, line) in self.history.iter().skip(skip).enumerate() {
            cx.print(&format!("{:>3}: {line}", first_number + offset));
        }
    }

    fn alias(&mut self, cx: &mut C, args: &[String]) {
        let Some(first) = args.first() else {
            cx.print("Aliases:");
            for (name, value) in &self.aliases {
                cx.print(&format!("  {name} = {value}"));
            }
            return;
        };

        if first == "-d" {
            let Some(name) = args.get(1).map(|n| n.trim()) else {
                cx.print("Usage: alias -d name");
                return;
            };
            if self.aliases.remove(name).is_some() {
                cx.print(&format!("[OK] alias deleted: {name}"));
            } else {
                cx.print("[ERR] alias not found.");
            }
            return;
        }

        let definition = args.join(" ");
        let Some((name, value)) = definition.split_once('=') else {
            cx.print("Usage: alias name=value  (or: alias -d name)");
            return;
        };
        let (name, value) = (name.trim(), value.trim());
        if name.is_empty() || value.is_empty() || name.contains(char::is_whitespace) {
            cx.print("[ERR] Bad alias.");
            return;
        }
        self.aliases.insert(name.to_owned(), value.to_owned());
        cx.print(&format!("[OK] alias {name}={value}"));
    }
}

fn sleep<C: CommandContext>(cx: &mut C, args: &[String]) {
    let Some(raw) = args.first() else {
        cx.print("Usage: sleep <seconds>");
        return;
    };
    let secs = match raw.parse::<f64>() {
        Ok(secs) if secs.is_finite() => secs.clamp(0.0, MAX_SLEEP_SECS),
        _ => {
            cx.print("[ERR] seconds must be a number.");
            return;
        }
    };
    cx.print(&format!("[...] sleeping {secs}s"));
    cx.schedule_wake(Duration::from_secs_f64(secs));
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::{ModuleError, ProgressionError};

    #[derive(Default)]
    struct Console {
        lines: Vec<String>,
        vars: BTreeMap<String, String>,
        name: Option<String>,
        wakes: Vec<Duration>,
        cleared: usize,
        quit: bool,
    }

    impl Console {
        fn last(&self) -> &str {
            self.lines.last().map(String::as_str).unwrap_or_default()
        }

        fn printed(&self, needle: &str) -> bool {
            self.lines.iter().any(|l| l.contains(needle))
        }
    }

    impl CommandContext for Console {
        fn print(&mut self, line: &str) {
            self.lines.push(line.to_owned());
        }

        fn clear_screen(&mut self) {
            self.cleared += 1;
        }

        fn offer_to_module(&mut self, cmd: &str, _args: &[String]) -> Result<bool, ModuleError> {
            match cmd {
                "mark" => {
                    self.lines.push("module took it".into());
                    Ok(true)
                }
                "help" if self.vars.contains_key("explode") => Err(ModuleError::Inconsistent {
                    module: "tictactoe",
                    reason: "board missing".into(),
                }),
                _ => Ok(false),
            }
        }

        fn vars_mut(&mut self) -> &mut BTreeMap<String, String> {
            &mut self.vars
        }

        fn player_name(&self) -> Option<&str> {
            self.name.as_deref()
        }

        fn schedule_wake(&mut self, delay: Duration) {
            self.wakes.push(delay);
        }

        fn request_quit(&mut self) {
            self.quit = true;
        }
    }

    fn router() -> CommandRouter<Console> {
        let mut router: CommandRouter<Console> = CommandRouter::new();
        router.register(CommandSpec::new("status", "status", "Show status line.", |cx: &mut Console, _| {
            cx.print("status ok");
            Ok(())
        }));
        router.register(CommandSpec::new("travel", "travel <N#>", "Travel.", |_, _| {
            Err(ProgressionError::NoDialogue.into())
        }));
        router.register(CommandSpec::new("broken", "broken", "Fails.", |_, _| {
            Err(CommandError::Failed("disk on fire".into()))
        }));
        router.register(CommandSpec::new("say", "say <text>", "Echo args.", |cx: &mut Console, args| {
            cx.print(&args.join("|"));
            Ok(())
        }));
        router
    }

    fn run(router: &mut CommandRouter<Console>, cx: &mut Console, line: &str) {
        router.run(cx, line);
    }

    #[test]
    fn test_quotes_are_respected() {
        let (mut r, mut cx) = (router(), Console::default());
        run(&mut r, &mut cx, r#"say "two words" 'and more' x"#);
        assert_eq!(cx.last(), "two words|and more|x");
    }

    #[test]
    fn test_bad_quotes_dispatch_nothing() {
        let (mut r, mut cx) = (router(), Console::default());
        run(&mut r, &mut cx, r#"say "unterminated"#);
        assert_eq!(cx.lines, vec!["[ERR] Could not parse command (bad quotes?)."]);
    }

    #[test]
    fn test_unknown_command() {
        let (mut r, mut cx) = (router(), Console::default());
        run(&mut r, &mut cx, "dance");
        assert_eq!(cx.last(), "Unknown command. Type `help`.");
    }

    #[test]
    fn test_default_aliases_expand() {
        let (mut r, mut cx) = (router(), Console::default());
        run(&mut r, &mut cx, "q");
        assert!(cx.quit);
        run(&mut r, &mut cx, "cls");
        assert_eq!(cx.cleared, 1);
    }

    #[test]
    fn test_alias_keeps_arguments_quoted() {
        let (mut r, mut cx) = (router(), Console::default());
        run(&mut r, &mut cx, "alias s=say");
        assert_eq!(cx.last(), "[OK] alias s=say");
        run(&mut r, &mut cx, r#"s "a b" c"#);
        assert_eq!(cx.last(), "a b|c");
    }

    #[test]
    fn test_alias_cycles_are_stopped() {
        let (mut r, mut cx) = (router(), Console::default());
        run(&mut r, &mut cx, "alias a=b");
        run(&mut r, &mut cx, "alias b=a");
        run(&mut r, &mut cx, "a");
        assert!(cx.last().starts_with("[ERR] Alias loop detected"));
    }

    #[test]
    fn test_alias_chain_depth_is_capped() {
        let (mut r, mut cx) = (router(), Console::default());
        for i in 0..MAX_ALIAS_DEPTH + 2 {
            run(&mut r, &mut cx, &format!("alias a{i}=a{}", i + 1));
        }
        run(&mut r, &mut cx, "a0");
        assert!(cx.last().starts_with("[ERR] Alias loop detected"));
    }

    #[test]
    fn test_alias_list_and_delete() {
        let (mut r, mut cx) = (router(), Console::default());
        run(&mut r, &mut cx, "alias -d cls");
        assert_eq!(cx.last(), "[OK] alias deleted: cls");
        run(&mut r, &mut cx, "alias -d cls");
        assert_eq!(cx.last(), "[ERR] alias not found.");
        run(&mut r, &mut cx, "alias nonsense");
        assert!(cx.last().starts_with("Usage: alias name=value"));
        run(&mut r, &mut cx, "alias");
        assert!(cx.printed("  ? = help"));
        assert!(!r.aliases().contains_key("cls"));
    }

    #[test]
    fn test_module_gets_first_refusal() {
        let (mut r, mut cx) = (router(), Console::default());
        run(&mut r, &mut cx, "mark 5");
        assert_eq!(cx.lines, vec!["module took it"]);
    }

    #[test]
    fn test_module_error_is_ignored() {
        let (mut r, mut cx) = (router(), Console::default());
        cx.vars.insert("explode".into(), "1".into());
        run(&mut r, &mut cx, "help");
        assert_eq!(cx.lines.first().map(String::as_str), Some("Commands:"));
    }

    #[test]
    fn test_rejections_print_verbatim_and_failures_are_wrapped() {
        let (mut r, mut cx) = (router(), Console::default());
        run(&mut r, &mut cx, "travel N9");
        assert_eq!(cx.last(), "[STORY] No dialogue here.");
        run(&mut r, &mut cx, "broken");
        assert_eq!(cx.last(), "[ERR] command failed: disk on fire");
    }

    #[test]
    fn test_help_and_man() {
        let (mut r, mut cx) = (router(), Console::default());
        run(&mut r, &mut cx, "help status");
        assert_eq!(cx.lines, vec!["status - Show status line.", "Usage: status"]);

        cx.lines.clear();
        run(&mut r, &mut cx, "man sleep");
        assert_eq!(
            cx.lines,
            vec!["=== MAN sleep ===", "USAGE: sleep <seconds>", "INFO:  Caps at 5 seconds."]
        );

        run(&mut r, &mut cx, "man nope");
        assert_eq!(cx.last(), "[ERR] Unknown command.");
        run(&mut r, &mut cx, "help");
        assert!(cx.printed("  whoami     - Show player name."));
    }

    #[test]
    fn test_history_window() {
        let (mut r, mut cx) = (router(), Console::default());
        for i in 0..5 {
            run(&mut r, &mut cx, &format!("echo {i}"));
        }
        cx.lines.clear();
        run(&mut r, &mut cx, "history 2");
        assert_eq!(cx.lines, vec!["  5: echo 4", "  6: history 2"]);

        run(&mut r, &mut cx, "history x");
        assert_eq!(cx.last(), "[ERR] history n must be a number.");
    }

    #[test]
    fn test_history_is_bounded() {
        let (mut r, mut cx) = (router(), Console::default());
        for i in 0..HISTORY_CAPACITY + 10 {
            run(&mut r, &mut cx, &format!("echo {i}"));
        }
        assert_eq!(r.history().count(), HISTORY_CAPACITY);
        assert_eq!(r.history().next(), Some("echo 10"));
    }

    #[test]
    fn test_sleep_is_capped() {
        let (mut r, mut cx) = (router(), Console::default());
        run(&mut r, &mut cx, "sleep 30");
        assert_eq!(cx.last(), "[...] sleeping 5s");
        assert_eq!(cx.wakes, vec![Duration::from_secs(5)]);

        run(&mut r, &mut cx, "sleep -3");
        assert_eq!(cx.wakes.last(), Some(&Duration::ZERO));

        run(&mut r, &mut cx, "sleep inf");
        assert_eq!(cx.last(), "[ERR] seconds must be a number.");
        assert_eq!(cx.wakes.len(), 2);
    }

    #[test]
    fn test_vars() {
        let (mut r, mut cx) = (router(), Console::default());
        run(&mut r, &mut cx, "vars");
        assert_eq!(cx.last(), "(no vars set)");
        run(&mut r, &mut cx, "set key AURORA borealis");
        assert_eq!(cx.last(), "[OK] key set");
        run(&mut r, &mut cx, "get key");
        assert_eq!(cx.last(), "AURORA borealis");
        run(&mut r, &mut cx, "del key");
        assert_eq!(cx.last(), "[OK] deleted key");
        run(&mut r, &mut cx, "get key");
        assert_eq!(cx.last(), "(null)");
        run(&mut r, &mut cx, "del key");
        assert_eq!(cx.last(), "[ERR] no such var");
        run(&mut r, &mut cx, "set lonely");
        assert_eq!(cx.last(), "Usage: set <key> <value...>");
    }

    #[test]
    fn test_whoami_and_echo() {
        let (mut r, mut cx) = (router(), Console::default());
        run(&mut r, &mut cx, "whoami");
        assert_eq!(cx.last(), "?");
        cx.name = Some("Ada".into());
        run(&mut r, &mut cx, "whoami");
        assert_eq!(cx.last(), "Ada");
        run(&mut r, &mut cx, "echo hello   world");
        assert_eq!(cx.last(), "hello world");
    }
}
