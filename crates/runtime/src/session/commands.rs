//! Application commands: thin bindings from the router to the engine.

use game_core::{ActiveModule, ProgressionError};

use super::SessionContext;
use crate::command::{CommandContext, CommandError, CommandRouter, CommandSpec};

type CommandResult = Result<(), CommandError>;

pub(super) fn register(router: &mut CommandRouter<SessionContext>) {
    let specs = [
        CommandSpec::new("status", "status", "Show status line.", status),
        CommandSpec::new("score", "score", "Show score.", score),
        CommandSpec::new("time", "time", "Show current node time.", time),
        CommandSpec::new("nodes", "nodes", "List nodes and unlocked nodes.", nodes),
        CommandSpec::new("routes", "routes", "Show routes from current node.", routes),
        CommandSpec::new("travel", "travel <NODE>", "Travel to an unlocked connected node.", travel),
        CommandSpec::new("games", "games", "List games in current node.", games),
        CommandSpec::new("play", "play <game_id>", "Mount a game (if allowed in node).", play),
        CommandSpec::new("story", "story | story all", "Advance dialogue.", story)
            .with_help("story      next dialogue line (loops)\nstory all  replay the whole dialogue from the start"),
        CommandSpec::new("hint", "hint | hint <id>", "Use a hint (cooldown + score cost).", hint)
            .with_help("Without an id, lists the node's hints and their cost. Buying one costs score and starts the cooldown."),
        CommandSpec::new("showcode", "showcode <A|B|C>", "Show a code snippet.", showcode),
        CommandSpec::new("solve", "solve <target> ...", "Solve puzzles.", solve).with_help(
            "solve colors <COMBINATIONS>\nsolve chess <MOVE>\nsolve code <A|B|C> <NODE>\nsolve regex <1|2|3|4>\nsolve tictactoe\nsolve dilemma",
        ),
        CommandSpec::new("train", "train dilemma", "Training module.", train),
        CommandSpec::new("ttt", "ttt status|reset", "TicTacToe utilities.", ttt),
        CommandSpec::new("unlock", "unlock <password>", "Final unlock.", unlock),
        CommandSpec::new("godskip", "godskip <CODE>", "Dev skip.", godskip),
    ];
    for spec in specs {
        router.register(spec);
    }
}

fn status(cx: &mut SessionContext, _args: &[String]) -> CommandResult {
    cx.with_engine(|engine| engine.describe_status());
    Ok(())
}

fn score(cx: &mut SessionContext, _args: &[String]) -> CommandResult {
    cx.with_engine(|engine| engine.describe_score());
    Ok(())
}

fn time(cx: &mut SessionContext, _args: &[String]) -> CommandResult {
    cx.with_engine(|engine| engine.describe_time());
    Ok(())
}

fn nodes(cx: &mut SessionContext, _args: &[String]) -> CommandResult {
    cx.with_engine(|engine| engine.list_nodes());
    Ok(())
}

fn routes(cx: &mut SessionContext, _args: &[String]) -> CommandResult {
    cx.with_engine(|engine| engine.list_routes());
    Ok(())
}

fn games(cx: &mut SessionContext, _args: &[String]) -> CommandResult {
    cx.with_engine(|engine| engine.list_games());
    Ok(())
}

fn travel(cx: &mut SessionContext, args: &[String]) -> CommandResult {
    let target = args.first().map(String::as_str).unwrap_or_default();
    cx.with_engine(|engine| engine.travel(target))?;
    Ok(())
}

fn play(cx: &mut SessionContext, args: &[String]) -> CommandResult {
    let Some(id) = args.first() else {
        return Err(ProgressionError::Usage("play <game_id>").into());
    };
    cx.mount(&id.to_lowercase())?;
    Ok(())
}

fn story(cx: &mut SessionContext, args: &[String]) -> CommandResult {
    let all = args.first().is_some_and(|a| a.eq_ignore_ascii_case("all"));
    if all {
        cx.with_engine(|engine| engine.story_all())?;
    } else {
        cx.with_engine(|engine| engine.story_next())?;
    }
    Ok(())
}

fn hint(cx: &mut SessionContext, args: &[String]) -> CommandResult {
    let now = cx.now();
    let id = args.first().map(String::as_str);
    cx.with_engine(|engine| engine.hint(id, now))?;
    Ok(())
}

fn showcode(cx: &mut SessionContext, args: &[String]) -> CommandResult {
    let key = args.first().map(String::as_str);
    cx.with_engine(|engine| engine.show_code(key))?;
    Ok(())
}

fn solve(cx: &mut SessionContext, args: &[String]) -> CommandResult {
    let mounted = cx.module_report();
    cx.with_engine(|engine| {
        let active = mounted
            .as_ref()
            .map(|(id, report)| ActiveModule { id: *id, report });
        engine.solve(args, active)
    })?;
    Ok(())
}

fn train(cx: &mut SessionContext, args: &[String]) -> CommandResult {
    match args.first().map(|a| a.to_lowercase()) {
        None => Err(ProgressionError::Usage("train dilemma").into()),
        Some(target) if target == "dilemma" => {
            cx.mount(&target)?;
            Ok(())
        }
        Some(target) => Err(ProgressionError::UnknownPuzzle(target).into()),
    }
}

/// Reaches the tic-tac-toe module when it is not mounted (the router already
/// offers `ttt` to a mounted one).
fn ttt(cx: &mut SessionContext, args: &[String]) -> CommandResult {
    if args.is_empty() {
        return Err(ProgressionError::Usage("ttt status|reset").into());
    }
    let owner = cx
        .config()
        .find_puzzle("tictactoe")
        .map(|(node, _)| node.clone())
        .ok_or_else(|| ProgressionError::UnknownPuzzle("tictactoe".into()))?;
    if owner != cx.state().current_node {
        return Err(ProgressionError::Unavailable(format!("ttt tools are for {owner}.")).into());
    }

    if cx.module_id() != Some("tictactoe") {
        cx.mount("tictactoe")?;
    }
    if !cx.offer_to_module("ttt", args)? {
        return Err(CommandError::Failed("tictactoe module did not respond".into()));
    }
    Ok(())
}

fn unlock(cx: &mut SessionContext, args: &[String]) -> CommandResult {
    let credential = args.join(" ");
    cx.with_engine(|engine| engine.final_unlock(&credential))?;
    Ok(())
}

fn godskip(cx: &mut SessionContext, args: &[String]) -> CommandResult {
    let code = args.join(" ");
    cx.with_engine(|engine| engine.godskip(&code))?;
    Ok(())
}
