//! `solve` and `unlock`: answer validators and the final lock.
use super::{
    AwardOutcome, GameEvent, ProgressionEngine, ProgressionError, ProgressionResult,
    derive_final_password,
};
use crate::config::{FinalUnlockPolicy, PuzzleKind, PuzzleSpec, normalize_answer};
use crate::puzzle::{ModuleReport, codes, combinations, regex_storm};

/// Snapshot of the mounted module handed to [`ProgressionEngine::solve`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActiveModule<'r> {
    pub id: &'r str,
    pub report: &'r ModuleReport,
}

impl ProgressionEngine<'_> {
    /// Validates `solve <target> [answer...]` for a puzzle of the current node.
    ///
    /// Wrong answers cost the puzzle's penalty once per sub-question and come
    /// back as [`ProgressionError::Incorrect`].
    pub fn solve(
        &mut self,
        args: &[String],
        active: Option<ActiveModule<'_>>,
    ) -> ProgressionResult<()> {
        let Some((target, rest)) = args.split_first() else {
            return Err(ProgressionError::Usage(
                "solve <colors|chess|code|regex|tictactoe|dilemma> ...",
            ));
        };
        let target = match target.to_lowercase().as_str() {
            "code" => "codes".to_owned(),
            other => other.to_owned(),
        };

        let config = self.config;
        let (owner, spec) = config
            .find_puzzle(&target)
            .ok_or_else(|| ProgressionError::UnknownPuzzle(target.clone()))?;
        if *owner != self.state.current_node {
            return Err(ProgressionError::WrongNode {
                puzzle: spec.id.clone(),
                node: owner.clone(),
            });
        }

        match spec.kind() {
            PuzzleKind::Exact => self.solve_exact(spec, rest),
            PuzzleKind::Combinatorics => self.solve_combinatorics(spec, rest),
            PuzzleKind::Routing => self.solve_routing(spec, rest),
            PuzzleKind::Pattern => self.solve_pattern(spec, rest),
            PuzzleKind::Module => self.solve_module(spec, active),
            PuzzleKind::Final => Err(ProgressionError::Usage("unlock <password>")),
        }
    }

    fn solve_exact(&mut self, spec: &PuzzleSpec, rest: &[String]) -> ProgressionResult<()> {
        let answer = normalize_answer(&rest.join(" "));
        if answer.is_empty() {
            return Err(ProgressionError::Usage("solve <id> <ANSWER>"));
        }
        if spec.accepted_answers().contains(&answer) {
            self.award_solve(&spec.id)?;
            return Ok(());
        }
        self.penalize(spec, "main");
        Err(ProgressionError::Incorrect("Incorrect.".into()))
    }

    fn solve_combinatorics(&mut self, spec: &PuzzleSpec, rest: &[String]) -> ProgressionResult<()> {
        let Some(raw) = rest.first() else {
            return Err(ProgressionError::Usage("solve colors <COMBINATIONS>"));
        };
        let expected = match spec.answer.as_deref() {
            Some(fixed) => fixed.trim().parse::<u64>().ok(),
            None => self.current().minutes().map(combinations),
        };
        let Some(expected) = expected else {
            return Err(ProgressionError::Unavailable(
                "This node's clock gives no count to check against.".into(),
            ));
        };
        if raw.trim().parse::<u64>().ok() == Some(expected) {
            self.award_solve(&spec.id)?;
            return Ok(());
        }
        self.penalize(spec, "main");
        Err(ProgressionError::Incorrect("Incorrect.".into()))
    }

    fn solve_routing(&mut self, spec: &PuzzleSpec, rest: &[String]) -> ProgressionResult<()> {
        let (Some(question), Some(dest)) = (rest.first(), rest.get(1)) else {
            return Err(ProgressionError::Usage("solve code <A|B|C> <NODE>"));
        };
        let Some(expected) = codes::destination(question) else {
            return Err(ProgressionError::Usage("solve code <A|B|C> <NODE>"));
        };
        let question = question.to_ascii_uppercase();
        if !dest.trim().eq_ignore_ascii_case(expected) {
            self.penalize(spec, &question);
            return Err(ProgressionError::Incorrect("Wrong destination.".into()));
        }

        self.state
            .answers
            .insert(codes::answer_key(&question), expected.to_owned());
        self.journal
            .print(format!("[OK] Snippet {question} routes to {expected}."));

        let routed = codes::ROUTES
            .iter()
            .filter(|(q, _)| self.state.answers.contains_key(&codes::answer_key(q)))
            .count();
        if routed == codes::ROUTES.len() {
            self.award_solve(&spec.id)?;
        } else {
            self.journal.print(format!(
                "[INFO] {routed}/{} snippets routed.",
                codes::ROUTES.len()
            ));
        }
        Ok(())
    }

    fn solve_pattern(&mut self, spec: &PuzzleSpec, rest: &[String]) -> ProgressionResult<()> {
        let pick = match rest.first().map(|p| p.trim()) {
            Some(p @ ("1" | "2" | "3" | "4")) => p.to_owned(),
            _ => return Err(ProgressionError::Usage("solve regex <1|2|3|4>")),
        };
        let Some(correct) = self.state.answers.get(regex_storm::CORRECT_KEY).cloned() else {
            return Err(ProgressionError::Unavailable(
                "No pattern on screen. Start it with: play regex".into(),
            ));
        };
        let chosen = self
            .state
            .answers
            .get(&regex_storm::choice_key(&pick))
            .cloned();
        if chosen.as_deref() == Some(correct.as_str()) {
            self.award_solve(&spec.id)?;
            return Ok(());
        }
        let question = self
            .state
            .answers
            .get(regex_storm::TEXT_KEY)
            .cloned()
            .unwrap_or_else(|| "main".to_owned());
        self.penalize(spec, &question);
        Err(ProgressionError::Incorrect("Pattern mismatch.".into()))
    }

    fn solve_module(
        &mut self,
        spec: &PuzzleSpec,
        active: Option<ActiveModule<'_>>,
    ) -> ProgressionResult<()> {
        match active {
            Some(module) if module.id == spec.id => {
                if module.report.is_success() {
                    self.award_solve(&spec.id)?;
                    Ok(())
                } else {
                    let title = if spec.title.is_empty() {
                        spec.id.as_str()
                    } else {
                        spec.title.as_str()
                    };
                    Err(ProgressionError::Incorrect(format!(
                        "{title} is not complete yet."
                    )))
                }
            }
            _ => Err(ProgressionError::Unavailable(format!(
                "Open it first: play {}",
                spec.id
            ))),
        }
    }

    /// Charges `spec.penalty` the first time `question` is answered wrongly.
    fn penalize(&mut self, spec: &PuzzleSpec, question: &str) {
        if spec.penalty <= 0 {
            return;
        }
        if !self
            .state
            .penalized
            .insert(format!("{}:{question}", spec.id))
        {
            return;
        }
        let score = self.state.adjust_score(-spec.penalty);
        self.journal.print(format!(
            "[PENALTY] -{} pts (first wrong attempt).",
            spec.penalty
        ));
        self.journal.log(GameEvent::Penalty {
            node: self.state.current_node.clone(),
            game: spec.id.clone(),
            question: question.to_owned(),
            amount: spec.penalty,
            score,
        });
    }

    /// `showcode <key>`: prints a routing snippet and remembers which one.
    pub fn show_code(&mut self, key: Option<&str>) -> ProgressionResult<()> {
        let config = self.config;
        let owner = config
            .nodes_with_puzzle("codes")
            .into_iter()
            .next()
            .ok_or_else(|| ProgressionError::UnknownPuzzle("codes".into()))?;
        if owner != self.state.current_node {
            return Err(ProgressionError::Unavailable(format!(
                "showcode is available in {owner}."
            )));
        }

        let key = key.map(str::to_ascii_uppercase).unwrap_or_default();
        let Some(source) = codes::snippet(&key) else {
            return Err(ProgressionError::Usage("showcode <A|B|C>"));
        };
        self.state
            .answers
            .insert(codes::LAST_SHOWN_KEY.to_owned(), key.clone());
        self.journal.print(format!("[{owner}] Current code snippet: {key}"));
        for line in source.lines() {
            self.journal.print(format!("    {line}"));
        }
        Ok(())
    }

    /// `unlock <password>` in the goal node, checked per `meta.final_unlock`.
    pub fn final_unlock(&mut self, credential: &str) -> ProgressionResult<()> {
        let config = self.config;
        let goal = config.goal_node().ok_or_else(|| {
            ProgressionError::Unavailable("There is no final lock in this timeline.".into())
        })?;
        if self.state.current_node != goal {
            return Err(ProgressionError::NotInGoalNode(goal));
        }
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(ProgressionError::Usage("unlock <password>"));
        }

        let policy = config.meta.final_unlock;
        if policy == FinalUnlockPolicy::DerivedPassword {
            let name = self.state.player_name.as_deref().unwrap_or_default();
            if credential != derive_final_password(name, &self.state.tokens) {
                return Err(ProgressionError::WrongPassword);
            }
        }

        if let Some(spec) = self
            .current()
            .games
            .iter()
            .find(|g| g.kind() == PuzzleKind::Final)
            && self.award_solve(&spec.id)? == AwardOutcome::AlreadySolved
        {
            return Ok(());
        }
        self.journal.print("[END] Axis unlocked. Timeline restored.");
        self.journal.log(GameEvent::FinalUnlock {
            node: goal,
            policy,
        });
        Ok(())
    }
}
