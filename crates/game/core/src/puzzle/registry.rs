use super::{
    AxisLock, ChessFork, ChromaticDrift, CodeObservatory, NimLab, PatternStorm, PuzzleModule,
    TicTacToeSequence,
};
use crate::config::GameConfig;

/// Ids of every built-in module.
pub const MODULE_IDS: [&str; 7] = [
    "colors",
    "chess",
    "codes",
    "regex",
    "tictactoe",
    "dilemma",
    "final",
];

/// Instantiates the module registered under `id`.
///
/// `seed` drives the module's randomness so sessions can be replayed in tests.
pub fn create_module(id: &str, config: &GameConfig, seed: u64) -> Option<Box<dyn PuzzleModule>> {
    let module: Box<dyn PuzzleModule> = match id {
        "colors" => Box::new(ChromaticDrift::new(config.nodes_with_puzzle("colors"), seed)),
        "chess" => Box::new(ChessFork::new()),
        "codes" | "code" => Box::new(CodeObservatory::new()),
        "regex" => Box::new(PatternStorm::new(seed)),
        "tictactoe" => Box::new(TicTacToeSequence::new(seed)),
        "dilemma" => Box::new(NimLab::new()),
        "final" => Box::new(AxisLock::new()),
        _ => return None,
    };
    Some(module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_registered_id_creates_its_module() {
        let config = GameConfig::default();
        for id in MODULE_IDS {
            let module = create_module(id, &config, 0).expect("registered module");
            assert_eq!(module.id(), id);
        }
        assert!(create_module("pong", &config, 0).is_none());
    }
}
