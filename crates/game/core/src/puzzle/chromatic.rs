use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use super::{ModuleContext, ModuleError, PuzzleModule, Surface};
use crate::state::NodeId;

const WARM: [&str; 3] = ["red", "orange", "yellow"];
const COLD: [&str; 10] = [
    "ice", "cyan", "teal", "azure", "aqua", "sky", "powder", "lavender", "periwinkle", "mint",
];

/// Number of distinct scenes: two rectangles in any warm color (repeats
/// allowed) times two triangles in distinct cold colors.
pub fn combinations(cold_colors: u32) -> u64 {
    let cold = u64::from(cold_colors);
    let warm = WARM.len() as u64;
    warm * warm * cold * cold.saturating_sub(1)
}

/// Counting riddle over a drifting four-shape scene.
pub struct ChromaticDrift {
    home: Vec<NodeId>,
    rng: StdRng,
}

impl ChromaticDrift {
    pub fn new(home: Vec<NodeId>, seed: u64) -> Self {
        Self {
            home,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn scene(&mut self) -> String {
        let r1 = WARM.choose(&mut self.rng).copied().unwrap_or(WARM[0]);
        let r2 = WARM.choose(&mut self.rng).copied().unwrap_or(WARM[0]);
        let mut cold = COLD.choose_multiple(&mut self.rng, 2);
        let t1 = cold.next().copied().unwrap_or(COLD[0]);
        let t2 = cold.next().copied().unwrap_or(COLD[1]);
        format!("[COLORS] rect({r1}) rect({r2}) tri({t1}) tri({t2})")
    }
}

impl PuzzleModule for ChromaticDrift {
    fn id(&self) -> &'static str {
        "colors"
    }

    fn title(&self) -> &'static str {
        "Chromatic Drift"
    }

    fn is_allowed_here(&self, node: &NodeId) -> bool {
        self.home.is_empty() || self.home.contains(node)
    }

    fn mount(&mut self, surface: &mut dyn Surface) {
        surface.print_line(&format!("[GAME] {}", self.title()));
        surface.print_line("Riddle: count every valid color combination.");
        surface.print_line("Rectangles can be red/orange/yellow (repeats allowed).");
        surface.print_line("Triangles use cold colors and can never match each other.");
        surface.print_line("Node minutes hint how many triangle colors exist.");
        surface.print_line("Solve via terminal: solve colors <COMBINATIONS>  (drift: redraw)");
    }

    fn start(&mut self, cx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        cx.print(format!("[GAME] {} started.", self.title()));
        let scene = self.scene();
        cx.print(scene);
        Ok(())
    }

    fn on_command(
        &mut self,
        cmd: &str,
        _args: &[String],
        cx: &mut ModuleContext<'_>,
    ) -> Result<bool, ModuleError> {
        if cmd != "drift" {
            return Ok(false);
        }
        let scene = self.scene();
        cx.print(scene);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::testing::{Harness, args};

    #[test]
    fn combinations_follow_closed_form() {
        assert_eq!(combinations(0), 0);
        assert_eq!(combinations(1), 0);
        assert_eq!(combinations(4), 9 * 4 * 3);
        assert_eq!(combinations(10), 810);
    }

    #[test]
    fn restricted_to_home_nodes() {
        let module = ChromaticDrift::new(vec![NodeId::from("N1")], 7);
        assert!(module.is_allowed_here(&NodeId::from("N1")));
        assert!(!module.is_allowed_here(&NodeId::from("N2")));
        assert!(ChromaticDrift::new(Vec::new(), 7).is_allowed_here(&NodeId::from("N9")));
    }

    #[test]
    fn drift_redraws_and_other_commands_pass_through() {
        let mut harness = Harness::new("N1");
        let mut module = ChromaticDrift::new(Vec::new(), 1);
        assert_eq!(module.on_command("drift", &[], &mut harness.cx()), Ok(true));
        assert_eq!(module.on_command("help", &args(&["x"]), &mut harness.cx()), Ok(false));
        assert!(harness.surface.contains("[COLORS] rect("));
    }
}
