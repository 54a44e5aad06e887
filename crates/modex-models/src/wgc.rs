//! The wolf, sheep, and cabbage puzzle.
//!
//! A man must ferry a wolf, a sheep, and a cabbage across a river in a boat
//! that holds him and at most one passenger. The wolf eats the sheep and the
//! sheep eats the cabbage whenever left together unattended. The safety
//! predicate is used as a goal finder: reaching "everything on the right
//! bank" is reported as a safety error, and its minimal counterexample is
//! the shortest solution.

use modex_engine::{Features, LayoutBuilder, Model, StateMut, StateRef, Var};

/// Positions cycle left bank -> boat going right -> right bank -> boat going
/// left -> left bank.
const LEFT: usize = 0;
const RIGHT: usize = 2;

#[derive(Default)]
pub struct RiverCrossing {
    man: Var,
    wolf: Var,
    sheep: Var,
    cabb: Var,
}

impl RiverCrossing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one position: bank to boat, boat to the opposite bank.
    fn step(&self, s: &mut StateMut<'_>, var: Var) {
        let p = s.get(var);
        s.set(var, if p < 3 { p + 1 } else { LEFT });
    }

    fn print_place(&self, s: &StateRef<'_>, place: usize, out: &mut String) {
        for (var, letter) in [
            (self.man, 'M'),
            (self.wolf, 'W'),
            (self.sheep, 'S'),
            (self.cabb, 'C'),
        ] {
            out.push(if s.get(var) == place { letter } else { ' ' });
        }
    }
}

impl Model for RiverCrossing {
    fn declare(&mut self, b: &mut LayoutBuilder) -> u32 {
        self.man = b.var(2);
        self.wolf = b.var(2);
        self.sheep = b.var(2);
        self.cabb = b.var(2);
        4
    }

    /// The enabling conditions encode: whatever is with the man cannot eat
    /// or be eaten, whatever sits on a different place cannot either, and
    /// the man never leaves a passenger alone on the boat.
    fn fire(&self, tr: u32, s: &mut StateMut<'_>) -> bool {
        let (man, wolf, sheep, cabb) = (
            s.get(self.man),
            s.get(self.wolf),
            s.get(self.sheep),
            s.get(self.cabb),
        );
        match tr {
            // The man moves alone.
            0 => {
                if wolf != sheep
                    && sheep != cabb
                    && wolf % 2 == 0
                    && sheep % 2 == 0
                    && cabb % 2 == 0
                {
                    self.step(s, self.man);
                    true
                } else {
                    false
                }
            }
            // The man moves with the wolf.
            1 => {
                if man == wolf && sheep != cabb {
                    self.step(s, self.man);
                    self.step(s, self.wolf);
                    true
                } else {
                    false
                }
            }
            // The man moves with the sheep.
            2 => {
                if man == sheep {
                    self.step(s, self.man);
                    self.step(s, self.sheep);
                    true
                } else {
                    false
                }
            }
            // The man moves with the cabbage.
            3 => {
                if man == cabb && wolf != sheep {
                    self.step(s, self.man);
                    self.step(s, self.cabb);
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    fn format_state(&self, s: &StateRef<'_>) -> String {
        let mut out = String::new();
        self.print_place(s, LEFT, &mut out);
        match s.get(self.man) {
            1 => {
                out.push_str(" |> ");
                self.print_place(s, 1, &mut out);
                out.push_str(" >| ");
            }
            3 => {
                out.push_str(" |< ");
                self.print_place(s, 3, &mut out);
                out.push_str(" <| ");
            }
            _ => out.push_str(" |        | "),
        }
        self.print_place(s, RIGHT, &mut out);
        out
    }

    /// Not an error check but a goal finder: the "error" is the solution.
    fn check_state(&self, s: &StateRef<'_>) -> Option<&'static str> {
        if s.get(self.wolf) == RIGHT && s.get(self.sheep) == RIGHT && s.get(self.cabb) == RIGHT {
            Some("All on the right bank!")
        } else {
            None
        }
    }

    fn features(&self) -> Features {
        Features {
            safety: true,
            ..Features::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modex_engine::{CheckConfig, Explorer, FailureKind};

    #[test]
    fn test_initial_state_rendering() {
        let config = CheckConfig {
            only_typical: true,
            ..Default::default()
        };
        let mut explorer = Explorer::new(RiverCrossing::new(), config);
        let report = explorer.run();
        let tail = report.typical.expect("typical run");
        assert_eq!(tail.approach.first().unwrap(), "MWSC |        |     ");
    }

    #[test]
    fn test_goal_found_as_safety_error() {
        let config = CheckConfig::from_features(RiverCrossing::new().features());
        let mut explorer = Explorer::new(RiverCrossing::new(), config);
        let report = explorer.run();
        let failure = report.verdict.failure().expect("solution exists");
        assert_eq!(failure.kind, FailureKind::Safety);
        assert_eq!(failure.message, "All on the right bank!");
    }
}
