//! A banking system: an ATM talks to the bank over two lossy channels.
//!
//! The ATM requests a withdrawal, the bank answers yes or no, and the ATM
//! confirms the payout; either channel may lose its message at any time.
//! Safety states that the client never loses money (balance plus paid-out
//! cash never drops below the original balance once both parties are idle),
//! and may-progress states that the fully idle configuration stays
//! reachable.

use modex_engine::{Features, LayoutBuilder, Model, StateMut, StateRef, Var};

/// Original balance of the account.
const ORIGINAL_BALANCE: usize = 200;

/// Transition numbers; the loss transitions model the "unusual" events and
/// get the largest numbers.
const ATM_1: u32 = 0;
const ATM_2: u32 = 1;
const BANK_1: u32 = 2;
const BANK_2: u32 = 3;
const CH1_LOSS: u32 = 4;
const CH2_LOSS: u32 = 5;
const TR_COUNT: u32 = 6;

#[derive(Default)]
pub struct Banking {
    atm: Var,
    x: Var,
    ch1: Var,
    y: Var,
    ch2: Var,
    w: Var,
    bank: Var,
    z: Var,
    balance: Var,
    cash: Var,
}

impl Banking {
    pub fn new() -> Self {
        Self::default()
    }

    // Channel 1 carries the request (q) and the confirmation (done).

    fn send_ch1_q(&self, s: &mut StateMut<'_>, val: usize) -> bool {
        if s.get(self.ch1) != 0 {
            return false;
        }
        s.set(self.ch1, 1);
        s.set(self.y, val);
        true
    }

    fn send_ch1_done(&self, s: &mut StateMut<'_>, val: usize) -> bool {
        if s.get(self.ch1) != 0 {
            return false;
        }
        s.set(self.ch1, 2);
        s.set(self.y, val);
        true
    }

    fn recv_ch1_q(&self, s: &mut StateMut<'_>) -> Option<usize> {
        if s.get(self.ch1) == 1 {
            let val = s.get(self.y);
            s.set(self.y, 0);
            s.set(self.ch1, 0);
            Some(val)
        } else {
            None
        }
    }

    fn recv_ch1_done(&self, s: &mut StateMut<'_>) -> Option<usize> {
        if s.get(self.ch1) == 2 {
            let val = s.get(self.y);
            s.set(self.y, 0);
            s.set(self.ch1, 0);
            Some(val)
        } else {
            None
        }
    }

    // Channel 2 carries the bank's yes (with the granted amount) or no.

    fn send_ch2_yes(&self, s: &mut StateMut<'_>, val: usize) -> bool {
        if s.get(self.ch2) != 0 {
            return false;
        }
        s.set(self.ch2, 1);
        s.set(self.w, val);
        true
    }

    fn send_ch2_no(&self, s: &mut StateMut<'_>) -> bool {
        if s.get(self.ch2) != 0 {
            return false;
        }
        s.set(self.ch2, 2);
        true
    }

    fn recv_ch2_yes(&self, s: &mut StateMut<'_>) -> Option<usize> {
        if s.get(self.ch2) == 1 {
            let val = s.get(self.w);
            s.set(self.w, 0);
            s.set(self.ch2, 0);
            Some(val)
        } else {
            None
        }
    }

    fn recv_ch2_no(&self, s: &mut StateMut<'_>) -> bool {
        if s.get(self.ch2) == 2 {
            s.set(self.ch2, 0);
            true
        } else {
            false
        }
    }

    fn fire_atm_1(&self, s: &mut StateMut<'_>) -> bool {
        match s.get(self.atm) {
            0 => {
                s.set(self.atm, 1);
                true
            }
            1 => {
                s.set(self.x, 20);
                s.set(self.atm, 2);
                true
            }
            2 => {
                let x = s.get(self.x);
                if self.send_ch1_q(s, x) {
                    s.set(self.x, 0);
                    s.set(self.atm, 3);
                    true
                } else {
                    false
                }
            }
            3 => {
                if let Some(val) = self.recv_ch2_yes(s) {
                    s.set(self.x, val);
                    s.set(self.atm, 4);
                    true
                } else if self.recv_ch2_no(s) {
                    s.set(self.atm, 6);
                    true
                } else {
                    false
                }
            }
            4 => {
                s.set(self.atm, 5);
                true
            }
            5 => {
                let (cash, x) = (s.get(self.cash), s.get(self.x));
                if cash + x < 256 {
                    s.set(self.cash, cash + x);
                }
                s.set(self.atm, 8);
                true
            }
            6 => {
                s.set(self.atm, 7);
                true
            }
            7 => {
                s.set(self.atm, 0);
                true
            }
            8 => {
                let x = s.get(self.x);
                if self.send_ch1_done(s, x) {
                    s.set(self.x, 0);
                    s.set(self.atm, 0);
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    fn fire_bank_1(&self, s: &mut StateMut<'_>) -> bool {
        match s.get(self.bank) {
            0 => {
                if let Some(val) = self.recv_ch1_q(s) {
                    s.set(self.z, val);
                    s.set(self.bank, 1);
                    true
                } else {
                    false
                }
            }
            1 => {
                let (z, b) = (s.get(self.z), s.get(self.balance));
                if z > b && self.send_ch2_no(s) {
                    s.set(self.z, 0);
                    s.set(self.bank, 0);
                    true
                } else if z <= b && self.send_ch2_yes(s, z) {
                    s.set(self.bank, 2);
                    true
                } else {
                    false
                }
            }
            2 => {
                if let Some(val) = self.recv_ch1_done(s) {
                    s.set(self.z, val);
                    s.set(self.bank, 3);
                    true
                } else {
                    false
                }
            }
            3 => {
                let (z, b) = (s.get(self.z), s.get(self.balance));
                s.set(self.balance, if b > z { b - z } else { 0 });
                s.set(self.z, 0);
                s.set(self.bank, 0);
                true
            }
            _ => false,
        }
    }
}

impl Model for Banking {
    fn declare(&mut self, b: &mut LayoutBuilder) -> u32 {
        self.atm = b.var(8);
        self.x = b.var(8);
        self.ch1 = b.var(8);
        self.y = b.var(8);
        self.ch2 = b.var(8);
        self.w = b.var(8);
        self.bank = b.var(8);
        self.z = b.var(8);
        self.balance = b.var(8);
        self.cash = b.var(8);
        TR_COUNT
    }

    fn init(&self, s: &mut StateMut<'_>) {
        s.set(self.balance, ORIGINAL_BALANCE);
    }

    fn fire(&self, tr: u32, s: &mut StateMut<'_>) -> bool {
        match tr {
            ATM_1 => self.fire_atm_1(s),
            ATM_2 => match s.get(self.atm) {
                // The client asks for the larger amount instead.
                1 => {
                    s.set(self.x, 50);
                    s.set(self.atm, 2);
                    true
                }
                // Timeout while waiting for the bank's answer.
                3 => {
                    s.set(self.atm, 7);
                    true
                }
                _ => false,
            },
            BANK_1 => self.fire_bank_1(s),
            // Timeout while the bank waits for the confirmation.
            BANK_2 => {
                if s.get(self.bank) == 2 {
                    s.set(self.bank, 0);
                    true
                } else {
                    false
                }
            }
            CH1_LOSS => {
                if s.get(self.ch1) != 0 {
                    s.set(self.ch1, 0);
                    s.set(self.y, 0);
                    true
                } else {
                    false
                }
            }
            CH2_LOSS => {
                if s.get(self.ch2) != 0 {
                    s.set(self.ch2, 0);
                    s.set(self.w, 0);
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    fn format_state(&self, s: &StateRef<'_>) -> String {
        let atm = s.get(self.atm);
        let x = if atm == 2 || atm == 4 || atm == 5 {
            format!("{}", s.get(self.x))
        } else {
            "  ".to_string()
        };
        let ch1 = match s.get(self.ch1) {
            1 => format!("q{}", s.get(self.y)),
            2 => format!("d{}", s.get(self.y)),
            _ => "   ".to_string(),
        };
        let ch2 = match s.get(self.ch2) {
            1 => format!("y{}", s.get(self.w)),
            2 => "no ".to_string(),
            _ => "   ".to_string(),
        };
        let bank = s.get(self.bank);
        let z = if bank != 0 {
            format!("{}", s.get(self.z))
        } else {
            "  ".to_string()
        };
        format!(
            "A= {atm} {x}  CH1= {ch1}  CH2= {ch2}  B= {bank} {z}  bal= {bal:>3}  cash= {cash:>3}",
            bal = s.get(self.balance),
            cash = s.get(self.cash),
        )
    }

    /// Once both parties are idle, the balance plus the paid-out cash must
    /// cover the original balance.
    fn check_state(&self, s: &StateRef<'_>) -> Option<&'static str> {
        if s.get(self.atm) == 0
            && s.get(self.bank) == 0
            && s.get(self.balance) + s.get(self.cash) < ORIGINAL_BALANCE
        {
            Some("The client lost")
        } else {
            None
        }
    }

    fn is_may_progress(&self, s: &StateRef<'_>) -> bool {
        s.get(self.atm) == 0
            && s.get(self.ch1) == 0
            && s.get(self.ch2) == 0
            && s.get(self.bank) == 0
    }

    fn features(&self) -> Features {
        Features {
            safety: true,
            may_progress: true,
            ..Features::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modex_engine::{CheckConfig, Explorer};

    #[test]
    fn test_initial_balance_set_in_init_phase() {
        let config = CheckConfig {
            only_typical: true,
            ..Default::default()
        };
        let mut explorer = Explorer::new(Banking::new(), config);
        let report = explorer.run();
        let tail = report.typical.expect("typical run");
        let first = tail
            .approach
            .first()
            .or(tail.cycle.first())
            .expect("non-empty execution");
        assert!(first.contains("bal= 200"), "got {first}");
        assert!(first.contains("cash=   0"), "got {first}");
    }

    #[test]
    fn test_typical_execution_closes_a_cycle() {
        // The system never terminates (the ATM can always start over), so a
        // typical execution must end by re-entering an earlier state.
        let config = CheckConfig {
            only_typical: true,
            ..Default::default()
        };
        let mut explorer = Explorer::new(Banking::new(), config);
        let report = explorer.run();
        assert!(report.verdict.is_pass());
        let tail = report.typical.expect("typical run");
        assert!(!tail.cycle.is_empty());
        assert!(report.states > 0);
    }
}
