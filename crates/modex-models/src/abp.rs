//! Alternating-bit protocol with failure and recovery.
//!
//! Five components: client, sender, data channel, receiver, ack channel,
//! plus two losers that can drop the head of either channel at any time.
//! Instead of retransmitting, the sender reports failure when no ack
//! arrives; initially and after every failure it first sends a flush
//! message (F) and waits for its ack, so that sender and receiver agree on
//! the alternating bit again before new data flows. Channels of capacity n
//! are modelled cell by cell, giving one structural transition per internal
//! hop; `compress` makes them atomic instead. With `check_out` the client
//! records what is in transit and checks every delivery.
//!
//! The model supplies a full stubborn-set obligation function, so it can be
//! explored with reduction.

use modex_engine::{Features, LayoutBuilder, Model, Obligation, StateMut, StateRef, Var};
use tracing::info;

/// Message letters: index 0 is "none", then N, Y, F.
const MCH: [char; 4] = [' ', 'N', 'Y', 'F'];

pub struct AlternatingBit {
    /// Channel capacity.
    n: usize,
    /// Sender may stop for good.
    terminate: bool,
    /// Channels work atomically instead of as a chain of cells.
    compress: bool,
    /// Track messages in transit and check every delivery.
    check_out: bool,
    /// Most recently sent message content: 0 = none, 1 = N, 2 = Y.
    cc: Var,
    /// Because of failures, an N and/or Y remnant may still be in transit.
    cn: Var,
    cy: Var,
    /// Sender control state, message, and alternating bit.
    sc: Var,
    sm: Var,
    sb: Var,
    /// Receiver control state, message, and alternating bit.
    rc: Var,
    rm: Var,
    rb: Var,
    /// Data channel cells: content (0 = none, 1 = N, 2 = Y, 3 = F) and bit.
    dc: Vec<Var>,
    db: Vec<Var>,
    /// Ack channel cells: occupancy and bit.
    ac: Vec<Var>,
    ab: Vec<Var>,
}

impl AlternatingBit {
    pub fn new(n: usize) -> Self {
        assert!(n >= 1, "channel capacity must be at least 1");
        Self {
            n,
            terminate: true,
            compress: false,
            check_out: false,
            cc: Var::default(),
            cn: Var::default(),
            cy: Var::default(),
            sc: Var::default(),
            sm: Var::default(),
            sb: Var::default(),
            rc: Var::default(),
            rm: Var::default(),
            rb: Var::default(),
            dc: Vec::new(),
            db: Vec::new(),
            ac: Vec::new(),
            ab: Vec::new(),
        }
    }

    pub fn terminate(mut self, on: bool) -> Self {
        self.terminate = on;
        self
    }

    pub fn compress(mut self, on: bool) -> Self {
        self.compress = on;
        self
    }

    pub fn check_out(mut self, on: bool) -> Self {
        self.check_out = on;
        self
    }

    /// Whether the channels have internal hop transitions; the stubborn
    /// obligations enter the channel transitions only in that case.
    fn chained(&self) -> bool {
        !self.compress && self.n > 1
    }

    fn tr_count(&self) -> u32 {
        2 * self.n as u32 + 3 + u32::from(self.terminate)
    }

    /// Shift every message in the data channel towards the head.
    fn compact_data(&self, s: &mut StateMut<'_>) {
        if !self.compress {
            return;
        }
        let mut j = 0;
        while j < self.n && s.get(self.dc[j]) != 0 {
            j += 1;
        }
        for i in j + 1..self.n {
            if s.get(self.dc[i]) != 0 {
                s.set(self.dc[j], s.get(self.dc[i]));
                s.set(self.dc[i], 0);
                s.set(self.db[j], s.get(self.db[i]));
                s.set(self.db[i], 0);
                j += 1;
            }
        }
    }

    /// Shift every ack towards the head.
    fn compact_ack(&self, s: &mut StateMut<'_>) {
        if !self.compress {
            return;
        }
        let mut j = 0;
        while j < self.n && s.get(self.ac[j]) != 0 {
            j += 1;
        }
        for i in j + 1..self.n {
            if s.get(self.ac[i]) != 0 {
                s.set(self.ac[j], s.get(self.ac[i]));
                s.set(self.ac[i], 0);
                s.set(self.ab[j], s.get(self.ab[i]));
                s.set(self.ab[i], 0);
                j += 1;
            }
        }
    }

    /// Sender main line: flush, wait for ack, send data, wait again, report.
    fn fire_sender(&self, s: &mut StateMut<'_>) -> bool {
        let last = self.n - 1;
        match s.get(self.sc) {
            // send?N from the client
            0 => {
                if self.check_out {
                    s.set(self.cc, 1);
                }
                s.set(self.sm, 0);
                s.set(self.sc, 1);
                true
            }
            // flush!b
            1 => {
                if s.get(self.dc[last]) != 0 {
                    return false;
                }
                s.set(self.dc[last], 3);
                s.set(self.db[last], s.get(self.sb));
                self.compact_data(s);
                s.set(self.sc, 2);
                true
            }
            // ack?b': on a matching bit, move on with the bit swapped
            2 => {
                if s.get(self.ac[0]) == 0 {
                    return false;
                }
                if s.get(self.sb) == s.get(self.ab[0]) {
                    s.set(self.sb, 1 - s.get(self.sb));
                    s.set(self.sc, 3);
                }
                s.set(self.ac[0], 0);
                s.set(self.ab[0], 0);
                self.compact_ack(s);
                true
            }
            // data!m!b
            3 => {
                if s.get(self.dc[last]) != 0 {
                    return false;
                }
                s.set(self.dc[last], s.get(self.sm) + 1);
                s.set(self.db[last], s.get(self.sb));
                self.compact_data(s);
                s.set(self.sc, 4);
                s.set(self.sm, 0);
                true
            }
            // ack?b'
            4 => {
                if s.get(self.ac[0]) == 0 {
                    return false;
                }
                if s.get(self.sb) == s.get(self.ab[0]) {
                    s.set(self.sb, 1 - s.get(self.sb));
                    s.set(self.sc, 5);
                }
                s.set(self.ac[0], 0);
                s.set(self.ab[0], 0);
                self.compact_ack(s);
                true
            }
            // ok to the client
            5 => {
                s.set(self.sc, 6);
                s.set(self.cc, 0);
                s.set(self.cn, 0);
                s.set(self.cy, 0);
                true
            }
            // send?N for the next round (bit already agreed)
            6 => {
                if self.check_out {
                    s.set(self.cc, 1);
                }
                s.set(self.sm, 0);
                s.set(self.sc, 3);
                true
            }
            _ => false,
        }
    }

    /// Sender side line: the Y requests and the failure report.
    fn fire_sender_alt(&self, s: &mut StateMut<'_>) -> bool {
        match s.get(self.sc) {
            // send?Y
            0 => {
                if self.check_out {
                    s.set(self.cc, 2);
                }
                s.set(self.sm, 1);
                s.set(self.sc, 1);
                true
            }
            // fail: the message in transit becomes a remnant
            2 | 4 => {
                if self.check_out {
                    if s.get(self.cc) == 1 {
                        s.set(self.cn, 1);
                    } else {
                        s.set(self.cy, 1);
                    }
                }
                s.set(self.cc, 0);
                s.set(self.sm, 0);
                s.set(self.sc, 0);
                true
            }
            // send?Y for the next round
            6 => {
                if self.check_out {
                    s.set(self.cc, 2);
                }
                s.set(self.sm, 1);
                s.set(self.sc, 3);
                true
            }
            _ => false,
        }
    }

    fn fire_receiver(&self, s: &mut StateMut<'_>) -> bool {
        let last = self.n - 1;
        match s.get(self.rc) {
            // data?m?b: accept on a matching bit, else resynchronise
            0 => {
                if s.get(self.dc[0]) == 0 {
                    return false;
                }
                if s.get(self.dc[0]) < 3 && s.get(self.db[0]) == s.get(self.rb) {
                    s.set(self.rm, s.get(self.dc[0]) - 1);
                    s.set(self.rc, 1);
                } else {
                    s.set(self.rb, s.get(self.db[0]));
                    s.set(self.rc, 2);
                }
                s.set(self.dc[0], 0);
                s.set(self.db[0], 0);
                self.compact_data(s);
                true
            }
            // rec!m to the client
            1 => {
                if self.check_out {
                    let (rm, cc) = (s.get(self.rm), s.get(self.cc));
                    if (s.get(self.cn) != 0 && rm == 0) || (s.get(self.cy) != 0 && rm == 1) {
                        s.set(self.cn, 0);
                        s.set(self.cy, 0);
                    } else if rm + 1 == cc {
                        s.set(self.cc, 0);
                        s.set(self.cn, 0);
                        s.set(self.cy, 0);
                    } else {
                        s.fail("This should be impossible");
                    }
                }
                s.set(self.rc, 2);
                s.set(self.rm, 0);
                true
            }
            // ack!b
            2 => {
                if s.get(self.ac[last]) != 0 {
                    return false;
                }
                s.set(self.ac[last], 1);
                s.set(self.ab[last], s.get(self.rb));
                self.compact_ack(s);
                s.set(self.rc, 0);
                s.set(self.rb, 1 - s.get(self.rb));
                true
            }
            _ => false,
        }
    }
}

impl Model for AlternatingBit {
    fn declare(&mut self, b: &mut LayoutBuilder) -> u32 {
        self.cc = b.var(2);
        self.cn = b.var(1);
        self.cy = b.var(1);
        self.sc = b.var(3);
        self.sm = b.var(1);
        self.sb = b.var(1);
        self.rc = b.var(2);
        self.rm = b.var(1);
        self.rb = b.var(1);
        self.dc = b.var_vec(self.n, 2);
        self.db = b.var_vec(self.n, 1);
        self.ac = b.var_vec(self.n, 1);
        self.ab = b.var_vec(self.n, 1);
        info!(
            capacity = self.n,
            compress = self.compress,
            terminate = self.terminate,
            check_out = self.check_out,
            "alternating bit configuration"
        );
        self.tr_count()
    }

    fn fire(&self, tr: u32, s: &mut StateMut<'_>) -> bool {
        let n = self.n;
        let tr = tr as usize;
        match tr {
            0 => self.fire_sender(s),
            1 => self.fire_sender_alt(s),
            2 => self.fire_receiver(s),
            // Data loser: drops the head of the data channel.
            3 => {
                if s.get(self.dc[0]) == 0 {
                    return false;
                }
                s.set(self.dc[0], 0);
                s.set(self.db[0], 0);
                self.compact_data(s);
                true
            }
            // Ack loser.
            4 => {
                if s.get(self.ac[0]) == 0 {
                    return false;
                }
                s.set(self.ac[0], 0);
                s.set(self.ab[0], 0);
                self.compact_ack(s);
                true
            }
            // Data channel hop: cell i to cell i-1.
            t if t < n + 4 => {
                let i = t - 4;
                if s.get(self.dc[i]) == 0 || s.get(self.dc[i - 1]) != 0 {
                    return false;
                }
                s.set(self.dc[i - 1], s.get(self.dc[i]));
                s.set(self.dc[i], 0);
                s.set(self.db[i - 1], s.get(self.db[i]));
                s.set(self.db[i], 0);
                true
            }
            // Ack channel hop.
            t if t < 2 * n + 3 => {
                let i = t - n - 3;
                if s.get(self.ac[i]) == 0 || s.get(self.ac[i - 1]) != 0 {
                    return false;
                }
                s.set(self.ac[i - 1], s.get(self.ac[i]));
                s.set(self.ac[i], 0);
                s.set(self.ab[i - 1], s.get(self.ab[i]));
                s.set(self.ab[i], 0);
                true
            }
            // Stopper: the sender quits for good between rounds.
            _ if self.terminate => {
                if s.get(self.sc) == 0 || s.get(self.sc) == 6 {
                    s.set(self.sc, 7);
                    s.set(self.sb, 0);
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
        out.push(MCH[s.get(self.cc)]);
        out.push(if s.get(self.cn) != 0 { 'N' } else { ' ' });
        out.push(if s.get(self.cy) != 0 { 'Y' } else { ' ' });
        let sc = s.get(self.sc);
        out.push(' ');
        out.push_str(&sc.to_string());
        out.push_str(&s.get(self.sb).to_string());
        out.push(MCH[if sc != 0 && sc < 4 { s.get(self.sm) + 1 } else { 0 }]);
        out.push(' ');
        for i in (0..self.n).rev() {
            if s.get(self.dc[i]) != 0 {
                out.push(MCH[s.get(self.dc[i])]);
                out.push_str(&s.get(self.db[i]).to_string());
            } else {
                out.push_str("  ");
            }
        }
        let rc = s.get(self.rc);
        out.push(' ');
        out.push_str(&rc.to_string());
        out.push_str(&s.get(self.rb).to_string());
        out.push(MCH[if rc == 1 { s.get(self.rm) + 1 } else { 0 }]);
        out.push(' ');
        for i in (0..self.n).rev() {
            if s.get(self.ac[i]) != 0 {
                out.push_str(&s.get(self.ab[i]).to_string());
            } else {
                out.push(' ');
            }
        }
        out
    }

    fn check_state(&self, s: &StateRef<'_>) -> Option<&'static str> {
        if !self.check_out || s.get(self.rc) != 1 {
            return None;
        }
        if s.get(self.cc) == 0 && s.get(self.cn) == 0 && s.get(self.cy) == 0 {
            return Some("Unexpected message");
        }
        let rm = s.get(self.rm);
        if rm + 1 == s.get(self.cc) {
            return None;
        }
        if (s.get(self.cn) != 0 && rm == 0) || (s.get(self.cy) != 0 && rm == 1) {
            return None;
        }
        Some("Wrong message")
    }

    /// Termination is only acceptable with the sender stopped and every
    /// component and channel empty.
    fn check_deadlock(&self, s: &StateRef<'_>) -> Option<&'static str> {
        let clean = s.get(self.sc) == 7
            && s.get(self.sm) == 0
            && s.get(self.rc) == 0
            && s.get(self.rm) == 0
            && s.get(self.dc[0]) == 0
            && s.get(self.db[0]) == 0
            && s.get(self.ac[0]) == 0
            && s.get(self.ab[0]) == 0
            && s.get(self.cc) == 0;
        if clean {
            None
        } else {
            Some("Unexpected termination")
        }
    }

    fn is_may_progress(&self, s: &StateRef<'_>) -> bool {
        if self.check_out {
            s.get(self.rc) == 1
                && s.get(self.rm) + 1 == s.get(self.cc)
                && s.get(self.cn) == 0
                && s.get(self.cy) == 0
        } else {
            s.get(self.rc) == 1
        }
    }

    fn is_must_progress(&self, s: &StateRef<'_>) -> bool {
        s.get(self.sc) == 0
    }

    fn obligations(&self, tr: u32, s: &StateRef<'_>) -> Obligation {
        let n = self.n;
        let chn = self.chained();
        let tr = tr as usize;
        let last = n - 1;
        match tr {
            0 => match s.get(self.sc) {
                0 | 6 => {
                    if self.terminate {
                        Obligation::one_of(&[1, 2, 2 * n as u32 + 3])
                    } else {
                        Obligation::one_of(&[1, 2])
                    }
                }
                1 | 3 => {
                    if s.get(self.dc[last]) != 0 {
                        if chn {
                            Obligation::one_of(&[n as u32 + 3])
                        } else {
                            Obligation::one_of(&[2, 3])
                        }
                    } else {
                        Obligation::None
                    }
                }
                2 | 4 => {
                    if s.get(self.ac[0]) != 0 {
                        Obligation::one_of(&[1, 4])
                    } else if chn {
                        Obligation::one_of(&[n as u32 + 4])
                    } else {
                        Obligation::one_of(&[2])
                    }
                }
                5 => Obligation::one_of(&[2]),
                _ => Obligation::None,
            },
            1 => match s.get(self.sc) {
                0 | 2 | 4 | 6 => Obligation::one_of(&[0, 2]),
                _ => Obligation::one_of(&[0]),
            },
            2 => match s.get(self.rc) {
                0 => {
                    if s.get(self.dc[0]) != 0 {
                        Obligation::one_of(&[3])
                    } else if chn {
                        Obligation::one_of(&[5])
                    } else {
                        Obligation::one_of(&[0])
                    }
                }
                1 => Obligation::one_of(&[0, 1]),
                2 => {
                    if s.get(self.ac[last]) != 0 {
                        if chn {
                            Obligation::one_of(&[2 * n as u32 + 2])
                        } else {
                            Obligation::one_of(&[0, 4])
                        }
                    } else {
                        Obligation::None
                    }
                }
                _ => Obligation::None,
            },
            3 => {
                if s.get(self.dc[0]) != 0 {
                    Obligation::one_of(&[2])
                } else if chn {
                    Obligation::one_of(&[5])
                } else {
                    Obligation::one_of(&[0])
                }
            }
            4 => {
                if s.get(self.ac[0]) != 0 {
                    Obligation::one_of(&[0])
                } else if chn {
                    Obligation::one_of(&[n as u32 + 4])
                } else {
                    Obligation::one_of(&[2])
                }
            }
            t if t < n + 4 => {
                let i = t - 4;
                if s.get(self.dc[i]) == 0 {
                    if t < n + 3 {
                        Obligation::one_of(&[t as u32 + 1])
                    } else {
                        Obligation::one_of(&[0])
                    }
                } else if s.get(self.dc[i - 1]) != 0 {
                    if t > 5 {
                        Obligation::one_of(&[t as u32 - 1])
                    } else {
                        Obligation::one_of(&[2, 3])
                    }
                } else {
                    Obligation::None
                }
            }
            t if t < 2 * n + 3 => {
                let i = t - n - 3;
                if s.get(self.ac[i]) == 0 {
                    if t < 2 * n + 2 {
                        Obligation::one_of(&[t as u32 + 1])
                    } else {
                        Obligation::one_of(&[2])
                    }
                } else if s.get(self.ac[i - 1]) != 0 {
                    if t > n + 4 {
                        Obligation::one_of(&[t as u32 - 1])
                    } else {
                        Obligation::one_of(&[0, 4])
                    }
                } else {
                    Obligation::None
                }
            }
            _ => Obligation::one_of(&[0]),
        }
    }

    fn features(&self) -> Features {
        Features {
            safety: true,
            deadlock: true,
            stubborn: true,
            ..Features::default()
        }
    }
}
