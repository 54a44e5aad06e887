//! Counterexample reconstruction.

use crate::explorer::Explorer;
use crate::model::Model;

impl<M: Model> Explorer<M> {
    /// Render row `ni` through the model.
    pub(crate) fn render_row(&mut self, ni: u32) -> String {
        self.pool.bind(ni);
        self.model.format_state(&self.state_ref())
    }

    /// The sequence of states from the initial state (or any state without a
    /// predecessor) to `ni`, rendered one per entry. `history(0)` is the
    /// zero-length history used for errors that predate exploration.
    pub(crate) fn history(&mut self, ni: u32) -> Vec<String> {
        let mut chain = Vec::new();
        let mut cur = ni;
        while cur != 0 {
            chain.push(cur);
            cur = self.nodes[cur as usize].prev;
        }
        chain.reverse();
        chain.into_iter().map(|row| self.render_row(row)).collect()
    }
}
