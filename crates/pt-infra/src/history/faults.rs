use std::collections::{HashMap, VecDeque};

use pt_core::ports::HistoryServiceError;
use tokio::sync::oneshot;

/// Service operations that can be failed or held back in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultOp {
    List,
    Count,
    Pin,
    Unpin,
    Delete,
    ClearUnpinned,
    Preview,
    KeepWindowOpen,
    Subscribe,
}

/// Holds one response until released (or dropped).
///
/// The response is computed when the call arrives and delivered on release,
/// so releasing gates out of order reorders response arrival.
#[derive(Debug)]
pub struct ResponseGate {
    release: oneshot::Sender<()>,
}

impl ResponseGate {
    pub fn release(self) {
        let _ = self.release.send(());
    }
}

#[derive(Debug, Default)]
pub(crate) struct Faults {
    failures: HashMap<FaultOp, VecDeque<HistoryServiceError>>,
    gates: HashMap<FaultOp, VecDeque<oneshot::Receiver<()>>>,
    calls: HashMap<FaultOp, usize>,
}

impl Faults {
    pub(crate) fn fail_next(&mut self, op: FaultOp, error: HistoryServiceError) {
        self.failures.entry(op).or_default().push_back(error);
    }

    pub(crate) fn hold_next(&mut self, op: FaultOp) -> ResponseGate {
        let (release, held) = oneshot::channel();
        self.gates.entry(op).or_default().push_back(held);
        ResponseGate { release }
    }

    /// Record a call and take whatever was armed for it.
    pub(crate) fn arrive(&mut self, op: FaultOp) -> (Option<HistoryServiceError>, Option<oneshot::Receiver<()>>) {
        *self.calls.entry(op).or_default() += 1;
        let failure = self.failures.get_mut(&op).and_then(VecDeque::pop_front);
        let gate = self.gates.get_mut(&op).and_then(VecDeque::pop_front);
        (failure, gate)
    }

    pub(crate) fn calls(&self, op: FaultOp) -> usize {
        self.calls.get(&op).copied().unwrap_or(0)
    }
}
