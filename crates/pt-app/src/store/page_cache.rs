use pt_core::{ClipId, ClipSummary, QueryDescriptor, QueryShape};

/// Most recently applied page and total count.
///
/// Responses are gated by the sequence number assigned at issue time: a page
/// is applied only when it answers the current descriptor and is newer than
/// the last applied page. Counts are gated the same way against the current shape.
/// 响应按发出顺序生效，而不是按到达顺序。
#[derive(Debug, Default)]
pub(crate) struct PageCache {
    items: Vec<ClipSummary>,
    applied_page_seq: u64,
    total_count: u64,
    count_for: Option<QueryShape>,
    applied_count_seq: u64,
    stale: bool,
}

impl PageCache {
    pub(crate) fn items(&self) -> &[ClipSummary] {
        &self.items
    }

    /// Total count, only when it was computed for `shape`.
    pub(crate) fn total_count_for(&self, shape: &QueryShape) -> Option<u64> {
        match &self.count_for {
            Some(for_shape) if for_shape == shape => Some(self.total_count),
            _ => None,
        }
    }

    pub(crate) fn is_stale(&self) -> bool {
        self.stale
    }

    pub(crate) fn invalidate(&mut self) {
        self.stale = true;
    }

    pub(crate) fn accept_page(
        &mut self,
        seq: u64,
        answered: &QueryDescriptor,
        current: &QueryDescriptor,
        items: Vec<ClipSummary>,
    ) -> bool {
        if answered != current || seq <= self.applied_page_seq {
            return false;
        }
        self.items = items;
        self.applied_page_seq = seq;
        self.stale = false;
        true
    }

    pub(crate) fn accept_count(&mut self, seq: u64, answered: &QueryShape, current: &QueryShape, count: u64) -> bool {
        if answered != current || seq <= self.applied_count_seq {
            return false;
        }
        self.total_count = count;
        self.count_for = Some(answered.clone());
        self.applied_count_seq = seq;
        true
    }

    /// Fold a committed delete into the canonical page.
    pub(crate) fn remove(&mut self, id: ClipId) -> bool {
        let before = self.items.len();
        self.items.retain(|clip| clip.id != id);
        let removed = self.items.len() != before;
        if removed {
            self.total_count = self.total_count.saturating_sub(1);
        }
        removed
    }

    /// Fold a committed clear into the canonical page.
    pub(crate) fn remove_unpinned(&mut self, deleted: u64) {
        self.items.retain(|clip| clip.is_pinned);
        self.total_count = self.total_count.saturating_sub(deleted);
    }

    /// Fold a committed pin/unpin into the canonical page.
    pub(crate) fn set_pinned(&mut self, id: ClipId, pinned: bool) {
        set_pinned_in_place(&mut self.items, id, pinned);
    }
}

/// Flip the pin flag of one item and move it to where the service ordering
/// (pin-first, newest first) would put it. Returns whether the item was found.
pub(crate) fn set_pinned_in_place(items: &mut Vec<ClipSummary>, id: ClipId, pinned: bool) -> bool {
    let Some(index) = items.iter().position(|clip| clip.id == id) else {
        return false;
    };
    let mut clip = items.remove(index);
    clip.is_pinned = pinned;
    let target = items
        .iter()
        .position(|other| !other.ranks_before(&clip))
        .unwrap_or(items.len());
    items.insert(target, clip);
    true
}
