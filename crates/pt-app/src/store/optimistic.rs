use pt_core::{ClipId, ClipSummary};

use super::page_cache::set_pinned_in_place;

/// Optimistic change awaiting acknowledgment from the history service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PendingChange {
    Pin { id: ClipId, pinned: bool },
    Delete { id: ClipId },
    ClearUnpinned,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    ticket: u64,
    change: PendingChange,
}

/// Pending overlay applied on top of the canonical page.
///
/// The canonical page is never edited optimistically: committing folds the
/// change into it, reverting just drops the overlay entry, so a rejected delete
/// reappears exactly where it was.
/// 两阶段更新：先挂起，再提交或回滚。
#[derive(Debug, Default)]
pub(crate) struct PendingMutations {
    entries: Vec<Pending>,
    next_ticket: u64,
}

impl PendingMutations {
    pub(crate) fn push(&mut self, change: PendingChange) -> u64 {
        self.next_ticket += 1;
        self.entries.push(Pending {
            ticket: self.next_ticket,
            change,
        });
        self.next_ticket
    }

    /// Remove and return the entry; `None` if it was already resolved.
    pub(crate) fn resolve(&mut self, ticket: u64) -> Option<PendingChange> {
        let index = self.entries.iter().position(|p| p.ticket == ticket)?;
        Some(self.entries.remove(index).change)
    }

    pub(crate) fn touches(&self, id: ClipId) -> bool {
        self.entries.iter().any(|p| match p.change {
            PendingChange::Pin { id: pending, .. } | PendingChange::Delete { id: pending } => pending == id,
            PendingChange::ClearUnpinned => false,
        })
    }

    pub(crate) fn has_clear(&self) -> bool {
        self.entries
            .iter()
            .any(|p| matches!(p.change, PendingChange::ClearUnpinned))
    }

    /// Canonical items hidden by a pending single delete. A pending clear is not
    /// counted: it also removes clips on pages that are not loaded.
    pub(crate) fn hidden_deletes(&self, page: &[ClipSummary]) -> u64 {
        page.iter()
            .filter(|clip| {
                self.entries
                    .iter()
                    .any(|p| p.change == PendingChange::Delete { id: clip.id })
            })
            .count() as u64
    }

    /// Canonical page with every pending change applied in issue order.
    pub(crate) fn project(&self, page: &[ClipSummary]) -> Vec<ClipSummary> {
        let mut items = page.to_vec();
        for pending in &self.entries {
            match pending.change {
                PendingChange::Pin { id, pinned } => {
                    set_pinned_in_place(&mut items, id, pinned);
                }
                PendingChange::Delete { id } => items.retain(|clip| clip.id != id),
                PendingChange::ClearUnpinned => items.retain(|clip| clip.is_pinned),
            }
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pt_core::ContentType;

    fn page() -> Vec<ClipSummary> {
        vec![
            ClipSummary::new(ClipId::new(3), ContentType::Text, "c", 30),
            ClipSummary::new(ClipId::new(2), ContentType::Text, "b", 20),
            ClipSummary::new(ClipId::new(1), ContentType::Text, "a", 10),
        ]
    }

    fn ids(items: &[ClipSummary]) -> Vec<i64> {
        items.iter().map(|c| c.id.get()).collect()
    }

    #[test]
    fn reverting_a_delete_restores_original_position() {
        let canonical = page();
        let mut pending = PendingMutations::default();

        let ticket = pending.push(PendingChange::Delete { id: ClipId::new(2) });
        assert_eq!(ids(&pending.project(&canonical)), vec![3, 1]);

        assert_eq!(pending.resolve(ticket), Some(PendingChange::Delete { id: ClipId::new(2) }));
        assert_eq!(ids(&pending.project(&canonical)), vec![3, 2, 1]);
        assert_eq!(pending.resolve(ticket), None);
    }

    #[test]
    fn changes_apply_in_issue_order() {
        let canonical = page();
        let mut pending = PendingMutations::default();
        pending.push(PendingChange::Pin { id: ClipId::new(1), pinned: true });
        pending.push(PendingChange::ClearUnpinned);

        let projected = pending.project(&canonical);
        assert_eq!(ids(&projected), vec![1]);
        assert!(projected[0].is_pinned);
        assert!(pending.touches(ClipId::new(1)));
        assert!(!pending.touches(ClipId::new(3)));
        assert!(pending.has_clear());
    }

    #[test]
    fn only_single_deletes_count_as_hidden() {
        let canonical = page();
        let mut pending = PendingMutations::default();
        pending.push(PendingChange::Delete { id: ClipId::new(3) });
        pending.push(PendingChange::ClearUnpinned);

        assert!(pending.project(&canonical).is_empty());
        assert_eq!(pending.hidden_deletes(&canonical), 1);
    }
}
