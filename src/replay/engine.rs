//! The replay engine: applies decoded records to page images.
//!
//! Each record is one indivisible unit; replay may stop between records
//! but never inside one. The engine enforces, in order:
//!
//! 1. Preconditions that hold whether or not the record was already
//!    applied (target pages exist, the reuse horizon guard, new-root
//!    child identities). Violations are fatal.
//! 2. The idempotency rule, per page: a page whose recorded last-applied
//!    position is not older than the record's position is skipped with
//!    no mutation and no error. This is what makes replay resumable
//!    from an arbitrary checkpoint.
//! 3. The mutation itself, followed by stamping the page with the
//!    record's position.
//!
//! State preconditions (half-dead, unlinked) are checked only on pages
//! actually being mutated: a page the record already reached is past the
//! transition and its new state is not a violation.

use crate::record::{
    BlockNumber, CreateIndexRecord, DeleteRecord, HalfDeadRecord, InsertRecord, LogPosition,
    LogRecord, NewRootRecord, PageAddress, PageSplitRecord, PageUpdateRecord, RelationLocator,
    ReuseRecord, SplitRecord, TransactionId, UnlinkRecord, VacuumRecord, NO_BLOCK,
};

use super::errors::{ReplayError, ReplayResult};
use super::page::{Page, PageState, PageStore, META_BLOCK};

/// What the engine did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// At least one page was mutated
    Applied,
    /// Every touched page had already seen this record
    Skipped,
}

/// External state replay consults: the oldest transaction id still
/// active while recovery runs. `None` means no transaction is active.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayContext {
    /// Oldest active transaction id, if any transaction is active
    pub oldest_active_xid: Option<TransactionId>,
}

impl ReplayContext {
    /// A context with no active transactions.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context with an oldest active transaction id.
    pub fn with_oldest_active(xid: TransactionId) -> Self {
        Self {
            oldest_active_xid: Some(xid),
        }
    }
}

/// Applies decoded records to a page store, single-threaded and in
/// strictly ascending position order.
pub struct ReplayEngine<S: PageStore> {
    store: S,
    context: ReplayContext,
}

impl<S: PageStore> ReplayEngine<S> {
    /// An engine over a store, with replay context.
    pub fn new(store: S, context: ReplayContext) -> Self {
        Self { store, context }
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the engine, returning the store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Applies one record at its log position.
    pub fn apply(&mut self, position: LogPosition, record: &LogRecord) -> ReplayResult<ApplyOutcome> {
        let mutated = match record {
            LogRecord::InsertLeaf(r) | LogRecord::InsertUpper(r) => {
                self.apply_insert(position, r, false)?
            }
            LogRecord::InsertMeta(r) => self.apply_insert(position, r, true)?,
            LogRecord::SplitLeft(r)
            | LogRecord::SplitRight(r)
            | LogRecord::SplitLeftRoot(r)
            | LogRecord::SplitRightRoot(r) => self.apply_split(position, r)?,
            LogRecord::VacuumPage(r) => self.apply_vacuum(position, r)?,
            LogRecord::DeleteEntries(r) => self.apply_delete(position, r)?,
            LogRecord::MarkPageHalfDead(r) => self.apply_half_dead(position, r)?,
            LogRecord::UnlinkPage(r) => self.apply_unlink(position, r, false)?,
            LogRecord::UnlinkPageMeta(r) => self.apply_unlink(position, r, true)?,
            LogRecord::NewRoot(r) => self.apply_new_root(position, r)?,
            LogRecord::ReusePage(r) => self.apply_reuse(position, r)?,
            LogRecord::PageUpdate(r) => self.apply_page_update(position, r)?,
            LogRecord::PageSplit(r) => self.apply_page_split(position, r)?,
            LogRecord::CreateIndex(r) => self.apply_create_index(position, r)?,
        };
        Ok(if mutated > 0 {
            ApplyOutcome::Applied
        } else {
            ApplyOutcome::Skipped
        })
    }

    /// Fetches a page a non-creating record addresses; absence is
    /// corruption, not a skippable condition.
    fn existing(
        &mut self,
        relation: RelationLocator,
        block: BlockNumber,
        position: LogPosition,
    ) -> ReplayResult<&mut Page> {
        let addr = PageAddress::new(relation, block);
        self.store
            .get_mut(&addr)
            .ok_or_else(|| ReplayError::missing_page(position, addr))
    }

    /// Brings a page into existence for a creating record. A `Reusable`
    /// page is reallocated to a fresh image; an `Unlinked` page has not
    /// passed the reuse guard and taking it over is a violation; a live
    /// page with this record already applied is the resumption case.
    fn create_page(
        &mut self,
        relation: RelationLocator,
        block: BlockNumber,
        level: u32,
        position: LogPosition,
        init: impl FnOnce(&mut Page),
    ) -> ReplayResult<u32> {
        let addr = PageAddress::new(relation, block);
        match self.store.get_mut(&addr) {
            None => {
                let mut page = Page::new(level);
                init(&mut page);
                page.stamp(position);
                self.store.put(addr, page);
                Ok(1)
            }
            Some(page) if page.is_applied(position) => Ok(0),
            Some(page) => match page.state {
                PageState::Reusable => {
                    *page = Page::new(level);
                    init(&mut *page);
                    page.stamp(position);
                    Ok(1)
                }
                PageState::Unlinked => Err(ReplayError::invariant(
                    position,
                    format!("block {} is unlinked and not yet reusable", block),
                )),
                PageState::Normal | PageState::HalfDead => Err(ReplayError::invariant(
                    position,
                    format!("block {} already holds a live page", block),
                )),
            },
        }
    }

    fn apply_insert(
        &mut self,
        position: LogPosition,
        r: &InsertRecord,
        meta: bool,
    ) -> ReplayResult<u32> {
        let mut mutated = 0;

        let page = self.existing(r.relation, r.target.block, position)?;
        if !page.is_applied(position) {
            page.insert_item(r.target.offset);
            page.stamp(position);
            mutated += 1;
        }

        if meta {
            let target_block = r.target.block;
            let meta_page = self.existing(r.relation, META_BLOCK, position)?;
            if !meta_page.is_applied(position) {
                meta_page.root_hint = Some(target_block);
                meta_page.stamp(position);
                mutated += 1;
            }
        }

        Ok(mutated)
    }

    fn apply_split(&mut self, position: LogPosition, r: &SplitRecord) -> ReplayResult<u32> {
        let mut mutated = 0;

        let left = self.existing(r.relation, r.left_sibling, position)?;
        if !left.is_applied(position) {
            if left.state == PageState::HalfDead {
                return Err(ReplayError::invariant(
                    position,
                    format!("split of half-dead page {}", r.left_sibling),
                ));
            }
            for moved in &r.moved {
                left.remove_item(moved.offset);
            }
            left.right_link = r.right_sibling;
            left.stamp(position);
            mutated += 1;
        }

        mutated += self.create_page(r.relation, r.right_sibling, r.level, position, |page| {
            page.left_link = r.left_sibling;
            page.right_link = r.next_right;
            for moved in &r.moved {
                page.insert_item(moved.offset);
            }
        })?;

        // The old right neighbor's back link moves to the new page. It is
        // part of this record's indivisible unit, so it must exist.
        if r.next_right != NO_BLOCK {
            let neighbor = self.existing(r.relation, r.next_right, position)?;
            if !neighbor.is_applied(position) {
                neighbor.left_link = r.right_sibling;
                neighbor.stamp(position);
                mutated += 1;
            }
        }

        Ok(mutated)
    }

    fn apply_vacuum(&mut self, position: LogPosition, r: &VacuumRecord) -> ReplayResult<u32> {
        let page = self.existing(r.relation, r.block, position)?;
        if page.is_applied(position) {
            return Ok(0);
        }
        for offset in &r.deleted {
            page.remove_item(*offset);
        }
        page.stamp(position);
        Ok(1)
    }

    fn apply_delete(&mut self, position: LogPosition, r: &DeleteRecord) -> ReplayResult<u32> {
        let page = self.existing(r.relation, r.block, position)?;
        if page.is_applied(position) {
            return Ok(0);
        }
        for offset in &r.deleted {
            page.remove_item(*offset);
        }
        page.stamp(position);
        Ok(1)
    }

    fn apply_half_dead(&mut self, position: LogPosition, r: &HalfDeadRecord) -> ReplayResult<u32> {
        let mut mutated = 0;

        let parent = self.existing(r.relation, r.target.block, position)?;
        if !parent.is_applied(position) {
            parent.remove_item(r.target.offset);
            parent.stamp(position);
            mutated += 1;
        }

        let leaf = self.existing(r.relation, r.leaf, position)?;
        if !leaf.is_applied(position) {
            if leaf.state != PageState::Normal {
                return Err(ReplayError::invariant(
                    position,
                    format!("page {} cannot go half-dead from its current state", r.leaf),
                ));
            }
            leaf.state = PageState::HalfDead;
            leaf.top_parent = Some(r.top_parent);
            leaf.left_link = r.left;
            leaf.right_link = r.right;
            leaf.clear_items();
            leaf.stamp(position);
            mutated += 1;
        }

        Ok(mutated)
    }

    fn apply_unlink(
        &mut self,
        position: LogPosition,
        r: &UnlinkRecord,
        with_meta: bool,
    ) -> ReplayResult<u32> {
        let mut mutated = 0;

        // Check the dead page's state before touching the siblings so a
        // violation aborts with nothing half-mutated.
        {
            let dead = self.existing(r.relation, r.dead, position)?;
            if !dead.is_applied(position) && dead.state != PageState::HalfDead {
                return Err(ReplayError::invariant(
                    position,
                    format!("unlink of page {} which is not half-dead", r.dead),
                ));
            }
        }

        if r.left_sibling != NO_BLOCK {
            let left = self.existing(r.relation, r.left_sibling, position)?;
            if !left.is_applied(position) {
                left.right_link = r.right_sibling;
                left.stamp(position);
                mutated += 1;
            }
        }

        if r.right_sibling != NO_BLOCK {
            let right = self.existing(r.relation, r.right_sibling, position)?;
            if !right.is_applied(position) {
                right.left_link = r.left_sibling;
                right.stamp(position);
                mutated += 1;
            }
        }

        let dead = self.existing(r.relation, r.dead, position)?;
        if !dead.is_applied(position) {
            dead.state = PageState::Unlinked;
            dead.removal_horizon = Some(r.removal_horizon);
            dead.left_link = NO_BLOCK;
            dead.right_link = NO_BLOCK;
            dead.top_parent = None;
            dead.clear_items();
            dead.stamp(position);
            mutated += 1;
        }

        // When an internal page of a half-dead chain is unlinked, the
        // leaf's pending linkage is rewritten from the record.
        if r.leaf != r.dead {
            let leaf = self.existing(r.relation, r.leaf, position)?;
            if !leaf.is_applied(position) {
                leaf.left_link = r.leaf_left;
                leaf.right_link = r.leaf_right;
                leaf.top_parent = Some(r.top_parent);
                leaf.stamp(position);
                mutated += 1;
            }
        }

        if with_meta {
            let meta_page = self.existing(r.relation, META_BLOCK, position)?;
            if !meta_page.is_applied(position) {
                meta_page.root_hint = Some(r.top_parent);
                meta_page.stamp(position);
                mutated += 1;
            }
        }

        Ok(mutated)
    }

    fn apply_new_root(&mut self, position: LogPosition, r: &NewRootRecord) -> ReplayResult<u32> {
        // The record is authoritative about the expected tree shape:
        // both children must exist and be siblings of one another.
        {
            let left_addr = PageAddress::new(r.relation, r.left_child);
            let left = self
                .store
                .get(&left_addr)
                .ok_or_else(|| ReplayError::missing_page(position, left_addr))?;
            if left.right_link != r.right_child {
                return Err(ReplayError::invariant(
                    position,
                    format!(
                        "new root expects children {} and {}, but {}'s right link is {}",
                        r.left_child, r.right_child, r.left_child, left.right_link
                    ),
                ));
            }
            let right_addr = PageAddress::new(r.relation, r.right_child);
            if self.store.get(&right_addr).is_none() {
                return Err(ReplayError::missing_page(position, right_addr));
            }
        }

        let mut mutated = self.create_page(r.relation, r.root, r.level, position, |page| {
            // Item slots 1 and 2 hold the two downlinks.
            page.insert_item(1);
            page.insert_item(2);
        })?;

        let root = r.root;
        let meta_page = self.existing(r.relation, META_BLOCK, position)?;
        if !meta_page.is_applied(position) {
            meta_page.root_hint = Some(root);
            meta_page.stamp(position);
            mutated += 1;
        }

        Ok(mutated)
    }

    fn apply_reuse(&mut self, position: LogPosition, r: &ReuseRecord) -> ReplayResult<u32> {
        // The horizon guard holds whether or not the record was already
        // applied: an active transaction older than the recorded horizon
        // could still observe the page's old contents.
        if let Some(oldest) = self.context.oldest_active_xid {
            if oldest < r.removal_horizon {
                return Err(ReplayError::invariant(
                    position,
                    format!(
                        "reuse of block {} with horizon {} while transaction {} is still active",
                        r.block, r.removal_horizon, oldest
                    ),
                ));
            }
        }

        let page = self.existing(r.relation, r.block, position)?;
        if page.is_applied(position) {
            return Ok(0);
        }
        if page.state != PageState::Unlinked {
            return Err(ReplayError::invariant(
                position,
                format!("reuse of block {} which is not unlinked", r.block),
            ));
        }
        page.state = PageState::Reusable;
        page.removal_horizon = Some(r.removal_horizon);
        page.stamp(position);
        Ok(1)
    }

    fn apply_page_update(
        &mut self,
        position: LogPosition,
        r: &PageUpdateRecord,
    ) -> ReplayResult<u32> {
        let page = self.existing(r.relation, r.block, position)?;
        if page.is_applied(position) {
            return Ok(0);
        }
        for offset in &r.deleted {
            page.remove_item(*offset);
        }
        for offset in &r.inserted {
            page.insert_item(*offset);
        }
        page.stamp(position);
        Ok(1)
    }

    fn apply_page_split(
        &mut self,
        position: LogPosition,
        r: &PageSplitRecord,
    ) -> ReplayResult<u32> {
        if r.pages.first() != Some(&r.origin) {
            return Err(ReplayError::invariant(
                position,
                format!(
                    "page split of block {} does not list the origin first",
                    r.origin
                ),
            ));
        }

        let mut mutated = 0;
        let level;
        {
            let origin = self.existing(r.relation, r.origin, position)?;
            level = origin.level;
            if !origin.is_applied(position) {
                if origin.state == PageState::HalfDead {
                    return Err(ReplayError::invariant(
                        position,
                        format!("split of half-dead page {}", r.origin),
                    ));
                }
                origin.clear_items();
                origin.stamp(position);
                mutated += 1;
            }
        }

        for block in &r.pages[1..] {
            mutated += self.create_page(r.relation, *block, level, position, |_| {})?;
        }

        Ok(mutated)
    }

    fn apply_create_index(
        &mut self,
        position: LogPosition,
        r: &CreateIndexRecord,
    ) -> ReplayResult<u32> {
        self.create_page(r.relation, META_BLOCK, 0, position, |_| {})
    }
}
