//! High-level page and block operations over a key-value store.

use crate::core::index::PageIndex;
use crate::core::search;
use crate::core::template::find_template;
use crate::{
    Block, BlockType, BlockUpdate, BlocknotesError, DeleteResult, ImportResult, KeyValueStore,
    Page, PageUpdate, Persistence, Result, SearchResult, SqliteStore, StoreConfig,
    WorkspaceState, WorkspaceStateUpdate,
};
use chrono::Utc;
use std::path::Path;
use uuid::Uuid;

/// An open Blocknotes workspace.
///
/// `Workspace` is the primary interface for all document mutations. Every
/// operation loads the full page collection through its [`Persistence`]
/// adapter, applies the change in memory and writes the collection back, so
/// the store is the only state and two workspaces over one store see each
/// other's writes.
pub struct Workspace<S> {
    persistence: Persistence<S>,
}

impl Workspace<SqliteStore> {
    /// Creates a new SQLite-backed workspace at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BlocknotesError::Database`] for any SQLite failure.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(SqliteStore::create(path)?))
    }

    /// Opens an existing SQLite-backed workspace.
    ///
    /// # Errors
    ///
    /// Returns [`BlocknotesError::InvalidStore`] if the file is not a
    /// Blocknotes store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(SqliteStore::open(path)?))
    }
}

impl<S: KeyValueStore> Workspace<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, StoreConfig::default())
    }

    pub fn with_config(store: S, config: StoreConfig) -> Self {
        Self {
            persistence: Persistence::with_config(store, config),
        }
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    fn load_index(&self) -> Result<PageIndex> {
        Ok(PageIndex::from_pages(self.persistence.load_pages()?))
    }

    fn save_index(&self, index: PageIndex) -> Result<()> {
        self.persistence.save_pages(&index.into_pages())
    }

    /// Records a visit after the page collection has been written.
    ///
    /// The page change is already committed, so a failure here is logged
    /// and not returned.
    fn record_visit(&self, page_id: &str) {
        if let Err(e) = self.persistence.add_to_recent_pages(page_id) {
            log::warn!("Page {page_id} saved, but recent pages were not updated: {e}");
        }
    }

    /// Workspace state for internal bookkeeping; a corrupt record reads as the default.
    fn session_state(&self) -> Result<WorkspaceState> {
        match self.persistence.load_workspace_state() {
            Err(BlocknotesError::Corrupt { .. }) => Ok(WorkspaceState::default()),
            other => other,
        }
    }

    // ── Pages ─────────────────────────────────────────────────────

    /// Creates a page holding one empty text block.
    ///
    /// `title` defaults to `"Untitled <N+1>"` where N is the current page
    /// count. If `parent_id` resolves, the page is appended to the parent's
    /// children; if it does not, the page is created at the root.
    pub fn create_page(&self, title: Option<&str>, parent_id: Option<&str>) -> Result<Page> {
        self.insert_new_page(title, parent_id, vec![Block::empty_text()], None)
    }

    /// Like [`create_page`](Self::create_page), seeded with a template's blocks and emoji.
    ///
    /// Returns `Ok(None)` if `template_id` is not in the catalog.
    pub fn create_page_from_template(
        &self,
        template_id: &str,
        title: Option<&str>,
        parent_id: Option<&str>,
    ) -> Result<Option<Page>> {
        let Some(template) = find_template(template_id) else {
            return Ok(None);
        };
        let page = self.insert_new_page(
            title,
            parent_id,
            template.instantiate(),
            Some(template.emoji),
        )?;
        Ok(Some(page))
    }

    fn insert_new_page(
        &self,
        title: Option<&str>,
        parent_id: Option<&str>,
        content: Vec<Block>,
        emoji: Option<String>,
    ) -> Result<Page> {
        let mut index = self.load_index()?;
        let title = match title {
            Some(title) => title.to_string(),
            None => format!("Untitled {}", index.len() + 1),
        };

        let mut page = Page::with_content(title, None, content);
        page.emoji = emoji;

        if let Some(parent_id) = parent_id {
            match index.get_mut(parent_id) {
                Some(parent) => {
                    parent.add_child(&page.id);
                    parent.touch(page.created_at);
                    page.parent_id = Some(parent_id.to_string());
                }
                None => log::warn!(
                    "Parent {parent_id} not found, creating '{}' at the root",
                    page.title
                ),
            }
        }

        index.insert(page.clone());
        self.save_index(index)?;
        self.record_visit(&page.id);
        log::info!("Created page {} '{}'", page.id, page.title);
        Ok(page)
    }

    /// Merges `update` into the page and stamps `updated_at`.
    ///
    /// Returns `Ok(None)` if the page does not exist. Records a recent visit.
    pub fn update_page(&self, page_id: &str, update: PageUpdate) -> Result<Option<Page>> {
        let mut index = self.load_index()?;
        let Some(page) = index.get_mut(page_id) else {
            return Ok(None);
        };
        update.apply_to(page, Utc::now());
        let page = page.clone();

        self.save_index(index)?;
        self.record_visit(page_id);
        log::debug!("Updated page {page_id}");
        Ok(Some(page))
    }

    /// Deletes `page_id` and all of its descendants.
    ///
    /// The page is detached from its parent first. Descendants are found
    /// through `children` lists; IDs that no longer resolve are skipped. If
    /// the current page was removed, the first remaining page becomes
    /// current. Removed IDs are dropped from the recents list.
    ///
    /// Returns `Ok(None)` if the page does not exist.
    pub fn delete_page(&self, page_id: &str) -> Result<Option<DeleteResult>> {
        let mut index = self.load_index()?;
        let Some(parent_id) = index.get(page_id).map(|p| p.parent_id.clone()) else {
            return Ok(None);
        };

        if let Some(parent) = parent_id.as_deref().and_then(|id| index.get_mut(id)) {
            parent.remove_child(page_id);
            parent.touch(Utc::now());
        }

        let result = DeleteResult::from_removed(index.remove_subtree(page_id));
        let first_remaining = index.iter().next().map(|p| p.id.clone());
        self.save_index(index)?;

        if let Err(e) = self.forget_removed(&result, first_remaining) {
            log::warn!("Pages deleted, but the workspace state was not updated: {e}");
        }

        log::info!("Deleted page {page_id} ({} pages removed)", result.deleted_count);
        Ok(Some(result))
    }

    /// Moves the current page off removed pages and prunes them from recents.
    fn forget_removed(&self, result: &DeleteResult, first_remaining: Option<String>) -> Result<()> {
        let state = self.session_state()?;
        let mut update = WorkspaceStateUpdate::default();
        if state
            .current_page_id
            .as_deref()
            .is_some_and(|id| result.contains(id))
        {
            update.current_page_id = Some(first_remaining);
        }
        if state.recent_pages.iter().any(|id| result.contains(id)) {
            update.recent_pages = Some(
                state
                    .recent_pages
                    .into_iter()
                    .filter(|id| !result.contains(id))
                    .collect(),
            );
        }
        if update != WorkspaceStateUpdate::default() {
            self.persistence.save_workspace_state(update)?;
        }
        Ok(())
    }

    /// Re-parents `page_id` under `new_parent_id`, or to the root when `None`.
    ///
    /// The page is appended to the new parent's children. Both parents are
    /// stamped.
    ///
    /// # Errors
    ///
    /// Returns [`BlocknotesError::InvalidMove`] if the new parent is the page
    /// itself, one of its descendants, or does not exist.
    pub fn move_page(&self, page_id: &str, new_parent_id: Option<&str>) -> Result<Option<Page>> {
        let mut index = self.load_index()?;
        let Some(old_parent_id) = index.get(page_id).map(|p| p.parent_id.clone()) else {
            return Ok(None);
        };

        if let Some(target) = new_parent_id {
            if target == page_id {
                return Err(BlocknotesError::InvalidMove(
                    "A page cannot be its own parent".to_string(),
                ));
            }
            if !index.contains(target) {
                return Err(BlocknotesError::InvalidMove(format!(
                    "Parent page {target} does not exist"
                )));
            }
            if index.is_ancestor(page_id, target) {
                return Err(BlocknotesError::InvalidMove(
                    "Move would create a cycle".to_string(),
                ));
            }
        }

        let now = Utc::now();
        if let Some(old_parent) = old_parent_id.as_deref().and_then(|id| index.get_mut(id)) {
            old_parent.remove_child(page_id);
            old_parent.touch(now);
        }
        if let Some(new_parent) = new_parent_id.and_then(|id| index.get_mut(id)) {
            new_parent.add_child(page_id);
            new_parent.touch(now);
        }

        let page = match index.get_mut(page_id) {
            Some(page) => {
                page.parent_id = new_parent_id.map(str::to_string);
                page.touch(now);
                page.clone()
            }
            None => return Ok(None),
        };

        self.save_index(index)?;
        log::info!(
            "Moved page {page_id} under {}",
            new_parent_id.unwrap_or("the root")
        );
        Ok(Some(page))
    }

    /// Copies a page with fresh page and block IDs and `" (Copy)"` appended to the title.
    ///
    /// The copy has no children and sits beside the source under the same
    /// parent. It becomes the current page.
    pub fn duplicate_page(&self, page_id: &str) -> Result<Option<Page>> {
        let mut index = self.load_index()?;
        let Some(source) = index.get(page_id) else {
            return Ok(None);
        };

        let now = Utc::now();
        let mut copy = Page {
            id: Uuid::new_v4().to_string(),
            title: format!("{} (Copy)", source.title),
            content: source.content.iter().map(Block::fresh_copy).collect(),
            created_at: now,
            updated_at: now,
            children: Some(Vec::new()),
            ..source.clone()
        };

        if let Some(parent_id) = copy.parent_id.clone() {
            match index.get_mut(&parent_id) {
                Some(parent) => {
                    parent.add_child(&copy.id);
                    parent.touch(now);
                }
                None => copy.parent_id = None,
            }
        }

        index.insert(copy.clone());
        self.save_index(index)?;
        if let Err(e) = self.make_current(&copy.id) {
            log::warn!("Page {} saved, but it could not be made current: {e}", copy.id);
        }
        log::info!("Duplicated page {page_id} as {}", copy.id);
        Ok(Some(copy))
    }

    pub fn get_page(&self, page_id: &str) -> Result<Option<Page>> {
        Ok(self.load_index()?.remove(page_id))
    }

    /// All pages in collection order.
    pub fn list_pages(&self) -> Result<Vec<Page>> {
        self.persistence.load_pages()
    }

    /// Pages whose `parent_id` equals `parent_id`, in collection order. `None` selects roots.
    pub fn get_pages_by_parent(&self, parent_id: Option<&str>) -> Result<Vec<Page>> {
        let index = self.load_index()?;
        Ok(index.children_of(parent_id).cloned().collect())
    }

    /// The pages listed in `page_id`'s `children`, in list order. IDs that do not resolve are skipped.
    pub fn get_children(&self, page_id: &str) -> Result<Vec<Page>> {
        let index = self.load_index()?;
        let Some(page) = index.get(page_id) else {
            return Ok(Vec::new());
        };
        Ok(page
            .child_ids()
            .iter()
            .filter_map(|id| index.get(id))
            .cloned()
            .collect())
    }

    /// Root pages ordered by creation time, oldest first.
    pub fn get_page_hierarchy(&self) -> Result<Vec<Page>> {
        let mut roots = self.get_pages_by_parent(None)?;
        roots.sort_by_key(|p| p.created_at);
        Ok(roots)
    }

    // ── Blocks ────────────────────────────────────────────────────

    /// Applies `edit` to a copy of the page's blocks and persists the result
    /// through [`update_page`](Self::update_page) when `edit` returns `Some`.
    fn edit_blocks<T>(
        &self,
        page_id: &str,
        edit: impl FnOnce(&mut Vec<Block>) -> Option<T>,
    ) -> Result<Option<T>> {
        let Some(page) = self.get_page(page_id)? else {
            return Ok(None);
        };
        let mut content = page.content;
        let Some(output) = edit(&mut content) else {
            return Ok(None);
        };
        self.update_page(page_id, PageUpdate::content(content))?;
        Ok(Some(output))
    }

    /// Adds a new block of `block_type` at `position`, or at the end.
    ///
    /// Returns the new block, or `Ok(None)` if the page does not exist.
    pub fn add_block(
        &self,
        page_id: &str,
        block_type: BlockType,
        position: Option<usize>,
    ) -> Result<Option<Block>> {
        let block = Block::new(block_type, "");
        let inserted = self.insert_block(page_id, block.clone(), position)?;
        Ok(inserted.then_some(block))
    }

    /// Inserts `block` at `position` when it lies within `0..=len`, otherwise appends it.
    pub fn insert_block(&self, page_id: &str, block: Block, position: Option<usize>) -> Result<bool> {
        let done = self.edit_blocks(page_id, |content| {
            match position {
                Some(at) if at <= content.len() => content.insert(at, block),
                _ => content.push(block),
            }
            Some(())
        })?;
        Ok(done.is_some())
    }

    /// Adds a new block of `block_type` right after `after_block_id`.
    ///
    /// Returns `Ok(None)` if either the page or the anchor block does not exist.
    pub fn insert_block_after(
        &self,
        page_id: &str,
        after_block_id: &str,
        block_type: BlockType,
    ) -> Result<Option<Block>> {
        let block = Block::new(block_type, "");
        self.edit_blocks(page_id, |content| {
            let at = content.iter().position(|b| b.id == after_block_id)? + 1;
            content.insert(at, block.clone());
            Some(block)
        })
    }

    /// Merges `update` into one block and stamps it.
    pub fn update_block(&self, page_id: &str, block_id: &str, update: BlockUpdate) -> Result<bool> {
        let done = self.edit_blocks(page_id, |content| {
            let block = content.iter_mut().find(|b| b.id == block_id)?;
            update.apply_to(block, Utc::now());
            Some(())
        })?;
        Ok(done.is_some())
    }

    /// Removes one block. A page left without blocks gets a fresh empty text block.
    pub fn remove_block(&self, page_id: &str, block_id: &str) -> Result<bool> {
        let done = self.edit_blocks(page_id, |content| {
            let at = content.iter().position(|b| b.id == block_id)?;
            content.remove(at);
            if content.is_empty() {
                content.push(Block::empty_text());
            }
            Some(())
        })?;
        Ok(done.is_some())
    }

    /// Moves a block to `new_position`, counted after the block is taken out.
    /// Positions past the end move it to the end.
    pub fn move_block(&self, page_id: &str, block_id: &str, new_position: usize) -> Result<bool> {
        let done = self.edit_blocks(page_id, |content| {
            let at = content.iter().position(|b| b.id == block_id)?;
            let block = content.remove(at);
            content.insert(new_position.min(content.len()), block);
            Some(())
        })?;
        Ok(done.is_some())
    }

    /// Changes a block's type, keeping its text and resetting its properties.
    pub fn convert_block(&self, page_id: &str, block_id: &str, block_type: BlockType) -> Result<bool> {
        let update = BlockUpdate {
            properties: Some(block_type.default_properties()),
            block_type: Some(block_type),
            content: None,
        };
        self.update_block(page_id, block_id, update)
    }

    /// Flips a block's `checked` flag and returns the new state.
    pub fn toggle_checkbox(&self, page_id: &str, block_id: &str) -> Result<Option<bool>> {
        self.edit_blocks(page_id, |content| {
            let block = content.iter_mut().find(|b| b.id == block_id)?;
            let checked = !block.is_checked();
            block.properties.get_or_insert_with(Default::default).checked = Some(checked);
            block.updated_at = Utc::now();
            Some(checked)
        })
    }

    // ── Session ───────────────────────────────────────────────────

    /// Makes `page_id` the current page and records the visit.
    ///
    /// Returns `false` without changing anything if the page does not exist.
    pub fn set_current_page(&self, page_id: &str) -> Result<bool> {
        if self.get_page(page_id)?.is_none() {
            return Ok(false);
        }
        self.make_current(page_id)?;
        Ok(true)
    }

    fn make_current(&self, page_id: &str) -> Result<()> {
        self.persistence
            .save_workspace_state(WorkspaceStateUpdate::current_page(Some(page_id)))?;
        self.persistence.add_to_recent_pages(page_id)
    }

    pub fn current_page(&self) -> Result<Option<Page>> {
        match self.session_state()?.current_page_id {
            Some(id) => self.get_page(&id),
            None => Ok(None),
        }
    }

    /// Recently visited pages, most recent first, skipping IDs that no longer resolve.
    ///
    /// `limit` defaults to the configured display count.
    pub fn recent_pages(&self, limit: Option<usize>) -> Result<Vec<Page>> {
        let limit = limit.unwrap_or(self.persistence.config().recent_pages_display);
        let index = self.load_index()?;
        Ok(self
            .session_state()?
            .recent_pages
            .iter()
            .filter_map(|id| index.get(id))
            .take(limit)
            .cloned()
            .collect())
    }

    pub fn set_sidebar_collapsed(&self, collapsed: bool) -> Result<()> {
        self.persistence
            .save_workspace_state(WorkspaceStateUpdate::sidebar_collapsed(collapsed))?;
        Ok(())
    }

    /// Flips the sidebar state and returns the new value.
    pub fn toggle_sidebar(&self) -> Result<bool> {
        let collapsed = !self.session_state()?.sidebar_collapsed;
        self.set_sidebar_collapsed(collapsed)?;
        Ok(collapsed)
    }

    pub fn set_search_query(&self, query: &str) -> Result<()> {
        self.persistence
            .save_workspace_state(WorkspaceStateUpdate::search_query(query))?;
        Ok(())
    }

    pub fn workspace_state(&self) -> Result<WorkspaceState> {
        self.persistence.load_workspace_state()
    }

    // ── Search and backup ─────────────────────────────────────────

    pub fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        search::search_pages(&self.persistence, query)
    }

    pub fn export_data(&self) -> Result<String> {
        self.persistence.export_data()
    }

    pub fn import_data(&self, text: &str) -> Result<ImportResult> {
        self.persistence.import_data(text)
    }

    pub fn clear_all_data(&self) -> Result<()> {
        self.persistence.clear_all_data()
    }
}
