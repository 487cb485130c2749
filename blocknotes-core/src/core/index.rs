//! In-memory page collection keyed by ID.
//!
//! Every workspace operation loads the stored collection into a [`PageIndex`],
//! mutates it, and writes it back with [`PageIndex::into_pages`]. The index
//! keeps the original collection order so a round trip does not reshuffle
//! pages.

use crate::Page;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct PageIndex {
    order: Vec<String>,
    pages: HashMap<String, Page>,
}

impl PageIndex {
    /// Builds an index from a stored collection. Later duplicates of an ID are dropped.
    pub fn from_pages(pages: Vec<Page>) -> Self {
        let mut index = Self::default();
        for page in pages {
            if index.contains(&page.id) {
                log::warn!("Dropping duplicate page id {}", page.id);
                continue;
            }
            index.insert(page);
        }
        index
    }

    /// Pages in collection order.
    pub fn into_pages(mut self) -> Vec<Page> {
        self.order
            .iter()
            .filter_map(|id| self.pages.remove(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn contains(&self, page_id: &str) -> bool {
        self.pages.contains_key(page_id)
    }

    pub fn get(&self, page_id: &str) -> Option<&Page> {
        self.pages.get(page_id)
    }

    pub fn get_mut(&mut self, page_id: &str) -> Option<&mut Page> {
        self.pages.get_mut(page_id)
    }

    /// Adds `page` at the end of the collection, or replaces it in place if the ID exists.
    pub fn insert(&mut self, page: Page) {
        if !self.pages.contains_key(&page.id) {
            self.order.push(page.id.clone());
        }
        self.pages.insert(page.id.clone(), page);
    }

    pub fn remove(&mut self, page_id: &str) -> Option<Page> {
        let page = self.pages.remove(page_id)?;
        self.order.retain(|id| id != page_id);
        Some(page)
    }

    /// Pages in collection order.
    pub fn iter(&self) -> impl Iterator<Item = &Page> {
        self.order.iter().filter_map(|id| self.pages.get(id))
    }

    /// Pages whose `parent_id` is `parent_id`, in collection order.
    /// `None` selects root pages.
    pub fn children_of<'a>(&'a self, parent_id: Option<&'a str>) -> impl Iterator<Item = &'a Page> {
        self.iter()
            .filter(move |page| page.parent_id.as_deref() == parent_id)
    }

    /// Whether `ancestor_id` appears on the parent chain of `page_id`.
    ///
    /// Walks `parent_id` links upward; a chain that loops back on itself or
    /// leaves the collection ends the walk.
    pub fn is_ancestor(&self, ancestor_id: &str, page_id: &str) -> bool {
        let mut seen = HashSet::new();
        let mut current = self.get(page_id).and_then(|p| p.parent_id.as_deref());
        while let Some(id) = current {
            if id == ancestor_id {
                return true;
            }
            if !seen.insert(id) {
                log::warn!("Parent chain of {page_id} loops at {id}");
                return false;
            }
            current = self.get(id).and_then(|p| p.parent_id.as_deref());
        }
        false
    }

    /// Removes `page_id` and every page reachable through `children` lists.
    ///
    /// Removal is depth-first from the target; the returned IDs are in
    /// removal order, target first. Child IDs that do not resolve are skipped.
    /// Afterwards no surviving page lists a removed ID as a child, and a
    /// surviving page whose parent was removed becomes a root.
    pub fn remove_subtree(&mut self, page_id: &str) -> Vec<String> {
        let mut removed = Vec::new();
        let mut stack = vec![page_id.to_string()];
        while let Some(id) = stack.pop() {
            let Some(page) = self.remove(&id) else {
                if id != page_id {
                    log::warn!("Skipping dangling child id {id}");
                }
                continue;
            };
            // Reverse so the first child is removed next.
            stack.extend(page.child_ids().iter().rev().cloned());
            removed.push(id);
        }

        let removed_set: HashSet<&str> = removed.iter().map(String::as_str).collect();
        for page in self.pages.values_mut() {
            if let Some(children) = page.children.as_mut() {
                children.retain(|id| !removed_set.contains(id.as_str()));
            }
            if page
                .parent_id
                .as_deref()
                .is_some_and(|parent| removed_set.contains(parent))
            {
                log::warn!("Page {} lost its parent, promoting to root", page.id);
                page.parent_id = None;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds parent -> child links and returns the IDs in creation order.
    fn chain(index: &mut PageIndex, titles: &[&str]) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for title in titles {
            let parent = ids.last().cloned();
            let page = Page::new(*title, parent.clone());
            if let Some(parent_id) = parent {
                index.get_mut(&parent_id).unwrap().add_child(&page.id);
            }
            ids.push(page.id.clone());
            index.insert(page);
        }
        ids
    }

    #[test]
    fn test_round_trip_keeps_order() {
        let pages: Vec<Page> = (0..5).map(|i| Page::new(format!("P{i}"), None)).collect();
        let index = PageIndex::from_pages(pages.clone());
        assert_eq!(index.into_pages(), pages);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let first = Page::new("First", None);
        let mut second = Page::new("Second", None);
        second.id = first.id.clone();
        let index = PageIndex::from_pages(vec![first.clone(), second]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&first.id).unwrap().title, "First");
    }

    #[test]
    fn test_remove_subtree_removes_chain_depth_first() {
        let mut index = PageIndex::default();
        let ids = chain(&mut index, &["R", "C", "G"]);
        let other = Page::new("Other", None);
        index.insert(other.clone());

        let removed = index.remove_subtree(&ids[0]);
        assert_eq!(removed, ids);
        assert_eq!(index.len(), 1);
        assert!(index.contains(&other.id));
    }

    #[test]
    fn test_remove_subtree_scrubs_references() {
        let mut index = PageIndex::default();
        let ids = chain(&mut index, &["R", "C", "G"]);

        // Delete the middle page directly, leaving R pointing at it.
        let removed = index.remove_subtree(&ids[1]);
        assert_eq!(removed.len(), 2);
        assert!(index.get(&ids[0]).unwrap().child_ids().is_empty());
    }

    #[test]
    fn test_remove_subtree_tolerates_dangling_and_cyclic_children() {
        let mut index = PageIndex::default();
        let ids = chain(&mut index, &["A", "B"]);
        index.get_mut(&ids[1]).unwrap().add_child("ghost");
        index.get_mut(&ids[1]).unwrap().add_child(&ids[0]);

        let removed = index.remove_subtree(&ids[0]);
        assert_eq!(removed, ids);
        assert!(index.is_empty());
    }

    #[test]
    fn test_orphaned_by_parent_removal_become_roots() {
        let mut index = PageIndex::default();
        let parent = Page::new("Parent", None);
        // Claims the parent, but the parent does not list it.
        let stray = Page::new("Stray", Some(parent.id.clone()));
        index.insert(parent.clone());
        index.insert(stray.clone());

        index.remove_subtree(&parent.id);
        assert!(index.get(&stray.id).unwrap().is_root());
    }

    #[test]
    fn test_is_ancestor() {
        let mut index = PageIndex::default();
        let ids = chain(&mut index, &["R", "C", "G"]);
        assert!(index.is_ancestor(&ids[0], &ids[2]));
        assert!(index.is_ancestor(&ids[1], &ids[2]));
        assert!(!index.is_ancestor(&ids[2], &ids[0]));
        assert!(!index.is_ancestor(&ids[0], &ids[0]));
    }

    #[test]
    fn test_is_ancestor_survives_parent_loop() {
        let mut a = Page::new("A", None);
        let mut b = Page::new("B", None);
        a.parent_id = Some(b.id.clone());
        b.parent_id = Some(a.id.clone());
        let index = PageIndex::from_pages(vec![a.clone(), b]);
        assert!(!index.is_ancestor("elsewhere", &a.id));
    }

    #[test]
    fn test_children_of_filters_by_parent() {
        let mut index = PageIndex::default();
        let ids = chain(&mut index, &["R", "C"]);
        let roots: Vec<&str> = index.children_of(None).map(|p| p.id.as_str()).collect();
        assert_eq!(roots, vec![ids[0].as_str()]);
        let kids: Vec<&str> = index
            .children_of(Some(ids[0].as_str()))
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(kids, vec![ids[1].as_str()]);
    }
}
