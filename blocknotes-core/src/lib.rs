//! Core library for Blocknotes, a local-first, block-based note-taking application.
//!
//! The primary entry point is [`Workspace`], which wraps a [`KeyValueStore`]
//! holding the page collection and the workspace state. All page and block
//! mutations go through `Workspace` methods.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    block::{Block, BlockProperties, BlockType, BlockUpdate, RenderKind},
    config::{StoreConfig, DEFAULT_RECENT_PAGES_LIMIT, DEFAULT_SNIPPET_CONTEXT},
    delete::DeleteResult,
    error::{BlocknotesError, Result},
    export::{ExportDocument, ImportResult, ImportSummary, EXPORT_FORMAT_VERSION},
    index::PageIndex,
    kv::{KeyValueStore, MemoryStore},
    page::{Page, PageUpdate},
    persistence::Persistence,
    search::{search_pages, ContentMatch, MatchLocation, PageMatches, SearchResult, ELLIPSIS},
    state::{WorkspaceState, WorkspaceStateUpdate},
    storage::SqliteStore,
    template::{default_templates, find_template, Template, TemplateBlock},
    workspace::Workspace,
};
