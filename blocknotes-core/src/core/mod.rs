//! Internal domain modules for the Blocknotes core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod block;
pub mod config;
pub mod delete;
pub mod error;
pub mod export;
pub mod index;
pub mod kv;
pub mod page;
pub mod persistence;
pub mod search;
pub mod state;
pub mod storage;
pub mod template;
pub mod workspace;

#[doc(inline)]
pub use block::{Block, BlockProperties, BlockType, BlockUpdate, RenderKind};
#[doc(inline)]
pub use config::StoreConfig;
#[doc(inline)]
pub use delete::DeleteResult;
#[doc(inline)]
pub use error::{BlocknotesError, Result};
#[doc(inline)]
pub use export::{ExportDocument, ImportResult, ImportSummary, EXPORT_FORMAT_VERSION};
#[doc(inline)]
pub use index::PageIndex;
#[doc(inline)]
pub use kv::{KeyValueStore, MemoryStore};
#[doc(inline)]
pub use page::{Page, PageUpdate};
#[doc(inline)]
pub use persistence::Persistence;
#[doc(inline)]
pub use search::{search_pages, ContentMatch, MatchLocation, PageMatches, SearchResult};
#[doc(inline)]
pub use state::{WorkspaceState, WorkspaceStateUpdate};
#[doc(inline)]
pub use storage::SqliteStore;
#[doc(inline)]
pub use template::{default_templates, find_template, Template, TemplateBlock};
#[doc(inline)]
pub use workspace::Workspace;
