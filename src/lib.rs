// Journal Federation - Core Library
// Exposes all modules for use in the CLI and tests

pub mod error;
pub mod config;
pub mod entities;   // Journal, Category, Area + relation rows
pub mod parser;     // DOAJ CSV / Scimago JSON
pub mod db;         // Relational store schema and queries
pub mod handlers;   // One handler per backing store
pub mod engine;     // Single-store queries with fan-out
pub mod mashup;     // Cross-store queries (ISSN joins)
pub mod upload;     // Dataset file -> store

// Re-export commonly used types
pub use error::{Error, Result, StoreKind};
pub use config::FederationConfig;
pub use entities::{
    Area, AreaRelation, Category, CategoryRelation, Entity,
    IdentifiableEntity, Identifiers, Journal, Quartile,
};
pub use parser::{
    DatasetParser, DoajParser, ScimagoParser, ScimagoRecord, SourceType,
    detect_source,
};
pub use handlers::{
    CategoryQueryHandler, Handler, JournalQueryHandler,
    SparqlJournalHandler, SqliteCategoryHandler,
};
pub use engine::BasicQueryEngine;
pub use mashup::FullQueryEngine;
pub use upload::{CategoryUploadHandler, JournalUploadHandler, UploadReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
