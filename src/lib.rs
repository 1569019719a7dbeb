// Student Registry - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod validators;
pub mod record;
pub mod store;
pub mod resolver;
pub mod session;
pub mod catalog;
pub mod workflow;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use validators::{
    validate_full_name, validate_identifier, validate_email, validate_postal_code,
    validate_birth_date, validate_birth_date_at, validate_house_number,
    BirthDateError,
};
pub use record::{Record, Address, Schema};
pub use store::{RecordStore, StoreContents, StoreError};
pub use resolver::{
    AddressResolver, PostalDirectory, PostalReply, LookupError,
    HttpPostalDirectory, StaticPostalDirectory,
};
pub use session::Session;
pub use catalog::{Catalog, Area, Course, CatalogError};
pub use workflow::{
    Registrar, Submission, Changes, RevalidationPolicy,
    FieldError, WorkflowError,
};
pub use config::AppConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
