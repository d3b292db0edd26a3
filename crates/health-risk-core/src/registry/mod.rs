pub mod identity;
pub mod table;

pub use identity::{
    normalize_identifier, IdentifierRecord, IdentityMap, IdentityResolver, ValidationSummary,
    ERROR_STATUS, NOT_FOUND_NAME, NOT_VERIFIED_STATUS,
};
pub use table::{builtin_entries, EntityRegistry, RegistryEntry, StaticRegistry};
