/// Library Layer
///
/// A virtual file hierarchy of reusable content (functions, subflows, ...) built on
/// flat document ids:
/// - Path normalization and document keys
/// - The `library` design document and its row emitters
/// - An in-process cache with ancestor invalidation
/// - `LibraryIndex`: resolve and save

pub mod cache;
pub mod index;
pub mod path;
pub mod store;
pub mod types;

pub use cache::LibraryCache;
pub use store::LibraryIndex;
pub use types::{LibraryEntry, LibraryValue, ListingItem};
