//! In-memory caching layer for hot-path repository reads.
//!
//! Uses `moka` for TTL-based concurrent caching with write-through
//! invalidation. Wraps repository traits as decorators.

pub mod cached_category_repository;
pub mod cached_company_repository;
mod read_through;

pub use cached_category_repository::CachedCategoryRepository;
pub use cached_company_repository::CachedCompanyRepository;
