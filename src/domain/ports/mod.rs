//! Port trait definitions (Hexagonal Architecture)
//!
//! Async repository interfaces implemented by the SQLite adapters and
//! decorated by the cache adapters. Services depend only on these traits.

pub mod bank_repository;
pub mod category_repository;
pub mod client_repository;
pub mod company_repository;
pub mod device_repository;
pub mod invoice_repository;
pub mod product_repository;
pub mod user_repository;

pub use bank_repository::BankRepository;
pub use category_repository::CategoryRepository;
pub use client_repository::ClientRepository;
pub use company_repository::CompanyRepository;
pub use device_repository::DeviceRepository;
pub use invoice_repository::InvoiceRepository;
pub use product_repository::ProductRepository;
pub use user_repository::UserRepository;
