//! Application services: validation and orchestration over repository ports.

pub mod auth_service;
pub mod bank_service;
pub mod catalog_service;
pub mod client_service;
pub mod company_service;
pub mod dashboard_service;
pub mod device_service;
pub mod invoice_service;

pub use auth_service::AuthService;
pub use bank_service::BankService;
pub use catalog_service::{CategoryService, ProductService};
pub use client_service::ClientService;
pub use company_service::CompanyService;
pub use dashboard_service::DashboardService;
pub use device_service::DeviceService;
pub use invoice_service::InvoiceService;
