pub mod bank;
pub mod catalog;
pub mod client;
pub mod company;
pub mod config;
pub mod dashboard;
pub mod device;
pub mod invoice;
pub mod pagination;
pub mod reference;
pub mod user;

pub use bank::{AccountType, Bank, BankInput};
pub use catalog::{Category, InventoryMovement, MovementType, Product, ProductInput, StockChange};
pub use client::{Client, ClientDetail, ClientInput, ClientWithCompanies};
pub use company::{Company, CompanyInput, CompanyWithClients};
pub use config::{
    AuthConfig, BusinessConfig, CacheConfig, Config, DatabaseConfig, LoggingConfig, ServerConfig,
};
pub use dashboard::{
    DailyMetrics, DailyPaymentPoint, DailySalesPoint, DashboardClock, DashboardMetrics,
    MonthlyComparison, MonthlyMetrics, PaymentFact, SaleFact,
};
pub use device::{
    location_limit, AssignRequest, Assignment, AssignmentStatus, Device, DeviceInput, DeviceStatus,
    Location, LocationInput, UnassignRequest,
};
pub use invoice::{
    InvoiceLineRecord, InvoiceRecord, InvoiceResponse, InvoiceSummary, NewPayment, NewSale,
    PaymentMethod, PaymentRecord, SaleLine, SaleRequest, PAID_STATE_ID,
};
pub use pagination::{Page, PageRequest, Pagination, SearchFilter};
pub use reference::{NamedRef, PartyRef};
pub use user::{AuthSession, Claims, Credentials, NewUser, Registration, User};
