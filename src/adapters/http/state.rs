//! Shared handler state and its wiring from a database pool.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::adapters::cache::{CachedCategoryRepository, CachedCompanyRepository};
use crate::adapters::sqlite::{
    SqliteBankRepository, SqliteCategoryRepository, SqliteClientRepository, SqliteCompanyRepository,
    SqliteDeviceRepository, SqliteInvoiceRepository, SqliteProductRepository, SqliteUserRepository,
};
use crate::domain::models::Config;
use crate::services::{
    AuthService, BankService, CategoryService, ClientService, CompanyService, DashboardService,
    DeviceService, InvoiceService, ProductService,
};

/// Services reachable from every handler.
pub struct AppState {
    pub auth: AuthService,
    pub banks: BankService,
    pub categories: CategoryService,
    pub clients: ClientService,
    pub companies: CompanyService,
    pub dashboard: DashboardService,
    pub devices: DeviceService,
    pub invoices: InvoiceService,
    pub products: ProductService,
}

impl AppState {
    /// Build every repository over `pool`, wrapping the cacheable ones.
    pub fn from_pool(pool: SqlitePool, config: &Config) -> Self {
        let categories = Arc::new(CachedCategoryRepository::new(
            Arc::new(SqliteCategoryRepository::new(pool.clone())),
            &config.cache,
        ));
        let companies = Arc::new(CachedCompanyRepository::new(
            Arc::new(SqliteCompanyRepository::new(pool.clone())),
            &config.cache,
        ));
        let invoices = Arc::new(SqliteInvoiceRepository::new(pool.clone()));

        Self {
            auth: AuthService::new(Arc::new(SqliteUserRepository::new(pool.clone())), config.auth.clone()),
            banks: BankService::new(Arc::new(SqliteBankRepository::new(pool.clone()))),
            categories: CategoryService::new(categories),
            clients: ClientService::new(Arc::new(SqliteClientRepository::new(pool.clone()))),
            companies: CompanyService::new(companies),
            dashboard: DashboardService::new(invoices.clone(), &config.business),
            devices: DeviceService::new(Arc::new(SqliteDeviceRepository::new(pool.clone()))),
            invoices: InvoiceService::new(invoices, config.business.offset()),
            products: ProductService::new(Arc::new(SqliteProductRepository::new(pool))),
        }
    }
}
