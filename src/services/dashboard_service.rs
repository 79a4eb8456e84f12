//! Sales dashboard: loads the facts each metric needs and aggregates them
//! in the business offset.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    BusinessConfig, DailyMetrics, DailyPaymentPoint, DailySalesPoint, DashboardClock, DashboardMetrics,
    MonthlyComparison, MonthlyMetrics,
};
use crate::domain::ports::InvoiceRepository;

pub struct DashboardService {
    repository: Arc<dyn InvoiceRepository>,
    offset: FixedOffset,
    vat_rate: f64,
}

impl DashboardService {
    pub fn new(repository: Arc<dyn InvoiceRepository>, business: &BusinessConfig) -> Self {
        Self {
            repository,
            offset: business.offset(),
            vat_rate: business.vat_rate,
        }
    }

    fn clock(&self, now: DateTime<Utc>) -> DashboardClock {
        DashboardClock::new(now, self.offset, self.vat_rate)
    }

    pub async fn daily_metrics(&self, now: DateTime<Utc>) -> DomainResult<DailyMetrics> {
        let clock = self.clock(now);
        let (from, to) = clock.daily_window();
        let sales = self.repository.sales_between(from, to).await?;
        let payments = self.repository.payments_between(from, to).await?;
        Ok(clock.daily_metrics(&sales, &payments))
    }

    pub async fn monthly_metrics(&self, now: DateTime<Utc>) -> DomainResult<MonthlyMetrics> {
        let clock = self.clock(now);
        let (from, to) = clock.monthly_window();
        let sales = self.repository.sales_between(from, to).await?;
        Ok(clock.monthly_metrics(&sales))
    }

    pub async fn daily_sales(&self, now: DateTime<Utc>) -> DomainResult<Vec<DailySalesPoint>> {
        let clock = self.clock(now);
        let (from, to) = clock.monthly_window();
        let sales = self.repository.sales_between(from, to).await?;
        Ok(clock.daily_sales(&sales))
    }

    pub async fn daily_sales_by_payment(&self, now: DateTime<Utc>) -> DomainResult<Vec<DailyPaymentPoint>> {
        let clock = self.clock(now);
        let (from, to) = clock.monthly_window();
        let payments = self.repository.payments_between(from, to).await?;
        Ok(clock.daily_sales_by_payment(&payments))
    }

    pub async fn monthly_comparison(&self, now: DateTime<Utc>) -> DomainResult<Vec<MonthlyComparison>> {
        let clock = self.clock(now);
        let (from, to) = clock.comparison_window();
        let sales = self.repository.sales_between(from, to).await?;
        Ok(clock.monthly_comparison(&sales))
    }

    /// Every metric at once. Facts are loaded once for the widest window.
    pub async fn all_metrics(&self, now: DateTime<Utc>) -> DomainResult<DashboardMetrics> {
        let clock = self.clock(now);
        let (from, to) = clock.comparison_window();
        let sales = self.repository.sales_between(from, to).await?;
        let (month_from, month_to) = clock.monthly_window();
        let payments = self.repository.payments_between(month_from, month_to).await?;

        Ok(DashboardMetrics {
            daily: clock.daily_metrics(&sales, &payments),
            monthly: clock.monthly_metrics(&sales),
            daily_sales_chart: clock.daily_sales(&sales),
            daily_payment_chart: clock.daily_sales_by_payment(&payments),
            monthly_sales_chart: clock.monthly_comparison(&sales),
        })
    }
}
