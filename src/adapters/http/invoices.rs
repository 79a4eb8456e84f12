//! Sales and the dashboard built on top of them.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::Utc;

use super::error::{parse_id, ApiResult};
use super::response::ApiResponse;
use super::state::AppState;
use super::ListParams;
use crate::domain::models::{
    DailyMetrics, DailyPaymentPoint, DailySalesPoint, DashboardMetrics, InvoiceResponse, InvoiceSummary,
    MonthlyComparison, MonthlyMetrics, SaleRequest,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/invoice", get(list_invoices).post(create_invoice))
        .route("/api/invoice/{id}", get(get_invoice))
        .route("/api/invoice/dashboard/daily-metrics", get(daily_metrics))
        .route("/api/invoice/dashboard/monthly-metrics", get(monthly_metrics))
        .route("/api/invoice/dashboard/daily-sales", get(daily_sales))
        .route("/api/invoice/dashboard/daily-sales-by-payment", get(daily_sales_by_payment))
        .route("/api/invoice/dashboard/monthly-sales-comparison", get(monthly_comparison))
        .route("/api/invoice/dashboard/all-metrics", get(all_metrics))
}

async fn create_invoice(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SaleRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<InvoiceResponse>> {
    let Json(request) = payload?;
    let invoice = state.invoices.create(request, Utc::now()).await?;
    Ok(ApiResponse::created(invoice, "Venta registrada"))
}

async fn list_invoices(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<ApiResponse<Vec<InvoiceSummary>>> {
    let Query(params) = query?;
    let (page, _) = params.into_parts()?;
    let invoices = state.invoices.list(page).await?;
    Ok(ApiResponse::page(invoices, "Facturas"))
}

async fn get_invoice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<InvoiceResponse>> {
    let invoice = state.invoices.get(parse_id(&id)?).await?;
    Ok(ApiResponse::ok(invoice, "Factura"))
}

async fn daily_metrics(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse<DailyMetrics>> {
    let metrics = state.dashboard.daily_metrics(Utc::now()).await?;
    Ok(ApiResponse::ok(metrics, "Métricas diarias"))
}

async fn monthly_metrics(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse<MonthlyMetrics>> {
    let metrics = state.dashboard.monthly_metrics(Utc::now()).await?;
    Ok(ApiResponse::ok(metrics, "Métricas mensuales"))
}

async fn daily_sales(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse<Vec<DailySalesPoint>>> {
    let points = state.dashboard.daily_sales(Utc::now()).await?;
    Ok(ApiResponse::ok(points, "Ventas diarias"))
}

async fn daily_sales_by_payment(
    State(state): State<Arc<AppState>>,
) -> ApiResult<ApiResponse<Vec<DailyPaymentPoint>>> {
    let points = state.dashboard.daily_sales_by_payment(Utc::now()).await?;
    Ok(ApiResponse::ok(points, "Ventas diarias por medio de pago"))
}

async fn monthly_comparison(
    State(state): State<Arc<AppState>>,
) -> ApiResult<ApiResponse<Vec<MonthlyComparison>>> {
    let months = state.dashboard.monthly_comparison(Utc::now()).await?;
    Ok(ApiResponse::ok(months, "Comparación mensual"))
}

async fn all_metrics(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse<DashboardMetrics>> {
    let metrics = state.dashboard.all_metrics(Utc::now()).await?;
    Ok(ApiResponse::ok(metrics, "Métricas"))
}
