//! Sales invoices, their product lines and payments.
//!
//! The sale payload keeps the field names the point-of-sale frontend sends.
//! Payments store their method in a text column: a bank id for transfers,
//! `efectivo` for cash or `pendiente` for amounts still owed.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::PartyRef;
use crate::domain::errors::{DomainError, DomainResult};

/// Invoice state assigned to every new sale.
pub const PAID_STATE_ID: i64 = 1;

pub const NOT_REGISTERED: &str = "NO REGISTRADO";
pub const NO_COMPANY: &str = "Sin empresa";

const CASH_TAG: &str = "efectivo";
const PENDING_TAG: &str = "pendiente";

/// Incoming sale from the point of sale.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaleRequest {
    #[serde(default)]
    pub id_usuario: Option<i64>,
    #[serde(default)]
    pub id_cliente: Option<i64>,
    #[serde(default)]
    pub id_empresa: Option<i64>,
    #[serde(default)]
    pub fecha_venta: Option<String>,
    #[serde(default)]
    pub vendedor: Option<String>,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub productos: Vec<SaleProduct>,
    #[serde(default)]
    pub datos_pago: Option<PaymentData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaleProduct {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub price_cost: f64,
    #[serde(default)]
    pub cantidad: i64,
    #[serde(default, rename = "precioTotal")]
    pub precio_total: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentData {
    #[serde(default)]
    pub transferencia: bool,
    #[serde(default)]
    pub efectivo: bool,
    #[serde(default)]
    pub pendiente: bool,
    #[serde(default)]
    pub monto_pagado: f64,
    #[serde(default)]
    pub monto_vuelto: f64,
    #[serde(default)]
    pub monto_transferencia: f64,
    #[serde(default)]
    pub monto_efectivo: f64,
    #[serde(default)]
    pub monto_pendiente: f64,
    #[serde(default)]
    pub bancos_seleccionados: Vec<SelectedBank>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedBank {
    pub banco_id: i64,
    #[serde(default)]
    pub nombre_banco: Option<String>,
    #[serde(default)]
    pub monto: f64,
}

/// How a stored payment was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethod {
    Cash,
    Pending,
    Transfer { bank_id: i64 },
    Other(String),
}

impl PaymentMethod {
    /// Classify the text stored in `payment_invoice.id_bank`.
    pub fn classify(stored: Option<&str>) -> Self {
        let Some(raw) = stored.map(str::trim) else {
            return Self::Other(String::new());
        };
        if raw.eq_ignore_ascii_case(CASH_TAG) {
            return Self::Cash;
        }
        if raw.eq_ignore_ascii_case(PENDING_TAG) {
            return Self::Pending;
        }
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(bank_id) = raw.parse() {
                return Self::Transfer { bank_id };
            }
        }
        Self::Other(raw.to_string())
    }

    /// Text written to `payment_invoice.id_bank`.
    pub fn stored(&self) -> String {
        match self {
            Self::Cash => CASH_TAG.to_string(),
            Self::Pending => PENDING_TAG.to_string(),
            Self::Transfer { bank_id } => bank_id.to_string(),
            Self::Other(raw) => raw.clone(),
        }
    }

    /// Display type, e.g. `Efectivo`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cash => "Efectivo",
            Self::Pending => "Pendiente",
            Self::Transfer { .. } => "Transferencia",
            Self::Other(_) => "Otro",
        }
    }

    /// Lower-case method key, e.g. `efectivo`.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Cash => "efectivo",
            Self::Pending => "pendiente",
            Self::Transfer { .. } => "transferencia",
            Self::Other(_) => "otro",
        }
    }
}

/// One product line of a sale to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLine {
    pub product_id: i64,
    pub quantity: i64,
    pub price_sale: i64,
    pub price_cost: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub method: PaymentMethod,
    pub amount: i64,
}

/// A validated sale ready to be written in one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSale {
    pub date: DateTime<Utc>,
    pub total: i64,
    pub id_client: i64,
    pub id_company: Option<i64>,
    pub id_user: i64,
    pub seller: String,
    pub lines: Vec<SaleLine>,
    pub payments: Vec<NewPayment>,
}

impl NewSale {
    /// Reason recorded on every detail row.
    pub fn reason(&self) -> String {
        format!("Venta atendida por {}", self.seller)
    }

    /// Requested units per product, summed across lines, in first-seen order.
    pub fn requested_quantities(&self) -> DomainResult<Vec<(i64, i64)>> {
        let mut totals: Vec<(i64, i64)> = Vec::new();
        for line in &self.lines {
            match totals.iter_mut().find(|(id, _)| *id == line.product_id) {
                Some((_, qty)) => {
                    *qty = qty.checked_add(line.quantity).ok_or_else(|| {
                        DomainError::validation(format!("quantity for product {} is too large", line.product_id))
                    })?;
                }
                None => totals.push((line.product_id, line.quantity)),
            }
        }
        Ok(totals)
    }
}

/// Largest `cantidad` accepted on a single sale line.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

fn to_units(amount: f64) -> i64 {
    amount.round() as i64
}

fn parse_sale_date(raw: &str) -> DomainResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| DomainError::validation(format!("invalid fecha_venta: {raw}")))
}

impl SaleRequest {
    /// Validate the payload and turn it into a write plan.
    pub fn into_new_sale(self) -> DomainResult<NewSale> {
        let id_user = self
            .id_usuario
            .filter(|id| *id != 0)
            .ok_or_else(|| DomainError::validation("id_usuario is required"))?;
        let id_client = self
            .id_cliente
            .filter(|id| *id != 0)
            .ok_or_else(|| DomainError::validation("id_cliente is required"))?;
        if self.productos.is_empty() {
            return Err(DomainError::validation("at least one product is required"));
        }
        if let Some(p) = self.productos.iter().find(|p| p.cantidad < 1) {
            return Err(DomainError::validation(format!(
                "quantity for product {} must be at least 1",
                p.id
            )));
        }
        if let Some(p) = self.productos.iter().find(|p| p.cantidad > MAX_LINE_QUANTITY) {
            return Err(DomainError::validation(format!(
                "quantity for product {} cannot exceed {MAX_LINE_QUANTITY}",
                p.id
            )));
        }
        let payment = self
            .datos_pago
            .ok_or_else(|| DomainError::validation("datos_pago is required"))?;

        let lines_total: f64 = self.productos.iter().map(|p| p.precio_total).sum();
        if (lines_total - self.total).abs() > 0.01 {
            return Err(DomainError::validation(format!(
                "product totals ({lines_total}) do not match sale total ({})",
                self.total
            )));
        }

        let date = parse_sale_date(
            self.fecha_venta
                .as_deref()
                .ok_or_else(|| DomainError::validation("fecha_venta is required"))?,
        )?;

        let lines = self
            .productos
            .iter()
            .map(|p| SaleLine {
                product_id: p.id,
                quantity: p.cantidad,
                price_sale: to_units(p.price),
                price_cost: to_units(p.price_cost),
            })
            .collect();

        let mut payments = Vec::new();
        if payment.transferencia && payment.monto_transferencia > 0.0 {
            payments.extend(payment.bancos_seleccionados.iter().map(|b| NewPayment {
                method: PaymentMethod::Transfer { bank_id: b.banco_id },
                amount: to_units(b.monto),
            }));
        }
        if payment.efectivo && payment.monto_efectivo > 0.0 {
            payments.push(NewPayment {
                method: PaymentMethod::Cash,
                amount: to_units(payment.monto_efectivo),
            });
        }
        if payment.pendiente && payment.monto_pendiente > 0.0 {
            payments.push(NewPayment {
                method: PaymentMethod::Pending,
                amount: to_units(payment.monto_pendiente),
            });
        }

        let seller = self
            .vendedor
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| NOT_REGISTERED.to_string());

        Ok(NewSale {
            date,
            total: to_units(self.total),
            id_client,
            id_company: self.id_empresa.filter(|id| *id != 0),
            id_user,
            seller,
            lines,
            payments,
        })
    }
}

/// A product line as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceLineRecord {
    pub product_id: Option<i64>,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub price_sale: i64,
}

/// A payment as stored, with the bank name resolved when `id_bank` is a bank id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRecord {
    pub amount: i64,
    pub id_bank: Option<String>,
    pub bank_name: Option<String>,
}

impl PaymentRecord {
    pub fn method(&self) -> PaymentMethod {
        PaymentMethod::classify(self.id_bank.as_deref())
    }
}

/// An invoice with everything needed to render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRecord {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub total: i64,
    pub state_name: Option<String>,
    pub client: Option<PartyRef>,
    pub company: Option<PartyRef>,
    pub seller_name: Option<String>,
    pub lines: Vec<InvoiceLineRecord>,
    pub payments: Vec<PaymentRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceParty {
    pub id: Option<i64>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceProductLine {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
    pub price: i64,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoicePayment {
    #[serde(rename = "type")]
    pub kind: String,
    pub method: String,
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
}

/// Detailed invoice view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceResponse {
    pub id: i64,
    pub sale_id: i64,
    pub invoice_number: String,
    pub issue_date: DateTime<Utc>,
    pub total_amount: i64,
    pub status: String,
    pub client: InvoiceParty,
    pub company: InvoiceParty,
    pub products: Vec<InvoiceProductLine>,
    pub payments: Vec<InvoicePayment>,
}

impl From<InvoiceRecord> for InvoiceResponse {
    fn from(record: InvoiceRecord) -> Self {
        let client = record.client.map_or(
            InvoiceParty {
                id: None,
                name: String::new(),
            },
            |c| InvoiceParty {
                id: Some(c.id),
                name: c.name.unwrap_or_default(),
            },
        );
        let company = record.company.map_or(
            InvoiceParty {
                id: None,
                name: NO_COMPANY.to_string(),
            },
            |c| InvoiceParty {
                id: Some(c.id),
                name: c.name.unwrap_or_default(),
            },
        );
        let products = record
            .lines
            .into_iter()
            .map(|line| InvoiceProductLine {
                id: line.product_id.unwrap_or_default(),
                name: line.product_name.unwrap_or_default(),
                quantity: line.quantity,
                price: line.price_sale,
                total: line.quantity.saturating_mul(line.price_sale),
            })
            .collect();
        let payments = record
            .payments
            .into_iter()
            .map(|p| {
                let method = p.method();
                let bank = match method {
                    PaymentMethod::Transfer { .. } => p.bank_name,
                    _ => None,
                };
                InvoicePayment {
                    kind: method.label().to_string(),
                    method: method.key().to_string(),
                    amount: p.amount,
                    bank,
                }
            })
            .collect();

        Self {
            id: record.id,
            sale_id: record.id,
            invoice_number: format!("INV-{}", record.id),
            issue_date: record.date,
            total_amount: record.total,
            status: record.state_name.unwrap_or_else(|| "Unknown".to_string()),
            client,
            company,
            products,
            payments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryParty {
    pub id: i64,
    pub nombre: String,
    pub dni: String,
}

impl SummaryParty {
    fn from_ref(party: Option<PartyRef>) -> Self {
        match party {
            Some(p) => Self {
                id: p.id,
                nombre: p.name.unwrap_or_else(|| NOT_REGISTERED.to_string()),
                dni: p.dni.unwrap_or_else(|| NOT_REGISTERED.to_string()),
            },
            None => Self {
                id: 0,
                nombre: NOT_REGISTERED.to_string(),
                dni: NOT_REGISTERED.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryPayment {
    pub amount: i64,
    pub formatted_amount: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub method: String,
    pub bank_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_id: Option<i64>,
}

/// One row of the invoice list screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceSummary {
    pub id: i64,
    pub ticket: i64,
    pub numero: String,
    pub fecha: String,
    pub hora: String,
    pub estado: String,
    pub total: i64,
    pub total_formatted: String,
    pub metodo_pago: String,
    pub monto_metodo: String,
    pub vendedor: String,
    pub cliente: SummaryParty,
    pub empresa: SummaryParty,
    pub productos: i64,
    pub pagos: Vec<SummaryPayment>,
    pub total_pagos: usize,
}

/// Format an amount as `$1.234.567`.
pub fn format_money(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// The dominant payment method label and its amount.
fn dominant_method(payments: &[PaymentRecord]) -> (String, i64) {
    let mut cash = 0;
    let mut pending = 0;
    let mut transfer = 0;
    let mut first_transfer: Option<&PaymentRecord> = None;
    for p in payments {
        match p.method() {
            PaymentMethod::Cash => cash += p.amount,
            PaymentMethod::Pending => pending += p.amount,
            PaymentMethod::Transfer { .. } => {
                transfer += p.amount;
                first_transfer.get_or_insert(p);
            }
            PaymentMethod::Other(_) => {}
        }
    }

    if transfer > cash && transfer > pending {
        let label = match first_transfer.and_then(|p| p.bank_name.as_deref()) {
            Some(name) => format!("Banco {}:", name.chars().take(3).collect::<String>()),
            None => "Banco:".to_string(),
        };
        (label, transfer)
    } else if pending > 0 && pending >= cash {
        ("Pendiente:".to_string(), pending)
    } else if cash > 0 {
        ("Efectivo:".to_string(), cash)
    } else {
        ("Efectivo".to_string(), 0)
    }
}

impl InvoiceSummary {
    /// Build a list row, rendering date and time in the business offset.
    pub fn from_record(record: InvoiceRecord, offset: FixedOffset) -> Self {
        let local = record.date.with_timezone(&offset);
        let (metodo_pago, monto) = dominant_method(&record.payments);
        let productos = record.lines.iter().map(|l| l.quantity).sum();
        let pagos: Vec<SummaryPayment> = record
            .payments
            .into_iter()
            .map(|p| match p.method() {
                PaymentMethod::Transfer { bank_id } => SummaryPayment {
                    amount: p.amount,
                    formatted_amount: format_money(p.amount),
                    kind: "Transferencia".to_string(),
                    method: "transferencia".to_string(),
                    bank_name: p.bank_name.unwrap_or_else(|| format!("Banco ID: {bank_id}")),
                    bank_id: Some(bank_id),
                },
                PaymentMethod::Pending => SummaryPayment {
                    amount: p.amount,
                    formatted_amount: format_money(p.amount),
                    kind: "Pendiente".to_string(),
                    method: "pendiente".to_string(),
                    bank_name: "Pendiente".to_string(),
                    bank_id: None,
                },
                PaymentMethod::Cash | PaymentMethod::Other(_) => SummaryPayment {
                    amount: p.amount,
                    formatted_amount: format_money(p.amount),
                    kind: "Efectivo".to_string(),
                    method: "efectivo".to_string(),
                    bank_name: "Efectivo".to_string(),
                    bank_id: None,
                },
            })
            .collect();

        Self {
            id: record.id,
            ticket: record.id,
            numero: format!("INV-{}", record.id),
            fecha: local.format("%d/%m/%Y").to_string(),
            hora: local.format("%H:%M").to_string(),
            estado: record.state_name.unwrap_or_else(|| "Unknown".to_string()),
            total: record.total,
            total_formatted: format_money(record.total),
            metodo_pago,
            monto_metodo: if monto > 0 { format_money(monto) } else { String::new() },
            vendedor: record.seller_name.unwrap_or_else(|| NOT_REGISTERED.to_string()),
            cliente: SummaryParty::from_ref(record.client),
            empresa: SummaryParty::from_ref(record.company),
            productos,
            total_pagos: pagos.len(),
            pagos,
        }
    }
}
