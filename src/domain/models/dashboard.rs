//! Sales dashboard metrics.
//!
//! Figures are computed from raw sale and payment facts bucketed by the
//! business local day. Returns never reach this module.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use super::PaymentMethod;

const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// A non-return invoice's date and gross total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleFact {
    pub date: DateTime<Utc>,
    pub total: i64,
}

/// A payment of a non-return invoice, dated by its invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentFact {
    pub date: DateTime<Utc>,
    pub amount: i64,
    pub id_bank: Option<String>,
    pub bank_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetrics {
    pub total_bruto_hoy: i64,
    pub total_neto_hoy: i64,
    pub cambio_percent_bruto: f64,
    pub cambio_percent_neto: f64,
    pub pago_transferencia: i64,
    pub pago_efectivo: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyMetrics {
    pub venta_bruta_mensual: i64,
    pub venta_neta_mensual: i64,
    pub total_iva_mes: i64,
    pub total_mes: i64,
    pub cambio_percent_bruto: f64,
    pub cambio_percent_neto: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySalesPoint {
    pub date: String,
    pub ventas_brutas: i64,
    pub ventas_netas: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyPaymentPoint {
    pub date: String,
    pub payments: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyComparison {
    pub month: String,
    pub year: i32,
    pub current_year: i64,
    pub last_year: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub daily: DailyMetrics,
    pub monthly: MonthlyMetrics,
    pub daily_sales_chart: Vec<DailySalesPoint>,
    pub daily_payment_chart: Vec<DailyPaymentPoint>,
    pub monthly_sales_chart: Vec<MonthlyComparison>,
}

/// Spanish month name for a 1-based month number.
pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES[((month.clamp(1, 12)) - 1) as usize]
}

/// Round `value` to two decimals.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percent change from `previous` to `current`, 0 when there is no baseline.
pub fn percent_change(current: i64, previous: i64) -> f64 {
    if previous <= 0 {
        return 0.0;
    }
    round2((current - previous) as f64 / previous as f64 * 100.0)
}

/// Payment bucket used by the per-method daily chart.
pub fn payment_bucket(fact: &PaymentFact) -> String {
    match PaymentMethod::classify(fact.id_bank.as_deref()) {
        PaymentMethod::Cash => "Efectivo".to_string(),
        PaymentMethod::Pending => "Pendiente".to_string(),
        method => match &fact.bank_name {
            Some(name) => name.clone(),
            None if matches!(method, PaymentMethod::Transfer { .. }) => "Transferencias".to_string(),
            None => "Otros".to_string(),
        },
    }
}

/// Calendar arithmetic and aggregation in the business offset.
#[derive(Debug, Clone, Copy)]
pub struct DashboardClock {
    offset: FixedOffset,
    vat_rate: f64,
    today: NaiveDate,
}

impl DashboardClock {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset, vat_rate: f64) -> Self {
        Self {
            offset,
            vat_rate,
            today: now.with_timezone(&offset).date_naive(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Net amount of a VAT-inclusive gross amount.
    pub fn net(&self, gross: i64) -> i64 {
        (gross as f64 / (1.0 + self.vat_rate)).round() as i64
    }

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// UTC instant at which a local day starts.
    pub fn start_of(&self, day: NaiveDate) -> DateTime<Utc> {
        let midnight = day.and_hms_opt(0, 0, 0).unwrap_or_default();
        self.offset
            .from_local_datetime(&midnight)
            .single()
            .map_or_else(|| midnight.and_utc(), |dt| dt.with_timezone(&Utc))
    }

    /// First day of the month `months_back` months before the current one.
    pub fn month_start(&self, months_back: u32) -> NaiveDate {
        shift_month(first_of_month(self.today), -(months_back as i32))
    }

    /// `[start, end)` of yesterday and today, as UTC.
    pub fn daily_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let yesterday = self.today - Duration::days(1);
        let tomorrow = self.today + Duration::days(1);
        (self.start_of(yesterday), self.start_of(tomorrow))
    }

    /// `[start, end)` of last month and the current month, as UTC.
    pub fn monthly_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            self.start_of(self.month_start(1)),
            self.start_of(shift_month(self.month_start(0), 1)),
        )
    }

    /// `[start, end)` covering the last 12 months and the same months a year earlier.
    pub fn comparison_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            self.start_of(self.month_start(23)),
            self.start_of(shift_month(self.month_start(0), 1)),
        )
    }

    pub fn daily_metrics(&self, sales: &[SaleFact], payments: &[PaymentFact]) -> DailyMetrics {
        let yesterday = self.today - Duration::days(1);
        let gross_today: i64 = self.sum_on(sales, |d| d == self.today);
        let gross_yesterday: i64 = self.sum_on(sales, |d| d == yesterday);
        let net_today = self.net(gross_today);
        let net_yesterday = self.net(gross_yesterday);

        let mut transfer = 0;
        let mut cash = 0;
        for p in payments.iter().filter(|p| self.local_date(p.date) == self.today) {
            let bank_is_cash = p
                .bank_name
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case("efectivo"));
            match PaymentMethod::classify(p.id_bank.as_deref()) {
                PaymentMethod::Cash => cash += p.amount,
                _ if bank_is_cash => cash += p.amount,
                PaymentMethod::Pending => {}
                PaymentMethod::Other(raw) if raw.is_empty() => {}
                _ => transfer += p.amount,
            }
        }

        DailyMetrics {
            total_bruto_hoy: gross_today,
            total_neto_hoy: net_today,
            cambio_percent_bruto: percent_change(gross_today, gross_yesterday),
            cambio_percent_neto: percent_change(net_today, net_yesterday),
            pago_transferencia: transfer,
            pago_efectivo: cash,
        }
    }

    pub fn monthly_metrics(&self, sales: &[SaleFact]) -> MonthlyMetrics {
        let this_month = self.month_start(0);
        let last_month = self.month_start(1);
        let gross: i64 = self.sum_on(sales, |d| first_of_month(d) == this_month);
        let gross_prev: i64 = self.sum_on(sales, |d| first_of_month(d) == last_month);
        let net = self.net(gross);
        let net_prev = self.net(gross_prev);

        MonthlyMetrics {
            venta_bruta_mensual: gross,
            venta_neta_mensual: net,
            total_iva_mes: gross - net,
            total_mes: gross,
            cambio_percent_bruto: percent_change(gross, gross_prev),
            cambio_percent_neto: percent_change(net, net_prev),
        }
    }

    /// Gross and per-invoice net sales for each day of the current month with sales.
    pub fn daily_sales(&self, sales: &[SaleFact]) -> Vec<DailySalesPoint> {
        let this_month = self.month_start(0);
        let mut by_day: BTreeMap<u32, (i64, i64)> = BTreeMap::new();
        for s in sales {
            let day = self.local_date(s.date);
            if first_of_month(day) != this_month {
                continue;
            }
            let entry = by_day.entry(day.day()).or_default();
            entry.0 += s.total;
            entry.1 += self.net(s.total);
        }
        by_day
            .into_iter()
            .map(|(day, (gross, net))| DailySalesPoint {
                date: format!("{day}-{}", this_month.month()),
                ventas_brutas: gross,
                ventas_netas: net,
            })
            .collect()
    }

    pub fn daily_sales_by_payment(&self, payments: &[PaymentFact]) -> Vec<DailyPaymentPoint> {
        let this_month = self.month_start(0);
        let mut by_day: BTreeMap<u32, BTreeMap<String, i64>> = BTreeMap::new();
        for p in payments {
            let day = self.local_date(p.date);
            if first_of_month(day) != this_month {
                continue;
            }
            *by_day
                .entry(day.day())
                .or_default()
                .entry(payment_bucket(p))
                .or_default() += p.amount;
        }
        by_day
            .into_iter()
            .map(|(day, payments)| DailyPaymentPoint {
                date: format!("{day}-{}", this_month.month()),
                payments,
            })
            .collect()
    }

    /// The last 12 months, oldest first, against the same month a year earlier.
    pub fn monthly_comparison(&self, sales: &[SaleFact]) -> Vec<MonthlyComparison> {
        let mut totals: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        for s in sales {
            *totals.entry(first_of_month(self.local_date(s.date))).or_default() += s.total;
        }
        (0..12)
            .rev()
            .map(|back| {
                let month = self.month_start(back);
                let a_year_earlier = shift_month(month, -12);
                MonthlyComparison {
                    month: month_name(month.month()).to_string(),
                    year: month.year(),
                    current_year: totals.get(&month).copied().unwrap_or_default(),
                    last_year: totals.get(&a_year_earlier).copied().unwrap_or_default(),
                }
            })
            .collect()
    }

    fn sum_on(&self, sales: &[SaleFact], pick: impl Fn(NaiveDate) -> bool) -> i64 {
        sales
            .iter()
            .filter(|s| pick(self.local_date(s.date)))
            .map(|s| s.total)
            .sum()
    }
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

/// Shift a first-of-month date by whole months.
fn shift_month(first: NaiveDate, months: i32) -> NaiveDate {
    let index = first.year() * 12 + first.month0() as i32 + months;
    let year = index.div_euclid(12);
    let month0 = index.rem_euclid(12) as u32;
    NaiveDate::from_ymd_opt(year, month0 + 1, 1).unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn clock(now: DateTime<Utc>) -> DashboardClock {
        DashboardClock::new(now, FixedOffset::west_opt(5 * 3600).unwrap(), 0.19)
    }

    fn sale(date: DateTime<Utc>, total: i64) -> SaleFact {
        SaleFact { date, total }
    }

    fn pay(date: DateTime<Utc>, amount: i64, id_bank: &str, bank_name: Option<&str>) -> PaymentFact {
        PaymentFact {
            date,
            amount,
            id_bank: Some(id_bank.to_string()),
            bank_name: bank_name.map(str::to_string),
        }
    }

    #[test]
    fn test_percent_change() {
        assert!((percent_change(150, 100) - 50.0).abs() < f64::EPSILON);
        assert!((percent_change(100, 300) - (-66.67)).abs() < 1e-9);
        assert!(percent_change(100, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_net_rounds() {
        let c = clock(utc(2024, 5, 10, 12));
        assert_eq!(c.net(119), 100);
        assert_eq!(c.net(1000), 840);
    }

    #[test]
    fn test_month_names() {
        assert_eq!(month_name(1), "Enero");
        assert_eq!(month_name(9), "Septiembre");
        assert_eq!(month_name(12), "Diciembre");
    }

    #[test]
    fn test_shift_month_across_years() {
        let jan = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(shift_month(jan, -1), NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(shift_month(jan, -13), NaiveDate::from_ymd_opt(2022, 12, 1).unwrap());
        assert_eq!(shift_month(jan, 12), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn test_today_uses_business_offset() {
        // 03:00 UTC is still the previous evening at UTC-5.
        let c = clock(utc(2024, 5, 10, 3));
        assert_eq!(c.today(), NaiveDate::from_ymd_opt(2024, 5, 9).unwrap());
        let (start, end) = c.daily_window();
        assert_eq!(start, utc(2024, 5, 8, 5));
        assert_eq!(end, utc(2024, 5, 10, 5));
    }

    #[test]
    fn test_daily_metrics() {
        let c = clock(utc(2024, 5, 10, 18));
        let sales = vec![
            sale(utc(2024, 5, 10, 15), 2380),
            sale(utc(2024, 5, 10, 2), 1190), // local May 9
        ];
        let payments = vec![
            pay(utc(2024, 5, 10, 15), 1000, "efectivo", None),
            pay(utc(2024, 5, 10, 15), 1000, "3", Some("Santander")),
            pay(utc(2024, 5, 10, 15), 300, "9", Some("Efectivo")),
            pay(utc(2024, 5, 10, 15), 80, "pendiente", None),
            pay(utc(2024, 5, 9, 15), 1190, "efectivo", None),
        ];
        let m = c.daily_metrics(&sales, &payments);
        assert_eq!(m.total_bruto_hoy, 2380);
        assert_eq!(m.total_neto_hoy, 2000);
        assert!((m.cambio_percent_bruto - 100.0).abs() < 1e-9);
        assert_eq!(m.pago_efectivo, 1300);
        assert_eq!(m.pago_transferencia, 1000);
    }

    #[test]
    fn test_monthly_metrics() {
        let c = clock(utc(2024, 5, 10, 18));
        let sales = vec![
            sale(utc(2024, 5, 2, 15), 1190),
            sale(utc(2024, 5, 1, 3), 9999), // local April 30
            sale(utc(2024, 4, 15, 15), 1190),
        ];
        let m = c.monthly_metrics(&sales);
        assert_eq!(m.venta_bruta_mensual, 1190);
        assert_eq!(m.venta_neta_mensual, 1000);
        assert_eq!(m.total_iva_mes, 190);
        assert_eq!(m.total_mes, 1190);
        assert!((m.cambio_percent_bruto - (-89.36)).abs() < 1e-9);
    }

    #[test]
    fn test_daily_sales_sums_net_per_invoice() {
        let c = clock(utc(2024, 5, 10, 18));
        let sales = vec![
            sale(utc(2024, 5, 3, 15), 100),
            sale(utc(2024, 5, 3, 16), 100),
            sale(utc(2024, 5, 1, 15), 119),
            sale(utc(2024, 4, 20, 15), 500),
        ];
        let points = c.daily_sales(&sales);
        assert_eq!(
            points,
            vec![
                DailySalesPoint {
                    date: "1-5".to_string(),
                    ventas_brutas: 119,
                    ventas_netas: 100
                },
                DailySalesPoint {
                    date: "3-5".to_string(),
                    ventas_brutas: 200,
                    ventas_netas: 168
                },
            ]
        );
    }

    #[test]
    fn test_daily_sales_by_payment_buckets() {
        let c = clock(utc(2024, 5, 10, 18));
        let payments = vec![
            pay(utc(2024, 5, 4, 15), 10, "EFECTIVO", None),
            pay(utc(2024, 5, 4, 15), 20, "pendiente", None),
            pay(utc(2024, 5, 4, 15), 30, "3", Some("BCI")),
            pay(utc(2024, 5, 4, 15), 40, "77", None),
            pay(utc(2024, 5, 4, 15), 50, "cheque", None),
            pay(utc(2024, 5, 4, 15), 5, "efectivo", None),
        ];
        let points = c.daily_sales_by_payment(&payments);
        assert_eq!(points.len(), 1);
        let p = &points[0].payments;
        assert_eq!(points[0].date, "4-5");
        assert_eq!(p["Efectivo"], 15);
        assert_eq!(p["Pendiente"], 20);
        assert_eq!(p["BCI"], 30);
        assert_eq!(p["Transferencias"], 40);
        assert_eq!(p["Otros"], 50);
    }

    #[test]
    fn test_monthly_comparison() {
        let c = clock(utc(2024, 2, 10, 18));
        let sales = vec![
            sale(utc(2024, 2, 5, 15), 300),
            sale(utc(2023, 2, 5, 15), 100),
            sale(utc(2023, 3, 5, 15), 50),
            sale(utc(2022, 3, 5, 15), 25),
        ];
        let months = c.monthly_comparison(&sales);
        assert_eq!(months.len(), 12);
        assert_eq!(months[0].month, "Marzo");
        assert_eq!(months[0].year, 2023);
        assert_eq!(months[0].current_year, 50);
        assert_eq!(months[0].last_year, 25);
        assert_eq!(months[11].month, "Febrero");
        assert_eq!(months[11].year, 2024);
        assert_eq!(months[11].current_year, 300);
        assert_eq!(months[11].last_year, 100);
    }
}
