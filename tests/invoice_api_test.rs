//! Recording sales and reading them back, including the dashboard.

mod helpers;

use axum::http::StatusCode;
use axum::Router;
use chrono::Utc;
use helpers::{default_app, get_json, post_json};
use serde_json::{json, Value};

struct Seeded {
    user_id: i64,
    client_id: i64,
    bank_id: i64,
    product_id: i64,
}

async fn seed(app: &Router) -> Seeded {
    let (status, body) = post_json(
        app,
        "/api/auth/register",
        json!({
            "id_type_user": 2,
            "name": "Ana Vendedora",
            "email": "ana@example.com",
            "username": "ana",
            "password": "secret1"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let user_id = body["data"]["id"].as_i64().unwrap();

    let (_, body) = post_json(app, "/api/client/create", json!({"name": "Juan Perez", "dni": "12.345.678-9"})).await;
    let client_id = body["data"]["id"].as_i64().unwrap();

    let (_, body) = post_json(app, "/api/bank", json!({"name": "Banco Estado"})).await;
    let bank_id = body["data"]["id"].as_i64().unwrap();

    let (_, body) = post_json(
        app,
        "/api/product",
        json!({"name": "GPS Tracker", "price": 50000, "price_cost": 30000, "stock": 5}),
    )
    .await;
    let product_id = body["data"]["id"].as_i64().unwrap();

    Seeded {
        user_id,
        client_id,
        bank_id,
        product_id,
    }
}

fn sale(seeded: &Seeded, quantity: i64) -> Value {
    let total = quantity * 50_000;
    json!({
        "id_usuario": seeded.user_id,
        "id_cliente": seeded.client_id,
        "id_empresa": 0,
        "fecha_venta": Utc::now().to_rfc3339(),
        "vendedor": "Ana Vendedora",
        "total": total,
        "productos": [{
            "id": seeded.product_id,
            "name": "GPS Tracker",
            "price": 50000,
            "price_cost": 30000,
            "cantidad": quantity,
            "precioTotal": total
        }],
        "datos_pago": {
            "transferencia": true,
            "efectivo": true,
            "pendiente": false,
            "montoPagado": total,
            "montoVuelto": 0,
            "montoTransferencia": 60000,
            "montoEfectivo": total - 60000,
            "montoPendiente": 0,
            "bancosSeleccionados": [{
                "bancoId": seeded.bank_id,
                "nombreBanco": "Banco Estado",
                "monto": 60000
            }]
        }
    })
}

#[tokio::test]
async fn test_sale_is_recorded_and_read_back() {
    let app = default_app().await;
    let seeded = seed(&app).await;

    let (status, body) = post_json(&app, "/api/invoice", sale(&seeded, 2)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let invoice = body["data"].clone();
    let id = invoice["id"].as_i64().unwrap();
    assert_eq!(invoice["sale_id"], id);
    assert_eq!(invoice["invoice_number"], format!("INV-{id}"));
    assert_eq!(invoice["status"], "Pagado");
    assert_eq!(invoice["total_amount"], 100_000);
    assert_eq!(invoice["client"]["name"], "Juan Perez");
    assert_eq!(invoice["company"], json!({"id": null, "name": "Sin empresa"}));
    assert_eq!(
        invoice["products"],
        json!([{"id": seeded.product_id, "name": "GPS Tracker", "quantity": 2, "price": 50000, "total": 100000}])
    );

    let payments = invoice["payments"].as_array().unwrap();
    assert_eq!(payments.len(), 2);
    let transfer = payments.iter().find(|p| p["method"] == "transferencia").unwrap();
    assert_eq!(transfer["amount"], 60_000);
    assert_eq!(transfer["bank"], "Banco Estado");
    let cash = payments.iter().find(|p| p["method"] == "efectivo").unwrap();
    assert_eq!(cash["type"], "Efectivo");
    assert_eq!(cash["amount"], 40_000);

    let (_, body) = get_json(&app, &format!("/api/invoice/{id}")).await;
    assert_eq!(body["data"], invoice);

    // Stock was decremented with a matching OUT movement
    let (_, body) = get_json(&app, &format!("/api/product/{}", seeded.product_id)).await;
    assert_eq!(body["data"]["stock"], 3);
    let (_, body) = get_json(&app, &format!("/api/product/{}/inventory", seeded.product_id)).await;
    assert_eq!(body["data"][0]["movement_type"], "OUT");
    assert_eq!(body["data"][0]["quantity_out"], 2);
    assert_eq!(body["data"][0]["reference_id"], id);

    let (status, body) = get_json(&app, "/api/invoice?page=1&limit=10").await;
    assert_eq!(status, StatusCode::OK);
    let row = &body["data"][0];
    assert_eq!(row["numero"], format!("INV-{id}"));
    assert_eq!(row["metodo_pago"], "Banco Ban:");
    assert_eq!(row["monto_metodo"], "$60.000");
    assert_eq!(row["total_formatted"], "$100.000");
    assert_eq!(row["vendedor"], "Ana Vendedora");
    assert_eq!(row["cliente"]["nombre"], "Juan Perez");
    assert_eq!(row["empresa"]["nombre"], "NO REGISTRADO");
    assert_eq!(row["productos"], 2);
    assert_eq!(row["total_pagos"], 2);
    assert_eq!(body["pagination"]["total"], 1);

    let (status, body) = get_json(&app, "/api/invoice/dashboard/daily-metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalBrutoHoy"], 100_000);
    assert_eq!(body["data"]["totalNetoHoy"], 84_034);
    assert_eq!(body["data"]["pagoTransferencia"], 60_000);
    assert_eq!(body["data"]["pagoEfectivo"], 40_000);
}

#[tokio::test]
async fn test_insufficient_stock_rolls_back() {
    let app = default_app().await;
    let seeded = seed(&app).await;

    let (status, body) = post_json(&app, "/api/invoice", sale(&seeded, 6)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["err"], "INSUFFICIENT_STOCK");
    assert_eq!(
        body["message"],
        "Insufficient stock for product GPS Tracker. Available: 5, requested: 6"
    );

    let (_, body) = get_json(&app, &format!("/api/product/{}", seeded.product_id)).await;
    assert_eq!(body["data"]["stock"], 5);
    let (_, body) = get_json(&app, &format!("/api/product/{}/inventory", seeded.product_id)).await;
    assert!(body["data"].is_null());
    let (_, body) = get_json(&app, "/api/invoice").await;
    assert!(body["data"].is_null());
    assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_invalid_sales_are_rejected() {
    let app = default_app().await;
    let seeded = seed(&app).await;

    let mut mismatched = sale(&seeded, 1);
    mismatched["total"] = json!(49_000);
    let (status, body) = post_json(&app, "/api/invoice", mismatched).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["err"], "VALIDATION_ERROR");

    let mut unknown_client = sale(&seeded, 1);
    unknown_client["id_cliente"] = json!(999);
    let (status, body) = post_json(&app, "/api/invoice", unknown_client).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("not found"));

    let mut no_payment = sale(&seeded, 1);
    no_payment.as_object_mut().unwrap().remove("datos_pago");
    let (status, _) = post_json(&app, "/api/invoice", no_payment).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get_json(&app, "/api/invoice/77").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["err"], "INVOICE_NOT_FOUND");

    let (_, body) = get_json(&app, &format!("/api/product/{}", seeded.product_id)).await;
    assert_eq!(body["data"]["stock"], 5);
}

#[tokio::test]
async fn test_huge_quantities_are_rejected() {
    let app = default_app().await;
    let seeded = seed(&app).await;

    let mut oversized = sale(&seeded, 1);
    let line = oversized["productos"][0].clone();
    oversized["productos"] = json!([line, line]);
    oversized["productos"][0]["cantidad"] = json!(1_i64 << 62);
    oversized["productos"][1]["cantidad"] = json!(1_i64 << 62);
    oversized["total"] = json!(100_000);
    let (status, body) = post_json(&app, "/api/invoice", oversized).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["err"], "VALIDATION_ERROR");

    let (_, body) = get_json(&app, &format!("/api/product/{}", seeded.product_id)).await;
    assert_eq!(body["data"]["stock"], 5);
}

#[tokio::test]
async fn test_dashboard_without_sales() {
    let app = default_app().await;

    let (status, body) = get_json(&app, "/api/invoice/dashboard/all-metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["daily"]["totalBrutoHoy"], 0);
    assert_eq!(body["data"]["monthly"]["ventaBrutaMensual"], 0);
    assert_eq!(body["data"]["monthlySalesChart"].as_array().unwrap().len(), 12);

    for path in ["monthly-metrics", "daily-sales", "daily-sales-by-payment", "monthly-sales-comparison"] {
        let (status, _) = get_json(&app, &format!("/api/invoice/dashboard/{path}")).await;
        assert_eq!(status, StatusCode::OK, "{path}");
    }
}
