//! Inventory posting over HTTP: stock movement, settlement and invoice lookups.

mod common;

use common::{id_of, on_cash, on_credit, partial, Fixture, TestApp};
use serde_json::{json, Value};

#[tokio::test]
async fn stock_follows_purchase_sale_and_return() {
    let app = TestApp::spawn().await;
    let f = Fixture::create(&app).await;

    let stock = app.stock(&f.item).await;
    assert_eq!(stock["comQty"], "0");
    assert_eq!(stock["bonusQty"], "0");

    let response = app.purchase(&f.company, &f.item, "10", "2", on_cash()).await;
    assert_eq!(response.status().as_u16(), 201);
    let stock = app.stock(&f.item).await;
    assert_eq!(stock["comQty"], "10");
    assert_eq!(stock["bonusQty"], "2");

    let response = app.sell(&f.customer, &f.item, "4", "0", on_cash()).await;
    assert_eq!(response.status().as_u16(), 201);
    let stock = app.stock(&f.item).await;
    assert_eq!(stock["comQty"], "6");
    assert_eq!(stock["bonusQty"], "2");

    // Over-selling is rejected and leaves stock untouched
    let response = app.sell(&f.customer, &f.item, "7", "0", on_cash()).await;
    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");
    assert_eq!(app.stock(&f.item).await["comQty"], "6");

    let response = app.return_items(&f.customer, &f.item, "3").await;
    assert_eq!(response.status().as_u16(), 201);
    let stock = app.stock(&f.item).await;
    assert_eq!(stock["comQty"], "9");
    assert_eq!(stock["bonusQty"], "2");
}

#[tokio::test]
async fn purchase_settlement_by_payment_type() {
    let app = TestApp::spawn().await;
    let f = Fixture::create(&app).await;

    // 10 units at the catalog purchase price of 100
    let cases = [
        (partial("400"), "400", "600"),
        (on_cash(), "1000", "0"),
        (on_credit(), "0", "1000"),
    ];
    for (payment, cash, credit) in cases {
        let response = app.purchase(&f.company, &f.item, "10", "0", payment).await;
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.expect("Failed to parse JSON");
        let invoice = &body["invoice"];
        assert_eq!(invoice["transactionType"], "purchase_invoice");
        assert_eq!(invoice["transactionAmount"], "1000");
        assert_eq!(invoice["cashAmount"], cash);
        assert_eq!(invoice["creditAmount"], credit);
    }

    let data = app
        .get_json(&format!(
            "/inventoryTransaction/company/accountData?companyID={}",
            f.company
        ))
        .await;
    assert_eq!(data["data"]["totalCompanyPurchases"], "3000");
    assert_eq!(data["data"]["totalCompanyCash"], "1400");
    assert_eq!(data["data"]["totalCompanyCredit"], "1600");
}

#[tokio::test]
async fn partial_cash_above_total_is_invalid_amount() {
    let app = TestApp::spawn().await;
    let f = Fixture::create(&app).await;

    let response = app
        .purchase(&f.company, &f.item, "10", "0", partial("1500"))
        .await;
    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "INVALID_AMOUNT");
    assert_eq!(app.stock(&f.item).await["comQty"], "0");
}

#[tokio::test]
async fn invoice_numbers_count_up_per_type() {
    let app = TestApp::spawn().await;
    let f = Fixture::create(&app).await;

    let mut numbers = Vec::new();
    for _ in 0..3 {
        let response = app.purchase(&f.company, &f.item, "5", "0", on_cash()).await;
        let body: Value = response.json().await.expect("Failed to parse JSON");
        numbers.push(body["invoice"]["transactionNo"].as_i64().unwrap());
    }
    assert_eq!(numbers, vec![1, 2, 3]);

    let response = app.sell(&f.customer, &f.item, "1", "0", on_cash()).await;
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["invoice"]["transactionNo"], 1);
}

#[tokio::test]
async fn purchase_line_sale_price_updates_catalog() {
    let app = TestApp::spawn().await;
    let f = Fixture::create(&app).await;

    let body = app
        .post_ok(
            "/inventoryTransaction/purchaseInvoice",
            json!({
                "companyID": f.company,
                "paymentType": "ON_CASH",
                "lineItems": [{
                    "itemID": f.item, "purchasePrice": "110", "salePrice": "170",
                    "comQty": "2", "bonusQty": ""
                }]
            }),
            201,
        )
        .await;
    assert_eq!(body["invoice"]["transactionAmount"], "220");

    let item = app.get_json(&format!("/item/{}", f.item)).await;
    assert_eq!(item["item"]["purchasePrice"], "110");
    assert_eq!(item["item"]["salePrice"], "170");
    assert_eq!(app.stock(&f.item).await["salePrice"], "170");
}

#[tokio::test]
async fn sale_is_fetched_with_party_and_salesman() {
    let app = TestApp::spawn().await;
    let f = Fixture::create(&app).await;
    app.purchase(&f.company, &f.item, "10", "0", on_cash()).await;

    let body = app
        .post_ok(
            "/inventoryTransaction/salesInvoice",
            json!({
                "customerID": f.customer,
                "salesmanID": f.salesman,
                "paymentType": "ON_CREDIT",
                "date": "2024-06-10",
                "lineItems": [{ "itemID": f.item, "price": "160", "comQty": "3", "bonusQty": "1" }]
            }),
            201,
        )
        .await;
    let sale_id = id_of(&body["invoice"]);

    let fetched = app
        .get_json(&format!("/inventoryTransaction/sale/{}", sale_id))
        .await;
    let invoice = &fetched["invoice"];
    assert_eq!(invoice["transactionAmount"], "480");
    assert_eq!(invoice["paymentType"], "ON_CREDIT");
    assert_eq!(invoice["party"]["nameFull"], "Corner Shop");
    assert_eq!(invoice["salesman"]["nameFull"], "Sam");
    let lines = invoice["inventoryTransactionItems"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["bonusQty"], "1");

    // A sale is not a purchase invoice
    let response = app
        .get(&format!("/inventoryTransaction/purchase/{}", sale_id))
        .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn sales_invoice_requires_a_date() {
    let app = TestApp::spawn().await;
    let f = Fixture::create(&app).await;

    let response = app
        .post(
            "/inventoryTransaction/salesInvoice",
            json!({
                "customerID": f.customer,
                "paymentType": "ON_CASH",
                "date": "",
                "lineItems": [{ "itemID": f.item, "comQty": "1" }]
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn invoice_listings_filter_by_item_party_and_date() {
    let app = TestApp::spawn().await;
    let f = Fixture::create(&app).await;
    let other_item = app.create_item(&f.company, "20", "30").await;

    app.purchase(&f.company, &f.item, "10", "0", on_cash()).await;
    app.purchase(&f.company, &other_item, "10", "0", on_cash()).await;
    app.sell(&f.customer, &f.item, "2", "0", on_cash()).await;

    let purchases = app
        .get_json("/inventoryTransaction/purchaseInvoice")
        .await;
    assert_eq!(purchases["invoices"].as_array().unwrap().len(), 2);

    let by_item = app
        .get_json(&format!(
            "/inventoryTransaction/item?itemID={}&invoiceType=&withDate=false",
            f.item
        ))
        .await;
    assert_eq!(by_item["invoices"].as_array().unwrap().len(), 2);

    let purchases_of_item = app
        .get_json(&format!(
            "/inventoryTransaction/item?itemID={}&invoiceType=purchase_invoice",
            f.item
        ))
        .await;
    assert_eq!(purchases_of_item["invoices"].as_array().unwrap().len(), 1);

    let by_customer = app
        .get_json(&format!(
            "/inventoryTransaction/customer?customerID={}&withDate=true&dateFrom=2024-06-01&dateTo=2024-06-30",
            f.customer
        ))
        .await;
    assert_eq!(by_customer["invoices"].as_array().unwrap().len(), 1);

    let outside_range = app
        .get_json(&format!(
            "/inventoryTransaction/company?companyID={}&withDate=true&dateFrom=2024-07-01&dateTo=2024-07-31",
            f.company
        ))
        .await;
    assert!(outside_range["invoices"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_sales_never_overdraw_stock() {
    let app = TestApp::spawn().await;
    let f = Fixture::create(&app).await;
    app.purchase(&f.company, &f.item, "10", "0", on_cash()).await;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let client = app.client.clone();
        let url = app.api("/inventoryTransaction/salesInvoice");
        let body = json!({
            "customerID": f.customer,
            "paymentType": "ON_CASH",
            "date": "2024-06-10",
            "lineItems": [{ "itemID": f.item, "comQty": "1" }]
        });
        handles.push(tokio::spawn(async move {
            client
                .post(url)
                .json(&body)
                .send()
                .await
                .expect("Failed to execute request")
                .status()
                .as_u16()
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            201 => created += 1,
            status => assert_eq!(status, 422),
        }
    }
    assert_eq!(created, 10);
    assert_eq!(app.stock(&f.item).await["comQty"], "0");

    let sales = app.get_json("/inventoryTransaction/salesInvoice").await;
    let mut numbers: Vec<i64> = sales["invoices"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["transactionNo"].as_i64().unwrap())
        .collect();
    numbers.sort();
    assert_eq!(numbers, (1..=10).collect::<Vec<i64>>());
}

#[tokio::test]
async fn oversized_or_over_precise_prices_are_rejected() {
    let app = TestApp::spawn().await;
    let f = Fixture::create(&app).await;

    for price in ["79228162514264337593543950335", "0.00005"] {
        let response = app
            .post(
                "/inventoryTransaction/purchaseInvoice",
                json!({
                    "companyID": f.company,
                    "paymentType": "ON_CASH",
                    "lineItems": [{ "itemID": f.item, "purchasePrice": price, "comQty": "2" }]
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    // Each value fits, the line total does not
    let response = app
        .post(
            "/inventoryTransaction/purchaseInvoice",
            json!({
                "companyID": f.company,
                "paymentType": "ON_CASH",
                "lineItems": [{ "itemID": f.item, "purchasePrice": "100000000000000", "comQty": "1000" }]
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "INVALID_AMOUNT");

    assert_eq!(app.stock(&f.item).await["comQty"], "0");
    let purchases = app.get_json("/inventoryTransaction/purchaseInvoice").await;
    assert!(purchases["invoices"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn amounts_come_back_as_written() {
    let app = TestApp::spawn().await;
    let f = Fixture::create(&app).await;

    let body = app
        .post_ok(
            "/inventoryTransaction/purchaseInvoice",
            json!({
                "companyID": f.company,
                "paymentType": "PARTIAL",
                "cashAmount": "0.0001",
                "lineItems": [{ "itemID": f.item, "purchasePrice": "12.3456", "comQty": "3" }]
            }),
            201,
        )
        .await;
    let id = id_of(&body["invoice"]);

    let fetched = app
        .get_json(&format!("/inventoryTransaction/purchase/{}", id))
        .await;
    let invoice = &fetched["invoice"];
    assert_eq!(invoice["transactionAmount"], "37.0368");
    assert_eq!(invoice["cashAmount"], "0.0001");
    assert_eq!(invoice["creditAmount"], "37.0367");
    assert_eq!(invoice["inventoryTransactionItems"][0]["unitPrice"], "12.3456");
}
