//! Customer and company account data, cash receipts and manual credit.

mod common;

use common::{on_cash, on_credit, partial, Fixture, TestApp};
use serde_json::{json, Value};

#[tokio::test]
async fn customer_credit_sale_then_cash_receipt() {
    let app = TestApp::spawn().await;
    let f = Fixture::create(&app).await;
    app.purchase(&f.company, &f.item, "20", "0", on_cash()).await;

    // 4 units at the catalog sale price of 150, 200 paid up front
    let response = app
        .sell(&f.customer, &f.item, "4", "0", partial("200"))
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let path = format!(
        "/inventoryTransaction/customer/accountData?customerID={}",
        f.customer
    );
    let data = app.get_json(&path).await["data"].clone();
    assert_eq!(data["totalCustomerSales"], "600");
    assert_eq!(data["totalCustomerCash"], "200");
    assert_eq!(data["totalCustomerCredit"], "400");
    assert_eq!(data["list"][0]["kind"], "sale_credit");

    let body = app
        .post_ok(
            "/inventoryTransaction/customer/receiveCash",
            json!({ "customerID": f.customer, "amount": "150" }),
            200,
        )
        .await;
    assert_eq!(body["data"]["totalCustomerCash"], "350");
    assert_eq!(body["data"]["totalCustomerCredit"], "250");
    assert_eq!(body["data"]["list"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn receiving_more_than_outstanding_credit_is_rejected() {
    let app = TestApp::spawn().await;
    let f = Fixture::create(&app).await;
    app.purchase(&f.company, &f.item, "5", "0", on_credit()).await;

    let response = app
        .post(
            "/inventoryTransaction/company/receiveCash",
            json!({ "companyID": f.company, "amount": "501" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "INVALID_AMOUNT");
    assert!(body["message"].as_str().unwrap().contains("exceeds"));

    let data = app
        .get_json(&format!(
            "/inventoryTransaction/company/accountData?companyID={}",
            f.company
        ))
        .await;
    assert_eq!(data["data"]["totalCompanyCredit"], "500");
    assert_eq!(data["data"]["totalCompanyCash"], "0");
}

#[tokio::test]
async fn add_credit_records_the_message() {
    let app = TestApp::spawn().await;
    let f = Fixture::create(&app).await;

    let body = app
        .post_ok(
            "/inventoryTransaction/customer/addCredit",
            json!({ "customerID": f.customer, "amount": "75.50", "message": "Opening balance" }),
            200,
        )
        .await;
    assert_eq!(body["data"]["totalCustomerCredit"], "75.50");
    assert_eq!(body["data"]["list"][0]["kind"], "credit_added");
    assert_eq!(body["data"]["list"][0]["narration"], "Opening balance");

    let response = app
        .post(
            "/inventoryTransaction/customer/addCredit",
            json!({ "customerID": f.customer, "amount": "10", "message": "  " }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn account_data_checks_party_kind() {
    let app = TestApp::spawn().await;
    let f = Fixture::create(&app).await;

    // A company id is not a customer
    let response = app
        .get(&format!(
            "/inventoryTransaction/customer/accountData?customerID={}",
            f.company
        ))
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let response = app
        .get(&format!(
            "/inventoryTransaction/customer/accountData?customerID={}",
            uuid::Uuid::new_v4()
        ))
        .await;
    assert_eq!(response.status().as_u16(), 404);

    let response = app
        .get("/inventoryTransaction/customer/accountData?customerID=")
        .await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn sale_return_does_not_touch_credit_by_default() {
    let app = TestApp::spawn().await;
    let f = Fixture::create(&app).await;
    app.purchase(&f.company, &f.item, "10", "0", on_cash()).await;
    app.sell(&f.customer, &f.item, "2", "0", on_credit()).await;

    let response = app.return_items(&f.customer, &f.item, "1").await;
    assert_eq!(response.status().as_u16(), 201);

    let data = app
        .get_json(&format!(
            "/inventoryTransaction/customer/accountData?customerID={}",
            f.customer
        ))
        .await;
    assert_eq!(data["data"]["totalCustomerSaleReturns"], "150");
    assert_eq!(data["data"]["totalCustomerCredit"], "300");
}

#[tokio::test]
async fn account_data_reads_are_repeatable() {
    let app = TestApp::spawn().await;
    let f = Fixture::create(&app).await;
    app.purchase(&f.company, &f.item, "10", "0", on_cash()).await;
    app.sell(&f.customer, &f.item, "3", "0", partial("100")).await;

    let path = format!(
        "/inventoryTransaction/customer/accountData?customerID={}",
        f.customer
    );
    let first = app.get_json(&path).await;
    let second = app.get_json(&path).await;
    assert_eq!(first, second);
    assert_eq!(first["data"]["totalCustomerCredit"], "350");
}

#[tokio::test]
async fn credit_past_the_amount_limit_is_rejected() {
    let app = TestApp::spawn().await;
    let f = Fixture::create(&app).await;
    let path = "/inventoryTransaction/customer/addCredit";

    let body = app
        .post_ok(
            path,
            json!({ "customerID": f.customer, "amount": "9000000000000000", "message": "Opening balance" }),
            200,
        )
        .await;
    assert_eq!(body["data"]["totalCustomerCredit"], "9000000000000000");

    let response = app
        .post(
            path,
            json!({ "customerID": f.customer, "amount": "9000000000000000", "message": "Top up" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "INVALID_AMOUNT");

    let response = app
        .post(
            path,
            json!({ "customerID": f.customer, "amount": "79228162514264337593543950335", "message": "Top up" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let data = app
        .get_json(&format!(
            "/inventoryTransaction/customer/accountData?customerID={}",
            f.customer
        ))
        .await;
    assert_eq!(data["data"]["totalCustomerCredit"], "9000000000000000");
    assert_eq!(data["data"]["list"].as_array().unwrap().len(), 1);
}
