#![allow(dead_code)]

use backoffice_service::config::{BackofficeConfig, DatabaseBackend};
use backoffice_service::startup::Application;
use reqwest::{Client, Response};
use secrecy::Secret;
use serde_json::{json, Value};
use sqlx::{Connection, Executor, PgConnection};
use uuid::Uuid;

/// Create an empty database on the server `url` points at and return its URL.
async fn fresh_database(url: &str) -> String {
    let name = format!("backoffice_test_{}", Uuid::new_v4().simple());
    let mut conn = PgConnection::connect(url)
        .await
        .expect("Failed to connect to TEST_DATABASE_URL");
    conn.execute(format!(r#"CREATE DATABASE "{}""#, name).as_str())
        .await
        .expect("Failed to create test database");

    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (url, None),
    };
    let server = base.rsplit_once('/').map_or(base, |(server, _)| server);
    match query {
        Some(query) => format!("{}/{}?{}", server, name, query),
        None => format!("{}/{}", server, name),
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        // Random port; Postgres when TEST_DATABASE_URL is set, in-process store otherwise
        let mut config = BackofficeConfig::in_memory(0);
        if let Ok(url) = std::env::var("TEST_DATABASE_URL") {
            config.database.backend = DatabaseBackend::Postgres;
            config.database.url = Some(Secret::new(fresh_database(&url).await));
            config.database.max_connections = 5;
            config.database.min_connections = 1;
        }

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server by polling the health endpoint
        let client = Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub fn api(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.api(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, body: Value) -> Response {
        self.client
            .post(self.api(path))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put(&self, path: &str, body: Value) -> Response {
        self.client
            .put(self.api(path))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// POST and return the JSON body, asserting `expected` status.
    pub async fn post_ok(&self, path: &str, body: Value, expected: u16) -> Value {
        let response = self.post(path, body).await;
        let status = response.status().as_u16();
        let body: Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(status, expected, "POST {} returned {}", path, body);
        body
    }

    pub async fn get_json(&self, path: &str) -> Value {
        let response = self.get(path).await;
        let status = response.status();
        let body: Value = response.json().await.expect("Failed to parse JSON");
        assert!(status.is_success(), "GET {} returned {}: {}", path, status, body);
        body
    }

    pub async fn create_company(&self, name: &str) -> String {
        let body = self
            .post_ok("/party", json!({ "type": "3", "nameFull": name }), 201)
            .await;
        id_of(&body["party"])
    }

    pub async fn create_salesman(&self, name: &str) -> String {
        let body = self
            .post_ok(
                "/party",
                json!({ "type": "2", "nameFull": name, "address": "Depot road" }),
                201,
            )
            .await;
        id_of(&body["party"])
    }

    pub async fn create_customer(&self, name: &str, salesman_id: &str) -> String {
        let body = self
            .post_ok(
                "/party",
                json!({
                    "type": "1",
                    "nameFull": name,
                    "areaName": "North",
                    "salesmanID": salesman_id
                }),
                201,
            )
            .await;
        id_of(&body["party"])
    }

    pub async fn create_item(&self, company_id: &str, purchase: &str, sale: &str) -> String {
        let body = self
            .post_ok(
                "/item",
                json!({
                    "nameFull": "Soap 100g",
                    "purchasePrice": purchase,
                    "salePrice": sale,
                    "unitsInCarton": "12",
                    "companyID": company_id
                }),
                201,
            )
            .await;
        id_of(&body["item"])
    }

    pub async fn purchase(
        &self,
        company_id: &str,
        item_id: &str,
        com_qty: &str,
        bonus_qty: &str,
        payment: Value,
    ) -> Response {
        let mut body = json!({
            "companyID": company_id,
            "date": "2024-06-01",
            "lineItems": [{ "itemID": item_id, "comQty": com_qty, "bonusQty": bonus_qty }]
        });
        merge(&mut body, payment);
        self.post("/inventoryTransaction/purchaseInvoice", body).await
    }

    pub async fn sell(
        &self,
        customer_id: &str,
        item_id: &str,
        com_qty: &str,
        bonus_qty: &str,
        payment: Value,
    ) -> Response {
        let mut body = json!({
            "customerID": customer_id,
            "date": "2024-06-10",
            "lineItems": [{ "itemID": item_id, "comQty": com_qty, "bonusQty": bonus_qty }]
        });
        merge(&mut body, payment);
        self.post("/inventoryTransaction/salesInvoice", body).await
    }

    pub async fn return_items(&self, customer_id: &str, item_id: &str, com_qty: &str) -> Response {
        self.post(
            "/inventoryTransaction/customer/return",
            json!({
                "customerID": customer_id,
                "date": "2024-06-12",
                "lineItems": [{ "itemID": item_id, "comQty": com_qty, "bonusQty": "0" }]
            }),
        )
        .await
    }

    pub async fn stock(&self, item_id: &str) -> Value {
        self.get_json(&format!("/stock?itemID={}", item_id)).await["itemStock"].clone()
    }
}

/// Company, salesman, customer and one item priced 100/150.
pub struct Fixture {
    pub company: String,
    pub salesman: String,
    pub customer: String,
    pub item: String,
}

impl Fixture {
    pub async fn create(app: &TestApp) -> Self {
        let company = app.create_company("Acme Traders").await;
        let salesman = app.create_salesman("Sam").await;
        let customer = app.create_customer("Corner Shop", &salesman).await;
        let item = app.create_item(&company, "100", "150").await;
        Fixture {
            company,
            salesman,
            customer,
            item,
        }
    }
}

pub fn id_of(value: &Value) -> String {
    value["id"]
        .as_str()
        .expect("response carries an id")
        .to_string()
}

pub fn on_cash() -> Value {
    json!({ "paymentType": "ON_CASH" })
}

pub fn on_credit() -> Value {
    json!({ "paymentType": "ON_CREDIT" })
}

pub fn partial(cash: &str) -> Value {
    json!({ "paymentType": "PARTIAL", "cashAmount": cash })
}

fn merge(target: &mut Value, extra: Value) {
    if let (Some(target), Value::Object(extra)) = (target.as_object_mut(), extra) {
        target.extend(extra);
    }
}
