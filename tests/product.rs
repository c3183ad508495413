use std::time::Duration;

use regex::Regex;
use reqwest::{header, redirect::Policy, Client, StatusCode};
use sea_orm::{ConnectOptions, Database};
use tokio;

use product_maintenance::build_app;

struct TestApp {
    base: String,
    client: Client,
    cookie: Option<String>,
}

impl TestApp {
    async fn spawn() -> TestApp {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(Duration::from_secs(600))
            .sqlx_logging(false);
        let db = Database::connect(options)
            .await
            .expect("Failed to open in-memory database");
        let app = build_app(db).await.expect("Failed to create schema");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });

        let client = Client::builder()
            .redirect(Policy::none())
            .build()
            .expect("Failed to build client");

        TestApp {
            base: format!("http://{}", addr),
            client,
            cookie: None,
        }
    }

    fn remember_cookie(&mut self, response: &reqwest::Response) {
        if let Some(value) = response.headers().get(header::SET_COOKIE) {
            let value = value.to_str().expect("Cookie is not ascii");
            let pair = value.split(';').next().expect("Empty cookie");
            self.cookie = Some(pair.to_string());
        }
    }

    async fn get(&mut self, path: &str) -> reqwest::Response {
        let mut request = self.client.get(format!("{}{}", self.base, path));
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie.clone());
        }
        let response = request.send().await.expect("Failed to send GET");
        self.remember_cookie(&response);
        response
    }

    async fn post(&mut self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        let mut request = self.client.post(format!("{}{}", self.base, path)).form(form);
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie.clone());
        }
        let response = request.send().await.expect("Failed to send POST");
        self.remember_cookie(&response);
        response
    }

    /// Loads the form page and returns the anti-forgery token it carries.
    async fn form_token(&mut self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.text().await.expect("Failed to read form body");
        extract_token(&body)
    }

    async fn list_page(&mut self) -> String {
        let response = self.get("/products").await;
        assert_eq!(response.status(), StatusCode::OK);
        response.text().await.expect("Failed to read list body")
    }
}

fn extract_token(body: &str) -> String {
    let re = Regex::new(r#"name="token" value="([0-9a-f]{64})""#).unwrap();
    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .expect("Token not found in form")
}

fn assert_redirects_to_list(response: &reqwest::Response) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
        Some("/products")
    );
}

fn lamp_form<'a>(token: &'a str, product_id: &'a str, name: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("productId", product_id),
        ("token", token),
        ("productName", name),
        ("productDescription", "Desk lamp"),
        ("productPrice", "10.5"),
        ("productImgUrl", "lamp.png"),
        ("productStatus", "ACT"),
    ]
}

#[tokio::test]
async fn test_insert_update_delete_product() {
    let mut app = TestApp::spawn().await;

    // Step 1: Insert
    let token = app.form_token("/products/product?mode=INS").await;
    let response = app
        .post("/products/product?mode=INS", &lamp_form(&token, "0", "Lamp"))
        .await;
    assert_redirects_to_list(&response);

    let list = app.list_page().await;
    assert!(list.contains("Producto creado exitosamente"));
    assert!(list.contains("Lamp"));
    assert!(list.contains("10.50"));

    // Flash is shown only once
    let list = app.list_page().await;
    assert!(!list.contains("Producto creado exitosamente"));

    // Step 2: Update
    let token = app.form_token("/products/product?mode=UPD&productId=1").await;
    let response = app
        .post(
            "/products/product?mode=UPD&productId=1",
            &lamp_form(&token, "1", "Floor lamp"),
        )
        .await;
    assert_redirects_to_list(&response);
    let list = app.list_page().await;
    assert!(list.contains("Producto actualizado exitosamente"));
    assert!(list.contains("Floor lamp"));

    // Step 3: Display shows the stored row
    let response = app.get("/products/product?mode=DSP&productId=1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Detalle de 1 Floor lamp"));
    assert!(!body.contains("btnConfirmar"));

    // Step 4: Delete
    let token = app.form_token("/products/product?mode=DEL&productId=1").await;
    let response = app
        .post(
            "/products/product?mode=DEL&productId=1",
            &[("productId", "1"), ("token", token.as_str())],
        )
        .await;
    assert_redirects_to_list(&response);
    let list = app.list_page().await;
    assert!(list.contains("Producto eliminado exitosamente"));
    assert!(!list.contains("Floor lamp"));
}

#[tokio::test]
async fn test_validation_errors_render_inline() {
    let mut app = TestApp::spawn().await;

    let token = app.form_token("/products/product?mode=INS").await;
    let response = app
        .post(
            "/products/product?mode=INS",
            &[
                ("token", token.as_str()),
                ("productName", ""),
                ("productDescription", "Desk lamp"),
                ("productPrice", "0"),
                ("productImgUrl", "lamp.png"),
                ("productStatus", "XYZ"),
            ],
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("El nombre del producto es requerido"));
    assert!(body.contains("El precio del producto es requerido y debe ser un valor mayor a cero"));
    assert!(body.contains("El estado del producto es invalido"));
    assert!(!body.contains("La imagen del producto es requerida"));

    // A fresh token is issued with the re-rendered form
    assert_ne!(extract_token(&body), token);

    let list = app.list_page().await;
    assert!(!list.contains("mode=UPD&productId="));
}

#[tokio::test]
async fn test_forged_token_is_rejected() {
    let mut app = TestApp::spawn().await;

    let token = app.form_token("/products/product?mode=INS").await;
    let response = app
        .post("/products/product?mode=INS", &lamp_form(&token, "0", "Lamp"))
        .await;
    assert_redirects_to_list(&response);
    app.list_page().await;

    app.form_token("/products/product?mode=UPD&productId=1").await;
    let response = app
        .post(
            "/products/product?mode=UPD&productId=1",
            &lamp_form("forged", "1", "Hacked"),
        )
        .await;
    assert_redirects_to_list(&response);

    let list = app.list_page().await;
    assert!(list.contains("Algo salió mal, intenta de nuevo."));
    assert!(!list.contains("Hacked"));
    assert!(list.contains("Lamp"));
}

#[tokio::test]
async fn test_bad_query_parameters_redirect() {
    let mut app = TestApp::spawn().await;

    let response = app.get("/products/product").await;
    assert_redirects_to_list(&response);

    let response = app.get("/products/product?mode=UPD").await;
    assert_redirects_to_list(&response);
    let list = app.list_page().await;
    assert!(list.contains("ID de producto no proporcionado"));

    let response = app.get("/products/product?mode=DSP&productId=abc").await;
    assert_redirects_to_list(&response);

    let response = app.get("/products/product?mode=DSP&productId=999").await;
    assert_redirects_to_list(&response);
    let list = app.list_page().await;
    assert!(list.contains("No se encontró el Producto con ID: 999"));
}

#[tokio::test]
async fn test_undecodable_post_body_redirects() {
    let mut app = TestApp::spawn().await;
    app.form_token("/products/product?mode=INS").await;

    let response = app
        .client
        .post(format!("{}/products/product?mode=INS", app.base))
        .header(header::COOKIE, app.cookie.clone().expect("Session cookie not set"))
        .header(header::CONTENT_TYPE, "text/plain")
        .body("productName=Lamp")
        .send()
        .await
        .expect("Failed to send POST");
    assert_redirects_to_list(&response);

    let list = app.list_page().await;
    assert!(list.contains("Algo salió mal, intenta de nuevo."));
    assert!(!list.contains("Lamp"));
}
