//! End-to-end tests: real server, real content tree, reqwest client.

use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

use common::{client, start_server, Site};

#[tokio::test]
async fn test_markdown_then_template() {
    let site = Site::new();
    site.content("1/index.md", "---\ntitle: Hi\n---\nbody")
        .content("2/index.jinja", "{{ page.html|safe }}<h1>{{ page.data.title }}</h1>");
    let server = start_server(site.config()).await;

    let res = client().get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/html; charset=utf-8");
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "<p>body</p>\n<h1>Hi</h1>");
}

#[tokio::test]
async fn test_missing_page_is_404() {
    let site = Site::new();
    site.content("1/about.md", "about");
    let server = start_server(site.config()).await;

    let res = client().get(server.url("/missing")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "404 - Page Not Found");
}

#[tokio::test]
async fn test_asset_path_never_reaches_layers() {
    let site = Site::new();
    site.content("1/report.pdf.md", "---\nleak: true\n---\n")
        .content("1/index.md", "home");
    let server = start_server(site.config()).await;

    let res = client().get(server.url("/report.pdf")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "404 - File Not Found");
}

#[tokio::test]
async fn test_page_without_html_is_json() {
    let site = Site::new();
    site.content("1/blog.md", "---\nsection: blog\n---\n")
        .content("2/blog.rhai", "fn get(req, res, session) { this.slug = req.path; }");
    let server = start_server(site.config()).await;

    let res = client().get(server.url("/blog/first")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/json");
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["data"], json!({"section": "blog"}));
    assert_eq!(page["slug"], json!("/blog/first"));
}

#[tokio::test]
async fn test_stop_signal_ends_cascade() {
    let site = Site::new();
    site.content("1/index.html", "<header>")
        .content("2/index.rhai", "fn all(req, res, session) { true }")
        .content("3/index.html", "<footer>");
    let server = start_server(site.config()).await;

    let res = client().get(server.url("/")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "<header>");
}

#[tokio::test]
async fn test_script_redirect() {
    let site = Site::new();
    site.content(
        "1/account.rhai",
        r#"fn get(req, res, session) { res.redirect("/login"); true }"#,
    );
    let server = start_server(site.config()).await;

    let res = client().get(server.url("/account")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "/login");
}

#[tokio::test]
async fn test_post_body_reaches_script() {
    let site = Site::new();
    site.content(
        "1/echo.rhai",
        "fn post(req, res, session) { res.json(#{ got: req.body.n, method: req.method }); }",
    );
    let server = start_server(site.config()).await;

    let res = client()
        .post(server.url("/echo"))
        .json(&json!({"n": 7}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"got": 7, "method": "POST"}));

    let res = client()
        .post(server.url("/echo"))
        .header("content-type", "application/json")
        .body("{broken")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_multipart_upload_reaches_script() {
    let site = Site::new();
    site.content(
        "1/upload.rhai",
        "fn post(req, res, session) { res.json(#{ title: req.body.title, file: req.files.doc.filename, size: req.files.doc.size }); }",
    );
    let server = start_server(site.config()).await;

    let body = concat!(
        "--XX\r\n",
        "Content-Disposition: form-data; name=\"title\"\r\n\r\n",
        "Hello\r\n",
        "--XX\r\n",
        "Content-Disposition: form-data; name=\"doc\"; filename=\"a.txt\"\r\n",
        "Content-Type: text/plain\r\n\r\n",
        "abc\r\n",
        "--XX--\r\n",
    );
    let res = client()
        .post(server.url("/upload"))
        .header("content-type", "multipart/form-data; boundary=XX")
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let got: Value = res.json().await.unwrap();
    assert_eq!(got, json!({"title": "Hello", "file": "a.txt", "size": 3}));
}

#[tokio::test]
async fn test_page_json_keeps_key_order() {
    let site = Site::new();
    site.content("1/index.md", "---\nzeta: 1\nalpha: 2\n---\n");
    let server = start_server(site.config()).await;

    let text = client().get(server.url("/")).send().await.unwrap().text().await.unwrap();
    let zeta = text.find("\"zeta\"").unwrap();
    let alpha = text.find("\"alpha\"").unwrap();
    assert!(zeta < alpha, "{text}");
}

#[tokio::test]
async fn test_script_error_is_500() {
    let site = Site::new();
    site.content("1/index.rhai", "fn get(req, res, session) {");
    let server = start_server(site.config()).await;

    let res = client().get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await.unwrap(), "500 - Internal Server Error");
}

#[tokio::test]
async fn test_static_assets_served_first() {
    let site = Site::new();
    site.asset("css/site.css", "body{}")
        .content("1/index.md", "home");
    let server = start_server(site.config()).await;

    let res = client().get(server.url("/css/site.css")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "body{}");

    // directories fall through to the cascade
    let res = client().get(server.url("/css")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["html"], json!("<p>home</p>\n"));
}
