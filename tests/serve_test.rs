//! End-to-end serving behavior: static fallback, 404 cascade, handlers,
//! templates, cookies and redirects.

use axum::http::StatusCode;
use plinth::http::{Cookie, SameSite};
use plinth::render::RenderData;
use plinth::RouteTable;

mod common;
use common::{client, spawn_server, TestSite};

#[tokio::test]
async fn root_falls_back_to_index_html() {
    let site = TestSite::new();
    site.write_static("index.html", "<h1>home</h1>");
    let (addr, _shutdown) = spawn_server(site.config(), RouteTable::new()).await;

    let res = client()
        .get(format!("http://{}/", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()["content-type"].to_str().unwrap(),
        "text/html; charset=utf-8"
    );
    assert_eq!(res.text().await.unwrap(), "<h1>home</h1>");
}

#[tokio::test]
async fn extensionless_path_appends_html() {
    let site = TestSite::new();
    site.write_static("about.html", "about page");
    let (addr, _shutdown) = spawn_server(site.config(), RouteTable::new()).await;

    let res = client()
        .get(format!("http://{}/about", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "about page");
}

#[tokio::test]
async fn missing_file_without_404_page_is_a_bare_404() {
    let site = TestSite::new();
    let (addr, _shutdown) = spawn_server(site.config(), RouteTable::new()).await;

    let res = client()
        .get(format!("http://{}/nothing-here", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    assert!(res.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_file_renders_the_404_page_when_present() {
    let site = TestSite::new();
    site.write_static("404.html", "custom not found page");
    let (addr, _shutdown) = spawn_server(site.config(), RouteTable::new()).await;

    let res = client()
        .get(format!("http://{}/nothing-here", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.text().await.unwrap(), "custom not found page");
}

#[tokio::test]
async fn registered_404_handler_takes_precedence_over_the_page() {
    let site = TestSite::new();
    site.write_static("404.html", "page");
    let mut routes = RouteTable::new();
    routes.get_not_found(|_ctx, r| async move {
        Ok(r.raw("handler says no", "text/plain", StatusCode::NOT_FOUND))
    });
    let (addr, _shutdown) = spawn_server(site.config(), routes).await;

    let res = client()
        .get(format!("http://{}/nothing-here", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.text().await.unwrap(), "handler says no");
}

#[tokio::test]
async fn whitelist_never_serves_files_added_after_startup() {
    let site = TestSite::new();
    site.write_static("index.html", "home");
    let (addr, _shutdown) = spawn_server(site.config(), RouteTable::new()).await;

    site.write_static("late.html", "late");
    let res = client()
        .get(format!("http://{}/late.html", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn lazy_mode_serves_files_added_after_startup() {
    let site = TestSite::new();
    let mut config = site.config();
    config.site.whitelist_paths = false;
    let (addr, _shutdown) = spawn_server(config, RouteTable::new()).await;

    site.write_static("late.html", "late but served");
    let res = client()
        .get(format!("http://{}/late.html", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "late but served");
}

#[tokio::test]
async fn handler_reads_query_params_and_returns_json() {
    let site = TestSite::new();
    let mut routes = RouteTable::new();
    routes.on_get("/api/echo", |ctx, r| async move {
        let name = ctx.param("name").unwrap_or("nobody").to_string();
        let body = serde_json::json!({ "name": name }).to_string();
        Ok(r.raw(body, "application/json", StatusCode::OK))
    });
    let (addr, _shutdown) = spawn_server(site.config(), routes).await;

    let res = client()
        .get(format!("http://{}/api/echo?name=ada&name=ignored", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["name"], "ada");
}

#[tokio::test]
async fn post_form_data_is_rendered_escaped() {
    let site = TestSite::new();
    site.write("greet.html", "Hello {{ name }}");
    let mut routes = RouteTable::new();
    routes.on_post("/submit", |mut ctx, r| async move {
        let data = ctx.post_data().await?;
        let name = data.first("name").unwrap_or("nobody").to_string();
        r.render("greet.html", RenderData::new().with("name", name), StatusCode::OK)
            .await
    });
    let (addr, _shutdown) = spawn_server(site.config(), routes).await;

    let res = client()
        .post(format!("http://{}/submit", addr))
        .form(&[("name", "A&B")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "Hello A&#38;B");
}

#[tokio::test]
async fn no_escape_renders_the_raw_value() {
    let site = TestSite::new();
    site.write("greet.html", "Hello {{ name }}");
    let mut routes = RouteTable::new();
    routes.on_get("/greet", |_ctx, r| async move {
        r.render(
            "greet.html",
            RenderData::new().with("name", "A&B").no_escape(),
            StatusCode::OK,
        )
        .await
    });
    let (addr, _shutdown) = spawn_server(site.config(), routes).await;

    let res = client()
        .get(format!("http://{}/greet", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "Hello A&B");
}

#[tokio::test]
async fn redirect_issues_302_with_location() {
    let site = TestSite::new();
    let mut routes = RouteTable::new();
    routes.on_get("/old", |_ctx, r| async move { Ok(r.redirect("/new")) });
    let (addr, _shutdown) = spawn_server(site.config(), routes).await;

    let res = client()
        .get(format!("http://{}/old", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 302);
    assert_eq!(res.headers()["location"].to_str().unwrap(), "/new");
}

#[tokio::test]
async fn cookies_round_trip_through_handlers() {
    let site = TestSite::new();
    let mut routes = RouteTable::new();
    routes.on_get("/login", |_ctx, r| async move {
        let cookie = Cookie::new("session", "tok=en")
            .path("/")
            .same_site(SameSite::Lax);
        Ok(r
            .raw("logged in", "text/plain", StatusCode::OK)
            .set_cookie(&cookie))
    });
    routes.on_get("/whoami", |ctx, r| async move {
        let session = ctx.cookie("session").unwrap_or_default();
        Ok(r.raw(session, "text/plain", StatusCode::OK))
    });
    let (addr, _shutdown) = spawn_server(site.config(), routes).await;

    let res = client()
        .get(format!("http://{}/login", addr))
        .send()
        .await
        .unwrap();
    let set_cookie = res.headers()["set-cookie"].to_str().unwrap().to_string();
    assert_eq!(set_cookie, "session=tok=en; Path=/; HttpOnly; SameSite=Lax");

    let res = client()
        .get(format!("http://{}/whoami", addr))
        .header("cookie", "session=tok=en")
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "tok=en");
}

#[tokio::test]
async fn unknown_methods_dispatch_through_get_routes() {
    let site = TestSite::new();
    let mut routes = RouteTable::new();
    routes.on_get("/thing", |_ctx, r| async move {
        Ok(r.raw("via get table", "text/plain", StatusCode::OK))
    });
    let (addr, _shutdown) = spawn_server(site.config(), routes).await;

    let res = client()
        .put(format!("http://{}/thing", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "via get table");
}

#[tokio::test]
async fn handler_error_becomes_a_500_response() {
    let site = TestSite::new();
    let mut routes = RouteTable::new();
    routes.on_get("/broken", |_ctx, r| async move {
        // Render of a file that does not exist surfaces as an error.
        r.render("missing.html", RenderData::new(), StatusCode::OK)
            .await
    });
    let (addr, _shutdown) = spawn_server(site.config(), routes).await;

    let res = client()
        .get(format!("http://{}/broken", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
}

#[tokio::test]
async fn traversal_requests_stay_inside_the_root() {
    let site = TestSite::new();
    site.write_static("index.html", "home");
    std::fs::write(site.dir.path().join("secret.txt"), "secret").unwrap();
    let (addr, _shutdown) = spawn_server(site.config(), RouteTable::new()).await;

    let res = client()
        .get(format!("http://{}/..%2f..%2fsecret.txt", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
}
