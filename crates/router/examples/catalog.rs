use http::{Method, Request, StatusCode};
use micro_router::extract::{Inject, Query};
use micro_router::responder::Json;
use micro_router::router::RouteCollection;
use micro_router::router::filter::header;
use micro_router::{HandlerError, Micro, PathParams, RequestContext, handler_fn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Clone)]
struct Catalog(Arc<HashMap<&'static str, Vec<&'static str>>>);

#[derive(Deserialize)]
struct Paging {
    page: Option<usize>,
}

#[derive(Serialize)]
struct Product {
    category: String,
    id: u32,
    name: &'static str,
}

fn access_log(ctx: &mut RequestContext) -> Result<(), HandlerError> {
    info!(method = %ctx.method(), path = ctx.path(), "incoming request");
    ctx.next()?;
    info!(status = ?ctx.status(), written = ctx.written(), "request done");
    Ok(())
}

fn require_token(ctx: &mut RequestContext) -> Result<(), HandlerError> {
    if !ctx.headers().contains_key("x-token") {
        ctx.set_status(StatusCode::UNAUTHORIZED);
    }
    ctx.next()
}

fn home(_ctx: &mut RequestContext) -> &'static str {
    "welcome to the catalog\n"
}

fn list(
    _ctx: &mut RequestContext,
    params: PathParams,
    Inject(catalog): Inject<Catalog>,
    Query(paging): Query<Paging>,
) -> Option<String> {
    let products = catalog.0.get(params.get("category")?)?;
    let page = paging.page.unwrap_or(1);
    Some(format!("page {page}: {}\n", products.join(", ")))
}

fn show(_ctx: &mut RequestContext, params: PathParams, Inject(catalog): Inject<Catalog>) -> Option<Json<Product>> {
    let category = params.get("category")?;
    let id = params.get("productId")?.parse::<u32>().ok()?;
    let name = *catalog.0.get(category)?.get(usize::try_from(id).ok()?)?;
    Some(Json(Product { category: category.to_owned(), id, name }))
}

fn delete(_ctx: &mut RequestContext) -> StatusCode {
    StatusCode::NO_CONTENT
}

fn not_found(ctx: &mut RequestContext) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("nothing at {}\n", ctx.path()))
}

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let catalog = HashMap::from([("books", vec!["dune", "emma", "ulysses"]), ("music", vec!["kind of blue"])]);

    let mut products = RouteCollection::new();
    products.get("/:category", handler_fn(list)).name("list");
    products
        .get("/:category/:productId", handler_fn(show))
        .name("show")
        .assert("productId", "\\d+")
        .expect("product id assertion is a valid pattern");

    let mut admin = RouteCollection::new();
    admin.middleware("/", handler_fn(require_token));
    admin.delete("/products/:productId", handler_fn(delete)).with(header(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    ));

    let mut app = Micro::new();
    app.register(Catalog(Arc::new(catalog))).expect("application is not booted yet");
    app.middleware("/", handler_fn(access_log)).expect("application is not booted yet");
    app.get("/", handler_fn(home)).expect("application is not booted yet");
    app.mount("/catalog", products).expect("application is not booted yet");
    app.mount("/admin", admin).expect("application is not booted yet");
    app.error(404, handler_fn(not_found)).expect("404 is an error status");

    let table = app.boot().expect("routes are valid");
    for route in table.routes() {
        info!(name = route.name(), pattern = route.pattern().as_str(), methods = ?route.methods(), "route");
    }

    let requests = [
        (Method::GET, "/"),
        (Method::GET, "/catalog/books?page=2"),
        (Method::GET, "/catalog/books/1"),
        (Method::GET, "/catalog/books/one"),
        (Method::GET, "/catalog/films"),
        (Method::DELETE, "/admin/products/1"),
    ];
    for (method, path) in requests {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(())
            .expect("request is valid");
        let response = app.handle_request(request).expect("application is booted");
        println!("{path} -> {} {}", response.status(), String::from_utf8_lossy(response.body()));
    }
}
