pub mod list;
pub mod product;

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{Html, Redirect, Response},
    routing::get,
    Extension, Router,
};

use crate::api::AppState;
use crate::controllers::products::LIST_URL;
use crate::session::{set_cookie_header, SessionId};

use list::list_products;
use product::{product_form, product_post};

pub fn products_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to(LIST_URL) }))
        .route("/products", get(list_products))
        .route("/products/product", get(product_form).post(product_post))
        .layer(Extension(state))
}

/// Opens or resumes the session named by the request cookie.
fn resolve_session(state: &AppState, headers: &HeaderMap) -> (SessionId, bool) {
    state.sessions.resolve(headers)
}

fn with_session_cookie(mut response: Response, session: SessionId, created: bool) -> Response {
    if created {
        if let Some(cookie) = set_cookie_header(session) {
            response.headers_mut().insert(header::SET_COOKIE, cookie);
        }
    }
    response
}

fn internal_error_page() -> (StatusCode, Html<&'static str>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html("<h1>Error interno del servidor</h1>"),
    )
}
