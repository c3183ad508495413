use askama::Template;
use axum::{
    extract::Extension,
    http::HeaderMap,
    response::{Html, Response},
};

use crate::api::AppState;
use crate::middleware::logging::{to_response, ApiError};
use crate::views::ProductListTemplate;

use super::{internal_error_page, resolve_session, with_session_cookie};

pub async fn list_products(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
) -> Response {
    let (session, created) = resolve_session(&state, &headers);
    let message = state.sessions.take_flash(session);

    let response = match state.products.get_products().await {
        Ok(products) => {
            let page = ProductListTemplate {
                products: &products,
                message: message.as_deref(),
            };
            match page.render() {
                Ok(html) => to_response(Html(html), Ok(())),
                Err(err) => {
                    to_response(internal_error_page(), Err(ApiError::Render(err.to_string())))
                }
            }
        }
        Err(err) => to_response(internal_error_page(), Err(ApiError::DbError(err.to_string()))),
    };

    with_session_cookie(response, session, created)
}
