use askama::Template;
use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Extension, Form, Query,
    },
    http::HeaderMap,
    response::{Html, Redirect, Response},
};

use crate::api::AppState;
use crate::controllers::products::{form::Params, ControllerError, Outcome, ProductController};
use crate::middleware::logging::{to_response, ApiError};
use crate::session::SessionId;
use crate::views::ProductFormTemplate;

use super::{internal_error_page, resolve_session, with_session_cookie};

pub async fn product_form(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    query: Result<Query<Params>, QueryRejection>,
) -> Response {
    match query {
        Ok(Query(query)) => respond(&state, &headers, &query, None).await,
        Err(rejection) => reject(&state, &headers, rejection.body_text()),
    }
}

pub async fn product_post(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    query: Result<Query<Params>, QueryRejection>,
    body: Result<Form<Params>, FormRejection>,
) -> Response {
    match (query, body) {
        (Ok(Query(query)), Ok(Form(body))) => respond(&state, &headers, &query, Some(&body)).await,
        (Err(rejection), _) => reject(&state, &headers, rejection.body_text()),
        (_, Err(rejection)) => reject(&state, &headers, rejection.body_text()),
    }
}

/// Parameters that could not be decoded end like any other invalid request.
fn reject(state: &AppState, headers: &HeaderMap, reason: String) -> Response {
    let (session, created) = resolve_session(state, headers);
    let outcome = ProductController::abort(ControllerError::MalformedRequest(reason));
    finish(state, session, created, outcome)
}

async fn respond(
    state: &AppState,
    headers: &HeaderMap,
    query: &Params,
    body: Option<&Params>,
) -> Response {
    let (session, created) = resolve_session(state, headers);
    let outcome = state.product_controller.run(session, query, body).await;
    finish(state, session, created, outcome)
}

fn finish(state: &AppState, session: SessionId, created: bool, outcome: Outcome) -> Response {
    let response = match outcome {
        Outcome::Render(view) => match (ProductFormTemplate { view: &view }).render() {
            Ok(html) => to_response(Html(html), Ok(())),
            Err(err) => to_response(internal_error_page(), Err(ApiError::Render(err.to_string()))),
        },
        Outcome::Redirect { url, message } => {
            state.sessions.set_flash(session, message);
            to_response(Redirect::to(url), Ok(()))
        }
    };

    with_session_cookie(response, session, created)
}
