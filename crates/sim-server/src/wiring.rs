use axum::{routing::get, Router};
use runtime::SessionHandle;

pub fn build_app(session: SessionHandle) -> Router {
    api::app(session).route("/health", get(healthcheck))
}

async fn healthcheck() -> &'static str {
    "ok"
}
