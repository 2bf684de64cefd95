//! The embedded label form.

use axum::response::Html;

static INDEX_HTML: &str = include_str!("index.html");

/// GET / - Serve the label form.
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}
