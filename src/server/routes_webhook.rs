use anibridge_library::{WebhookOutcome, WebhookRequest};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    Json,
};

use crate::server::error::AppError;
use crate::server::AppContext;

/// Forward the raw request to the provider and answer with its decision.
pub async fn handle_webhook(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookOutcome>, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let request = WebhookRequest::new(content_type, body);
    let outcome = ctx.provider.parse_webhook(&request).await?;

    if outcome.matched {
        tracing::info!(keys = ?outcome.keys, "Webhook requests a sync");
    }
    Ok(Json(outcome))
}
