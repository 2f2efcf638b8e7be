//! Jellyfin webhook plugin payloads.
//!
//! The plugin can post JSON, a urlencoded form or a multipart form. Forms
//! either carry the JSON document in a `payload` field or send the payload
//! keys as individual fields.

use std::collections::HashMap;

use anibridge_library::{Error, Result, WebhookRequest};
use axum::body::Body;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::Form;
use serde_json::Value;

const MULTIPART: &str = "multipart/form-data";
const URLENCODED: &str = "application/x-www-form-urlencoded";

/// A parsed webhook payload with case-insensitive keys.
#[derive(Debug, Clone, Default)]
pub struct JellyfinWebhook {
    payload: HashMap<String, Value>,
}

impl JellyfinWebhook {
    pub fn from_map(map: serde_json::Map<String, Value>) -> Self {
        Self {
            payload: map
                .into_iter()
                .map(|(key, value)| (key.to_lowercase(), value))
                .collect(),
        }
    }

    /// Parse the body of a webhook request according to its content type.
    pub async fn from_request(request: &WebhookRequest) -> Result<Self> {
        let content_type = request
            .content_type
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();

        let value = if content_type.starts_with(MULTIPART) {
            let fields = multipart_fields(request).await?;
            form_payload(fields)?
        } else if content_type.starts_with(URLENCODED) {
            let fields = urlencoded_fields(request).await?;
            form_payload(fields)?
        } else {
            serde_json::from_slice(&request.body)
                .map_err(|e| Error::Webhook(format!("body is not valid JSON: {e}")))?
        };

        into_object(value).map(Self::from_map)
    }

    /// Trimmed string form of a payload value; empty values count as absent.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match self.payload.get(&key.to_lowercase())? {
            Value::Null => return None,
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };
        (!value.is_empty()).then_some(value)
    }

    pub fn notification_type(&self) -> Option<String> {
        self.get("NotificationType")
    }

    pub fn user_id(&self) -> Option<String> {
        self.get("UserId")
    }

    pub fn username(&self) -> Option<String> {
        self.get("NotificationUsername")
            .or_else(|| self.get("Username"))
    }

    pub fn item_type(&self) -> Option<String> {
        self.get("ItemType")
    }

    pub fn item_id(&self) -> Option<String> {
        self.get("ItemId")
    }

    pub fn series_id(&self) -> Option<String> {
        self.get("SeriesId")
    }

    /// Id of the movie or show the event belongs to.
    pub fn top_level_item_id(&self) -> Option<String> {
        let series_id = self.series_id();
        let is_child = self
            .item_type()
            .is_some_and(|t| t.eq_ignore_ascii_case("episode") || t.eq_ignore_ascii_case("season"));

        if is_child && series_id.is_some() {
            return series_id;
        }
        self.item_id().or(series_id)
    }
}

/// Build the payload of a form body.
fn form_payload(fields: Vec<(String, String)>) -> Result<Value> {
    if let Some((_, payload)) = fields
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("payload"))
    {
        return serde_json::from_str(payload)
            .map_err(|e| Error::Webhook(format!("payload field is not valid JSON: {e}")));
    }

    Ok(Value::Object(
        fields
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect(),
    ))
}

/// Unwrap a JSON object, decoding one level of string-encoded JSON.
fn into_object(value: Value) -> Result<serde_json::Map<String, Value>> {
    let value = match value {
        Value::String(inner) => serde_json::from_str(&inner)
            .map_err(|e| Error::Webhook(format!("payload string is not valid JSON: {e}")))?,
        other => other,
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(Error::Webhook("payload must be a JSON object".into())),
    }
}

fn rebuild_request(request: &WebhookRequest) -> Result<Request> {
    axum::http::Request::builder()
        .method(Method::POST)
        .header(CONTENT_TYPE, request.content_type.as_deref().unwrap_or_default())
        .body(Body::from(request.body.clone()))
        .map_err(|e| Error::Webhook(format!("invalid request: {e}")))
}

async fn urlencoded_fields(request: &WebhookRequest) -> Result<Vec<(String, String)>> {
    let req = rebuild_request(request)?;
    let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, &())
        .await
        .map_err(|e| Error::Webhook(format!("invalid form body: {e}")))?;
    Ok(fields)
}

async fn multipart_fields(request: &WebhookRequest) -> Result<Vec<(String, String)>> {
    let req = rebuild_request(request)?;
    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(|e| Error::Webhook(format!("invalid multipart body: {e}")))?;

    let mut fields = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Webhook(format!("invalid multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = field
            .text()
            .await
            .map_err(|e| Error::Webhook(format!("invalid multipart field '{name}': {e}")))?;
        fields.push((name, value));
    }
    Ok(fields)
}
