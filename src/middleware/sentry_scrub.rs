use sentry::protocol::{Event, Request as SentryRequest};
use std::sync::Arc;

/// Field and header names whose values must never leave the process
const SENSITIVE_FIELDS: &[&str] = &[
    "authorization",
    "x-goog-api-key",
    "api_key",
    "access_key",
    "secret",
    "cookie",
    "token",
];

fn is_sensitive_field(field_name: &str) -> bool {
    let field_lower = field_name.to_lowercase();
    SENSITIVE_FIELDS
        .iter()
        .any(|sensitive| field_lower.contains(sensitive))
}

fn scrub_request(request: &mut SentryRequest) {
    let keys_to_scrub: Vec<String> = request
        .headers
        .keys()
        .filter(|k| is_sensitive_field(k))
        .cloned()
        .collect();

    for key in keys_to_scrub {
        request.headers.insert(key, "[REDACTED]".to_string());
    }

    if let Some(query_string) = &request.query_string {
        if is_sensitive_field(query_string) {
            request.query_string = Some("[REDACTED]".to_string());
        }
    }

    // multipart image uploads are never useful in an event
    if request.data.is_some() {
        request.data = Some("[REDACTED]".to_string());
    }
}

/// Strips credentials and uploaded payloads from Sentry events before sending
pub fn scrub_sensitive_data(mut event: Event<'static>) -> Option<Event<'static>> {
    if let Some(request) = &mut event.request {
        scrub_request(request);
    }

    event.extra.retain(|k, _| !is_sensitive_field(k));

    for breadcrumb in event.breadcrumbs.values.iter_mut() {
        breadcrumb.data.retain(|k, _| !is_sensitive_field(k));
    }

    Some(event)
}

pub fn create_before_send() -> Arc<dyn Fn(Event<'static>) -> Option<Event<'static>> + Send + Sync> {
    Arc::new(scrub_sensitive_data)
}
