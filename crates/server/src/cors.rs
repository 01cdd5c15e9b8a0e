use axum::http::{header, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Cross-origin access for the configured origins. `*` allows every origin.
pub fn build_cors_layer(cors_origins: Vec<String>) -> CorsLayer {
    let allow_all_origins = cors_origins.iter().any(|o| o == "*");

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            if allow_all_origins {
                return true;
            }
            origin
                .to_str()
                .map(|origin| {
                    cors_origins
                        .iter()
                        .any(|allowed| origin_matches(allowed, origin))
                })
                .unwrap_or(false)
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Exact match, except that a loopback entry without a port accepts any port.
fn origin_matches(allowed: &str, origin: &str) -> bool {
    let allowed = allowed.trim_end_matches('/');
    let origin = origin.trim_end_matches('/');
    if allowed == origin {
        return true;
    }
    match origin.rsplit_once(':') {
        Some((base, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            base == allowed && is_loopback(allowed)
        }
        _ => false,
    }
}

fn is_loopback(origin: &str) -> bool {
    matches!(
        origin.split_once("://").map(|(_, host)| host),
        Some("localhost" | "127.0.0.1")
    )
}

#[cfg(test)]
#[path = "tests/cors_tests.rs"]
mod tests;
