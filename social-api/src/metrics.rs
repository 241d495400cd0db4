//! Prometheus metrics for the social API.
//!
//! Counters live in the default registry and are rendered by the
//! `/metrics` endpoint in text format.

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

pub static POSTS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("social_api_posts_created_total", "Posts created").unwrap()
});

pub static POSTS_SCHEDULED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "social_api_posts_scheduled_total",
        "Posts created with deferred publication"
    )
    .unwrap()
});

pub static POSTS_PUBLISHED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "social_api_posts_published_total",
        "Scheduled posts flipped to visible by the deferred trigger"
    )
    .unwrap()
});

pub static LIKES_CREATED: Lazy<IntCounter> =
    Lazy::new(|| register_int_counter!("social_api_likes_created_total", "Likes created").unwrap());

pub static FOLLOWS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("social_api_follows_created_total", "Follow edges created").unwrap()
});

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_register_and_increment() {
        let before = POSTS_CREATED.get();
        POSTS_CREATED.inc();
        assert_eq!(POSTS_CREATED.get(), before + 1);
    }
}
