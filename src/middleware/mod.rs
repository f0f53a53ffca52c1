mod http_logger;
pub mod sentry_scrub;

pub use http_logger::http_logging_middleware;
