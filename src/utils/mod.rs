pub mod cookies;
pub mod ga4_report;
pub mod middleware;
pub mod period;
pub mod session_codec;
