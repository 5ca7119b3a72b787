pub mod docs;
pub mod latency;
pub mod middleware;
pub mod routes;
