/*
 * Request-authorization layer of a stateless API: bearer token validation,
 * claims derivation and caching, and the ordered middleware pipeline that
 * surrounds the business handlers.
 */
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod services;
pub mod state;
