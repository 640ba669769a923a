/*
 * Responsibility
 * - Cross-cutting stages and their fixed composition order (pipeline)
 */
pub mod auth;
pub mod cors;
pub mod headers;
pub mod http;
pub mod logger;
pub mod pipeline;
