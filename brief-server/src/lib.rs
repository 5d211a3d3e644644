//! # QuickBrief Server
//!
//! HTTP front end for the QuickBrief pipeline.
//!
//! ## Endpoints
//!
//! - `POST /v1/brief` - Classify a query and answer it in the matching mode
//! - `POST /v1/generate` - Plain multi-turn chat over a caller-owned transcript
//! - `POST /v1/mail/draft` - Draft an email from a meeting summary
//! - `POST /v1/mail/send` - Send a confirmed email
//! - `GET /health` - Health check endpoint
//! - `GET /metrics` - Prometheus metrics endpoint
//!
//! Drafting and sending are separate calls. Nothing is mailed unless a client
//! asks for it.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;

pub use error::AppError;
pub use routes::create_router;
pub use server::BriefServer;
pub use state::AppState;
