// ============================================================================
// MODELS
// ============================================================================
//
// One module per PostgreSQL table (SeaORM entities), plus the API DTOs.
//
//   - portfolio : one SimCash balance record per user
//   - trade     : simulated positions (open/closed)
//   - dto       : request/response shapes for the HTTP layer
//   - health    : health check response
//
// Identity is external: user_id is an opaque UUID string resolved from the
// bearer token, there is no users table in this service.
//
// ============================================================================

pub mod dto;
pub mod health;
pub mod portfolio;
pub mod trade;
