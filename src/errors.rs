use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use rust_decimal::Decimal;
use sea_orm::DbErr;
use thiserror::Error;

/// Everything the ledger can refuse to do, plus storage failures.
///
/// `Unauthorized` never appears here: the `AuthUser` extractor rejects the
/// request before a handler runs. An attempt to close another user's trade
/// maps to `NotFound` so callers cannot probe for foreign trade ids.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(String),

    #[error("Insufficient funds: {required} required, {available} available")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("Trade not found")]
    NotFound,

    #[error("Trade already closed")]
    AlreadyClosed,

    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

impl ResponseError for LedgerError {
    fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
            LedgerError::InsufficientFunds { .. } => StatusCode::BAD_REQUEST,
            LedgerError::NotFound => StatusCode::NOT_FOUND,
            LedgerError::AlreadyClosed => StatusCode::BAD_REQUEST,
            LedgerError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            LedgerError::Validation(message) => {
                HttpResponse::BadRequest().json(serde_json::json!({ "message": message }))
            }
            LedgerError::InsufficientFunds {
                required,
                available,
            } => HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Insufficient funds",
                "balance": available.to_string(),
                "required": required.to_string(),
                "hint": "You can reset your practice cash from the Portfolio page to restore your starting SimCash."
            })),
            LedgerError::NotFound => {
                HttpResponse::NotFound().json(serde_json::json!({ "message": "Trade not found" }))
            }
            LedgerError::AlreadyClosed => HttpResponse::BadRequest()
                .json(serde_json::json!({ "message": "Trade already closed" })),
            LedgerError::Db(e) => {
                log::error!("database error: {}", e);
                HttpResponse::InternalServerError()
                    .json(serde_json::json!({ "message": "Internal server error" }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(
            LedgerError::Validation("size must be greater than 0".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LedgerError::InsufficientFunds {
                required: Decimal::new(15000, 2),
                available: Decimal::new(10000, 2),
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(LedgerError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            LedgerError::AlreadyClosed.status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
