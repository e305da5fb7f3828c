use actix_web::{dev::Payload, Error, FromRequest, HttpRequest, HttpResponse};
use futures::future::{ready, Ready};
use serde::{Deserialize, Serialize};

use crate::utils::jwt;

/// The authenticated caller, extracted from the bearer token.
///
/// Handlers take this as a parameter and pass `user_id` explicitly into the
/// services; nothing below the route layer reads request state. Requests
/// without a valid token are rejected here with 401 before any handler runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let auth_header = match req.headers().get("Authorization") {
            Some(header) => header,
            None => return ready(Err(unauthorized("Missing Authorization header"))),
        };

        let auth_str = match auth_header.to_str() {
            Ok(s) => s,
            Err(_) => return ready(Err(unauthorized("Invalid Authorization header"))),
        };

        // Format: "Bearer <token>"
        let token = match auth_str.strip_prefix("Bearer ") {
            Some(token) => token,
            None => {
                return ready(Err(unauthorized(
                    "Invalid Authorization format (expected: Bearer <token>)",
                )))
            }
        };

        match jwt::verify_token(token) {
            Ok(claims) => {
                // Subjects are UUIDs issued by the identity provider
                if uuid::Uuid::parse_str(&claims.sub).is_err() {
                    return ready(Err(unauthorized("Invalid token subject")));
                }
                ready(Ok(AuthUser {
                    user_id: claims.sub,
                    username: claims.username,
                }))
            }
            Err(e) => ready(Err(unauthorized(&format!("Invalid token: {}", e)))),
        }
    }
}

fn unauthorized(message: &str) -> Error {
    let response = HttpResponse::Unauthorized().json(serde_json::json!({ "error": message }));
    actix_web::error::InternalError::from_response("", response).into()
}
