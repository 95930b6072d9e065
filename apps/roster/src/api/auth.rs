//! Registration, login and bearer-token authorization.
//!
//! Tokens are HS256 JWTs carrying the user name and roles. Every
//! `/api/companies` route requires one; writes additionally need the
//! `Manager` or `Administrator` role.

use super::AppState;
use super::error::ApiError;
use super::negotiate::validated;
use crate::config::JwtConfig;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use roster_core::model::{Role, User, UserId};
use roster_core::security::{check_policy, hash_password};
use roster_core::{UserForAuthentication, UserForRegistration, UserRepository, ValidationErrors};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// JWT claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub iss: String,
    pub aud: String,
    pub exp: u64,
}

impl Claims {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles
            .iter()
            .any(|r| r.eq_ignore_ascii_case(role.name()))
    }

    /// Roles allowed to change data.
    pub fn can_write(&self) -> bool {
        Role::ALL.iter().any(|role| self.has_role(*role))
    }
}

/// Sign a token for `user`.
pub fn create_token(config: &JwtConfig, user: &User) -> Result<String, ApiError> {
    let expires_in = config.expires_minutes.saturating_mul(60);
    let claims = Claims {
        sub: user.user_name.clone(),
        name: user.user_name.clone(),
        roles: user.roles.clone(),
        iss: config.issuer.clone(),
        aud: config.audience.clone(),
        exp: jsonwebtoken::get_current_timestamp().saturating_add(expires_in),
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(ApiError::internal)
}

/// Verify signature, expiry, issuer and audience.
pub fn decode_token(config: &JwtConfig, token: &str) -> Option<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[config.issuer.as_str()]);
    validation.set_audience(&[config.audience.as_str()]);
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|err| tracing::debug!(error = %err, "token rejected"))
    .ok()
}

/// Middleware: require a valid bearer token; writes require a privileged role.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let claims = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|token| decode_token(&state.config.jwt, token.trim()))
        .ok_or(ApiError::Unauthorized)?;

    let read_only = matches!(*req.method(), Method::GET | Method::HEAD);
    if !read_only && !claims.can_write() {
        tracing::warn!(user = %claims.name, method = %req.method(), "write denied");
        return Err(ApiError::Forbidden);
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let dto: UserForRegistration = validated(&body, "UserForRegistrationDto object is null")?;
    let password = dto.password.clone().unwrap_or_default();
    check_policy(&password).map_err(ApiError::InvalidRequest)?;

    let roles = dto.roles.clone();
    let user_name = dto.user_name.clone().unwrap_or_default();
    state
        .with_store(move |store| {
            for role in &roles {
                if !store.role_exists(role)? {
                    let mut errors = ValidationErrors::new();
                    errors.add("roles error", "There is no role in the database");
                    return Ok(Err(errors));
                }
            }
            let user = User {
                id: UserId::new_v4(),
                first_name: dto.first_name.unwrap_or_default(),
                last_name: dto.last_name.unwrap_or_default(),
                user_name: dto.user_name.unwrap_or_default(),
                email: dto.email.unwrap_or_default(),
                phone_number: dto.phone_number,
                password_hash: hash_password(&password),
                roles,
            };
            store.create_user(&user).map(Ok)
        })
        .await?
        .map_err(ApiError::InvalidRequest)?;

    tracing::info!(user = %user_name, "user registered");
    Ok(StatusCode::CREATED)
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let dto: UserForAuthentication = validated(&body, "UserForAuthenticationDto object is null")?;
    let user_name = dto.user_name.unwrap_or_default();
    let password = dto.password.unwrap_or_default();

    let Some(user) = state
        .with_store(move |store| store.check_password(&user_name, &password))
        .await?
    else {
        tracing::warn!("Authenticate: Authentication failed. Wrong user name or password.");
        return Err(ApiError::Unauthorized);
    };

    let token = create_token(&state.config.jwt, &user)?;
    Ok(Json(json!({ "token": token })))
}
