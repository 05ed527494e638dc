use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;

use super::{
    AppState, ApiErr, load_user,
    dto::{LoginRequest, LoginResponse, UserResponse},
    jwt::{AuthClaims, Claims, encode_jwt},
};

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiErr> {
    let user = state
        .auth
        .authenticate(&body.username, &body.password)
        .await
        .map_err(|_| ApiErr::new(StatusCode::UNAUTHORIZED, "Invalid credentials"))?;

    let exp = (Utc::now().timestamp() as u64) + state.jwt_expiry_hours * 3600;
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        is_superuser: user.is_superuser,
        exp,
    };

    let token = encode_jwt(&claims, &state.jwt_secret).map_err(ApiErr::internal)?;

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(user),
    }))
}

pub async fn me(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiErr> {
    let user = load_user(&state, claims.sub).await?;
    Ok(Json(UserResponse::from(user)))
}
