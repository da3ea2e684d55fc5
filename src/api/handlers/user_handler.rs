//! User account handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::{LoginResponse, NewUser, TopUp, UserPatch, UserReplace, UserResponse};
use crate::errors::AppResult;
use crate::types::{ApiResponse, Created};

/// User login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    #[schema(example = "alice")]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "secret")]
    pub password: String,
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/register", post(register))
        .route("/login", post(login))
        .route(
            "/:username",
            get(get_user).put(replace_user).patch(patch_user),
        )
        .route("/:username/saldo", post(top_up))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/users/register",
    tag = "Users",
    request_body = NewUser,
    responses(
        (status = 201, description = "User registered successfully", body = UserResponse),
        (status = 400, description = "Username is required"),
        (status = 409, description = "User already exists")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> AppResult<Created<UserResponse>> {
    let user = state.user_service.create_user(payload).await?;
    Ok(Created(UserResponse::from(user), "User registered successfully"))
}

/// Login and get JWT token
#[utoipa::path(
    post,
    path = "/users/login",
    tag = "Users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid password"),
        (status = 404, description = "User not found")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let response = state
        .user_service
        .login(&payload.username, &payload.password)
        .await?;

    Ok(ApiResponse::with_message(response, "Login successful"))
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses(
        (status = 200, description = "All users", body = [UserResponse])
    )
)]
pub async fn list_users(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let users = state.user_service.list_users().await?;
    Ok(ApiResponse::success(
        users.into_iter().map(UserResponse::from).collect(),
    ))
}

/// Get user by username
#[utoipa::path(
    get,
    path = "/users/{username}",
    tag = "Users",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.get_user(&username).await?;
    Ok(ApiResponse::success(UserResponse::from(user)))
}

/// Replace a user's profile
#[utoipa::path(
    put,
    path = "/users/{username}",
    tag = "Users",
    params(("username" = String, Path, description = "Username")),
    request_body = UserReplace,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Some fields are missing"),
        (status = 404, description = "User not found")
    )
)]
pub async fn replace_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    ValidatedJson(payload): ValidatedJson<UserReplace>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.edit_user(&username, payload).await?;
    Ok(ApiResponse::with_message(
        UserResponse::from(user),
        "User updated successfully",
    ))
}

/// Update the supplied profile fields
#[utoipa::path(
    patch,
    path = "/users/{username}",
    tag = "Users",
    params(("username" = String, Path, description = "Username")),
    request_body = UserPatch,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn patch_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    ValidatedJson(payload): ValidatedJson<UserPatch>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.patch_user(&username, payload).await?;
    Ok(ApiResponse::with_message(
        UserResponse::from(user),
        "User updated successfully",
    ))
}

/// Add to a user's balance
#[utoipa::path(
    post,
    path = "/users/{username}/saldo",
    tag = "Users",
    params(("username" = String, Path, description = "Username")),
    request_body = TopUp,
    responses(
        (status = 200, description = "Balance updated", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn top_up(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(payload): Json<TopUp>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.add_balance(&username, payload).await?;
    Ok(ApiResponse::with_message(
        UserResponse::from(user),
        "Saldo updated successfully",
    ))
}
