use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use uuid::Uuid;
use validator::Validate;

use application::{
    CreateGroupRequest, CreateGroupResponse, GetGroupRanksResponse, GetGroupResponse,
    JoinGroupResponse, PageRequest, PageResponse, SearchGroupResponse, SignInRequest,
    SignUpRequest, TokenResponse, UserInfoResponse,
};
use domain::{GroupId, MembershipId};

use crate::{auth, error::ApiError, state::AppState, websocket};

#[derive(Debug, Deserialize, Validate)]
struct SignUpPayload {
    #[validate(length(min = 1, max = 50))]
    username: String,
    #[validate(length(min = 8, max = 72))]
    password: String,
}

#[derive(Debug, Deserialize, Validate)]
struct SignInPayload {
    #[validate(length(min = 1, max = 50))]
    username: String,
    #[validate(length(min = 1, max = 72))]
    password: String,
}

#[derive(Debug, Deserialize, Validate)]
struct CreateGroupPayload {
    #[validate(length(min = 1, max = 60))]
    name: String,
    description: Option<String>,
    #[serde(default)]
    is_hidden: bool,
    join_code: Option<String>,
    #[validate(range(min = 1, max = 1000))]
    user_capacity: i32,
}

#[derive(Debug, Deserialize, Default)]
struct JoinGroupQuery {
    join_code: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
struct CheckGroupNamePayload {
    #[validate(length(min = 1, max = 60))]
    name: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes())
        .route(
            "/ws/v1/groups/concurrent-users",
            get(websocket::concurrent_users_upgrade),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-in", post(sign_in))
        .route("/users/me", get(get_me))
        .route("/groups", post(create_group).get(search_groups))
        .route("/groups/check-name", post(check_group_name))
        .route("/groups/{group_id}", get(get_group))
        .route("/groups/{group_id}/join", post(join_group))
        .route("/groups/{group_id}/withdraw", delete(withdraw_group))
        .route("/groups/{group_id}/rank", get(get_group_rank))
        .route("/group-users/{group_user_id}", delete(delete_group_user))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

fn validated<T: Validate>(payload: T) -> Result<T, ApiError> {
    payload
        .validate()
        .map_err(|err| ApiError::bad_request(err.to_string()))?;
    Ok(payload)
}

async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpPayload>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let payload = validated(payload)?;

    let response = state
        .auth_service
        .sign_up(SignUpRequest {
            username: payload.username,
            password: payload.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInPayload>,
) -> Result<Json<TokenResponse>, ApiError> {
    let payload = validated(payload)?;

    let response = state
        .auth_service
        .sign_in(SignInRequest {
            username: payload.username,
            password: payload.password,
        })
        .await?;

    Ok(Json(response))
}

async fn get_me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserInfoResponse>, ApiError> {
    let user = auth::resolve_user(&state, &headers).await?;
    let info = state.auth_service.get_user_info(&user).await?;
    Ok(Json(info))
}

async fn create_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateGroupPayload>,
) -> Result<(StatusCode, Json<CreateGroupResponse>), ApiError> {
    let user = auth::resolve_user(&state, &headers).await?;
    let payload = validated(payload)?;

    let response = state
        .group_service
        .create_group(
            &user,
            CreateGroupRequest {
                name: payload.name,
                description: payload.description,
                is_hidden: payload.is_hidden,
                join_code: payload.join_code,
                user_capacity: payload.user_capacity,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

async fn join_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<Uuid>,
    Query(query): Query<JoinGroupQuery>,
) -> Result<Json<JoinGroupResponse>, ApiError> {
    let user = auth::resolve_user(&state, &headers).await?;

    let response = state
        .group_service
        .join_group(GroupId::from(group_id), user.uid, query.join_code)
        .await?;

    Ok(Json(response))
}

async fn withdraw_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let user = auth::resolve_user(&state, &headers).await?;

    state
        .group_service
        .withdraw(user.uid, GroupId::from(group_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn get_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<Uuid>,
) -> Result<Json<GetGroupResponse>, ApiError> {
    let user = auth::resolve_user(&state, &headers).await?;

    let response = state
        .group_service
        .get_group(&user, GroupId::from(group_id))
        .await?;

    Ok(Json(response))
}

async fn get_group_rank(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<Uuid>,
) -> Result<Json<GetGroupRanksResponse>, ApiError> {
    let user = auth::resolve_user(&state, &headers).await?;

    let response = state
        .group_service
        .get_group_rank(&user, GroupId::from(group_id))
        .await?;

    Ok(Json(response))
}

async fn search_groups(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(page): Query<PageRequest>,
) -> Result<Json<PageResponse<SearchGroupResponse>>, ApiError> {
    let user = auth::resolve_user(&state, &headers).await?;

    let response = state.group_service.search_group(&user, page).await?;
    Ok(Json(response))
}

async fn check_group_name(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CheckGroupNamePayload>,
) -> Result<StatusCode, ApiError> {
    auth::resolve_user(&state, &headers).await?;
    let payload = validated(payload)?;

    state.group_service.check_group_name(&payload.name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_group_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let user = auth::resolve_user(&state, &headers).await?;

    state
        .group_service
        .delete_group_member(&user, MembershipId::from(group_user_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
