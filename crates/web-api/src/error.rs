use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use application::ApplicationError as AppErr;
        use domain::DomainError;

        match error {
            AppErr::Domain(DomainError::InvalidArgument { field, reason }) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "INVALID_ARGUMENT",
                format!("{}: {}", field, reason),
            ),
            AppErr::Domain(DomainError::UserNotFound) => {
                ApiError::new(StatusCode::NOT_FOUND, "USER_NOT_FOUND", "user not found")
            }
            AppErr::Domain(DomainError::GroupNotFound) => {
                ApiError::new(StatusCode::NOT_FOUND, "GROUP_NOT_FOUND", "group not found")
            }
            AppErr::Domain(DomainError::MembershipNotFound) => ApiError::new(
                StatusCode::NOT_FOUND,
                "GROUP_USER_NOT_FOUND",
                "group membership not found",
            ),
            AppErr::Domain(DomainError::DuplicatedUsername) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "DUPLICATED_USERNAME",
                "username already registered",
            ),
            AppErr::Domain(DomainError::DuplicateGroupName) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "DUPLICATE_GROUP_NAME",
                "group name already exists",
            ),
            AppErr::Domain(DomainError::DuplicateGroupJoin) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "DUPLICATE_GROUP_JOIN",
                "user already joined another group",
            ),
            AppErr::Domain(DomainError::ExceedGroupUserCount) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "EXCEED_GROUP_USER_COUNT",
                "group user count exceeded",
            ),
            AppErr::Domain(DomainError::ImpossibleToJoin) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "IMPOSSIBLE_TO_JOIN_GROUP",
                "impossible to join group",
            ),
            AppErr::Domain(DomainError::NotGroupMember) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "NOT_CONTAINS_GROUP_USER",
                "caller is not a group member",
            ),
            AppErr::Domain(DomainError::InvalidToken) => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "INVALID_ACCESS_TOKEN",
                "invalid access token",
            ),
            AppErr::Domain(DomainError::NoAuthority) => {
                ApiError::new(StatusCode::FORBIDDEN, "NO_AUTHORITY", "no authority")
            }
            AppErr::Repository(repo_err) => match repo_err {
                domain::RepositoryError::NotFound => ApiError::new(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "requested resource not found",
                ),
                domain::RepositoryError::Conflict => {
                    ApiError::new(StatusCode::CONFLICT, "CONFLICT", "resource already exists")
                }
                domain::RepositoryError::Storage { message } => ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    format!("database error: {}", message),
                ),
            },
            AppErr::Password(err) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "PASSWORD_ERROR",
                format!("password error: {}", err),
            ),
            AppErr::Token(_) => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "INVALID_ACCESS_TOKEN",
                "invalid access token",
            ),
            AppErr::Authentication => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_FAILED",
                "authentication failed",
            ),
            AppErr::Infrastructure(message) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INFRASTRUCTURE_ERROR",
                message,
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
