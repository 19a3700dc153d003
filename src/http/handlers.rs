//! REST handlers. Each one runs its RPC counterpart through the chain.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::lifecycle::Backend;
use crate::proto::auth::{self, LoginRequest, LoginResponse, LogoutRequest, LogoutResponse};
use crate::proto::identity::{
    self, CreateUserRequest, DeleteUserRequest, GetUserRequest, ListUsersRequest, ListUsersResponse,
    UpdateUserRequest, User,
};
use crate::proto::movie::{
    self, CreateMovieRequest, CreateMovieResponse, DeleteMovieRequest, GetMovieRequest, ListMoviesRequest,
    ListMoviesResponse, Movie, PartialUpdateMovieRequest, UpdateMovieRequest, UpdateMovieResponse,
};
use crate::proto::testing::{self, PingRequest, PingResponse};

use super::request::CallMeta;
use super::response::ApiError;

type AppState = State<Arc<Backend>>;
type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn login(State(app): AppState, meta: CallMeta, Json(body): Json<LoginRequest>) -> ApiResult<LoginResponse> {
    let response = app
        .chain
        .unary(meta.context(auth::methods::LOGIN), body, |caller, req| {
            app.login.login(caller, req)
        })
        .await?;
    Ok(Json(response))
}

pub async fn logout(State(app): AppState, meta: CallMeta) -> ApiResult<LogoutResponse> {
    let response = app
        .chain
        .unary(meta.context(auth::methods::LOGOUT), LogoutRequest {}, |caller, req| {
            app.login.logout(caller, req)
        })
        .await?;
    Ok(Json(response))
}

pub async fn create_user(
    State(app): AppState,
    meta: CallMeta,
    Json(user): Json<User>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let request = CreateUserRequest { user: Some(user) };
    let created = app
        .chain
        .unary(meta.context(identity::methods::CREATE_USER), request, |caller, req| {
            app.accounts.create_user(caller, req)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_users(
    State(app): AppState,
    meta: CallMeta,
    Query(request): Query<ListUsersRequest>,
) -> ApiResult<ListUsersResponse> {
    let response = app
        .chain
        .unary(meta.context(identity::methods::LIST_USERS), request, |caller, req| {
            app.accounts.list_users(caller, req)
        })
        .await?;
    Ok(Json(response))
}

pub async fn get_user(State(app): AppState, meta: CallMeta, Path(username): Path<String>) -> ApiResult<User> {
    let request = GetUserRequest { username };
    let user = app
        .chain
        .unary(meta.context(identity::methods::GET_USER), request, |caller, req| {
            app.accounts.get_user(caller, req)
        })
        .await?;
    Ok(Json(user))
}

pub async fn update_user(
    State(app): AppState,
    meta: CallMeta,
    Path(username): Path<String>,
    Json(mut user): Json<User>,
) -> ApiResult<User> {
    user.username = username;
    let request = UpdateUserRequest { user: Some(user) };
    let updated = app
        .chain
        .unary(meta.context(identity::methods::UPDATE_USER), request, |caller, req| {
            app.accounts.update_user(caller, req)
        })
        .await?;
    Ok(Json(updated))
}

pub async fn delete_user(
    State(app): AppState,
    meta: CallMeta,
    Path(username): Path<String>,
) -> Result<StatusCode, ApiError> {
    let request = DeleteUserRequest { username };
    app.chain
        .unary(meta.context(identity::methods::DELETE_USER), request, |caller, req| {
            app.accounts.delete_user(caller, req)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_movies(
    State(app): AppState,
    meta: CallMeta,
    Query(request): Query<ListMoviesRequest>,
) -> ApiResult<ListMoviesResponse> {
    let response = app
        .chain
        .unary(meta.context(movie::methods::LIST_MOVIES), request, |caller, req| {
            app.catalog.list_movies(caller, req)
        })
        .await?;
    Ok(Json(response))
}

pub async fn create_movie(
    State(app): AppState,
    meta: CallMeta,
    Json(body): Json<Movie>,
) -> Result<(StatusCode, Json<CreateMovieResponse>), ApiError> {
    let request = CreateMovieRequest { movie: Some(body) };
    let created = app
        .chain
        .unary(meta.context(movie::methods::CREATE_MOVIE), request, |caller, req| {
            app.catalog.create_movie(caller, req)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_movie(State(app): AppState, meta: CallMeta, Path(id): Path<String>) -> ApiResult<Movie> {
    let movie = app
        .chain
        .unary(meta.context(movie::methods::GET_MOVIE), GetMovieRequest { id }, |caller, req| {
            app.catalog.get_movie(caller, req)
        })
        .await?;
    Ok(Json(movie))
}

pub async fn update_movie(
    State(app): AppState,
    meta: CallMeta,
    Path(id): Path<String>,
    Json(body): Json<Movie>,
) -> ApiResult<UpdateMovieResponse> {
    let request = UpdateMovieRequest { id, movie: Some(body) };
    let response = app
        .chain
        .unary(meta.context(movie::methods::UPDATE_MOVIE), request, |caller, req| {
            app.catalog.update_movie(caller, req)
        })
        .await?;
    Ok(Json(response))
}

/// Body is `{"movie": {...}, "update_mask": ["name", ...]}`; the path id wins.
pub async fn partial_update_movie(
    State(app): AppState,
    meta: CallMeta,
    Path(id): Path<String>,
    Json(mut request): Json<PartialUpdateMovieRequest>,
) -> ApiResult<UpdateMovieResponse> {
    request.id = id;
    let response = app
        .chain
        .unary(meta.context(movie::methods::PARTIAL_UPDATE_MOVIE), request, |caller, req| {
            app.catalog.partial_update_movie(caller, req)
        })
        .await?;
    Ok(Json(response))
}

pub async fn delete_movie(State(app): AppState, meta: CallMeta, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    app.chain
        .unary(meta.context(movie::methods::DELETE_MOVIE), DeleteMovieRequest { id }, |caller, req| {
            app.catalog.delete_movie(caller, req)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn ping(State(app): AppState, meta: CallMeta, Json(body): Json<PingRequest>) -> ApiResult<PingResponse> {
    let response = app
        .chain
        .unary(meta.context(testing::methods::PING), body, |caller, req| {
            app.ping.ping(caller, req)
        })
        .await?;
    Ok(Json(response))
}
