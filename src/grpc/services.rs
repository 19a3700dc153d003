//! Generated service traits, each method routed through the chain.

use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status, Streaming};

use crate::proto::auth::auth_service_server::AuthService;
use crate::proto::auth::{self, LoginRequest, LoginResponse, LogoutRequest, LogoutResponse};
use crate::proto::identity::identity_service_server::IdentityService;
use crate::proto::identity::{
    self, CreateUserRequest, DeleteUserRequest, GetUserRequest, ListUsersRequest, ListUsersResponse,
    UpdateUserRequest, User,
};
use crate::proto::movie::movie_service_server::MovieService;
use crate::proto::movie::{
    self, CreateMovieRequest, CreateMovieResponse, DeleteMovieRequest, GetMovieRequest, ListMoviesRequest,
    ListMoviesResponse, Movie, PartialUpdateMovieRequest, UpdateMovieRequest, UpdateMovieResponse,
};
use crate::proto::testing::test_service_server::TestService;
use crate::proto::testing::{self, PingRequest, PingResponse};
use crate::proto::Empty;
use crate::rpc::{CallKind, ChannelStream};
use crate::services::{AccountService, CatalogService, LoginService, PingService};

use super::{call_context, RpcAdapter, STREAM_BUFFER};

type PingResponses = ReceiverStream<Result<PingResponse, Status>>;

#[tonic::async_trait]
impl AuthService for RpcAdapter<LoginService> {
    async fn login(&self, request: Request<LoginRequest>) -> Result<Response<LoginResponse>, Status> {
        let ctx = call_context(&request, auth::methods::LOGIN, CallKind::Unary);
        self.chain
            .unary(ctx, request.into_inner(), |caller, req| self.service.login(caller, req))
            .await
            .map(Response::new)
    }

    async fn logout(&self, request: Request<LogoutRequest>) -> Result<Response<LogoutResponse>, Status> {
        let ctx = call_context(&request, auth::methods::LOGOUT, CallKind::Unary);
        self.chain
            .unary(ctx, request.into_inner(), |caller, req| self.service.logout(caller, req))
            .await
            .map(Response::new)
    }
}

#[tonic::async_trait]
impl IdentityService for RpcAdapter<AccountService> {
    async fn create_user(&self, request: Request<CreateUserRequest>) -> Result<Response<User>, Status> {
        let ctx = call_context(&request, identity::methods::CREATE_USER, CallKind::Unary);
        self.chain
            .unary(ctx, request.into_inner(), |caller, req| self.service.create_user(caller, req))
            .await
            .map(Response::new)
    }

    async fn get_user(&self, request: Request<GetUserRequest>) -> Result<Response<User>, Status> {
        let ctx = call_context(&request, identity::methods::GET_USER, CallKind::Unary);
        self.chain
            .unary(ctx, request.into_inner(), |caller, req| self.service.get_user(caller, req))
            .await
            .map(Response::new)
    }

    async fn update_user(&self, request: Request<UpdateUserRequest>) -> Result<Response<User>, Status> {
        let ctx = call_context(&request, identity::methods::UPDATE_USER, CallKind::Unary);
        self.chain
            .unary(ctx, request.into_inner(), |caller, req| self.service.update_user(caller, req))
            .await
            .map(Response::new)
    }

    async fn delete_user(&self, request: Request<DeleteUserRequest>) -> Result<Response<Empty>, Status> {
        let ctx = call_context(&request, identity::methods::DELETE_USER, CallKind::Unary);
        self.chain
            .unary(ctx, request.into_inner(), |caller, req| self.service.delete_user(caller, req))
            .await
            .map(Response::new)
    }

    async fn list_users(&self, request: Request<ListUsersRequest>) -> Result<Response<ListUsersResponse>, Status> {
        let ctx = call_context(&request, identity::methods::LIST_USERS, CallKind::Unary);
        self.chain
            .unary(ctx, request.into_inner(), |caller, req| self.service.list_users(caller, req))
            .await
            .map(Response::new)
    }
}

#[tonic::async_trait]
impl MovieService for RpcAdapter<CatalogService> {
    async fn list_movies(&self, request: Request<ListMoviesRequest>) -> Result<Response<ListMoviesResponse>, Status> {
        let ctx = call_context(&request, movie::methods::LIST_MOVIES, CallKind::Unary);
        self.chain
            .unary(ctx, request.into_inner(), |caller, req| self.service.list_movies(caller, req))
            .await
            .map(Response::new)
    }

    async fn get_movie(&self, request: Request<GetMovieRequest>) -> Result<Response<Movie>, Status> {
        let ctx = call_context(&request, movie::methods::GET_MOVIE, CallKind::Unary);
        self.chain
            .unary(ctx, request.into_inner(), |caller, req| self.service.get_movie(caller, req))
            .await
            .map(Response::new)
    }

    async fn create_movie(&self, request: Request<CreateMovieRequest>) -> Result<Response<CreateMovieResponse>, Status> {
        let ctx = call_context(&request, movie::methods::CREATE_MOVIE, CallKind::Unary);
        self.chain
            .unary(ctx, request.into_inner(), |caller, req| self.service.create_movie(caller, req))
            .await
            .map(Response::new)
    }

    async fn update_movie(&self, request: Request<UpdateMovieRequest>) -> Result<Response<UpdateMovieResponse>, Status> {
        let ctx = call_context(&request, movie::methods::UPDATE_MOVIE, CallKind::Unary);
        self.chain
            .unary(ctx, request.into_inner(), |caller, req| self.service.update_movie(caller, req))
            .await
            .map(Response::new)
    }

    async fn partial_update_movie(
        &self,
        request: Request<PartialUpdateMovieRequest>,
    ) -> Result<Response<UpdateMovieResponse>, Status> {
        let ctx = call_context(&request, movie::methods::PARTIAL_UPDATE_MOVIE, CallKind::Unary);
        self.chain
            .unary(ctx, request.into_inner(), |caller, req| {
                self.service.partial_update_movie(caller, req)
            })
            .await
            .map(Response::new)
    }

    async fn delete_movie(&self, request: Request<DeleteMovieRequest>) -> Result<Response<Empty>, Status> {
        let ctx = call_context(&request, movie::methods::DELETE_MOVIE, CallKind::Unary);
        self.chain
            .unary(ctx, request.into_inner(), |caller, req| self.service.delete_movie(caller, req))
            .await
            .map(Response::new)
    }
}

#[tonic::async_trait]
impl TestService for RpcAdapter<PingService> {
    type PingListStream = PingResponses;
    type PingStreamStream = PingResponses;

    async fn ping(&self, request: Request<PingRequest>) -> Result<Response<PingResponse>, Status> {
        let ctx = call_context(&request, testing::methods::PING, CallKind::Unary);
        self.chain
            .unary(ctx, request.into_inner(), |caller, req| self.service.ping(caller, req))
            .await
            .map(Response::new)
    }

    async fn ping_list(&self, request: Request<PingRequest>) -> Result<Response<Self::PingListStream>, Status> {
        let ctx = call_context(&request, testing::methods::PING_LIST, CallKind::ServerStreaming);
        let (stream, body) = ChannelStream::<PingRequest, PingResponse>::outbound_only(STREAM_BUFFER);
        let (caller, mut stream) = self.chain.stream(&ctx, stream)?;

        let service = *self.service;
        let request = request.into_inner();
        tokio::spawn(async move {
            if let Err(status) = service.ping_list(caller, request, &mut stream).await {
                let fail = stream.get_ref().fail(status);
                fail.await;
            }
        });
        Ok(Response::new(body))
    }

    async fn ping_stream(
        &self,
        request: Request<Streaming<PingRequest>>,
    ) -> Result<Response<Self::PingStreamStream>, Status> {
        let ctx = call_context(&request, testing::methods::PING_STREAM, CallKind::BidiStreaming);
        let (stream, body) =
            ChannelStream::<PingRequest, PingResponse>::with_inbound(Some(request.into_inner()), STREAM_BUFFER);
        let (caller, mut stream) = self.chain.stream(&ctx, stream)?;

        let service = *self.service;
        tokio::spawn(async move {
            if let Err(status) = service.ping_stream(caller, &mut stream).await {
                let fail = stream.get_ref().fail(status);
                fail.await;
            }
        });
        Ok(Response::new(body))
    }
}
