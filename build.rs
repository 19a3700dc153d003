//! Generates the tonic client/server stubs for the four RPC packages.
//!
//! Message types are hand-written `prost` structs in `src/proto/`, so the
//! stubs are produced with the manual builder and no `protoc` is needed.

use tonic_build::manual::{Builder, Method, Service};

const CODEC: &str = "tonic::codec::ProstCodec";

fn unary(name: &str, route: &str, input: &str, output: &str) -> Method {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(input)
        .output_type(output)
        .codec_path(CODEC)
        .build()
}

fn main() {
    let auth = Service::builder()
        .name("AuthService")
        .package("auth")
        .method(unary(
            "login",
            "Login",
            "crate::proto::auth::LoginRequest",
            "crate::proto::auth::LoginResponse",
        ))
        .method(unary(
            "logout",
            "Logout",
            "crate::proto::auth::LogoutRequest",
            "crate::proto::auth::LogoutResponse",
        ))
        .build();

    let identity = Service::builder()
        .name("IdentityService")
        .package("identity")
        .method(unary(
            "create_user",
            "CreateUser",
            "crate::proto::identity::CreateUserRequest",
            "crate::proto::identity::User",
        ))
        .method(unary(
            "get_user",
            "GetUser",
            "crate::proto::identity::GetUserRequest",
            "crate::proto::identity::User",
        ))
        .method(unary(
            "update_user",
            "UpdateUser",
            "crate::proto::identity::UpdateUserRequest",
            "crate::proto::identity::User",
        ))
        .method(unary(
            "delete_user",
            "DeleteUser",
            "crate::proto::identity::DeleteUserRequest",
            "crate::proto::Empty",
        ))
        .method(unary(
            "list_users",
            "ListUsers",
            "crate::proto::identity::ListUsersRequest",
            "crate::proto::identity::ListUsersResponse",
        ))
        .build();

    let movie = Service::builder()
        .name("MovieService")
        .package("movie")
        .method(unary(
            "list_movies",
            "ListMovies",
            "crate::proto::movie::ListMoviesRequest",
            "crate::proto::movie::ListMoviesResponse",
        ))
        .method(unary(
            "get_movie",
            "GetMovie",
            "crate::proto::movie::GetMovieRequest",
            "crate::proto::movie::Movie",
        ))
        .method(unary(
            "create_movie",
            "CreateMovie",
            "crate::proto::movie::CreateMovieRequest",
            "crate::proto::movie::CreateMovieResponse",
        ))
        .method(unary(
            "update_movie",
            "UpdateMovie",
            "crate::proto::movie::UpdateMovieRequest",
            "crate::proto::movie::UpdateMovieResponse",
        ))
        .method(unary(
            "partial_update_movie",
            "PartialUpdateMovie",
            "crate::proto::movie::PartialUpdateMovieRequest",
            "crate::proto::movie::UpdateMovieResponse",
        ))
        .method(unary(
            "delete_movie",
            "DeleteMovie",
            "crate::proto::movie::DeleteMovieRequest",
            "crate::proto::Empty",
        ))
        .build();

    let testing = Service::builder()
        .name("TestService")
        .package("testing")
        .method(unary(
            "ping",
            "Ping",
            "crate::proto::testing::PingRequest",
            "crate::proto::testing::PingResponse",
        ))
        .method(
            Method::builder()
                .name("ping_list")
                .route_name("PingList")
                .input_type("crate::proto::testing::PingRequest")
                .output_type("crate::proto::testing::PingResponse")
                .codec_path(CODEC)
                .server_streaming()
                .build(),
        )
        .method(
            Method::builder()
                .name("ping_stream")
                .route_name("PingStream")
                .input_type("crate::proto::testing::PingRequest")
                .output_type("crate::proto::testing::PingResponse")
                .codec_path(CODEC)
                .client_streaming()
                .server_streaming()
                .build(),
        )
        .build();

    Builder::new().compile(&[auth, identity, movie, testing]);
}
