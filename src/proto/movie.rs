//! `movie` package.

use serde::{Deserialize, Serialize};

include!(concat!(env!("OUT_DIR"), "/movie.MovieService.rs"));

pub mod methods {
    pub const LIST_MOVIES: &str = "/movie.MovieService/ListMovies";
    pub const GET_MOVIE: &str = "/movie.MovieService/GetMovie";
    pub const CREATE_MOVIE: &str = "/movie.MovieService/CreateMovie";
    pub const UPDATE_MOVIE: &str = "/movie.MovieService/UpdateMovie";
    pub const PARTIAL_UPDATE_MOVIE: &str = "/movie.MovieService/PartialUpdateMovie";
    pub const DELETE_MOVIE: &str = "/movie.MovieService/DeleteMovie";
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Movie {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub summary: String,
    #[prost(string, repeated, tag = "4")]
    pub cast: Vec<String>,
    #[prost(string, tag = "5")]
    pub director: String,
    #[prost(string, repeated, tag = "6")]
    pub writers: Vec<String>,
    #[prost(string, repeated, tag = "7")]
    pub tags: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ListMoviesRequest {
    #[prost(int32, tag = "1")]
    pub page_size: i32,
    #[prost(string, tag = "2")]
    pub page_token: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ListMoviesResponse {
    #[prost(message, repeated, tag = "1")]
    pub movies: Vec<Movie>,
    #[prost(string, tag = "2")]
    pub next_page_token: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct GetMovieRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateMovieRequest {
    #[prost(message, optional, tag = "1")]
    pub movie: Option<Movie>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateMovieResponse {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateMovieRequest {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(message, optional, tag = "2")]
    pub movie: Option<Movie>,
}

/// Partial update: only the fields named in `update_mask` are copied from
/// `movie` onto the stored record.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialUpdateMovieRequest {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(message, optional, tag = "2")]
    pub movie: Option<Movie>,
    #[prost(string, repeated, tag = "3")]
    pub update_mask: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateMovieResponse {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteMovieRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}
