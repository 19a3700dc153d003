//! Movie catalog: `movie.MovieService`.

use std::sync::Arc;

use tonic::Status;
use uuid::Uuid;

use crate::pagination::PageTokenCodec;
use crate::proto::movie::{
    CreateMovieRequest, CreateMovieResponse, DeleteMovieRequest, GetMovieRequest, ListMoviesRequest,
    ListMoviesResponse, Movie, PartialUpdateMovieRequest, UpdateMovieRequest, UpdateMovieResponse,
};
use crate::proto::Empty;
use crate::security::Caller;
use crate::storage::MovieStore;

use super::PageLimits;

const NAME_LIMITS: (usize, usize) = (1, 120);
const SUMMARY_LIMITS: (usize, usize) = (8, 1200);
const MASKABLE: [&str; 6] = ["name", "summary", "cast", "director", "writers", "tags"];

fn check_length(field: &str, value: &str, (min, max): (usize, usize)) -> Result<(), Status> {
    let length = value.chars().count();
    if length < min || length > max {
        return Err(Status::invalid_argument(format!(
            "The field `{field}` must be between {min} and {max} characters."
        )));
    }
    Ok(())
}

/// Trim text fields and enforce their length bounds.
fn normalize(movie: &mut Movie) -> Result<(), Status> {
    movie.name = movie.name.trim().to_string();
    movie.summary = movie.summary.trim().to_string();
    movie.director = movie.director.trim().to_string();

    check_length("name", &movie.name, NAME_LIMITS)?;
    check_length("summary", &movie.summary, SUMMARY_LIMITS)
}

pub struct CatalogService {
    movies: Arc<MovieStore>,
    pages: PageTokenCodec,
    limits: PageLimits,
}

impl CatalogService {
    pub fn new(movies: Arc<MovieStore>, pages: PageTokenCodec, limits: PageLimits) -> Self {
        Self { movies, pages, limits }
    }

    pub async fn list_movies(&self, _caller: Caller, request: ListMoviesRequest) -> Result<ListMoviesResponse, Status> {
        let size = self.limits.resolve(request.page_size)?;
        let offset = self.pages.get_index(&request.page_token)?;

        let page = self.movies.page(offset, size);
        Ok(ListMoviesResponse {
            movies: page.items,
            next_page_token: page
                .next
                .map(|next| self.pages.for_index(next))
                .unwrap_or_default(),
        })
    }

    pub async fn get_movie(&self, _caller: Caller, request: GetMovieRequest) -> Result<Movie, Status> {
        self.movies
            .get(&request.id)
            .ok_or_else(|| Status::not_found(format!("movie `{}` not found", request.id)))
    }

    pub async fn create_movie(&self, caller: Caller, request: CreateMovieRequest) -> Result<CreateMovieResponse, Status> {
        let mut movie = request
            .movie
            .ok_or_else(|| Status::invalid_argument("movie is required"))?;
        normalize(&mut movie)?;
        if movie.id.trim().is_empty() {
            movie.id = Uuid::new_v4().to_string();
        }

        let id = movie.id.clone();
        self.movies.insert(movie)?;
        tracing::info!(movie_id = %id, created_by = caller.username().unwrap_or("-"), "Movie created");
        Ok(CreateMovieResponse { id })
    }

    pub async fn update_movie(&self, _caller: Caller, request: UpdateMovieRequest) -> Result<UpdateMovieResponse, Status> {
        let mut replacement = request
            .movie
            .ok_or_else(|| Status::invalid_argument("movie is required"))?;
        replacement.id = request.id.clone();
        normalize(&mut replacement)?;

        self.movies.update(&request.id, |stored| *stored = replacement)?;
        Ok(UpdateMovieResponse { id: request.id })
    }

    pub async fn partial_update_movie(
        &self,
        _caller: Caller,
        request: PartialUpdateMovieRequest,
    ) -> Result<UpdateMovieResponse, Status> {
        let patch = request
            .movie
            .ok_or_else(|| Status::invalid_argument("movie is required"))?;
        if request.update_mask.is_empty() {
            return Err(Status::invalid_argument("update_mask must name at least one field"));
        }
        if let Some(other) = request.update_mask.iter().find(|field| !MASKABLE.contains(&field.as_str())) {
            return Err(Status::invalid_argument(format!("The field `{other}` cannot be updated.")));
        }

        self.movies.try_update(&request.id, |stored| {
            for field in &request.update_mask {
                match field.as_str() {
                    "name" => stored.name = patch.name.clone(),
                    "summary" => stored.summary = patch.summary.clone(),
                    "cast" => stored.cast = patch.cast.clone(),
                    "director" => stored.director = patch.director.clone(),
                    "writers" => stored.writers = patch.writers.clone(),
                    "tags" => stored.tags = patch.tags.clone(),
                    _ => {}
                }
            }
            normalize(stored)
        })?;
        Ok(UpdateMovieResponse { id: request.id })
    }

    pub async fn delete_movie(&self, _caller: Caller, request: DeleteMovieRequest) -> Result<Empty, Status> {
        self.movies.remove(&request.id)?;
        tracing::info!(movie_id = %request.id, "Movie deleted");
        Ok(Empty {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    fn catalog() -> CatalogService {
        CatalogService::new(
            Arc::new(MovieStore::new()),
            PageTokenCodec::with_salt("movies"),
            PageLimits::default(),
        )
    }

    fn movie(name: &str) -> Movie {
        Movie {
            name: name.into(),
            summary: "  A film about films.  ".into(),
            director: "Someone".into(),
            ..Default::default()
        }
    }

    async fn create(catalog: &CatalogService, movie: Movie) -> Result<String, Status> {
        catalog
            .create_movie(Caller::Guest, CreateMovieRequest { movie: Some(movie) })
            .await
            .map(|created| created.id)
    }

    #[tokio::test]
    async fn create_assigns_id_and_trims() {
        let catalog = catalog();
        let id = create(&catalog, movie(" Heat ")).await.unwrap();
        assert!(Uuid::parse_str(&id).is_ok());

        let stored = catalog
            .get_movie(Caller::Guest, GetMovieRequest { id: id.clone() })
            .await
            .unwrap();
        assert_eq!(stored.name, "Heat");
        assert_eq!(stored.summary, "A film about films.");
    }

    #[tokio::test]
    async fn validation_bounds_name_and_summary() {
        let catalog = catalog();
        let err = create(&catalog, movie("   ")).await.unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);

        let mut short = movie("Heat");
        short.summary = "short".into();
        assert_eq!(create(&catalog, short).await.unwrap_err().code(), Code::InvalidArgument);

        let long = movie(&"x".repeat(121));
        assert_eq!(create(&catalog, long).await.unwrap_err().code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn partial_update_touches_only_masked_fields() {
        let catalog = catalog();
        let id = create(&catalog, movie("Heat")).await.unwrap();

        let request = PartialUpdateMovieRequest {
            id: id.clone(),
            movie: Some(Movie {
                name: "Heat (1995)".into(),
                director: "ignored".into(),
                ..Default::default()
            }),
            update_mask: vec!["name".into()],
        };
        catalog.partial_update_movie(Caller::Guest, request).await.unwrap();

        let stored = catalog.get_movie(Caller::Guest, GetMovieRequest { id: id.clone() }).await.unwrap();
        assert_eq!(stored.name, "Heat (1995)");
        assert_eq!(stored.director, "Someone");

        let unknown = PartialUpdateMovieRequest {
            id,
            movie: Some(Movie::default()),
            update_mask: vec!["id".into()],
        };
        assert_eq!(
            catalog.partial_update_movie(Caller::Guest, unknown).await.unwrap_err().code(),
            Code::InvalidArgument
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_patches_to_different_fields_both_land() {
        let catalog = Arc::new(catalog());
        let id = create(&catalog, movie("Heat")).await.unwrap();

        let patch = |field: &str, value: Movie| PartialUpdateMovieRequest {
            id: id.clone(),
            movie: Some(value),
            update_mask: vec![field.into()],
        };
        let mut tasks = Vec::new();
        for i in 0..16 {
            let catalog = Arc::clone(&catalog);
            let request = if i % 2 == 0 {
                patch("tags", Movie { tags: vec![format!("tag-{i}")], ..Default::default() })
            } else {
                patch("cast", Movie { cast: vec![format!("actor-{i}")], ..Default::default() })
            };
            tasks.push(tokio::spawn(async move { catalog.partial_update_movie(Caller::Guest, request).await }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = catalog.get_movie(Caller::Guest, GetMovieRequest { id }).await.unwrap();
        assert_eq!(stored.tags.len(), 1);
        assert_eq!(stored.cast.len(), 1);
        assert_eq!(stored.name, "Heat");
    }

    #[tokio::test]
    async fn invalid_patch_leaves_movie_unchanged() {
        let catalog = catalog();
        let id = create(&catalog, movie("Heat")).await.unwrap();

        let request = PartialUpdateMovieRequest {
            id: id.clone(),
            movie: Some(Movie {
                summary: "short".into(),
                director: "Mann".into(),
                ..Default::default()
            }),
            update_mask: vec!["director".into(), "summary".into()],
        };
        let err = catalog.partial_update_movie(Caller::Guest, request).await.unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);

        let stored = catalog.get_movie(Caller::Guest, GetMovieRequest { id }).await.unwrap();
        assert_eq!(stored.director, "Someone");
        assert_eq!(stored.summary, "A film about films.");
    }

    #[tokio::test]
    async fn update_and_delete_missing_movie_is_not_found() {
        let catalog = catalog();
        let update = UpdateMovieRequest {
            id: "nope".into(),
            movie: Some(movie("Heat")),
        };
        assert_eq!(catalog.update_movie(Caller::Guest, update).await.unwrap_err().code(), Code::NotFound);
        assert_eq!(
            catalog
                .delete_movie(Caller::Guest, DeleteMovieRequest { id: "nope".into() })
                .await
                .unwrap_err()
                .code(),
            Code::NotFound
        );
    }

    #[tokio::test]
    async fn list_walks_pages_until_empty_token() {
        let catalog = catalog();
        for i in 0..25 {
            create(&catalog, movie(&format!("Movie {i}"))).await.unwrap();
        }

        let mut token = String::new();
        let mut seen = 0;
        loop {
            let page = catalog
                .list_movies(
                    Caller::Guest,
                    ListMoviesRequest {
                        page_size: 10,
                        page_token: token,
                    },
                )
                .await
                .unwrap();
            seen += page.movies.len();
            if page.next_page_token.is_empty() {
                break;
            }
            token = page.next_page_token;
        }
        assert_eq!(seen, 25);
    }
}
