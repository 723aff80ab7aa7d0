use utoipa::OpenApi;

use crate::routes::resource::{highscore, player, track};

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the kart highscores API.
///
/// Resource paths are listed without the optional deployment prefix.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        player::list,
        player::create,
        player::read,
        player::replace,
        player::patch,
        player::remove,
        track::list,
        track::create,
        track::read,
        track::replace,
        track::patch,
        track::remove,
        highscore::list,
        highscore::create,
        highscore::read,
        highscore::replace,
        highscore::patch,
        highscore::remove,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::links::Link,
            crate::dto::links::Links,
            crate::dao::models::Player,
            crate::dao::models::Track,
            crate::dao::models::Highscore,
            crate::error::ErrorBody,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "player", description = "Registered players"),
        (name = "track", description = "Race tracks"),
        (name = "highscore", description = "Lap times per player and track"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_resource_path() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/player",
            "/player/{id}",
            "/track",
            "/track/{id}",
            "/highscore",
            "/highscore/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
