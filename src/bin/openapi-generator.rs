//! Print the OpenAPI document of the REST API as pretty JSON.

use kart_highscores::services::documentation::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let doc = ApiDoc::openapi();
    println!("{}", doc.to_pretty_json()?);
    Ok(())
}
