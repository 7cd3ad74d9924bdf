use std::net::SocketAddr;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use url::Url;

use crate::{feed::FeedParser, loader::PageDataLoader, page::PageRequest, Result};

/// `GET /?rss=<feed url>` answers with the page data as JSON
pub fn router<P>(loader: PageDataLoader<P>) -> Router
where
    P: FeedParser + Clone + Send + Sync + 'static,
{
    Router::new().route("/", get(load_page::<P>)).with_state(loader)
}

pub async fn serve<P>(addr: SocketAddr, loader: PageDataLoader<P>) -> Result
where
    P: FeedParser + Clone + Send + Sync + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .inspect_err(|e| log::warn!("failed to bind {addr}: {e}"))?;
    log::info!("serving page data on http://{}", listener.local_addr()?);
    axum::serve(listener, router(loader)).await?;
    Ok(())
}

async fn load_page<P>(
    State(loader): State<PageDataLoader<P>>,
    uri: Uri,
) -> Response
where
    P: FeedParser + Clone + Send + Sync + 'static,
{
    // only the query matters, the base just makes it a full url
    let url = match Url::parse("http://localhost/").and_then(|base| base.join(&uri.to_string())) {
        Ok(url) => url,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    match loader.load(&PageRequest::new(url)).await {
        Ok(data) => Json(data).into_response(),
        Err(e) => {
            log::warn!("page load failed for `{uri}`: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::{feed::Feed, FeedError};

    #[derive(Clone)]
    struct FixedParser(Option<Feed>);

    impl FeedParser for FixedParser {
        async fn parse_url(&self, _url: &str) -> std::result::Result<Feed, FeedError> {
            self.0.clone().ok_or(FeedError::Unrecognized)
        }
    }

    async fn spawn(app: Router) -> (String, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let address = listener.local_addr().expect("local addr should exist");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server should run");
        });
        (format!("http://{address}"), handle)
    }

    async fn spawn_page_server(parser: FixedParser) -> (String, Vec<tokio::task::JoinHandle<()>>) {
        let top = Router::new().route("/top.json", get(|| async { Json(json!(["a", "b"])) }));
        let (top_base, top_handle) = spawn(top).await;
        let loader = PageDataLoader::builder()
            .parser(parser)
            .top_podcasts_url(Url::parse(&format!("{top_base}/top.json")).unwrap())
            .build();
        let (base, handle) = spawn(router(loader)).await;
        (base, vec![top_handle, handle])
    }

    #[tokio::test]
    async fn serves_page_data_as_json() {
        let feed = Feed {
            title: Some("Show".into()),
            ..Default::default()
        };
        let (base, handles) = spawn_page_server(FixedParser(Some(feed))).await;
        let resp = reqwest::get(format!("{base}/?rss=https%3A%2F%2Fexample.com%2Ffeed.xml"))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(
            body,
            json!({ "title": "Show", "items": [], "topPodcasts": ["a", "b"] })
        );
        handles.iter().for_each(|h| h.abort());
    }

    #[tokio::test]
    async fn feed_failures_are_500s_with_the_message() {
        let (base, handles) = spawn_page_server(FixedParser(None)).await;
        let resp = reqwest::get(format!("{base}/?rss=nope")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let body = resp.text().await.unwrap();
        assert_eq!(body, "Error parsing RSS feed: Feed not recognized as RSS 1 or 2.");
        handles.iter().for_each(|h| h.abort());
    }
}
