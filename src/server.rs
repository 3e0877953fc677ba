use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use log::{debug, info};
use tokio::net::TcpListener;

/// Maps a request path onto a file under `root`.
///
/// `/` and any path ending in `/` map to that directory's `index.html`.
/// Paths that fail to decode or try to climb out of `root` map to nothing.
fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(request_path).ok()?;
    let relative = Path::new(decoded.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }
    let path = root.join(relative);
    Some(if decoded.ends_with('/') {
        path.join("index.html")
    } else {
        path
    })
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("js") => "text/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") => "image/jpg",
        Some("svg") => "image/svg+xml",
        Some("xml") => "application/xml",
        _ => "text/html",
    }
}

async fn serve_file(State(root): State<Arc<PathBuf>>, uri: Uri) -> Response {
    let Some(path) = resolve(&root, uri.path()) else {
        return (StatusCode::NOT_FOUND, format!("Not Found: {}", uri.path())).into_response();
    };
    debug!("GET {} -> {path:?}", uri.path());
    match tokio::fs::read(&path).await {
        Ok(body) => ([(header::CONTENT_TYPE, content_type(&path))], body).into_response(),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, format!("Not Found: {}", uri.path())).into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Server Error: {err}"),
        )
            .into_response(),
    }
}

fn build_router(root: PathBuf) -> Router {
    Router::new()
        .fallback(serve_file)
        .with_state(Arc::new(root))
}

/// Serves `root` on `127.0.0.1:port` until the process is stopped.
pub(crate) async fn run(root: PathBuf, port: u16) -> anyhow::Result<()> {
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("while binding {addr}"))?;
    info!("Serving {root:?} at http://localhost:{port} (Ctrl+C to stop)");
    axum::serve(listener, build_router(root))
        .await
        .context("while serving")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("/", Some("index.html"))]
    #[case("/posts/Hello-World/", Some("posts/Hello-World/index.html"))]
    #[case("/assets/style.css", Some("assets/style.css"))]
    #[case(
        "/posts/%E4%BB%A3%E7%A0%81%E4%B9%8B%E7%BE%8E/",
        Some("posts/代码之美/index.html")
    )]
    #[case("/../secret", None)]
    #[case("/posts/%2E%2E/%2E%2E/secret", None)]
    fn resolves_request_paths(#[case] request: &str, #[case] expected: Option<&str>) {
        let root = Path::new("/site");
        assert_eq!(resolve(root, request), expected.map(|p| root.join(p)));
    }

    #[rstest]
    #[case("a.js", "text/javascript")]
    #[case("a.css", "text/css")]
    #[case("search-index.json", "application/json")]
    #[case("a.png", "image/png")]
    #[case("a.jpg", "image/jpg")]
    #[case("a.svg", "image/svg+xml")]
    #[case("atom.xml", "application/xml")]
    #[case("index.html", "text/html")]
    #[case("LICENSE", "text/html")]
    fn picks_content_type_by_extension(#[case] file: &str, #[case] expected: &str) {
        assert_eq!(content_type(Path::new(file)), expected);
    }

    async fn get(root: &Path, path: &'static str) -> (StatusCode, Option<String>, String) {
        let response = serve_file(
            State(Arc::new(root.to_path_buf())),
            Uri::from_static(path),
        )
        .await;
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8_lossy(&body).to_string())
    }

    #[tokio::test]
    async fn serves_files_and_reports_missing_ones() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("index.html"), "<h1>home</h1>")?;
        std::fs::create_dir(dir.path().join("assets"))?;
        std::fs::write(dir.path().join("assets/app.js"), "let a;")?;

        let (status, ty, body) = get(dir.path(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ty.as_deref(), Some("text/html"));
        assert_eq!(body, "<h1>home</h1>");

        let (status, ty, _) = get(dir.path(), "/assets/app.js?v=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ty.as_deref(), Some("text/javascript"));

        let (status, _, body) = get(dir.path(), "/nope/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Not Found: /nope/");

        // A directory without a trailing slash cannot be read as a file.
        let (status, _, _) = get(dir.path(), "/assets").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    }
}
