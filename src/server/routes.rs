use std::fs::File;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::config::Config;
use crate::http::connection::Handler;
use crate::http::error::HttpError;
use crate::http::headers::Headers;
use crate::http::request::Request;
use crate::http::response::{default_headers, StatusCode};
use crate::http::writer::ResponseWriter;
use crate::proxy::upstream::Upstream;

const BAD_REQUEST_PAGE: &str = "<html>
  <head>
    <title>400 Bad Request</title>
  </head>
  <body>
    <h1>Bad Request</h1>
    <p>The server could not understand this request.</p>
  </body>
</html>";

const NOT_FOUND_PAGE: &str = "<html>
  <head>
    <title>404 Not Found</title>
  </head>
  <body>
    <h1>Not Found</h1>
    <p>Nothing lives at this address.</p>
  </body>
</html>";

const INTERNAL_ERROR_PAGE: &str = "<html>
  <head>
    <title>500 Internal Server Error</title>
  </head>
  <body>
    <h1>Internal Server Error</h1>
    <p>Something went wrong on our side.</p>
  </body>
</html>";

const OK_PAGE: &str = "<html>
  <head>
    <title>200 OK</title>
  </head>
  <body>
    <h1>Success!</h1>
    <p>Your request was handled.</p>
  </body>
</html>";

/// Route table of the demo server.
///
/// - `/yourproblem` answers 400, `/myproblem` answers 500
/// - `/httpbin/...` streams the same path from the upstream
/// - `/video/...` streams a file below the assets directory
/// - anything else answers 200
#[derive(Debug, Clone)]
pub struct App {
    assets_dir: PathBuf,
    upstream: Upstream,
}

impl App {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let upstream = Upstream::new(&cfg.upstream_url, cfg.upstream_timeout())?;
        Ok(Self::with_parts(cfg.assets_dir.clone(), upstream))
    }

    pub fn with_parts(assets_dir: PathBuf, upstream: Upstream) -> Self {
        Self {
            assets_dir,
            upstream,
        }
    }

    /// Opens the regular file `target` names below the assets directory.
    fn open_asset(&self, target: &str) -> Option<File> {
        let relative = Path::new(target.trim_start_matches('/'));
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            warn!(request_target = target, "Rejected asset path");
            return None;
        }

        let path = self.assets_dir.join(relative);
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                warn!(path = %path.display(), "Asset is not a regular file");
                return None;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Asset unavailable");
                return None;
            }
        }

        File::open(&path)
            .inspect_err(|e| warn!(path = %path.display(), error = %e, "Failed to open asset"))
            .ok()
    }

    fn stream_upstream<W: Write>(
        &self,
        writer: &mut ResponseWriter<W>,
        headers: &mut Headers,
        path: &str,
    ) -> Result<(), HttpError> {
        match self.upstream.fetch(path) {
            Ok(body) => {
                if let Some(content_type) = body.head().headers.get("Content-Type") {
                    headers.replace("Content-Type", content_type);
                }
                writer.write_chunks_from_reader(StatusCode::Ok.as_u16(), body, headers)?;
                Ok(())
            }
            Err(e) => {
                warn!(path, error = %e, "Upstream request failed");
                writer.write_message(
                    StatusCode::InternalServerError.as_u16(),
                    headers,
                    INTERNAL_ERROR_PAGE.as_bytes(),
                )
            }
        }
    }
}

impl Handler for App {
    fn handle<W: Write>(
        &self,
        writer: &mut ResponseWriter<W>,
        request: &Request,
    ) -> Result<(), HttpError> {
        let mut headers = default_headers(0);
        headers.replace("Content-Type", "text/html");

        let target = request.target();
        let (status, page) = match target {
            "/yourproblem" => (StatusCode::BadRequest, BAD_REQUEST_PAGE),
            "/myproblem" => (StatusCode::InternalServerError, INTERNAL_ERROR_PAGE),
            _ if target.starts_with("/httpbin/") => {
                let path = &target["/httpbin".len()..];
                return self.stream_upstream(writer, &mut headers, path);
            }
            _ if target.starts_with("/video/") => match self.open_asset(target) {
                Some(file) => {
                    headers.replace("Content-Type", "video/mp4");
                    writer.write_chunks_from_reader(StatusCode::Ok.as_u16(), file, &mut headers)?;
                    return Ok(());
                }
                None => (StatusCode::NotFound, NOT_FOUND_PAGE),
            },
            _ => (StatusCode::Ok, OK_PAGE),
        };

        writer.write_message(status.as_u16(), &mut headers, page.as_bytes())
    }
}
