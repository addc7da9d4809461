use std::time::Instant;

use http::Extensions;
use reqwest_middleware::{Middleware, Next};
use tracing::{debug, warn};

/// Logs every backend request with its status and latency.
#[derive(Clone, Debug, Default)]
pub(crate) struct RequestLogMiddleware;

#[async_trait::async_trait]
impl Middleware for RequestLogMiddleware {
    async fn handle(
        &self,
        req: reqwest::Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<reqwest::Response> {
        let method = req.method().clone();
        let url = req.url().clone();
        let start = Instant::now();

        let result = next.run(req, extensions).await;
        let elapsed_ms = start.elapsed().as_millis();
        match &result {
            Ok(resp) => debug!(
                %method,
                %url,
                status = resp.status().as_u16(),
                elapsed_ms,
                "backend request finished"
            ),
            Err(err) => warn!(%method, %url, elapsed_ms, error = %err, "backend request failed"),
        }
        result
    }
}
