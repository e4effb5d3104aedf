use reqwest::{header, Request, Response};
use reqwest_middleware::{Middleware, Next};
use http::Extensions;
use std::sync::Arc;

/// Something that can hand out the signed-in user's ID token.
///
/// `Ok(None)` means nobody is signed in; requests then go out unauthenticated
/// and the backend's security rules decide.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync {
    async fn id_token(&self) -> Result<Option<String>, anyhow::Error>;
}

/// Attaches `Authorization: Bearer <id token>` to outgoing requests.
#[derive(Clone)]
pub struct IdTokenMiddleware {
    source: Arc<dyn TokenSource>,
}

impl IdTokenMiddleware {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self { source }
    }
}

#[async_trait::async_trait]
impl Middleware for IdTokenMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let token = self.source.id_token().await.map_err(|e| {
            reqwest_middleware::Error::Middleware(anyhow::anyhow!("Failed to get ID token: {}", e))
        })?;

        if let Some(token) = token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
                reqwest_middleware::Error::Middleware(anyhow::anyhow!("Invalid ID token: {}", e))
            })?;
            req.headers_mut().insert(header::AUTHORIZATION, value);
        }

        next.run(req, extensions).await
    }
}
