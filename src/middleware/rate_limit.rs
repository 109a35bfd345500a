use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};
use serde_json::json;

/// Address of the visitor, used to key per-client limits.
///
/// Taken from the reverse proxy's `X-Real-IP`, then the first
/// `X-Forwarded-For` hop, then the TCP peer (requires serving with
/// `into_make_service_with_connect_info`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub Option<IpAddr>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        Ok(ClientIp(client_ip(&parts.headers, peer)))
    }
}

pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<IpAddr> {
    let from_header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };
    from_header("x-real-ip")
        .or_else(|| from_header("x-forwarded-for"))
        .or(peer)
}

/// Checks a key-scoped rate limit stored in Redis.
///
/// The first request of a window creates the counter with its TTL
/// (`SET NX EX`) and every request increments it, both in one MULTI/EXEC.
/// Redis failures are logged and the request is let through.
pub async fn check_rate_limit(
    redis: &mut redis::aio::MultiplexedConnection,
    key: &str,
    max_attempts: u64,
    window_secs: u64,
) -> Result<(), (StatusCode, Json<serde_json::Value>)> {
    let counted: redis::RedisResult<(u64,)> = redis::pipe()
        .atomic()
        .cmd("SET")
        .arg(key)
        .arg(0)
        .arg("EX")
        .arg(window_secs)
        .arg("NX")
        .ignore()
        .cmd("INCR")
        .arg(key)
        .query_async(redis)
        .await;

    let count = match counted {
        Ok((count,)) => count,
        Err(e) => {
            tracing::warn!("Rate limit check for {} failed, allowing request: {}", key, e);
            return Ok(());
        }
    };

    if count > max_attempts {
        tracing::info!("Rate limit hit for {} ({} attempts)", key, count);
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "Bạn đã gửi quá nhiều yêu cầu. Vui lòng thử lại sau." })),
        ));
    }

    Ok(())
}
