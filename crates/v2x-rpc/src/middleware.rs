// crates/v2x-rpc/src/middleware.rs
//
// Middleware for the RPC server: request logging.

use tonic::{Request, Status};

/// Logging interceptor for incoming tonic requests.
///
/// Logs the peer address and metadata of each request using `tracing`.
pub fn logging_interceptor(req: Request<()>) -> Result<Request<()>, Status> {
    tracing::debug!(
        remote = ?req.remote_addr(),
        metadata = ?req.metadata(),
        "Incoming RPC request"
    );
    Ok(req)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interceptor_passes_requests_through() {
        let mut req = Request::new(());
        req.metadata_mut()
            .insert("x-request-id", "abc".parse().unwrap());
        let passed = logging_interceptor(req).unwrap();
        let value = passed.metadata().get("x-request-id").unwrap();
        assert_eq!(value.to_str().unwrap(), "abc");
    }
}
