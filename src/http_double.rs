use tokio::runtime::{Builder, Runtime};
use wiremock::{Mock, MockServer};

/// Starts a mock HTTP server with `mocks` mounted. The blocking clients under
/// test must run outside the returned runtime, so callers keep it alive for
/// as long as the server and make their requests from the test thread.
pub fn serve(mocks: Vec<Mock>) -> (Runtime, MockServer) {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        for mock in mocks {
            mock.mount(&server).await;
        }
        server
    });
    (runtime, server)
}
