// One shared game server per integration test binary.
//
// Each `#[tokio::test]` owns a short-lived runtime, so the server runs on a
// dedicated OS thread with its own runtime and outlives the individual tests.
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{OnceLock, mpsc};
use std::time::{Duration, Instant};

const READY_TIMEOUT: Duration = Duration::from_secs(2);

static BASE_URL: OnceLock<String> = OnceLock::new();

// Short countdown so tests reach the gameplay phase quickly.
fn test_settings() -> game_server::ServerSettings {
    let mut settings = game_server::ServerSettings::from_env();
    settings.static_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("public");
    settings.world.gameplay_countdown = Duration::from_millis(200);
    settings
}

/// Starts the server on first use and returns its `http://host:port` base URL.
pub fn ensure_server() -> &'static str {
    BASE_URL.get_or_init(|| {
        let (addr_tx, addr_rx) = mpsc::channel::<SocketAddr>();

        std::thread::Builder::new()
            .name("test-game-server".into())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_multi_thread()
                    .enable_all()
                    .build()
                    .expect("test runtime");
                runtime.block_on(async move {
                    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                        .await
                        .expect("bind ephemeral test port");
                    let addr = listener.local_addr().expect("local addr");
                    addr_tx.send(addr).expect("publish server addr");
                    game_server::run_with_settings(listener, test_settings())
                        .await
                        .expect("server failed");
                });
            })
            .expect("spawn server thread");

        let addr = addr_rx
            .recv_timeout(READY_TIMEOUT)
            .expect("server did not publish its address");
        wait_until_accepting(addr);
        format!("http://{addr}")
    })
}

fn wait_until_accepting(addr: SocketAddr) {
    let deadline = Instant::now() + READY_TIMEOUT;
    while Instant::now() < deadline {
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("server at {addr} did not accept connections in time");
}
