use std::sync::Arc;
use std::time::Duration;

use otp_protocol::config::ServiceConfig;
use otp_protocol::core::cipher;
use otp_protocol::error::{ProtocolError, Result};
use otp_protocol::keygen::generate_key;
use otp_protocol::utils::metrics::ServiceMetrics;
use otp_protocol::{ClientRequester, ServiceListener, ServiceRole};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

fn local_config() -> ServiceConfig {
    ServiceConfig::default_with_overrides(|c| {
        c.server.bind_address = "127.0.0.1".into();
        c.server.shutdown_timeout = Duration::from_secs(1);
        c.client.host = "127.0.0.1".into();
    })
}

struct RunningService {
    port: u16,
    metrics: Arc<ServiceMetrics>,
    shutdown: mpsc::Sender<()>,
    handle: JoinHandle<Result<()>>,
}

impl RunningService {
    fn start(role: ServiceRole, config: &ServiceConfig) -> Self {
        let listener = ServiceListener::bind(role, 0, config).unwrap();
        let port = listener.local_addr().port();
        let metrics = listener.metrics();
        let (shutdown, rx) = mpsc::channel(1);
        let handle = tokio::spawn(listener.run_with_shutdown(rx));

        Self {
            port,
            metrics,
            shutdown,
            handle,
        }
    }

    async fn stop(self) -> Arc<ServiceMetrics> {
        self.shutdown.send(()).await.unwrap();
        self.handle.await.unwrap().unwrap();
        self.metrics
    }
}

#[tokio::test]
async fn hello_world_round_trip() {
    let config = local_config();
    let enc = RunningService::start(ServiceRole::Encryption, &config);
    let dec = RunningService::start(ServiceRole::Decryption, &config);

    let key = b"XMCKLQWERTYUIOP".to_vec();
    let encryptor = ClientRequester::new(ServiceRole::Encryption, enc.port, &config);
    let decryptor = ClientRequester::new(ServiceRole::Decryption, dec.port, &config);

    let ciphertext = encryptor.request(b"HELLO WORLD", &key).await.unwrap();
    assert_eq!(ciphertext.len(), 11);
    assert_eq!(ciphertext, cipher::encrypt(b"HELLO WORLD", &key).unwrap());

    let plaintext = decryptor.request(&ciphertext, &key).await.unwrap();
    assert_eq!(plaintext, b"HELLO WORLD");

    let enc_metrics = enc.stop().await.snapshot();
    assert_eq!(enc_metrics.requests_completed, 1);
    assert_eq!(enc_metrics.symbols_transformed, 11);
    dec.stop().await;
}

#[tokio::test]
async fn large_message_spans_many_units() {
    let config = local_config();
    let enc = RunningService::start(ServiceRole::Encryption, &config);
    let dec = RunningService::start(ServiceRole::Decryption, &config);

    let message: Vec<u8> = b"THE QUICK BROWN FOX JUMPS OVER THE LAZY DOG "
        .iter()
        .copied()
        .cycle()
        .take(70_000)
        .collect();
    let key = generate_key(message.len() + 10);

    let encryptor = ClientRequester::new(ServiceRole::Encryption, enc.port, &config);
    let decryptor = ClientRequester::new(ServiceRole::Decryption, dec.port, &config);

    let ciphertext = encryptor.request(&message, &key).await.unwrap();
    assert_eq!(ciphertext.len(), message.len());
    let plaintext = decryptor.request(&ciphertext, &key).await.unwrap();
    assert_eq!(plaintext, message);

    enc.stop().await;
    dec.stop().await;
}

#[tokio::test]
async fn wrong_service_is_denied() {
    let config = local_config();
    let enc = RunningService::start(ServiceRole::Encryption, &config);

    let decryptor = ClientRequester::new(ServiceRole::Decryption, enc.port, &config);
    let err = decryptor.request(b"HELLO", b"HELLO").await.unwrap_err();

    match &err {
        ProtocolError::IdentityDenied { role, port } => {
            assert_eq!(*role, ServiceRole::Decryption);
            assert_eq!(*port, enc.port);
        }
        other => panic!("Expected IdentityDenied, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 2);

    // The listener keeps serving after a rejection
    let encryptor = ClientRequester::new(ServiceRole::Encryption, enc.port, &config);
    assert!(encryptor.request(b"HELLO", b"AAAAA").await.is_ok());

    let metrics = enc.stop().await.snapshot();
    assert_eq!(metrics.identity_rejections, 1);
    assert_eq!(metrics.requests_completed, 1);
}

#[tokio::test]
async fn unknown_identity_gets_denied_and_closed() {
    let config = local_config();
    let dec = RunningService::start(ServiceRole::Decryption, &config);

    let mut stream = TcpStream::connect(("127.0.0.1", dec.port)).await.unwrap();
    stream.write_all(b"hello_server").await.unwrap();

    let mut reply = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut reply))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply, b"denied");

    dec.stop().await;
}

#[tokio::test]
async fn server_survives_client_vanishing_mid_request() {
    let config = local_config();
    let enc = RunningService::start(ServiceRole::Encryption, &config);

    {
        let mut stream = TcpStream::connect(("127.0.0.1", enc.port)).await.unwrap();
        stream.write_all(b"enc_server").await.unwrap();
        let mut reply = [0u8; 9];
        stream.read_exact(&mut reply).await.unwrap();
        assert_eq!(&reply, b"confirmed");
        stream.write_all(b"20").await.unwrap();
        let mut reply = [0u8; 8];
        stream.read_exact(&mut reply).await.unwrap();
        assert_eq!(&reply, b"continue");
        stream.write_all(b"HALF").await.unwrap();
    }

    let encryptor = ClientRequester::new(ServiceRole::Encryption, enc.port, &config);
    let result = encryptor
        .request(b"STILL HERE", b"ZZZZZZZZZZ")
        .await
        .unwrap();
    assert_eq!(
        cipher::decrypt(&result, b"ZZZZZZZZZZ").unwrap(),
        b"STILL HERE"
    );

    let metrics = enc.stop().await.snapshot();
    assert_eq!(metrics.requests_failed, 1);
    assert_eq!(metrics.requests_completed, 1);
}

#[tokio::test]
async fn concurrent_clients_get_their_own_results() {
    let mut config = local_config();
    config.server.backlog = 64;
    let enc = RunningService::start(ServiceRole::Encryption, &config);

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..20usize {
        let requester = ClientRequester::new(ServiceRole::Encryption, enc.port, &config);
        tasks.spawn(async move {
            let message: Vec<u8> = (0..(100 + i * 37))
                .map(|n| b"ABCDEFGHIJKLMNOPQRSTUVWXYZ "[(n + i) % 27])
                .collect();
            let key = generate_key(message.len());
            let result = requester.request(&message, &key).await.unwrap();
            assert_eq!(cipher::decrypt(&result, &key).unwrap(), message);
        });
    }

    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    let metrics = enc.stop().await.snapshot();
    assert_eq!(metrics.requests_completed, 20);
    assert!(metrics.peak_active_workers <= 6);
}

#[tokio::test]
async fn unreachable_server_is_a_connect_error() {
    let config = local_config();
    // Bind then drop to get a port nothing listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let requester = ClientRequester::new(ServiceRole::Encryption, port, &config);
    let err = requester.request(b"HELLO", b"HELLO").await.unwrap_err();
    assert!(matches!(err, ProtocolError::Connect { .. }));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn validation_happens_before_connecting() {
    let config = local_config();
    // Nothing listens on port 9; validation must fail first
    let requester = ClientRequester::new(ServiceRole::Encryption, 9, &config);

    assert!(matches!(
        requester.request(b"HELLO", b"KEY").await.unwrap_err(),
        ProtocolError::KeyTooShort { .. }
    ));
    assert!(matches!(
        requester.request(b"", b"KEY").await.unwrap_err(),
        ProtocolError::InvalidLength(0)
    ));
}
