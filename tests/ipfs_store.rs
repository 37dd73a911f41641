//! IPFS client against the mock API, and against a server that stalls
//! mid-body.

use std::time::{Duration, Instant};

use curavault::config::StorageConfig;
use curavault::storage::{ContentId, ContentStore, IpfsClient, StorageError};

mod common;
use common::{spawn_ipfs, spawn_stalling_server};

fn client(api_url: String, gateway_url: String) -> IpfsClient {
    let config = StorageConfig {
        api_url,
        gateway_url,
        timeout_secs: 1,
        ..StorageConfig::default()
    };
    IpfsClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_put_then_fetch() {
    let ipfs = spawn_ipfs().await;
    let client = client(ipfs.url.clone(), ipfs.gateway());

    let cid = client.put(b"x-ray".to_vec(), "xray.png").await.unwrap();
    assert_eq!(client.fetch(&cid).await.unwrap(), b"x-ray".to_vec());
    assert!(ipfs.state.lock().unwrap().last_authorization.is_none());
}

#[tokio::test]
async fn test_stalled_upload_response_times_out() {
    let url = spawn_stalling_server().await;
    let client = client(url.clone(), format!("{}/ipfs", url));

    let started = Instant::now();
    let err = client.put(b"scan".to_vec(), "scan.pdf").await.unwrap_err();
    assert!(matches!(err, StorageError::Timeout(1)));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_stalled_download_times_out() {
    let url = spawn_stalling_server().await;
    let client = client(url.clone(), format!("{}/ipfs", url));

    let cid: ContentId = "bafystalled".parse().unwrap();
    let err = client.fetch(&cid).await.unwrap_err();
    assert!(matches!(err, StorageError::Timeout(1)));
}
