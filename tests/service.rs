//! Integration tests for the tokio channel access service.

pub mod common;

use common::harness::init_tracing;
use lbt_access::{
    access::{AccessCommand, BusySource},
    config::Config,
    service,
};
use std::time::Duration;
use tokio::time::{sleep, timeout};

#[tokio::test(start_paused = true)]
async fn test_concurrent_requesters_share_one_grant() {
    init_tracing();
    let (handle, mut rx) = service::spawn(Config::default(), 9).unwrap();

    handle
        .notify_channel_busy(BusySource::EnergyDetect, Duration::from_millis(3))
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            handle.request_access().await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    sleep(Duration::from_millis(50)).await;
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.stats.requests, 4);
    assert_eq!(snapshot.stats.duplicate_requests, 3);
    assert_eq!(snapshot.stats.grants, 1);

    let mut grants = Vec::new();
    while let Ok(command) = rx.try_recv() {
        if let AccessCommand::Grant { start, .. } = command {
            grants.push(start);
        }
    }
    assert_eq!(grants.len(), 1);
    assert!(grants[0] >= Duration::from_millis(3) + Duration::from_micros(43));
}

#[tokio::test(start_paused = true)]
async fn test_service_serves_repeated_cycles() {
    init_tracing();
    let (handle, mut rx) = service::spawn(Config::default(), 2).unwrap();

    for round in 0..5u32 {
        sleep(Duration::from_millis(10)).await;
        handle
            .notify_channel_busy(BusySource::EnergyDetect, Duration::from_micros(300))
            .await
            .unwrap();
        handle.request_access().await.unwrap();

        let grant = timeout(Duration::from_secs(1), async {
            loop {
                match rx.recv().await {
                    Some(AccessCommand::Grant { start, .. }) => break start,
                    Some(_) => continue,
                    None => panic!("service stopped"),
                }
            }
        })
        .await
        .unwrap();
        assert!(grant >= Duration::from_millis(10) * (round + 1));
    }

    let snapshot = handle.shutdown().await.unwrap();
    assert_eq!(snapshot.stats.grants, 5);
}
