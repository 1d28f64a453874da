use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use pirsch_proxy_lib::config::ScriptsConfig;
use pirsch_proxy_lib::scripts::{ScriptCache, ScriptError};

mod helpers;
use helpers::{MockApi, TestResult, SCRIPT_BODY};

fn cache(api: &MockApi, ttl_secs: u64) -> TestResult<ScriptCache> {
    let cfg = ScriptsConfig {
        source_url: api.url(),
        remote_file: "pa.js".to_string(),
        ttl_secs,
    };
    Ok(ScriptCache::new(&cfg, Duration::from_secs(5))?)
}

#[tokio::test]
async fn serves_cached_copy_within_ttl() -> TestResult {
    let api = MockApi::start().await?;
    let cache = cache(&api, 3600)?;

    assert_eq!(cache.get().await?, SCRIPT_BODY.as_bytes());
    assert_eq!(cache.get().await?, SCRIPT_BODY.as_bytes());
    assert_eq!(api.state.script_downloads.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn concurrent_requests_download_once() -> TestResult {
    let api = MockApi::start().await?;
    let cache = Arc::new(cache(&api, 3600)?);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get().await })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await??, SCRIPT_BODY.as_bytes());
    }

    assert_eq!(api.state.script_downloads.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn serves_stale_copy_when_source_fails() -> TestResult {
    let api = MockApi::start().await?;
    let cache = cache(&api, 0)?;

    assert_eq!(cache.get().await?, SCRIPT_BODY.as_bytes());

    api.state.script_unavailable.store(true, Ordering::SeqCst);
    assert_eq!(cache.get().await?, SCRIPT_BODY.as_bytes());
    assert_eq!(api.state.script_downloads.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn failed_download_is_not_retried_before_ttl() -> TestResult {
    let api = MockApi::start().await?;
    api.state.script_unavailable.store(true, Ordering::SeqCst);
    let cache = cache(&api, 3600)?;

    assert!(matches!(cache.get().await, Err(ScriptError::Status(503))));

    api.state.script_unavailable.store(false, Ordering::SeqCst);
    assert!(matches!(cache.get().await, Err(ScriptError::Unavailable)));
    assert_eq!(api.state.script_downloads.load(Ordering::SeqCst), 1);
    Ok(())
}
