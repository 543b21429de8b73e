//! End-to-end behaviour of the response cache coordinator.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use common::{MapStore, UnreachableStore, recorder, settings_for};
use http::header::ACCEPT_LANGUAGE;
use http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use tagcache::http::{RESPONSE_CACHE_STATUS, SERVER_TIMING};
use tagcache::{
    Bypass, CacheError, CacheEvent, CacheSettings, CacheStrategy, CachedResponse, DefaultStrategy,
    HeaderScopedStrategy, ReloadableSettings, Repository, RequestHead, ResponseCache,
    RouteParams, Runtime, Store, StoreError, Tag, TagSet, TaggableStore,
};
use tagcache_moka::MokaStore;

fn moka() -> MokaStore {
    MokaStore::builder().max_entries(1_000).build()
}

fn cache_with(settings: CacheSettings) -> ResponseCache<MokaStore> {
    ResponseCache::builder(Repository::new(moka()))
        .settings(settings)
        .build()
        .unwrap()
}

fn cache() -> ResponseCache<MokaStore> {
    cache_with(CacheSettings::default())
}

fn get(uri: &str) -> Request<()> {
    Request::get(uri).body(()).unwrap()
}

fn user_request(id: &str) -> Request<()> {
    let mut request = get(&format!("/users/{id}"));
    request
        .extensions_mut()
        .insert(RouteParams::new().with("user", id));
    request
}

fn ok(body: &'static str) -> CachedResponse {
    CachedResponse::new(StatusCode::OK, body)
}

fn tags(names: &[&str]) -> Vec<Tag> {
    names.iter().copied().map(Tag::from).collect()
}

#[tokio::test]
async fn test_put_then_get_round_trip() {
    let cache = cache();
    let request = get("/cached");

    assert!(!cache.has(&request, &[]).await.unwrap());
    cache.put(&request, &ok("1"), &[], None).await.unwrap();
    assert!(cache.has(&request, &[]).await.unwrap());

    let cached = cache.get(&request, &[]).await.unwrap().unwrap();
    assert_eq!(cached.status(), StatusCode::OK);
    assert_eq!(cached.body(), &Bytes::from_static(b"1"));
    assert_eq!(cached.headers()[RESPONSE_CACHE_STATUS], "hit");
}

#[tokio::test]
async fn test_put_leaves_original_response_untouched() {
    let cache = cache_with(CacheSettings {
        server_timing: true,
        ..CacheSettings::default()
    });
    let response = ok("1");
    cache.put(&get("/"), &response, &[], None).await.unwrap();
    assert!(response.headers().is_empty());
}

#[tokio::test]
async fn test_ineligible_responses_are_not_stored() {
    let cache = cache();

    let post = Request::post("/cached").body(()).unwrap();
    cache.put(&post, &ok("1"), &[], None).await.unwrap();
    assert!(!cache.has(&post, &[]).await.unwrap());

    for status in [StatusCode::NOT_FOUND, StatusCode::INTERNAL_SERVER_ERROR] {
        let request = get("/broken");
        cache
            .put(&request, &CachedResponse::new(status, "oops"), &[], None)
            .await
            .unwrap();
        assert!(!cache.has(&request, &[]).await.unwrap());
    }

    let redirect = get("/moved");
    cache
        .put(&redirect, &CachedResponse::new(StatusCode::FOUND, ""), &[], None)
        .await
        .unwrap();
    assert!(cache.has(&redirect, &[]).await.unwrap());
}

#[tokio::test]
async fn test_bypass_marker_skips_storage() {
    let cache = cache();
    let mut request = get("/bypass");
    request.extensions_mut().insert(Bypass);

    cache.put(&request, &ok("1"), &[], None).await.unwrap();
    assert!(!cache.has(&get("/bypass"), &[]).await.unwrap());
}

#[tokio::test]
async fn test_flush_by_tag_removes_only_that_group() {
    let cache = cache();
    let users = get("/users");
    let posts = get("/posts");
    cache.put(&users, &ok("u"), &tags(&["users"]), None).await.unwrap();
    cache.put(&posts, &ok("p"), &tags(&["posts"]), None).await.unwrap();

    cache.flush(Some(tags(&["users"]).as_slice())).await.unwrap();

    assert!(!cache.has(&users, &tags(&["users"])).await.unwrap());
    assert!(cache.has(&posts, &tags(&["posts"])).await.unwrap());
}

#[tokio::test]
async fn test_placeholder_tags_resolve_per_request() {
    let cache = cache();
    let template = tags(&["users", "users.{user}"]);
    let first = user_request("42");
    let second = user_request("7");
    cache.put(&first, &ok("42"), &template, None).await.unwrap();
    cache.put(&second, &ok("7"), &template, None).await.unwrap();

    cache.flush(Some(tags(&["users.42"]).as_slice())).await.unwrap();

    assert!(!cache.has(&first, &template).await.unwrap());
    assert!(cache.has(&second, &template).await.unwrap());
}

#[tokio::test]
async fn test_flush_without_tags_clears_everything() {
    let cache = cache();
    cache.put(&get("/a"), &ok("a"), &tags(&["a"]), None).await.unwrap();
    cache.put(&get("/b"), &ok("b"), &[], None).await.unwrap();

    cache.flush(None).await.unwrap();

    assert!(!cache.has(&get("/a"), &tags(&["a"])).await.unwrap());
    assert!(!cache.has(&get("/b"), &[]).await.unwrap());
}

#[tokio::test]
async fn test_default_tags_apply_to_every_operation() {
    let cache = cache_with(CacheSettings {
        tags: vec!["responses".to_owned()],
        ..CacheSettings::default()
    });
    let request = get("/cached");
    cache.put(&request, &ok("1"), &[], None).await.unwrap();

    let view: TagSet = ["responses"].into_iter().collect();
    let key = cache.strategy().key(&RequestHead::from(&request));
    let scoped = cache.repository().store().tags(&view).unwrap();
    assert!(scoped.has(&key).await.unwrap());

    cache.flush(None).await.unwrap();
    assert!(!cache.has(&request, &[]).await.unwrap());
}

#[tokio::test]
async fn test_delete_removes_listed_uris() {
    let cache = cache();
    cache.put(&get("/users"), &ok("u"), &[], None).await.unwrap();
    cache.put(&get("/posts"), &ok("p"), &[], None).await.unwrap();
    cache.put(&get("/teams"), &ok("t"), &[], None).await.unwrap();

    cache
        .delete(&["/users", "http://localhost/posts", "/missing"], &[])
        .await
        .unwrap();

    assert!(!cache.has(&get("/users"), &[]).await.unwrap());
    assert!(!cache.has(&get("/posts"), &[]).await.unwrap());
    assert!(cache.has(&get("/teams"), &[]).await.unwrap());
}

#[tokio::test]
async fn test_server_timing_and_status_headers() {
    let cache = cache_with(CacheSettings {
        server_timing: true,
        cache_status_enabled: false,
        ..CacheSettings::default()
    });
    let request = get("/timed");
    cache.put(&request, &ok("1"), &[], None).await.unwrap();

    let cached = cache.get(&request, &[]).await.unwrap().unwrap();
    let timing = cached.headers()[SERVER_TIMING].to_str().unwrap();
    assert!(timing.starts_with("response-cache;desc=\""));
    assert!(cached.headers().get(RESPONSE_CACHE_STATUS).is_none());
}

#[tokio::test]
async fn test_status_header_follows_current_settings() {
    let settings = ReloadableSettings::new(CacheSettings {
        cache_status_enabled: false,
        ..CacheSettings::default()
    });
    let cache = ResponseCache::builder(Repository::new(moka()))
        .settings(settings.clone())
        .build()
        .unwrap();
    let request = get("/reloaded");

    // written while the header is off
    cache.put(&request, &ok("1"), &[], None).await.unwrap();
    let cached = cache.get(&request, &[]).await.unwrap().unwrap();
    assert!(cached.headers().get(RESPONSE_CACHE_STATUS).is_none());

    settings.replace(CacheSettings::default());
    let cached = cache.get(&request, &[]).await.unwrap().unwrap();
    assert_eq!(cached.headers()[RESPONSE_CACHE_STATUS], "hit");

    settings.replace(CacheSettings {
        cache_status_enabled: false,
        ..CacheSettings::default()
    });
    let cached = cache.get(&request, &[]).await.unwrap().unwrap();
    assert!(cached.headers().get(RESPONSE_CACHE_STATUS).is_none());
}

#[tokio::test]
async fn test_stored_payload_has_no_status_header() {
    let cache = cache();
    let request = get("/raw");
    cache.put(&request, &ok("1"), &[], None).await.unwrap();

    let key = cache.strategy().key(&RequestHead::from(&request));
    let stored: CachedResponse = cache
        .repository()
        .get(&key, &TagSet::new())
        .await
        .unwrap()
        .unwrap();
    assert!(stored.headers().get(RESPONSE_CACHE_STATUS).is_none());
}

#[tokio::test]
async fn test_enabled_state() {
    let disabled = CacheSettings {
        enabled: false,
        ..CacheSettings::default()
    };
    assert!(cache().enabled());
    assert!(!cache_with(disabled.clone()).enabled());

    let forced = ResponseCache::builder(Repository::new(moka()))
        .settings(disabled)
        .runtime(Runtime {
            test_harness: true,
            console: false,
        })
        .build()
        .unwrap();
    assert!(forced.enabled());
}

#[tokio::test]
async fn test_ttl_expires_entries() {
    let cache = cache();
    let request = get("/short");
    cache
        .put(&request, &ok("1"), &[], Some(Duration::from_millis(50)))
        .await
        .unwrap();
    assert!(cache.has(&request, &[]).await.unwrap());

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!cache.has(&request, &[]).await.unwrap());
}

#[tokio::test]
async fn test_untagged_store_flushes_everything() {
    let events = recorder();
    let repository = Repository::new(MapStore::default()).with_observer(Arc::clone(&events));
    let cache = ResponseCache::builder(repository)
        .settings(settings_for("map"))
        .build()
        .unwrap();

    cache.put(&get("/a"), &ok("a"), &tags(&["a"]), None).await.unwrap();
    cache.put(&get("/b"), &ok("b"), &tags(&["b"]), None).await.unwrap();
    assert!(cache.has(&get("/a"), &tags(&["a"])).await.unwrap());

    cache.flush(Some(tags(&["a"]).as_slice())).await.unwrap();

    assert!(!cache.has(&get("/b"), &tags(&["b"])).await.unwrap());
    assert_eq!(
        events.events(),
        vec![CacheEvent::Flush {
            tags: Some(tags(&["a"]))
        }]
    );
}

#[tokio::test]
async fn test_corrupted_payload_is_an_error() {
    let store = Arc::new(MapStore::default());
    let cache = ResponseCache::builder(Repository::from_arc(Arc::clone(&store)))
        .settings(settings_for("map"))
        .build()
        .unwrap();
    let request = get("/corrupted");
    let key = cache.strategy().key(&RequestHead::from(&request));
    store
        .put(&key, Bytes::from_static(b"\x00garbage"), None)
        .await
        .unwrap();

    let result = cache.get(&request, &[]).await;
    assert!(matches!(
        result,
        Err(CacheError::Store(StoreError::FormatError(_)))
    ));
}

#[tokio::test]
async fn test_store_errors_propagate() {
    let cache = ResponseCache::builder(Repository::new(UnreachableStore))
        .settings(settings_for("unreachable"))
        .build()
        .unwrap();
    let request = get("/down");

    assert!(matches!(
        cache.has(&request, &[]).await,
        Err(CacheError::Store(StoreError::ConnectionError(_)))
    ));
    assert!(matches!(
        cache.put(&request, &ok("1"), &[], None).await,
        Err(CacheError::Store(StoreError::ConnectionError(_)))
    ));
    assert!(cache.flush(None).await.is_err());
}

#[tokio::test]
async fn test_invalid_tags_are_rejected() {
    let cache = cache();
    let result = cache
        .put(&get("/"), &ok("1"), &tags(&["bad\ntag"]), None)
        .await;
    assert!(matches!(
        result,
        Err(CacheError::Store(StoreError::InvalidTags { .. }))
    ));
}

#[tokio::test]
async fn test_header_scoped_strategy() {
    let cache = ResponseCache::builder(Repository::new(moka()))
        .strategy(HeaderScopedStrategy::new(
            DefaultStrategy::new(),
            [ACCEPT_LANGUAGE],
        ))
        .build()
        .unwrap();
    let german = Request::get("/").header(ACCEPT_LANGUAGE, "de").body(()).unwrap();
    let english = Request::get("/").header(ACCEPT_LANGUAGE, "en").body(()).unwrap();

    cache.put(&german, &ok("hallo"), &[], None).await.unwrap();

    assert!(cache.has(&german, &[]).await.unwrap());
    assert!(!cache.has(&english, &[]).await.unwrap());
}

#[tokio::test]
async fn test_invalid_delete_uri() {
    let cache = cache();
    let result = cache.delete(&["http://bad host/x"], &[]).await;
    assert!(matches!(result, Err(CacheError::InvalidUri(_))));
}

#[tokio::test]
async fn test_settings_select_the_store() {
    let mismatch = ResponseCache::builder(Repository::new(MapStore::default())).build();
    assert!(matches!(
        mismatch,
        Err(CacheError::StoreMismatch { ref configured, ref actual })
            if configured == "moka" && actual == "map"
    ));

    let yaml = "store: map\n";
    let settings = CacheSettings::from_yaml(yaml).unwrap();
    let cache = ResponseCache::builder(Repository::new(MapStore::default()))
        .settings(settings)
        .build()
        .unwrap();
    assert_eq!(cache.repository().store().label().as_str(), "map");

    let labelled = MokaStore::builder().label("responses").max_entries(10).build();
    assert!(
        ResponseCache::builder(Repository::new(labelled))
            .settings(settings_for("responses"))
            .build()
            .is_ok()
    );
}

/// Tags each stored response with its status code and records whether
/// `tags` saw a response.
struct StatusTagStrategy {
    inner: DefaultStrategy,
    calls: Arc<Mutex<Vec<bool>>>,
}

impl CacheStrategy for StatusTagStrategy {
    fn fingerprint(&self, request: &RequestHead<'_>) -> String {
        self.inner.fingerprint(request)
    }

    fn tags(&self, _request: &RequestHead<'_>, response: Option<&CachedResponse>) -> Vec<Tag> {
        self.calls.lock().unwrap().push(response.is_some());
        response
            .map(|response| vec![Tag::from(format!("status.{}", response.status().as_u16()))])
            .unwrap_or_default()
    }
}

#[tokio::test]
async fn test_response_tags_only_apply_on_write() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let cache = ResponseCache::builder(Repository::new(moka()))
        .strategy(StatusTagStrategy {
            inner: DefaultStrategy::new(),
            calls: Arc::clone(&calls),
        })
        .build()
        .unwrap();
    let request = get("/statuses");
    let redirect = get("/redirect");

    cache.put(&request, &ok("1"), &[], None).await.unwrap();
    cache
        .put(&redirect, &CachedResponse::new(StatusCode::FOUND, ""), &[], None)
        .await
        .unwrap();
    assert!(cache.has(&request, &[]).await.unwrap());
    assert!(cache.get(&request, &[]).await.unwrap().is_some());
    assert_eq!(*calls.lock().unwrap(), vec![true, true, false, false]);

    cache.flush(Some(tags(&["status.200"]).as_slice())).await.unwrap();

    assert!(!cache.has(&request, &[]).await.unwrap());
    assert!(cache.has(&redirect, &[]).await.unwrap());
}
