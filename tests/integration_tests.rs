//! Integration tests for Stash

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use stash::backend::{Backend, CookieDocument, CookieJar, CookieStorage, MemoryStorage, Unavailable};
use stash::{use_stash, Expiration, Stash, StashConfig, StashError, StashOptions, StorageType};

struct Fixture {
    local: MemoryStorage,
    session: MemoryStorage,
    jar: CookieJar,
    stash: Stash,
}

fn fixture() -> Fixture {
    let _ = env_logger::builder()
        .parse_default_env()
        .is_test(true)
        .try_init();

    let local = MemoryStorage::new();
    let session = MemoryStorage::new();
    let jar = CookieJar::new();
    let stash = Stash::new(local.clone(), session.clone(), CookieStorage::new(jar.clone()));
    Fixture {
        local,
        session,
        jar,
        stash,
    }
}

#[test]
fn set_and_get_from_local() {
    let f = fixture();
    f.stash.set("testKey", "testValue", &StashOptions::local());
    assert_eq!(
        f.stash.get::<String>("testKey", &StashOptions::local()).as_deref(),
        Some("testValue")
    );
}

#[test]
fn set_and_get_from_session() {
    let f = fixture();
    f.stash.set("testKey", "testValue", &StashOptions::session());
    assert_eq!(
        f.stash.get::<String>("testKey", &StashOptions::session()).as_deref(),
        Some("testValue")
    );
    assert!(f.session.get("testKey").is_some());
    assert!(f.local.is_empty());
}

#[test]
fn set_and_get_from_cookies() {
    let f = fixture();
    f.stash.set("testKey", "testValue", &StashOptions::cookie());
    assert_eq!(
        f.stash.get::<String>("testKey", &StashOptions::cookie()).as_deref(),
        Some("testValue")
    );
    assert_eq!(
        f.jar.cookie(),
        "testKey=%7B%22value%22%3A%22testValue%22%2C%22expires%22%3Anull%7D"
    );
}

#[test]
fn remove_from_every_type() {
    let f = fixture();
    for storage in StorageType::ALL {
        let options = StashOptions::new().with_type(storage);
        f.stash.set("testKey", "testValue", &options);
        f.stash.remove("testKey", &options);
        assert_eq!(f.stash.get::<String>("testKey", &options), None, "{storage}");
    }
}

#[test]
fn clear_every_type() {
    let f = fixture();
    for storage in StorageType::ALL {
        let options = StashOptions::new().with_type(storage);
        f.stash.set("testKey1", "testValue1", &options);
        f.stash.set("testKey2", "testValue2", &options);
        f.stash.clear(&options);
        assert_eq!(f.stash.get::<String>("testKey1", &options), None, "{storage}");
        assert_eq!(f.stash.get::<String>("testKey2", &options), None, "{storage}");
    }
}

#[test]
fn clear_only_touches_named_backend() {
    let f = fixture();
    f.stash.set("k", &1, &StashOptions::local());
    f.stash.set("k", &2, &StashOptions::session());
    f.stash.clear(&StashOptions::local());
    assert_eq!(f.stash.get::<i32>("k", &StashOptions::session()), Some(2));
}

#[test]
fn remove_and_clear_on_full_backend() {
    let local = MemoryStorage::with_quota(100);
    let stash = Stash::new(local.clone(), MemoryStorage::new(), Unavailable);
    let options = StashOptions::local();
    stash.set("a", "0123456789", &options);
    stash.set("b", "0123456789", &options);
    stash.set("c", "0123456789", &options);

    let mut keys = local.keys();
    keys.sort();
    assert_eq!(keys, vec!["a", "b"]);
    assert!(!stash.is_available(StorageType::Local));
    assert_eq!(stash.get::<String>("a", &options).as_deref(), Some("0123456789"));

    stash.remove("a", &options);
    assert_eq!(local.keys(), vec!["b"]);

    stash.set("c", "0123456789", &options);
    stash.clear(&options);
    assert!(local.is_empty());
    assert_eq!(local.size(), 0);
}

#[test]
fn cookie_clear_is_global() {
    let f = fixture();
    f.jar.set_cookie("analytics=abc; path=/");
    f.stash.set("mine", &true, &StashOptions::cookie());
    f.stash.clear(&StashOptions::cookie());
    assert_eq!(f.jar.cookie(), "");
}

#[test]
fn expired_data_returns_none() {
    let f = fixture();
    let options = StashOptions::local().with_expires("1ms".parse::<Expiration>().unwrap());
    f.stash.set("testKey", "testValue", &options);

    thread::sleep(Duration::from_millis(5));
    assert_eq!(f.stash.get::<String>("testKey", &StashOptions::local()), None);
    assert_eq!(f.local.get("testKey"), None);
}

#[test]
fn expiry_stored_as_utc_string() {
    let f = fixture();
    let options = StashOptions::session().with_expires("2h".parse::<Expiration>().unwrap());
    f.stash.set("token", "abc", &options);

    let text = f.session.get("token").unwrap();
    let entry = stash::Entry::decode(&text).unwrap();
    let expires = entry.expires().unwrap();
    assert!(expires.ends_with(" GMT"), "{expires}");
    assert!(entry.expires_at().unwrap() > chrono::Utc::now());
}

#[test]
fn cookie_expiry_drops_cookie() {
    let f = fixture();
    let past = chrono::Utc::now() - chrono::TimeDelta::minutes(1);
    f.stash.set("stale", "v", &StashOptions::cookie().with_expires(past));
    assert_eq!(f.jar.cookie(), "");
    assert_eq!(f.stash.get::<String>("stale", &StashOptions::cookie()), None);
}

#[test]
fn invalid_expiration_is_rejected() {
    assert!(matches!(
        "10y".parse::<Expiration>(),
        Err(StashError::InvalidExpiration(text)) if text == "10y"
    ));
}

#[test]
fn unavailable_local_falls_back_to_session() {
    let session = MemoryStorage::new();
    let stash = Stash::new(Unavailable, session.clone(), Unavailable);

    assert!(!stash.is_available(StorageType::Local));
    stash.set("k", "v", &StashOptions::local().with_fallback(true));
    assert_eq!(session.len(), 1);

    assert!(matches!(
        stash.try_get::<String>("k", &StashOptions::local()),
        Err(StashError::Unavailable(StorageType::Local))
    ));
    assert_eq!(stash.get::<String>("k", &StashOptions::local()), None);
}

#[test]
fn cookie_path_from_config() {
    let jar = CookieJar::new();
    let config = StashConfig::default().with_cookie_path("/app");
    let stash = Stash::in_memory_with_config(config.clone());
    assert_eq!(stash.config().cookie_path, "/app");

    let cookies = CookieStorage::new(jar.clone()).with_path(config.cookie_path.clone());
    let stash = Stash::with_config(MemoryStorage::new(), MemoryStorage::new(), cookies, config);
    stash.set("k", "v", &StashOptions::cookie());
    stash.remove("k", &StashOptions::cookie());
    assert_eq!(jar.cookie(), "");
}

#[test]
fn cookie_clear_with_configured_path() {
    let jar = CookieJar::new();
    jar.set_cookie("site=1; path=/");
    let config = StashConfig::default().with_cookie_path("/app");
    let cookies = CookieStorage::new(jar.clone()).with_path(config.cookie_path.clone());
    let stash = Stash::with_config(MemoryStorage::new(), MemoryStorage::new(), cookies, config);

    stash.set("a", &1, &StashOptions::cookie());
    stash.set("b", &2, &StashOptions::cookie());
    stash.clear(&StashOptions::cookie());

    // Only cookies under the configured path can be expired from here.
    assert_eq!(jar.cookie(), "site=1");
    assert_eq!(stash.get::<i32>("a", &StashOptions::cookie()), None);
}

#[test]
fn cookie_path_reads_own_cookie_first() {
    let jar = CookieJar::new();
    let root = Stash::new(MemoryStorage::new(), MemoryStorage::new(), CookieStorage::new(jar.clone()));
    let app = Stash::with_config(
        MemoryStorage::new(),
        MemoryStorage::new(),
        CookieStorage::new(jar.clone()).with_path("/app"),
        StashConfig::default().with_cookie_path("/app"),
    );

    root.set("k", "root", &StashOptions::cookie());
    app.set("k", "app", &StashOptions::cookie());
    assert_eq!(app.get::<String>("k", &StashOptions::cookie()).as_deref(), Some("app"));

    app.remove("k", &StashOptions::cookie());
    assert_eq!(app.get::<String>("k", &StashOptions::cookie()).as_deref(), Some("root"));
}

#[test]
fn fallback_covers_every_operation() {
    let session = MemoryStorage::new();
    let stash = Stash::new(Unavailable, session.clone(), Unavailable);
    let options = StashOptions::local().with_fallback(true);

    stash.set("a", &1, &options);
    stash.set("b", &2, &options);
    assert_eq!(stash.get::<i32>("a", &options), Some(1));
    assert!(stash.try_get::<i32>("a", &options).is_ok());

    stash.remove("a", &options);
    assert_eq!(session.keys(), vec!["b"]);
    assert!(stash.try_remove("b", &StashOptions::local()).is_err());

    stash.clear(&options);
    assert!(session.is_empty());
}

#[test]
fn binding_initializes_with_default() {
    let f = fixture();
    let state = use_stash(&f.stash, "testKey", "defaultValue".to_string(), StashOptions::local());
    assert_eq!(state.get(), "defaultValue");
}

#[test]
fn binding_updates_stored_value() {
    let f = fixture();
    let state = use_stash(&f.stash, "testKey", "defaultValue".to_string(), StashOptions::local());
    state.set("newValue".to_string());
    assert_eq!(state.get(), "newValue");
    assert_eq!(
        f.stash.get::<String>("testKey", &StashOptions::local()).as_deref(),
        Some("newValue")
    );
}

#[test]
fn binding_retrieves_stored_value_on_mount() {
    let f = fixture();
    f.local
        .set("testKey", r#"{"value":"storedValue","expires":null}"#, None)
        .unwrap();
    let state = use_stash(&f.stash, "testKey", "defaultValue".to_string(), StashOptions::local());
    assert_eq!(state.get(), "storedValue");
}

#[test]
fn binding_over_cookie_with_struct() {
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Cart {
        items: Vec<String>,
        total_cents: u64,
    }

    let f = fixture();
    let cart = use_stash(
        &f.stash,
        "cart",
        Cart {
            items: Vec::new(),
            total_cents: 0,
        },
        StashOptions::cookie().with_expires("7d".parse::<Expiration>().unwrap()),
    );

    let writes = Arc::new(AtomicUsize::new(0));
    let writes_clone = writes.clone();
    let _subscription = cart.subscribe(move |_| {
        writes_clone.fetch_add(1, Ordering::SeqCst);
    });

    cart.update(|cart| {
        cart.items.push("tea".to_string());
        cart.total_cents += 450;
    });

    assert_eq!(writes.load(Ordering::SeqCst), 1);
    assert_eq!(
        f.stash.get::<Cart>("cart", &StashOptions::cookie()),
        Some(Cart {
            items: vec!["tea".to_string()],
            total_cents: 450,
        })
    );
}

#[test]
fn stash_is_shareable_across_threads() {
    let f = fixture();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let stash = f.stash.clone();
            thread::spawn(move || {
                stash.set(&format!("k{i}"), &i, &StashOptions::session());
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(f.session.len(), 4);
}
