//! Demonstration of the three storage types, expiry and fallback

use std::thread;
use std::time::Duration;

use stash::backend::{CookieDocument, CookieJar, CookieStorage, MemoryStorage, Unavailable};
use stash::{Expiration, Stash, StashOptions, StorageType};

fn main() {
    env_logger::init();
    println!("=== Storage Types Example ===\n");

    let jar = CookieJar::new();
    let stash = Stash::new(
        MemoryStorage::new(),
        MemoryStorage::new(),
        CookieStorage::new(jar.clone()),
    );

    println!("1. Same key, three backends");
    for storage in StorageType::ALL {
        let options = StashOptions::new().with_type(storage);
        stash.set("greeting", &format!("hello from {storage}"), &options);
    }
    for storage in StorageType::ALL {
        let options = StashOptions::new().with_type(storage);
        let value: Option<String> = stash.get("greeting", &options);
        println!("   {:>7}: {:?}", storage, value);
    }

    println!("\n2. Cookie header");
    println!("   {}", jar.cookie());

    println!("\n3. Lazy expiry");
    let short: Expiration = "1s".parse().expect("valid duration");
    stash.set("otp", &482913, &StashOptions::session().with_expires(short));
    println!("   right away: {:?}", stash.get::<u32>("otp", &StashOptions::session()));
    thread::sleep(Duration::from_millis(2100));
    println!("   after 2s:   {:?}", stash.get::<u32>("otp", &StashOptions::session()));

    println!("\n4. Rejected duration");
    match "3 weeks".parse::<Expiration>() {
        Ok(_) => println!("   parsed?"),
        Err(e) => println!("   {}", e),
    }

    println!("\n5. Fallback when local storage is missing");
    let limited = Stash::new(Unavailable, MemoryStorage::new(), Unavailable);
    let with_fallback = StashOptions::local().with_fallback(true);
    limited.set("draft", "unsaved text", &with_fallback);
    println!("   with fallback:    {:?}", limited.get::<String>("draft", &with_fallback));
    println!("   without fallback: {:?}", limited.get::<String>("draft", &StashOptions::local()));

    println!("\n6. Clearing cookies");
    stash.clear(&StashOptions::cookie());
    println!("   header now: {:?}", jar.cookie());

    println!("\n✓ Example complete!");
}
