//! Demonstration of a stash-bound state cell holding user preferences

use serde::{Deserialize, Serialize};
use stash::backend::Backend;
use stash::{use_stash, Stash, StashOptions};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Preferences {
    theme: Theme,
    font_size: u8,
    recent_files: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum Theme {
    Light,
    Dark,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            font_size: 12,
            recent_files: Vec::new(),
        }
    }
}

fn main() {
    env_logger::init();
    println!("=== Binding Example: Preferences ===\n");

    let stash = Stash::in_memory();
    let options = StashOptions::local();

    println!("1. First activation falls back to the default");
    let prefs = use_stash(&stash, "prefs", Preferences::default(), options.clone());
    println!("   {:?}", prefs.get());

    println!("\n2. Subscribing to changes");
    let _subscription = prefs.subscribe(|prefs| {
        println!(
            "   [Saved] theme: {:?}, font size: {}, recent: {}",
            prefs.theme,
            prefs.font_size,
            prefs.recent_files.len()
        );
    });

    println!("\n3. Changing preferences");
    prefs.update(|p| p.theme = Theme::Dark);
    prefs.update(|p| p.font_size = 14);
    prefs.update(|p| p.recent_files.push("notes.md".to_string()));

    println!("\n4. A second activation reads what was saved");
    let restored = use_stash(&stash, "prefs", Preferences::default(), options.clone());
    restored.with(|p| {
        println!("   theme: {:?}, font size: {}", p.theme, p.font_size);
    });

    println!("\n5. Raw stored entry");
    let raw = stash.backend(stash::StorageType::Local);
    println!("   {}", raw.get("prefs").unwrap_or_default());

    println!("\n✓ Example complete!");
}
