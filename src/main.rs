//! Portfolio shell entry point
//!
//! On the web this wires the shell to the page. Natively it runs one pass of
//! every behavior against the in-memory backends and logs what happened.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&JsValue::from_str(&format!("Logger unavailable: {}", e)));
    }

    log::info!("Portfolio shell starting...");
    match portfolio_web::web::start() {
        Ok(()) => log::info!("Portfolio shell running"),
        Err(e) => log::warn!("Portfolio shell disabled: {}", e),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::rc::Rc;

    use portfolio_web::dom::memory::{
        ManualClock, MemoryConnectivity, MemoryHead, MemoryStore, MemoryViewport, MemoryWorkers,
    };
    use portfolio_web::dom::{ConnectivitySignal, DocumentHead};
    use portfolio_web::embed::embed_origin;
    use portfolio_web::scroll::{SCROLL_KEY, restore_scroll};
    use portfolio_web::{ModeScope, OfflineIndicator, SiteConfig, VersionReporter};

    env_logger::init();
    log::info!("Portfolio shell (native) starting...");
    log::info!("The browser build runs via `trunk serve`; this is a dry run on in-memory backends");

    let config = SiteConfig::load();

    let head = MemoryHead::new(
        &config.defaults.title,
        Some("/favicon.ico"),
        Some(&config.defaults.manifest_href),
    );
    let workers = MemoryWorkers::default();
    let clock = ManualClock::at(1_705_314_600_000.0);
    {
        let _scope = ModeScope::enter(&head, &workers, &clock, &config.stretch, &config.defaults);
        println!("In stretch mode: title={:?} manifests={:?}", head.title(), head.manifest_links());
    }
    println!("Restored: title={:?} manifests={:?}", head.title(), head.manifest_links());

    let mut reporter = VersionReporter::new();
    reporter.apply(Ok(r#"{"version":"2.0.0","timestamp":"2024-01-15T10:30:00"}"#.to_string()));
    println!(
        "Version: {} built {}",
        reporter.info().display_version(),
        reporter.info().display_built_at()
    );

    let conn = Rc::new(MemoryConnectivity::new(true));
    let indicator = OfflineIndicator::mount(conn.clone());
    conn.emit(ConnectivitySignal::Offline);
    println!("Offline after signal: {}", indicator.is_offline());

    let store = MemoryStore::with_item(SCROLL_KEY, "450");
    let viewport = MemoryViewport::default();
    restore_scroll(&store, &viewport);
    viewport.run_frame();
    println!("Scroll restored to {}", portfolio_web::dom::Viewport::scroll_y(&viewport));

    println!("Embed origin on localhost: {}", embed_origin("localhost", &config.embed));
}
