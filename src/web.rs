//! Browser entry points (wasm32 only)
//!
//! `start` wires every piece of the shell to the live page. The exported
//! functions let the site's client-side router drive page modes directly.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::config::SiteConfig;
use crate::connectivity::{OfflineIndicator, render_banner};
use crate::dom::browser::BrowserPage;
use crate::embed::embed_src;
use crate::error::Result;
use crate::metadata::{ModeScope, ModeSlot};
use crate::scroll::{restore_scroll, save_scroll_position};
use crate::version::{VersionReporter, spawn_version_fetch};

/// `<body data-mode="...">` value that turns on stretch mode at load
pub const STRETCH_MODE: &str = "stretch-timer";

type StretchScope = ModeScope<Rc<BrowserPage>>;

/// Everything that must live as long as the page
struct Site {
    _indicator: OfflineIndicator,
    _reporter: Rc<RefCell<VersionReporter>>,
}

thread_local! {
    static SITE: RefCell<Option<Site>> = const { RefCell::new(None) };
    static LOAD_SCOPE: RefCell<ModeSlot<Rc<BrowserPage>>> = const { RefCell::new(ModeSlot::new()) };
}

/// Wire the shell to the current page
pub fn start() -> Result<()> {
    let config = SiteConfig::load();
    let page = Rc::new(BrowserPage::new()?);

    restore_scroll(&*page, &*page);

    let banner_doc = page.document().clone();
    let indicator = OfflineIndicator::mount_with(page.clone(), move |offline| {
        render_banner(&banner_doc, offline);
    });
    render_banner(page.document(), indicator.is_offline());

    let reporter = Rc::new(RefCell::new(VersionReporter::new()));
    spawn_version_fetch(page.clone(), &config.version_path, reporter.clone());

    let mode = page
        .document()
        .body()
        .and_then(|b| b.get_attribute("data-mode"));
    if mode.as_deref() == Some(STRETCH_MODE) {
        let scope = enter_scope(page.clone(), &config);
        LOAD_SCOPE.with(|slot| slot.borrow_mut().fill(scope));
        track_page_cache(page.clone(), config.clone());
    }

    SITE.with(|slot| {
        *slot.borrow_mut() = Some(Site {
            _indicator: indicator,
            _reporter: reporter,
        })
    });
    Ok(())
}

fn enter_scope(page: Rc<BrowserPage>, config: &SiteConfig) -> StretchScope {
    let workers = page.clone();
    ModeScope::enter(page, &*workers, &*workers, &config.stretch, &config.defaults)
}

/// Release the load-time scope on `pagehide` and re-enter it when the page
/// comes back from the back/forward cache
fn track_page_cache(page: Rc<BrowserPage>, config: SiteConfig) {
    let on_hide = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
        LOAD_SCOPE.with(|slot| {
            slot.borrow_mut().release();
        });
    });

    let shown_page = page.clone();
    let on_show = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
        let persisted = event
            .dyn_ref::<web_sys::PageTransitionEvent>()
            .is_some_and(|e| e.persisted());
        LOAD_SCOPE.with(|slot| {
            slot.borrow_mut()
                .on_pageshow(persisted, || enter_scope(shown_page.clone(), &config));
        });
    });

    for (name, closure) in [("pagehide", &on_hide), ("pageshow", &on_show)] {
        if let Err(e) = page
            .window()
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
        {
            log::warn!("{} listener not installed: {:?}", name, e);
        }
    }
    on_hide.forget();
    on_show.forget();
}

/// Stretch mode held by JavaScript
///
/// Call `exit()` (or `free()`) to restore the page; the handle is not
/// released by garbage collection.
#[wasm_bindgen]
pub struct StretchModeHandle {
    scope: Option<StretchScope>,
}

#[wasm_bindgen]
impl StretchModeHandle {
    pub fn exit(&mut self) {
        self.scope.take();
    }

    #[wasm_bindgen(getter)]
    pub fn active(&self) -> bool {
        self.scope.is_some()
    }
}

/// Enter stretch mode from a client-side route change
#[wasm_bindgen]
pub fn enter_stretch_mode() -> std::result::Result<StretchModeHandle, JsValue> {
    let config = SiteConfig::load();
    let page = Rc::new(BrowserPage::new().map_err(|e| JsValue::from_str(&e.to_string()))?);
    Ok(StretchModeHandle {
        scope: Some(enter_scope(page, &config)),
    })
}

/// Remember the scroll offset before leaving the page
#[wasm_bindgen]
pub fn save_scroll() -> std::result::Result<f64, JsValue> {
    let page = BrowserPage::new().map_err(|e| JsValue::from_str(&e.to_string()))?;
    save_scroll_position(&page, &page)
        .map(|y| y as f64)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// iframe `src` for the embedded stretch-timer app on this host
#[wasm_bindgen]
pub fn embed_url(path: &str) -> std::result::Result<String, JsValue> {
    let config = SiteConfig::load();
    let page = BrowserPage::new().map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(embed_src(&page.hostname(), &config.embed, path))
}
