//! Mode-scoped page metadata
//!
//! Entering a page mode (the stretch timer) swaps the document's title,
//! favicon and web-app manifest for the mode's own and registers the mode's
//! service worker. The returned `ModeScope` puts the site identity back when
//! it is dropped, so every exit path restores the head exactly once.
//!
//! Nothing here fails: each browser step is a best-effort enhancement and
//! errors are logged, never returned. Entering a second scope while one is
//! alive is not supported.

use serde::{Deserialize, Serialize};

use crate::config::{ModeIdentity, SiteDefaults};
use crate::dom::{Clock, DocumentHead, WorkerRegistry, cache_bust};

/// Head state captured on entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadataSnapshot {
    pub title: String,
    /// `None` when the page had no favicon link
    pub favicon_href: Option<String>,
    pub manifest_href: Option<String>,
}

impl PageMetadataSnapshot {
    pub fn capture<H: DocumentHead>(head: &H) -> Self {
        Self {
            title: head.title(),
            favicon_href: head.favicon_href(),
            manifest_href: head.manifest_href(),
        }
    }
}

/// Active page mode; restores the site identity on drop
pub struct ModeScope<H: DocumentHead> {
    head: H,
    snapshot: PageMetadataSnapshot,
    defaults: SiteDefaults,
    mode_title: String,
}

impl<H: DocumentHead> ModeScope<H> {
    /// Apply `identity` to the page and register its worker
    pub fn enter(
        head: H,
        workers: &dyn WorkerRegistry,
        clock: &dyn Clock,
        identity: &ModeIdentity,
        defaults: &SiteDefaults,
    ) -> Self {
        let snapshot = PageMetadataSnapshot::capture(&head);

        head.set_title(&identity.title);

        if snapshot.favicon_href.is_some() {
            if let Err(e) = head.set_favicon_href(&identity.icon_href) {
                log::warn!("Could not swap favicon: {}", e);
            }
        } else {
            log::debug!("No favicon link, leaving icon untouched");
        }

        let manifest = cache_bust(&identity.manifest_href, clock.now_ms());
        replace_manifest(&head, &manifest);

        if let Err(e) = workers.register(&identity.worker_path) {
            log::warn!("Service worker not registered: {}", e);
        }

        log::info!("Entered page mode '{}'", identity.title);

        Self {
            head,
            snapshot,
            defaults: defaults.clone(),
            mode_title: identity.title.clone(),
        }
    }

    /// Head state as it was before entry
    pub fn snapshot(&self) -> &PageMetadataSnapshot {
        &self.snapshot
    }

    pub fn head(&self) -> &H {
        &self.head
    }

    /// Leave the mode now instead of at end of scope
    pub fn exit(self) {
        drop(self);
    }

    fn restore(&self) {
        self.head.set_title(&self.defaults.title);

        if let Some(href) = &self.snapshot.favicon_href {
            if let Err(e) = self.head.set_favicon_href(href) {
                log::warn!("Could not restore favicon: {}", e);
            }
        }

        replace_manifest(&self.head, &self.defaults.manifest_href);

        log::info!("Left page mode '{}'", self.mode_title);
    }
}

impl<H: DocumentHead> Drop for ModeScope<H> {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Holder for a page-lifetime scope across `pagehide`/`pageshow`
///
/// A page restored from the back/forward cache fires `pageshow` with
/// `persisted` set after its scope was released on `pagehide`; the mode is
/// entered again in that case.
pub struct ModeSlot<H: DocumentHead> {
    scope: Option<ModeScope<H>>,
}

impl<H: DocumentHead> ModeSlot<H> {
    pub const fn new() -> Self {
        Self { scope: None }
    }

    pub fn fill(&mut self, scope: ModeScope<H>) {
        self.scope = Some(scope);
    }

    pub fn is_active(&self) -> bool {
        self.scope.is_some()
    }

    /// Leave the mode; returns false if it was not active
    pub fn release(&mut self) -> bool {
        self.scope.take().is_some()
    }

    /// Re-enter with `enter` when a cached page comes back without a scope
    pub fn on_pageshow(&mut self, persisted: bool, enter: impl FnOnce() -> ModeScope<H>) -> bool {
        if !persisted || self.scope.is_some() {
            return false;
        }
        log::info!("Page restored from back/forward cache, re-entering mode");
        self.scope = Some(enter());
        true
    }
}

impl<H: DocumentHead> Default for ModeSlot<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Swap every manifest link for a single one pointing at `href`
fn replace_manifest<H: DocumentHead>(head: &H, href: &str) {
    match head.remove_manifest_links() {
        Ok(n) => log::debug!("Removed {} manifest link(s)", n),
        Err(e) => log::warn!("Could not remove manifest links: {}", e),
    }
    if let Err(e) = head.insert_manifest_link(href) {
        log::warn!("Could not insert manifest {}: {}", href, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::{ManualClock, MemoryHead, MemoryWorkers};
    use proptest::prelude::*;

    fn site() -> (ModeIdentity, SiteDefaults) {
        (ModeIdentity::default(), SiteDefaults::default())
    }

    #[test]
    fn test_enter_applies_mode_identity() {
        let (identity, defaults) = site();
        let head = MemoryHead::new("Portfolio", Some("/favicon.ico"), Some("/manifest.json"));
        let workers = MemoryWorkers::default();
        let clock = ManualClock::at(1_705_314_600_000.0);

        let scope = ModeScope::enter(&head, &workers, &clock, &identity, &defaults);

        assert_eq!(head.title(), "Stretch Timer");
        assert_eq!(head.favicon_href().as_deref(), Some("/stretch-icon.png"));
        assert_eq!(
            head.manifest_links(),
            vec!["/stretch-manifest.json?v=1705314600000".to_string()]
        );
        assert_eq!(workers.registered(), vec!["/stretch-sw.js".to_string()]);
        assert_eq!(scope.snapshot().favicon_href.as_deref(), Some("/favicon.ico"));
        assert_eq!(scope.snapshot().manifest_href.as_deref(), Some("/manifest.json"));
    }

    #[test]
    fn test_drop_restores_site_identity() {
        let (identity, defaults) = site();
        let head = MemoryHead::new("Portfolio", Some("/favicon.ico"), Some("/manifest.json"));
        let workers = MemoryWorkers::default();
        let clock = ManualClock::at(42.0);

        {
            let _scope = ModeScope::enter(&head, &workers, &clock, &identity, &defaults);
        }

        assert_eq!(head.title(), "Portfolio");
        assert_eq!(head.favicon_href().as_deref(), Some("/favicon.ico"));
        assert_eq!(head.manifest_links(), vec!["/manifest.json".to_string()]);
    }

    #[test]
    fn test_exit_restores_site_default_title() {
        let identity = ModeIdentity::default();
        let defaults = SiteDefaults {
            title: "Jane Doe".to_string(),
            ..SiteDefaults::default()
        };
        // Page loaded straight into the stretch view
        let head = MemoryHead::new("Stretch Timer", Some("/stretch-icon.png"), None);
        let workers = MemoryWorkers::default();
        let clock = ManualClock::default();

        let scope = ModeScope::enter(&head, &workers, &clock, &identity, &defaults);
        assert_eq!(scope.snapshot().title, "Stretch Timer");
        scope.exit();

        assert_eq!(head.title(), "Jane Doe");
        assert_eq!(head.manifest_links(), vec![defaults.manifest_href.clone()]);
    }

    #[test]
    fn test_missing_favicon_is_skipped() {
        let (identity, defaults) = site();
        let head = MemoryHead::new("Portfolio", None, None);
        let workers = MemoryWorkers::default();
        let clock = ManualClock::default();

        let scope = ModeScope::enter(&head, &workers, &clock, &identity, &defaults);
        assert_eq!(head.favicon_href(), None);
        scope.exit();

        assert_eq!(head.favicon_href(), None);
        assert_eq!(head.title(), "Portfolio");
        assert_eq!(head.manifest_links(), vec!["/manifest.json".to_string()]);
    }

    #[test]
    fn test_worker_failure_is_absorbed() {
        let (identity, defaults) = site();
        let head = MemoryHead::new("Portfolio", Some("/favicon.ico"), None);
        let workers = MemoryWorkers::default();
        workers.fail.set(true);
        let clock = ManualClock::default();

        let scope = ModeScope::enter(&head, &workers, &clock, &identity, &defaults);
        assert_eq!(head.title(), "Stretch Timer");
        assert!(workers.registered().is_empty());
        drop(scope);
        assert_eq!(head.title(), "Portfolio");
    }

    #[test]
    fn test_manifest_insert_failure_is_absorbed() {
        let (identity, defaults) = site();
        let head = MemoryHead::new("Portfolio", None, Some("/manifest.json"));
        head.fail_manifest_insert.set(true);
        let workers = MemoryWorkers::default();
        let clock = ManualClock::default();

        let scope = ModeScope::enter(&head, &workers, &clock, &identity, &defaults);
        assert!(head.manifest_links().is_empty());
        head.fail_manifest_insert.set(false);
        scope.exit();
        assert_eq!(head.manifest_links(), vec!["/manifest.json".to_string()]);
    }

    #[test]
    fn test_duplicate_manifest_links_collapse() {
        let (identity, defaults) = site();
        let head = MemoryHead::new("Portfolio", None, Some("/manifest.json"));
        head.insert_manifest_link("/stale.json").unwrap();
        let workers = MemoryWorkers::default();
        let clock = ManualClock::at(7.0);

        let scope = ModeScope::enter(&head, &workers, &clock, &identity, &defaults);
        assert_eq!(head.manifest_links(), vec!["/stretch-manifest.json?v=7".to_string()]);
        scope.exit();
        assert_eq!(head.manifest_links(), vec!["/manifest.json".to_string()]);
    }

    #[test]
    fn test_reentry_uses_fresh_cache_buster() {
        let (identity, defaults) = site();
        let head = MemoryHead::new("Portfolio", None, Some("/manifest.json"));
        let workers = MemoryWorkers::default();
        let clock = ManualClock::at(1000.0);

        ModeScope::enter(&head, &workers, &clock, &identity, &defaults).exit();
        clock.advance(500.0);
        let scope = ModeScope::enter(&head, &workers, &clock, &identity, &defaults);
        assert_eq!(head.manifest_links(), vec!["/stretch-manifest.json?v=1500".to_string()]);
        drop(scope);
        assert_eq!(workers.registered().len(), 2);
    }

    #[test]
    fn test_slot_reenters_after_bfcache_restore() {
        let (identity, defaults) = site();
        let head = MemoryHead::new("Portfolio", Some("/favicon.ico"), Some("/manifest.json"));
        let workers = MemoryWorkers::default();
        let clock = ManualClock::at(9.0);
        let enter = || ModeScope::enter(&head, &workers, &clock, &identity, &defaults);

        let mut slot = ModeSlot::new();
        slot.fill(enter());

        // pagehide into the cache
        assert!(slot.release());
        assert_eq!(head.title(), "Portfolio");

        // normal load does nothing, a persisted pageshow re-enters
        assert!(!slot.on_pageshow(false, enter));
        assert!(slot.on_pageshow(true, enter));
        assert!(slot.is_active());
        assert_eq!(head.title(), "Stretch Timer");
        assert_eq!(head.favicon_href().as_deref(), Some("/stretch-icon.png"));

        // already active: no second scope
        assert!(!slot.on_pageshow(true, enter));
        assert_eq!(workers.registered().len(), 2);

        assert!(slot.release());
        assert!(!slot.release());
        assert_eq!(head.manifest_links(), vec!["/manifest.json".to_string()]);
    }

    proptest! {
        #[test]
        fn prop_cycles_restore_head(
            site_title in "[ -~]{0,40}",
            favicon in proptest::option::of("/[a-z]{1,12}\\.(ico|png|svg)"),
            cycles in 1usize..6,
        ) {
            let identity = ModeIdentity::default();
            let defaults = SiteDefaults { title: site_title, ..SiteDefaults::default() };
            let head = MemoryHead::new(&defaults.title, favicon.as_deref(), Some("/manifest.json"));
            let workers = MemoryWorkers::default();
            let clock = ManualClock::at(1.0);

            for _ in 0..cycles {
                let scope = ModeScope::enter(&head, &workers, &clock, &identity, &defaults);
                prop_assert_eq!(head.title(), identity.title.clone());
                drop(scope);
                clock.advance(1.0);

                prop_assert_eq!(head.title(), defaults.title.clone());
                prop_assert_eq!(head.favicon_href(), favicon.clone());
                prop_assert_eq!(head.manifest_links(), vec![defaults.manifest_href.clone()]);
            }
        }
    }
}
