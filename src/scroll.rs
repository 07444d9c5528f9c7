//! One-shot scroll restoration across page loads

use crate::dom::{SessionStore, Viewport};
use crate::error::{Result, ShellError};

/// sessionStorage key holding the saved offset
pub const SCROLL_KEY: &str = "scrollPosition";

/// Restore a saved scroll offset once, then forget it
///
/// Reads `SCROLL_KEY` a single time. A stored integer is scrolled to after
/// the next frame and the key is removed; no key means no scroll and no
/// store writes. Returns the offset that was scheduled.
pub fn restore_scroll<S, V>(store: &S, viewport: &V) -> Option<i64>
where
    S: SessionStore + ?Sized,
    V: Viewport + ?Sized,
{
    let raw = match store.get(SCROLL_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("Scroll position unreadable: {}", e);
            return None;
        }
    };

    let offset = match parse_offset(&raw) {
        Ok(y) => {
            viewport.scroll_to_next_frame(y as f64);
            log::debug!("Restoring scroll to {}", y);
            Some(y)
        }
        Err(e) => {
            log::warn!("Discarding saved scroll: {}", e);
            None
        }
    };

    if let Err(e) = store.remove(SCROLL_KEY) {
        log::warn!("Could not clear saved scroll: {}", e);
    }
    offset
}

/// Save the current offset for the next page load
pub fn save_scroll_position<S, V>(store: &S, viewport: &V) -> Result<i64>
where
    S: SessionStore + ?Sized,
    V: Viewport + ?Sized,
{
    let y = viewport.scroll_y().round() as i64;
    store.set(SCROLL_KEY, &y.to_string())?;
    Ok(y)
}

fn parse_offset(raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ShellError::InvalidScroll(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::{MemoryStore, MemoryViewport};

    #[test]
    fn test_restores_after_next_frame_and_clears_key() {
        let store = MemoryStore::with_item(SCROLL_KEY, "450");
        let viewport = MemoryViewport::default();

        assert_eq!(restore_scroll(&store, &viewport), Some(450));
        assert!(!store.contains(SCROLL_KEY));
        assert_eq!(viewport.scroll_y(), 0.0);

        viewport.run_frame();
        assert_eq!(viewport.scroll_y(), 450.0);
    }

    #[test]
    fn test_absent_key_is_a_no_op() {
        let store = MemoryStore::default();
        let viewport = MemoryViewport::at(120.0);

        assert_eq!(restore_scroll(&store, &viewport), None);
        viewport.run_frame();
        assert_eq!(viewport.scroll_y(), 120.0);
        assert_eq!(store.writes(), 0);
        assert_eq!(viewport.pending_frames(), 0);
    }

    #[test]
    fn test_fires_at_most_once() {
        let store = MemoryStore::with_item(SCROLL_KEY, "450");
        let viewport = MemoryViewport::default();

        restore_scroll(&store, &viewport);
        viewport.run_frame();
        assert_eq!(restore_scroll(&store, &viewport), None);
        assert_eq!(viewport.pending_frames(), 0);
    }

    #[test]
    fn test_garbage_value_is_cleared_without_scrolling() {
        let store = MemoryStore::with_item(SCROLL_KEY, "lots");
        let viewport = MemoryViewport::default();

        assert_eq!(restore_scroll(&store, &viewport), None);
        assert!(!store.contains(SCROLL_KEY));
        assert_eq!(viewport.pending_frames(), 0);
    }

    #[test]
    fn test_save_rounds_offset() {
        let store = MemoryStore::default();
        let viewport = MemoryViewport::at(812.6);

        assert_eq!(save_scroll_position(&store, &viewport).unwrap(), 813);
        assert_eq!(store.get(SCROLL_KEY).unwrap().as_deref(), Some("813"));
    }
}
