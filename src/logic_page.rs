//! Current default drawing target ("logic page")
//!
//! One slot per thread. Setting a page hands back whatever was there before so
//! callers can restore it when they are done.

use crate::viewport::Viewport;
use std::cell::RefCell;

thread_local! {
    static LOGIC_PAGE: RefCell<Option<Viewport>> = const { RefCell::new(None) };
}

/// Make `page` the logic page and return the previous one.
///
/// The slot keeps its own copy of `page`. Moving or resizing the caller's
/// viewport afterwards does not move the logic page; change it through
/// [`with_logic_page`] instead.
pub fn set_logic_page(page: Viewport) -> Option<Viewport> {
    LOGIC_PAGE.with(|slot| slot.borrow_mut().replace(page))
}

/// Remove and return the logic page, leaving none set
pub fn take_logic_page() -> Option<Viewport> {
    LOGIC_PAGE.with(|slot| slot.borrow_mut().take())
}

/// Copy of the current logic page
pub fn logic_page() -> Option<Viewport> {
    LOGIC_PAGE.with(|slot| slot.borrow().clone())
}

/// Run `f` on the logic page in place. `None` when no page is set.
///
/// The slot stays borrowed while `f` runs, so `f` must not set or take the
/// logic page itself.
pub fn with_logic_page<R>(f: impl FnOnce(&mut Viewport) -> R) -> Option<R> {
    LOGIC_PAGE.with(|slot| slot.borrow_mut().as_mut().map(f))
}
