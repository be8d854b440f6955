//! Global loading bar
//!
//! Drives the debounced [`LoadingBar`] state machine from the global
//! loading signal, arming one `gloo-timers` timeout at the machine's next
//! deadline.

use checkcx_shared::LoadingBar;
use gloo_timers::callback::Timeout;
use leptos::*;
use std::cell::RefCell;
use std::rc::Rc;
use web_time::Instant;

use crate::state::AppState;

struct BarDriver {
    bar: RefCell<LoadingBar>,
    timer: RefCell<Option<Timeout>>,
    set_visible: WriteSignal<bool>,
}

impl BarDriver {
    /// Publish visibility and re-arm the timer for the next deadline
    fn sync(self: &Rc<Self>) {
        let (visible, deadline) = {
            let bar = self.bar.borrow();
            (bar.is_visible(), bar.next_deadline())
        };
        self.set_visible.set(visible);

        let timeout = deadline.map(|at| {
            let delay = at.saturating_duration_since(Instant::now());
            let driver = Rc::downgrade(self);
            Timeout::new(delay.as_millis().min(u32::MAX as u128) as u32, move || {
                if let Some(driver) = driver.upgrade() {
                    driver.bar.borrow_mut().poll(Instant::now());
                    driver.sync();
                }
            })
        });
        // Dropping the previous Timeout clears it
        *self.timer.borrow_mut() = timeout;
    }

    fn teardown(&self) {
        self.bar.borrow_mut().cancel_timers();
        self.timer.borrow_mut().take();
    }
}

/// Thin progress bar pinned to the top of the viewport
#[component]
pub fn GlobalLoadingBar() -> impl IntoView {
    let app_state = expect_context::<AppState>();
    let (visible, set_visible) = create_signal(false);

    let driver = Rc::new(BarDriver {
        bar: RefCell::new(LoadingBar::default()),
        timer: RefCell::new(None),
        set_visible,
    });

    {
        let driver = driver.clone();
        let is_loading = app_state.is_loading;
        create_effect(move |_| {
            let loading = is_loading.get();
            driver.bar.borrow_mut().set_loading(loading, Instant::now());
            driver.sync();
        });
    }

    on_cleanup(move || driver.teardown());

    view! {
        <div
            class="fixed top-0 left-0 right-0 h-0.5 z-[100] pointer-events-none overflow-hidden"
            role="progressbar"
            aria-hidden=move || (!visible.get()).to_string()
        >
            <Show when=move || visible.get()>
                <div class="h-full w-1/3 bg-blue-500 animate-[loading-bar_1s_ease-in-out_infinite]"></div>
            </Show>
        </div>
    }
}
