use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;

/// Trailing-edge debouncer over `window.setTimeout`.
///
/// Each `schedule` bumps an internal generation and re-arms the timer; a
/// `fire` carrying a stale generation is a no-op. That invalidation is what
/// restarts the window on every keystroke, and it is also what makes the
/// behavior testable on the host, where no timer exists: tests call `fire`
/// with captured generations directly.
#[derive(Clone)]
pub(crate) struct Debouncer {
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    delay_ms: i32,
    generation: Rc<Cell<u64>>,
    pending: Rc<RefCell<Option<Box<dyn FnOnce()>>>>,
    #[cfg(target_arch = "wasm32")]
    timer_id: Rc<Cell<Option<i32>>>,
}

impl Debouncer {
    pub fn new(delay_ms: i32) -> Self {
        Self {
            delay_ms,
            generation: Rc::new(Cell::new(0)),
            pending: Rc::new(RefCell::new(None)),
            #[cfg(target_arch = "wasm32")]
            timer_id: Rc::new(Cell::new(None)),
        }
    }

    /// Arm (or re-arm) the timer. Any previously armed callback is dropped.
    pub fn schedule(&self, f: impl FnOnce() + 'static) -> u64 {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        *self.pending.borrow_mut() = Some(Box::new(f));

        #[cfg(target_arch = "wasm32")]
        self.arm(generation);

        generation
    }

    /// Drop whatever is armed without running it.
    pub fn cancel(&self) {
        self.generation.set(self.generation.get() + 1);
        self.pending.borrow_mut().take();

        #[cfg(target_arch = "wasm32")]
        self.clear_timer();
    }

    #[allow(dead_code)]
    pub fn is_armed(&self) -> bool {
        self.pending.borrow().is_some()
    }

    /// Run the armed callback iff `generation` is still current.
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    pub fn fire(&self, generation: u64) {
        if self.generation.get() != generation {
            return;
        }
        let armed = self.pending.borrow_mut().take();
        if let Some(f) = armed {
            f();
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn arm(&self, generation: u64) {
        self.clear_timer();

        let Some(win) = web_sys::window() else {
            return;
        };

        let d = self.clone();
        let cb = wasm_bindgen::closure::Closure::once_into_js(move || d.fire(generation));
        let id = win
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                self.delay_ms,
            )
            .unwrap_or(0);
        self.timer_id.set(Some(id));
    }

    #[cfg(target_arch = "wasm32")]
    fn clear_timer(&self) {
        if let Some(id) = self.timer_id.take() {
            if let Some(win) = web_sys::window() {
                win.clear_timeout_with_handle(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_last_of_rapid_schedules_fires() {
        // Models keystrokes at t=0, t=500, t=1000: each re-arm invalidates
        // the previous timer, so only the generation armed last runs.
        let d = Debouncer::new(1200);
        let fired: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));

        let f1 = Rc::clone(&fired);
        let g1 = d.schedule(move || f1.borrow_mut().push(1));
        let f2 = Rc::clone(&fired);
        let g2 = d.schedule(move || f2.borrow_mut().push(2));
        let f3 = Rc::clone(&fired);
        let g3 = d.schedule(move || f3.borrow_mut().push(3));

        d.fire(g1);
        d.fire(g2);
        assert!(fired.borrow().is_empty());

        d.fire(g3);
        assert_eq!(*fired.borrow(), vec![3]);
    }

    #[test]
    fn test_fire_runs_at_most_once() {
        let d = Debouncer::new(1200);
        let count = Rc::new(Cell::new(0u32));

        let c = Rc::clone(&count);
        let g = d.schedule(move || c.set(c.get() + 1));

        d.fire(g);
        d.fire(g);
        assert_eq!(count.get(), 1);
        assert!(!d.is_armed());
    }

    #[test]
    fn test_cancel_drops_armed_callback() {
        let d = Debouncer::new(1200);
        let count = Rc::new(Cell::new(0u32));

        let c = Rc::clone(&count);
        let g = d.schedule(move || c.set(c.get() + 1));
        assert!(d.is_armed());

        d.cancel();
        d.fire(g);
        assert_eq!(count.get(), 0);
        assert!(!d.is_armed());
    }
}
