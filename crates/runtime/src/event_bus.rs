use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Token returned by [`FrameEvent::add_listener`]; pass it back to unsubscribe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerHandle(u64);

type Listener<A> = Rc<RefCell<dyn FnMut(&A)>>;

struct Inner<A: ?Sized> {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(ListenerHandle, Listener<A>)>>,
}

/// Single-threaded event raised once per rendered frame (or any other recurring point).
///
/// Cloning yields another handle to the same listener list, so a subscriber can
/// keep the event next to its [`ListenerHandle`] and unsubscribe without holding
/// on to whatever owns the event.
///
/// Dispatch contract:
/// - Listeners run in registration order.
/// - A listener removed during dispatch is not invoked afterwards in that dispatch.
/// - A listener added during dispatch first runs on the next dispatch.
/// - A listener that re-raises the same event is not re-entered.
pub struct FrameEvent<A: ?Sized> {
    inner: Rc<Inner<A>>,
}

impl<A: ?Sized> Clone for FrameEvent<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: ?Sized> Default for FrameEvent<A> {
    fn default() -> Self {
        Self {
            inner: Rc::new(Inner {
                next_id: Cell::new(0),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }
}

impl<A: ?Sized> fmt::Debug for FrameEvent<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameEvent")
            .field("listeners", &self.len())
            .finish()
    }
}

impl<A: ?Sized> FrameEvent<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener<F>(&self, listener: F) -> ListenerHandle
    where
        F: FnMut(&A) + 'static,
    {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        let handle = ListenerHandle(id);
        let listener: Listener<A> = Rc::new(RefCell::new(listener));
        self.inner.listeners.borrow_mut().push((handle, listener));
        handle
    }

    /// Returns `true` if the listener was registered.
    pub fn remove_listener(&self, handle: ListenerHandle) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(h, _)| *h != handle);
        listeners.len() != before
    }

    pub fn contains(&self, handle: ListenerHandle) -> bool {
        self.inner
            .listeners
            .borrow()
            .iter()
            .any(|(h, _)| *h == handle)
    }

    pub fn len(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invokes every registered listener; returns how many ran.
    pub fn raise(&self, args: &A) -> usize {
        let snapshot: Vec<(ListenerHandle, Listener<A>)> = self.inner.listeners.borrow().clone();
        let mut invoked = 0;
        for (handle, listener) in snapshot {
            if !self.contains(handle) {
                continue;
            }
            let Ok(mut f) = listener.try_borrow_mut() else {
                continue;
            };
            (*f)(args);
            invoked += 1;
        }
        invoked
    }
}

#[cfg(test)]
mod tests {
    use super::FrameEvent;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn listeners_run_in_registration_order() {
        let event: FrameEvent<u32> = FrameEvent::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for tag in ["a", "b"] {
            let seen = Rc::clone(&seen);
            event.add_listener(move |v: &u32| seen.borrow_mut().push((tag, *v)));
        }
        assert_eq!(event.raise(&7), 2);
        assert_eq!(*seen.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn remove_is_reported_once() {
        let event: FrameEvent<()> = FrameEvent::new();
        let h = event.add_listener(|_| {});
        assert!(event.contains(h));
        assert!(event.remove_listener(h));
        assert!(!event.remove_listener(h));
        assert_eq!(event.raise(&()), 0);
    }

    #[test]
    fn listener_removed_during_dispatch_is_skipped() {
        let event: FrameEvent<()> = FrameEvent::new();
        let second_ran = Rc::new(Cell::new(false));
        let victim = Rc::new(Cell::new(None));

        let ev = event.clone();
        let v = Rc::clone(&victim);
        event.add_listener(move |_| {
            if let Some(h) = v.get() {
                ev.remove_listener(h);
            }
        });
        let flag = Rc::clone(&second_ran);
        victim.set(Some(event.add_listener(move |_| flag.set(true))));

        assert_eq!(event.raise(&()), 1);
        assert!(!second_ran.get());
        assert_eq!(event.len(), 1);
    }

    #[test]
    fn listener_added_during_dispatch_waits_for_next_frame() {
        let event: FrameEvent<()> = FrameEvent::new();
        let count = Rc::new(Cell::new(0));
        let ev = event.clone();
        let c = Rc::clone(&count);
        let added = Cell::new(false);
        event.add_listener(move |_| {
            if !added.replace(true) {
                let c = Rc::clone(&c);
                ev.add_listener(move |_| c.set(c.get() + 1));
            }
        });
        event.raise(&());
        assert_eq!(count.get(), 0);
        event.raise(&());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn works_with_unsized_args() {
        let event: FrameEvent<str> = FrameEvent::new();
        let last = Rc::new(RefCell::new(String::new()));
        let l = Rc::clone(&last);
        event.add_listener(move |s: &str| *l.borrow_mut() = s.to_string());
        event.raise("frame");
        assert_eq!(*last.borrow(), "frame");
    }
}
