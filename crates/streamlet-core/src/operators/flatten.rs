#![forbid(unsafe_code)]

//! Higher-order mapping: each outer value becomes an inner stream.
//!
//! The four strategies differ only in what happens when an outer value
//! arrives while an inner stream is still running:
//!
//! | Operator | New outer value while busy |
//! |----------|----------------------------|
//! | `concat_map` | queued, started after the current inner completes |
//! | `merge_map` | started at once, running alongside |
//! | `switch_map` | current inner cancelled, new one started |
//! | `exhaust_map` | ignored |
//!
//! In all four the result completes once the outer stream has completed and
//! no inner stream is active. An error from the outer stream or from any
//! inner stream ends the result with that error.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::notification::FnObserver;
use crate::stream::Stream;
use crate::subscriber::Subscriber;
use crate::subscription::Subscription;

type Project<T, U, E> = Rc<dyn Fn(T) -> Stream<U, E>>;

/// Per-subscription bookkeeping shared by the outer and inner observers.
struct Flow {
    active: Cell<usize>,
    outer_done: Cell<bool>,
}

impl Flow {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            active: Cell::new(0),
            outer_done: Cell::new(false),
        })
    }

    fn idle(&self) -> bool {
        self.active.get() == 0
    }
}

/// Outer observer shared by every strategy: values go to `on_value`,
/// errors end the result, completion waits for inner streams.
fn outer_observer<T, U: 'static, E: 'static>(
    downstream: Subscriber<U, E>,
    flow: Rc<Flow>,
    on_value: impl FnMut(T) + 'static,
) -> FnObserver<impl FnMut(T), impl FnMut(E), impl FnMut()> {
    let failed = downstream.clone();
    let finished = downstream;
    FnObserver::new(
        on_value,
        move |error: E| failed.error(error),
        move || {
            flow.outer_done.set(true);
            if flow.idle() {
                finished.complete();
            }
        },
    )
}

/// Inner observer: values and errors go straight downstream; completion
/// calls `on_done`.
fn inner_observer<U: 'static, E: 'static>(
    downstream: Subscriber<U, E>,
    on_done: impl FnMut() + 'static,
) -> FnObserver<impl FnMut(U), impl FnMut(E), impl FnMut()> {
    let values = downstream.clone();
    let failed = downstream;
    FnObserver::new(
        move |value: U| values.next(value),
        move |error: E| failed.error(error),
        on_done,
    )
}

impl<T: 'static, E: 'static> Stream<T, E> {
    /// Map each value to a stream and run those streams one after another,
    /// preserving outer order.
    pub fn concat_map<U: 'static>(
        self,
        project: impl Fn(T) -> Stream<U, E> + 'static,
    ) -> Stream<U, E> {
        let project: Project<T, U, E> = Rc::new(project);
        Stream::new(move |downstream: Subscriber<U, E>| {
            let flow = Flow::new();
            let pending: Rc<RefCell<VecDeque<T>>> = Rc::new(RefCell::new(VecDeque::new()));
            let on_value = {
                let (flow, pending, project, downstream) = (
                    Rc::clone(&flow),
                    Rc::clone(&pending),
                    Rc::clone(&project),
                    downstream.clone(),
                );
                move |value: T| {
                    pending.borrow_mut().push_back(value);
                    if flow.idle() {
                        run_queued(&flow, &pending, &project, &downstream);
                    }
                }
            };
            let outer = outer_observer(downstream.clone(), Rc::clone(&flow), on_value);
            self.subscribe_within(&downstream, outer);
        })
    }

    /// Map each value to a stream and run all of them concurrently.
    pub fn merge_map<U: 'static>(
        self,
        project: impl Fn(T) -> Stream<U, E> + 'static,
    ) -> Stream<U, E> {
        let project: Project<T, U, E> = Rc::new(project);
        Stream::new(move |downstream: Subscriber<U, E>| {
            let flow = Flow::new();
            let on_value = {
                let (flow, project, downstream) =
                    (Rc::clone(&flow), Rc::clone(&project), downstream.clone());
                move |value: T| {
                    flow.active.set(flow.active.get() + 1);
                    let done = {
                        let (flow, downstream) = (Rc::clone(&flow), downstream.clone());
                        move || {
                            flow.active.set(flow.active.get().saturating_sub(1));
                            if flow.idle() && flow.outer_done.get() {
                                downstream.complete();
                            }
                        }
                    };
                    project(value)
                        .subscribe_within(&downstream, inner_observer(downstream.clone(), done));
                }
            };
            let outer = outer_observer(downstream.clone(), Rc::clone(&flow), on_value);
            self.subscribe_within(&downstream, outer);
        })
    }

    /// Map each value to a stream, cancelling the previous inner stream
    /// whenever a new outer value arrives. Only the latest inner stream
    /// reaches the subscriber.
    pub fn switch_map<U: 'static>(
        self,
        project: impl Fn(T) -> Stream<U, E> + 'static,
    ) -> Stream<U, E> {
        let project: Project<T, U, E> = Rc::new(project);
        Stream::new(move |downstream: Subscriber<U, E>| {
            let flow = Flow::new();
            let generation = Rc::new(Cell::new(0_u64));
            let current: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
            let on_value = {
                let (flow, project, downstream) =
                    (Rc::clone(&flow), Rc::clone(&project), downstream.clone());
                let (generation, current) = (Rc::clone(&generation), Rc::clone(&current));
                move |value: T| {
                    let mine = generation.get() + 1;
                    generation.set(mine);
                    let previous = current.borrow_mut().take();
                    if let Some(previous) = previous {
                        tracing::trace!("switch_map: cancelling previous inner stream");
                        previous.unsubscribe();
                    }
                    flow.active.set(1);

                    let done = {
                        let (flow, downstream, generation) =
                            (Rc::clone(&flow), downstream.clone(), Rc::clone(&generation));
                        move || {
                            if generation.get() != mine {
                                return;
                            }
                            flow.active.set(0);
                            if flow.outer_done.get() {
                                downstream.complete();
                            }
                        }
                    };
                    let inner = project(value)
                        .subscribe_within(&downstream, inner_observer(downstream.clone(), done));
                    if generation.get() != mine {
                        // A newer value arrived while this inner was starting.
                        inner.unsubscribe();
                    } else if !inner.is_closed() {
                        *current.borrow_mut() = Some(inner);
                    }
                }
            };
            let outer = outer_observer(downstream.clone(), Rc::clone(&flow), on_value);
            self.subscribe_within(&downstream, outer);
        })
    }

    /// Map each value to a stream, ignoring outer values that arrive while
    /// an inner stream is running.
    pub fn exhaust_map<U: 'static>(
        self,
        project: impl Fn(T) -> Stream<U, E> + 'static,
    ) -> Stream<U, E> {
        let project: Project<T, U, E> = Rc::new(project);
        Stream::new(move |downstream: Subscriber<U, E>| {
            let flow = Flow::new();
            let on_value = {
                let (flow, project, downstream) =
                    (Rc::clone(&flow), Rc::clone(&project), downstream.clone());
                move |value: T| {
                    if !flow.idle() {
                        tracing::trace!("exhaust_map: inner stream busy, value ignored");
                        return;
                    }
                    flow.active.set(1);
                    let done = {
                        let (flow, downstream) = (Rc::clone(&flow), downstream.clone());
                        move || {
                            flow.active.set(0);
                            if flow.outer_done.get() {
                                downstream.complete();
                            }
                        }
                    };
                    project(value)
                        .subscribe_within(&downstream, inner_observer(downstream.clone(), done));
                }
            };
            let outer = outer_observer(downstream.clone(), Rc::clone(&flow), on_value);
            self.subscribe_within(&downstream, outer);
        })
    }
}

/// Start the next queued inner stream for `concat_map`, or complete if the
/// queue is empty and the outer stream is done.
fn run_queued<T: 'static, U: 'static, E: 'static>(
    flow: &Rc<Flow>,
    pending: &Rc<RefCell<VecDeque<T>>>,
    project: &Project<T, U, E>,
    downstream: &Subscriber<U, E>,
) {
    let next = pending.borrow_mut().pop_front();
    let Some(value) = next else {
        if flow.outer_done.get() {
            downstream.complete();
        }
        return;
    };
    flow.active.set(1);
    let done = {
        let (flow, pending, project, downstream) = (
            Rc::clone(flow),
            Rc::clone(pending),
            Rc::clone(project),
            downstream.clone(),
        );
        move || {
            flow.active.set(0);
            run_queued(&flow, &pending, &project, &downstream);
        }
    };
    project(value).subscribe_within(downstream, inner_observer(downstream.clone(), done));
}
