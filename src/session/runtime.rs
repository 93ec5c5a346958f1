/// Event loop that owns a [`Session`] and drives its request cycles.
///
/// The loop is the only place the session is mutated. Edits, submits and
/// completions all arrive as [`Event`]s on one channel and are handled one
/// at a time, so the state needs no locking.
///
/// An accepted submit hands a frozen copy of the form to a short-lived
/// worker thread. The worker waits out the minimum pending duration, makes
/// the single blocking call through the [`PredictionService`], and posts
/// the outcome back as [`Event::Completed`]. The loop keeps handling events
/// meanwhile; a second submit in that window is ignored by the session.
///
/// There is no cancellation. After [`Event::Shutdown`] (or an observer
/// asking to stop) the session is torn down and a late completion is
/// dropped on arrival.
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::client::{PredictError, PredictionResult, PredictionService};
use crate::config::YieldcastConfig;
use crate::diagnostics::{self, CycleLogEntry, Journal};
use crate::schema::{FormError, FormInput};

use super::{Dispatch, Resolution, Session, SubmitOutcome, Ticket};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Input to the runtime loop.
#[derive(Debug)]
pub enum Event {
    /// A field was edited in the presentation layer.
    Edit { field: String, value: String },
    /// The user asked for a prediction.
    Submit,
    /// A worker finished its request.
    Completed {
        ticket: Ticket,
        outcome: Result<PredictionResult, PredictError>,
        latency: Duration,
    },
    /// The presentation layer is going away.
    Shutdown,
}

/// What handling one event did.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Form or request state changed; observers should re-render.
    Changed,
    /// Event was ignored (submit while pending, stale completion, ...).
    Unchanged,
    /// The edit or submit was refused because of the form contents.
    Rejected(FormError),
    /// The session was torn down.
    Stopped,
}

/// Cloneable sender the presentation layer uses to feed the loop.
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    tx: Sender<Event>,
}

impl RuntimeHandle {
    /// Returns `false` if the runtime no longer exists.
    pub fn edit(&self, field: impl Into<String>, value: impl Into<String>) -> bool {
        self.send(Event::Edit {
            field: field.into(),
            value: value.into(),
        })
    }

    pub fn submit(&self) -> bool {
        self.send(Event::Submit)
    }

    pub fn shutdown(&self) -> bool {
        self.send(Event::Shutdown)
    }

    fn send(&self, event: Event) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Callbacks the loop invokes while running.
pub trait Observer {
    /// Called after every [`Step::Changed`]. Return `Break` to stop.
    fn on_change(&mut self, session: &Session) -> ControlFlow<()>;

    /// Called after every [`Step::Rejected`].
    fn on_rejected(&mut self, _session: &Session, _error: &FormError) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Runtime knobs, usually taken from config.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Delay between entering Pending and issuing the request.
    pub min_pending: Duration,
    /// Endpoint recorded in journal entries.
    pub endpoint: String,
    /// Where completed cycles are recorded, if anywhere.
    pub journal: Option<Journal>,
}

impl RuntimeOptions {
    pub fn from_config(config: &YieldcastConfig, endpoint: &str) -> Self {
        Self {
            min_pending: Duration::from_millis(config.pacing.min_pending_ms),
            endpoint: endpoint.to_string(),
            journal: if config.logging.enabled {
                Journal::default_location()
            } else {
                None
            },
        }
    }
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            min_pending: Duration::from_millis(800),
            endpoint: String::new(),
            journal: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// Single owner of the session and its request lifecycle.
pub struct Runtime {
    session: Session,
    service: Arc<dyn PredictionService>,
    options: RuntimeOptions,
    session_id: String,
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Runtime {
    pub fn new(service: Arc<dyn PredictionService>, options: RuntimeOptions) -> Self {
        Self::with_form(service, options, FormInput::defaults())
    }

    pub fn with_form(
        service: Arc<dyn PredictionService>,
        options: RuntimeOptions,
        form: FormInput,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            session: Session::with_form(form),
            service,
            options,
            session_id: diagnostics::new_session_id(),
            tx,
            rx,
        }
    }

    /// Identifier recorded with every journal entry of this runtime.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Handle one event.
    pub fn step(&mut self, event: Event) -> Step {
        match event {
            Event::Edit { field, value } => match self.session.edit(&field, value) {
                Ok(()) => Step::Changed,
                Err(err) => Step::Rejected(err),
            },
            Event::Submit => match self.session.submit() {
                SubmitOutcome::Dispatched(dispatch) => {
                    self.spawn_request(dispatch);
                    Step::Changed
                }
                SubmitOutcome::Invalid(err) => Step::Rejected(err),
                SubmitOutcome::AlreadyPending | SubmitOutcome::Closed => Step::Unchanged,
            },
            Event::Completed {
                ticket,
                outcome,
                latency,
            } => self.complete(ticket, outcome, latency),
            Event::Shutdown => {
                self.session.teardown();
                Step::Stopped
            }
        }
    }

    /// Wait up to `timeout` for the next event and handle it.
    ///
    /// Returns `None` when nothing arrived in time.
    pub fn pump(&mut self, timeout: Duration) -> Option<Step> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(self.step(event)),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Handle events until shutdown or until the observer breaks.
    ///
    /// Breaking out tears the session down, like an explicit shutdown.
    pub fn run(&mut self, observer: &mut dyn Observer) {
        while let Ok(event) = self.rx.recv() {
            let flow = match self.step(event) {
                Step::Stopped => return,
                Step::Unchanged => ControlFlow::Continue(()),
                Step::Changed => observer.on_change(&self.session),
                Step::Rejected(err) => observer.on_rejected(&self.session, &err),
            };

            if flow.is_break() {
                self.session.teardown();
                return;
            }
        }
    }

    // -- Internal --

    fn spawn_request(&mut self, dispatch: Dispatch) {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        let min_pending = self.options.min_pending;
        let Dispatch { ticket, input } = dispatch;

        let spawned = thread::Builder::new()
            .name(format!("yieldcast-request-{}", ticket.id()))
            .spawn(move || {
                thread::sleep(min_pending);
                let started = Instant::now();
                let outcome = service.predict(&input);
                // The runtime may be gone; nothing to deliver to then.
                let _ = tx.send(Event::Completed {
                    ticket,
                    outcome,
                    latency: started.elapsed(),
                });
            });

        if let Err(err) = spawned {
            let outcome = Err(PredictError::Transport(format!(
                "failed to start request worker: {err}"
            )));
            let _ = self.tx.send(Event::Completed {
                ticket,
                outcome,
                latency: Duration::ZERO,
            });
        }
    }

    fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<PredictionResult, PredictError>,
        latency: Duration,
    ) -> Step {
        let entry = self.options.journal.as_ref().map(|_| {
            let crop = self
                .session
                .submitted_input()
                .and_then(|input| input.choice("Crop_Type"));
            CycleLogEntry::completed(
                &self.session_id,
                ticket.id(),
                &self.options.endpoint,
                latency.as_millis() as u64,
                crop,
                &outcome,
            )
        });

        match self.session.resolve(ticket, outcome) {
            Resolution::Applied => {
                if let (Some(journal), Some(entry)) = (&self.options.journal, entry) {
                    // Best-effort.
                    let _ = journal.append(&entry);
                }
                Step::Changed
            }
            Resolution::Stale | Resolution::Closed => Step::Unchanged,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
