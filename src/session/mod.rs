/// Submission state machine.
///
/// A [`Session`] owns the editable form and the single [`RequestState`].
/// All mutation goes through its methods; the presentation layer only reads.
///
/// ```text
///            submit()                 resolve(Ok)
///   Idle ───────────────▶ Pending ─────────────────▶ Success
///                           │  ▲                       │
///               resolve(Err)│  └───── submit() ────────┤
///                           ▼                          │
///                        Failure ◀─────────────────────┘
/// ```
///
/// At most one request is outstanding. A submit while Pending is ignored,
/// and every completion is matched against the [`Ticket`] issued for the
/// current cycle so a stale or post-teardown completion never lands.
pub mod runtime;

use crate::client::{PredictError, PredictionResult};
use crate::derive::{self, DerivedSeries};
use crate::schema::{FormError, FormInput, FrozenInput};

/// User-facing text for every failure, whatever the cause.
pub const FAILURE_MESSAGE: &str =
    "Could not obtain a prediction; confirm the service is reachable.";

// ---------------------------------------------------------------------------
// State types
// ---------------------------------------------------------------------------

/// Identifier of one submission cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// A failed cycle: the generic message plus the cause for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureInfo {
    pub message: &'static str,
    pub cause: PredictError,
}

impl FailureInfo {
    pub fn from_cause(cause: PredictError) -> Self {
        Self {
            message: FAILURE_MESSAGE,
            cause,
        }
    }
}

/// What the presentation layer should currently show.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Pending,
    Success(PredictionResult),
    Failure(FailureInfo),
}

impl RequestState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Success or Failure.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Failure(_))
    }

    /// Short name for logs and tests.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Success(_) => "success",
            Self::Failure(_) => "failure",
        }
    }
}

/// Work the runtime must carry out after an accepted submit.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub ticket: Ticket,
    pub input: FrozenInput,
}

/// Result of [`Session::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Moved to Pending; the request should be issued.
    Dispatched(Dispatch),
    /// A request is already in flight; nothing changed.
    AlreadyPending,
    /// The form failed validation; nothing changed.
    Invalid(FormError),
    /// The session was torn down.
    Closed,
}

/// Result of [`Session::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    /// Not the outstanding ticket; dropped.
    Stale,
    /// Arrived after teardown; dropped.
    Closed,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Owned, typed container for the form and the request lifecycle.
#[derive(Debug, Default)]
pub struct Session {
    form: FormInput,
    state: RequestState,
    /// Ticket and frozen input of the current (or last settled) cycle.
    cycle: Option<Dispatch>,
    next_ticket: u64,
    closed: bool,
}

impl Session {
    /// Fresh session: default form, Idle.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_form(form: FormInput) -> Self {
        Self {
            form,
            ..Self::default()
        }
    }

    pub fn form(&self) -> &FormInput {
        &self.form
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Ticket of the request in flight, if any.
    pub fn outstanding(&self) -> Option<Ticket> {
        match (&self.state, &self.cycle) {
            (RequestState::Pending, Some(cycle)) => Some(cycle.ticket),
            _ => None,
        }
    }

    /// Input frozen for the current or most recent cycle.
    pub fn submitted_input(&self) -> Option<&FrozenInput> {
        self.cycle.as_ref().map(|c| &c.input)
    }

    /// Edit one field. Allowed in every state; an in-flight request keeps
    /// the input it was frozen with.
    pub fn edit(&mut self, field: &str, value: impl Into<String>) -> Result<(), FormError> {
        self.form.set(field, value)
    }

    /// Start a new cycle from the current form.
    pub fn submit(&mut self) -> SubmitOutcome {
        if self.closed {
            return SubmitOutcome::Closed;
        }
        if self.state.is_pending() {
            return SubmitOutcome::AlreadyPending;
        }

        let input = match self.form.freeze() {
            Ok(input) => input,
            Err(err) => return SubmitOutcome::Invalid(err),
        };

        self.next_ticket += 1;
        let dispatch = Dispatch {
            ticket: Ticket(self.next_ticket),
            input,
        };

        // Entering Pending drops the previous result or error.
        self.state = RequestState::Pending;
        self.cycle = Some(dispatch.clone());

        SubmitOutcome::Dispatched(dispatch)
    }

    /// Settle the outstanding request.
    pub fn resolve(
        &mut self,
        ticket: Ticket,
        outcome: Result<PredictionResult, PredictError>,
    ) -> Resolution {
        if self.closed {
            return Resolution::Closed;
        }
        if self.outstanding() != Some(ticket) {
            return Resolution::Stale;
        }

        self.state = match outcome {
            Ok(result) => RequestState::Success(result),
            Err(cause) => RequestState::Failure(FailureInfo::from_cause(cause)),
        };
        Resolution::Applied
    }

    /// Close the session. Later submits and completions are ignored.
    pub fn teardown(&mut self) {
        self.closed = true;
    }

    /// Chart series for the current Success, `None` in every other state.
    pub fn derived(&self) -> Option<DerivedSeries> {
        match (&self.state, &self.cycle) {
            (RequestState::Success(result), Some(cycle)) => {
                Some(derive::derive(result, &cycle.input))
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_result() -> PredictionResult {
        PredictionResult {
            yield_per_hectare: 4.2,
            total_yield: 4.2,
            area_in_hectares: 1.0,
            yield_unit: "Ton".to_string(),
        }
    }

    fn dispatch(session: &mut Session) -> Dispatch {
        match session.submit() {
            SubmitOutcome::Dispatched(d) => d,
            other => panic!("expected dispatch, got {other:?}"),
        }
    }

    #[test]
    fn starts_idle_with_defaults() {
        let session = Session::new();
        assert_eq!(session.state(), &RequestState::Idle);
        assert_eq!(session.form().get("Nitrogen"), Some("80"));
        assert!(session.derived().is_none());
    }

    #[test]
    fn submit_moves_to_pending() {
        let mut session = Session::new();
        let d = dispatch(&mut session);
        assert!(session.state().is_pending());
        assert_eq!(session.outstanding(), Some(d.ticket));
    }

    #[test]
    fn submit_while_pending_is_ignored() {
        let mut session = Session::new();
        let first = dispatch(&mut session);
        assert_eq!(session.submit(), SubmitOutcome::AlreadyPending);
        assert_eq!(session.outstanding(), Some(first.ticket));

        assert_eq!(session.resolve(first.ticket, Ok(ok_result())), Resolution::Applied);
        assert!(matches!(session.state(), RequestState::Success(_)));
    }

    #[test]
    fn invalid_form_does_not_change_state() {
        let mut session = Session::new();
        session.edit("Rainfall", "").unwrap();
        assert!(matches!(
            session.submit(),
            SubmitOutcome::Invalid(FormError::Empty("Rainfall"))
        ));
        assert_eq!(session.state(), &RequestState::Idle);
    }

    #[test]
    fn failure_carries_generic_message() {
        let mut session = Session::new();
        let d = dispatch(&mut session);
        session.resolve(d.ticket, Err(PredictError::Transport("refused".into())));

        match session.state() {
            RequestState::Failure(info) => {
                assert_eq!(info.message, FAILURE_MESSAGE);
                assert!(!info.message.contains("refused"));
                assert_eq!(info.cause.kind(), "transport");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn resubmit_clears_previous_result() {
        let mut session = Session::new();
        let d = dispatch(&mut session);
        session.resolve(d.ticket, Ok(ok_result()));
        assert!(session.derived().is_some());

        let second = dispatch(&mut session);
        assert!(second.ticket > d.ticket);
        assert_eq!(session.state(), &RequestState::Pending);
        assert!(session.derived().is_none());
    }

    #[test]
    fn resubmit_after_failure_is_allowed() {
        let mut session = Session::new();
        let d = dispatch(&mut session);
        session.resolve(d.ticket, Err(PredictError::MalformedResponse("x".into())));
        assert!(matches!(session.submit(), SubmitOutcome::Dispatched(_)));
    }

    #[test]
    fn stale_ticket_is_dropped() {
        let mut session = Session::new();
        let first = dispatch(&mut session);
        session.resolve(first.ticket, Err(PredictError::Transport("x".into())));
        let second = dispatch(&mut session);

        assert_eq!(session.resolve(first.ticket, Ok(ok_result())), Resolution::Stale);
        assert_eq!(session.outstanding(), Some(second.ticket));
    }

    #[test]
    fn completion_after_teardown_is_dropped() {
        let mut session = Session::new();
        let d = dispatch(&mut session);
        session.teardown();

        assert_eq!(session.resolve(d.ticket, Ok(ok_result())), Resolution::Closed);
        assert_eq!(session.state(), &RequestState::Pending);
        assert_eq!(session.submit(), SubmitOutcome::Closed);
    }

    #[test]
    fn edits_during_pending_do_not_touch_frozen_input() {
        let mut session = Session::new();
        let d = dispatch(&mut session);
        session.edit("Soil_pH", "5.0").unwrap();
        session.resolve(d.ticket, Ok(ok_result()));

        let derived = session.derived().unwrap();
        let ph = derived.balance.iter().find(|p| p.nutrient == "pH").unwrap();
        assert_eq!(ph.observed, 65.0);
        assert_eq!(session.form().get("Soil_pH"), Some("5.0"));
    }

    #[test]
    fn derived_uses_result_on_success() {
        let mut session = Session::new();
        let d = dispatch(&mut session);
        session.resolve(d.ticket, Ok(ok_result()));

        let derived = session.derived().unwrap();
        assert_eq!(derived.trend.last().unwrap().value, 4.2);
        assert_eq!(derived.headline.yield_unit, "Ton");
    }
}
