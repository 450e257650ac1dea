//! Pagination state machine.
//!
//! The controller is a plain value: [`Pagination::step`] consumes the current
//! state and an event and returns the next state plus the single effect the
//! driver must perform. The cursor only exists inside the state, so there is
//! exactly one place that can advance it.

use serde::Serialize;
use thiserror::Error;

use crate::models::{PageCursor, PageMeta};

/// Where the controller is in the crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PaginationState {
    /// Session held, nothing sent yet.
    #[default]
    Init,
    /// Query submitted, waiting for acknowledgement.
    QuerySubmitted,
    /// Page at `start_position` requested.
    FetchingPage { start_position: u64 },
    Done,
}

impl PaginationState {
    fn name(&self) -> &'static str {
        match self {
            PaginationState::Init => "init",
            PaginationState::QuerySubmitted => "query_submitted",
            PaginationState::FetchingPage { .. } => "fetching_page",
            PaginationState::Done => "done",
        }
    }
}

/// Input fed to the state machine by its driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    Start,
    QueryAcknowledged,
    /// The requested page was read and reported this metadata.
    PageReceived(PageMeta),
    Stop,
}

impl PageEvent {
    fn name(&self) -> &'static str {
        match self {
            PageEvent::Start => "start",
            PageEvent::QueryAcknowledged => "query_acknowledged",
            PageEvent::PageReceived(_) => "page_received",
            PageEvent::Stop => "stop",
        }
    }
}

/// Work the driver must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    SubmitQuery,
    FetchPage { start_position: u64 },
    Finish,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("event `{event}` is not valid in state `{state}`")]
    UnexpectedEvent {
        state: &'static str,
        event: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    state: PaginationState,
    cursor: Option<PageCursor>,
    pages_fetched: u64,
    page_limit: Option<u64>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new()
    }
}

impl Pagination {
    pub fn new() -> Self {
        Self {
            state: PaginationState::Init,
            cursor: None,
            pages_fetched: 0,
            page_limit: None,
        }
    }

    /// Stop after `limit` pages even if the result set continues.
    pub fn with_page_limit(mut self, limit: u64) -> Self {
        self.page_limit = Some(limit);
        self
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    /// Cursor of the most recently read page.
    pub fn cursor(&self) -> Option<PageCursor> {
        self.cursor
    }

    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    fn limit_reached(&self) -> bool {
        self.page_limit
            .is_some_and(|limit| self.pages_fetched >= limit)
    }

    fn transition(mut self, state: PaginationState, effect: Effect) -> (Self, Effect) {
        self.state = state;
        (self, effect)
    }

    fn finish(self) -> (Self, Effect) {
        self.transition(PaginationState::Done, Effect::Finish)
    }

    pub fn step(self, event: PageEvent) -> Result<(Self, Effect), PaginationError> {
        match (self.state, event) {
            (_, PageEvent::Stop) => Ok(self.finish()),

            (PaginationState::Init, PageEvent::Start) => {
                Ok(self.transition(PaginationState::QuerySubmitted, Effect::SubmitQuery))
            }

            (PaginationState::QuerySubmitted, PageEvent::QueryAcknowledged) => {
                if self.limit_reached() {
                    return Ok(self.finish());
                }
                Ok(self.transition(
                    PaginationState::FetchingPage { start_position: 0 },
                    Effect::FetchPage { start_position: 0 },
                ))
            }

            (PaginationState::FetchingPage { start_position }, PageEvent::PageReceived(meta)) => {
                let cursor = PageCursor::new(start_position, meta);
                let mut next = self;
                next.cursor = Some(cursor);
                next.pages_fetched += 1;

                if !cursor.has_next() || next.limit_reached() {
                    return Ok(next.finish());
                }
                let start_position = cursor.next_position();
                Ok(next.transition(
                    PaginationState::FetchingPage { start_position },
                    Effect::FetchPage { start_position },
                ))
            }

            (state, event) => Err(PaginationError::UnexpectedEvent {
                state: state.name(),
                event: event.name(),
            }),
        }
    }
}
