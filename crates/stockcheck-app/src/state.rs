// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::{Manifest, ManifestError, Row, RowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SelectingStore,
    Reviewing,
    Complete,
}

impl Phase {
    pub const fn label(self) -> &'static str {
        match self {
            Self::SelectingStore => "select store",
            Self::Reviewing => "reviewing",
            Self::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// 1-based position of the row under review.
    pub position: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    manifest: Manifest,
    selected_store: Option<String>,
    cursor: usize,
    reviewed: BTreeSet<RowId>,
    pub status_line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    SelectStore(String),
    /// Saves the text as the current row's remark, then moves to the next row.
    CommitRemark(String),
    BackToSelection,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    StoreSelected(String),
    SelectionIgnored(String),
    RemarkSaved(RowId),
    CursorAdvanced(usize),
    StoreCompleted(String),
    SelectionReset,
    StatusUpdated(String),
    StatusCleared,
}

impl SessionState {
    pub fn new(manifest: Manifest) -> Self {
        Self {
            manifest,
            selected_store: None,
            cursor: 0,
            reviewed: BTreeSet::new(),
            status_line: None,
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn selected_store(&self) -> Option<&str> {
        self.selected_store.as_deref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn phase(&self) -> Phase {
        match &self.selected_store {
            None => Phase::SelectingStore,
            Some(store) if self.cursor < self.manifest.store_row_count(store) => Phase::Reviewing,
            Some(_) => Phase::Complete,
        }
    }

    /// Rows of the selected store, empty while no store is selected.
    pub fn filtered_rows(&self) -> Vec<&Row> {
        match &self.selected_store {
            Some(store) => self.manifest.rows_for_store(store).collect(),
            None => Vec::new(),
        }
    }

    pub fn current_row(&self) -> Option<&Row> {
        let store = self.selected_store.as_deref()?;
        self.manifest.rows_for_store(store).nth(self.cursor)
    }

    pub fn progress(&self) -> Option<Progress> {
        let store = self.selected_store.as_deref()?;
        let total = self.manifest.store_row_count(store);
        (self.cursor < total).then_some(Progress {
            position: self.cursor + 1,
            total,
        })
    }

    /// Distinct rows committed at least once during this session.
    pub fn reviewed_rows(&self) -> usize {
        self.reviewed.len()
    }

    pub fn dispatch(&mut self, command: SessionCommand) -> Result<Vec<SessionEvent>, ManifestError> {
        let events = match command {
            SessionCommand::SelectStore(store) => self.select(store),
            SessionCommand::CommitRemark(text) => return self.commit_remark(text),
            SessionCommand::BackToSelection => self.reset(),
            SessionCommand::SetStatus(message) => vec![self.set_status(message)],
            SessionCommand::ClearStatus => {
                self.status_line = None;
                vec![SessionEvent::StatusCleared]
            }
        };
        Ok(events)
    }

    fn select(&mut self, store: String) -> Vec<SessionEvent> {
        if self.phase() != Phase::SelectingStore {
            return Vec::new();
        }
        if !self.manifest.contains_store(&store) {
            tracing::debug!(store = %store, "ignoring selection of unknown store");
            return vec![SessionEvent::SelectionIgnored(store)];
        }

        tracing::info!(
            store = %store,
            rows = self.manifest.store_row_count(&store),
            "store selected"
        );
        self.selected_store = Some(store.clone());
        self.cursor = 0;
        vec![SessionEvent::StoreSelected(store)]
    }

    fn commit_remark(&mut self, text: String) -> Result<Vec<SessionEvent>, ManifestError> {
        let Some(id) = self.current_row().map(|row| row.id) else {
            return Ok(Vec::new());
        };

        self.manifest.update_remark(id, text)?;
        self.reviewed.insert(id);
        tracing::debug!(row = id.get(), "remark saved");

        let mut events = vec![SessionEvent::RemarkSaved(id)];
        events.extend(self.advance());
        Ok(events)
    }

    fn advance(&mut self) -> Vec<SessionEvent> {
        if self.phase() != Phase::Reviewing {
            return Vec::new();
        }

        self.cursor += 1;
        let mut events = vec![SessionEvent::CursorAdvanced(self.cursor)];
        if self.phase() == Phase::Complete
            && let Some(store) = self.selected_store.clone()
        {
            tracing::info!(store = %store, "store complete");
            events.push(SessionEvent::StoreCompleted(store));
        }
        events
    }

    fn reset(&mut self) -> Vec<SessionEvent> {
        if self.phase() != Phase::Complete {
            return Vec::new();
        }

        self.selected_store = None;
        self.cursor = 0;
        vec![SessionEvent::SelectionReset]
    }

    fn set_status(&mut self, message: String) -> SessionEvent {
        self.status_line = Some(message.clone());
        SessionEvent::StatusUpdated(message)
    }
}

#[cfg(test)]
mod tests {
    use super::{Phase, Progress, SessionCommand, SessionEvent, SessionState};
    use crate::{Manifest, NewRow, Quantity, RowId};
    use anyhow::Result;

    fn row(store: &str, product: &str, remark: &str) -> NewRow {
        NewRow {
            store: store.to_owned(),
            product: product.to_owned(),
            planned_qty: Quantity::Count(10.0),
            received_qty: Quantity::Count(9.0),
            unit_tags: vec!["box".to_owned()],
            rack_name: "R1".to_owned(),
            remark: remark.to_owned(),
        }
    }

    fn two_store_session() -> SessionState {
        SessionState::new(Manifest::from_rows([
            row("A", "apples", ""),
            row("A", "pears", "bruised"),
            row("B", "plums", ""),
        ]))
    }

    #[test]
    fn new_session_starts_in_store_selection() {
        let state = two_store_session();
        assert_eq!(state.phase(), Phase::SelectingStore);
        assert_eq!(state.selected_store(), None);
        assert_eq!(state.cursor(), 0);
        assert!(state.current_row().is_none());
        assert!(state.progress().is_none());
        assert!(state.filtered_rows().is_empty());
    }

    #[test]
    fn select_known_store_starts_review() -> Result<()> {
        let mut state = two_store_session();
        let events = state.dispatch(SessionCommand::SelectStore("A".to_owned()))?;

        assert_eq!(events, vec![SessionEvent::StoreSelected("A".to_owned())]);
        assert_eq!(state.phase(), Phase::Reviewing);
        assert_eq!(state.current_row().map(|row| row.id), Some(RowId::new(0)));
        assert_eq!(
            state.progress(),
            Some(Progress {
                position: 1,
                total: 2
            })
        );
        Ok(())
    }

    #[test]
    fn select_unknown_store_is_ignored() -> Result<()> {
        let mut state = two_store_session();
        let events = state.dispatch(SessionCommand::SelectStore("Z".to_owned()))?;

        assert_eq!(events, vec![SessionEvent::SelectionIgnored("Z".to_owned())]);
        assert_eq!(state.phase(), Phase::SelectingStore);
        assert_eq!(state.selected_store(), None);
        Ok(())
    }

    #[test]
    fn select_while_reviewing_keeps_current_store() -> Result<()> {
        let mut state = two_store_session();
        state.dispatch(SessionCommand::SelectStore("A".to_owned()))?;
        state.dispatch(SessionCommand::CommitRemark(String::new()))?;

        let events = state.dispatch(SessionCommand::SelectStore("B".to_owned()))?;
        assert!(events.is_empty());
        assert_eq!(state.selected_store(), Some("A"));
        assert_eq!(state.cursor(), 1);
        Ok(())
    }

    #[test]
    fn commit_saves_remark_then_advances() -> Result<()> {
        let mut state = two_store_session();
        state.dispatch(SessionCommand::SelectStore("A".to_owned()))?;

        let events = state.dispatch(SessionCommand::CommitRemark("ok".to_owned()))?;
        assert_eq!(
            events,
            vec![
                SessionEvent::RemarkSaved(RowId::new(0)),
                SessionEvent::CursorAdvanced(1),
            ]
        );
        assert_eq!(
            state.manifest().row(RowId::new(0)).map(|row| row.remark.as_str()),
            Some("ok")
        );
        assert_eq!(state.current_row().map(|row| row.id), Some(RowId::new(1)));
        Ok(())
    }

    #[test]
    fn committing_last_row_completes_store() -> Result<()> {
        let mut state = two_store_session();
        state.dispatch(SessionCommand::SelectStore("A".to_owned()))?;
        state.dispatch(SessionCommand::CommitRemark("ok".to_owned()))?;

        let events = state.dispatch(SessionCommand::CommitRemark("bruised".to_owned()))?;
        assert_eq!(
            events,
            vec![
                SessionEvent::RemarkSaved(RowId::new(1)),
                SessionEvent::CursorAdvanced(2),
                SessionEvent::StoreCompleted("A".to_owned()),
            ]
        );
        assert_eq!(state.phase(), Phase::Complete);
        assert_eq!(state.cursor(), 2);
        assert!(state.current_row().is_none());
        assert!(state.progress().is_none());
        Ok(())
    }

    #[test]
    fn commit_outside_review_does_nothing() -> Result<()> {
        let mut state = two_store_session();
        let before = state.clone();

        let events = state.dispatch(SessionCommand::CommitRemark("stray".to_owned()))?;
        assert!(events.is_empty());
        assert_eq!(state, before);
        Ok(())
    }

    #[test]
    fn reset_only_applies_once_complete() -> Result<()> {
        let mut state = two_store_session();
        state.dispatch(SessionCommand::SelectStore("B".to_owned()))?;

        assert!(state.dispatch(SessionCommand::BackToSelection)?.is_empty());
        assert_eq!(state.phase(), Phase::Reviewing);

        state.dispatch(SessionCommand::CommitRemark(String::new()))?;
        let events = state.dispatch(SessionCommand::BackToSelection)?;
        assert_eq!(events, vec![SessionEvent::SelectionReset]);
        assert_eq!(state.phase(), Phase::SelectingStore);
        assert_eq!(state.cursor(), 0);
        Ok(())
    }

    #[test]
    fn reviewed_rows_counts_distinct_commits() -> Result<()> {
        let mut state = two_store_session();
        for _ in 0..2 {
            state.dispatch(SessionCommand::SelectStore("A".to_owned()))?;
            state.dispatch(SessionCommand::CommitRemark(String::new()))?;
            state.dispatch(SessionCommand::CommitRemark(String::new()))?;
            state.dispatch(SessionCommand::BackToSelection)?;
        }
        assert_eq!(state.reviewed_rows(), 2);
        Ok(())
    }

    #[test]
    fn status_set_and_clear() -> Result<()> {
        let mut state = two_store_session();

        let set = state.dispatch(SessionCommand::SetStatus("exported".to_owned()))?;
        assert_eq!(set, vec![SessionEvent::StatusUpdated("exported".to_owned())]);
        assert_eq!(state.status_line.as_deref(), Some("exported"));

        let cleared = state.dispatch(SessionCommand::ClearStatus)?;
        assert_eq!(cleared, vec![SessionEvent::StatusCleared]);
        assert_eq!(state.status_line, None);
        Ok(())
    }
}
