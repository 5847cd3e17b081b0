use std::collections::HashMap;

use shared::domain::{Page, RecordId};

use crate::{
    playback::PlayerEvent,
    widget::{RecordWidget, SyncOutcome},
};

/// Record widgets keyed by record identity, in page order.
///
/// Reconciling against a fresh page keeps the local state of records that
/// are still listed, creates widgets for new ones and drops the rest.
#[derive(Default)]
pub struct WidgetBoard {
    order: Vec<RecordId>,
    widgets: HashMap<RecordId, RecordWidget>,
}

impl WidgetBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reconcile(&mut self, page: &Page) {
        let mut next = HashMap::with_capacity(page.records.len());
        for record in &page.records {
            let widget = match self.widgets.remove(&record.id) {
                Some(mut widget) => {
                    let outcome = widget.sync_record(record.clone());
                    debug_assert_eq!(outcome, SyncOutcome::Refreshed);
                    widget
                }
                None => RecordWidget::new(record.clone()),
            };
            next.insert(record.id, widget);
        }

        if !self.widgets.is_empty() {
            tracing::debug!(dropped = self.widgets.len(), "dropping widgets of unlisted records");
        }
        self.widgets = next;
        self.order = page.records.iter().map(|record| record.id).collect();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn ids(&self) -> &[RecordId] {
        &self.order
    }

    pub fn get(&self, id: RecordId) -> Option<&RecordWidget> {
        self.widgets.get(&id)
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut RecordWidget> {
        self.widgets.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordWidget> {
        self.order.iter().filter_map(|id| self.widgets.get(id))
    }

    /// Routes a player signal to the widget of `id`. Signals for records no
    /// longer listed are dropped.
    pub fn dispatch_player_event(&mut self, id: RecordId, event: PlayerEvent) -> bool {
        match self.widgets.get_mut(&id) {
            Some(widget) => {
                widget.on_player_event(event);
                true
            }
            None => false,
        }
    }
}
