use crate::cards::cards_for;
use crate::errors::{AppError, AppResult};
use crate::models::{Business, CardView, EditorSnapshot};
use crate::session::{EditorSession, SaveInstruction};
use crate::store::BusinessStore;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Owns the business collection, the editor session, and the pending delete
/// confirmation. The shell is the sole writer to the store; persistence is
/// best-effort relative to the in-memory collection for the running session.
pub struct AppShell {
    store: BusinessStore,
    businesses: Vec<Business>,
    session: EditorSession,
    pending_delete: Option<String>,
}

impl AppShell {
    pub fn new(store: BusinessStore) -> Self {
        let businesses = store.load();
        Self {
            store,
            businesses,
            session: EditorSession::new(),
            pending_delete: None,
        }
    }

    pub fn cards(&self) -> Vec<CardView> {
        cards_for(&self.businesses)
    }

    pub fn business(&self, id: &str) -> Option<&Business> {
        self.businesses.iter().find(|business| business.id == id)
    }

    /// Opening any editor session clears a pending delete confirmation.
    pub fn open_new(&mut self) -> AppResult<EditorSnapshot> {
        self.pending_delete = None;
        self.session.open_new();
        self.session.snapshot()
    }

    pub fn open_existing(&mut self, business_id: &str) -> AppResult<EditorSnapshot> {
        let business = self
            .business(business_id)
            .ok_or_else(|| AppError::NotFound(format!("Business '{}' not found", business_id)))?
            .clone();
        self.pending_delete = None;
        self.session.open_existing(&business);
        self.session.snapshot()
    }

    pub fn editor_snapshot(&self) -> AppResult<EditorSnapshot> {
        self.session.snapshot()
    }

    pub fn cancel_editor(&mut self) {
        self.session.cancel();
    }

    pub fn set_editor_name(&mut self, name: &str) -> AppResult<()> {
        self.session.editor_mut()?.set_name(name);
        Ok(())
    }

    pub fn add_editor_field(&mut self) -> AppResult<EditorSnapshot> {
        self.session.editor_mut()?.add_field();
        self.session.snapshot()
    }

    pub fn remove_editor_field(&mut self, field_id: &str) -> AppResult<EditorSnapshot> {
        self.session.editor_mut()?.remove_field(field_id);
        self.session.snapshot()
    }

    pub fn set_editor_field_label(&mut self, field_id: &str, label: &str) -> AppResult<()> {
        self.session.editor_mut()?.set_field_label(field_id, label);
        Ok(())
    }

    pub fn set_editor_field_value(&mut self, field_id: &str, value: &str) -> AppResult<()> {
        self.session.editor_mut()?.set_field_value(field_id, value);
        Ok(())
    }

    pub fn begin_field_drag(&mut self, field_id: &str) -> AppResult<()> {
        self.session.editor_mut()?.begin_drag(field_id);
        Ok(())
    }

    pub fn drop_field_on(&mut self, target_id: &str) -> AppResult<EditorSnapshot> {
        self.session.editor_mut()?.drop_on(target_id);
        self.session.snapshot()
    }

    pub fn reorder_editor_fields(&mut self, dragged_id: &str, target_id: &str) -> AppResult<EditorSnapshot> {
        self.session.editor_mut()?.reorder(dragged_id, target_id);
        self.session.snapshot()
    }

    /// Turns the session's save instruction into a collection mutation and
    /// persists the full collection. A store write failure is logged and the
    /// in-memory mutation stands.
    pub fn save_editor(&mut self) -> AppResult<Business> {
        let instruction = self.session.save()?;
        let now = Utc::now();
        let saved = match instruction {
            SaveInstruction::Create(payload) => {
                let business = Business {
                    id: self.next_business_id(now),
                    name: payload.name,
                    fields: payload.fields,
                    created_at: now,
                    updated_at: now,
                };
                self.businesses.push(business.clone());
                business
            }
            SaveInstruction::Replace { business_id, payload } => {
                let business = self
                    .businesses
                    .iter_mut()
                    .find(|business| business.id == business_id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Business '{}' no longer exists", business_id))
                    })?;
                business.name = payload.name;
                business.fields = payload.fields;
                business.updated_at = now;
                business.clone()
            }
        };
        self.persist();
        Ok(saved)
    }

    pub fn request_delete(&mut self, business_id: &str) -> AppResult<()> {
        if self.business(business_id).is_none() {
            return Err(AppError::NotFound(format!("Business '{}' not found", business_id)));
        }
        // A newer request replaces whatever was pending.
        self.pending_delete = Some(business_id.to_string());
        Ok(())
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    /// Removes the pending record and persists. Returns false when nothing
    /// was pending or the record had already vanished.
    pub fn confirm_delete(&mut self) -> bool {
        let Some(pending) = self.pending_delete.take() else {
            return false;
        };
        let before = self.businesses.len();
        self.businesses.retain(|business| business.id != pending);
        if self.businesses.len() == before {
            return false;
        }
        self.persist();
        true
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    fn persist(&self) {
        if let Err(error) = self.store.save(&self.businesses) {
            tracing::warn!(error = %error, "business collection write failed; keeping in-memory state");
        }
    }

    fn next_business_id(&self, now: DateTime<Utc>) -> String {
        loop {
            let short = Uuid::new_v4().simple().to_string();
            let id = format!("biz_{}_{}", now.format("%Y%m%d%H%M%S"), &short[..6]);
            if !self.businesses.iter().any(|business| business.id == id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StringStore, BUSINESSES_KEY};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn shell_with_memory() -> (AppShell, Arc<MemoryStore>) {
        let memory = Arc::new(MemoryStore::new());
        let shell = AppShell::new(BusinessStore::new(Box::new(Arc::clone(&memory))));
        (shell, memory)
    }

    fn create_business(shell: &mut AppShell, name: &str) -> Business {
        shell.open_new().expect("open editor");
        shell.set_editor_name(name).expect("set name");
        shell.save_editor().expect("save")
    }

    #[test]
    fn create_sets_matching_timestamps_and_unique_ids() {
        let (mut shell, _memory) = shell_with_memory();
        let mut ids = HashSet::new();
        for index in 0..5 {
            let business = create_business(&mut shell, &format!("Business {}", index));
            assert_eq!(business.created_at, business.updated_at);
            assert!(ids.insert(business.id.clone()), "duplicate id {}", business.id);
        }
        assert_eq!(shell.cards().len(), 5);
    }

    #[test]
    fn create_keeps_submit_output_in_order() {
        let (mut shell, _memory) = shell_with_memory();
        shell.open_new().expect("open editor");
        shell.set_editor_name("Ordered").expect("set name");

        let snapshot = shell.editor_snapshot().expect("snapshot");
        let first = snapshot.fields[0].id.clone();
        let last = snapshot.fields[5].id.clone();
        shell.set_editor_field_value(&first, "alpha").expect("set value");
        shell.reorder_editor_fields(&first, &last).expect("reorder");

        let business = shell.save_editor().expect("save");
        let labels: Vec<&str> = business.fields.iter().map(|field| field.label.as_str()).collect();
        assert_eq!(
            labels,
            [
                "Persona",
                "Insight",
                "Billing Amount",
                "Payment Method",
                "Advertising Method",
                "Product / Service",
            ]
        );
    }

    #[test]
    fn update_preserves_id_and_created_at() {
        let (mut shell, _memory) = shell_with_memory();
        let original = create_business(&mut shell, "Original");

        shell.open_existing(&original.id).expect("open existing");
        shell.set_editor_name("Renamed").expect("set name");
        let updated = shell.save_editor().expect("save");

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.name, "Renamed");
        assert!(updated.updated_at >= original.updated_at);
        assert_eq!(shell.cards().len(), 1);
    }

    #[test]
    fn open_existing_rejects_unknown_ids() {
        let (mut shell, _memory) = shell_with_memory();
        assert!(matches!(
            shell.open_existing("biz_missing"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn write_failure_keeps_in_memory_state() {
        let (mut shell, memory) = shell_with_memory();
        memory.fail_writes(true);

        let business = create_business(&mut shell, "Unpersisted");
        assert_eq!(shell.cards().len(), 1);
        assert_eq!(shell.business(&business.id).map(|b| b.name.as_str()), Some("Unpersisted"));
        assert_eq!(memory.get(BUSINESSES_KEY).expect("get"), None);
    }

    #[test]
    fn request_delete_replaces_pending_target() {
        let (mut shell, _memory) = shell_with_memory();
        let first = create_business(&mut shell, "First");
        let second = create_business(&mut shell, "Second");

        shell.request_delete(&first.id).expect("request first");
        shell.request_delete(&second.id).expect("request second");
        assert_eq!(shell.pending_delete(), Some(second.id.as_str()));

        assert!(shell.confirm_delete());
        assert_eq!(shell.pending_delete(), None);
        let remaining: Vec<String> = shell.cards().into_iter().map(|card| card.id).collect();
        assert_eq!(remaining, [first.id]);
    }

    #[test]
    fn cancel_delete_leaves_collection_unchanged() {
        let (mut shell, _memory) = shell_with_memory();
        let business = create_business(&mut shell, "Keep me");

        shell.request_delete(&business.id).expect("request delete");
        shell.cancel_delete();
        assert_eq!(shell.pending_delete(), None);
        assert_eq!(shell.cards().len(), 1);

        // Confirming with nothing pending is a no-op.
        assert!(!shell.confirm_delete());
        assert_eq!(shell.cards().len(), 1);
    }

    #[test]
    fn opening_an_editor_clears_pending_delete() {
        let (mut shell, _memory) = shell_with_memory();
        let first = create_business(&mut shell, "First");
        let second = create_business(&mut shell, "Second");

        shell.request_delete(&first.id).expect("request delete");
        shell.open_existing(&second.id).expect("open existing");
        assert_eq!(shell.pending_delete(), None);

        shell.cancel_editor();
        shell.request_delete(&first.id).expect("request delete");
        shell.open_new().expect("open new");
        assert_eq!(shell.pending_delete(), None);
    }

    #[test]
    fn request_delete_rejects_unknown_ids() {
        let (mut shell, _memory) = shell_with_memory();
        assert!(matches!(
            shell.request_delete("biz_missing"),
            Err(AppError::NotFound(_))
        ));
    }
}
