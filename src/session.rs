use crate::editor::FieldEditor;
use crate::errors::{AppError, AppResult};
use crate::models::{Business, EditorMode, EditorSnapshot, SavePayload};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    New,
    Existing(String),
}

#[derive(Debug)]
enum SessionState {
    Closed,
    Open { target: EditTarget, editor: FieldEditor },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveInstruction {
    Create(SavePayload),
    Replace { business_id: String, payload: SavePayload },
}

/// Mediates between "the modal is open for a new or an existing business"
/// and the field editor. The editor exists exactly while the session is
/// open, so a closed session with stale edits is unrepresentable.
#[derive(Debug)]
pub struct EditorSession {
    state: SessionState,
}

impl EditorSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Closed,
        }
    }

    /// Opens for a brand-new business. Opening over an already-open session
    /// discards the prior working list.
    pub fn open_new(&mut self) {
        self.state = SessionState::Open {
            target: EditTarget::New,
            editor: FieldEditor::for_new(),
        };
    }

    pub fn open_existing(&mut self, business: &Business) {
        self.state = SessionState::Open {
            target: EditTarget::Existing(business.id.clone()),
            editor: FieldEditor::for_business(business),
        };
    }

    pub fn cancel(&mut self) {
        self.state = SessionState::Closed;
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, SessionState::Open { .. })
    }

    pub fn editor_mut(&mut self) -> AppResult<&mut FieldEditor> {
        match &mut self.state {
            SessionState::Open { editor, .. } => Ok(editor),
            SessionState::Closed => Err(no_open_session()),
        }
    }

    pub fn snapshot(&self) -> AppResult<EditorSnapshot> {
        let SessionState::Open { target, editor } = &self.state else {
            return Err(no_open_session());
        };
        let (mode, business_id) = match target {
            EditTarget::New => (EditorMode::Create, None),
            EditTarget::Existing(id) => (EditorMode::Update, Some(id.clone())),
        };
        Ok(EditorSnapshot {
            mode,
            business_id,
            name: editor.name().to_string(),
            fields: editor.fields().to_vec(),
        })
    }

    /// Turns the current working list into a save instruction and closes the
    /// session. A blank name is rejected and the session stays open so the
    /// user can fix it.
    pub fn save(&mut self) -> AppResult<SaveInstruction> {
        let SessionState::Open { target, editor } = &self.state else {
            return Err(no_open_session());
        };
        let payload = editor.submit();
        if payload.name.trim().is_empty() {
            return Err(AppError::Validation("business name must not be empty".to_string()));
        }
        let instruction = match target {
            EditTarget::New => SaveInstruction::Create(payload),
            EditTarget::Existing(id) => SaveInstruction::Replace {
                business_id: id.clone(),
                payload,
            },
        };
        self.state = SessionState::Closed;
        Ok(instruction)
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

fn no_open_session() -> AppError {
    AppError::NotFound("no open editor session".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Field;
    use chrono::Utc;

    fn sample_business() -> Business {
        let now = Utc::now();
        Business {
            id: "biz_existing".to_string(),
            name: "Bakery".to_string(),
            fields: vec![Field {
                id: "field_1".to_string(),
                label: "Persona".to_string(),
                value: "Commuters".to_string(),
                is_custom: false,
            }],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn closed_session_rejects_editor_access() {
        let mut session = EditorSession::new();
        assert!(!session.is_open());
        assert!(matches!(session.editor_mut(), Err(AppError::NotFound(_))));
        assert!(matches!(session.snapshot(), Err(AppError::NotFound(_))));
        assert!(matches!(session.save(), Err(AppError::NotFound(_))));
    }

    #[test]
    fn open_new_snapshot_is_create_mode() {
        let mut session = EditorSession::new();
        session.open_new();

        let snapshot = session.snapshot().expect("snapshot");
        assert_eq!(snapshot.mode, EditorMode::Create);
        assert_eq!(snapshot.business_id, None);
        assert!(snapshot.name.is_empty());
        assert_eq!(snapshot.fields.len(), 6);
    }

    #[test]
    fn open_existing_snapshot_is_update_mode() {
        let mut session = EditorSession::new();
        session.open_existing(&sample_business());

        let snapshot = session.snapshot().expect("snapshot");
        assert_eq!(snapshot.mode, EditorMode::Update);
        assert_eq!(snapshot.business_id.as_deref(), Some("biz_existing"));
        assert_eq!(snapshot.name, "Bakery");
    }

    #[test]
    fn reopening_discards_in_progress_edits() {
        let mut session = EditorSession::new();
        session.open_new();
        session.editor_mut().expect("editor").set_name("Half-typed");

        session.open_existing(&sample_business());
        let snapshot = session.snapshot().expect("snapshot");
        assert_eq!(snapshot.name, "Bakery");

        session.open_new();
        let snapshot = session.snapshot().expect("snapshot");
        assert!(snapshot.name.is_empty());
    }

    #[test]
    fn save_for_new_produces_create_and_closes() {
        let mut session = EditorSession::new();
        session.open_new();
        session.editor_mut().expect("editor").set_name("Studio");

        let instruction = session.save().expect("save");
        let SaveInstruction::Create(payload) = instruction else {
            panic!("expected create instruction");
        };
        assert_eq!(payload.name, "Studio");
        assert!(!session.is_open());
    }

    #[test]
    fn save_for_existing_produces_replace_with_original_id() {
        let mut session = EditorSession::new();
        session.open_existing(&sample_business());
        session.editor_mut().expect("editor").set_name("Bakery & Cafe");

        let instruction = session.save().expect("save");
        let SaveInstruction::Replace { business_id, payload } = instruction else {
            panic!("expected replace instruction");
        };
        assert_eq!(business_id, "biz_existing");
        assert_eq!(payload.name, "Bakery & Cafe");
    }

    #[test]
    fn blank_name_is_rejected_and_session_stays_open() {
        let mut session = EditorSession::new();
        session.open_new();
        session.editor_mut().expect("editor").set_name("   ");

        assert!(matches!(session.save(), Err(AppError::Validation(_))));
        assert!(session.is_open());
    }

    #[test]
    fn cancel_discards_the_working_list() {
        let mut session = EditorSession::new();
        session.open_new();
        session.editor_mut().expect("editor").set_name("Discarded");
        session.cancel();

        assert!(!session.is_open());
        session.open_new();
        assert!(session.snapshot().expect("snapshot").name.is_empty());
    }
}
