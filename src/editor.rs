use crate::models::{Business, Field, SavePayload, DEFAULT_FIELD_LABELS};
use uuid::Uuid;

/// Working copy of one business's name and ordered field list for an open
/// edit session. The copy never aliases the persisted collection: it is
/// discarded on cancel and merged upward on save.
#[derive(Debug, Default)]
pub struct FieldEditor {
    name: String,
    fields: Vec<Field>,
    dragged: Option<String>,
}

impl FieldEditor {
    /// Editor for a brand-new business: the default template instantiated
    /// with fresh ids and empty values.
    pub fn for_new() -> Self {
        let mut editor = Self::default();
        for label in DEFAULT_FIELD_LABELS {
            let id = editor.next_field_id();
            editor.fields.push(Field {
                id,
                label: label.to_string(),
                value: String::new(),
                is_custom: false,
            });
        }
        editor
    }

    pub fn for_business(business: &Business) -> Self {
        Self {
            name: business.name.clone(),
            fields: business.fields.clone(),
            dragged: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn add_field(&mut self) {
        let id = self.next_field_id();
        self.fields.push(Field {
            id,
            label: String::new(),
            value: String::new(),
            is_custom: true,
        });
    }

    pub fn remove_field(&mut self, id: &str) {
        self.fields.retain(|field| field.id != id);
    }

    pub fn set_field_label(&mut self, id: &str, label: &str) {
        if let Some(field) = self.fields.iter_mut().find(|field| field.id == id) {
            field.label = label.to_string();
        }
    }

    pub fn set_field_value(&mut self, id: &str, value: &str) {
        if let Some(field) = self.fields.iter_mut().find(|field| field.id == id) {
            field.value = value.to_string();
        }
    }

    /// Moves the dragged field to the target's pre-removal index. Both
    /// indices are resolved before the dragged field is removed, so dropping
    /// past neighbors shifts them by exactly one toward the vacated slot.
    /// This is a move, not a swap. No-op when either id is missing or both
    /// are the same.
    pub fn reorder(&mut self, dragged_id: &str, target_id: &str) {
        if dragged_id == target_id {
            return;
        }
        let Some(from) = self.fields.iter().position(|field| field.id == dragged_id) else {
            return;
        };
        let Some(to) = self.fields.iter().position(|field| field.id == target_id) else {
            return;
        };
        let field = self.fields.remove(from);
        self.fields.insert(to, field);
    }

    pub fn begin_drag(&mut self, id: &str) {
        self.dragged = Some(id.to_string());
    }

    /// Completes the drag over `target_id`. The dragged id is cleared even
    /// when the drop turns out to be a no-op.
    pub fn drop_on(&mut self, target_id: &str) {
        let Some(dragged) = self.dragged.take() else {
            return;
        };
        self.reorder(&dragged, target_id);
    }

    #[cfg(test)]
    pub(crate) fn dragged(&self) -> Option<&str> {
        self.dragged.as_deref()
    }

    /// Fields whose trimmed label is empty are dropped entirely, values
    /// included. Does not mutate the working list.
    pub fn submit(&self) -> SavePayload {
        SavePayload {
            name: self.name.clone(),
            fields: self
                .fields
                .iter()
                .filter(|field| !field.label.trim().is_empty())
                .cloned()
                .collect(),
        }
    }

    fn next_field_id(&self) -> String {
        loop {
            let short = Uuid::new_v4().simple().to_string();
            let id = format!("field_{}", &short[..8]);
            if !self.fields.iter().any(|field| field.id == id) {
                return id;
            }
        }
    }
}
