//! Modal input state for the item form and the model count prompt.

use armybook_core::{
    validation::{format_enhancements, parse_enhancements, parse_points},
    CollectionItem, ItemDraft, ValidationError,
};

/// Single-line text input with a character cursor.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.chars().count();
        Self { value, cursor }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.value.chars().count() as isize;
        let mut idx = self.cursor as isize + delta;
        if idx < 0 {
            idx = 0;
        } else if idx > len {
            idx = len;
        }
        self.cursor = idx as usize;
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    pub fn insert(&mut self, ch: char) {
        let offset = self.byte_offset(self.cursor);
        self.value.insert(offset, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let offset = self.byte_offset(self.cursor);
        self.value.remove(offset);
    }

    pub fn delete(&mut self) {
        if self.cursor >= self.value.chars().count() {
            return;
        }
        let offset = self.byte_offset(self.cursor);
        self.value.remove(offset);
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.value
            .char_indices()
            .nth(chars)
            .map(|(offset, _)| offset)
            .unwrap_or(self.value.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Faction,
    Points,
    Painted,
    Notes,
    Enhancements,
}

impl FormField {
    pub const ALL: [FormField; 6] = [
        FormField::Name,
        FormField::Faction,
        FormField::Points,
        FormField::Painted,
        FormField::Notes,
        FormField::Enhancements,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Name => "Name",
            FormField::Faction => "Faction",
            FormField::Points => "Base Points",
            FormField::Painted => "Painted",
            FormField::Notes => "Notes",
            FormField::Enhancements => "Enhancements",
        }
    }
}

/// Add/edit form for a collection item.
#[derive(Debug, Clone)]
pub struct ItemForm {
    /// Item being edited, `None` when adding.
    pub editing: Option<u64>,
    pub name: TextInput,
    pub faction: TextInput,
    pub points: TextInput,
    pub painted: bool,
    pub notes: TextInput,
    pub enhancements: TextInput,
    focus: usize,
}

impl ItemForm {
    pub fn add() -> Self {
        Self {
            editing: None,
            name: TextInput::default(),
            faction: TextInput::default(),
            points: TextInput::new("0"),
            painted: false,
            notes: TextInput::default(),
            enhancements: TextInput::default(),
            focus: 0,
        }
    }

    pub fn edit(item: &CollectionItem) -> Self {
        Self {
            editing: Some(item.id),
            name: TextInput::new(item.name.clone()),
            faction: TextInput::new(item.faction.clone()),
            points: TextInput::new(item.base_points.to_string()),
            painted: item.painted,
            notes: TextInput::new(item.notes.clone()),
            enhancements: TextInput::new(format_enhancements(&item.enhancements)),
            focus: 0,
        }
    }

    pub fn title(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit Item"
        } else {
            "Add New Item"
        }
    }

    pub fn focused(&self) -> FormField {
        FormField::ALL[self.focus]
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % FormField::ALL.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + FormField::ALL.len() - 1) % FormField::ALL.len();
    }

    pub fn toggle_painted(&mut self) {
        self.painted = !self.painted;
    }

    /// Text input behind `field`; the painted checkbox has none.
    pub fn input(&self, field: FormField) -> Option<&TextInput> {
        match field {
            FormField::Name => Some(&self.name),
            FormField::Faction => Some(&self.faction),
            FormField::Points => Some(&self.points),
            FormField::Painted => None,
            FormField::Notes => Some(&self.notes),
            FormField::Enhancements => Some(&self.enhancements),
        }
    }

    pub fn focused_input_mut(&mut self) -> Option<&mut TextInput> {
        match self.focused() {
            FormField::Name => Some(&mut self.name),
            FormField::Faction => Some(&mut self.faction),
            FormField::Points => Some(&mut self.points),
            FormField::Painted => None,
            FormField::Notes => Some(&mut self.notes),
            FormField::Enhancements => Some(&mut self.enhancements),
        }
    }

    /// Build the draft. Unparseable points become 0 and are reported through
    /// the returned flag; a malformed enhancement field is an error.
    pub fn to_draft(&self) -> Result<(ItemDraft, bool), ValidationError> {
        let (base_points, coerced) = match parse_points(self.points.value()) {
            Ok(points) => (points, false),
            Err(_) => (0, true),
        };
        let draft = ItemDraft {
            name: self.name.value().to_string(),
            faction: self.faction.value().to_string(),
            base_points,
            painted: self.painted,
            notes: self.notes.value().to_string(),
            enhancements: parse_enhancements(self.enhancements.value())?,
        }
        .validate()?;
        Ok((draft, coerced))
    }
}

/// Typed model count for an army entry.
#[derive(Debug, Clone)]
pub struct CountPrompt {
    pub index: usize,
    pub input: TextInput,
}

impl CountPrompt {
    pub fn new(index: usize, current: u32) -> Self {
        Self {
            index,
            input: TextInput::new(current.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use armybook_core::Enhancement;

    fn type_text(input: &mut TextInput, text: &str) {
        for ch in text.chars() {
            input.insert(ch);
        }
    }

    #[test]
    fn text_input_edits_at_cursor() {
        let mut input = TextInput::new("Boyz");
        input.move_home();
        type_text(&mut input, "Ork ");
        assert_eq!(input.value(), "Ork Boyz");

        input.move_end();
        input.backspace();
        input.move_cursor(-10);
        input.delete();
        assert_eq!(input.value(), "rk Boy");
        assert_eq!(input.cursor(), 0);

        input.move_cursor(100);
        assert_eq!(input.cursor(), 6);
    }

    #[test]
    fn text_input_handles_multibyte_characters() {
        let mut input = TextInput::new("Nöb");
        input.move_cursor(-1);
        input.backspace();
        assert_eq!(input.value(), "Nb");
    }

    #[test]
    fn invalid_points_default_to_zero() {
        let mut form = ItemForm::add();
        type_text(&mut form.name, "Persistence Test");
        form.points = TextInput::new("abc");
        let (draft, coerced) = form.to_draft().unwrap();
        assert_eq!(draft.base_points, 0);
        assert!(coerced);
    }

    #[test]
    fn empty_name_is_rejected() {
        let form = ItemForm::add();
        assert_eq!(form.to_draft().unwrap_err(), ValidationError::EmptyName);
    }

    #[test]
    fn repeated_enhancement_names_block_saving() {
        let mut form = ItemForm::add();
        type_text(&mut form.name, "Captain");
        type_text(&mut form.enhancements, "Sword=10; Sword=15");
        assert_eq!(
            form.to_draft().unwrap_err(),
            ValidationError::DuplicateEnhancement("Sword".to_string())
        );
    }

    #[test]
    fn edit_form_round_trips_the_item() {
        let item = CollectionItem {
            id: 3,
            name: "Space Marine Captain".to_string(),
            faction: "Space Marines".to_string(),
            base_points: 100,
            painted: true,
            notes: "HQ".to_string(),
            enhancements: vec![
                Enhancement::new("Power Sword", 10),
                Enhancement::new("Storm Shield", 15),
            ],
        };
        let form = ItemForm::edit(&item);
        assert_eq!(form.editing, Some(3));
        let (draft, coerced) = form.to_draft().unwrap();
        assert!(!coerced);
        assert_eq!(draft, item.to_draft());
    }

    #[test]
    fn focus_wraps_around() {
        let mut form = ItemForm::add();
        assert_eq!(form.focused(), FormField::Name);
        form.focus_prev();
        assert_eq!(form.focused(), FormField::Enhancements);
        form.focus_next();
        form.focus_next();
        form.focus_next();
        form.focus_next();
        assert_eq!(form.focused(), FormField::Painted);
        assert!(form.input(FormField::Painted).is_none());
    }
}
