use shared::{
    domain::InputModality,
    protocol::{ControlButton, MessageControls},
};

pub const FIRST_EMOJI: &str = "\u{23EE}";
pub const PREVIOUS_EMOJI: &str = "\u{2B05}";
pub const NEXT_EMOJI: &str = "\u{27A1}";
pub const LAST_EMOJI: &str = "\u{23ED}";
pub const SAVE_EMOJI: &str = "\u{1F4BE}";
pub const DELETE_EMOJI: &str = "\u{26D4}";

pub const FIRST_PAGE_ID: &str = "first_page";
pub const PREVIOUS_PAGE_ID: &str = "previous_page";
pub const NEXT_PAGE_ID: &str = "next_page";
pub const LAST_PAGE_ID: &str = "last_page";
pub const SAVE_BUTTON_ID: &str = "save_button";
pub const DELETE_BUTTON_ID: &str = "delete_button";

/// Logical input understood by a paginator session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    First,
    Prev,
    Next,
    Last,
    Save,
    Dismiss,
}

impl Action {
    pub fn is_navigation(self) -> bool {
        matches!(self, Self::First | Self::Prev | Self::Next | Self::Last)
    }

    /// Index a navigation action lands on over a ring of `len` pages.
    ///
    /// Returns `None` for terminal actions and for an empty ring.
    pub fn target_index(self, current: usize, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let current = current % len;
        match self {
            Self::First => Some(0),
            Self::Last => Some(len - 1),
            Self::Prev => Some((current + len - 1) % len),
            Self::Next => Some((current + 1) % len),
            Self::Save | Self::Dismiss => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSymbol {
    pub symbol: String,
    pub label: String,
    pub action: Action,
}

impl ControlSymbol {
    pub fn new(symbol: impl Into<String>, label: impl Into<String>, action: Action) -> Self {
        Self {
            symbol: symbol.into(),
            label: label.into(),
            action,
        }
    }
}

/// Maps one modality's control symbols onto [`Action`]s.
///
/// Controls are kept in installation order, which is also the order they are
/// attached to the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    modality: InputModality,
    controls: Vec<ControlSymbol>,
}

impl SymbolTable {
    pub fn new(modality: InputModality, controls: Vec<ControlSymbol>) -> Self {
        Self { modality, controls }
    }

    pub fn reactions() -> Self {
        Self::new(
            InputModality::Reaction,
            vec![
                ControlSymbol::new(FIRST_EMOJI, "track_previous", Action::First),
                ControlSymbol::new(PREVIOUS_EMOJI, "arrow_left", Action::Prev),
                ControlSymbol::new(NEXT_EMOJI, "arrow_right", Action::Next),
                ControlSymbol::new(LAST_EMOJI, "track_next", Action::Last),
                ControlSymbol::new(DELETE_EMOJI, "no_entry", Action::Dismiss),
                ControlSymbol::new(SAVE_EMOJI, "floppy_disk", Action::Save),
            ],
        )
    }

    pub fn buttons() -> Self {
        Self::new(
            InputModality::Button,
            vec![
                ControlSymbol::new(FIRST_PAGE_ID, "First Page", Action::First),
                ControlSymbol::new(PREVIOUS_PAGE_ID, "Previous", Action::Prev),
                ControlSymbol::new(NEXT_PAGE_ID, "Next", Action::Next),
                ControlSymbol::new(LAST_PAGE_ID, "Last Page", Action::Last),
                ControlSymbol::new(SAVE_BUTTON_ID, "Save", Action::Save),
                ControlSymbol::new(DELETE_BUTTON_ID, "Delete", Action::Dismiss),
            ],
        )
    }

    pub fn for_modality(modality: InputModality) -> Self {
        match modality {
            InputModality::Reaction => Self::reactions(),
            InputModality::Button => Self::buttons(),
        }
    }

    pub fn modality(&self) -> InputModality {
        self.modality
    }

    pub fn controls(&self) -> &[ControlSymbol] {
        &self.controls
    }

    pub fn resolve(&self, symbol: &str) -> Option<Action> {
        self.controls
            .iter()
            .find(|control| control.symbol == symbol)
            .map(|control| control.action)
    }

    pub fn message_controls(&self) -> MessageControls {
        match self.modality {
            InputModality::Reaction => MessageControls::Reactions(
                self.controls
                    .iter()
                    .map(|control| control.symbol.clone())
                    .collect(),
            ),
            InputModality::Button => MessageControls::Buttons(
                self.controls
                    .iter()
                    .map(|control| ControlButton {
                        custom_id: control.symbol.clone(),
                        label: control.label.clone(),
                    })
                    .collect(),
            ),
        }
    }
}
