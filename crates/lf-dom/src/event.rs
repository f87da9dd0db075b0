//! Pointer interactions delivered to anchor listeners.

/// Interaction types the link rewriter listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    Click,
    /// Pointer press; fires before the browser decides on new-tab opens.
    PressDown,
    ContextMenu,
}

impl InteractionKind {
    pub const ALL: [Self; 3] = [Self::Click, Self::PressDown, Self::ContextMenu];

    /// DOM event type name.
    pub fn as_event_type(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::PressDown => "mousedown",
            Self::ContextMenu => "contextmenu",
        }
    }
}

/// Mouse button as reported by `MouseEvent.button`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Auxiliary,
    Secondary,
    Other(i16),
}

impl PointerButton {
    pub fn from_dom_button(button: i16) -> Self {
        match button {
            0 => Self::Primary,
            1 => Self::Auxiliary,
            2 => Self::Secondary,
            other => Self::Other(other),
        }
    }
}

/// Keyboard modifiers held during an interaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::default()
        }
    }

    pub fn meta() -> Self {
        Self {
            meta: true,
            ..Self::default()
        }
    }

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }
}

/// A dispatched interaction as seen by a capture-phase listener.
pub trait InteractionEvent {
    fn kind(&self) -> InteractionKind;

    fn button(&self) -> PointerButton;

    fn modifiers(&self) -> Modifiers;

    /// Cancels the default action and stops every later listener.
    fn suppress(&self);
}
