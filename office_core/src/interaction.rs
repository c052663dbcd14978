use crate::{
    ElementId, Position,
    office::{Element, ElementKind, OfficeState},
};

/// A change to the office requested by an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    /// Place the character at a position. Subject to the same checks as a move.
    MoveCharacter(Position),
    /// Give an element a new display name.
    RenameElement { id: ElementId, name: String },
}

/// The outcome of using an element: what the player is told, and what changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub description: String,
    pub effects: Vec<StateChange>,
}

impl Interaction {
    /// An interaction that only reports and leaves the office untouched.
    pub fn describe(description: impl Into<String>) -> Self {
        Interaction {
            description: description.into(),
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: StateChange) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Trait deciding what happens when the character uses an element.
///
/// Called by the engine after the element was found and range-checked.
/// The returned effects are applied all-or-nothing.
pub trait InteractionHandler: Send + Sync {
    fn interact(&self, element: &Element, office: &OfficeState) -> Interaction;
}

/// Describes the element by its kind without changing anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescribeByKind;

impl DescribeByKind {
    pub fn description(kind: ElementKind) -> &'static str {
        match kind {
            ElementKind::Desk => "You sit down at the desk and sort through a stack of paperwork.",
            ElementKind::Chair => "You sit on the chair.",
            ElementKind::Plant => "You water the plant. It looks a little greener.",
            ElementKind::Computer => "The computer screen shows your schedule.",
        }
    }
}

impl InteractionHandler for DescribeByKind {
    fn interact(&self, element: &Element, _office: &OfficeState) -> Interaction {
        Interaction::describe(Self::description(element.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::office::{DEFAULT_BLUEPRINT, load_office_from_string};

    #[test]
    fn every_kind_has_a_description() {
        for kind in [
            ElementKind::Desk,
            ElementKind::Chair,
            ElementKind::Plant,
            ElementKind::Computer,
        ] {
            assert!(!DescribeByKind::description(kind).is_empty());
        }
    }

    #[test]
    fn describe_by_kind_has_no_effects() {
        let office = load_office_from_string(DEFAULT_BLUEPRINT).unwrap();
        let chair = office.element("chair-1").unwrap();
        let interaction = DescribeByKind.interact(chair, &office);
        assert_eq!(interaction.description, "You sit on the chair.");
        assert!(interaction.effects.is_empty());
    }

    #[test]
    fn effects_accumulate_in_order() {
        let interaction = Interaction::describe("moved")
            .with_effect(StateChange::MoveCharacter(Position::new(1, 1)))
            .with_effect(StateChange::RenameElement {
                id: "chair-1".to_string(),
                name: "Taken chair".to_string(),
            });
        assert_eq!(interaction.effects.len(), 2);
        assert!(matches!(
            interaction.effects[0],
            StateChange::MoveCharacter(_)
        ));
    }
}
