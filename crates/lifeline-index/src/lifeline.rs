use serde::{Deserialize, Serialize};

use lifeline_types::Reference;

/// Index over a class's record chain.
///
/// The history is implicit: each amendment record points at the state it
/// replaced, so only the head needs to be tracked here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLifeline {
    /// Most recent amendment; `None` until the class is first amended.
    pub latest_amend: Option<Reference>,
}

impl ClassLifeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// The authoritative class state: the latest amendment, or the
    /// activation when there is none.
    pub fn latest_state(&self, activation: &Reference) -> Reference {
        self.latest_amend.unwrap_or(*activation)
    }

    pub fn set_latest_amend(&mut self, amend: Reference) {
        self.latest_amend = Some(amend);
    }
}

/// Index over an object's record chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLifeline {
    /// Class the object was activated from.
    pub class: Reference,
    /// Most recent amendment, or the activation if never amended.
    pub latest_state: Reference,
    /// Delegate append records in attachment order.
    pub append_refs: Vec<Reference>,
}

impl ObjectLifeline {
    /// Lifeline for a freshly activated object.
    pub fn new(activation: Reference, class: Reference) -> Self {
        Self {
            class,
            latest_state: activation,
            append_refs: Vec::new(),
        }
    }

    /// Whether the latest state is something other than the activation.
    pub fn is_amended(&self, activation: &Reference) -> bool {
        self.latest_state != *activation
    }

    pub fn set_latest_state(&mut self, state: Reference) {
        self.latest_state = state;
    }

    /// Attach a delegate after all existing ones.
    pub fn push_append(&mut self, append: Reference) {
        self.append_refs.push(append);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeline_types::{PulseNumber, RecordId};

    fn reference(tag: &[u8]) -> Reference {
        Reference::new(RecordId::zero(), RecordId::compute(tag, PulseNumber(1)))
    }

    #[test]
    fn class_latest_state_falls_back_to_activation() {
        let activation = reference(b"class");
        let mut lifeline = ClassLifeline::new();
        assert_eq!(lifeline.latest_state(&activation), activation);

        let amend = reference(b"amend");
        lifeline.set_latest_amend(amend);
        assert_eq!(lifeline.latest_state(&activation), amend);
    }

    #[test]
    fn new_object_lifeline_points_at_activation() {
        let activation = reference(b"object");
        let lifeline = ObjectLifeline::new(activation, reference(b"class"));
        assert_eq!(lifeline.latest_state, activation);
        assert!(!lifeline.is_amended(&activation));
        assert!(lifeline.append_refs.is_empty());
    }

    #[test]
    fn amend_and_append_update_pointers() {
        let activation = reference(b"object");
        let mut lifeline = ObjectLifeline::new(activation, reference(b"class"));
        lifeline.set_latest_state(reference(b"amend"));
        assert!(lifeline.is_amended(&activation));

        lifeline.push_append(reference(b"a"));
        lifeline.push_append(reference(b"b"));
        assert_eq!(lifeline.append_refs, vec![reference(b"a"), reference(b"b")]);
    }
}
