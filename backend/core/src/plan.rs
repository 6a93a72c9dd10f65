use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of UI operations a plan may contain.
/// Unknown tags fail deserialization, which plan validation surfaces
/// before anything reaches the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Fill,
    Click,
    Read,
    Select,
    Navigate,
    Wait,
}

impl ActionKind {
    /// Whether a failure of this action invalidates the target assumptions
    /// of every later step. `Read` failures are independent per field;
    /// everything else mutates page state.
    pub fn is_state_changing(&self) -> bool {
        !matches!(self, ActionKind::Read)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionKind::Fill => "fill",
            ActionKind::Click => "click",
            ActionKind::Read => "read",
            ActionKind::Select => "select",
            ActionKind::Navigate => "navigate",
            ActionKind::Wait => "wait",
        };
        write!(f, "{}", s)
    }
}

/// A single step in an action plan. `step` ordinals are 1-based and
/// strictly contiguous within a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionStep {
    pub step: u32,
    pub action: ActionKind,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// An ordered list of UI operations produced by the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub task: String,
    pub steps: Vec<ActionStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
}

/// Why a plan failed structural validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanViolation {
    #[error("plan contains no steps")]
    Empty,
    #[error("step at index {index} has ordinal {found}, expected {expected}")]
    BadOrdinal {
        index: usize,
        found: u32,
        expected: u32,
    },
    #[error("step {step} ({action}) is missing a value")]
    MissingValue { step: u32, action: String },
}

impl ActionPlan {
    /// Enforce the plan invariants: non-empty, ordinals contiguous from 1,
    /// and value-carrying actions actually carry one.
    pub fn validate(&self) -> Result<(), PlanViolation> {
        if self.steps.is_empty() {
            return Err(PlanViolation::Empty);
        }
        for (index, step) in self.steps.iter().enumerate() {
            let expected = index as u32 + 1;
            if step.step != expected {
                return Err(PlanViolation::BadOrdinal {
                    index,
                    found: step.step,
                    expected,
                });
            }
            let needs_value = matches!(step.action, ActionKind::Fill | ActionKind::Select);
            if needs_value && step.value.as_deref().map_or(true, str::is_empty) {
                return Err(PlanViolation::MissingValue {
                    step: step.step,
                    action: step.action.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(ordinal: u32, action: ActionKind) -> ActionStep {
        ActionStep {
            step: ordinal,
            action,
            target: "#field".into(),
            value: matches!(action, ActionKind::Fill | ActionKind::Select)
                .then(|| "value".to_string()),
            description: String::new(),
        }
    }

    #[test]
    fn test_valid_plan_passes() {
        let plan = ActionPlan {
            task: "fill the form".into(),
            steps: vec![
                step(1, ActionKind::Navigate),
                step(2, ActionKind::Fill),
                step(3, ActionKind::Click),
            ],
            estimated_time: None,
        };
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_empty_plan_rejected() {
        let plan = ActionPlan {
            task: "noop".into(),
            steps: vec![],
            estimated_time: None,
        };
        assert_eq!(plan.validate(), Err(PlanViolation::Empty));
    }

    #[test]
    fn test_duplicate_ordinal_rejected() {
        let plan = ActionPlan {
            task: "dup".into(),
            steps: vec![step(1, ActionKind::Navigate), step(1, ActionKind::Click)],
            estimated_time: None,
        };
        assert_eq!(
            plan.validate(),
            Err(PlanViolation::BadOrdinal {
                index: 1,
                found: 1,
                expected: 2
            })
        );
    }

    #[test]
    fn test_zero_based_ordinals_rejected() {
        let plan = ActionPlan {
            task: "off by one".into(),
            steps: vec![step(0, ActionKind::Navigate)],
            estimated_time: None,
        };
        assert!(matches!(
            plan.validate(),
            Err(PlanViolation::BadOrdinal { expected: 1, .. })
        ));
    }

    #[test]
    fn test_fill_without_value_rejected() {
        let mut fill = step(1, ActionKind::Fill);
        fill.value = None;
        let plan = ActionPlan {
            task: "bad fill".into(),
            steps: vec![fill],
            estimated_time: None,
        };
        assert!(matches!(
            plan.validate(),
            Err(PlanViolation::MissingValue { step: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_action_tag_fails_deserialization() {
        let raw = r##"{"task":"t","steps":[{"step":1,"action":"hover","target":"#x"}]}"##;
        assert!(serde_json::from_str::<ActionPlan>(raw).is_err());
    }

    #[test]
    fn test_state_changing_classification() {
        assert!(ActionKind::Navigate.is_state_changing());
        assert!(ActionKind::Click.is_state_changing());
        assert!(ActionKind::Fill.is_state_changing());
        assert!(ActionKind::Select.is_state_changing());
        assert!(ActionKind::Wait.is_state_changing());
        assert!(!ActionKind::Read.is_state_changing());
    }
}
