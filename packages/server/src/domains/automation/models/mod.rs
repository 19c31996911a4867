pub mod automation_event;
pub mod automation_rule;

pub use automation_event::{AutomationEvent, AutomationEventType};
pub use automation_rule::{AutomationRule, RuleStatus};
