//! The closed rule grammar: triggers, conditions, and actions.
//!
//! Rules arrive in the host's structured config form (mapping/sequence trees)
//! and deserialize into tagged-variant types — one variant per kind, so every
//! extraction rule is an exhaustiveness-checked match arm. Trigger and
//! condition nodes are kept as raw values inside [`Rule`] and parsed per node
//! by the extractor, so one malformed node never blinds the rest of the pass.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A scalar that the host config allows to appear as either one value or a
/// sequence of values (`entity_id: light.a` vs `entity_id: [light.a, light.b]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaybeList<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> MaybeList<T> {
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (one, many) = match self {
            Self::One(value) => (Some(value), &[][..]),
            Self::Many(values) => (None, values.as_slice()),
        };
        one.into_iter().chain(many.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One automation rule: triggers, conditions, and an action sequence.
///
/// Singular and plural keys are both accepted. Trigger/condition/action nodes
/// stay untyped here; the extractor parses them one at a time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default, alias = "trigger")]
    pub triggers: Vec<Value>,
    #[serde(default, alias = "condition")]
    pub conditions: Vec<Value>,
    #[serde(default, alias = "action")]
    pub actions: Vec<Value>,
}

impl Rule {
    /// The id used in issue provenance: `id`, falling back to `alias`, then a
    /// fixed placeholder.
    #[must_use]
    pub fn rule_id(&self) -> &str {
        self.id
            .as_deref()
            .or(self.alias.as_deref())
            .unwrap_or("<unnamed>")
    }
}

// ---------------------------------------------------------------------------
// Triggers (17 kinds)
// ---------------------------------------------------------------------------

/// The closed set of trigger kinds, tagged on the `trigger` key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "trigger", rename_all = "snake_case")]
pub enum Trigger {
    State {
        entity_id: MaybeList<String>,
        #[serde(default)]
        to: Option<MaybeList<String>>,
        #[serde(default)]
        from: Option<MaybeList<String>>,
        #[serde(default)]
        attribute: Option<String>,
    },
    NumericState {
        entity_id: MaybeList<String>,
        #[serde(default)]
        attribute: Option<String>,
        #[serde(default)]
        above: Option<Value>,
        #[serde(default)]
        below: Option<Value>,
        #[serde(default)]
        value_template: Option<String>,
    },
    Event {
        event_type: MaybeList<String>,
        #[serde(default)]
        event_data: Option<BTreeMap<String, Value>>,
    },
    Homeassistant {
        event: String,
    },
    Mqtt {
        topic: String,
        #[serde(default)]
        payload: Option<String>,
        #[serde(default)]
        value_template: Option<String>,
    },
    Sun {
        event: String,
        #[serde(default)]
        offset: Option<String>,
    },
    Tag {
        tag_id: MaybeList<String>,
    },
    Template {
        value_template: String,
    },
    Time {
        at: MaybeList<String>,
    },
    TimePattern {
        #[serde(default)]
        hours: Option<Value>,
        #[serde(default)]
        minutes: Option<Value>,
        #[serde(default)]
        seconds: Option<Value>,
    },
    Webhook {
        webhook_id: String,
    },
    Zone {
        entity_id: MaybeList<String>,
        zone: String,
        #[serde(default)]
        event: Option<String>,
    },
    Device {
        device_id: String,
        #[serde(default)]
        domain: Option<String>,
        #[serde(default, rename = "type")]
        kind: Option<String>,
    },
    Calendar {
        entity_id: String,
        #[serde(default)]
        event: Option<String>,
    },
    GeoLocation {
        source: String,
        zone: String,
        #[serde(default)]
        event: Option<String>,
    },
    PersistentNotification {
        #[serde(default)]
        update_type: Option<MaybeList<String>>,
        #[serde(default)]
        notification_id: Option<String>,
    },
    Conversation {
        command: MaybeList<String>,
    },
}

// ---------------------------------------------------------------------------
// Conditions (10 kinds)
// ---------------------------------------------------------------------------

/// The closed set of condition kinds, tagged on the `condition` key.
///
/// `And`/`Or`/`Not` recurse into child conditions; `Trigger` is the
/// pass-through kind matching on trigger ids and yields no references.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "condition", rename_all = "snake_case")]
pub enum Condition {
    And {
        conditions: Vec<Value>,
    },
    Or {
        conditions: Vec<Value>,
    },
    Not {
        conditions: Vec<Value>,
    },
    State {
        entity_id: MaybeList<String>,
        #[serde(default)]
        state: Option<MaybeList<String>>,
        #[serde(default)]
        attribute: Option<String>,
    },
    NumericState {
        entity_id: MaybeList<String>,
        #[serde(default)]
        attribute: Option<String>,
        #[serde(default)]
        above: Option<Value>,
        #[serde(default)]
        below: Option<Value>,
        #[serde(default)]
        value_template: Option<String>,
    },
    Template {
        value_template: String,
    },
    Time {
        #[serde(default)]
        after: Option<String>,
        #[serde(default)]
        before: Option<String>,
        #[serde(default)]
        weekday: Option<MaybeList<String>>,
    },
    Zone {
        entity_id: MaybeList<String>,
        zone: MaybeList<String>,
    },
    Device {
        device_id: String,
        #[serde(default)]
        domain: Option<String>,
        #[serde(default, rename = "type")]
        kind: Option<String>,
    },
    Trigger {
        id: MaybeList<Value>,
    },
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Service-call target block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub entity_id: Option<MaybeList<String>>,
    #[serde(default)]
    pub device_id: Option<MaybeList<String>>,
    #[serde(default)]
    pub area_id: Option<MaybeList<String>>,
}

/// One branch of a `choose` action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChooseOption {
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Value>,
    #[serde(default)]
    pub sequence: Vec<Value>,
}

/// Body of a `repeat` action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RepeatSpec {
    #[serde(default)]
    pub count: Option<Value>,
    #[serde(default, rename = "while")]
    pub while_conditions: Option<Vec<Value>>,
    #[serde(default)]
    pub until: Option<Vec<Value>>,
    #[serde(default)]
    pub sequence: Vec<Value>,
}

/// The closed set of action kinds.
///
/// Actions are discriminated by their distinctive keys rather than an
/// explicit tag, so the enum is untagged and variant order matters: control
/// flow first, service calls before device actions (a service call can carry
/// a `target.device_id`, a device action has `device_id` at the top level and
/// no `action` key).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Action {
    Choose {
        choose: Vec<ChooseOption>,
        #[serde(default)]
        default: Option<Vec<Value>>,
    },
    IfThen {
        #[serde(rename = "if")]
        conditions: Vec<Value>,
        then: Vec<Value>,
        #[serde(default, rename = "else")]
        otherwise: Option<Vec<Value>>,
    },
    Repeat {
        repeat: RepeatSpec,
    },
    Parallel {
        parallel: Vec<Value>,
    },
    WaitTemplate {
        wait_template: String,
        #[serde(default)]
        timeout: Option<Value>,
    },
    Delay {
        delay: Value,
    },
    Event {
        event: String,
        #[serde(default)]
        event_data: Option<BTreeMap<String, Value>>,
    },
    Scene {
        scene: String,
    },
    Stop {
        stop: String,
    },
    Variables {
        variables: BTreeMap<String, Value>,
    },
    ServiceCall {
        #[serde(alias = "service")]
        action: String,
        #[serde(default)]
        target: Option<Target>,
        #[serde(default)]
        data: Option<BTreeMap<String, Value>>,
        #[serde(default)]
        entity_id: Option<MaybeList<String>>,
    },
    DeviceAction {
        device_id: String,
        domain: String,
        #[serde(default, rename = "type")]
        kind: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{Action, Condition, MaybeList, Rule, Trigger};

    #[test]
    fn rule_accepts_singular_and_plural_keys() {
        let rule: Rule = serde_json::from_value(json!({
            "alias": "night light",
            "trigger": [{"trigger": "state", "entity_id": "binary_sensor.door"}],
            "action": [{"action": "light.turn_on", "target": {"entity_id": "light.hall"}}],
        }))
        .unwrap();
        assert_eq!(rule.rule_id(), "night light");
        assert_eq!(rule.triggers.len(), 1);
        assert_eq!(rule.actions.len(), 1);
    }

    #[test]
    fn unnamed_rule_gets_placeholder_id() {
        let rule: Rule = serde_json::from_value(json!({})).unwrap();
        assert_eq!(rule.rule_id(), "<unnamed>");
    }

    #[test]
    fn state_trigger_parses_scalar_and_list_forms() {
        let trigger: Trigger = serde_json::from_value(json!({
            "trigger": "state",
            "entity_id": ["binary_sensor.door", "binary_sensor.window"],
            "to": "on",
        }))
        .unwrap();
        let Trigger::State { entity_id, to, .. } = trigger else {
            panic!("expected state trigger");
        };
        assert_eq!(entity_id.len(), 2);
        assert_eq!(to, Some(MaybeList::One("on".to_string())));
    }

    #[rstest::rstest]
    #[case::state(json!({"trigger": "state", "entity_id": "light.a"}))]
    #[case::numeric_state(json!({"trigger": "numeric_state", "entity_id": "sensor.t", "above": 20}))]
    #[case::event(json!({"trigger": "event", "event_type": "custom"}))]
    #[case::homeassistant(json!({"trigger": "homeassistant", "event": "start"}))]
    #[case::mqtt(json!({"trigger": "mqtt", "topic": "home/door"}))]
    #[case::sun(json!({"trigger": "sun", "event": "sunset"}))]
    #[case::tag(json!({"trigger": "tag", "tag_id": "abc123"}))]
    #[case::template(json!({"trigger": "template", "value_template": "{{ true }}"}))]
    #[case::time(json!({"trigger": "time", "at": "07:00:00"}))]
    #[case::time_pattern(json!({"trigger": "time_pattern", "minutes": "/5"}))]
    #[case::webhook(json!({"trigger": "webhook", "webhook_id": "hook"}))]
    #[case::zone(json!({"trigger": "zone", "entity_id": "person.ana", "zone": "zone.home"}))]
    #[case::device(json!({"trigger": "device", "device_id": "dev1", "domain": "light"}))]
    #[case::calendar(json!({"trigger": "calendar", "entity_id": "calendar.work"}))]
    #[case::geo_location(json!({"trigger": "geo_location", "source": "gps", "zone": "zone.home"}))]
    #[case::persistent_notification(json!({"trigger": "persistent_notification", "update_type": "added"}))]
    #[case::conversation(json!({"trigger": "conversation", "command": "turn it off"}))]
    fn all_trigger_kinds_deserialize(#[case] node: serde_json::Value) {
        let parsed: Result<Trigger, _> = serde_json::from_value(node.clone());
        assert!(parsed.is_ok(), "failed to parse {node}");
    }

    #[test]
    fn all_condition_kinds_deserialize() {
        let nodes = [
            json!({"condition": "and", "conditions": []}),
            json!({"condition": "or", "conditions": []}),
            json!({"condition": "not", "conditions": []}),
            json!({"condition": "state", "entity_id": "light.a", "state": "on"}),
            json!({"condition": "numeric_state", "entity_id": "sensor.t", "below": 5}),
            json!({"condition": "template", "value_template": "{{ 1 > 0 }}"}),
            json!({"condition": "time", "after": "06:00:00"}),
            json!({"condition": "zone", "entity_id": "person.ana", "zone": "zone.home"}),
            json!({"condition": "device", "device_id": "dev1"}),
            json!({"condition": "trigger", "id": "opened"}),
        ];
        for node in nodes {
            let parsed: Result<Condition, _> = serde_json::from_value(node.clone());
            assert!(parsed.is_ok(), "failed to parse {node}");
        }
    }

    #[test]
    fn unknown_trigger_kind_is_a_parse_error() {
        let parsed: Result<Trigger, _> =
            serde_json::from_value(json!({"trigger": "telepathy", "entity_id": "mind.reader"}));
        assert!(parsed.is_err());
    }

    #[test]
    fn service_call_accepts_legacy_service_key() {
        let action: Action = serde_json::from_value(json!({
            "service": "light.turn_on",
            "data": {"brightness": 120},
        }))
        .unwrap();
        let Action::ServiceCall { action: name, .. } = action else {
            panic!("expected service call");
        };
        assert_eq!(name, "light.turn_on");
    }

    #[test]
    fn device_action_is_not_mistaken_for_service_call() {
        let action: Action = serde_json::from_value(json!({
            "device_id": "dev1",
            "domain": "light",
            "type": "turn_on",
        }))
        .unwrap();
        assert!(matches!(action, Action::DeviceAction { .. }));
    }

    #[test]
    fn control_flow_actions_deserialize() {
        let choose: Action = serde_json::from_value(json!({
            "choose": [
                {"conditions": [{"condition": "state", "entity_id": "light.a", "state": "on"}],
                 "sequence": [{"action": "light.turn_off", "target": {"entity_id": "light.a"}}]},
            ],
            "default": [{"delay": "00:00:05"}],
        }))
        .unwrap();
        assert!(matches!(choose, Action::Choose { .. }));

        let repeat: Action = serde_json::from_value(json!({
            "repeat": {"count": 3, "sequence": [{"delay": 1}]},
        }))
        .unwrap();
        assert!(matches!(repeat, Action::Repeat { .. }));

        let branch: Action = serde_json::from_value(json!({
            "if": [{"condition": "state", "entity_id": "light.a", "state": "on"}],
            "then": [{"action": "light.turn_off", "target": {"entity_id": "light.a"}}],
        }))
        .unwrap();
        assert!(matches!(branch, Action::IfThen { .. }));
    }
}
