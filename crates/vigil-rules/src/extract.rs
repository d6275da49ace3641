//! The Reference Extractor: a depth-bounded walk over rule trees.
//!
//! Extraction is deterministic (declaration order) and fails open: malformed
//! nodes, unknown kinds, and exceeded depth are recorded as [`Anomaly`]
//! entries and skipped locally — one bad node never aborts the pass. Depth is
//! limited by descent count, not node count, so siblings at the limit are
//! each still visited once.

use serde::Serialize;
use serde_json::Value;

use vigil_core::ids::split_entity_id;
use vigil_core::{FieldValue, Reference, ReferenceKind, ServiceCallRef};

use crate::grammar::{Action, ChooseOption, Condition, MaybeList, Rule, Trigger};
use crate::scan::{is_template, scan_template};

/// Default maximum descent depth `D`.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// One locally-swallowed extraction failure, kept for diagnosability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub path: String,
    pub rule_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Descent past the configured maximum depth was truncated here.
    DepthExceeded,
    /// The node's kind tag is not in the closed grammar.
    UnknownKind(String),
    /// The node failed to deserialize against its grammar shape.
    Malformed(String),
}

/// The flat, typed output of an extraction pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub references: Vec<Reference>,
    pub service_calls: Vec<ServiceCallRef>,
    pub anomalies: Vec<Anomaly>,
}

impl Extraction {
    fn append(&mut self, mut other: Self) {
        self.references.append(&mut other.references);
        self.service_calls.append(&mut other.service_calls);
        self.anomalies.append(&mut other.anomalies);
    }
}

/// Walks rule definitions and produces the complete reference set reachable
/// within the configured maximum depth.
#[derive(Debug, Clone, Copy)]
pub struct Extractor {
    max_depth: usize,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl Extractor {
    #[must_use]
    pub const fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Extract from a set of rules, in declaration order.
    #[must_use]
    pub fn extract_all(&self, rules: &[Rule]) -> Extraction {
        let mut out = Extraction::default();
        for rule in rules {
            out.append(self.extract_rule(rule));
        }
        out
    }

    /// Extract every reference reachable in one rule.
    #[must_use]
    pub fn extract_rule(&self, rule: &Rule) -> Extraction {
        let mut walk = Walk {
            out: Extraction::default(),
            rule_id: rule.rule_id().to_string(),
            max_depth: self.max_depth,
        };
        for (i, node) in rule.triggers.iter().enumerate() {
            walk.trigger(node, &format!("trigger/{i}"));
        }
        for (i, node) in rule.conditions.iter().enumerate() {
            walk.condition(node, &format!("condition/{i}"), 0);
        }
        for (i, node) in rule.actions.iter().enumerate() {
            walk.action(node, &format!("action/{i}"), 0);
        }
        walk.out
    }
}

struct Walk {
    out: Extraction,
    rule_id: String,
    max_depth: usize,
}

impl Walk {
    fn anomaly(&mut self, kind: AnomalyKind, path: &str) {
        tracing::warn!(rule = %self.rule_id, path, ?kind, "skipping rule node");
        self.out.anomalies.push(Anomaly {
            kind,
            path: path.to_string(),
            rule_id: self.rule_id.clone(),
        });
    }

    /// Whether descent one level below `depth` is allowed; records the
    /// truncation anomaly when it is not.
    fn may_descend(&mut self, depth: usize, path: &str) -> bool {
        if depth >= self.max_depth {
            self.anomaly(AnomalyKind::DepthExceeded, path);
            return false;
        }
        true
    }

    fn state_ref(&mut self, entity: &str, path: &str) {
        // A templated entity id has no statically-knowable target.
        if is_template(entity) {
            self.scan_if_template(entity, path);
            return;
        }
        self.out.references.push(Reference::new(
            ReferenceKind::State,
            entity,
            path,
            &self.rule_id,
        ));
    }

    fn registry_ref(&mut self, namespace: &str, id: &str, path: &str) {
        if is_template(id) {
            self.scan_if_template(id, path);
            return;
        }
        self.out
            .references
            .push(Reference::registry(namespace, id, path, &self.rule_id));
    }

    /// A string-valued field: template strings go down the template path,
    /// everything else is ignored here.
    fn scan_if_template(&mut self, text: &str, path: &str) {
        if is_template(text) {
            scan_template(text, path, &self.rule_id, &mut self.out.references);
        }
    }

    /// Emit state references for each entity × each literal value. Templated
    /// values go down the template path instead; no semantic reference is
    /// synthesized for them.
    fn state_value_refs(
        &mut self,
        entities: &MaybeList<String>,
        attribute: Option<&str>,
        values: Option<&MaybeList<String>>,
        path: &str,
    ) {
        for entity in entities.iter() {
            if is_template(entity) {
                self.scan_if_template(entity, path);
                continue;
            }
            match values {
                None => self.existence_ref(entity, attribute, path),
                Some(values) => {
                    let mut any_literal = false;
                    for value in values.iter() {
                        if is_template(value) {
                            self.scan_if_template(value, path);
                            continue;
                        }
                        any_literal = true;
                        let mut reference = Reference::new(
                            if attribute.is_some() {
                                ReferenceKind::Attribute
                            } else {
                                ReferenceKind::State
                            },
                            entity,
                            path,
                            &self.rule_id,
                        )
                        .with_value(value);
                        if let Some(attr) = attribute {
                            reference = reference.with_attribute(attr);
                        }
                        self.out.references.push(reference);
                    }
                    // Every value was templated: the entity itself is still
                    // checkable for existence.
                    if !any_literal {
                        self.existence_ref(entity, attribute, path);
                    }
                }
            }
        }
    }

    fn existence_ref(&mut self, entity: &str, attribute: Option<&str>, path: &str) {
        if let Some(attr) = attribute {
            self.out.references.push(
                Reference::new(ReferenceKind::Attribute, entity, path, &self.rule_id)
                    .with_attribute(attr),
            );
        } else {
            self.state_ref(entity, path);
        }
    }

    /// `above`/`below` bounds may name another entity instead of a number.
    fn numeric_bound(&mut self, bound: Option<&Value>, path: &str) {
        let Some(Value::String(text)) = bound else {
            return;
        };
        if is_template(text) {
            self.scan_if_template(text, path);
        } else if split_entity_id(text).is_some() {
            self.state_ref(text, path);
        }
    }

    /// Time fields (`at`, `after`, `before`) accept clock strings or
    /// timestamp-entity ids.
    fn time_field(&mut self, text: &str, path: &str) {
        if let Some((domain, _)) = split_entity_id(text) {
            if domain == "sensor" || domain == "input_datetime" {
                self.state_ref(text, path);
            }
        }
    }

    fn mapping_templates(&mut self, data: &std::collections::BTreeMap<String, Value>, path: &str) {
        for (key, value) in data {
            if let Value::String(text) = value {
                self.scan_if_template(text, &format!("{path}/{key}"));
            }
        }
    }

    // -- triggers ----------------------------------------------------------

    fn trigger(&mut self, node: &Value, path: &str) {
        let trigger = match parse_node::<Trigger>(node, "trigger") {
            Ok(trigger) => trigger,
            Err(kind) => return self.anomaly(kind, path),
        };
        match trigger {
            Trigger::State {
                entity_id,
                to,
                from,
                attribute,
            } => {
                match (&to, &from) {
                    (None, None) => {
                        self.state_value_refs(&entity_id, attribute.as_deref(), None, path);
                    }
                    _ => {
                        if let Some(to) = &to {
                            self.state_value_refs(
                                &entity_id,
                                attribute.as_deref(),
                                Some(to),
                                &format!("{path}/to"),
                            );
                        }
                        if let Some(from) = &from {
                            self.state_value_refs(
                                &entity_id,
                                attribute.as_deref(),
                                Some(from),
                                &format!("{path}/from"),
                            );
                        }
                    }
                }
            }
            Trigger::NumericState {
                entity_id,
                attribute,
                above,
                below,
                value_template,
            } => {
                self.state_value_refs(&entity_id, attribute.as_deref(), None, path);
                self.numeric_bound(above.as_ref(), &format!("{path}/above"));
                self.numeric_bound(below.as_ref(), &format!("{path}/below"));
                if let Some(template) = &value_template {
                    self.scan_if_template(template, &format!("{path}/value_template"));
                }
            }
            Trigger::Event { event_data, .. } => {
                if let Some(data) = &event_data {
                    self.mapping_templates(data, &format!("{path}/event_data"));
                }
            }
            Trigger::Mqtt {
                payload,
                value_template,
                ..
            } => {
                if let Some(text) = &payload {
                    self.scan_if_template(text, &format!("{path}/payload"));
                }
                if let Some(text) = &value_template {
                    self.scan_if_template(text, &format!("{path}/value_template"));
                }
            }
            Trigger::Tag { tag_id } => {
                for id in tag_id.iter() {
                    self.registry_ref("tag", id, path);
                }
            }
            Trigger::Template { value_template } => {
                self.scan_if_template(&value_template, &format!("{path}/value_template"));
            }
            Trigger::Time { at } => {
                for text in at.iter() {
                    self.time_field(text, &format!("{path}/at"));
                }
            }
            Trigger::Zone {
                entity_id, zone, ..
            } => {
                for entity in entity_id.iter() {
                    self.state_ref(entity, &format!("{path}/entity_id"));
                }
                self.state_ref(&zone, &format!("{path}/zone"));
            }
            Trigger::Device { device_id, .. } => {
                self.registry_ref("device", &device_id, path);
            }
            Trigger::Calendar { entity_id, .. } => {
                self.state_ref(&entity_id, path);
            }
            Trigger::GeoLocation { zone, .. } => {
                self.state_ref(&zone, &format!("{path}/zone"));
            }
            Trigger::Homeassistant { .. }
            | Trigger::Sun { .. }
            | Trigger::TimePattern { .. }
            | Trigger::Webhook { .. }
            | Trigger::PersistentNotification { .. }
            | Trigger::Conversation { .. } => {}
        }
    }

    // -- conditions --------------------------------------------------------

    fn condition(&mut self, node: &Value, path: &str, depth: usize) {
        let condition = match parse_node::<Condition>(node, "condition") {
            Ok(condition) => condition,
            Err(kind) => return self.anomaly(kind, path),
        };
        match condition {
            Condition::And { conditions }
            | Condition::Or { conditions }
            | Condition::Not { conditions } => {
                for (i, child) in conditions.iter().enumerate() {
                    let child_path = format!("{path}/conditions/{i}");
                    if self.may_descend(depth, &child_path) {
                        self.condition(child, &child_path, depth + 1);
                    }
                }
            }
            Condition::State {
                entity_id,
                state,
                attribute,
            } => {
                let value_path = if state.is_some() {
                    format!("{path}/state")
                } else {
                    path.to_string()
                };
                self.state_value_refs(&entity_id, attribute.as_deref(), state.as_ref(), &value_path);
            }
            Condition::NumericState {
                entity_id,
                attribute,
                above,
                below,
                value_template,
            } => {
                self.state_value_refs(&entity_id, attribute.as_deref(), None, path);
                self.numeric_bound(above.as_ref(), &format!("{path}/above"));
                self.numeric_bound(below.as_ref(), &format!("{path}/below"));
                if let Some(template) = &value_template {
                    self.scan_if_template(template, &format!("{path}/value_template"));
                }
            }
            Condition::Template { value_template } => {
                self.scan_if_template(&value_template, &format!("{path}/value_template"));
            }
            Condition::Time { after, before, .. } => {
                if let Some(text) = &after {
                    self.time_field(text, &format!("{path}/after"));
                }
                if let Some(text) = &before {
                    self.time_field(text, &format!("{path}/before"));
                }
            }
            Condition::Zone { entity_id, zone } => {
                for entity in entity_id.iter() {
                    self.state_ref(entity, &format!("{path}/entity_id"));
                }
                for zone_id in zone.iter() {
                    self.state_ref(zone_id, &format!("{path}/zone"));
                }
            }
            Condition::Device { device_id, .. } => {
                self.registry_ref("device", &device_id, path);
            }
            Condition::Trigger { .. } => {}
        }
    }

    // -- actions -----------------------------------------------------------

    fn action(&mut self, node: &Value, path: &str, depth: usize) {
        let action = match parse_node::<Action>(node, "action") {
            Ok(action) => action,
            Err(kind) => return self.anomaly(kind, path),
        };
        match action {
            Action::Choose { choose, default } => {
                for (i, option) in choose.iter().enumerate() {
                    self.choose_option(option, &format!("{path}/choose/{i}"), depth);
                }
                if let Some(default) = &default {
                    self.sequence(default, &format!("{path}/default"), depth);
                }
            }
            Action::IfThen {
                conditions,
                then,
                otherwise,
            } => {
                for (i, child) in conditions.iter().enumerate() {
                    let child_path = format!("{path}/if/{i}");
                    if self.may_descend(depth, &child_path) {
                        self.condition(child, &child_path, depth + 1);
                    }
                }
                self.sequence(&then, &format!("{path}/then"), depth);
                if let Some(otherwise) = &otherwise {
                    self.sequence(otherwise, &format!("{path}/else"), depth);
                }
            }
            Action::Repeat { repeat } => {
                if let Some(conditions) = &repeat.while_conditions {
                    for (i, child) in conditions.iter().enumerate() {
                        let child_path = format!("{path}/repeat/while/{i}");
                        if self.may_descend(depth, &child_path) {
                            self.condition(child, &child_path, depth + 1);
                        }
                    }
                }
                if let Some(conditions) = &repeat.until {
                    for (i, child) in conditions.iter().enumerate() {
                        let child_path = format!("{path}/repeat/until/{i}");
                        if self.may_descend(depth, &child_path) {
                            self.condition(child, &child_path, depth + 1);
                        }
                    }
                }
                self.sequence(&repeat.sequence, &format!("{path}/repeat/sequence"), depth);
            }
            Action::Parallel { parallel } => {
                self.sequence(&parallel, &format!("{path}/parallel"), depth);
            }
            Action::WaitTemplate { wait_template, .. } => {
                self.scan_if_template(&wait_template, &format!("{path}/wait_template"));
            }
            Action::Delay { delay } => {
                if let Value::String(text) = &delay {
                    self.scan_if_template(text, &format!("{path}/delay"));
                }
            }
            Action::Event { event_data, .. } => {
                if let Some(data) = &event_data {
                    self.mapping_templates(data, &format!("{path}/event_data"));
                }
            }
            Action::Scene { scene } => {
                self.state_ref(&scene, path);
            }
            Action::Variables { variables } => {
                self.mapping_templates(&variables, &format!("{path}/variables"));
            }
            Action::ServiceCall {
                action,
                target,
                data,
                entity_id,
            } => {
                self.service_call(&action, target.as_ref(), data.as_ref(), entity_id.as_ref(), path);
            }
            Action::DeviceAction { device_id, .. } => {
                self.registry_ref("device", &device_id, path);
            }
            Action::Stop { .. } => {}
        }
    }

    fn choose_option(&mut self, option: &ChooseOption, path: &str, depth: usize) {
        for (i, child) in option.conditions.iter().enumerate() {
            let child_path = format!("{path}/conditions/{i}");
            if self.may_descend(depth, &child_path) {
                self.condition(child, &child_path, depth + 1);
            }
        }
        self.sequence(&option.sequence, &format!("{path}/sequence"), depth);
    }

    fn sequence(&mut self, actions: &[Value], path: &str, depth: usize) {
        for (i, child) in actions.iter().enumerate() {
            let child_path = format!("{path}/{i}");
            if self.may_descend(depth, &child_path) {
                self.action(child, &child_path, depth + 1);
            }
        }
    }

    fn service_call(
        &mut self,
        service: &str,
        target: Option<&crate::grammar::Target>,
        data: Option<&std::collections::BTreeMap<String, Value>>,
        legacy_entity_id: Option<&MaybeList<String>>,
        path: &str,
    ) {
        // A templated service id is syntax-checkable only.
        if is_template(service) {
            self.scan_if_template(service, path);
            return;
        }

        let mut call = ServiceCallRef::new(service, path, &self.rule_id);
        if let Some(data) = data {
            for (key, value) in data {
                let field_path = format!("{path}/data/{key}");
                let field = match value {
                    Value::String(text) => {
                        if is_template(text) {
                            self.scan_if_template(text, &field_path);
                            FieldValue::templated()
                        } else {
                            FieldValue::literal(text)
                        }
                    }
                    Value::Array(items) => {
                        for (i, item) in items.iter().enumerate() {
                            if let Value::String(text) = item {
                                self.scan_if_template(text, &format!("{field_path}/{i}"));
                            }
                        }
                        FieldValue::list()
                    }
                    Value::Number(number) => FieldValue::literal(number.to_string()),
                    Value::Bool(flag) => FieldValue::literal(flag.to_string()),
                    Value::Null | Value::Object(_) => FieldValue::opaque(),
                };
                call.fields.insert(key.clone(), field);
            }
        }
        self.out.service_calls.push(call);

        if let Some(target) = target {
            if let Some(entities) = &target.entity_id {
                for entity in entities.iter() {
                    self.state_ref(entity, &format!("{path}/target/entity_id"));
                }
            }
            if let Some(devices) = &target.device_id {
                for id in devices.iter() {
                    self.registry_ref("device", id, &format!("{path}/target/device_id"));
                }
            }
            if let Some(areas) = &target.area_id {
                for id in areas.iter() {
                    self.registry_ref("area", id, &format!("{path}/target/area_id"));
                }
            }
        }
        if let Some(entities) = legacy_entity_id {
            for entity in entities.iter() {
                self.state_ref(entity, &format!("{path}/entity_id"));
            }
        }
    }
}

/// Parse one node against its grammar type, classifying the failure.
fn parse_node<T: serde::de::DeserializeOwned>(node: &Value, tag: &str) -> Result<T, AnomalyKind> {
    match serde_json::from_value::<T>(node.clone()) {
        Ok(parsed) => Ok(parsed),
        Err(error) => {
            let message = error.to_string();
            let kind_tag = node.get(tag).and_then(Value::as_str);
            if let Some(kind_tag) = kind_tag {
                if message.starts_with("unknown variant") {
                    return Err(AnomalyKind::UnknownKind(kind_tag.to_string()));
                }
            }
            Err(AnomalyKind::Malformed(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{AnomalyKind, Extraction, Extractor};
    use crate::grammar::Rule;
    use vigil_core::ReferenceKind;

    fn extract(rule: serde_json::Value) -> Extraction {
        let rule: Rule = serde_json::from_value(rule).expect("rule parses");
        Extractor::default().extract_rule(&rule)
    }

    #[test]
    fn state_trigger_yields_one_ref_per_entity_and_value() {
        let out = extract(json!({
            "id": "r1",
            "trigger": [{
                "trigger": "state",
                "entity_id": ["binary_sensor.door", "binary_sensor.window"],
                "to": "on",
                "from": "off",
            }],
        }));
        assert_eq!(out.references.len(), 4);
        assert!(out.references.iter().all(|r| r.kind == ReferenceKind::State));
        assert_eq!(out.references[0].path, "trigger/0/to");
        assert_eq!(out.references[0].value.as_deref(), Some("on"));
        assert_eq!(out.references[2].path, "trigger/0/from");
    }

    #[test]
    fn valueless_state_trigger_yields_existence_ref() {
        let out = extract(json!({
            "id": "r1",
            "trigger": [{"trigger": "state", "entity_id": "light.hall"}],
        }));
        assert_eq!(out.references.len(), 1);
        assert_eq!(out.references[0].value, None);
    }

    #[test]
    fn device_trigger_yields_registry_ref() {
        let out = extract(json!({
            "id": "r1",
            "trigger": [{"trigger": "device", "device_id": "abcd", "domain": "light"}],
        }));
        assert_eq!(out.references.len(), 1);
        assert_eq!(out.references[0].kind, ReferenceKind::Registry);
        assert_eq!(out.references[0].domain, "device");
        assert_eq!(out.references[0].target, "abcd");
    }

    #[test]
    fn templated_to_value_goes_down_template_path_only() {
        let out = extract(json!({
            "id": "r1",
            "trigger": [{
                "trigger": "state",
                "entity_id": "sensor.mode",
                "to": "{{ states('input_select.mode') }}",
            }],
        }));
        let kinds: Vec<_> = out.references.iter().map(|r| r.kind).collect();
        // Template ref + synthesized accessor ref; the trigger entity keeps
        // a valueless existence ref, never a ref carrying the template text.
        assert_eq!(
            kinds,
            vec![
                ReferenceKind::Template,
                ReferenceKind::State,
                ReferenceKind::State
            ]
        );
        assert_eq!(out.references[1].target, "input_select.mode");
        assert_eq!(out.references[2].target, "sensor.mode");
        assert_eq!(out.references[2].value, None);
    }

    #[test]
    fn templated_target_entity_is_scanned_not_referenced() {
        let out = extract(json!({
            "id": "r1",
            "action": [{
                "action": "light.turn_on",
                "target": {"entity_id": "{{ my_light }}"},
            }],
        }));
        assert!(
            out.references
                .iter()
                .all(|r| r.kind == ReferenceKind::Template || !r.target.contains("{{")),
            "template text leaked into a semantic reference: {:?}",
            out.references
        );
        let templates: Vec<_> = out
            .references
            .iter()
            .filter(|r| r.kind == ReferenceKind::Template)
            .collect();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].path, "action/0/target/entity_id");
    }

    #[test]
    fn templated_to_still_checks_entity_existence() {
        let out = extract(json!({
            "id": "r1",
            "trigger": [{
                "trigger": "state",
                "entity_id": "light.nope",
                "to": "{{ some_state }}",
            }],
        }));
        let states: Vec<_> = out
            .references
            .iter()
            .filter(|r| r.kind == ReferenceKind::State)
            .collect();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].target, "light.nope");
        assert_eq!(states[0].value, None);
    }

    #[test]
    fn templated_zone_and_registry_ids_yield_no_semantic_refs() {
        let out = extract(json!({
            "id": "r1",
            "trigger": [
                {"trigger": "zone", "entity_id": "{{ tracker }}", "zone": "zone.home"},
                {"trigger": "device", "device_id": "{{ dev }}", "domain": "light"},
            ],
        }));
        assert!(
            out.references
                .iter()
                .all(|r| r.kind == ReferenceKind::Template || !r.target.contains("{{"))
        );
        assert!(
            out.references
                .iter()
                .any(|r| r.kind == ReferenceKind::State && r.target == "zone.home")
        );
    }

    #[test]
    fn unknown_trigger_kind_is_skipped_with_anomaly() {
        let out = extract(json!({
            "id": "r1",
            "trigger": [
                {"trigger": "telepathy", "entity_id": "mind.reader"},
                {"trigger": "state", "entity_id": "light.hall", "to": "on"},
            ],
        }));
        assert_eq!(out.anomalies.len(), 1);
        assert_eq!(
            out.anomalies[0].kind,
            AnomalyKind::UnknownKind("telepathy".to_string())
        );
        // The bad node does not blind the good sibling.
        assert_eq!(out.references.len(), 1);
    }

    #[test]
    fn service_call_captures_field_map_and_target() {
        let out = extract(json!({
            "id": "r1",
            "action": [{
                "action": "light.turn_on",
                "target": {"entity_id": "light.hall", "area_id": "living_room"},
                "data": {
                    "brightness": 128,
                    "effect": "{{ my_effect }}",
                    "rgb_color": [255, 0, 0],
                },
            }],
        }));
        assert_eq!(out.service_calls.len(), 1);
        let call = &out.service_calls[0];
        assert_eq!(call.service, "light.turn_on");
        assert_eq!(call.fields["brightness"].literal.as_deref(), Some("128"));
        assert!(call.fields["effect"].template_derived);
        assert!(call.fields["rgb_color"].is_list);
        let registry: Vec<_> = out
            .references
            .iter()
            .filter(|r| r.kind == ReferenceKind::Registry)
            .collect();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry[0].domain, "area");
    }

    #[test]
    fn logical_conditions_recurse_in_declaration_order() {
        let out = extract(json!({
            "id": "r1",
            "condition": [{
                "condition": "and",
                "conditions": [
                    {"condition": "state", "entity_id": "light.a", "state": "on"},
                    {"condition": "not", "conditions": [
                        {"condition": "state", "entity_id": "light.b", "state": "off"},
                    ]},
                ],
            }],
        }));
        let targets: Vec<_> = out.references.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["light.a", "light.b"]);
        assert_eq!(
            out.references[1].path,
            "condition/0/conditions/1/conditions/0/state"
        );
    }

    #[test]
    fn depth_limit_truncates_without_losing_shallow_refs() {
        // Nest choose blocks two levels past a depth budget of 3.
        let mut action = json!({
            "action": "light.turn_on",
            "target": {"entity_id": "light.deep"},
        });
        for _ in 0..5 {
            action = json!({
                "choose": [{"conditions": [], "sequence": [action]}],
            });
        }
        let rule: Rule = serde_json::from_value(json!({
            "id": "r1",
            "trigger": [{"trigger": "state", "entity_id": "light.shallow", "to": "on"}],
            "action": [action],
        }))
        .expect("rule parses");

        let out = Extractor::new(3).extract_rule(&rule);
        assert!(
            out.anomalies
                .iter()
                .any(|a| a.kind == AnomalyKind::DepthExceeded)
        );
        let targets: Vec<_> = out.references.iter().map(|r| r.target.as_str()).collect();
        assert!(targets.contains(&"light.shallow"));
        assert!(!targets.contains(&"light.deep"));

        // A deep enough budget reaches the call.
        let deep = Extractor::new(10).extract_rule(&rule);
        assert!(deep.anomalies.is_empty());
        assert!(
            deep.references
                .iter()
                .any(|r| r.target == "light.deep")
        );
    }

    #[test]
    fn extraction_is_deterministic() {
        let rule: Rule = serde_json::from_value(json!({
            "id": "r1",
            "trigger": [
                {"trigger": "state", "entity_id": ["light.a", "light.b"], "to": "on"},
                {"trigger": "tag", "tag_id": "tag-1"},
            ],
            "action": [{"action": "light.turn_off", "target": {"entity_id": "light.a"}}],
        }))
        .expect("rule parses");
        let extractor = Extractor::default();
        assert_eq!(extractor.extract_rule(&rule), extractor.extract_rule(&rule));
    }

    #[test]
    fn attribute_trigger_yields_attribute_refs() {
        let out = extract(json!({
            "id": "r1",
            "trigger": [{
                "trigger": "state",
                "entity_id": "climate.living",
                "attribute": "fan_mode",
                "to": "auto",
            }],
        }));
        assert_eq!(out.references.len(), 1);
        assert_eq!(out.references[0].kind, ReferenceKind::Attribute);
        assert_eq!(out.references[0].attribute.as_deref(), Some("fan_mode"));
        assert_eq!(out.references[0].value.as_deref(), Some("auto"));
    }

    #[test]
    fn numeric_bound_entity_yields_state_ref() {
        let out = extract(json!({
            "id": "r1",
            "condition": [{
                "condition": "numeric_state",
                "entity_id": "sensor.temperature",
                "above": "input_number.threshold",
            }],
        }));
        let targets: Vec<_> = out.references.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["sensor.temperature", "input_number.threshold"]);
    }
}
