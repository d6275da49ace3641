//! Template detection and accessor scanning.
//!
//! A string field is template-bearing when it contains `{{ … }}` or
//! `{% … %}` delimiters. Templates themselves are validated by the template
//! path; this module additionally synthesizes state/attribute references for
//! recognized accessor calls whose arguments are string literals
//! (`is_state('light.a', 'on')`). Fully dynamic expressions yield no
//! synthesized reference — their runtime value is unknowable statically.

use regex::Regex;
use std::sync::LazyLock;

use vigil_core::{Reference, ReferenceKind};

static IS_STATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"is_state\(\s*["']([\w.]+)["']\s*,\s*["']([^"']*)["']\s*\)"#)
        .expect("hard-coded pattern compiles")
});

static STATES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"states\(\s*["']([\w.]+)["']\s*\)"#)
        .expect("hard-coded pattern compiles")
});

static STATE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"state_attr\(\s*["']([\w.]+)["']\s*,\s*["']([^"']*)["']\s*\)"#)
        .expect("hard-coded pattern compiles")
});

static IS_STATE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"is_state_attr\(\s*["']([\w.]+)["']\s*,\s*["']([^"']*)["']\s*,\s*["']([^"']*)["']\s*\)"#,
    )
    .expect("hard-coded pattern compiles")
});

/// Whether a string field embeds a template expression.
#[must_use]
pub fn is_template(text: &str) -> bool {
    text.contains("{{") || text.contains("{%")
}

/// Emit a `Template` reference for `text` plus synthesized state/attribute
/// references for recognized accessor calls with literal arguments.
pub fn scan_template(text: &str, path: &str, rule_id: &str, out: &mut Vec<Reference>) {
    out.push(Reference::new(ReferenceKind::Template, text, path, rule_id));

    // `is_state_attr` first: its matches textually contain `state_attr` and
    // `is_state` prefixes, so plain scans must skip overlapping spans.
    let mut claimed: Vec<(usize, usize)> = Vec::new();

    for caps in IS_STATE_ATTR.captures_iter(text) {
        let whole = caps.get(0).expect("whole match");
        claimed.push((whole.start(), whole.end()));
        out.push(
            Reference::new(ReferenceKind::Attribute, &caps[1], path, rule_id)
                .with_attribute(&caps[2])
                .with_value(&caps[3]),
        );
    }

    for caps in STATE_ATTR.captures_iter(text) {
        let whole = caps.get(0).expect("whole match");
        if overlaps(&claimed, whole.start(), whole.end()) {
            continue;
        }
        claimed.push((whole.start(), whole.end()));
        out.push(
            Reference::new(ReferenceKind::Attribute, &caps[1], path, rule_id)
                .with_attribute(&caps[2]),
        );
    }

    for caps in IS_STATE.captures_iter(text) {
        let whole = caps.get(0).expect("whole match");
        if overlaps(&claimed, whole.start(), whole.end()) {
            continue;
        }
        claimed.push((whole.start(), whole.end()));
        out.push(
            Reference::new(ReferenceKind::State, &caps[1], path, rule_id).with_value(&caps[2]),
        );
    }

    for caps in STATES.captures_iter(text) {
        let whole = caps.get(0).expect("whole match");
        if overlaps(&claimed, whole.start(), whole.end()) {
            continue;
        }
        out.push(Reference::new(ReferenceKind::State, &caps[1], path, rule_id));
    }
}

fn overlaps(claimed: &[(usize, usize)], start: usize, end: usize) -> bool {
    claimed.iter().any(|&(s, e)| start < e && end > s)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{is_template, scan_template};
    use vigil_core::ReferenceKind;

    #[test]
    fn detects_both_delimiter_styles() {
        assert!(is_template("{{ states('light.a') }}"));
        assert!(is_template("{% if true %}x{% endif %}"));
        assert!(!is_template("plain string"));
    }

    #[test]
    fn synthesizes_state_ref_from_is_state() {
        let mut refs = Vec::new();
        scan_template(
            "{{ is_state('binary_sensor.door', 'open') }}",
            "condition/0",
            "r1",
            &mut refs,
        );
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].kind, ReferenceKind::Template);
        assert_eq!(refs[1].kind, ReferenceKind::State);
        assert_eq!(refs[1].target, "binary_sensor.door");
        assert_eq!(refs[1].value.as_deref(), Some("open"));
    }

    #[test]
    fn states_call_yields_valueless_reference() {
        let mut refs = Vec::new();
        scan_template("{{ states('sensor.temp') | float }}", "t", "r1", &mut refs);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].target, "sensor.temp");
        assert_eq!(refs[1].value, None);
    }

    #[test]
    fn is_state_attr_wins_over_substring_patterns() {
        let mut refs = Vec::new();
        scan_template(
            "{{ is_state_attr('climate.living', 'fan_mode', 'auto') }}",
            "t",
            "r1",
            &mut refs,
        );
        // Template ref + exactly one attribute ref, not extra is_state/state_attr hits.
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].kind, ReferenceKind::Attribute);
        assert_eq!(refs[1].attribute.as_deref(), Some("fan_mode"));
        assert_eq!(refs[1].value.as_deref(), Some("auto"));
    }

    #[test]
    fn dynamic_arguments_synthesize_nothing() {
        let mut refs = Vec::new();
        scan_template("{{ states(my_variable) }}", "t", "r1", &mut refs);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, ReferenceKind::Template);
    }
}
