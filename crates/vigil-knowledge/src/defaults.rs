//! Static per-domain default state tables and the conservative-mode whitelist.
//!
//! These tables seed the knowledge base before any live source is consulted.
//! Only domains with a genuinely closed state space are listed — open-state
//! domains (plain sensors, text, numbers) stay out so the validators keep
//! their false-negative bias.

/// Domains eligible for state/value validation. Entities outside this list
/// are only validated if they declare an enum state space.
pub const DOMAIN_WHITELIST: &[&str] = &[
    "alarm_control_panel",
    "automation",
    "binary_sensor",
    "calendar",
    "climate",
    "cover",
    "device_tracker",
    "fan",
    "humidifier",
    "input_boolean",
    "light",
    "lock",
    "media_player",
    "person",
    "schedule",
    "script",
    "sun",
    "switch",
    "timer",
    "update",
    "vacuum",
    "water_heater",
];

/// States every entity can report regardless of domain.
pub const UNIVERSAL_STATES: &[&str] = &["unavailable", "unknown"];

/// Default known states for a domain, or `None` when the domain has no
/// closed default set.
#[must_use]
pub fn domain_default_states(domain: &str) -> Option<&'static [&'static str]> {
    let states: &[&str] = match domain {
        "binary_sensor" | "switch" | "light" | "fan" | "input_boolean" | "humidifier"
        | "automation" | "script" | "calendar" | "schedule" => &["on", "off"],
        "cover" => &["open", "closed", "opening", "closing"],
        "lock" => &["locked", "unlocked", "locking", "unlocking", "jammed", "open"],
        "climate" => &[
            "off",
            "heat",
            "cool",
            "heat_cool",
            "auto",
            "dry",
            "fan_only",
        ],
        "media_player" => &["off", "on", "idle", "playing", "paused", "standby", "buffering"],
        "person" | "device_tracker" => &["home", "not_home"],
        "sun" => &["above_horizon", "below_horizon"],
        "alarm_control_panel" => &[
            "disarmed",
            "armed_home",
            "armed_away",
            "armed_night",
            "armed_vacation",
            "armed_custom_bypass",
            "pending",
            "arming",
            "disarming",
            "triggered",
        ],
        "vacuum" => &["cleaning", "docked", "idle", "paused", "returning", "error"],
        "timer" => &["idle", "active", "paused"],
        "update" => &["on", "off"],
        "water_heater" => &[
            "off",
            "eco",
            "electric",
            "performance",
            "high_demand",
            "heat_pump",
            "gas",
        ],
        _ => return None,
    };
    Some(states)
}

/// Whether a domain is in the fixed conservative-mode whitelist.
#[must_use]
pub fn is_whitelisted(domain: &str) -> bool {
    DOMAIN_WHITELIST.contains(&domain)
}
