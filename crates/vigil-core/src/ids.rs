//! Entity-id helpers.
//!
//! Entity ids have the form `domain.object_id` (`light.kitchen`). Service ids
//! share the shape (`light.turn_on`), so these helpers serve both.

/// Split an id into `(domain, object_id)`.
///
/// Returns `None` when the id has no dot or either side is empty.
#[must_use]
pub fn split_entity_id(id: &str) -> Option<(&str, &str)> {
    let (domain, object) = id.split_once('.')?;
    if domain.is_empty() || object.is_empty() {
        return None;
    }
    Some((domain, object))
}

/// The domain part of an id, or the empty string for malformed ids.
///
/// Malformed ids still flow through validation (they fail the registry
/// existence check), so this never errors.
#[must_use]
pub fn domain_of(id: &str) -> &str {
    split_entity_id(id).map_or("", |(domain, _)| domain)
}

#[cfg(test)]
mod tests {
    use super::{domain_of, split_entity_id};

    #[test]
    fn splits_well_formed_ids() {
        assert_eq!(
            split_entity_id("binary_sensor.front_door"),
            Some(("binary_sensor", "front_door"))
        );
        assert_eq!(domain_of("light.kitchen"), "light");
    }

    #[test]
    fn rejects_malformed_ids() {
        assert_eq!(split_entity_id("kitchen"), None);
        assert_eq!(split_entity_id(".kitchen"), None);
        assert_eq!(split_entity_id("light."), None);
        assert_eq!(domain_of("kitchen"), "");
    }

    #[test]
    fn extra_dots_stay_in_object_id() {
        assert_eq!(split_entity_id("a.b.c"), Some(("a", "b.c")));
    }
}
