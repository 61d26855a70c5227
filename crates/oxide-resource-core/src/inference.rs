//! Bidirectional relationship inference.
//!
//! Every host relationship `A -> B` must also be visible from `B`. When `B`
//! declares no relationship back to `A` with the inverse cardinality, a
//! guest relationship is synthesized on `B`. Existing declarations are
//! never overwritten, even when their `host` or `nullable` flags disagree.
//!
//! A synthesized inverse records the host relationship it reads through,
//! so a resource with several host relationships to the same target keeps
//! them apart. A declaration that names a different inverse does not count
//! as the inverse of this one.

use tracing::{debug, warn};

use crate::model::{Relationship, ResourceModel};

/// Synthesizes missing inverse relationships in place.
///
/// Running it a second time changes nothing.
pub fn infer_relationships(models: &mut [ResourceModel]) {
    let mut pending = Vec::new();

    for model in models.iter() {
        for (name, rel) in model.relationships.iter().filter(|(_, r)| r.host) {
            pending.push((
                model.name.clone(),
                model.plural_form.clone(),
                name.clone(),
                rel.clone(),
            ));
        }
    }

    for (source, source_plural, host_name, rel) in pending {
        let inverse = rel.cardinality.inverse();
        let Some(target) = models.iter_mut().find(|m| m.name == rel.resource) else {
            // Unknown targets surface as unresolved relationships later.
            continue;
        };

        let self_reference = target.name == source;
        let declared = target.relationships.iter().any(|(name, r)| {
            !(self_reference && *name == host_name)
                && r.resource == source
                && r.cardinality == inverse
                && r.inverse.as_ref().map_or(true, |i| *i == host_name)
        });
        if declared {
            continue;
        }

        let name = if inverse.is_to_many() {
            source_plural
        } else {
            source.clone()
        };

        if target.relationships.contains_key(&name) || target.attributes.contains_key(&name) {
            warn!(
                resource = %target.name,
                relationship = %name,
                inverse_of = %host_name,
                "Cannot infer inverse relationship, name already taken"
            );
            continue;
        }

        debug!(
            resource = %target.name,
            relationship = %name,
            inverse_of = %host_name,
            cardinality = inverse.as_str(),
            "Inferred inverse relationship"
        );
        target.relationships.insert(
            name,
            Relationship::new(source, inverse).guest().inverse_of(host_name),
        );
    }
}
