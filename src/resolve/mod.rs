//! Association chain resolution.
//!
//! Walks the hops of a dotted key left to right against the schema
//! provider, producing concrete join targets. Polymorphic hops require a
//! discriminator type from the key and yield a discriminator condition.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{QueryError, QueryResult};
use crate::schema::SchemaProvider;
use crate::spec::Hop;

/// One resolved hop: source entity, concrete target entity, the foreign
/// key on the source, and the discriminator `(column, expected value)`
/// when the association is polymorphic.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedHop {
    pub source: String,
    pub target: String,
    pub foreign_key: String,
    pub discriminator: Option<(String, String)>,
}

/// Resolves association chains against a schema provider.
///
/// Resolutions are memoized per distinct chain; the resolver is call-scoped
/// and never shared across invocations.
pub struct AssociationResolver<'a, P: SchemaProvider> {
    provider: &'a P,
    base: String,
    cache: HashMap<Vec<Hop>, Rc<Vec<ResolvedHop>>>,
}

impl<'a, P: SchemaProvider> AssociationResolver<'a, P> {
    pub fn new(provider: &'a P, base: impl Into<String>) -> Self {
        Self {
            provider,
            base: base.into(),
            cache: HashMap::new(),
        }
    }

    pub fn provider(&self) -> &'a P {
        self.provider
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Resolve a chain of hops starting from the base entity.
    pub fn resolve(&mut self, chain: &[Hop]) -> QueryResult<Rc<Vec<ResolvedHop>>> {
        if let Some(resolved) = self.cache.get(chain) {
            return Ok(Rc::clone(resolved));
        }

        let mut resolved = Vec::with_capacity(chain.len());
        let mut current = self.base.clone();
        for hop in chain {
            let association = self
                .provider
                .association(&current, &hop.name)
                .ok_or_else(|| QueryError::UnknownAssociation {
                    entity: current.clone(),
                    name: hop.name.clone(),
                })?;

            let (target, discriminator) = if let Some(type_column) = association.foreign_type {
                let expected = hop
                    .type_hint
                    .clone()
                    .ok_or_else(|| QueryError::PolymorphicTypeRequired(hop.name.clone()))?;
                (expected.clone(), Some((type_column, expected)))
            } else {
                let target =
                    association
                        .target
                        .ok_or_else(|| QueryError::UnknownAssociation {
                            entity: current.clone(),
                            name: hop.name.clone(),
                        })?;
                (target, None)
            };

            resolved.push(ResolvedHop {
                source: current.clone(),
                target: target.clone(),
                foreign_key: association.foreign_key,
                discriminator,
            });
            current = target;
        }

        let resolved = Rc::new(resolved);
        self.cache.insert(chain.to_vec(), Rc::clone(&resolved));
        Ok(resolved)
    }

    /// The entity a chain lands on; the base entity for an empty chain.
    pub fn target_entity(&mut self, chain: &[Hop]) -> QueryResult<String> {
        if chain.is_empty() {
            return Ok(self.base.clone());
        }
        let resolved = self.resolve(chain)?;
        Ok(resolved
            .last()
            .map(|hop| hop.target.clone())
            .unwrap_or_else(|| self.base.clone()))
    }
}
