//! Facts: claims about program variables at program points, indexed by the
//! control-flow edge they hold on.

use crate::cfg::EdgeId;
use crate::types::TypeUri;
use std::collections::HashMap;

pub type FactId = u32;

/// What a fact claims about its variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactClaim {
    /// The variable has been assigned a value.
    Initialised,
    /// The variable holds a value of this type.
    Type(TypeUri),
}

/// A claim about a variable on an edge. `must` means the claim holds on
/// every predecessor path; `may` (must = false) means it holds on at least
/// one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub id: FactId,
    pub variable: String,
    pub claim: FactClaim,
    pub must: bool,
}

impl Fact {
    /// The claim identity used when merging: everything except `id` and
    /// `must`.
    fn key(&self) -> (&str, &FactClaim) {
        (&self.variable, &self.claim)
    }
}

/// Per-edge fact storage for one control-flow graph.
#[derive(Debug, Default)]
pub struct Facts {
    next_id: FactId,
    by_edge: HashMap<EdgeId, Vec<Fact>>,
}

impl Facts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, edge: EdgeId, variable: &str, claim: FactClaim, must: bool) {
        let id = self.next_id;
        self.next_id += 1;
        self.by_edge.entry(edge).or_default().push(Fact {
            id,
            variable: variable.to_string(),
            claim,
            must,
        });
    }

    pub fn for_edge(&self, edge: EdgeId) -> &[Fact] {
        self.by_edge.get(&edge).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Merge the fact sets of several incoming edges: the union of all
    /// claims, with `must` kept only for claims that hold as `must` on
    /// every incoming edge.
    pub fn merge(&mut self, incoming: &[EdgeId], outgoing: EdgeId) {
        let mut merged: Vec<Fact> = Vec::new();

        for &edge in incoming {
            for fact in self.for_edge(edge).to_vec() {
                match merged.iter_mut().find(|f| f.key() == fact.key()) {
                    Some(existing) => existing.must = existing.must && fact.must,
                    None => {
                        let on_all = fact.must
                            && incoming.iter().all(|&other| {
                                self.for_edge(other)
                                    .iter()
                                    .any(|f| f.key() == fact.key() && f.must)
                            });
                        let mut fact = fact;
                        fact.must = on_all;
                        merged.push(fact);
                    }
                }
            }
        }

        for fact in merged {
            self.record(outgoing, &fact.variable, fact.claim, fact.must);
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_downgrades_one_sided_claims() {
        let mut facts = Facts::new();
        facts.record(0, "x", FactClaim::Initialised, true);
        facts.record(0, "x", FactClaim::Type(TypeUri::string()), true);
        facts.record(1, "x", FactClaim::Initialised, true);
        facts.record(1, "x", FactClaim::Type(TypeUri::number()), true);

        facts.merge(&[0, 1], 2);
        let merged = facts.for_edge(2);

        let init = merged
            .iter()
            .find(|f| f.claim == FactClaim::Initialised)
            .unwrap();
        assert!(init.must, "initialised on both branches stays a must");

        let string_ty = merged
            .iter()
            .find(|f| f.claim == FactClaim::Type(TypeUri::string()))
            .unwrap();
        let number_ty = merged
            .iter()
            .find(|f| f.claim == FactClaim::Type(TypeUri::number()))
            .unwrap();
        assert!(!string_ty.must);
        assert!(!number_ty.must);
    }

    #[test]
    fn merge_keeps_duplicates_single() {
        let mut facts = Facts::new();
        facts.record(0, "y", FactClaim::Initialised, true);
        facts.record(1, "y", FactClaim::Initialised, true);
        facts.merge(&[0, 1], 2);
        assert_eq!(facts.for_edge(2).len(), 1);
    }
}
