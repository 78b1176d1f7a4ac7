//! Sums of chromatic objects.
//!
//! Terms that share an SED are grouped so that each group renders with one
//! monochromatic draw. A sum whose terms are all separable with a single
//! common SED is itself separable.

use log::debug;

use super::{ChromaticKind, ChromaticObject};
use crate::error::{GalSimError, Result};
use crate::photometry::Sed;

#[derive(Debug, Clone)]
pub struct ChromaticSum {
    terms: Vec<ChromaticObject>,
    objlist: Vec<ChromaticObject>,
    separable: bool,
}

impl ChromaticSum {
    /// Sum one or more chromatic objects.
    ///
    /// Nested sums are spliced in. Unless every term shares one SED the
    /// terms are grouped by SED in order of first appearance: groups of two
    /// or more become separable sub-sums, singletons and inseparable terms
    /// are kept as they are.
    pub fn new(items: impl IntoIterator<Item = ChromaticObject>) -> Result<Self> {
        let mut terms = Vec::new();
        for item in items {
            match item.as_sum() {
                Some(sum) => terms.extend(sum.terms.iter().cloned()),
                None => terms.push(item),
            }
        }
        if terms.is_empty() {
            return Err(GalSimError::InvalidArgument(
                "a ChromaticSum needs at least one term".to_string(),
            ));
        }

        let seds: Vec<Option<Sed>> = terms
            .iter()
            .map(|t| t.separable_parts().map(|(_, sed)| sed))
            .collect();
        let separable = match seds.first() {
            Some(Some(first)) => seds.iter().all(|s| s.as_ref() == Some(first)),
            _ => false,
        };
        if separable {
            return Ok(Self {
                objlist: terms.clone(),
                terms,
                separable,
            });
        }

        // Each slot is either an inseparable term or a group sharing an SED.
        let mut slots: Vec<(Option<Sed>, Vec<ChromaticObject>)> = Vec::new();
        for (term, sed) in terms.iter().zip(seds) {
            match sed {
                Some(sed) => match slots.iter_mut().find(|(s, _)| s.as_ref() == Some(&sed)) {
                    Some((_, group)) => group.push(term.clone()),
                    None => slots.push((Some(sed), vec![term.clone()])),
                },
                None => slots.push((None, vec![term.clone()])),
            }
        }
        let objlist: Vec<ChromaticObject> = slots
            .into_iter()
            .map(|(_, mut group)| {
                if group.len() == 1 {
                    group.remove(0)
                } else {
                    ChromaticObject::from_kind(ChromaticKind::Sum(Self {
                        objlist: group.clone(),
                        terms: group,
                        separable: true,
                    }))
                }
            })
            .collect();
        debug!(
            "grouped {} chromatic terms into {} components",
            terms.len(),
            objlist.len()
        );
        Ok(Self {
            terms,
            objlist,
            separable,
        })
    }

    /// The flattened terms, as supplied.
    pub fn terms(&self) -> &[ChromaticObject] {
        &self.terms
    }

    /// The components rendered one by one: each is separable or a single
    /// inseparable term.
    pub fn objlist(&self) -> &[ChromaticObject] {
        &self.objlist
    }

    pub fn is_separable(&self) -> bool {
        self.separable
    }
}

impl From<ChromaticSum> for ChromaticObject {
    fn from(sum: ChromaticSum) -> Self {
        ChromaticObject::from_kind(ChromaticKind::Sum(sum))
    }
}
