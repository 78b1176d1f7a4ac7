//! Convolutions of chromatic objects.

use log::debug;

use super::{ChromaticKind, ChromaticObject, ChromaticSum};
use crate::error::{GalSimError, Result};
use crate::gsparams::GsParams;

#[derive(Debug, Clone)]
pub struct ChromaticConvolution {
    items: Vec<ChromaticObject>,
    gsparams: Option<GsParams>,
}

impl ChromaticConvolution {
    /// Convolve one or more chromatic objects.
    ///
    /// Nested convolutions are spliced in. When two or more operands are
    /// sums the convolution is distributed over the first of them, so the
    /// result is a sum of convolutions each holding at most one sum operand.
    pub fn new(
        items: impl IntoIterator<Item = ChromaticObject>,
        gsparams: Option<GsParams>,
    ) -> Result<ChromaticObject> {
        let mut flat = Vec::new();
        for item in items {
            match item.as_convolution() {
                Some(conv) => flat.extend(conv.items.iter().cloned()),
                None => flat.push(item),
            }
        }
        if flat.is_empty() {
            return Err(GalSimError::InvalidArgument(
                "a ChromaticConvolution needs at least one item".to_string(),
            ));
        }

        let sum_count = flat.iter().filter(|item| item.as_sum().is_some()).count();
        let first_sum = flat
            .iter()
            .enumerate()
            .find_map(|(i, item)| item.as_sum().map(|sum| (i, sum.objlist().to_vec())));
        if let (true, Some((first, terms))) = (sum_count >= 2, first_sum) {
            debug!(
                "distributing a convolution of {} items over a sum of {}",
                flat.len(),
                terms.len()
            );
            let branches = terms
                .iter()
                .map(|term| {
                    let mut branch = flat.clone();
                    branch[first] = term.clone();
                    Self::new(branch, gsparams)
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(ChromaticSum::new(branches)?.into());
        }

        Ok(ChromaticObject::from_kind(ChromaticKind::Convolution(Self {
            items: flat,
            gsparams,
        })))
    }

    pub fn items(&self) -> &[ChromaticObject] {
        &self.items
    }

    pub fn gsparams(&self) -> Option<GsParams> {
        self.gsparams
    }
}
