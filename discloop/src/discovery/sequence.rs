// discloop/src/discovery/sequence.rs

use std::convert::TryFrom;

use crate::error::{Error, Result};
use crate::types::Technology;

/// Order in which passive technologies are polled. Never empty, no
/// technology twice.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSequence(Vec<Technology>);

impl Default for PollSequence {
    fn default() -> Self {
        Self(Technology::ALL.to_vec())
    }
}

impl PollSequence {
    /// Validated sequence; empty or duplicate lists are rejected.
    pub fn new(techs: &[Technology]) -> Result<Self> {
        if techs.is_empty() {
            return Err(Error::InvalidParameter("poll sequence is empty"));
        }
        for (i, t) in techs.iter().enumerate() {
            if techs[..i].contains(t) {
                return Err(Error::InvalidParameter("technology repeated in poll sequence"));
            }
        }
        Ok(Self(techs.to_vec()))
    }

    /// Technologies in poll order.
    pub fn as_slice(&self) -> &[Technology] {
        &self.0
    }

    /// Technologies in poll order.
    pub fn iter(&self) -> impl Iterator<Item = Technology> + '_ {
        self.0.iter().copied()
    }

    /// Position of `tech`, if it is part of the sequence.
    pub fn position(&self, tech: Technology) -> Option<usize> {
        self.0.iter().position(|t| *t == tech)
    }
}

/// Raw technology ids as used on configuration interfaces.
impl TryFrom<&[u8]> for PollSequence {
    type Error = Error;

    fn try_from(ids: &[u8]) -> Result<Self> {
        let techs = ids
            .iter()
            .map(|id| Technology::try_from(*id))
            .collect::<Result<Vec<_>>>()?;
        PollSequence::new(&techs)
    }
}
