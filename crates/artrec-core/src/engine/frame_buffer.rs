use crate::{Delta, MergeMode};

/// The authoritative channel state of the mirrored universe.
///
/// Channels are 1-indexed in the public API; the length is fixed at
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    values: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(channels: usize) -> Self {
        Self {
            values: vec![0; channels],
        }
    }

    pub fn from_values(values: Vec<u8>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.values
    }

    pub fn get(&self, channel: u16) -> Option<u8> {
        let index = usize::from(channel).checked_sub(1)?;
        self.values.get(index).copied()
    }

    /// Compare against `incoming`, store it, and return what changed.
    ///
    /// Channels past the end of `incoming` keep their value; bytes past the
    /// buffer length, or past the last addressable channel, are ignored.
    pub fn diff(&mut self, incoming: &[u8]) -> Vec<Delta> {
        let mut deltas = Vec::new();
        for (index, (current, &value)) in self.values.iter_mut().zip(incoming).enumerate() {
            let Ok(channel) = u16::try_from(index + 1) else {
                break;
            };
            if *current != value {
                deltas.push(Delta::new(channel, value));
                *current = value;
            }
        }
        deltas
    }

    /// Apply `deltas` in place; returns how many channels changed value.
    pub fn apply(&mut self, deltas: &[Delta], mode: MergeMode) -> usize {
        let mut changed = 0;
        for delta in deltas {
            let Some(index) = usize::from(delta.channel).checked_sub(1) else {
                continue;
            };
            let Some(slot) = self.values.get_mut(index) else {
                continue;
            };
            let next = match mode {
                MergeMode::Ltp => delta.value,
                MergeMode::Htp => (*slot).max(delta.value),
            };
            if *slot != next {
                *slot = next;
                changed += 1;
            }
        }
        changed
    }
}
