use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{MaxSubError, Parcel};

/// Shape of a randomly generated patch: `len` non-zero parcels in `min..=max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSpec {
    pub len: usize,
    pub min: Parcel,
    pub max: Parcel,
}

impl Default for PatchSpec {
    fn default() -> Self {
        Self {
            len: 150,
            min: -20,
            max: 20,
        }
    }
}

impl PatchSpec {
    pub fn validate(&self) -> Result<(), MaxSubError> {
        if self.min > self.max {
            return Err(MaxSubError::InvalidRange {
                min: self.min,
                max: self.max,
            });
        }
        if self.min == 0 && self.max == 0 {
            return Err(MaxSubError::ZeroOnlyRange);
        }
        Ok(())
    }
}

/// Draw a patch of non-zero parcels; zeros are redrawn so every parcel is
/// clearly a gain or a loss.
pub fn generate_patch<R: Rng + ?Sized>(
    rng: &mut R,
    spec: &PatchSpec,
) -> Result<Vec<Parcel>, MaxSubError> {
    spec.validate()?;
    let mut out = Vec::with_capacity(spec.len);
    while out.len() < spec.len {
        let value = rng.gen_range(spec.min..=spec.max);
        if value != 0 {
            out.push(value);
        }
    }
    Ok(out)
}
