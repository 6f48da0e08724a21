//! Pose vector extraction
//!
//! Turns one [`Skeleton`] into the flat sample layout declared by the stream
//! descriptor: for joint `j` of the table, slots `7j..7j+7` hold
//! `[posX, posY, posZ, oriW, oriX, oriY, oriZ]`.

use crate::joints::JointTable;
use crate::stream::descriptor::CHANNELS_PER_JOINT;
use crate::types::Skeleton;

/// Flat sample buffer sized for exactly one joint table
#[derive(Debug, Clone, PartialEq)]
pub struct PoseVector {
    values: Vec<f32>,
}

impl PoseVector {
    /// A zeroed vector with one 7-value block per joint in `table`
    pub fn for_table(table: &JointTable) -> Self {
        Self {
            values: vec![0.0; CHANNELS_PER_JOINT * table.len()],
        }
    }

    /// Overwrite every slot from `skeleton` in table order
    ///
    /// Panics if the vector was sized for a table of different length.
    pub fn fill(&mut self, skeleton: &Skeleton, table: &JointTable) {
        assert_eq!(
            self.values.len(),
            CHANNELS_PER_JOINT * table.len(),
            "pose vector sized for a different joint table"
        );
        for (block, spec) in self
            .values
            .chunks_exact_mut(CHANNELS_PER_JOINT)
            .zip(table.iter())
        {
            block.copy_from_slice(&skeleton.joint(spec.id).to_channels());
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.values
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.values
    }
}

/// Build a fresh pose vector for `skeleton`
pub fn extract(skeleton: &Skeleton, table: &JointTable) -> PoseVector {
    let mut vector = PoseVector::for_table(table);
    vector.fill(skeleton, table);
    vector
}
