//! Test data builders for creating skeleton fixtures

use posestream_rs::types::{JointPose, Quaternion, Skeleton, Vec3};
use posestream_rs::JointId;

/// Builder for creating test Skeletons
///
/// Every joint gets a distinct, recognisable pose derived from a seed so a
/// misplaced block shows up as a wrong number.
pub struct SkeletonBuilder {
    seed: f32,
    overrides: Vec<(JointId, JointPose)>,
}

impl SkeletonBuilder {
    pub fn new(seed: f32) -> Self {
        Self {
            seed,
            overrides: Vec::new(),
        }
    }

    pub fn joint(mut self, id: JointId, pose: JointPose) -> Self {
        self.overrides.push((id, pose));
        self
    }

    pub fn build(self) -> Skeleton {
        let mut skeleton = Skeleton::default();
        for id in JointId::ALL {
            skeleton.set_joint(id, seeded_pose(self.seed, id));
        }
        for (id, pose) in self.overrides {
            skeleton.set_joint(id, pose);
        }
        skeleton
    }
}

/// Pose of `id` in a skeleton built from `seed`
pub fn seeded_pose(seed: f32, id: JointId) -> JointPose {
    let base = seed * 1000.0 + id.index() as f32 * 10.0;
    JointPose::new(
        Vec3::new(base + 1.0, base + 2.0, base + 3.0),
        Quaternion::new(0.5, 0.5, -0.5, id.index() as f32 / 100.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_builder() {
        let pose = JointPose::new(Vec3::new(7.0, 8.0, 9.0), Quaternion::IDENTITY);
        let skeleton = SkeletonBuilder::new(2.0).joint(JointId::Head, pose).build();

        assert_eq!(*skeleton.joint(JointId::Head), pose);
        assert_eq!(*skeleton.joint(JointId::Pelvis), seeded_pose(2.0, JointId::Pelvis));
    }
}
