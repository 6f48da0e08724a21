//! Joint layout table
//!
//! The [`JointTable`] is the single source of truth for joint ordering. The
//! stream descriptor derives its channel list from it and the pose extractor
//! derives its buffer layout from it, so the two can never disagree as long as
//! they are handed the same table.

use serde::{Deserialize, Serialize};

use crate::error::{PoseStreamError, Result};

/// Joints reported by the body tracking engine, in engine index order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JointId {
    Pelvis,
    SpineNavel,
    SpineChest,
    Neck,
    ClavicleLeft,
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandLeft,
    HandtipLeft,
    ThumbLeft,
    ClavicleRight,
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandRight,
    HandtipRight,
    ThumbRight,
    HipLeft,
    KneeLeft,
    AnkleLeft,
    FootLeft,
    HipRight,
    KneeRight,
    AnkleRight,
    FootRight,
    Head,
    Nose,
    EyeLeft,
    EarLeft,
    EyeRight,
    EarRight,
}

impl JointId {
    /// Number of joints in a skeleton
    pub const COUNT: usize = 32;

    /// Every joint in engine index order
    pub const ALL: [JointId; JointId::COUNT] = [
        JointId::Pelvis,
        JointId::SpineNavel,
        JointId::SpineChest,
        JointId::Neck,
        JointId::ClavicleLeft,
        JointId::ShoulderLeft,
        JointId::ElbowLeft,
        JointId::WristLeft,
        JointId::HandLeft,
        JointId::HandtipLeft,
        JointId::ThumbLeft,
        JointId::ClavicleRight,
        JointId::ShoulderRight,
        JointId::ElbowRight,
        JointId::WristRight,
        JointId::HandRight,
        JointId::HandtipRight,
        JointId::ThumbRight,
        JointId::HipLeft,
        JointId::KneeLeft,
        JointId::AnkleLeft,
        JointId::FootLeft,
        JointId::HipRight,
        JointId::KneeRight,
        JointId::AnkleRight,
        JointId::FootRight,
        JointId::Head,
        JointId::Nose,
        JointId::EyeLeft,
        JointId::EarLeft,
        JointId::EyeRight,
        JointId::EarRight,
    ];

    /// Engine index of this joint
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical display name, used as the channel label prefix
    pub fn name(self) -> &'static str {
        match self {
            JointId::Pelvis => "PELVIS",
            JointId::SpineNavel => "SPINE_NAVEL",
            JointId::SpineChest => "SPINE_CHEST",
            JointId::Neck => "NECK",
            JointId::ClavicleLeft => "CLAVICLE_LEFT",
            JointId::ShoulderLeft => "SHOULDER_LEFT",
            JointId::ElbowLeft => "ELBOW_LEFT",
            JointId::WristLeft => "WRIST_LEFT",
            JointId::HandLeft => "HAND_LEFT",
            JointId::HandtipLeft => "HANDTIP_LEFT",
            JointId::ThumbLeft => "THUMB_LEFT",
            JointId::ClavicleRight => "CLAVICLE_RIGHT",
            JointId::ShoulderRight => "SHOULDER_RIGHT",
            JointId::ElbowRight => "ELBOW_RIGHT",
            JointId::WristRight => "WRIST_RIGHT",
            JointId::HandRight => "HAND_RIGHT",
            JointId::HandtipRight => "HANDTIP_RIGHT",
            JointId::ThumbRight => "THUMB_RIGHT",
            JointId::HipLeft => "HIP_LEFT",
            JointId::KneeLeft => "KNEE_LEFT",
            JointId::AnkleLeft => "ANKLE_LEFT",
            JointId::FootLeft => "FOOT_LEFT",
            JointId::HipRight => "HIP_RIGHT",
            JointId::KneeRight => "KNEE_RIGHT",
            JointId::AnkleRight => "ANKLE_RIGHT",
            JointId::FootRight => "FOOT_RIGHT",
            JointId::Head => "HEAD",
            JointId::Nose => "NOSE",
            JointId::EyeLeft => "EYE_LEFT",
            JointId::EarLeft => "EAR_LEFT",
            JointId::EyeRight => "EYE_RIGHT",
            JointId::EarRight => "EAR_RIGHT",
        }
    }

    /// Look a joint up by its display name (case-insensitive)
    pub fn from_name(name: &str) -> Option<JointId> {
        JointId::ALL
            .iter()
            .copied()
            .find(|id| id.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for JointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A joint and the name it is published under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointSpec {
    pub id: JointId,
    pub name: String,
}

impl JointSpec {
    pub fn new(id: JointId) -> Self {
        Self {
            id,
            name: id.name().to_string(),
        }
    }
}

/// Ordered, non-empty, duplicate-free list of joints to publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointTable {
    specs: Vec<JointSpec>,
}

impl Default for JointTable {
    fn default() -> Self {
        Self::full_body()
    }
}

impl JointTable {
    /// Every joint the engine reports, in engine order
    pub fn full_body() -> Self {
        Self {
            specs: JointId::ALL.iter().copied().map(JointSpec::new).collect(),
        }
    }

    /// Build a table from joint ids in the given order
    pub fn from_ids(ids: &[JointId]) -> Result<Self> {
        if ids.is_empty() {
            return Err(PoseStreamError::Config(
                "joint table must contain at least one joint".to_string(),
            ));
        }

        let mut specs: Vec<JointSpec> = Vec::with_capacity(ids.len());
        for &id in ids {
            if specs.iter().any(|s| s.id == id) {
                return Err(PoseStreamError::Config(format!(
                    "joint {} listed more than once",
                    id
                )));
            }
            specs.push(JointSpec::new(id));
        }

        Ok(Self { specs })
    }

    /// Build a table from display names in the given order
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let ids = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                JointId::from_name(name)
                    .ok_or_else(|| PoseStreamError::Config(format!("unknown joint name '{}'", name)))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_ids(&ids)
    }

    /// The ordered joint specs
    pub fn joint_specs(&self) -> &[JointSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JointSpec> {
        self.specs.iter()
    }
}
