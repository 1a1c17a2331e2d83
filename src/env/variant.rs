//! Registered environment variants.

use std::fmt;
use std::str::FromStr;

use super::error::EnvError;
use super::observation::{MergeLayout, ObservationEncoder};
use super::reward::RewardStrategy;

/// An (observation encoder, reward strategy) pairing, addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EnvVariant {
    /// Base observations, speed-tracking reward.
    HighwayPo,
    /// Base observations, local neighborhood reward.
    HighwayPoLocalReward,
    /// Base observations, constant negative reward.
    HighwayPoNegative,
    /// Base observations, shared collaborative reward.
    HighwayPoCollaborate,
    /// Merge-aware observations, speed-tracking reward.
    HighwayPoMergeInfo,
    /// Merge-aware observations, constant negative reward.
    HighwayPoMergeInfoNegative,
    /// Merge-aware observations, shared collaborative reward.
    HighwayPoMergeInfoCollaborate,
}

impl EnvVariant {
    pub const ALL: [EnvVariant; 7] = [
        Self::HighwayPo,
        Self::HighwayPoLocalReward,
        Self::HighwayPoNegative,
        Self::HighwayPoCollaborate,
        Self::HighwayPoMergeInfo,
        Self::HighwayPoMergeInfoNegative,
        Self::HighwayPoMergeInfoCollaborate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::HighwayPo => "highway_po",
            Self::HighwayPoLocalReward => "highway_po_local_reward",
            Self::HighwayPoNegative => "highway_po_negative",
            Self::HighwayPoCollaborate => "highway_po_collaborate",
            Self::HighwayPoMergeInfo => "highway_po_merge_info",
            Self::HighwayPoMergeInfoNegative => "highway_po_merge_info_negative",
            Self::HighwayPoMergeInfoCollaborate => "highway_po_merge_info_collaborate",
        }
    }

    /// The encoder and reward strategy this variant stands for.
    pub fn parts(self) -> (ObservationEncoder, RewardStrategy) {
        let merge = || ObservationEncoder::MergeInfo(MergeLayout::default());
        match self {
            Self::HighwayPo => (ObservationEncoder::Base, RewardStrategy::speed_tracking()),
            Self::HighwayPoLocalReward => (ObservationEncoder::Base, RewardStrategy::LocalAverage),
            Self::HighwayPoNegative => (ObservationEncoder::Base, RewardStrategy::Negative),
            Self::HighwayPoCollaborate => {
                (ObservationEncoder::Base, RewardStrategy::collaborative())
            }
            Self::HighwayPoMergeInfo => (merge(), RewardStrategy::speed_tracking()),
            Self::HighwayPoMergeInfoNegative => (merge(), RewardStrategy::Negative),
            Self::HighwayPoMergeInfoCollaborate => (merge(), RewardStrategy::collaborative()),
        }
    }
}

impl fmt::Display for EnvVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EnvVariant {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| EnvError::UnknownVariant(s.to_string()))
    }
}
