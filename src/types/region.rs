use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Platform routing target for the remote API.
///
/// Every governed request is sent to the platform host serving the
/// configured region. The set is closed; new shards are added here when
/// the provider opens them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// Brazil
    Br,
    /// Europe Nordic & East
    Eune,
    /// Europe West
    Euw,
    /// Japan
    Jp,
    /// Korea
    Kr,
    /// Latin America North
    Lan,
    /// Latin America South
    Las,
    /// North America
    Na,
    /// Oceania
    Oce,
    /// Russia
    Ru,
    /// Turkey
    Tr,
}

impl Region {
    /// Hostname of the platform serving this region.
    #[must_use]
    pub const fn host(self) -> &'static str {
        match self {
            Self::Br => "br1.api.riotgames.com",
            Self::Eune => "eun1.api.riotgames.com",
            Self::Euw => "euw1.api.riotgames.com",
            Self::Jp => "jp1.api.riotgames.com",
            Self::Kr => "kr.api.riotgames.com",
            Self::Lan => "la1.api.riotgames.com",
            Self::Las => "la2.api.riotgames.com",
            Self::Na => "na1.api.riotgames.com",
            Self::Oce => "oc1.api.riotgames.com",
            Self::Ru => "ru.api.riotgames.com",
            Self::Tr => "tr1.api.riotgames.com",
        }
    }
}
