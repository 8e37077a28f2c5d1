//! ProofPerks contract bindings
//!
//! The contract is an opaque service with a fixed method surface. All tuple returns are
//! decoded here, once, into named domain types.

use alloy::primitives::{Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use chrono::DateTime;

use crate::domain::{Campaign, CampaignCounters, CampaignStats, NormalizedParams};
use crate::error::{PerksError, Result};

sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    interface IProofPerks {
        error AlreadyClaimed(address user, uint256 campaignId);
        error CampaignExpired(uint256 campaignId, uint256 expiryTime);
        error InvalidCampaign(uint256 campaignId);

        function mintProof(address _to, uint256 _campaignId, bytes calldata _encryptedData) external;

        function burnProof(address _from, uint256 _campaignId) external;

        function balanceOf(address account, uint256 id) external view returns (uint256);

        function currentCampaignId() external view returns (uint256);

        function createCampaign(
            string calldata title,
            string calldata category,
            string calldata reward,
            string calldata imageUrl,
            string calldata location,
            uint256 expiry,
            string[] calldata tags
        ) external;

        function getCampaignById(uint256 campaignId) external view returns (
            string memory title,
            string memory category,
            string memory reward,
            string memory imageUrl,
            string memory location,
            uint256 expiry,
            string[] memory tags,
            uint256 minted,
            uint256 claimed,
            uint256 burned,
            uint256 views
        );

        function getCampaignStats(uint256 campaignId) external view returns (
            uint256 uniqueClaimers,
            uint256 totalMinted,
            uint256 totalClaimed,
            uint256 totalBurned
        );
    }
}

pub use IProofPerks::{
    balanceOfCall, burnProofCall, createCampaignCall, currentCampaignIdCall,
    getCampaignByIdCall, getCampaignByIdReturn, getCampaignStatsCall, getCampaignStatsReturn,
    mintProofCall, AlreadyClaimed, CampaignExpired, InvalidCampaign,
};

/// `mintProof(to, campaignId, encryptedData)` calldata
pub fn encode_mint_proof(params: &NormalizedParams) -> Bytes {
    Bytes::from(
        mintProofCall {
            _to: params.to,
            _campaignId: params.campaign_id,
            _encryptedData: params.encrypted_data.clone(),
        }
        .abi_encode(),
    )
}

fn to_u64(value: U256, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| {
        PerksError::InvalidCampaignData(format!("{field} does not fit in u64: {value}"))
    })
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

/// Decode the `getCampaignById` tuple.
///
/// Field order: title, category, reward, imageUrl, location, expiry, tags,
/// minted, claimed, burned, views. Empty titles/rewards get display fallbacks, a zero
/// expiry means "no expiry", and image references that are not URLs are dropped.
pub fn decode_campaign(id: u64, raw: getCampaignByIdReturn) -> Result<Campaign> {
    let counters = CampaignCounters {
        minted: to_u64(raw.minted, "minted")?,
        claimed: to_u64(raw.claimed, "claimed")?,
        burned: to_u64(raw.burned, "burned")?,
        views: to_u64(raw.views, "views")?,
    };
    counters.validate()?;

    let expiry_secs = to_u64(raw.expiry, "expiry")?;
    let expiry = if expiry_secs == 0 {
        None
    } else {
        let secs = i64::try_from(expiry_secs).map_err(|_| {
            PerksError::InvalidCampaignData(format!("expiry out of range: {expiry_secs}"))
        })?;
        Some(DateTime::from_timestamp(secs, 0).ok_or_else(|| {
            PerksError::InvalidCampaignData(format!("expiry out of range: {expiry_secs}"))
        })?)
    };

    let image_url = Some(raw.imageUrl)
        .filter(|u| !u.trim().is_empty())
        .filter(|u| {
            let valid = url::Url::parse(u).is_ok();
            if !valid {
                tracing::warn!("Invalid image URL for campaign {}: {}", id, u);
            }
            valid
        });

    Ok(Campaign {
        id,
        title: non_empty_or(raw.title, "Untitled Campaign"),
        category: raw.category,
        reward: non_empty_or(raw.reward, "No description"),
        image_url,
        location: raw.location,
        expiry,
        tags: raw.tags,
        counters,
    })
}

/// Decode the `getCampaignStats` tuple: uniqueClaimers, totalMinted, totalClaimed, totalBurned
pub fn decode_stats(raw: getCampaignStatsReturn) -> Result<CampaignStats> {
    Ok(CampaignStats {
        unique_claimers: to_u64(raw.uniqueClaimers, "uniqueClaimers")?,
        total_minted: to_u64(raw.totalMinted, "totalMinted")?,
        total_claimed: to_u64(raw.totalClaimed, "totalClaimed")?,
        total_burned: to_u64(raw.totalBurned, "totalBurned")?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloy::primitives::Address;
    use alloy::sol_types::SolError;

    pub(crate) fn raw_campaign() -> getCampaignByIdReturn {
        getCampaignByIdReturn {
            title: "Coffee Shop Rewards".to_string(),
            category: "Food & Beverage".to_string(),
            reward: "Free Coffee".to_string(),
            imageUrl: "https://example.com/coffee.jpg".to_string(),
            location: "Downtown".to_string(),
            expiry: U256::from(1_735_689_599u64),
            tags: vec!["coffee".to_string(), "drinks".to_string()],
            minted: U256::from(10u64),
            claimed: U256::from(6u64),
            burned: U256::from(2u64),
            views: U256::from(40u64),
        }
    }

    #[test]
    fn decode_campaign_maps_named_fields() {
        let campaign = decode_campaign(3, raw_campaign()).unwrap();
        assert_eq!(campaign.id, 3);
        assert_eq!(campaign.title, "Coffee Shop Rewards");
        assert_eq!(campaign.tags, vec!["coffee", "drinks"]);
        assert_eq!(campaign.counters.minted, 10);
        assert_eq!(campaign.counters.views, 40);
        assert_eq!(campaign.expiry.unwrap().timestamp(), 1_735_689_599);
        assert_eq!(
            campaign.image_url.as_deref(),
            Some("https://example.com/coffee.jpg")
        );
    }

    #[test]
    fn decode_campaign_applies_fallbacks() {
        let mut raw = raw_campaign();
        raw.title = String::new();
        raw.reward = "  ".to_string();
        raw.imageUrl = "not a url".to_string();
        raw.expiry = U256::ZERO;

        let campaign = decode_campaign(0, raw).unwrap();
        assert_eq!(campaign.title, "Untitled Campaign");
        assert_eq!(campaign.reward, "No description");
        assert!(campaign.image_url.is_none());
        assert!(campaign.expiry.is_none());
    }

    #[test]
    fn decode_campaign_rejects_inconsistent_counters() {
        let mut raw = raw_campaign();
        raw.burned = U256::from(20u64);
        assert!(decode_campaign(0, raw).is_err());
    }

    #[test]
    fn decode_campaign_rejects_oversized_counters() {
        let mut raw = raw_campaign();
        raw.views = U256::MAX;
        assert!(decode_campaign(0, raw).is_err());
    }

    #[test]
    fn mint_proof_selector_matches_signature() {
        assert_eq!(
            mintProofCall::SIGNATURE,
            "mintProof(address,uint256,bytes)"
        );
        assert_eq!(AlreadyClaimed::SIGNATURE, "AlreadyClaimed(address,uint256)");

        let encoded = encode_mint_proof(&NormalizedParams {
            to: Address::ZERO,
            campaign_id: U256::from(7u64),
            encrypted_data: Bytes::from_static(b"{}"),
        });
        assert_eq!(&encoded[..4], mintProofCall::SELECTOR.as_slice());
        let decoded = mintProofCall::abi_decode(&encoded).unwrap();
        assert_eq!(decoded._campaignId, U256::from(7u64));
    }
}
