//! Airdrop data model and the bundled demo feed.
//!
//! The feed is a static mock list; there is no backend. Submissions from the
//! submit panel are demo-only and never persisted.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AirdropStatus {
    Active,
    Upcoming,
    Ended,
}

impl AirdropStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AirdropStatus::Active => "Active",
            AirdropStatus::Upcoming => "Upcoming",
            AirdropStatus::Ended => "Ended",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Airdrop {
    pub id: String,
    pub name: String,
    /// Free-form estimated value, e.g. "~$500 - $2000" or "Unknown".
    pub value: String,
    pub status: AirdropStatus,
    pub description: String,
    pub tags: Vec<String>,
    pub url: Option<String>,
    pub requirements: Vec<String>,
}

/// The demo feed shown on the Feed panel.
pub fn mock_airdrops() -> Vec<Airdrop> {
    vec![
        Airdrop {
            id: "1".into(),
            name: "Nebula Protocol".into(),
            value: "~$500 - $2000".into(),
            status: AirdropStatus::Active,
            description: "Nebula is a Layer 2 scaling solution using ZK-rollups. They have \
                confirmed a token airdrop for early users who bridge assets and interact with \
                their testnet dApps."
                .into(),
            tags: vec!["Layer 2".into(), "Testnet".into(), "High Value".into()],
            url: None,
            requirements: vec![
                "Bridge ETH to Nebula".into(),
                "Complete 5 transactions".into(),
                "Join Discord".into(),
            ],
        },
        Airdrop {
            id: "2".into(),
            name: "Ocean Dex".into(),
            value: "~$150".into(),
            status: AirdropStatus::Upcoming,
            description: "A new decentralized exchange aggregator on Solana. Early liquidity \
                providers and beta testers are eligible for the $OCEAN governance token \
                distribution."
                .into(),
            tags: vec!["DeFi".into(), "Solana".into(), "Liquidity".into()],
            url: None,
            requirements: vec!["Provide >$100 Liquidity".into(), "Swap 3 times".into()],
        },
        Airdrop {
            id: "3".into(),
            name: "StarkGaming".into(),
            value: "Unknown".into(),
            status: AirdropStatus::Active,
            description: "Play-to-earn ecosystem built on StarkNet. Mint your free \"Origin\" \
                badge NFT to qualify for future drops. Backed by major VC firms."
                .into(),
            tags: vec!["GameFi".into(), "NFT".into(), "StarkNet".into()],
            url: None,
            requirements: vec!["Connect Wallet".into(), "Mint Free NFT".into()],
        },
        Airdrop {
            id: "4".into(),
            name: "ZetaChain".into(),
            value: "~$300".into(),
            status: AirdropStatus::Active,
            description: "Omnichain smart contracts. Earn ZETA points by swapping assets across \
                chains on their testnet. Points will convert to tokens at TGE."
                .into(),
            tags: vec!["Omnichain".into(), "Points System".into()],
            url: None,
            requirements: vec!["Daily Cross-chain Swap".into(), "Invite Friends".into()],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_feed_has_unique_ids() {
        let drops = mock_airdrops();
        let mut ids: Vec<&str> = drops.iter().map(|d| d.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), drops.len());
    }

    #[test]
    fn status_labels_are_stable() {
        assert_eq!(AirdropStatus::Active.label(), "Active");
        assert_eq!(AirdropStatus::Upcoming.label(), "Upcoming");
        assert_eq!(AirdropStatus::Ended.label(), "Ended");
    }
}
