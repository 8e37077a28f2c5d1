use serde::{Deserialize, Serialize};

/// Native currency descriptor used when registering a chain with a wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Everything a wallet needs to add and switch to a network
/// (the `wallet_addEthereumChain` parameter set).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDescriptor {
    pub chain_id: u64,
    #[serde(rename = "chainName")]
    pub name: String,
    #[serde(rename = "nativeCurrency")]
    pub currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    #[serde(rename = "blockExplorerUrls")]
    pub explorer_urls: Vec<String>,
}

impl NetworkDescriptor {
    /// XRPL EVM Sidechain
    pub fn xrpl_evm_sidechain() -> Self {
        Self {
            chain_id: 1_440_002,
            name: "XRPL EVM Sidechain".to_string(),
            currency: NativeCurrency {
                name: "XRP".to_string(),
                symbol: "XRP".to_string(),
                decimals: 18,
            },
            rpc_urls: vec!["https://rpc-evm-sidechain.xrpl.org".to_string()],
            explorer_urls: vec!["https://evm-sidechain.xrpl.org".to_string()],
        }
    }

    /// Chain id in the `0x`-prefixed form wallets expect
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    pub fn primary_rpc_url(&self) -> Option<&str> {
        self.rpc_urls.first().map(String::as_str)
    }

    /// Explorer link for a transaction hash, if an explorer is configured
    pub fn tx_url(&self, tx_hash: &str) -> Option<String> {
        self.explorer_urls
            .first()
            .map(|base| format!("{}/tx/{}", base.trim_end_matches('/'), tx_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidechain_chain_id_hex_matches_wallet_form() {
        let network = NetworkDescriptor::xrpl_evm_sidechain();
        assert_eq!(network.chain_id_hex(), "0x15f902");
    }

    #[test]
    fn tx_url_joins_explorer_base() {
        let network = NetworkDescriptor::xrpl_evm_sidechain();
        assert_eq!(
            network.tx_url("0xabc").as_deref(),
            Some("https://evm-sidechain.xrpl.org/tx/0xabc")
        );
    }
}
