//! Bitcoin Diamond chain parameters, keyed by the chain name the node
//! reports in `getblockchaininfo`.

use bitcoin::Network;

pub const MAINNET_MAGIC: u32 = 0xbddeb4d9;
pub const TESTNET_MAGIC: u32 = 0x0709110b;
pub const REGTEST_MAGIC: u32 = 0xdab5bffa;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainParams {
    /// Network magic from the P2P message header.
    pub net: u32,
    pub name: &'static str,
    /// Address encoding rules. Bitcoin Diamond reuses Bitcoin's version bytes.
    pub network: Network,
}

pub const MAINNET_PARAMS: ChainParams = ChainParams {
    net: MAINNET_MAGIC,
    name: "mainnet",
    network: Network::Bitcoin,
};

pub const TESTNET_PARAMS: ChainParams = ChainParams {
    net: TESTNET_MAGIC,
    name: "testnet3",
    network: Network::Testnet,
};

pub const REGTEST_PARAMS: ChainParams = ChainParams {
    net: REGTEST_MAGIC,
    name: "regtest",
    network: Network::Regtest,
};

impl ChainParams {
    /// Look up parameters by node chain name. Unrecognized names resolve to
    /// main network parameters.
    pub fn for_chain(chain: &str) -> Self {
        match chain {
            "test" => TESTNET_PARAMS,
            "regtest" => REGTEST_PARAMS,
            _ => MAINNET_PARAMS,
        }
    }

    pub fn is_mainnet(&self) -> bool {
        self.net == MAINNET_MAGIC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_chain_name_resolves_to_main_magic() {
        let params = ChainParams::for_chain("main");
        assert_eq!(params.net, MAINNET_MAGIC);
        assert!(params.is_mainnet());
    }

    #[test]
    fn test_and_regtest_resolve_to_their_own_magic() {
        assert_eq!(ChainParams::for_chain("test").net, TESTNET_MAGIC);
        assert_eq!(ChainParams::for_chain("regtest").net, REGTEST_MAGIC);
        assert!(!ChainParams::for_chain("test").is_mainnet());
        assert!(!ChainParams::for_chain("regtest").is_mainnet());
    }

    #[test]
    fn unknown_chain_name_falls_back_to_main() {
        assert_eq!(ChainParams::for_chain("bcd-custom"), MAINNET_PARAMS);
    }
}
