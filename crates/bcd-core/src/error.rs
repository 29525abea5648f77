use bitcoin::{BlockHash, Txid};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("RPC communication failure: {0}")]
    Rpc(#[from] RpcError),

    #[error("transaction not found: {0}")]
    TxNotFound(Txid),

    #[error("block not found")]
    BlockNotFound,

    #[error("invalid node data: {0}")]
    InvalidData(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("chain info unavailable: {0}")]
    ChainInfoUnavailable(#[source] Box<CoreError>),

    #[error("height {height}: {source}")]
    BlockIdentifierUnresolved {
        height: u32,
        #[source]
        source: Box<CoreError>,
    },

    #[error("hash {hash}: {source}")]
    BlockFetchFailed {
        hash: BlockHash,
        #[source]
        source: Box<CoreError>,
    },

    #[error("{0}: not implemented")]
    NotImplemented(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// True when this error, or the error it annotates, reports a block that
    /// the node does not have.
    pub fn is_block_not_found(&self) -> bool {
        match self {
            Self::BlockNotFound => true,
            Self::BlockIdentifierUnresolved { source, .. }
            | Self::BlockFetchFailed { source, .. } => source.is_block_not_found(),
            _ => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server error {code}: {message}")]
    ServerError { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
