use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// One side of a virtual channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    /// The pool operator, who funds every channel.
    PoolOperator,
    /// The miner on the other end of the channel.
    Miner,
}

impl Party {
    /// The opposite side of the channel.
    pub fn counterparty(self) -> Self {
        match self {
            Self::PoolOperator => Self::Miner,
            Self::Miner => Self::PoolOperator,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PoolOperator => "pool_operator",
            Self::Miner => "miner",
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Party {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pool_operator" => Ok(Self::PoolOperator),
            "miner" => Ok(Self::Miner),
            other => Err(TypeError::UnknownLabel {
                kind: "party",
                label: other.to_string(),
            }),
        }
    }
}
