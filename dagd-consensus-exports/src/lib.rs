// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Definition and exports of the consensus API, configuration and errors.

mod block_context;
mod controller_trait;
mod genesis;
mod settings;

pub mod error;

pub use block_context::{BlockContext, BlockInsertionResult};
pub use controller_trait::ConsensusController;
pub use genesis::default_genesis_block;
pub use settings::ConsensusConfig;
