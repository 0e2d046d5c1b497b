// Deployment-time address resolution for the lottery's collaborators
use solana_program::{msg, pubkey::Pubkey};
use std::collections::HashMap;

use crate::constants::LOCAL_NETWORKS;
use crate::error::LotteryError;

/// Deploys a mock of a collaborator and returns its address
pub type MockFactory<'a> = Box<dyn FnMut() -> Result<Pubkey, LotteryError> + 'a>;

/// How a collaborator contract address is obtained
pub enum ContractResolver<'a> {
    /// Address is already known
    PreDeployed(Pubkey),
    /// Deploy a fresh mock
    DeployFreshMock(MockFactory<'a>),
}

impl<'a> ContractResolver<'a> {
    pub fn resolve(self) -> Result<Pubkey, LotteryError> {
        match self {
            ContractResolver::PreDeployed(address) => Ok(address),
            ContractResolver::DeployFreshMock(mut factory) => factory(),
        }
    }
}

/// Addresses of the collaborators on one network, plus the mocks deployed so far.
#[derive(Debug, Clone, Default)]
pub struct DeploymentConfig {
    network: String,
    contracts: HashMap<String, Pubkey>,
    deployed_mocks: HashMap<String, Vec<Pubkey>>,
}

impl DeploymentConfig {
    pub fn new(network: &str) -> Self {
        Self {
            network: network.to_string(),
            ..Self::default()
        }
    }

    pub fn with_contract(mut self, name: &str, address: Pubkey) -> Self {
        self.contracts.insert(name.to_string(), address);
        self
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn is_local(&self) -> bool {
        LOCAL_NETWORKS.contains(&self.network.as_str())
    }

    /// Most recently deployed mock for `name`
    pub fn latest_mock(&self, name: &str) -> Option<Pubkey> {
        self.deployed_mocks
            .get(name)
            .and_then(|mocks| mocks.last().copied())
    }

    /// Picks the resolver for `name`.
    ///
    /// Local networks reuse the latest mock, or deploy one through `factory`
    /// when none exists yet. Other networks need a configured address.
    pub fn resolver_for<'a>(
        &self,
        name: &str,
        factory: MockFactory<'a>,
    ) -> Result<ContractResolver<'a>, LotteryError> {
        if self.is_local() {
            return Ok(match self.latest_mock(name) {
                Some(address) => ContractResolver::PreDeployed(address),
                None => ContractResolver::DeployFreshMock(factory),
            });
        }

        self.contracts
            .get(name)
            .copied()
            .map(ContractResolver::PreDeployed)
            .ok_or_else(|| {
                msg!("No address configured for {} on {}", name, self.network);
                LotteryError::UnknownContract
            })
    }

    /// Resolves `name`, recording any mock deployed on the way.
    pub fn resolve_contract(
        &mut self,
        name: &str,
        factory: MockFactory<'_>,
    ) -> Result<Pubkey, LotteryError> {
        let resolver = self.resolver_for(name, factory)?;
        let deploys_mock = matches!(resolver, ContractResolver::DeployFreshMock(_));
        let address = resolver.resolve()?;

        if deploys_mock {
            msg!("Deployed mock {} at {}", name, address);
            self.deployed_mocks
                .entry(name.to_string())
                .or_default()
                .push(address);
        }
        Ok(address)
    }
}
