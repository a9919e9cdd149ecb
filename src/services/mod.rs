//! Business logic services

pub mod catalog;
pub mod loans;
pub mod members;
pub mod reports;

use crate::{config::LoansConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub members: members::MembersService,
    pub loans: loans::LoansService,
    pub reports: reports::ReportsService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository and loan policy
    pub fn new(repository: Repository, loans_config: &LoansConfig) -> Self {
        let loans = loans::LoansService::new(repository.clone(), loans_config);
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            members: members::MembersService::new(repository.clone()),
            reports: reports::ReportsService::new(repository.clone(), loans.clone()),
            loans,
            repository,
        }
    }
}
