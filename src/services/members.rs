//! Member directory service

use crate::{
    error::AppResult,
    models::member::{CreateMember, Member, MemberQuery, UpdateMember},
    repository::Repository,
};

#[derive(Clone)]
pub struct MembersService {
    repository: Repository,
}

impl MembersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search the member directory
    pub async fn search_members(&self, query: &MemberQuery) -> AppResult<(Vec<Member>, i64)> {
        self.repository.members.list(query).await
    }

    /// Get a member with loan counters
    pub async fn get_member(&self, id: i32) -> AppResult<Member> {
        self.repository.members.get_details(id).await
    }

    /// Register a new member
    pub async fn create_member(&self, member: &CreateMember) -> AppResult<Member> {
        self.repository.members.create(member).await
    }

    /// Update a member's record
    pub async fn update_member(&self, id: i32, update: &UpdateMember) -> AppResult<Member> {
        self.repository.members.update(id, update).await
    }

    /// Remove a member, refused while they hold open loans
    pub async fn delete_member(&self, id: i32) -> AppResult<()> {
        self.repository.members.delete(id).await
    }
}
