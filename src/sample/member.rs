use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Basic,
    Vip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: u64,
    pub name: String,
    pub grade: Grade,
}

impl Member {
    pub fn new(id: u64, name: impl Into<String>, grade: Grade) -> Self {
        Self {
            id,
            name: name.into(),
            grade,
        }
    }
}

pub trait MemberRepository: Send + Sync {
    fn save(&self, member: Member);
    fn find_by_id(&self, id: u64) -> Option<Member>;
}

/// In-memory repository; the default storage of the sample app.
#[derive(Debug, Default)]
pub struct MemoryMemberRepository {
    store: RwLock<HashMap<u64, Member>>,
}

impl MemoryMemberRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemberRepository for MemoryMemberRepository {
    fn save(&self, member: Member) {
        self.store.write().insert(member.id, member);
    }

    fn find_by_id(&self, id: u64) -> Option<Member> {
        self.store.read().get(&id).cloned()
    }
}

pub trait MemberService: Send + Sync {
    fn join(&self, member: Member);
    fn find_member(&self, id: u64) -> Option<Member>;
}

pub struct MemberServiceImpl {
    repository: Arc<dyn MemberRepository>,
}

impl MemberServiceImpl {
    pub fn new(repository: Arc<dyn MemberRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<dyn MemberRepository> {
        &self.repository
    }
}

impl MemberService for MemberServiceImpl {
    fn join(&self, member: Member) {
        self.repository.save(member);
    }

    fn find_member(&self, id: u64) -> Option<Member> {
        self.repository.find_by_id(id)
    }
}
