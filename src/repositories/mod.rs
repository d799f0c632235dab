pub mod application_repository;
pub mod group_member_repository;
pub mod group_repository;
pub mod invitation_repository;
pub mod user_repository;

// Re-export all repositories for convenient access
pub use application_repository::ApplicationRepository;
pub use group_member_repository::GroupMemberRepository;
pub use group_repository::GroupRepository;
pub use invitation_repository::InvitationRepository;
pub use user_repository::UserRepository;
