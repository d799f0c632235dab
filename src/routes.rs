//! Named routes and their paths.
//!
//! Views redirect to a `Route`; the HTTP layer and notification links turn
//! it into a path under the group kind's slug.

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Route {
    GroupList,
    GroupDetail { group_id: Uuid },
    GroupJoined { group_id: Uuid },
    LeaveGroup { group_id: Uuid },
    DeleteGroup { group_id: Uuid },
    DeleteGroupDone,
    ValidateEmailInvitation { group_id: Uuid, key: String },
    AcceptInvitation { group_id: Uuid, key: String },
}

impl Route {
    /// Path of the route for the group kind `slug`
    pub fn path(&self, slug: &str) -> String {
        match self {
            Route::GroupList => format!("/groups/{}/", slug),
            Route::GroupDetail { group_id } => format!("/groups/{}/{}/", slug, group_id),
            Route::GroupJoined { group_id } => format!("/groups/{}/{}/joined/", slug, group_id),
            Route::LeaveGroup { group_id } => format!("/groups/{}/{}/leave/", slug, group_id),
            Route::DeleteGroup { group_id } => format!("/groups/{}/{}/delete/", slug, group_id),
            Route::DeleteGroupDone => format!("/groups/{}/deleted/", slug),
            Route::ValidateEmailInvitation { group_id, key } => {
                format!("/groups/{}/{}/invite/{}/", slug, group_id, key)
            }
            Route::AcceptInvitation { group_id, key } => {
                format!("/groups/{}/{}/invitation/{}/", slug, group_id, key)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let id = Uuid::nil();
        assert_eq!(Route::GroupList.path("teams"), "/groups/teams/");
        assert_eq!(
            Route::GroupDetail { group_id: id }.path("groups"),
            format!("/groups/groups/{}/", id)
        );
        assert_eq!(Route::DeleteGroupDone.path("groups"), "/groups/groups/deleted/");
        assert_eq!(
            Route::ValidateEmailInvitation {
                group_id: id,
                key: "abc".into()
            }
            .path("groups"),
            format!("/groups/groups/{}/invite/abc/", id)
        );
    }
}
