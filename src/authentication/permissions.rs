use crate::database::schema::UserRole;

use super::jwt::SessionData;

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (
        UserRole::User,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnRelations,
        ],
    ),
    (
        UserRole::Admin,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnRelations,
            ActionType::ManageAllRecipes,
            ActionType::ManageTags,
            ActionType::ManageIngredients,
            ActionType::ManageUsers,
        ],
    ),
];

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    CreateRecipes,

    ManageOwnRecipes,
    ManageOwnRelations,

    ManageUsers,
    ManageAllRecipes,
    ManageTags,
    ManageIngredients,
}

impl ActionType {
    pub fn authenticate(self, session: &SessionData) -> bool {
        let role = &session.role;

        ACTION_TABLE
            .iter()
            .find_map(|(table_role, actions)| {
                if role != table_role {
                    return None;
                }

                Some(actions.contains(&self))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: UserRole) -> SessionData {
        SessionData {
            user_id: 1,
            username: String::from("chef"),
            is_admin: role == UserRole::Admin,
            role,
        }
    }

    #[test]
    fn users_manage_their_own_things_only() {
        let session = session(UserRole::User);
        assert!(ActionType::CreateRecipes.authenticate(&session));
        assert!(ActionType::ManageOwnRecipes.authenticate(&session));
        assert!(ActionType::ManageOwnRelations.authenticate(&session));

        assert!(!ActionType::ManageAllRecipes.authenticate(&session));
        assert!(!ActionType::ManageTags.authenticate(&session));
        assert!(!ActionType::ManageUsers.authenticate(&session));
    }

    #[test]
    fn admins_manage_everything() {
        let session = session(UserRole::Admin);
        assert!(ActionType::ManageAllRecipes.authenticate(&session));
        assert!(ActionType::ManageTags.authenticate(&session));
        assert!(ActionType::ManageIngredients.authenticate(&session));
        assert!(ActionType::ManageUsers.authenticate(&session));
    }
}
