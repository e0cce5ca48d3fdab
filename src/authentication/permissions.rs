use crate::database::schema::UserRole;
use crate::jwt::SessionData;

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (
        UserRole::User,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSubscriptions,
        ],
    ),
    (
        UserRole::Admin,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSubscriptions,
            ActionType::ManageTags,
            ActionType::ManageIngredients,
            ActionType::ManageAllRecipes,
            ActionType::ManageUsers,
        ],
    ),
];

#[derive(Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    CreateRecipes,

    ManageOwnRecipes,
    ManageOwnFavorites,
    ManageOwnCart,
    ManageOwnSubscriptions,

    ManageUsers,
    ManageTags,
    ManageIngredients,
    ManageAllRecipes,
}

impl ActionType {
    pub fn authenticate(self, session: &SessionData) -> bool {
        let role = &session.role;

        ACTION_TABLE
            .iter()
            .find_map(|(r, actions)| {
                if role != r {
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
            username: String::from("u"),
            is_admin: role == UserRole::Admin,
            role,
        }
    }

    #[test]
    fn plain_users_manage_their_own_data_only() {
        let s = session(UserRole::User);
        assert!(ActionType::CreateRecipes.authenticate(&s));
        assert!(ActionType::ManageOwnFavorites.authenticate(&s));
        assert!(!ActionType::ManageTags.authenticate(&s));
        assert!(!ActionType::ManageIngredients.authenticate(&s));
        assert!(!ActionType::ManageAllRecipes.authenticate(&s));
    }

    #[test]
    fn admins_get_the_full_table() {
        let s = session(UserRole::Admin);
        assert!(ActionType::ManageTags.authenticate(&s));
        assert!(ActionType::ManageAllRecipes.authenticate(&s));
        assert!(ActionType::ManageUsers.authenticate(&s));
    }
}
