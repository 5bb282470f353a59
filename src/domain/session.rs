//! Caller identity as supplied by the external identity provider.

text_enum! {
    pub enum Role as "role" {
        Client => "client",
        Waiter => "waiter",
        Cook => "cook",
        EstablishmentAdmin => "establishment_admin",
        GeneralAdmin => "general_admin",
    }
}

impl Role {
    /// Staff roles are bound to a single establishment.
    pub fn is_establishment_staff(self) -> bool {
        matches!(
            self,
            Role::Waiter | Role::Cook | Role::EstablishmentAdmin
        )
    }

    pub fn may_transition_orders(self) -> bool {
        self != Role::Client
    }
}

/// Already-authenticated caller, passed explicitly into every core operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: i32,
    pub role: Role,
    pub establishment_id: Option<i32>,
}

impl SessionContext {
    pub fn new(user_id: i32, role: Role, establishment_id: Option<i32>) -> Self {
        Self {
            user_id,
            role,
            establishment_id,
        }
    }

    pub fn client(user_id: i32) -> Self {
        Self::new(user_id, Role::Client, None)
    }

    pub fn staff(user_id: i32, role: Role, establishment_id: i32) -> Self {
        Self::new(user_id, role, Some(establishment_id))
    }

    /// Label used in generated history notes, e.g. `cook #7`.
    pub fn actor_label(&self) -> String {
        format!("{} #{}", self.role, self.user_id)
    }
}
