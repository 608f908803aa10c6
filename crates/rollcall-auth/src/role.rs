use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identity class carried in a session token.
///
/// `Principal` accounts live in their own table; `Teacher` and `Student`
/// are the two roles a user record can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Role {
    Principal,
    Teacher,
    Student,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Principal => "Principal",
            Role::Teacher => "Teacher",
            Role::Student => "Student",
        };
        f.write_str(name)
    }
}

/// Returns true when `role` is one of `allowed`.
pub fn is_authorized(role: Role, allowed: &[Role]) -> bool {
    allowed.contains(&role)
}
