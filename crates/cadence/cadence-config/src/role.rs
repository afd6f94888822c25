use serde::Deserialize;
use std::fmt;

// Participant identities coordinated by the phase barrier.
// One publisher feeds the hub; A, B and C are independent subscribers.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Publisher,
    A,
    B,
    C,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Publisher, Role::A, Role::B, Role::C];
    pub const SUBSCRIBERS: [Role; 3] = [Role::A, Role::B, Role::C];

    /// Name used as the `worker` field in log lines.
    pub fn label(self) -> &'static str {
        match self {
            Role::Publisher => "APP_PUB",
            Role::A => "APP_SUB_A",
            Role::B => "APP_SUB_B",
            Role::C => "APP_SUB_C",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
