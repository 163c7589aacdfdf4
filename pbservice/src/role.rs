use viewservice::View;

/// Part a server plays in a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Serves clients and forwards writes.
    Primary,
    /// Mirrors the primary.
    Backup,
    /// Neither.
    Idle,
}

impl Role {
    /// Role of server `me` in `view`.
    pub fn resolve(me: &str, view: &View) -> Self {
        if me.is_empty() {
            Role::Idle
        } else if me == view.primary {
            Role::Primary
        } else if me == view.backup {
            Role::Backup
        } else {
            Role::Idle
        }
    }
}
