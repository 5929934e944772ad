use crate::builtin::BuiltinCommand;
use crate::command::{Rejected, Reply};
use crate::env::Environment;
use crate::store::{Privilege, User};
use argh::FromArgs;

#[derive(FromArgs)]
/// Create a customer account. Anyone may register.
pub struct Register {
    #[argh(positional)]
    /// new user id; must not be taken.
    pub id: String,
    #[argh(positional)]
    /// password for the new account.
    pub password: String,
    #[argh(positional)]
    /// display name.
    pub name: String,
}

impl BuiltinCommand for Register {
    fn name() -> &'static str {
        "register"
    }

    fn execute(self, env: &mut Environment) -> Result<Reply, Rejected> {
        env.store_mut()
            .add_user(User::new(self.id, self.password, self.name, Privilege::Customer))?;
        Ok(Reply::new())
    }
}

#[derive(FromArgs)]
/// Change a password, either by proving the old one or as administrator.
pub struct Passwd {
    #[argh(positional)]
    /// account whose password changes.
    pub id: String,
    #[argh(positional)]
    /// the current password, or the new one when it is the last argument.
    pub first: String,
    #[argh(positional)]
    /// the new password when the current one is given first.
    pub second: Option<String>,
}

impl BuiltinCommand for Passwd {
    fn name() -> &'static str {
        "passwd"
    }

    fn execute(self, env: &mut Environment) -> Result<Reply, Rejected> {
        let user = env.store().user(&self.id).ok_or(Rejected::Missing("user"))?;
        let new_password = match self.second {
            Some(new_password) => {
                if user.password != self.first {
                    return Err(Rejected::Precondition("password mismatch"));
                }
                new_password
            }
            None => {
                env.require_admin()?;
                self.first
            }
        };
        env.store_mut().set_password(&self.id, &new_password)?;
        Ok(Reply::new())
    }
}

#[derive(FromArgs)]
/// Create an account with a privilege below the caller's.
pub struct UserAdd {
    #[argh(positional)]
    /// new user id; must not be taken.
    pub id: String,
    #[argh(positional)]
    /// password for the new account.
    pub password: String,
    #[argh(positional)]
    /// privilege level: 1, 3 or 7.
    pub privilege: u8,
    #[argh(positional)]
    /// display name.
    pub name: String,
}

impl BuiltinCommand for UserAdd {
    fn name() -> &'static str {
        "useradd"
    }

    fn execute(self, env: &mut Environment) -> Result<Reply, Rejected> {
        env.require_at_least(Privilege::Staff)?;
        let privilege = Privilege::try_from(self.privilege)?;
        if privilege >= env.current_privilege() {
            return Err(Rejected::Privilege);
        }
        env.store_mut()
            .add_user(User::new(self.id, self.password, self.name, privilege))?;
        Ok(Reply::new())
    }
}

#[derive(FromArgs)]
/// Remove an account that is not logged in anywhere on the stack.
pub struct Delete {
    #[argh(positional)]
    /// account to remove.
    pub id: String,
}

impl BuiltinCommand for Delete {
    fn name() -> &'static str {
        "delete"
    }

    fn execute(self, env: &mut Environment) -> Result<Reply, Rejected> {
        env.require_admin()?;
        if env.store().user(&self.id).is_none() {
            return Err(Rejected::Missing("user"));
        }
        if env.sessions().contains(&self.id) {
            return Err(Rejected::Precondition("user is logged in"));
        }
        env.store_mut().remove_user(&self.id)?;
        Ok(Reply::new())
    }
}

#[derive(FromArgs)]
/// Log in on top of the current session.
/// The password may be omitted when the current session outranks the target.
pub struct Su {
    #[argh(positional)]
    /// account to switch to.
    pub id: String,
    #[argh(positional)]
    /// its password.
    pub password: Option<String>,
}

impl BuiltinCommand for Su {
    fn name() -> &'static str {
        "su"
    }

    fn execute(self, env: &mut Environment) -> Result<Reply, Rejected> {
        env.login(&self.id, self.password.as_deref())?;
        Ok(Reply::new())
    }
}

#[derive(FromArgs)]
/// Return to the previous session.
pub struct Logout {}

impl BuiltinCommand for Logout {
    fn name() -> &'static str {
        "logout"
    }

    fn execute(self, env: &mut Environment) -> Result<Reply, Rejected> {
        env.logout()?;
        Ok(Reply::new())
    }
}
