use bunksmart_core::storage::session;
use bunksmart_core::{Database, UserId};
use clap::Subcommand;

use super::{open_engine, CliResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Sign in as a user, creating an empty document on first use
    Login {
        /// User id issued by the identity provider
        user: String,
    },
    /// Forget the signed-in user
    Logout,
    /// Print the signed-in user
    Whoami,
}

pub async fn run(action: AuthAction) -> CliResult {
    let db = Database::open()?;

    match action {
        AuthAction::Login { user } => {
            let user = UserId::new(user)?;
            let mut engine = open_engine().await?;
            engine.sign_in(user.clone()).await?;
            session::sign_in(&db, &user)?;
            println!("signed in as {user}");
        }
        AuthAction::Logout => {
            match session::current_user(&db)? {
                Some(user) => {
                    session::sign_out(&db)?;
                    println!("signed out {user}");
                }
                None => println!("not signed in"),
            }
        }
        AuthAction::Whoami => match session::current_user(&db)? {
            Some(user) => println!("{user}"),
            None => println!("not signed in"),
        },
    }
    Ok(())
}
