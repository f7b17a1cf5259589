//! Operator CLI for managing users and password credentials.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use promptify_server::user::{SqliteUserStore, UserManager};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite user database file.
    pub user_db: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new user with password credentials.
    AddUser { handle: String, password: String },

    /// Replace the password of an existing user.
    SetPassword { handle: String, password: String },

    /// List all user handles.
    ListUsers,
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let user_store = Arc::new(SqliteUserStore::new(&args.user_db)?);
    let user_manager = UserManager::new(user_store);

    match args.command {
        Command::AddUser { handle, password } => {
            let user_id = user_manager.add_user(&handle)?;
            user_manager.create_password_credentials(&handle, &password)?;
            println!("Created user {} with id {}", handle, user_id);
        }
        Command::SetPassword { handle, password } => {
            user_manager.update_password_credentials(&handle, &password)?;
            println!("Updated password for user {}", handle);
        }
        Command::ListUsers => {
            for handle in user_manager.get_all_user_handles()? {
                println!("{}", handle);
            }
        }
    }

    Ok(())
}
