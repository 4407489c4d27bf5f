//! Interactive console over a session and a permission table.
//! Commands are parsed into `Command` and executed into output lines so the
//! REPL in `main.rs` only reads input and prints.

pub mod outputformatter;

use crate::identity::{
    Access, LoginRequest, PermissionResolver, SessionStore, SignupRequest, ACCESS_DENIED_HINT, ACCESS_DENIED_MESSAGE,
    ACCESS_DENIED_TITLE,
};
use crate::security::{PermissionTable, Role, Section};

use outputformatter::{render_credentials, render_navigation, render_permissions, render_role_matrix};

pub const HELP_TEXT: &str = "Commands:
  login <username> <password>                  sign in
  signup <username> <email> <password> [role]  create an account and sign in (role defaults to Production Coordinator)
  logout                                       sign out
  whoami                                       show the signed-in user
  nav                                          sidebar entries for the current user
  routes                                       routes the current user may open
  open <route|section>                         visit a page
  perms                                        permission table for the current user
  roles                                        role x section table
  creds                                        demo accounts
  help                                         show this help
  quit | exit                                  leave the console";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: String, password: String },
    Signup { username: String, email: String, password: String, role: String },
    Logout,
    WhoAmI,
    Nav,
    Routes,
    Open(String),
    Perms,
    Roles,
    Creds,
    Help,
    Quit,
}

/// Parse one input line. Keywords are case-insensitive; arguments are kept as typed.
/// The signup role may span several words ("Assistant Director").
pub fn parse_command(line: &str) -> Result<Command, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(first) = parts.first() else { return Err("empty command".to_string()) };
    let args = &parts[1..];
    match first.to_ascii_lowercase().as_str() {
        "login" => {
            if args.len() != 2 { return Err("usage: login <username> <password>".to_string()); }
            Ok(Command::Login { username: args[0].to_string(), password: args[1].to_string() })
        }
        "signup" => {
            if args.len() < 3 { return Err("usage: signup <username> <email> <password> [role]".to_string()); }
            let role = if args.len() > 3 { args[3..].join(" ") } else { Role::ProductionCoordinator.as_str().to_string() };
            Ok(Command::Signup {
                username: args[0].to_string(),
                email: args[1].to_string(),
                password: args[2].to_string(),
                role,
            })
        }
        "open" => {
            if args.len() != 1 { return Err("usage: open <route|section>".to_string()); }
            Ok(Command::Open(args[0].to_string()))
        }
        kw if !args.is_empty() => Err(format!("'{}' takes no arguments", kw)),
        "logout" => Ok(Command::Logout),
        "whoami" => Ok(Command::WhoAmI),
        "nav" => Ok(Command::Nav),
        "routes" => Ok(Command::Routes),
        "perms" => Ok(Command::Perms),
        "roles" => Ok(Command::Roles),
        "creds" => Ok(Command::Creds),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command '{}'; type 'help'", other)),
    }
}

pub struct Console<'a> {
    session: &'a mut SessionStore,
    table: &'a PermissionTable,
}

impl<'a> Console<'a> {
    pub fn new(session: &'a mut SessionStore, table: &'a PermissionTable) -> Self { Self { session, table } }

    pub fn prompt(&self) -> String {
        match self.session.current_user() {
            Some(id) => format!("{}> ", id.username),
            None => "> ".to_string(),
        }
    }

    /// Run a command and return the lines to print. `Quit` yields nothing; the caller ends the loop.
    pub fn execute(&mut self, cmd: Command) -> Vec<String> {
        match cmd {
            Command::Login { username, password } => {
                let req = LoginRequest { username, password };
                match self.session.authenticate(&req) {
                    Ok(id) => vec![format!("Welcome, {} ({})", id.username, id.role)],
                    Err(e) => vec![e.user_facing().to_string()],
                }
            }
            Command::Signup { username, email, password, role } => {
                let req = SignupRequest { username, email, password, role };
                match self.session.register(&req) {
                    Ok(id) => vec![format!("Account created. Signed in as {} ({})", id.username, id.role)],
                    Err(e) => vec![e.user_facing().to_string()],
                }
            }
            Command::Logout => {
                let was = self.session.is_authenticated();
                self.session.logout();
                vec![if was { "Signed out".to_string() } else { "not signed in".to_string() }]
            }
            Command::WhoAmI => match self.session.current_user() {
                Some(id) => vec![format!("{} <{}> {}", id.username, id.email, id.role)],
                None => vec!["not signed in".to_string()],
            },
            Command::Nav => {
                let items = self.resolver().navigation();
                if items.is_empty() { return vec!["no sections available".to_string()]; }
                render_navigation(&items)
            }
            Command::Routes => {
                let routes = self.resolver().accessible_routes();
                if routes.is_empty() { return vec!["no sections available".to_string()]; }
                routes.into_iter().map(|r| r.to_string()).collect()
            }
            Command::Open(target) => self.open(&target),
            Command::Perms => match self.resolver().user_permissions() {
                Some(set) => render_permissions(&set),
                None => vec!["no permissions".to_string()],
            },
            Command::Roles => render_role_matrix(self.table),
            Command::Creds => render_credentials(self.session.test_credentials()),
            Command::Help => HELP_TEXT.lines().map(|l| l.to_string()).collect(),
            Command::Quit => Vec::new(),
        }
    }

    fn resolver(&self) -> PermissionResolver<'_> { PermissionResolver::new(&*self.session, self.table) }

    fn open(&self, target: &str) -> Vec<String> {
        let resolver = self.resolver();
        let access = match Section::from_key(target) {
            Some(section) => resolver.guard(section),
            None => resolver.guard_route(target),
        };
        match access {
            Access::Granted(section) => vec![format!("[{}] {}", section.label(), section.route())],
            Access::Denied(_) => vec![
                ACCESS_DENIED_TITLE.to_string(),
                ACCESS_DENIED_MESSAGE.to_string(),
                ACCESS_DENIED_HINT.to_string(),
            ],
            Access::NotFound => vec![format!("no such page: {}", target)],
        }
    }
}
