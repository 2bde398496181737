//! Interactive terminal menu.
//!
//! The logged-in state is an explicit [`Session`] owned by the menu loop.
//! Every todo action re-resolves the session token through the access gate
//! and uses the resolved user id.

use std::io::{BufRead, Write};

use chrono::Duration;
use sqlx::PgPool;
use todo_core::auth::{AuthError, gate, session as auth};
use todo_core::models::auth::User;
use todo_core::models::todo::{Todo, TodoFilter};
use todo_core::todos::{self, TodoError};

use crate::Result;

const RULE_WIDTH: usize = 50;

/// A logged-in terminal session.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub token: String,
}

/// Todo actions that need a resolved user.
enum Action {
    Add,
    Show(TodoFilter),
    Toggle,
    Delete,
}

/// What the loop does after handling one menu choice.
enum Step {
    Stay(Option<Session>),
    Exit,
}

pub struct Menu<'a, R, W> {
    pool: &'a PgPool,
    token_ttl: Duration,
    input: R,
    out: W,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(pool: &'a PgPool, token_ttl: Duration, input: R, out: W) -> Self {
        Self {
            pool,
            token_ttl,
            input,
            out,
        }
    }

    /// Run until the user exits or input ends.
    pub async fn run(&mut self) -> Result<()> {
        let mut current: Option<Session> = None;
        loop {
            let step = match current.take() {
                None => self.auth_menu().await?,
                Some(session) => self.main_menu(session).await?,
            };
            match step {
                Step::Stay(next) => current = next,
                Step::Exit => return Ok(()),
            }
        }
    }

    async fn auth_menu(&mut self) -> Result<Step> {
        writeln!(self.out, "\n=== Welcome to Todo App ===")?;
        writeln!(self.out, "1. Login")?;
        writeln!(self.out, "2. Register")?;
        writeln!(self.out, "0. Exit")?;

        let Some(choice) = self.prompt("Select option: ")? else {
            return self.goodbye(None).await;
        };

        match choice.as_str() {
            "1" => self.login().await,
            "2" => {
                self.register().await?;
                Ok(Step::Stay(None))
            }
            "0" => self.goodbye(None).await,
            _ => {
                writeln!(self.out, "Invalid option")?;
                Ok(Step::Stay(None))
            }
        }
    }

    async fn login(&mut self) -> Result<Step> {
        let Some(username) = self.prompt("Username: ")? else {
            return self.goodbye(None).await;
        };
        let Some(password) = self.prompt("Password: ")? else {
            return self.goodbye(None).await;
        };

        match auth::login(self.pool, &username, &password, self.token_ttl).await {
            Ok((user, token)) => {
                writeln!(self.out, "\nLogin successful")?;
                Ok(Step::Stay(Some(Session {
                    username: user.username,
                    token: token.token,
                })))
            }
            Err(AuthError::InvalidCredential) => {
                writeln!(self.out, "\nInvalid username or password")?;
                Ok(Step::Stay(None))
            }
            Err(e) => {
                self.report(&e)?;
                Ok(Step::Stay(None))
            }
        }
    }

    async fn register(&mut self) -> Result<()> {
        let Some(username) = self.prompt("Choose username: ")? else {
            return Ok(());
        };
        let Some(password) = self.prompt("Choose password: ")? else {
            return Ok(());
        };

        match auth::register(self.pool, &username, &password).await {
            Ok(_) => writeln!(self.out, "\nRegistration successful")?,
            Err(AuthError::DuplicateUsername) => writeln!(self.out, "\nUsername already exists")?,
            Err(AuthError::Validation(msg)) => writeln!(self.out, "\n{msg}")?,
            Err(e) => self.report(&e)?,
        }
        Ok(())
    }

    async fn main_menu(&mut self, session: Session) -> Result<Step> {
        writeln!(self.out, "\n=== Todo Menu ({}) ===", session.username)?;
        writeln!(self.out, "1. Add task")?;
        writeln!(self.out, "2. Show all tasks")?;
        writeln!(self.out, "3. Show completed tasks")?;
        writeln!(self.out, "4. Toggle task status")?;
        writeln!(self.out, "5. Delete task")?;
        writeln!(self.out, "9. Logout")?;
        writeln!(self.out, "0. Exit")?;

        let Some(choice) = self.prompt("Select option: ")? else {
            return self.goodbye(Some(session)).await;
        };

        let action = match choice.as_str() {
            "1" => Action::Add,
            "2" => Action::Show(TodoFilter::All),
            "3" => Action::Show(TodoFilter::Completed),
            "4" => Action::Toggle,
            "5" => Action::Delete,
            "9" => return self.logout(session).await,
            "0" => return self.goodbye(Some(session)).await,
            _ => {
                writeln!(self.out, "Invalid option")?;
                return Ok(Step::Stay(Some(session)));
            }
        };

        let user = match gate::authenticate(self.pool, Some(&session.token)).await {
            Ok(user) => user,
            Err(AuthError::InvalidCredential | AuthError::Expired) => {
                writeln!(self.out, "Session expired, please log in again")?;
                return Ok(Step::Stay(None));
            }
            Err(e) => {
                self.report(&e)?;
                return Ok(Step::Stay(Some(session)));
            }
        };

        match action {
            Action::Add => self.add_task(&user).await?,
            Action::Show(filter) => self.show_tasks(&user, filter).await?,
            Action::Toggle => self.toggle_task(&user).await?,
            Action::Delete => self.delete_task(&user).await?,
        }
        Ok(Step::Stay(Some(session)))
    }

    /// Revoke the session token and return to the auth menu.
    async fn logout(&mut self, session: Session) -> Result<Step> {
        match auth::logout(self.pool, &session.token).await {
            Ok(()) => writeln!(self.out, "Logged out successfully")?,
            Err(e) => self.report(&e)?,
        }
        Ok(Step::Stay(None))
    }

    async fn add_task(&mut self, user: &User) -> Result<()> {
        let Some(task) = self.prompt("Enter task description: ")? else {
            return Ok(());
        };
        match todos::create_todo(self.pool, user.id, &task).await {
            Ok(_) => writeln!(self.out, "Task added successfully")?,
            Err(TodoError::Validation(msg)) => writeln!(self.out, "{msg}")?,
            Err(e) => self.report(&e)?,
        }
        Ok(())
    }

    async fn show_tasks(&mut self, user: &User, filter: TodoFilter) -> Result<()> {
        match todos::list_todos(self.pool, user.id, filter).await {
            Ok(tasks) => print_tasks(&mut self.out, &tasks)?,
            Err(e) => self.report(&e)?,
        }
        Ok(())
    }

    async fn toggle_task(&mut self, user: &User) -> Result<()> {
        let Some(id) = self.prompt_id("Enter task ID to toggle: ")? else {
            return Ok(());
        };
        match todos::toggle_todo(self.pool, user.id, id).await {
            Ok(_) => writeln!(self.out, "Task status updated")?,
            Err(TodoError::NotFound) => writeln!(self.out, "Task not found")?,
            Err(e) => self.report(&e)?,
        }
        Ok(())
    }

    async fn delete_task(&mut self, user: &User) -> Result<()> {
        let Some(id) = self.prompt_id("Enter task ID to delete: ")? else {
            return Ok(());
        };
        match todos::delete_todo(self.pool, user.id, id).await {
            Ok(()) => writeln!(self.out, "Task deleted")?,
            Err(TodoError::NotFound) => writeln!(self.out, "Task not found")?,
            Err(e) => self.report(&e)?,
        }
        Ok(())
    }

    /// Say goodbye, revoking the session token if there is one.
    async fn goodbye(&mut self, session: Option<Session>) -> Result<Step> {
        if let Some(session) = session
            && let Err(e) = auth::logout(self.pool, &session.token).await
        {
            log::warn!("could not revoke session token: {e}");
        }
        writeln!(self.out, "Goodbye!")?;
        Ok(Step::Exit)
    }

    /// Print `label`, read one line. `None` at end of input.
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.out, "{label}")?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Prompt for a numeric id. Prints `Invalid input` and yields `None` if
    /// the answer is not a number.
    fn prompt_id(&mut self, label: &str) -> Result<Option<i32>> {
        let Some(answer) = self.prompt(label)? else {
            return Ok(None);
        };
        match answer.trim().parse::<i32>() {
            Ok(id) => Ok(Some(id)),
            Err(_) => {
                writeln!(self.out, "Invalid input")?;
                Ok(None)
            }
        }
    }

    fn report(&mut self, e: &dyn std::error::Error) -> Result<()> {
        log::error!("{e}");
        writeln!(self.out, "Error: {e}")?;
        Ok(())
    }
}

/// Render tasks as an `ID | Status | Task` table.
pub fn print_tasks(out: &mut impl Write, tasks: &[Todo]) -> std::io::Result<()> {
    if tasks.is_empty() {
        return writeln!(out, "\nNo tasks found.");
    }

    let rule = "-".repeat(RULE_WIDTH);
    writeln!(out, "\nYour Tasks:")?;
    writeln!(out, "{rule}")?;
    writeln!(out, "{:<5} | {:<10} | Task", "ID", "Status")?;
    writeln!(out, "{rule}")?;
    for todo in tasks {
        let status = if todo.is_completed { "[x]" } else { "[ ]" };
        writeln!(out, "{:<5} | {:<10} | {}", todo.id, status, todo.task)?;
    }
    writeln!(out, "{rule}")
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use todo_core::auth::tokens;
    use todo_core::db::DbManager;

    use super::*;

    fn todo(id: i32, task: &str, done: bool) -> Todo {
        Todo {
            id,
            user_id: 1,
            task: task.to_string(),
            is_completed: done,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn prints_empty_table() {
        let mut out = Vec::new();
        print_tasks(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\nNo tasks found.\n");
    }

    #[test]
    fn prints_task_rows() {
        let mut out = Vec::new();
        print_tasks(&mut out, &[todo(1, "buy milk", false), todo(12, "call mom", true)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("ID    | Status     | Task"));
        assert!(text.contains("1     | [ ]        | buy milk"));
        assert!(text.contains("12    | [x]        | call mom"));
    }

    async fn run_script(pool: &PgPool, ttl: Duration, script: &str) -> String {
        let mut out = Vec::new();
        Menu::new(pool, ttl, Cursor::new(script.as_bytes()), &mut out)
            .run()
            .await
            .expect("menu run");
        String::from_utf8(out).unwrap()
    }

    async fn start_db() -> (DbManager, PgPool) {
        let mut mgr = DbManager::ephemeral().await.expect("DbManager::ephemeral");
        mgr.setup().await.expect("db setup");
        mgr.start().await.expect("db start");
        let pool = mgr.connect_migrated().await.expect("connect + migrate");
        (mgr, pool)
    }

    #[tokio::test]
    async fn register_login_and_manage_tasks() {
        let (mut mgr, pool) = start_db().await;

        let script = "\
2\nalice\npw123\n\
1\nalice\npw123\n\
2\n\
1\nbuy milk\n\
1\n   \n\
4\n1\n\
3\n\
4\nabc\n\
5\n1\n\
2\n\
9\n\
0\n";
        let out = run_script(&pool, tokens::default_ttl(), script).await;

        assert!(out.contains("Registration successful"));
        assert!(out.contains("Login successful"));
        assert!(out.contains("=== Todo Menu (alice) ==="));
        assert!(out.contains("Task added successfully"));
        assert!(out.contains("Task cannot be empty"));
        assert!(out.contains("Task status updated"));
        assert!(out.contains("1     | [x]        | buy milk"));
        assert!(out.contains("Invalid input"));
        assert!(out.contains("Task deleted"));
        assert!(out.contains("Logged out successfully"));
        assert!(out.ends_with("Goodbye!\n"));

        // Logout revoked the session token.
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM auth_tokens")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);

        pool.close().await;
        mgr.stop().await.unwrap();
    }

    #[tokio::test]
    async fn bad_login_and_duplicate_register() {
        let (mut mgr, pool) = start_db().await;
        auth::register(&pool, "alice", "pw123").await.unwrap();

        let script = "2\nalice\nother\n1\nalice\nwrong\n1\nbob\npw123\n7\n0\n";
        let out = run_script(&pool, tokens::default_ttl(), script).await;

        assert!(out.contains("Username already exists"));
        assert_eq!(out.matches("Invalid username or password").count(), 2);
        assert!(out.contains("Invalid option"));
        assert!(!out.contains("Login successful"));

        pool.close().await;
        mgr.stop().await.unwrap();
    }

    #[tokio::test]
    async fn cannot_touch_other_users_tasks() {
        let (mut mgr, pool) = start_db().await;
        let bob = auth::register(&pool, "bob", "pw456").await.unwrap();
        let bobs = todos::create_todo(&pool, bob.id, "bob's task").await.unwrap();
        auth::register(&pool, "alice", "pw123").await.unwrap();

        let script = format!("1\nalice\npw123\n4\n{id}\n5\n{id}\n2\n0\n", id = bobs.id);
        let out = run_script(&pool, tokens::default_ttl(), &script).await;

        assert_eq!(out.matches("Task not found").count(), 2);
        assert!(out.contains("No tasks found."));
        let still = todos::get_todo(&pool, bob.id, bobs.id).await.unwrap();
        assert_eq!(still, bobs);

        pool.close().await;
        mgr.stop().await.unwrap();
    }

    #[tokio::test]
    async fn expired_session_returns_to_login() {
        let (mut mgr, pool) = start_db().await;
        auth::register(&pool, "alice", "pw123").await.unwrap();

        // Zero TTL: the token is expired by the first action.
        let script = "1\nalice\npw123\n2\n0\n";
        let out = run_script(&pool, Duration::zero(), script).await;

        assert!(out.contains("Login successful"));
        assert!(out.contains("Session expired, please log in again"));
        assert_eq!(out.matches("=== Welcome to Todo App ===").count(), 2);

        pool.close().await;
        mgr.stop().await.unwrap();
    }

    #[tokio::test]
    async fn failed_logout_is_reported_and_menu_continues() {
        let (mut mgr, pool) = start_db().await;
        auth::register(&pool, "alice", "pw123").await.unwrap();

        // Make token deletion fail while issuance and validation still work.
        sqlx::query(
            "CREATE FUNCTION refuse_token_delete() RETURNS trigger LANGUAGE plpgsql AS \
             $$ BEGIN RAISE EXCEPTION 'token store read-only'; END $$",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "CREATE TRIGGER refuse_token_delete BEFORE DELETE ON auth_tokens \
             FOR EACH ROW EXECUTE FUNCTION refuse_token_delete()",
        )
        .execute(&pool)
        .await
        .unwrap();

        let script = "1\nalice\npw123\n9\n0\n";
        let out = run_script(&pool, tokens::default_ttl(), script).await;

        assert!(out.contains("Login successful"));
        assert!(out.contains("Error: "));
        assert!(out.contains("token store read-only"));
        assert!(!out.contains("Logged out successfully"));
        assert_eq!(out.matches("=== Welcome to Todo App ===").count(), 2);
        assert!(out.ends_with("Goodbye!\n"));

        pool.close().await;
        mgr.stop().await.unwrap();
    }

    #[tokio::test]
    async fn end_of_input_exits() {
        let (mut mgr, pool) = start_db().await;

        let out = run_script(&pool, tokens::default_ttl(), "").await;
        assert!(out.ends_with("Goodbye!\n"));

        pool.close().await;
        mgr.stop().await.unwrap();
    }
}
