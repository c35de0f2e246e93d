//! Field-level checks on request input, applied before anything reaches the repositories.
//!
//! Each check trims its input and returns the trimmed value; every violation
//! found is reported, not just the first.

use serde_json::Value;
use todo_model::{CreateTask, TaskFilter, TaskQuery, UpdateTask};

use crate::error::ApiError;

const TITLE_LEN: (usize, usize) = (3, 100);
const DESCRIPTION_LEN: (usize, usize) = (3, 500);
const SEARCH_LEN: (usize, usize) = (1, 100);
const NAME_LEN: (usize, usize) = (2, 50);
const MIN_PASSWORD_LEN: usize = 6;

/// Collects violations while a request is being checked.
#[derive(Default)]
struct Violations(Vec<String>);

impl Violations {
    fn push(&mut self, msg: &str) {
        self.0.push(msg.to_string());
    }

    fn finish<T>(self, value: T) -> Result<T, ApiError> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(ApiError::InvalidRequest(format!(
                "Validation failed: {}",
                self.0.join(", ")
            )))
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn within(s: &str, (min, max): (usize, usize)) -> bool {
    (min..=max).contains(&char_len(s))
}

/// Trimmed required text field.
fn required(
    v: &mut Violations,
    value: Option<String>,
    bounds: (usize, usize),
    missing: &str,
    length: &str,
) -> String {
    let value = value.map(|s| s.trim().to_string()).unwrap_or_default();
    if value.is_empty() {
        v.push(missing);
        v.push(length);
    } else if !within(&value, bounds) {
        v.push(length);
    }
    value
}

/// Trimmed optional text field that must be within bounds when present.
fn optional(
    v: &mut Violations,
    value: Option<String>,
    bounds: (usize, usize),
    length: &str,
) -> Option<String> {
    let value = value.map(|s| s.trim().to_string())?;
    if !within(&value, bounds) {
        v.push(length);
    }
    Some(value)
}

pub(crate) fn create_task(
    title: Option<String>,
    description: Option<String>,
    user_id: Option<String>,
) -> Result<CreateTask, ApiError> {
    let mut v = Violations::default();
    let title = required(
        &mut v,
        title,
        TITLE_LEN,
        "Title is required",
        "Title must be between 3 and 100 characters",
    );
    let description = required(
        &mut v,
        description,
        DESCRIPTION_LEN,
        "Description is required",
        "Description must be between 3 and 500 characters",
    );
    let user_id = optional(
        &mut v,
        user_id,
        (1, usize::MAX),
        "User ID must not be empty if provided",
    );

    v.finish(CreateTask {
        title,
        description,
        user_id,
    })
}

/// Optional text field given as raw JSON; anything but a string is a violation.
fn optional_text(
    v: &mut Violations,
    value: Option<Value>,
    bounds: (usize, usize),
    length: &str,
) -> Option<String> {
    match value? {
        Value::String(s) => optional(v, Some(s), bounds, length),
        _ => {
            v.push(length);
            None
        }
    }
}

/// Fields arrive as raw JSON so an explicit `null` is told apart from an absent field.
pub(crate) fn update_task(
    title: Option<Value>,
    description: Option<Value>,
    completed: Option<Value>,
) -> Result<UpdateTask, ApiError> {
    let mut v = Violations::default();
    let title = optional_text(
        &mut v,
        title,
        TITLE_LEN,
        "Title must be between 3 and 100 characters",
    );
    let description = optional_text(
        &mut v,
        description,
        DESCRIPTION_LEN,
        "Description must be between 3 and 500 characters",
    );
    let completed = match completed {
        None => None,
        Some(Value::Bool(b)) => Some(b),
        Some(_) => {
            v.push("Completed must be a boolean");
            None
        }
    };

    v.finish(UpdateTask {
        title,
        description,
        completed,
    })
}

pub(crate) fn task_query(
    filter: Option<String>,
    search: Option<String>,
    user_id: Option<String>,
) -> Result<TaskQuery, ApiError> {
    let mut v = Violations::default();
    let filter = match filter.as_deref().map(str::parse::<TaskFilter>) {
        None => None,
        Some(Ok(f)) => Some(f),
        Some(Err(_)) => {
            v.push("Filter must be one of: all, pending, completed");
            None
        }
    };
    let search = optional(
        &mut v,
        search,
        SEARCH_LEN,
        "Search query must be between 1 and 100 characters",
    );
    let user_id = optional(
        &mut v,
        user_id,
        (1, usize::MAX),
        "User ID must not be empty if provided",
    );

    v.finish(TaskQuery {
        filter,
        search,
        user_id,
    })
}

/// Owner filter of the stats endpoint, checked like the one on task listings.
pub(crate) fn stats_owner(user_id: Option<String>) -> Result<Option<String>, ApiError> {
    let mut v = Violations::default();
    let user_id = optional(
        &mut v,
        user_id,
        (1, usize::MAX),
        "User ID must not be empty if provided",
    );
    v.finish(user_id)
}

/// Loose `local@domain.tld` shape check.
fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !s.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[derive(Debug)]
pub(crate) struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
}

pub(crate) fn registration(
    email: Option<String>,
    password: Option<String>,
    name: Option<String>,
) -> Result<Registration, ApiError> {
    let mut v = Violations::default();
    let email = email.map(|s| s.trim().to_lowercase()).unwrap_or_default();
    if !looks_like_email(&email) {
        v.push("Valid email is required");
    }
    let password = password.unwrap_or_default();
    if char_len(&password) < MIN_PASSWORD_LEN {
        v.push("Password must be at least 6 characters");
    }
    let name = required(
        &mut v,
        name,
        NAME_LEN,
        "Name is required",
        "Name must be between 2 and 50 characters",
    );

    v.finish(Registration {
        email,
        password,
        name,
    })
}

#[derive(Debug)]
pub(crate) struct Credentials {
    pub email: String,
    pub password: String,
}

pub(crate) fn credentials(
    email: Option<String>,
    password: Option<String>,
) -> Result<Credentials, ApiError> {
    let mut v = Violations::default();
    let email = email.map(|s| s.trim().to_lowercase()).unwrap_or_default();
    if !looks_like_email(&email) {
        v.push("Valid email is required");
    }
    let password = password.unwrap_or_default();
    if password.is_empty() {
        v.push("Password is required");
    }

    v.finish(Credentials { email, password })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: ApiError) -> String {
        match err {
            ApiError::InvalidRequest(msg) => msg,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn create_trims_and_accepts_valid_input() {
        let input = create_task(
            Some("  Buy milk ".into()),
            Some("Two litres".into()),
            None,
        )
        .unwrap();
        assert_eq!(input.title, "Buy milk");
        assert_eq!(input.description, "Two litres");
        assert!(input.user_id.is_none());
    }

    #[test]
    fn create_reports_every_violation() {
        let msg = message(create_task(Some("AB".into()), None, Some("  ".into())).unwrap_err());
        assert!(msg.starts_with("Validation failed: "));
        assert!(msg.contains("Title must be between 3 and 100 characters"));
        assert!(msg.contains("Description is required"));
        assert!(msg.contains("User ID must not be empty if provided"));
    }

    #[test]
    fn title_length_counts_chars_not_bytes() {
        let title = "é".repeat(100);
        assert!(create_task(Some(title), Some("ok desc".into()), None).is_ok());
    }

    #[test]
    fn update_rejects_non_boolean_completed() {
        let msg = message(update_task(None, None, Some(Value::String("yes".into()))).unwrap_err());
        assert!(msg.contains("Completed must be a boolean"));

        let patch = update_task(None, None, Some(Value::Bool(true))).unwrap();
        assert_eq!(patch.completed, Some(true));
        assert!(patch.title.is_none());
    }

    #[test]
    fn update_rejects_explicit_nulls() {
        let msg = message(
            update_task(Some(Value::Null), Some(Value::Null), Some(Value::Null)).unwrap_err(),
        );
        assert!(msg.contains("Title must be between 3 and 100 characters"));
        assert!(msg.contains("Description must be between 3 and 500 characters"));
        assert!(msg.contains("Completed must be a boolean"));

        let msg = message(update_task(Some(Value::from(42)), None, None).unwrap_err());
        assert!(msg.contains("Title must be between 3 and 100 characters"));

        let patch = update_task(Some(Value::from("  New title ")), None, None).unwrap();
        assert_eq!(patch.title.as_deref(), Some("New title"));
    }

    #[test]
    fn query_rejects_unknown_filter_and_empty_search() {
        let msg = message(task_query(Some("done".into()), None, None).unwrap_err());
        assert!(msg.contains("Filter must be one of: all, pending, completed"));

        let msg = message(task_query(None, Some("   ".into()), None).unwrap_err());
        assert!(msg.contains("Search query must be between 1 and 100 characters"));

        let q = task_query(Some("pending".into()), Some(" milk ".into()), None).unwrap();
        assert_eq!(q.filter, Some(TaskFilter::Pending));
        assert_eq!(q.search.as_deref(), Some("milk"));
    }

    #[test]
    fn stats_owner_is_trimmed_like_listing() {
        assert_eq!(stats_owner(Some(" u1 ".into())).unwrap().as_deref(), Some("u1"));
        assert_eq!(stats_owner(None).unwrap(), None);
        let msg = message(stats_owner(Some("  ".into())).unwrap_err());
        assert!(msg.contains("User ID must not be empty if provided"));

        let listed = task_query(None, None, Some(" u1 ".into())).unwrap();
        assert_eq!(listed.user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn email_shape() {
        assert!(looks_like_email("ana@example.com"));
        assert!(looks_like_email("a.b@sub.example.org"));
        assert!(!looks_like_email("ana"));
        assert!(!looks_like_email("ana@localhost"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("a b@example.com"));
        assert!(!looks_like_email("a@b@example.com"));
    }

    #[test]
    fn registration_normalizes_email() {
        let reg = registration(
            Some(" Ana@Example.COM ".into()),
            Some("secret1".into()),
            Some(" Ana ".into()),
        )
        .unwrap();
        assert_eq!(reg.email, "ana@example.com");
        assert_eq!(reg.name, "Ana");

        let msg = message(registration(Some("x".into()), Some("123".into()), None).unwrap_err());
        assert!(msg.contains("Valid email is required"));
        assert!(msg.contains("Password must be at least 6 characters"));
        assert!(msg.contains("Name is required"));
    }
}
