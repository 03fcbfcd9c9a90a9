//! One-shot settings sessions run from the command line.
//!
//! Each invocation opens one manager, runs one operation, and saves if the
//! operation changed anything. Output is JSON so it can be piped.

use anyhow::{Context, bail};
use quire_core::SettingsManager;
use quire_types::Value;

/// A single operation against the settings of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Print the value at a key.
    Get {
        /// Domain-qualified dotted key.
        key: String,
    },
    /// Store a value at a key.
    Set {
        /// Domain-qualified dotted key.
        key: String,
        /// JSON text; anything that does not parse is stored as a string.
        value: String,
    },
    /// Remove the value at a key.
    Delete {
        /// Domain-qualified dotted key.
        key: String,
    },
    /// Drop a domain (the default domain if `None`).
    Reset {
        /// Domain to drop.
        domain: Option<String>,
    },
    /// Print a domain (the default domain if `None`) as a nested tree.
    List {
        /// Domain to print.
        domain: Option<String>,
    },
}

/// Parse command-line text into a [`Value`].
///
/// Valid JSON keeps its type (`42`, `true`, `[1,2]`); anything else is
/// taken literally as a string, so `quire set site.name Acme` works
/// without quoting.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .map_or_else(|_| Value::String(raw.to_owned()), Value::from)
}

/// Run `command` on `manager`, save if needed, and return the text to
/// print (empty for commands without output).
///
/// # Errors
///
/// Fails if the key is malformed, the key is missing for `get` or
/// `delete`, or loading or saving fails.
pub async fn run(manager: &mut SettingsManager, command: SessionCommand) -> anyhow::Result<String> {
    let output = match command {
        SessionCommand::Get { key } => {
            let Some(value) = manager.get(&key).await? else {
                bail!("no setting at {key}");
            };
            serde_json::to_string_pretty(&value)?
        }
        SessionCommand::Set { key, value } => {
            manager.set(&key, parse_value(&value)).await?;
            String::new()
        }
        SessionCommand::Delete { key } => {
            if manager.delete(&key).await?.is_none() {
                bail!("no setting at {key}");
            }
            String::new()
        }
        SessionCommand::Reset { domain } => {
            manager.reset(domain.as_deref()).await?;
            String::new()
        }
        SessionCommand::List { domain } => {
            let all = manager.all(domain.as_deref()).await?;
            serde_json::to_string_pretty(&all)?
        }
    };

    manager.save().await.context("failed to save settings")?;
    Ok(output)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use quire_core::{MemoryBackend, SettingsStore};

    use super::*;

    fn store() -> SettingsStore {
        SettingsStore::new(Arc::new(MemoryBackend::new()))
    }

    async fn run_fresh(store: &SettingsStore, command: SessionCommand) -> anyhow::Result<String> {
        let mut manager = SettingsManager::new(store.clone());
        run(&mut manager, command).await
    }

    #[test]
    fn values_parse_as_json_or_fall_back_to_text() {
        assert_eq!(parse_value("42"), Value::Integer(42));
        assert_eq!(parse_value("true"), Value::Bool(true));
        assert_eq!(parse_value("\"quoted\""), Value::from("quoted"));
        assert_eq!(parse_value("[1,2]"), Value::from(vec![1, 2]));
        assert_eq!(parse_value("Acme Inc"), Value::from("Acme Inc"));
    }

    #[tokio::test]
    async fn set_is_visible_to_next_session() {
        let store = store();
        run_fresh(
            &store,
            SessionCommand::Set {
                key: String::from("mail.port"),
                value: String::from("587"),
            },
        )
        .await
        .unwrap();

        let out = run_fresh(
            &store,
            SessionCommand::Get {
                key: String::from("mail.port"),
            },
        )
        .await
        .unwrap();
        assert_eq!(out, "587");
    }

    #[tokio::test]
    async fn list_prints_nested_domain() {
        let store = store();
        for (key, value) in [("billing::plan.name", "\"pro\""), ("billing::plan.seats", "5")] {
            run_fresh(
                &store,
                SessionCommand::Set {
                    key: key.to_owned(),
                    value: value.to_owned(),
                },
            )
            .await
            .unwrap();
        }

        let out = run_fresh(
            &store,
            SessionCommand::List {
                domain: Some(String::from("billing")),
            },
        )
        .await
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json, serde_json::json!({"plan": {"name": "pro", "seats": 5}}));
    }

    #[tokio::test]
    async fn missing_key_is_an_error() {
        let store = store();
        let get = run_fresh(
            &store,
            SessionCommand::Get {
                key: String::from("ghost"),
            },
        )
        .await;
        assert!(get.is_err());

        let delete = run_fresh(
            &store,
            SessionCommand::Delete {
                key: String::from("ghost"),
            },
        )
        .await;
        assert!(delete.is_err());
    }

    #[tokio::test]
    async fn delete_and_reset_persist() {
        let store = store();
        for key in ["a", "b", "other::c"] {
            run_fresh(
                &store,
                SessionCommand::Set {
                    key: key.to_owned(),
                    value: String::from("1"),
                },
            )
            .await
            .unwrap();
        }

        run_fresh(&store, SessionCommand::Delete { key: String::from("a") })
            .await
            .unwrap();
        run_fresh(&store, SessionCommand::Reset { domain: None })
            .await
            .unwrap();

        let default = run_fresh(&store, SessionCommand::List { domain: None })
            .await
            .unwrap();
        assert_eq!(default, "{}");
        let other = run_fresh(
            &store,
            SessionCommand::Get {
                key: String::from("other::c"),
            },
        )
        .await
        .unwrap();
        assert_eq!(other, "1");
    }
}
