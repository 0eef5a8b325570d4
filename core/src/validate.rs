//! Application schema validation.
//!
//! Checks the structural invariants resolvers rely on: flag names that
//! normalize to distinct document keys, unique flags per scope, sane
//! environment variable names and a well-formed command tree.
//!
//! # Examples
//!
//! ```
//! use flag_resolver_core::*;
//!
//! let app = Application::new("deploy").with_flag(Flag::new("max-retries"));
//! assert!(validate_application(&app).is_empty());
//!
//! // Invalid: flag names are bare, without leading dashes
//! let bad = Application::new("deploy").with_flag(Flag::new("--max-retries"));
//! assert!(!validate_application(&bad).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{Application, Command, Flag};

/// Application schema validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Application name is empty or whitespace-only.
    #[error("application name cannot be empty")]
    EmptyApplicationName,
    /// A flag has an empty name.
    #[error("flag name cannot be empty")]
    EmptyFlagName,
    /// Flag name is not lowercase words joined by single hyphens.
    #[error("invalid flag name: {0}")]
    InvalidFlagName(String),
    /// Two flags visible in the same scope share a name.
    #[error("duplicate flag in scope: {0}")]
    DuplicateFlag(String),
    /// Two flags visible in the same scope share a short form.
    #[error("duplicate short flag in scope: -{0}")]
    DuplicateShortFlag(char),
    /// Environment variable name contains `=` or NUL.
    #[error("invalid environment variable name for flag {flag}: {env:?}")]
    InvalidEnvName {
        /// Flag carrying the binding.
        flag: String,
        /// The rejected variable name.
        env: String,
    },
    /// A command has an empty name.
    #[error("command name cannot be empty")]
    EmptyCommandName,
    /// Two sibling commands share a name or alias.
    #[error("duplicate command in scope: {0}")]
    DuplicateCommand(String),
    /// A command repeats the name of one of its ancestors.
    #[error("command cycle detected at path: {0}")]
    CommandCycle(String),
}

/// Validates an application schema.
///
/// Validation stops at the first problem, so the returned list holds at most
/// one error.
///
/// # Examples
///
/// ```
/// use flag_resolver_core::*;
///
/// // A command flag may not shadow a root flag.
/// let app = Application::new("git")
///     .with_flag(Flag::new("verbose"))
///     .with_command(Command::new("commit").with_flag(Flag::new("verbose")));
/// let errors = validate_application(&app);
/// assert_eq!(errors, vec![ValidationError::DuplicateFlag("verbose".into())]);
/// ```
pub fn validate_application(app: &Application) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if app.name.trim().is_empty() {
        errors.push(ValidationError::EmptyApplicationName);
        return errors;
    }

    let mut scope = Scope::default();
    errors.extend(scope.declare(&app.flags));
    if !errors.is_empty() {
        return errors;
    }

    let mut path = vec![app.name.clone()];
    errors.extend(validate_commands(&app.commands, &mut path, &scope));

    errors
}

/// Flags visible at one node of the tree, including inherited ones.
#[derive(Debug, Clone, Default)]
struct Scope {
    names: HashSet<String>,
    shorts: HashSet<char>,
}

impl Scope {
    fn declare(&mut self, flags: &[Flag]) -> Option<ValidationError> {
        for flag in flags {
            if let Some(err) = check_flag(flag) {
                return Some(err);
            }
            if !self.names.insert(flag.name.clone()) {
                return Some(ValidationError::DuplicateFlag(flag.name.clone()));
            }
            if let Some(short) = flag.short {
                if !self.shorts.insert(short) {
                    return Some(ValidationError::DuplicateShortFlag(short));
                }
            }
        }
        None
    }
}

fn validate_commands(
    commands: &[Command],
    path: &mut Vec<String>,
    parent: &Scope,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for command in commands {
        let name = command.name.trim();
        if name.is_empty() {
            errors.push(ValidationError::EmptyCommandName);
            return errors;
        }

        for alias in std::iter::once(name).chain(command.aliases.iter().map(String::as_str)) {
            if !seen.insert(alias) {
                errors.push(ValidationError::DuplicateCommand(alias.to_string()));
                return errors;
            }
        }

        if path.iter().any(|segment| segment == name) {
            let cycle_path = path
                .iter()
                .cloned()
                .chain(std::iter::once(name.to_string()))
                .collect::<Vec<_>>()
                .join(" ");
            errors.push(ValidationError::CommandCycle(cycle_path));
            return errors;
        }

        let mut scope = parent.clone();
        if let Some(err) = scope.declare(&command.flags) {
            errors.push(err);
            return errors;
        }

        path.push(name.to_string());
        errors.extend(validate_commands(&command.commands, path, &scope));
        path.pop();
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

fn check_flag(flag: &Flag) -> Option<ValidationError> {
    if flag.name.is_empty() {
        return Some(ValidationError::EmptyFlagName);
    }
    if !is_valid_flag_name(&flag.name) {
        return Some(ValidationError::InvalidFlagName(flag.name.clone()));
    }
    let env = &flag.tag.env;
    if env.contains('=') || env.contains('\0') {
        return Some(ValidationError::InvalidEnvName {
            flag: flag.name.clone(),
            env: env.clone(),
        });
    }
    None
}

fn is_valid_flag_name(name: &str) -> bool {
    name.split('-').all(|word| {
        !word.is_empty()
            && word
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    })
}
