//! Flag schema and parse-position types.
//!
//! This module defines the data a resolver reads: the declared flags of an
//! application ([`Flag`], [`Command`], [`Application`]) and the position in
//! the command tree where resolution happens ([`Path`], [`Context`]). The
//! schema types serialize with [`serde`] so an application can be described
//! in a JSON file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ResolveError, Result};

/// Metadata attached to a flag declaration.
///
/// Empty strings mean "not specified": a flag with an empty `default` has no
/// compiled-in fallback, and a flag with an empty `env` is not bound to an
/// environment variable.
///
/// # Examples
///
/// ```
/// use flag_resolver_core::FlagTag;
///
/// let tag = FlagTag::default();
/// assert!(tag.default.is_empty());
/// assert!(tag.env.is_empty());
/// assert!(!tag.required);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagTag {
    /// Literal fallback value.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default: String,
    /// Environment variable consulted for this flag.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub env: String,
    /// Whether resolution must produce a value.
    #[serde(default)]
    pub required: bool,
}

/// A declared command-line flag.
///
/// The `name` is the canonical identifier: lowercase words joined by
/// hyphens, without leading dashes (`max-retries`, not `--max-retries`).
///
/// # Examples
///
/// ```
/// use flag_resolver_core::Flag;
///
/// let flag = Flag::new("max-retries")
///     .with_short('r')
///     .with_default("3")
///     .with_env("APP_MAX_RETRIES")
///     .with_help("How many times to retry");
///
/// assert_eq!(flag.name, "max-retries");
/// assert_eq!(flag.tag.default, "3");
/// assert_eq!(flag.document_key(), "max_retries");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    /// Canonical flag name (e.g. "max-retries")
    pub name: String,
    /// Single-character short form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    /// Help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Default, environment binding and requiredness
    #[serde(default)]
    pub tag: FlagTag,
}

impl Flag {
    /// Creates a flag with no tag metadata.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            short: None,
            help: None,
            tag: FlagTag::default(),
        }
    }

    /// Sets the short form.
    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Adds help text.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Sets the compiled-in default.
    pub fn with_default(mut self, default: &str) -> Self {
        self.tag.default = default.to_string();
        self
    }

    /// Binds the flag to an environment variable.
    pub fn with_env(mut self, env: &str) -> Self {
        self.tag.env = env.to_string();
        self
    }

    /// Marks the flag as required.
    pub fn required(mut self) -> Self {
        self.tag.required = true;
        self
    }

    /// Returns the key this flag is looked up under in a configuration
    /// document.
    ///
    /// See [`normalize_key`](crate::normalize_key).
    pub fn document_key(&self) -> String {
        crate::normalize_key(&self.name)
    }
}

/// A command nested under an [`Application`] or another command.
///
/// # Examples
///
/// ```
/// use flag_resolver_core::{Command, Flag};
///
/// let add = Command::new("add").with_flag(Flag::new("fetch"));
/// let remote = Command::new("remote")
///     .with_alias("r")
///     .with_command(add);
///
/// assert_eq!(remote.find_command("add").unwrap().flags.len(), 1);
/// assert!(remote.matches("r"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Command name
    pub name: String,
    /// Help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Alternative names
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Flags declared on this command
    #[serde(default)]
    pub flags: Vec<Flag>,
    /// Nested commands
    #[serde(default)]
    pub commands: Vec<Command>,
}

impl Command {
    /// Creates an empty command.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Adds a flag.
    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    /// Adds an alias.
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Adds a nested command.
    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Returns `true` if `name` is this command's name or one of its aliases.
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    /// Finds a direct child command by name or alias.
    pub fn find_command(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.matches(name))
    }
}

/// The root of a flag schema.
///
/// This is what [`Resolver::validate`](crate::Resolver::validate) inspects.
///
/// # Examples
///
/// ```
/// use flag_resolver_core::{Application, Command, Flag};
///
/// let app = Application::new("deploy")
///     .with_flag(Flag::new("verbose"))
///     .with_command(Command::new("push").with_flag(Flag::new("max-retries")));
///
/// let names: Vec<&str> = app.all_flags().map(|f| f.name.as_str()).collect();
/// assert_eq!(names, vec!["verbose", "max-retries"]);
/// assert!(app.find_flag("max-retries").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Application name
    pub name: String,
    /// Help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Flags available to every command
    #[serde(default)]
    pub flags: Vec<Flag>,
    /// Top-level commands
    #[serde(default)]
    pub commands: Vec<Command>,
}

impl Application {
    /// Creates an empty application.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Adds a root-level flag.
    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    /// Adds a top-level command.
    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Finds a top-level command by name or alias.
    pub fn find_command(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.matches(name))
    }

    /// Iterates every flag declared anywhere in the tree, depth first,
    /// root flags first.
    pub fn all_flags(&self) -> impl Iterator<Item = &Flag> {
        let mut flags: Vec<&Flag> = self.flags.iter().collect();
        let mut stack: Vec<&Command> = self.commands.iter().rev().collect();
        while let Some(command) = stack.pop() {
            flags.extend(command.flags.iter());
            stack.extend(command.commands.iter().rev());
        }
        flags.into_iter()
    }

    /// Finds the first flag with the given canonical name anywhere in the
    /// tree.
    pub fn find_flag(&self, name: &str) -> Option<&Flag> {
        self.all_flags().find(|f| f.name == name)
    }
}

/// One node of the parse position: the application root or a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    /// Application or command name
    pub name: String,
    /// Flags declared at this node
    pub flags: Vec<Flag>,
}

impl Path {
    /// Builds the root node of an application.
    pub fn application(app: &Application) -> Self {
        Self {
            name: app.name.clone(),
            flags: app.flags.clone(),
        }
    }

    /// Builds the node for a command.
    pub fn command(command: &Command) -> Self {
        Self {
            name: command.name.clone(),
            flags: command.flags.clone(),
        }
    }
}

/// Where in the command tree resolution is happening, plus the values the
/// user supplied literally on the command line.
///
/// # Examples
///
/// ```
/// use flag_resolver_core::{Application, Command, Context, Flag};
///
/// let app = Application::new("git")
///     .with_flag(Flag::new("verbose"))
///     .with_command(Command::new("remote").with_command(Command::new("add")));
///
/// let ctx = Context::for_command(&app, &["remote", "add"])
///     .unwrap()
///     .with_value("verbose", "true");
///
/// assert_eq!(ctx.command_path(), "git remote add");
/// assert_eq!(ctx.value("verbose"), Some("true"));
/// assert_eq!(ctx.leaf().name, "add");
/// ```
#[derive(Debug, Clone)]
pub struct Context {
    path: Vec<Path>,
    values: BTreeMap<String, String>,
}

impl Context {
    /// Creates a context positioned at the application root.
    pub fn new(app: &Application) -> Self {
        Self {
            path: vec![Path::application(app)],
            values: BTreeMap::new(),
        }
    }

    /// Creates a context positioned at a nested command.
    ///
    /// Each element of `commands` is matched against the names and aliases of
    /// the children of the previous node.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnknownCommand`] with the offending path when
    /// a segment matches no command.
    pub fn for_command(app: &Application, commands: &[&str]) -> Result<Self> {
        let mut ctx = Self::new(app);
        let mut current: Option<&Command> = None;
        for (depth, name) in commands.iter().enumerate() {
            let found = match current {
                None => app.find_command(name),
                Some(parent) => parent.find_command(name),
            };
            let Some(command) = found else {
                let walked = std::iter::once(app.name.as_str())
                    .chain(commands[..=depth].iter().copied())
                    .collect::<Vec<_>>()
                    .join(" ");
                return Err(ResolveError::UnknownCommand(walked));
            };
            ctx.path.push(Path::command(command));
            current = Some(command);
        }
        Ok(ctx)
    }

    /// Records a literal command-line value for a flag.
    pub fn with_value(mut self, flag: &str, value: &str) -> Self {
        self.set_value(flag, value);
        self
    }

    /// Records a literal command-line value for a flag, replacing any
    /// earlier one.
    pub fn set_value(&mut self, flag: &str, value: &str) {
        self.values.insert(flag.to_string(), value.to_string());
    }

    /// Returns the literal command-line value for a flag, if one was given.
    pub fn value(&self, flag: &str) -> Option<&str> {
        self.values.get(flag).map(String::as_str)
    }

    /// Returns the nodes from the application root to the current command.
    pub fn path(&self) -> &[Path] {
        &self.path
    }

    /// Returns the deepest node.
    pub fn leaf(&self) -> &Path {
        // `path` always starts with the application root.
        &self.path[self.path.len() - 1]
    }

    /// Returns the space-separated names from the root to the current
    /// command.
    pub fn command_path(&self) -> String {
        self.path
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
