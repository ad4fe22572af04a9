//! Action model: opcodes, sub flags, permissions and dependency rules
// (c) 2025 fxfer developers

use serde::{Deserialize, Serialize};

/// Wire-level operation tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::FromRepr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Opcode {
    NoOp = 0,
    UserOp = 1,
    Delete = 2,
    #[strum(serialize = "LS")]
    List = 3,
    Get = 4,
    #[strum(serialize = "MKDIR")]
    MakeDir = 5,
    Put = 6,
    LocalOp = 7,
}

/// Secondary tag which disambiguates a compound opcode ([`Opcode::UserOp`] or [`Opcode::LocalOp`])
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::FromRepr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
#[allow(missing_docs)]
pub enum SubFlag {
    None = 0,
    CreateUser = 10,
    DeleteUser = 20,
    #[strum(serialize = "L_LS")]
    LocalList = 22,
    #[strum(serialize = "L_DELETE")]
    LocalDelete = 23,
    #[strum(serialize = "L_MKDIR")]
    LocalMakeDir = 24,
}

/// Permission granted to a newly created user, in increasing order of privilege
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    clap::ValueEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Permission {
    /// May read and list
    #[default]
    Read = 1,
    /// May also create, put and delete
    ReadWrite = 2,
    /// May also manage users
    Admin = 3,
}

/// User management operations, carried as the sub flag of [`Opcode::UserOp`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserOp {
    /// Create another user
    Create,
    /// Delete another user
    Delete,
}

/// Operations on the client's own disk, carried as the sub flag of [`Opcode::LocalOp`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalOp {
    /// List a local directory
    List,
    /// Delete a local file or empty directory
    Delete,
    /// Create a local directory
    MakeDir,
}

/// A resolved action: an opcode, plus a sub flag for the compound opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Delete a remote file or empty directory
    Delete,
    /// List a remote directory
    List,
    /// Fetch a remote file
    Get,
    /// Create a remote directory
    MakeDir,
    /// Send a local file
    Put,
    /// Manage another user
    User(UserOp),
    /// Act on the local disk, once the server has authenticated us
    Local(LocalOp),
    /// Authenticate and enter the interactive shell.
    ///
    /// On the wire this is an authentication-only request: `LOCAL_OP` with no sub flag.
    Shell,
}

impl Action {
    /// The opcode this action is sent as
    #[must_use]
    pub fn opcode(self) -> Opcode {
        match self {
            Action::Delete => Opcode::Delete,
            Action::List => Opcode::List,
            Action::Get => Opcode::Get,
            Action::MakeDir => Opcode::MakeDir,
            Action::Put => Opcode::Put,
            Action::User(_) => Opcode::UserOp,
            Action::Local(_) | Action::Shell => Opcode::LocalOp,
        }
    }

    /// The sub flag this action is sent with
    #[must_use]
    pub fn sub_flag(self) -> SubFlag {
        match self {
            Action::User(UserOp::Create) => SubFlag::CreateUser,
            Action::User(UserOp::Delete) => SubFlag::DeleteUser,
            Action::Local(LocalOp::List) => SubFlag::LocalList,
            Action::Local(LocalOp::Delete) => SubFlag::LocalDelete,
            Action::Local(LocalOp::MakeDir) => SubFlag::LocalMakeDir,
            _ => SubFlag::None,
        }
    }
}

/// An argument that some intents depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Field {
    /// Local path
    #[strum(serialize = "--src")]
    Source,
    /// Remote path
    #[strum(serialize = "--dst")]
    Destination,
    /// Permission for a new user
    #[strum(serialize = "--permission")]
    Permission,
}

/// Which arguments an intent requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyRule {
    /// Nothing beyond the intent itself
    None,
    /// A local path
    Source,
    /// A remote path
    Destination,
    /// A local and a remote path
    SourceAndDestination,
    /// A permission level
    Permission,
}

impl DependencyRule {
    /// The fields this rule requires, in the order they are checked
    #[must_use]
    pub fn required(self) -> &'static [Field] {
        match self {
            DependencyRule::None => &[],
            DependencyRule::Source => &[Field::Source],
            DependencyRule::Destination => &[Field::Destination],
            DependencyRule::SourceAndDestination => &[Field::Source, Field::Destination],
            DependencyRule::Permission => &[Field::Permission],
        }
    }
}

/// The user-facing commands. Exactly one may be chosen per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
#[allow(missing_docs)]
pub enum IntentKind {
    Shell,
    #[strum(serialize = "ls")]
    List,
    #[strum(serialize = "mkdir")]
    MakeDir,
    Delete,
    Put,
    Get,
    CreateUser,
    DeleteUser,
    #[strum(serialize = "l_ls")]
    LocalList,
    #[strum(serialize = "l_delete")]
    LocalDelete,
    #[strum(serialize = "l_mkdir")]
    LocalMakeDir,
}

impl IntentKind {
    /// What this intent needs in order to be carried out
    #[must_use]
    pub fn dependency(self) -> DependencyRule {
        match self {
            IntentKind::Shell | IntentKind::DeleteUser => DependencyRule::None,
            IntentKind::LocalList | IntentKind::LocalDelete | IntentKind::LocalMakeDir => {
                DependencyRule::Source
            }
            IntentKind::List | IntentKind::MakeDir | IntentKind::Delete => {
                DependencyRule::Destination
            }
            IntentKind::Put | IntentKind::Get => DependencyRule::SourceAndDestination,
            IntentKind::CreateUser => DependencyRule::Permission,
        }
    }

    /// Folds this intent into the action that is sent on the wire
    #[must_use]
    pub fn action(self) -> Action {
        match self {
            IntentKind::Shell => Action::Shell,
            IntentKind::List => Action::List,
            IntentKind::MakeDir => Action::MakeDir,
            IntentKind::Delete => Action::Delete,
            IntentKind::Put => Action::Put,
            IntentKind::Get => Action::Get,
            IntentKind::CreateUser => Action::User(UserOp::Create),
            IntentKind::DeleteUser => Action::User(UserOp::Delete),
            IntentKind::LocalList => Action::Local(LocalOp::List),
            IntentKind::LocalDelete => Action::Local(LocalOp::Delete),
            IntentKind::LocalMakeDir => Action::Local(LocalOp::MakeDir),
        }
    }
}
