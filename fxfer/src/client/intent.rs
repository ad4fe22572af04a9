//! User intent and the action resolver
// (c) 2025 fxfer developers

use std::path::PathBuf;

use clap::Args;

use crate::Error;
use crate::protocol::{Field, IntentKind, Permission, RequestDescriptor, Target};

/// What the user asked for: exactly one command, plus the arguments it depends on.
///
/// The command flags are deliberately not marked as conflicting in clap;
/// [`Intent::resolve`] owns that check so every front end reports it the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct Intent {
    /// Authenticate, then enter the interactive shell
    #[arg(long, help_heading("Commands"), display_order(0))]
    pub shell: bool,

    /// List a remote directory [--dst]
    #[arg(long, help_heading("Commands"))]
    pub ls: bool,
    /// Create a remote directory [--dst]
    #[arg(long, help_heading("Commands"))]
    pub mkdir: bool,
    /// Delete a remote file or empty directory [--dst]
    #[arg(long, help_heading("Commands"))]
    pub delete: bool,
    /// Send a local file to the server [--src, --dst]
    #[arg(long, help_heading("Commands"))]
    pub put: bool,
    /// Fetch a file from the server [--dst, --src]
    #[arg(long, help_heading("Commands"))]
    pub get: bool,

    /// List a local directory [--src]
    #[arg(long, help_heading("Local commands"))]
    pub l_ls: bool,
    /// Delete a local file or empty directory [--src]
    #[arg(long, help_heading("Local commands"))]
    pub l_delete: bool,
    /// Create a local directory [--src]
    #[arg(long, help_heading("Local commands"))]
    pub l_mkdir: bool,

    /// Create a user [--permission]
    #[arg(long, value_name("USER"), help_heading("User management"))]
    pub create_user: Option<String>,
    /// Delete a user
    #[arg(long, value_name("USER"), help_heading("User management"))]
    pub delete_user: Option<String>,
    /// Permission level for a new user
    #[arg(long, value_enum, help_heading("User management"))]
    pub permission: Option<Permission>,

    /// Local path
    #[arg(long, value_name("PATH"), help_heading("Paths"))]
    pub src: Option<PathBuf>,
    /// Remote path
    #[arg(long, value_name("PATH"), help_heading("Paths"))]
    pub dst: Option<String>,
}

impl Intent {
    /// An intent with just the given command set
    #[must_use]
    pub fn for_kind(kind: IntentKind) -> Self {
        let mut intent = Self::default();
        match kind {
            IntentKind::Shell => intent.shell = true,
            IntentKind::List => intent.ls = true,
            IntentKind::MakeDir => intent.mkdir = true,
            IntentKind::Delete => intent.delete = true,
            IntentKind::Put => intent.put = true,
            IntentKind::Get => intent.get = true,
            IntentKind::CreateUser => intent.create_user = Some(String::new()),
            IntentKind::DeleteUser => intent.delete_user = Some(String::new()),
            IntentKind::LocalList => intent.l_ls = true,
            IntentKind::LocalDelete => intent.l_delete = true,
            IntentKind::LocalMakeDir => intent.l_mkdir = true,
        }
        intent
    }

    fn flags(&self) -> [(IntentKind, bool); 11] {
        [
            (IntentKind::Shell, self.shell),
            (IntentKind::List, self.ls),
            (IntentKind::MakeDir, self.mkdir),
            (IntentKind::Delete, self.delete),
            (IntentKind::Put, self.put),
            (IntentKind::Get, self.get),
            (IntentKind::CreateUser, self.create_user.is_some()),
            (IntentKind::DeleteUser, self.delete_user.is_some()),
            (IntentKind::LocalList, self.l_ls),
            (IntentKind::LocalDelete, self.l_delete),
            (IntentKind::LocalMakeDir, self.l_mkdir),
        ]
    }

    /// Which command was chosen?
    ///
    /// Fails unless exactly one was.
    pub fn selected(&self) -> Result<IntentKind, Error> {
        let mut chosen = self.flags().into_iter().filter(|(_, set)| *set);
        match (chosen.next(), chosen.next()) {
            (None, _) => Err(Error::NoAction),
            (Some((kind, _)), None) => Ok(kind),
            (Some(_), Some(_)) => Err(Error::MultipleActions),
        }
    }

    fn has(&self, field: Field) -> bool {
        match field {
            Field::Source => self.src.is_some(),
            Field::Destination => self.dst.is_some(),
            Field::Permission => self.permission.is_some(),
        }
    }

    /// Validates this intent and turns it into a request descriptor for `target`.
    ///
    /// The descriptor has no password or session id yet.
    /// This performs no I/O.
    pub fn resolve(&self, target: &Target) -> Result<RequestDescriptor, Error> {
        let kind = self.selected()?;
        if let Some(field) = kind
            .dependency()
            .required()
            .iter()
            .copied()
            .find(|f| !self.has(*f))
        {
            return Err(Error::MissingDependency {
                intent: kind,
                field,
            });
        }

        let mut descriptor = RequestDescriptor::new(target, kind.action());
        descriptor.src.clone_from(&self.src);
        descriptor.dst.clone_from(&self.dst);
        descriptor.permission = self.permission.unwrap_or_default();
        descriptor.other_username = match kind {
            IntentKind::CreateUser => self.create_user.clone(),
            IntentKind::DeleteUser => self.delete_user.clone(),
            _ => None,
        };
        Ok(descriptor)
    }
}
