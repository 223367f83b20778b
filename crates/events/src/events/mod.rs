use std::fmt;

use pnlog_errors::Violation;

use crate::schema::{FieldReader, Fields, Payload};

// Declare all family modules
pub mod deprecation;
pub mod general;
pub mod install_check;
pub mod lifecycle;
pub mod progress;
pub mod root;
pub mod stage;

// Re-export all family payloads
pub use deprecation::*;
pub use general::*;
pub use install_check::*;
pub use lifecycle::*;
pub use progress::*;
pub use root::*;
pub use stage::*;

/// Prefix the producing tool puts in front of every family name.
pub const ROOT_TAG: &str = "pnpm";

/// The closed set of event family names.
///
/// New families are appended; existing names never change meaning, so
/// archived logs keep decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventName {
    /// The bare root tag, used for uncategorized messages
    Base,
    Progress,
    Lifecycle,
    InstallCheck,
    Deprecation,
    Stage,
    Registry,
    Root,
    Summary,
}

impl EventName {
    pub const ALL: [Self; 9] = [
        Self::Base,
        Self::Progress,
        Self::Lifecycle,
        Self::InstallCheck,
        Self::Deprecation,
        Self::Stage,
        Self::Registry,
        Self::Root,
        Self::Summary,
    ];

    /// Family name without the root tag (`"progress"`); the root tag itself
    /// for [`EventName::Base`].
    #[must_use]
    pub fn family(self) -> &'static str {
        match self {
            Self::Base => ROOT_TAG,
            Self::Progress => "progress",
            Self::Lifecycle => "lifecycle",
            Self::InstallCheck => "install-check",
            Self::Deprecation => "deprecation",
            Self::Stage => "stage",
            Self::Registry => "registry",
            Self::Root => "root",
            Self::Summary => "summary",
        }
    }

    /// Name as written by the encoder (`"pnpm:progress"`).
    #[must_use]
    pub fn qualified(self) -> &'static str {
        match self {
            Self::Base => ROOT_TAG,
            Self::Progress => "pnpm:progress",
            Self::Lifecycle => "pnpm:lifecycle",
            Self::InstallCheck => "pnpm:install-check",
            Self::Deprecation => "pnpm:deprecation",
            Self::Stage => "pnpm:stage",
            Self::Registry => "pnpm:registry",
            Self::Root => "pnpm:root",
            Self::Summary => "pnpm:summary",
        }
    }

    /// Look up a wire name. Both the qualified and the short form are accepted.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let family = match name.strip_prefix(ROOT_TAG) {
            Some("") => return Some(Self::Base),
            Some(rest) => rest.strip_prefix(':')?,
            None => name,
        };
        Self::ALL
            .into_iter()
            .find(|candidate| *candidate != Self::Base && candidate.family() == family)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.qualified())
    }
}

/// A typed event: one variant per family
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    Base(BaseMessage),
    Progress(ProgressMessage),
    Lifecycle(LifecycleMessage),
    InstallCheck(InstallCheckMessage),
    Deprecation(DeprecationMessage),
    Stage(StageMessage),
    Registry(StandardMessage),
    Root(RootMessage),
    Summary(SummaryMessage),
}

impl LogEvent {
    #[must_use]
    pub fn name(&self) -> EventName {
        match self {
            Self::Base(_) => EventName::Base,
            Self::Progress(_) => EventName::Progress,
            Self::Lifecycle(_) => EventName::Lifecycle,
            Self::InstallCheck(_) => EventName::InstallCheck,
            Self::Deprecation(_) => EventName::Deprecation,
            Self::Stage(_) => EventName::Stage,
            Self::Registry(_) => EventName::Registry,
            Self::Root(_) => EventName::Root,
            Self::Summary(_) => EventName::Summary,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self.name() {
            EventName::Base => "pnlog::events::base",
            EventName::Progress => "pnlog::events::progress",
            EventName::Lifecycle => "pnlog::events::lifecycle",
            EventName::InstallCheck => "pnlog::events::install_check",
            EventName::Deprecation => "pnlog::events::deprecation",
            EventName::Stage => "pnlog::events::stage",
            EventName::Registry => "pnlog::events::registry",
            EventName::Root => "pnlog::events::root",
            EventName::Summary => "pnlog::events::summary",
        }
    }

    /// Package instance the event is about, when it names one.
    #[must_use]
    pub fn pkg_id(&self) -> Option<&str> {
        match self {
            Self::Progress(message) => message.pkg_id(),
            Self::Lifecycle(message) => Some(&message.pkg_id),
            Self::InstallCheck(message) => Some(&message.pkg_id),
            Self::Deprecation(message) => Some(&message.pkg_id),
            _ => None,
        }
    }

    pub fn write_fields(&self, out: &mut Fields) {
        match self {
            Self::Base(message) => message.write_fields(out),
            Self::Progress(message) => message.write_fields(out),
            Self::Lifecycle(message) => message.write_fields(out),
            Self::InstallCheck(message) => message.write_fields(out),
            Self::Deprecation(message) => message.write_fields(out),
            Self::Stage(message) => message.write_fields(out),
            Self::Registry(message) => message.write_fields(out),
            Self::Root(message) => message.write_fields(out),
            Self::Summary(message) => message.write_fields(out),
        }
    }

    /// Read the payload of `family` from `fields`.
    ///
    /// # Errors
    ///
    /// The first violation of the family's variant rules.
    pub fn read_fields(family: EventName, fields: &mut FieldReader) -> Result<Self, Violation> {
        Ok(match family {
            EventName::Base => Self::Base(BaseMessage::read_fields(fields)?),
            EventName::Progress => Self::Progress(ProgressMessage::read_fields(fields)?),
            EventName::Lifecycle => Self::Lifecycle(LifecycleMessage::read_fields(fields)?),
            EventName::InstallCheck => {
                Self::InstallCheck(InstallCheckMessage::read_fields(fields)?)
            }
            EventName::Deprecation => Self::Deprecation(DeprecationMessage::read_fields(fields)?),
            EventName::Stage => Self::Stage(StageMessage::read_fields(fields)?),
            EventName::Registry => Self::Registry(StandardMessage::read_fields(fields)?),
            EventName::Root => Self::Root(RootMessage::read_fields(fields)?),
            EventName::Summary => Self::Summary(SummaryMessage::read_fields(fields)?),
        })
    }
}

macro_rules! impl_from_payload {
    ($($variant:ident($payload:ty)),* $(,)?) => {
        $(
            impl From<$payload> for LogEvent {
                fn from(message: $payload) -> Self {
                    Self::$variant(message)
                }
            }
        )*
    };
}

impl_from_payload!(
    Base(BaseMessage),
    Progress(ProgressMessage),
    Lifecycle(LifecycleMessage),
    InstallCheck(InstallCheckMessage),
    Deprecation(DeprecationMessage),
    Stage(StageMessage),
    Registry(StandardMessage),
    Root(RootMessage),
    Summary(SummaryMessage),
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_name_accepts_both_forms() {
        for name in EventName::ALL {
            assert_eq!(EventName::parse(name.qualified()), Some(name));
            assert_eq!(EventName::parse(name.family()), Some(name));
        }
        assert_eq!(EventName::parse("pnpm"), Some(EventName::Base));
        assert_eq!(EventName::parse("pnpm:"), None);
        assert_eq!(EventName::parse("pnpm:pnpm"), None);
        assert_eq!(EventName::parse("pnpmx"), None);
        assert_eq!(EventName::parse("totally-unknown"), None);
        assert_eq!(EventName::parse("other:progress"), None);
    }
}
