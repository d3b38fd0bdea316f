use crate::{Arrive, Blame};
use std::str::FromStr;

/// The first word of a command line.  We let [`strum_macros::EnumString`] do the matching so the
/// spelling of a command lives in exactly one place, the variant name.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Verb {
    Post,
    Refresh,
    Hover,
    Leave,
    User,
    Hide,
    Show,
    Help,
    Quit,
}

impl Verb {
    /// One-line usage for the help text.
    pub fn usage(&self) -> &'static str {
        match self {
            Self::Post => "post <text>    send a tweetle",
            Self::Refresh => "refresh        start or stop revealing new tweetles",
            Self::Hover => "hover          pause the feed, as if pointing at it",
            Self::Leave => "leave          lift the hover pause",
            Self::User => "user <name>    open the overlay on an author",
            Self::Hide => "hide           dismiss the overlay",
            Self::Show => "show           print both feeds",
            Self::Help => "help           list commands",
            Self::Quit => "quit           leave",
        }
    }
}

/// The `Act` enum is what the viewer asked for, parsed out of a line of input.  The
/// [`crate::App::act`] method dispatches on the variant.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum Act {
    #[display("post {_0}")]
    Post(String),
    #[display("refresh")]
    Refresh,
    #[display("hover")]
    Hover,
    #[display("leave")]
    Leave,
    #[display("user {_0}")]
    User(String),
    #[display("hide")]
    Hide,
    #[display("show")]
    Show,
    #[display("help")]
    Help,
    #[display("quit")]
    Quit,
}

impl FromStr for Act {
    type Err = Blame;

    /// Splits off the first word as the [`Verb`] and keeps the rest as the argument.  Will
    /// [`Blame::UnknownCommand`] on an unknown verb, or on `user` without a name.  A `post` with
    /// nothing after it parses to an empty post.
    fn from_str(line: &str) -> Arrive<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let unknown = || Blame::UnknownCommand {
            input: line.to_owned(),
        };
        let verb = Verb::from_str(word).map_err(|_| unknown())?;
        let act = match verb {
            Verb::Post => Self::Post(rest.to_owned()),
            Verb::Refresh => Self::Refresh,
            Verb::Hover => Self::Hover,
            Verb::Leave => Self::Leave,
            Verb::User => {
                let name = rest.trim_start_matches('@');
                if name.is_empty() {
                    return Err(unknown());
                }
                Self::User(name.to_owned())
            }
            Verb::Hide => Self::Hide,
            Verb::Show => Self::Show,
            Verb::Help => Self::Help,
            Verb::Quit => Self::Quit,
        };
        Ok(act)
    }
}
