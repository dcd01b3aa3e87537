//! Channel and user mode string parsing.
//!
//! Mode letters are classified against the server's ISUPPORT tables;
//! the class decides whether a letter consumes the next positional
//! argument. Parsing is lenient: a letter whose argument is missing is
//! kept with `arg: None`, surplus arguments are ignored.

use crate::isupport::{ModeClass, ServerSupport};

/// One `+x`/`-x` from a MODE line.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeChange {
    /// `true` for `+`, `false` for `-`.
    pub set: bool,
    pub mode: char,
    pub arg: Option<String>,
}

impl ModeChange {
    pub fn plus(mode: char, arg: Option<&str>) -> Self {
        Self {
            set: true,
            mode,
            arg: arg.map(str::to_owned),
        }
    }

    pub fn minus(mode: char, arg: Option<&str>) -> Self {
        Self {
            set: false,
            mode,
            arg: arg.map(str::to_owned),
        }
    }
}

enum PlusMinus {
    Plus,
    Minus,
}

fn takes_arg(class: ModeClass, set: bool) -> bool {
    match class {
        ModeClass::Prefix | ModeClass::A | ModeClass::B => true,
        ModeClass::C => set,
        ModeClass::D => false,
    }
}

/// Parse `MODE #chan <modes> [args...]`, `pieces` starting at `<modes>`.
pub fn parse_channel_modes(pieces: &[&str], support: &ServerSupport) -> Vec<ModeChange> {
    parse_modes(pieces, |c, set| takes_arg(support.mode_class(c), set))
}

/// Parse `MODE <nick> <modes>`; user modes never take arguments.
pub fn parse_user_modes(pieces: &[&str]) -> Vec<ModeChange> {
    parse_modes(pieces, |_, _| false)
}

fn parse_modes(pieces: &[&str], wants_arg: impl Fn(char, bool) -> bool) -> Vec<ModeChange> {
    use self::PlusMinus::*;

    let mut res = vec![];

    let Some((first, rest)) = pieces.split_first() else {
        return res;
    };
    let mut args = rest.iter().copied();
    let mut cur_mod = Plus;

    for c in first.chars() {
        match c {
            '+' => cur_mod = Plus,
            '-' => cur_mod = Minus,
            _ => {
                let set = matches!(cur_mod, Plus);
                let arg = if wants_arg(c, set) { args.next() } else { None };
                res.push(ModeChange {
                    set,
                    mode: c,
                    arg: arg.map(str::to_owned),
                });
            }
        }
    }

    res
}
