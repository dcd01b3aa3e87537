//! RPL_ISUPPORT (005) parameter parsing.
//!
//! [`Isupport`] borrows the tokens of one 005 line. [`ServerSupport`] is
//! the owned view the client keeps for the lifetime of a connection,
//! updated from every 005 it receives and reset on reconnect.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IsupportEntry<'a> {
    pub key: &'a str,
    pub value: Option<&'a str>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Isupport<'a> {
    entries: Vec<IsupportEntry<'a>>,
}

impl<'a> Isupport<'a> {
    pub fn parse_params(params: &[&'a str]) -> Self {
        let mut entries = Vec::with_capacity(params.len());
        for &p in params {
            if p.is_empty() {
                continue;
            }
            let (key, value) = match p.split_once('=') {
                Some((k, v)) => (k, Some(v)),
                None => (p, None),
            };
            entries.push(IsupportEntry { key, value });
        }
        Isupport { entries }
    }

    /// Parse the arguments of a 005 reply: the target nickname first, the
    /// human-readable text (containing spaces) last.
    pub fn from_response_args(args: &[&'a str]) -> Option<Self> {
        let (_, mut tokens) = args.split_first()?;

        if let Some(last) = tokens.last() {
            if last.contains(' ') {
                tokens = &tokens[..tokens.len() - 1];
            }
        }
        Some(Self::parse_params(tokens))
    }

    pub fn iter(&self) -> impl Iterator<Item = &IsupportEntry<'a>> {
        self.entries.iter()
    }

    pub fn get(&self, key: &str) -> Option<Option<&'a str>> {
        self.entries
            .iter()
            .rfind(|e| e.key.eq_ignore_ascii_case(key))
            .map(|e| e.value)
    }

    pub fn chantypes(&self) -> Option<&'a str> {
        self.get("CHANTYPES").flatten()
    }

    pub fn prefix(&self) -> Option<PrefixSpec<'a>> {
        self.get("PREFIX").flatten().and_then(PrefixSpec::parse)
    }

    pub fn chanmodes(&self) -> Option<ChanModes<'a>> {
        self.get("CHANMODES").flatten().and_then(ChanModes::parse)
    }
}

/// `PREFIX=(modes)prefixes`, e.g. `(ov)@+`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrefixSpec<'a> {
    pub modes: &'a str,
    pub prefixes: &'a str,
}

impl<'a> PrefixSpec<'a> {
    pub fn parse(s: &'a str) -> Option<Self> {
        let rest = s.strip_prefix('(')?;
        let (modes, prefixes) = rest.split_once(')')?;
        if modes.chars().count() != prefixes.chars().count() {
            return None;
        }
        Some(PrefixSpec { modes, prefixes })
    }
}

/// `CHANMODES=A,B,C,D`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChanModes<'a> {
    pub a: &'a str,
    pub b: &'a str,
    pub c: &'a str,
    pub d: &'a str,
}

impl<'a> ChanModes<'a> {
    pub fn parse(s: &'a str) -> Option<Self> {
        let mut parts = s.splitn(4, ',');
        let (a, b, c, d) = (parts.next()?, parts.next()?, parts.next()?, parts.next()?);
        Some(ChanModes { a, b, c, d })
    }
}

/// How a channel mode letter takes its argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeClass {
    /// Grants a membership prefix; always takes a nickname.
    Prefix,
    /// List mode; always takes an argument.
    A,
    /// Always takes an argument.
    B,
    /// Takes an argument only when set.
    C,
    /// Never takes an argument.
    D,
}

/// Server parameters the client acts on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerSupport {
    prefix_modes: Vec<char>,
    prefixes: Vec<char>,
    chanmodes: [String; 4],
    chantypes: String,
}

impl Default for ServerSupport {
    fn default() -> Self {
        Self {
            prefix_modes: vec!['o', 'v'],
            prefixes: vec!['@', '+'],
            chanmodes: [
                "b".to_owned(),
                "k".to_owned(),
                "l".to_owned(),
                "imnpst".to_owned(),
            ],
            chantypes: "#&".to_owned(),
        }
    }
}

impl ServerSupport {
    /// Merge the tokens of one 005 line.
    pub fn apply(&mut self, isupport: &Isupport<'_>) {
        if let Some(prefix) = isupport.prefix() {
            self.prefix_modes = prefix.modes.chars().collect();
            self.prefixes = prefix.prefixes.chars().collect();
        }
        if let Some(modes) = isupport.chanmodes() {
            self.chanmodes = [
                modes.a.to_owned(),
                modes.b.to_owned(),
                modes.c.to_owned(),
                modes.d.to_owned(),
            ];
        }
        if let Some(types) = isupport.chantypes() {
            self.chantypes = types.to_owned();
        }
    }

    /// Prefix characters, highest rank first.
    pub fn prefixes(&self) -> &[char] {
        &self.prefixes
    }

    /// Prefix mode letters, in the same order as [`Self::prefixes`].
    pub fn prefix_modes(&self) -> &[char] {
        &self.prefix_modes
    }

    pub fn chantypes(&self) -> &str {
        &self.chantypes
    }

    pub fn is_prefix(&self, c: char) -> bool {
        self.prefixes.contains(&c)
    }

    /// The prefix character granted by a prefix mode letter.
    pub fn prefix_for_mode(&self, mode: char) -> Option<char> {
        let index = self.prefix_modes.iter().position(|&m| m == mode)?;
        self.prefixes.get(index).copied()
    }

    /// Rank of a prefix character, `0` being the highest.
    pub fn rank(&self, prefix: char) -> Option<usize> {
        self.prefixes.iter().position(|&p| p == prefix)
    }

    pub fn mode_class(&self, mode: char) -> ModeClass {
        if self.prefix_modes.contains(&mode) {
            return ModeClass::Prefix;
        }
        let [a, b, c, _] = &self.chanmodes;
        if a.contains(mode) {
            ModeClass::A
        } else if b.contains(mode) {
            ModeClass::B
        } else if c.contains(mode) {
            ModeClass::C
        } else {
            ModeClass::D
        }
    }

    /// Whether `target` names a channel.
    pub fn is_channel(&self, target: &str) -> bool {
        target
            .chars()
            .next()
            .is_some_and(|c| self.chantypes.contains(c))
    }

    /// Split the leading prefix characters off a NAMES entry.
    pub fn split_prefixes<'a>(&self, name: &'a str) -> (&'a str, &'a str) {
        let start = name
            .char_indices()
            .find(|&(_, c)| !self.is_prefix(c))
            .map_or(name.len(), |(i, _)| i);
        name.split_at(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_args() {
        let args = [
            "me",
            "PREFIX=(qaohv)~&@%+",
            "CHANTYPES=#",
            "EXCEPTS",
            "are supported by this server",
        ];
        let isupport = Isupport::from_response_args(&args).unwrap();
        assert_eq!(isupport.chantypes(), Some("#"));
        assert_eq!(isupport.get("EXCEPTS"), Some(None));
        assert_eq!(isupport.get("are"), None);

        let prefix = isupport.prefix().unwrap();
        assert_eq!(prefix.modes, "qaohv");
        assert_eq!(prefix.prefixes, "~&@%+");
    }

    #[test]
    fn test_prefix_spec_rejects_mismatch() {
        assert!(PrefixSpec::parse("(ov)@").is_none());
        assert!(PrefixSpec::parse("@+").is_none());
    }

    #[test]
    fn test_chanmodes() {
        let modes = ChanModes::parse("beI,k,l,imnpst").unwrap();
        assert_eq!(modes.a, "beI");
        assert_eq!(modes.d, "imnpst");
        assert!(ChanModes::parse("b,k").is_none());
    }

    #[test]
    fn test_server_support_defaults() {
        let support = ServerSupport::default();
        assert_eq!(support.prefix_for_mode('o'), Some('@'));
        assert_eq!(support.mode_class('v'), ModeClass::Prefix);
        assert_eq!(support.mode_class('b'), ModeClass::A);
        assert_eq!(support.mode_class('k'), ModeClass::B);
        assert_eq!(support.mode_class('l'), ModeClass::C);
        assert_eq!(support.mode_class('n'), ModeClass::D);
        assert!(support.is_channel("#rust"));
        assert!(!support.is_channel("alice"));
    }

    #[test]
    fn test_server_support_apply() {
        let mut support = ServerSupport::default();
        let args = ["me", "PREFIX=(qov)~@+", "CHANMODES=beI,k,fl,imnt", "CHANTYPES=#!", ":are supported"];
        support.apply(&Isupport::from_response_args(&args).unwrap());

        assert_eq!(support.prefixes(), &['~', '@', '+']);
        assert_eq!(support.rank('~'), Some(0));
        assert_eq!(support.mode_class('I'), ModeClass::A);
        assert_eq!(support.mode_class('f'), ModeClass::C);
        assert!(support.is_channel("!abc"));
        assert_eq!(support.split_prefixes("~@alice"), ("~@", "alice"));
        assert_eq!(support.split_prefixes("bob"), ("", "bob"));
    }
}
