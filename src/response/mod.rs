//! IRC numeric replies the client reacts to.
//!
//! Only the numerics that drive registration, membership tracking or
//! STARTTLS/SASL are named here. Every other numeric still reaches
//! observers through the numeric event with its raw code.
//!
//! # Reference
//! - RFC 2812: Internet Relay Chat: Client Protocol
//! - Modern IRC documentation: <https://modern.ircdocs.horse/>

#![allow(non_camel_case_types)]

use std::str::FromStr;

/// IRC server response code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
#[non_exhaustive]
pub enum Response {
    // === Connection Registration (001-099) ===
    /// Welcome to the IRC network
    RPL_WELCOME = 1,
    /// Your host is running version
    RPL_YOURHOST = 2,
    /// Server creation date
    RPL_CREATED = 3,
    /// Server info (name, version, user modes, channel modes)
    RPL_MYINFO = 4,
    /// Server supported features (ISUPPORT); "Try server" bounce on RFC 1459 servers
    RPL_ISUPPORT = 5,
    /// Bounce to another server
    RPL_BOUNCE = 10,

    // === Luser replies ===
    /// Luser client count
    RPL_LUSERCLIENT = 251,
    /// Luser operator count
    RPL_LUSEROP = 252,
    /// Luser unknown connections
    RPL_LUSERUNKNOWN = 253,
    /// Luser channel count
    RPL_LUSERCHANNELS = 254,
    /// Luser local info
    RPL_LUSERME = 255,

    // === Channel replies ===
    /// Channel topic
    RPL_TOPIC = 332,
    /// NAMES reply
    RPL_NAMREPLY = 353,
    /// End of NAMES
    RPL_ENDOFNAMES = 366,

    // === MOTD ===
    /// MOTD line
    RPL_MOTD = 372,
    /// MOTD start
    RPL_MOTDSTART = 375,
    /// End of MOTD
    RPL_ENDOFMOTD = 376,

    // === Errors ===
    /// Unknown command
    ERR_UNKNOWNCOMMAND = 421,
    /// MOTD file is missing
    ERR_NOMOTD = 422,
    /// No nickname given
    ERR_NONICKNAMEGIVEN = 431,
    /// Erroneous nickname
    ERR_ERRONEOUSNICKNAME = 432,
    /// Nickname is already in use
    ERR_NICKNAMEINUSE = 433,
    /// Nickname collision
    ERR_NICKCOLLISION = 436,
    /// Nick/channel temporarily unavailable
    ERR_UNAVAILRESOURCE = 437,
    /// You have not registered
    ERR_NOTREGISTERED = 451,
    /// Already registered
    ERR_ALREADYREGISTERED = 462,
    /// Password incorrect
    ERR_PASSWDMISMATCH = 464,
    /// You are banned from this server
    ERR_YOUREBANNEDCREEP = 465,

    // === STARTTLS ===
    /// STARTTLS successful, proceed with TLS handshake
    RPL_STARTTLS = 670,
    /// STARTTLS failed
    ERR_STARTTLS = 691,

    // === SASL (900-908) ===
    /// Logged in as account
    RPL_LOGGEDIN = 900,
    /// Logged out
    RPL_LOGGEDOUT = 901,
    /// Nick locked
    ERR_NICKLOCKED = 902,
    /// SASL authentication successful
    RPL_SASLSUCCESS = 903,
    /// SASL authentication failed
    ERR_SASLFAIL = 904,
    /// SASL message too long
    ERR_SASLTOOLONG = 905,
    /// SASL authentication aborted
    ERR_SASLABORT = 906,
    /// Already authenticated
    ERR_SASLALREADY = 907,
    /// Available SASL mechanisms
    RPL_SASLMECHS = 908,
}

impl Response {
    /// Returns the numeric code
    #[inline]
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Creates a Response from a numeric code
    pub fn from_code(code: u16) -> Option<Response> {
        Some(match code {
            1 => Response::RPL_WELCOME,
            2 => Response::RPL_YOURHOST,
            3 => Response::RPL_CREATED,
            4 => Response::RPL_MYINFO,
            5 => Response::RPL_ISUPPORT,
            10 => Response::RPL_BOUNCE,
            251 => Response::RPL_LUSERCLIENT,
            252 => Response::RPL_LUSEROP,
            253 => Response::RPL_LUSERUNKNOWN,
            254 => Response::RPL_LUSERCHANNELS,
            255 => Response::RPL_LUSERME,
            332 => Response::RPL_TOPIC,
            353 => Response::RPL_NAMREPLY,
            366 => Response::RPL_ENDOFNAMES,
            372 => Response::RPL_MOTD,
            375 => Response::RPL_MOTDSTART,
            376 => Response::RPL_ENDOFMOTD,
            421 => Response::ERR_UNKNOWNCOMMAND,
            422 => Response::ERR_NOMOTD,
            431 => Response::ERR_NONICKNAMEGIVEN,
            432 => Response::ERR_ERRONEOUSNICKNAME,
            433 => Response::ERR_NICKNAMEINUSE,
            436 => Response::ERR_NICKCOLLISION,
            437 => Response::ERR_UNAVAILRESOURCE,
            451 => Response::ERR_NOTREGISTERED,
            462 => Response::ERR_ALREADYREGISTERED,
            464 => Response::ERR_PASSWDMISMATCH,
            465 => Response::ERR_YOUREBANNEDCREEP,
            670 => Response::RPL_STARTTLS,
            691 => Response::ERR_STARTTLS,
            900 => Response::RPL_LOGGEDIN,
            901 => Response::RPL_LOGGEDOUT,
            902 => Response::ERR_NICKLOCKED,
            903 => Response::RPL_SASLSUCCESS,
            904 => Response::ERR_SASLFAIL,
            905 => Response::ERR_SASLTOOLONG,
            906 => Response::ERR_SASLABORT,
            907 => Response::ERR_SASLALREADY,
            908 => Response::RPL_SASLMECHS,
            _ => return None,
        })
    }

    /// Check if this is an error response
    #[inline]
    pub fn is_error(&self) -> bool {
        let code = self.code();
        (400..600).contains(&code) || code == 691 || (902..=907).contains(&code)
    }

    /// Any of 001-004, each of which proves the server accepted our registration.
    #[inline]
    pub fn is_welcome(&self) -> bool {
        matches!(
            self,
            Response::RPL_WELCOME
                | Response::RPL_YOURHOST
                | Response::RPL_CREATED
                | Response::RPL_MYINFO
        )
    }

    /// Nickname refusals that a different nickname can fix.
    #[inline]
    pub fn is_nick_taken(&self) -> bool {
        matches!(
            self,
            Response::ERR_NICKNAMEINUSE | Response::ERR_NICKCOLLISION | Response::ERR_UNAVAILRESOURCE
        )
    }

    /// Check if this is a SASL-related response (900-908)
    #[inline]
    pub fn is_sasl(&self) -> bool {
        let code = self.code();
        (900..=908).contains(&code)
    }
}

impl FromStr for Response {
    type Err = ParseResponseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code: u16 = s.parse().map_err(|_| ParseResponseError::InvalidFormat)?;
        Response::from_code(code).ok_or(ParseResponseError::UnknownCode(code))
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}", self.code())
    }
}

/// Error when parsing a response code
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseResponseError {
    /// The string was not a valid number
    InvalidFormat,
    /// The numeric code is not a known response
    UnknownCode(u16),
}

impl std::fmt::Display for ParseResponseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat => write!(f, "invalid response code format"),
            Self::UnknownCode(code) => write!(f, "unknown response code: {}", code),
        }
    }
}

impl std::error::Error for ParseResponseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_code() {
        assert_eq!(Response::RPL_WELCOME.code(), 1);
        assert_eq!(Response::ERR_NICKNAMEINUSE.code(), 433);
        assert_eq!(Response::RPL_STARTTLS.code(), 670);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Response::from_code(1), Some(Response::RPL_WELCOME));
        assert_eq!(Response::from_code(353), Some(Response::RPL_NAMREPLY));
        assert_eq!(Response::from_code(9999), None);
    }

    #[test]
    fn test_classification() {
        assert!(Response::RPL_MYINFO.is_welcome());
        assert!(!Response::RPL_ISUPPORT.is_welcome());
        assert!(Response::ERR_NICKCOLLISION.is_nick_taken());
        assert!(!Response::ERR_ERRONEOUSNICKNAME.is_nick_taken());
        assert!(Response::ERR_ERRONEOUSNICKNAME.is_error());
        assert!(Response::ERR_STARTTLS.is_error());
        assert!(Response::RPL_SASLSUCCESS.is_sasl());
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("001".parse::<Response>().unwrap(), Response::RPL_WELCOME);
        assert!("abc".parse::<Response>().is_err());
        assert_eq!(format!("{}", Response::RPL_BOUNCE), "010");
    }
}
