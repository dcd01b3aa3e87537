use std::fmt::{self, Write};

use super::Command;

/// The part of `arg` before any line break, so that one command can
/// never render as several lines.
fn single_line(arg: &str) -> &str {
    arg.find(['\r', '\n']).map_or(arg, |end| &arg[..end])
}

/// Write a command with plain arguments, none of them trailing.
fn write_cmd(f: &mut fmt::Formatter<'_>, cmd: &str, args: &[&str]) -> fmt::Result {
    f.write_str(cmd)?;
    for arg in args {
        f.write_char(' ')?;
        f.write_str(single_line(arg))?;
    }
    Ok(())
}

/// Write a command with a freeform (always colon-prefixed) trailing argument.
fn write_cmd_freeform(f: &mut fmt::Formatter<'_>, cmd: &str, args: &[&str]) -> fmt::Result {
    match args.split_last() {
        Some((suffix, middle)) => {
            write_cmd(f, cmd, middle)?;
            f.write_str(" :")?;
            f.write_str(single_line(suffix))
        }
        None => f.write_str(cmd),
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::STARTTLS => f.write_str("STARTTLS"),
            Command::CapLs => write_cmd(f, "CAP", &["LS"]),
            Command::CapReq(caps) => write_cmd_freeform(f, "CAP", &["REQ", &caps.join(" ")]),
            Command::CapEnd => write_cmd(f, "CAP", &["END"]),
            Command::AUTHENTICATE(data) => write_cmd(f, "AUTHENTICATE", &[data]),
            Command::USER(user, local, server, real) => {
                write_cmd_freeform(f, "USER", &[user, local, server, real])
            }
            Command::NICK(nick) => write_cmd(f, "NICK", &[nick]),
            Command::JOIN(chan, Some(key)) if !key.is_empty() => write_cmd(f, "JOIN", &[chan, key]),
            Command::JOIN(chan, _) => write_cmd(f, "JOIN", &[chan]),
            Command::PART(chan, Some(msg)) if !msg.is_empty() => {
                write_cmd_freeform(f, "PART", &[chan, msg])
            }
            Command::PART(chan, _) => write_cmd(f, "PART", &[chan]),
            Command::PRIVMSG(target, text) => write_cmd_freeform(f, "PRIVMSG", &[target, text]),
            Command::NOTICE(target, text) => write_cmd_freeform(f, "NOTICE", &[target, text]),
            Command::PONG(token) => write_cmd(f, "PONG", &[token]),
            Command::QUIT(msg) => write_cmd_freeform(f, "QUIT", &[msg]),
            Command::Raw(line) => f.write_str(single_line(line)),
        }
    }
}
