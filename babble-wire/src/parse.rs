//! Parses one framed wire line into a [`Cid`] + payload, per `spec.md` §6's
//! `"<S ><cid> <payload>\n"` grammar.

use babble_core::config::{ID_SIZE, PUBLICATION_SIZE};
use babble_core::Cid;

use crate::error::WireError;

/// A parsed, not-yet-dispatched command line.
pub struct ParsedLine {
    pub cid: Cid,
    pub streaming: bool,
    pub payload: String,
}

/// Parse one line of the wire grammar. `line` must already have its framing
/// and trailing newline stripped by the caller.
pub fn parse_line(line: &str) -> Result<ParsedLine, WireError> {
    let (streaming, rest) = match line.strip_prefix("S ") {
        Some(rest) => (true, rest),
        None => (false, line),
    };

    let mut parts = rest.splitn(2, ' ');
    let cid_token = parts.next().filter(|s| !s.is_empty()).ok_or(WireError::MalformedLine)?;
    let payload = parts.next().unwrap_or("").to_string();

    let raw_cid: u8 = cid_token.parse().map_err(|_| WireError::MalformedLine)?;
    let cid = Cid::from_u8(raw_cid).ok_or(WireError::UnknownCommandId(raw_cid))?;

    let limit = match cid {
        Cid::Login | Cid::Follow => Some(ID_SIZE),
        Cid::Publish => Some(PUBLICATION_SIZE),
        Cid::Timeline | Cid::FollowCount | Cid::Rdv | Cid::Unregister => None,
    };

    match (limit, cid) {
        (Some(_), Cid::Login | Cid::Follow | Cid::Publish) if payload.is_empty() => {
            return Err(WireError::MalformedLine)
        }
        _ => {}
    }

    if let Some(limit) = limit {
        if payload.len() > limit {
            return Err(WireError::PayloadTooLong {
                limit,
                actual: payload.len(),
            });
        }
    }

    Ok(ParsedLine { cid, streaming, payload })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_plain_login() {
        let parsed = parse_line("1 alice").unwrap();
        assert_eq!(parsed.cid, Cid::Login);
        assert!(!parsed.streaming);
        assert_eq!(parsed.payload, "alice");
    }

    #[test]
    fn strips_the_streaming_prefix() {
        let parsed = parse_line("S 2 hello world").unwrap();
        assert_eq!(parsed.cid, Cid::Publish);
        assert!(parsed.streaming);
        assert_eq!(parsed.payload, "hello world");
    }

    #[test]
    fn rejects_unknown_command_ids() {
        assert!(matches!(
            parse_line("99 x"),
            Err(WireError::UnknownCommandId(99))
        ));
    }

    #[test]
    fn payload_at_the_limit_is_accepted_limit_plus_one_is_rejected() {
        let at_limit = "a".repeat(ID_SIZE);
        assert!(parse_line(&format!("1 {at_limit}")).is_ok());

        let over_limit = "a".repeat(ID_SIZE + 1);
        assert!(matches!(
            parse_line(&format!("1 {over_limit}")),
            Err(WireError::PayloadTooLong { .. })
        ));
    }

    #[test]
    fn commands_without_a_payload_parse_with_an_empty_one() {
        let parsed = parse_line("4").unwrap();
        assert_eq!(parsed.cid, Cid::Timeline);
        assert_eq!(parsed.payload, "");
    }
}
