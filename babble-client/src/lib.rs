//! A small client library for babble, mirroring the original's
//! `client_login`/`client_follow`/`client_publish`/`client_timeline`/
//! `client_follow_count`/`client_rdv` (`examples/original_source/stage_1/
//! babble_client_implem.c`), but returning `Result` instead of sentinel
//! integers and hiding the wire framing behind `babble-wire`.
//!
//! Used both by `babble_client`, the CLI binary, and by `babble-server`'s
//! own integration tests as a dev-dependency.

pub mod error;

use std::io::{BufReader, Write};
use std::net::TcpStream;

use babble_core::registry::ClientKey;
use babble_core::Cid;
use babble_wire::framing::{recv_frame, send_frame};

pub use error::ClientError;

/// One entry in a received timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub author: String,
    pub text: String,
}

/// A connected session, not yet logged in or already logged in -- the type
/// doesn't track that state, since a raw TCP connection doesn't either.
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Client {
    pub fn connect(host: &str, port: u16) -> Result<Self, ClientError> {
        let stream = TcpStream::connect((host, port))?;
        let writer = stream.try_clone()?;
        Ok(Client { reader: BufReader::new(stream), writer })
    }

    fn send_line(&mut self, cid: Cid, payload: &str, streaming: bool) -> Result<(), ClientError> {
        let line = if streaming {
            format!("S {} {payload}", cid as u8)
        } else if payload.is_empty() {
            format!("{}", cid as u8)
        } else {
            format!("{} {payload}", cid as u8)
        };
        send_frame(&mut self.writer, line.as_bytes())?;
        Ok(())
    }

    fn recv_text(&mut self) -> Result<String, ClientError> {
        let frame = recv_frame(&mut self.reader)?.ok_or(ClientError::UnexpectedEof)?;
        String::from_utf8(frame).map_err(|_| ClientError::UnexpectedReply("non-UTF-8 reply".to_string()))
    }

    /// LOGIN. Always synchronous: the server answers before anything else
    /// this connection sends is processed.
    pub fn login(&mut self, name: &str) -> Result<ClientKey, ClientError> {
        self.send_line(Cid::Login, name, false)?;
        let reply = self.recv_text()?;
        if reply == "login_failed" {
            return Err(ClientError::LoginFailed);
        }
        let hex_key = reply
            .strip_prefix("login_ack ")
            .ok_or_else(|| ClientError::UnexpectedReply(reply.clone()))?;
        let raw = u64::from_str_radix(hex_key, 16)
            .map_err(|_| ClientError::UnexpectedReply(reply.clone()))?;
        Ok(ClientKey(raw))
    }

    /// FOLLOW. When `streaming` is set, no reply is read (the server won't
    /// send one either).
    pub fn follow(&mut self, target_name: &str, streaming: bool) -> Result<(), ClientError> {
        self.send_line(Cid::Follow, target_name, streaming)?;
        if streaming {
            return Ok(());
        }
        let reply = self.recv_text()?;
        if let Some(message) = reply.strip_prefix("error ") {
            return Err(ClientError::ServerError(message.to_string()));
        }
        if reply != "follow" {
            return Err(ClientError::UnexpectedReply(reply));
        }
        Ok(())
    }

    /// PUBLISH. Returns the echoed `(author, text)` pair on a non-streaming
    /// call.
    pub fn publish(&mut self, text: &str, streaming: bool) -> Result<Option<(String, String)>, ClientError> {
        self.send_line(Cid::Publish, text, streaming)?;
        if streaming {
            return Ok(None);
        }
        let reply = self.recv_text()?;
        if let Some(message) = reply.strip_prefix("error ") {
            return Err(ClientError::ServerError(message.to_string()));
        }
        parse_publish_ack(&reply).map(Some)
    }

    /// TIMELINE: receives the two-phase reply and returns every publication,
    /// newest first.
    pub fn timeline(&mut self) -> Result<Vec<TimelineEntry>, ClientError> {
        self.send_line(Cid::Timeline, "", false)?;

        let count_frame = recv_frame(&mut self.reader)?.ok_or(ClientError::UnexpectedEof)?;
        let item_count = u32::from_be_bytes(
            count_frame
                .try_into()
                .map_err(|_| ClientError::UnexpectedReply("malformed timeline item count".to_string()))?,
        );

        let size_frame = recv_frame(&mut self.reader)?.ok_or(ClientError::UnexpectedEof)?;
        let timeline_size = u32::from_be_bytes(
            size_frame
                .try_into()
                .map_err(|_| ClientError::UnexpectedReply("malformed timeline size".to_string()))?,
        );
        let _ = item_count; // item_count == timeline_size + 1, by construction

        let mut entries = Vec::with_capacity(timeline_size as usize);
        for _ in 0..timeline_size {
            let text = self.recv_text()?;
            entries.push(parse_timeline_entry(&text)?);
        }
        Ok(entries)
    }

    /// FOLLOW_COUNT.
    pub fn follow_count(&mut self) -> Result<usize, ClientError> {
        self.send_line(Cid::FollowCount, "", false)?;
        let reply = self.recv_text()?;
        if let Some(message) = reply.strip_prefix("error ") {
            return Err(ClientError::ServerError(message.to_string()));
        }
        reply
            .parse()
            .map_err(|_| ClientError::UnexpectedReply(reply))
    }

    /// RDV: a liveness probe.
    pub fn rdv(&mut self) -> Result<(), ClientError> {
        self.send_line(Cid::Rdv, "", false)?;
        let reply = self.recv_text()?;
        if reply != "rdv_ack" {
            return Err(ClientError::UnexpectedReply(reply));
        }
        Ok(())
    }
}

fn parse_publish_ack(reply: &str) -> Result<(String, String), ClientError> {
    let author = extract_json_field(reply, "author")
        .ok_or_else(|| ClientError::UnexpectedReply(reply.to_string()))?;
    let text = extract_json_field(reply, "msg")
        .ok_or_else(|| ClientError::UnexpectedReply(reply.to_string()))?;
    Ok((author, text))
}

/// Pulls `"key":"value"` out of the PUBLISH ack's JSON-looking body without
/// pulling in a JSON parser for one flat pair of fields.
fn extract_json_field(text: &str, key: &str) -> Option<String> {
    let needle = format!(r#""{key}":""#);
    let start = text.find(&needle)? + needle.len();
    let end = text[start..].find('"')? + start;
    Some(text[start..end].to_string())
}

fn parse_timeline_entry(line: &str) -> Result<TimelineEntry, ClientError> {
    let (author, text) = line
        .split_once(": ")
        .ok_or_else(|| ClientError::UnexpectedReply(line.to_string()))?;
    Ok(TimelineEntry { author: author.to_string(), text: text.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_both_publish_ack_fields() {
        let reply = r#"{"author":"alice","msg":"hello"}"#;
        let (author, text) = parse_publish_ack(reply).unwrap();
        assert_eq!(author, "alice");
        assert_eq!(text, "hello");
    }

    #[test]
    fn splits_a_timeline_entry_on_the_first_colon_space() {
        let entry = parse_timeline_entry("alice: hi: there").unwrap();
        assert_eq!(entry.author, "alice");
        assert_eq!(entry.text, "hi: there");
    }
}
