//! Renders an [`Answer`] to the exact wire bytes the client expects
//! (`spec.md` §6): a single frame for every command except TIMELINE, whose
//! two-phase reply (item count, then timeline size, then `count - 1` framed
//! items) is grounded in
//! `examples/original_source/stage_1/babble_client_implem.c`'s
//! `recv_timeline_msg_and_print`.

use std::io::{self, Write};

use babble_core::Answer;

use crate::framing::send_frame;

/// Write `answer` as one or more frames to `writer`.
pub fn send_answer<W: Write>(writer: &mut W, answer: &Answer) -> io::Result<()> {
    match answer {
        Answer::LoginAck { key } => send_frame(writer, format!("login_ack {key}").as_bytes()),
        Answer::LoginFailed => send_frame(writer, b"login_failed"),
        Answer::PublishAck { author, text } => send_frame(
            writer,
            format!(r#"{{"author":"{author}","msg":"{text}"}}"#).as_bytes(),
        ),
        Answer::FollowAck => send_frame(writer, b"follow"),
        Answer::FollowCountAck { count } => send_frame(writer, count.to_string().as_bytes()),
        Answer::RdvAck => send_frame(writer, b"rdv_ack"),
        Answer::Error { message } => send_frame(writer, format!("error {message}").as_bytes()),
        Answer::Timeline { publications } => {
            // `item_count` includes the timeline-size frame that follows it;
            // the client subtracts one before reading that many publications.
            let item_count = publications.len() as u32 + 1;
            let timeline_size = publications.len() as u32;
            send_frame(writer, &item_count.to_be_bytes())?;
            send_frame(writer, &timeline_size.to_be_bytes())?;
            for publication in publications {
                send_frame(
                    writer,
                    format!("{}: {}", publication.author, publication.text).as_bytes(),
                )?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::recv_frame;
    use babble_core::registry::Publication;
    use std::io::Cursor;

    #[test]
    fn timeline_reply_has_the_documented_two_phase_shape() {
        let publications = vec![
            Publication { author: "alice".into(), text: "hi".into(), seq: 1 },
            Publication { author: "alice".into(), text: "yo".into(), seq: 0 },
        ];
        let mut buf = Vec::new();
        send_answer(&mut buf, &Answer::Timeline { publications }).unwrap();

        let mut cursor = Cursor::new(buf);
        let count = u32::from_be_bytes(recv_frame(&mut cursor).unwrap().unwrap().try_into().unwrap());
        let size = u32::from_be_bytes(recv_frame(&mut cursor).unwrap().unwrap().try_into().unwrap());
        assert_eq!(count, 3);
        assert_eq!(size, 2);
        assert_eq!(recv_frame(&mut cursor).unwrap().unwrap(), b"alice: hi");
        assert_eq!(recv_frame(&mut cursor).unwrap().unwrap(), b"alice: yo");
    }

    #[test]
    fn publish_ack_contains_a_json_looking_object() {
        let mut buf = Vec::new();
        send_answer(
            &mut buf,
            &Answer::PublishAck { author: "a".into(), text: "b".into() },
        )
        .unwrap();
        let mut cursor = Cursor::new(buf);
        let frame = recv_frame(&mut cursor).unwrap().unwrap();
        assert!(String::from_utf8(frame).unwrap().contains('{'));
    }
}
