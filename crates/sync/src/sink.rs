use std::io::Write;

use crate::patch::Outbound;

/// Receives outbound traffic. Sends are fire-and-forget: a sink must not
/// block, and there is no acknowledgement or timeout. If the view never
/// applies a patch, local state remains the source of truth.
pub trait PatchSink {
    fn send(&mut self, out: Outbound);
}

/// Keeps outbound traffic in memory, in send order. The test and
/// inspection sink.
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Vec<Outbound>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> &[Outbound] {
        &self.sent
    }

    pub fn drain(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.sent)
    }
}

impl PatchSink for RecordingSink {
    fn send(&mut self, out: Outbound) {
        self.sent.push(out);
    }
}

/// Writes one JSON document per line. Serialization and IO failures are
/// logged and swallowed: there is nobody downstream to report to.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        JsonLinesSink { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> PatchSink for JsonLinesSink<W> {
    fn send(&mut self, out: Outbound) {
        let line = match serde_json::to_string(&out) {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(%err, "failed to serialize outbound message");
                return;
            }
        };
        if let Err(err) = writeln!(self.out, "{line}") {
            tracing::warn!(%err, "failed to write outbound message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonLinesSink, PatchSink, RecordingSink};
    use crate::patch::{Outbound, StatePatch};
    use foundation::ids::EntityId;
    use serde_json::json;

    #[test]
    fn recording_sink_preserves_send_order() {
        let mut sink = RecordingSink::new();
        sink.send(Outbound::Patch(StatePatch::single(
            EntityId::new(0),
            "a",
            json!(1),
        )));
        sink.send(Outbound::Patch(StatePatch::single(
            EntityId::new(0),
            "b",
            json!(2),
        )));
        let sent = sink.sent();
        assert_eq!(sent.len(), 2);
        let Outbound::Patch(first) = &sent[0] else {
            panic!("expected patch");
        };
        assert!(first.changes.contains_key("a"));
    }

    #[test]
    fn json_lines_sink_writes_one_line_per_send() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.send(Outbound::Patch(StatePatch::single(
            EntityId::new(1),
            "visible",
            json!(false),
        )));
        sink.send(Outbound::Patch(StatePatch::single(
            EntityId::new(2),
            "visible",
            json!(true),
        )));
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text.lines().count(), 2);
        for line in text.lines() {
            serde_json::from_str::<Outbound>(line).unwrap();
        }
    }
}
