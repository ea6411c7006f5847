use serde_json::Value;

/// Semantic event kinds produced by the view.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    DblClick,
    MouseDown,
    MouseUp,
    MouseOver,
    MouseOut,
    Load,
    Interaction,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::DblClick => "dblclick",
            EventKind::MouseDown => "mousedown",
            EventKind::MouseUp => "mouseup",
            EventKind::MouseOver => "mouseover",
            EventKind::MouseOut => "mouseout",
            EventKind::Load => "load",
            EventKind::Interaction => "interaction",
        }
    }

    pub fn from_discriminator(s: &str) -> Option<Self> {
        match s {
            "click" => Some(EventKind::Click),
            "dblclick" => Some(EventKind::DblClick),
            "mousedown" => Some(EventKind::MouseDown),
            "mouseup" => Some(EventKind::MouseUp),
            "mouseover" => Some(EventKind::MouseOver),
            "mouseout" => Some(EventKind::MouseOut),
            "load" => Some(EventKind::Load),
            "interaction" => Some(EventKind::Interaction),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying an inbound message.
#[derive(Debug, PartialEq)]
pub enum Classified<'a> {
    /// A known event; payload is the whole message.
    Event(EventKind, &'a Value),
    /// Carried a discriminator this host does not know. Dispatches to
    /// nobody.
    Unknown(&'a str),
}

/// The message carried no discriminator. Recoverable: inbound messages
/// have no caller to report to, so these are dropped (and logged) rather
/// than raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedMessage;

impl std::fmt::Display for MalformedMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("inbound message carries no `type` or `event` discriminator")
    }
}

impl std::error::Error for MalformedMessage {}

/// Splits an inbound view message into its event kind and payload.
///
/// A message is a JSON mapping carrying its discriminator under `type` or
/// `event` (the view uses both, depending on the event source).
pub fn classify(message: &Value) -> Result<Classified<'_>, MalformedMessage> {
    let map = message.as_object().ok_or(MalformedMessage)?;
    let disc = map
        .get("type")
        .or_else(|| map.get("event"))
        .and_then(Value::as_str)
        .ok_or(MalformedMessage)?;
    match EventKind::from_discriminator(disc) {
        Some(kind) => Ok(Classified::Event(kind, message)),
        None => Ok(Classified::Unknown(disc)),
    }
}

#[cfg(test)]
mod tests {
    use super::{Classified, EventKind, classify};
    use serde_json::json;

    #[test]
    fn classifies_type_and_event_discriminators() {
        let click = json!({"type": "click", "feature": {"id": 1}});
        assert!(matches!(
            classify(&click),
            Ok(Classified::Event(EventKind::Click, _))
        ));

        let load = json!({"event": "load"});
        assert!(matches!(
            classify(&load),
            Ok(Classified::Event(EventKind::Load, _))
        ));
    }

    #[test]
    fn missing_discriminator_is_malformed() {
        assert!(classify(&json!({"feature": {}})).is_err());
        assert!(classify(&json!("click")).is_err());
        assert!(classify(&json!({"type": 7})).is_err());
    }

    #[test]
    fn unknown_discriminator_is_not_an_error() {
        let msg = json!({"type": "telemetry"});
        assert_eq!(classify(&msg), Ok(Classified::Unknown("telemetry")));
    }
}
