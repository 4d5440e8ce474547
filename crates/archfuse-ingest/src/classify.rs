//! Lexical cues shared by every parser that only sees label text.

use archfuse_core::{NodeKind, Protocol};

/// Label prefixes that name a node type outright. Matched ignoring case and
/// removed from the visible label.
const TYPE_PREFIXES: [(&str, NodeKind); 4] = [
    ("db:", NodeKind::Db),
    ("q:", NodeKind::Queue),
    ("gw:", NodeKind::Gateway),
    ("ext:", NodeKind::Ext),
];

/// Derive a node type from a label and return the label with any type
/// prefix removed.
///
/// Precedence: `db:`, then `q:` or the word `queue`, then `gw:` or the word
/// `gateway`, then `ext:`. Everything else is a service.
pub fn classify_label(label: &str) -> (NodeKind, String) {
    let trimmed = label.trim();
    let lower = trimmed.to_ascii_lowercase();

    let prefix = TYPE_PREFIXES
        .iter()
        .find(|(p, _)| lower.starts_with(p))
        .copied();
    // Prefixes are ASCII, so the byte offset is a char boundary.
    let visible = match prefix {
        Some((p, _)) => trimmed[p.len()..].trim(),
        None => trimmed,
    };
    let prefixed = |kind: NodeKind| matches!(prefix, Some((_, k)) if k == kind);

    let kind = if prefixed(NodeKind::Db) {
        NodeKind::Db
    } else if prefixed(NodeKind::Queue) || lower.contains("queue") {
        NodeKind::Queue
    } else if prefixed(NodeKind::Gateway) || lower.contains("gateway") {
        NodeKind::Gateway
    } else if prefixed(NodeKind::Ext) {
        NodeKind::Ext
    } else {
        NodeKind::Service
    };
    (kind, visible.to_string())
}

/// Substring match against edge text. `grpc` is checked before `rest`, and
/// `pub` before `sub`, so `pubsub` reads as a publish.
pub fn guess_protocol(text: &str) -> Protocol {
    let lower = text.to_ascii_lowercase();
    if lower.contains("grpc") {
        Protocol::Grpc
    } else if lower.contains("rest") {
        Protocol::Rest
    } else if lower.contains("pub") {
        Protocol::Pub
    } else if lower.contains("sub") {
        Protocol::Sub
    } else {
        Protocol::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_cues_are_stripped() {
        assert_eq!(classify_label("db:Orders"), (NodeKind::Db, "Orders".into()));
        assert_eq!(classify_label("DB: Orders"), (NodeKind::Db, "Orders".into()));
        assert_eq!(classify_label("q:events"), (NodeKind::Queue, "events".into()));
        assert_eq!(classify_label("gw:edge"), (NodeKind::Gateway, "edge".into()));
        assert_eq!(classify_label("ext:Stripe"), (NodeKind::Ext, "Stripe".into()));
    }

    #[test]
    fn test_substring_cues_keep_label() {
        assert_eq!(
            classify_label("Order Queue"),
            (NodeKind::Queue, "Order Queue".into())
        );
        assert_eq!(
            classify_label("API Gateway"),
            (NodeKind::Gateway, "API Gateway".into())
        );
        assert_eq!(
            classify_label(" Payments "),
            (NodeKind::Service, "Payments".into())
        );
    }

    #[test]
    fn test_queue_beats_gateway() {
        assert_eq!(classify_label("gateway queue").0, NodeKind::Queue);
        assert_eq!(classify_label("gw:retry queue").0, NodeKind::Queue);
    }

    #[test]
    fn test_guess_protocol() {
        assert_eq!(guess_protocol("calls via gRPC"), Protocol::Grpc);
        assert_eq!(guess_protocol("REST/JSON"), Protocol::Rest);
        assert_eq!(guess_protocol("publishes"), Protocol::Pub);
        assert_eq!(guess_protocol("pubsub"), Protocol::Pub);
        assert_eq!(guess_protocol("subscribes"), Protocol::Sub);
        assert_eq!(guess_protocol(""), Protocol::Unknown);
        assert_eq!(guess_protocol("reads"), Protocol::Unknown);
    }
}
