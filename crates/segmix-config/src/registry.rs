//! Catalogue of segment kinds for graph builders.
//!
//! Endpoint arity depends on the channel count chosen at construction, so
//! the catalogue reports it as [`Ports::PerChannel`] rather than a number.

/// How many connections a kind accepts on one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ports {
    /// Exactly this many.
    Fixed(usize),
    /// One per endpoint channel.
    PerChannel,
    /// Any number.
    Unbounded,
}

/// Static metadata for one segment kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindDescriptor {
    /// Kind name as written in TOML (`kind = "..."`).
    pub id: &'static str,
    /// Human-readable description, as reported by the segment itself.
    pub description: &'static str,
    /// Input connections.
    pub inputs: Ports,
    /// Output connections.
    pub outputs: Ports,
    /// Whether the kind needs `channels` and `frames` settings.
    pub endpoint: bool,
}

const KINDS: &[KindDescriptor] = &[
    KindDescriptor {
        id: "source",
        description: "Segment acting as an audio source.",
        inputs: Ports::Fixed(0),
        outputs: Ports::PerChannel,
        endpoint: true,
    },
    KindDescriptor {
        id: "drain",
        description: "Segment acting as an audio drain.",
        inputs: Ports::PerChannel,
        outputs: Ports::Fixed(0),
        endpoint: true,
    },
    KindDescriptor {
        id: "distribute",
        description: "Multiplexes a buffer to multiple outputs to consume it from.",
        inputs: Ports::Fixed(1),
        outputs: Ports::Unbounded,
        endpoint: false,
    },
    KindDescriptor {
        id: "mixer",
        description: "Mixes multiple buffers together",
        inputs: Ports::Unbounded,
        outputs: Ports::Fixed(1),
        endpoint: false,
    },
];

/// Every known segment kind, in a stable order.
pub fn segment_kinds() -> &'static [KindDescriptor] {
    KINDS
}

/// Looks up a kind by name (case-sensitive).
pub fn describe_kind(id: &str) -> Option<&'static KindDescriptor> {
    KINDS.iter().find(|k| k.id == id)
}
