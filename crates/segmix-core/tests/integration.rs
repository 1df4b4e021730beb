//! Integration tests for segmix-core segments.
//!
//! Wires complete pipelines the way an external scheduler would: configure
//! every segment, `start` them once, then `mix` each in topological order per
//! tick and check what reaches the far end.

use segmix_core::{
    Arity, BufferArena, BufferId, Channel, ChannelSegment, Distribute, Field, MONO, Mixer,
    Segment, SegmentError, SegmentNode, last_error,
};

const BLOCK: usize = 4;

/// source(stereo) -> distribute(left) -> {mixer, drain}
struct Pipeline {
    arena: BufferArena,
    nodes: Vec<SegmentNode>,
    left: BufferId,
    right: BufferId,
    taps: Vec<BufferId>,
    mixed: BufferId,
}

impl Pipeline {
    fn new() -> Self {
        let mut arena = BufferArena::new();
        let left = arena.create_unallocated().unwrap();
        let right = arena.create(64).unwrap();
        let taps: Vec<_> = (0..2).map(|_| arena.create_unallocated().unwrap()).collect();
        let mixed = arena.create(64).unwrap();

        let mut source = ChannelSegment::source(Channel::new(2, BLOCK).unwrap()).unwrap();
        let mut distribute = Distribute::new();
        let mut mixer = Mixer::new();
        let mut drain = ChannelSegment::drain(Channel::new(2, BLOCK).unwrap()).unwrap();

        distribute.set_input(Field::Buffer, 0, Some(left), &mut arena).unwrap();
        arena.allocate(left, 64).unwrap();
        source.set_output(Field::Buffer, 0, Some(left), &mut arena).unwrap();
        source.set_output(Field::Buffer, 1, Some(right), &mut arena).unwrap();
        for (i, tap) in taps.iter().enumerate() {
            distribute.set_output(Field::Buffer, i, Some(*tap), &mut arena).unwrap();
        }
        mixer.set_input(Field::Buffer, 0, Some(taps[0]), &mut arena).unwrap();
        mixer.set_input(Field::Buffer, 1, Some(right), &mut arena).unwrap();
        mixer.set_output(Field::Buffer, MONO, Some(mixed), &mut arena).unwrap();
        drain.set_input(Field::Buffer, 0, Some(mixed), &mut arena).unwrap();
        drain.set_input(Field::Buffer, 1, Some(taps[1]), &mut arena).unwrap();

        let mut nodes: Vec<SegmentNode> =
            vec![source.into(), distribute.into(), mixer.into(), drain.into()];
        for node in &mut nodes {
            node.start(&mut arena).unwrap();
        }

        Self {
            arena,
            nodes,
            left,
            right,
            taps,
            mixed,
        }
    }

    fn source(&mut self) -> &mut ChannelSegment {
        match &mut self.nodes[0] {
            SegmentNode::Channel(s) => s,
            _ => unreachable!(),
        }
    }

    fn drain(&self) -> &ChannelSegment {
        match &self.nodes[3] {
            SegmentNode::Channel(s) => s,
            _ => unreachable!(),
        }
    }

    /// Runs one tick. Distribute runs again after its consumers so the data
    /// they passed is reclaimed before the next capture.
    fn tick(&mut self, frames: &[f32]) {
        self.source().endpoint_mut().fill(frames);
        for i in [0, 1, 2, 3, 1] {
            self.nodes[i].mix(BLOCK, &mut self.arena).unwrap();
        }
    }
}

#[test]
fn fan_out_then_fan_in_reaches_drain() {
    let mut pipeline = Pipeline::new();
    pipeline.tick(&[1.0, 0.0, 1.0, 0.5, 1.0, -1.0, 1.0, 0.0]);

    // left (all 1.0) averaged with right, left again straight to channel 1.
    assert_eq!(
        pipeline.drain().endpoint().samples(),
        &[0.5, 1.0, 0.75, 1.0, 0.0, 1.0, 0.5, 1.0]
    );
}

#[test]
fn steady_state_does_not_grow_buffers() {
    let mut pipeline = Pipeline::new();
    for _ in 0..64 {
        pipeline.tick(&[0.25; 2 * BLOCK]);
    }
    let arena = &pipeline.arena;
    assert_eq!(arena.get(pipeline.left).unwrap().unread(), 0);
    assert_eq!(arena.available_read(pipeline.right).unwrap(), 0);
    assert_eq!(arena.available_read(pipeline.mixed).unwrap(), 0);
    for tap in &pipeline.taps {
        assert_eq!(arena.available_read(*tap).unwrap(), 0);
    }
    assert_eq!(pipeline.drain().endpoint().samples(), &[0.25; 2 * BLOCK]);
}

#[test]
fn describe_covers_every_kind() {
    let nodes: Vec<SegmentNode> = vec![
        ChannelSegment::source(Channel::new(4, 1).unwrap()).unwrap().into(),
        ChannelSegment::drain(Channel::new(4, 1).unwrap()).unwrap().into(),
        Distribute::new().into(),
        Mixer::new().into(),
    ];
    let infos: Vec<_> = nodes.iter().map(Segment::describe).collect();
    let names: Vec<_> = infos.iter().map(|i| i.name).collect();
    assert_eq!(names, ["source", "drain", "distribute", "mixer"]);

    assert_eq!(infos[0].outputs, Arity::Fixed(4));
    assert_eq!(infos[1].max_inputs, Arity::Fixed(4));
    assert_eq!(infos[2].outputs, Arity::Unbounded);
    assert_eq!(infos[3].max_inputs, Arity::Unbounded);
    for info in &infos {
        assert!(info.field(Field::Buffer).is_some(), "{} has no buffer field", info.name);
    }
}

#[test]
fn failures_are_visible_through_last_error() {
    let mut arena = BufferArena::new();
    let allocated = arena.create(8).unwrap();
    let mut node = SegmentNode::from(Distribute::new());

    assert_eq!(
        node.set_input(Field::Buffer, 0, Some(allocated), &mut arena),
        Err(SegmentError::BufferAllocated)
    );
    assert_eq!(last_error(), Some(SegmentError::BufferAllocated));
    assert_eq!(node.input(Field::Buffer, 0), None);

    assert_eq!(node.start(&mut arena), Err(SegmentError::BufferMissing));
    assert_eq!(last_error(), Some(SegmentError::BufferMissing));
}

#[test]
fn failures_leave_state_unchanged() {
    let mut arena = BufferArena::new();
    let a = arena.create(8).unwrap();
    let out = arena.create(8).unwrap();
    let other = arena.create(8).unwrap();

    let mut mixer = SegmentNode::from(Mixer::with_buffers(out, &[a]).unwrap());
    assert_eq!(
        mixer.set_input(Field::Volume, 0, Some(other), &mut arena),
        Err(SegmentError::InvalidField(Field::Volume))
    );
    assert_eq!(
        mixer.set_output(Field::Volume, MONO, Some(other), &mut arena),
        Err(SegmentError::InvalidField(Field::Volume))
    );
    assert_eq!(
        mixer.set_output(Field::Buffer, 1, Some(other), &mut arena),
        Err(SegmentError::InvalidLocation {
            location: 1,
            limit: 1
        })
    );
    assert_eq!(mixer.input(Field::Buffer, 0), Some(a));
    assert_eq!(mixer.input(Field::Buffer, 1), None);
    assert_eq!(mixer.output(Field::Buffer, MONO), Some(out));

    // Distribute whose input vanished from the arena.
    let mut distribute = Distribute::new();
    let input = arena.create_unallocated().unwrap();
    distribute.set_input(Field::Buffer, 0, Some(input), &mut arena).unwrap();
    arena.remove(input).unwrap();
    arena.write(other, &[0.5, 0.25]).unwrap();
    assert_eq!(
        distribute.set_output(Field::Buffer, 0, Some(other), &mut arena),
        Err(SegmentError::BufferMissing)
    );
    assert!(distribute.outputs().is_empty());
    assert!(!arena.get(other).unwrap().is_virtual());
    assert_eq!(arena.read_window(other).unwrap(), &[0.5, 0.25]);
    assert_eq!(last_error(), Some(SegmentError::BufferMissing));
}

#[test]
fn output_round_trips_through_every_kind() {
    let mut arena = BufferArena::new();
    let mut nodes: Vec<SegmentNode> = vec![
        ChannelSegment::source(Channel::new(2, 1).unwrap()).unwrap().into(),
        Distribute::new().into(),
        Mixer::new().into(),
    ];
    for node in &mut nodes {
        let id = arena.create_unallocated().unwrap();
        node.set_output(Field::Buffer, 0, Some(id), &mut arena).unwrap();
        assert_eq!(node.output(Field::Buffer, 0), Some(id), "{}", node.describe().name);
    }
}

#[test]
fn release_then_reuse_is_safe() {
    let mut arena = BufferArena::new();
    let a = arena.create(8).unwrap();
    let out = arena.create(8).unwrap();
    let mut node = SegmentNode::from(Mixer::with_buffers(out, &[a]).unwrap());
    node.release();
    node.release();
    assert_eq!(node.input(Field::Buffer, 0), None);
    assert!(node.mix(4, &mut arena).is_ok());
    assert!(arena.get(a).unwrap().has_storage(), "release must not free attached buffers");
}
