use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Tagged variant of scheduled events (§3.4, §9 "tagged unions"). `ArmadaArrival`
/// is kept only so that records persisted by an older/legacy writer still
/// deserialize; the Game Loop ignores it on dispatch (armadas are authoritative
/// for arrival, see `sim::game_loop`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduledEvent {
    ResourceTick { scheduled_time: i64 },
    GameEnd { scheduled_time: i64 },
    ArmadaArrival { scheduled_time: i64 },
}

impl ScheduledEvent {
    pub fn scheduled_time(&self) -> i64 {
        match self {
            ScheduledEvent::ResourceTick { scheduled_time }
            | ScheduledEvent::GameEnd { scheduled_time }
            | ScheduledEvent::ArmadaArrival { scheduled_time } => *scheduled_time,
        }
    }
}

/// One entry in the event queue: the event plus a monotonically increasing
/// sequence number used as a stable tie-break when two events share a
/// `scheduledTime` (§9 "priority queue for event scheduling").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedEvent {
    pub event: ScheduledEvent,
    pub sequence: u64,
}

impl Eq for QueuedEvent {}

impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so earliest `scheduledTime` (and,
        // on a tie, the lowest sequence number — i.e. first inserted) pops first.
        other
            .event
            .scheduled_time()
            .cmp(&self.event.scheduled_time())
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue of scheduled events, ordered by `scheduledTime` with a
/// stable insertion-order tie-break. Backed by `std::collections::BinaryHeap`
/// rather than a resorted `Vec` on every pop (§9).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventQueue {
    heap: BinaryHeap<QueuedEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ScheduledEvent, sequence: u64) {
        self.heap.push(QueuedEvent { event, sequence });
    }

    pub fn peek_due(&self, current_time: i64) -> bool {
        self.heap
            .peek()
            .is_some_and(|e| e.event.scheduled_time() <= current_time)
    }

    pub fn pop(&mut self) -> Option<ScheduledEvent> {
        self.heap.pop().map(|e| e.event)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
