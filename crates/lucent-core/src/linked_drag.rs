//! Linked drag: when one member of a group is moved by the user, the
//! other members follow by the same offset.
//!
//! Move notifications arrive on the hook thread. Deltas are accumulated
//! per peer and applied together once the leader has been still for the
//! debounce window. Peers moved by the coordinator are suppressed for a
//! short time so their own move notifications do not propagate back.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::config::LinkedDragConfig;
use crate::window::WindowApi;
use crate::Rect;

/// A member of a linked group as seen by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkPeer {
    pub hwnd: usize,
    /// Whether the window takes part in linked drag at all.
    pub included: bool,
    /// Bounds at the time the snapshot was taken.
    pub rect: Rect,
}

/// Read-only snapshot of linked groups, keyed by member handle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkTopology {
    groups: Vec<Vec<LinkPeer>>,
    index: HashMap<usize, usize>,
}

impl LinkTopology {
    pub fn insert_group(&mut self, peers: Vec<LinkPeer>) {
        let slot = self.groups.len();
        for peer in &peers {
            self.index.insert(peer.hwnd, slot);
        }
        self.groups.push(peers);
    }

    /// Returns every member of the group `hwnd` belongs to, itself included.
    pub fn peers_of(&self, hwnd: usize) -> Option<&[LinkPeer]> {
        self.index.get(&hwnd).map(|&slot| self.groups[slot].as_slice())
    }

    pub fn members(&self) -> impl Iterator<Item = &LinkPeer> {
        self.groups.iter().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// What the tracker did with a move notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Zero-size rect, unknown window, or no linked group.
    Ignored,
    /// The window is still settling from a corrective move.
    Suppressed,
    /// Movement within the jitter threshold.
    BelowThreshold,
    /// Jump larger than the anomaly limit; dropped.
    Anomalous,
    /// The window moved but is excluded from linked drag.
    Excluded,
    /// Deltas were queued for peers; the debounce timer must be re-armed.
    Queued,
}

/// A corrective move the coordinator wants applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMove {
    pub hwnd: usize,
    pub dx: i32,
    pub dy: i32,
}

/// Reported after a peer has been moved so its record can be mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkedMove {
    pub hwnd: usize,
    pub rect: Rect,
}

/// The linked-drag state machine, free of threads and clocks.
///
/// Every time-dependent method takes `now` explicitly.
#[derive(Debug)]
pub struct DragTracker {
    config: LinkedDragConfig,
    topology: LinkTopology,
    last_positions: HashMap<usize, (i32, i32)>,
    pending: HashMap<usize, (i32, i32)>,
    suppressed_until: HashMap<usize, Instant>,
}

impl DragTracker {
    pub fn new(config: LinkedDragConfig) -> Self {
        Self {
            config,
            topology: LinkTopology::default(),
            last_positions: HashMap::new(),
            pending: HashMap::new(),
            suppressed_until: HashMap::new(),
        }
    }

    /// Replaces the group snapshot.
    ///
    /// Positions already known from move notifications are kept; the
    /// snapshot only seeds windows seen for the first time. State for
    /// windows that left every linked group is dropped.
    pub fn set_topology(&mut self, topology: LinkTopology) {
        self.last_positions
            .retain(|hwnd, _| topology.peers_of(*hwnd).is_some());
        self.pending
            .retain(|hwnd, _| topology.peers_of(*hwnd).is_some());
        self.suppressed_until
            .retain(|hwnd, _| topology.peers_of(*hwnd).is_some());

        for peer in topology.members() {
            self.last_positions
                .entry(peer.hwnd)
                .or_insert_with(|| peer.rect.position());
        }
        self.topology = topology;
    }

    pub fn topology(&self) -> &LinkTopology {
        &self.topology
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Feeds one move notification into the state machine.
    pub fn on_moved(&mut self, hwnd: usize, rect: Rect, now: Instant) -> MoveOutcome {
        if rect.width == 0 && rect.height == 0 {
            return MoveOutcome::Ignored;
        }
        let Some(peers) = self.topology.peers_of(hwnd) else {
            return MoveOutcome::Ignored;
        };
        let position = rect.position();

        if let Some(&until) = self.suppressed_until.get(&hwnd) {
            if now < until {
                self.last_positions.insert(hwnd, position);
                return MoveOutcome::Suppressed;
            }
            self.suppressed_until.remove(&hwnd);
        }

        let Some(previous) = self.last_positions.insert(hwnd, position) else {
            return MoveOutcome::Ignored;
        };
        let dx = position.0 - previous.0;
        let dy = position.1 - previous.1;

        if dx.abs() <= self.config.threshold && dy.abs() <= self.config.threshold {
            return MoveOutcome::BelowThreshold;
        }
        if dx.abs() > self.config.max_delta || dy.abs() > self.config.max_delta {
            log::debug!("Discarding anomalous move of 0x{hwnd:X} by ({dx}, {dy})");
            return MoveOutcome::Anomalous;
        }

        let leader_included = peers.iter().any(|p| p.hwnd == hwnd && p.included);
        if !leader_included {
            return MoveOutcome::Excluded;
        }

        let mut queued = false;
        for peer in peers.iter().filter(|p| p.hwnd != hwnd && p.included) {
            let entry = self.pending.entry(peer.hwnd).or_insert((0, 0));
            entry.0 += dx;
            entry.1 += dy;
            queued = true;
        }
        if queued {
            MoveOutcome::Queued
        } else {
            MoveOutcome::Excluded
        }
    }

    /// Drains accumulated deltas. Accumulations past the anomaly limit
    /// are dropped.
    pub fn take_pending(&mut self) -> Vec<PendingMove> {
        let max = self.config.max_delta;
        let mut moves: Vec<PendingMove> = self
            .pending
            .drain()
            .filter(|(hwnd, (dx, dy))| {
                let sane = dx.abs() <= max && dy.abs() <= max;
                if !sane {
                    log::debug!("Dropping accumulated move of 0x{hwnd:X} by ({dx}, {dy})");
                }
                sane
            })
            .map(|(hwnd, (dx, dy))| PendingMove { hwnd, dx, dy })
            .collect();
        moves.sort_by_key(|m| m.hwnd);
        moves
    }

    /// Records a corrective move so the resulting notification is ignored.
    pub fn mark_applied(&mut self, hwnd: usize, rect: Rect, now: Instant) {
        self.last_positions.insert(hwnd, rect.position());
        self.suppressed_until
            .insert(hwnd, now + Duration::from_millis(self.config.suppress_ms));
    }
}

enum TimerMsg {
    Arm,
    Shutdown,
}

struct Shared {
    tracker: Mutex<DragTracker>,
    processing: AtomicBool,
    api: Arc<dyn WindowApi>,
    notify: Option<Sender<LinkedMove>>,
}

impl Shared {
    fn tracker(&self) -> MutexGuard<'_, DragTracker> {
        // A panic while holding the lock leaves the maps consistent
        // enough to keep going.
        self.tracker.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn process(&self) {
        self.processing.store(true, Ordering::SeqCst);
        let mut tracker = self.tracker();
        for PendingMove { hwnd, dx, dy } in tracker.take_pending() {
            let current = match self.api.rect(hwnd) {
                Ok(rect) if rect.has_area() => rect,
                Ok(_) => continue,
                Err(e) => {
                    log::debug!("Linked peer 0x{hwnd:X} unavailable: {e}");
                    continue;
                }
            };
            let target = current.offset(dx, dy);
            if let Err(e) = self.api.set_rect(hwnd, &target) {
                log::warn!("Failed to move linked peer 0x{hwnd:X}: {e}");
                continue;
            }
            tracker.mark_applied(hwnd, target, Instant::now());
            if let Some(tx) = &self.notify {
                let _ = tx.send(LinkedMove { hwnd, rect: target });
            }
        }
        drop(tracker);
        self.processing.store(false, Ordering::SeqCst);
    }
}

/// Thread-safe linked-drag coordinator.
///
/// Call [`on_window_moved`](Self::on_window_moved) from the move hook and
/// [`set_topology`](Self::set_topology) whenever groups change. A single
/// re-armable timer thread applies pending moves after the debounce
/// window. Dropping the coordinator stops the timer.
pub struct LinkedDragCoordinator {
    shared: Arc<Shared>,
    timer: Option<Sender<TimerMsg>>,
    handle: Option<JoinHandle<()>>,
}

impl LinkedDragCoordinator {
    pub fn new(
        api: Arc<dyn WindowApi>,
        config: LinkedDragConfig,
        notify: Option<Sender<LinkedMove>>,
    ) -> Self {
        let debounce = Duration::from_millis(config.debounce_ms);
        let shared = Arc::new(Shared {
            tracker: Mutex::new(DragTracker::new(config)),
            processing: AtomicBool::new(false),
            api,
            notify,
        });

        let (tx, rx) = mpsc::channel();
        let timer_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name("linked-drag-timer".into())
            .spawn(move || run_timer(&timer_shared, &rx, debounce));

        let (timer, handle) = match handle {
            Ok(handle) => (Some(tx), Some(handle)),
            Err(e) => {
                log::error!("Linked drag disabled, timer thread failed: {e}");
                (None, None)
            }
        };

        Self {
            shared,
            timer,
            handle,
        }
    }

    pub fn set_topology(&self, topology: LinkTopology) {
        self.shared.tracker().set_topology(topology);
    }

    /// Handles a window location change notification.
    pub fn on_window_moved(&self, hwnd: usize, rect: Rect) -> MoveOutcome {
        if self.shared.processing.load(Ordering::SeqCst) {
            return MoveOutcome::Suppressed;
        }
        let outcome = self.shared.tracker().on_moved(hwnd, rect, Instant::now());
        if outcome == MoveOutcome::Queued
            && let Some(timer) = &self.timer
        {
            let _ = timer.send(TimerMsg::Arm);
        }
        outcome
    }

    /// Applies pending moves immediately instead of waiting for the timer.
    pub fn flush(&self) {
        self.shared.process();
    }

    /// Stops the timer thread. Pending moves are discarded.
    pub fn dispose(&mut self) {
        if let Some(timer) = self.timer.take() {
            let _ = timer.send(TimerMsg::Shutdown);
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for LinkedDragCoordinator {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn run_timer(shared: &Shared, rx: &Receiver<TimerMsg>, debounce: Duration) {
    let mut deadline: Option<Instant> = None;
    loop {
        let msg = match deadline {
            Some(at) => rx.recv_timeout(at.saturating_duration_since(Instant::now())),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match msg {
            Ok(TimerMsg::Arm) => deadline = Some(Instant::now() + debounce),
            Ok(TimerMsg::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                deadline = None;
                shared.process();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeWindowApi;

    fn peer(hwnd: usize, x: i32, y: i32) -> LinkPeer {
        LinkPeer {
            hwnd,
            included: true,
            rect: Rect::new(x, y, 400, 300),
        }
    }

    fn tracker_with(peers: Vec<LinkPeer>) -> DragTracker {
        let mut topology = LinkTopology::default();
        topology.insert_group(peers);
        let mut tracker = DragTracker::new(LinkedDragConfig::default());
        tracker.set_topology(topology);
        tracker
    }

    #[test]
    fn leader_move_queues_delta_for_peers() {
        // Arrange
        let mut tracker = tracker_with(vec![peer(1, 0, 0), peer(2, 500, 0), peer(3, 0, 400)]);
        let now = Instant::now();

        // Act
        let outcome = tracker.on_moved(1, Rect::new(40, 25, 400, 300), now);

        // Assert
        assert_eq!(outcome, MoveOutcome::Queued);
        assert_eq!(
            tracker.take_pending(),
            vec![
                PendingMove { hwnd: 2, dx: 40, dy: 25 },
                PendingMove { hwnd: 3, dx: 40, dy: 25 },
            ]
        );
    }

    #[test]
    fn deltas_accumulate_within_the_debounce_window() {
        // Arrange
        let mut tracker = tracker_with(vec![peer(1, 0, 0), peer(2, 500, 0)]);
        let now = Instant::now();

        // Act
        tracker.on_moved(1, Rect::new(10, 0, 400, 300), now);
        tracker.on_moved(1, Rect::new(30, 5, 400, 300), now);
        tracker.on_moved(1, Rect::new(60, 10, 400, 300), now);

        // Assert
        assert_eq!(tracker.take_pending(), vec![PendingMove { hwnd: 2, dx: 60, dy: 10 }]);
        assert!(!tracker.has_pending());
    }

    #[test]
    fn anomalous_delta_is_discarded() {
        // Arrange
        let mut tracker = tracker_with(vec![peer(1, 0, 0), peer(2, 500, 0)]);

        // Act
        let outcome = tracker.on_moved(1, Rect::new(600, 0, 400, 300), Instant::now());

        // Assert
        assert_eq!(outcome, MoveOutcome::Anomalous);
        assert!(tracker.take_pending().is_empty());
    }

    #[test]
    fn jitter_below_threshold_is_ignored() {
        // Arrange
        let mut tracker = tracker_with(vec![peer(1, 0, 0), peer(2, 500, 0)]);

        // Act
        let outcome = tracker.on_moved(1, Rect::new(1, -1, 400, 300), Instant::now());

        // Assert
        assert_eq!(outcome, MoveOutcome::BelowThreshold);
        assert!(!tracker.has_pending());
    }

    #[test]
    fn zero_size_rect_is_ignored() {
        // Arrange
        let mut tracker = tracker_with(vec![peer(1, 0, 0), peer(2, 500, 0)]);

        // Act
        let outcome = tracker.on_moved(1, Rect::new(90, 90, 0, 0), Instant::now());

        // Assert
        assert_eq!(outcome, MoveOutcome::Ignored);
    }

    #[test]
    fn excluded_leader_does_not_propagate() {
        // Arrange
        let mut leader = peer(1, 0, 0);
        leader.included = false;
        let mut tracker = tracker_with(vec![leader, peer(2, 500, 0)]);

        // Act
        let outcome = tracker.on_moved(1, Rect::new(50, 0, 400, 300), Instant::now());

        // Assert
        assert_eq!(outcome, MoveOutcome::Excluded);
        assert!(!tracker.has_pending());
    }

    #[test]
    fn excluded_peer_receives_nothing() {
        // Arrange
        let mut skipped = peer(3, 0, 400);
        skipped.included = false;
        let mut tracker = tracker_with(vec![peer(1, 0, 0), peer(2, 500, 0), skipped]);

        // Act
        tracker.on_moved(1, Rect::new(50, 0, 400, 300), Instant::now());

        // Assert
        assert_eq!(tracker.take_pending(), vec![PendingMove { hwnd: 2, dx: 50, dy: 0 }]);
    }

    #[test]
    fn corrected_peer_is_suppressed_then_released() {
        // Arrange
        let mut tracker = tracker_with(vec![peer(1, 0, 0), peer(2, 500, 0)]);
        let now = Instant::now();
        tracker.on_moved(1, Rect::new(50, 0, 400, 300), now);
        tracker.take_pending();
        tracker.mark_applied(2, Rect::new(550, 0, 400, 300), now);

        // Act
        let echo = tracker.on_moved(2, Rect::new(552, 0, 400, 300), now + Duration::from_millis(50));
        let later = tracker.on_moved(2, Rect::new(600, 0, 400, 300), now + Duration::from_millis(250));

        // Assert
        assert_eq!(echo, MoveOutcome::Suppressed);
        assert_eq!(later, MoveOutcome::Queued);
        assert_eq!(tracker.take_pending(), vec![PendingMove { hwnd: 1, dx: 48, dy: 0 }]);
    }

    #[test]
    fn accumulated_overflow_is_dropped() {
        // Arrange
        let mut tracker = tracker_with(vec![peer(1, 0, 0), peer(2, 900, 0)]);
        let now = Instant::now();

        // Act
        tracker.on_moved(1, Rect::new(300, 0, 400, 300), now);
        tracker.on_moved(1, Rect::new(600, 0, 400, 300), now);

        // Assert
        assert!(tracker.take_pending().is_empty());
    }

    #[test]
    fn topology_refresh_keeps_known_positions() {
        // Arrange
        let mut tracker = tracker_with(vec![peer(1, 0, 0), peer(2, 500, 0)]);
        let now = Instant::now();
        tracker.on_moved(1, Rect::new(100, 0, 400, 300), now);
        tracker.take_pending();

        // Act
        let mut stale = LinkTopology::default();
        stale.insert_group(vec![peer(1, 0, 0), peer(2, 500, 0)]);
        tracker.set_topology(stale);
        tracker.on_moved(1, Rect::new(120, 0, 400, 300), now);

        // Assert
        assert_eq!(tracker.take_pending(), vec![PendingMove { hwnd: 2, dx: 20, dy: 0 }]);
    }

    #[test]
    fn flush_moves_peers_and_reports_them() {
        // Arrange
        let api = Arc::new(FakeWindowApi::new());
        api.add(1, "Leader", "Notepad", Rect::new(0, 0, 400, 300));
        api.add(2, "Peer", "Notepad", Rect::new(500, 100, 400, 300));
        let (tx, rx) = mpsc::channel();
        let coordinator = LinkedDragCoordinator::new(api.clone(), LinkedDragConfig::default(), Some(tx));
        let mut topology = LinkTopology::default();
        topology.insert_group(vec![peer(1, 0, 0), peer(2, 500, 100)]);
        coordinator.set_topology(topology);

        // Act
        coordinator.on_window_moved(1, Rect::new(30, 20, 400, 300));
        coordinator.flush();

        // Assert
        assert_eq!(api.window(2).rect, Rect::new(530, 120, 400, 300));
        assert_eq!(
            rx.try_recv().unwrap(),
            LinkedMove { hwnd: 2, rect: Rect::new(530, 120, 400, 300) }
        );
        let echo = coordinator.on_window_moved(2, Rect::new(530, 120, 400, 300));
        assert_eq!(echo, MoveOutcome::Suppressed);
    }

    #[test]
    fn timer_applies_moves_after_quiescence() {
        // Arrange
        let api = Arc::new(FakeWindowApi::new());
        api.add(1, "Leader", "Code", Rect::new(0, 0, 400, 300));
        api.add(2, "Peer", "Code", Rect::new(400, 0, 400, 300));
        let config = LinkedDragConfig {
            debounce_ms: 20,
            ..LinkedDragConfig::default()
        };
        let (tx, rx) = mpsc::channel();
        let coordinator = LinkedDragCoordinator::new(api.clone(), config, Some(tx));
        let mut topology = LinkTopology::default();
        topology.insert_group(vec![peer(1, 0, 0), peer(2, 400, 0)]);
        coordinator.set_topology(topology);

        // Act
        coordinator.on_window_moved(1, Rect::new(0, 50, 400, 300));
        let moved = rx.recv_timeout(Duration::from_secs(5)).unwrap();

        // Assert
        assert_eq!(moved, LinkedMove { hwnd: 2, rect: Rect::new(400, 50, 400, 300) });
        assert_eq!(api.moves(), vec![(2, Rect::new(400, 50, 400, 300))]);
    }
}
